/// One phase of a traffic light's cycle: how long it holds, and which of
/// the owning intersection's road-links (indexed by position) are open.
#[derive(Debug, Clone)]
pub struct LightPhase {
    pub duration: f64,
    pub available_road_links: Vec<bool>,
}

impl LightPhase {
    pub fn new(duration: f64, available_road_links: Vec<bool>) -> Self {
        LightPhase { duration, available_road_links }
    }

    pub fn is_available(&self, road_link_index: usize) -> bool {
        self.available_road_links.get(road_link_index).copied().unwrap_or(false)
    }
}

/// A cyclic phase schedule owned by an [`Intersection`](super::intersection::Intersection).
#[derive(Debug, Clone)]
pub struct TrafficLight {
    pub intersection_id: String,
    phases: Vec<LightPhase>,
    current_phase_index: usize,
    remaining_duration: f64,
}

pub struct TrafficLightBuilder {
    traffic_light: TrafficLight,
}

impl TrafficLight {
    pub fn new(intersection_id: impl Into<String>) -> TrafficLightBuilder {
        TrafficLightBuilder {
            traffic_light: TrafficLight {
                intersection_id: intersection_id.into(),
                phases: Vec::new(),
                current_phase_index: 0,
                remaining_duration: 0.0,
            },
        }
    }

    /// Advances the phase clock by `dt` seconds, rolling over to the next
    /// phase (or cycling back to the first) when the current phase's
    /// duration is exhausted. A no-op under external (RL) control — the
    /// engine gates this call on `!config.rl_traffic_light` (spec §9 Open
    /// Question 2).
    pub fn step(&mut self, dt: f64) {
        if self.phases.is_empty() {
            return;
        }
        self.remaining_duration -= dt;
        while self.remaining_duration <= 0.0 {
            self.current_phase_index = (self.current_phase_index + 1) % self.phases.len();
            self.remaining_duration += self.phases[self.current_phase_index].duration;
        }
    }

    pub fn reset(&mut self) {
        self.current_phase_index = 0;
        self.remaining_duration = self.phases.first().map(|p| p.duration).unwrap_or(0.0);
    }

    pub fn current_phase(&self) -> Option<&LightPhase> {
        self.phases.get(self.current_phase_index)
    }

    pub fn current_phase_index(&self) -> usize {
        self.current_phase_index
    }

    /// Sets the active phase directly. Used by the control API's
    /// `set_traffic_light_phase`, which the engine only permits when
    /// `rl_traffic_light` is enabled.
    pub fn set_phase(&mut self, phase_index: usize) -> bool {
        if phase_index >= self.phases.len() {
            return false;
        }
        self.current_phase_index = phase_index;
        self.remaining_duration = self.phases[phase_index].duration;
        true
    }

    pub fn is_road_link_available(&self, road_link_index: usize) -> bool {
        self.current_phase().map(|p| p.is_available(road_link_index)).unwrap_or(false)
    }

    pub fn remaining_duration(&self) -> f64 {
        self.remaining_duration
    }

    /// Restores a phase and its exact remaining duration, as captured by
    /// [`crate::engine::Engine::checkpoint`]. Unlike `set_phase`, does not
    /// reset the clock to the phase's full duration.
    pub fn restore_phase(&mut self, phase_index: usize, remaining_duration: f64) -> bool {
        if phase_index >= self.phases.len() {
            return false;
        }
        self.current_phase_index = phase_index;
        self.remaining_duration = remaining_duration;
        true
    }
}

impl TrafficLightBuilder {
    pub fn with_phases(mut self, phases: Vec<LightPhase>) -> Self {
        self.traffic_light.remaining_duration = phases.first().map(|p| p.duration).unwrap_or(0.0);
        self.traffic_light.phases = phases;
        self
    }

    pub fn build(self) -> TrafficLight {
        self.traffic_light
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light() -> TrafficLight {
        TrafficLight::new("i0")
            .with_phases(vec![
                LightPhase::new(2.0, vec![true, false]),
                LightPhase::new(3.0, vec![false, true]),
            ])
            .build()
    }

    #[test]
    fn test_cycles_through_phases() {
        let mut tl = light();
        assert_eq!(tl.current_phase_index(), 0);
        tl.step(1.0);
        assert_eq!(tl.current_phase_index(), 0);
        tl.step(1.0);
        assert_eq!(tl.current_phase_index(), 1);
        tl.step(3.0);
        assert_eq!(tl.current_phase_index(), 0);
    }

    #[test]
    fn test_set_phase_for_external_control() {
        let mut tl = light();
        assert!(tl.set_phase(1));
        assert_eq!(tl.current_phase_index(), 1);
        assert!(!tl.set_phase(5));
    }

    #[test]
    fn test_reset_returns_to_first_phase() {
        let mut tl = light();
        tl.step(2.5);
        tl.reset();
        assert_eq!(tl.current_phase_index(), 0);
    }
}
