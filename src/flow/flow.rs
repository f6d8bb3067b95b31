use std::fmt;

use crate::log_main;
use crate::verbose::EVENT_VEHICLE_SPAWN;

#[derive(Debug, Clone)]
pub enum FlowError {
    EmptyRoute(String),
    InvalidInterval { flow_id: String, interval: f64 },
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowError::EmptyRoute(id) => write!(f, "flow '{}' has an empty route", id),
            FlowError::InvalidInterval { flow_id, interval } => {
                write!(f, "flow '{}' has non-positive emission interval {}", flow_id, interval)
            }
        }
    }
}

impl std::error::Error for FlowError {}

/// Per-flow vehicle template: the parameters every vehicle this flow spawns
/// is built with (spec §3). Mirrors the fields [`crate::agents::Vehicle`]
/// exposes through its builder.
#[derive(Debug, Clone)]
pub struct VehicleTemplate {
    pub length: f64,
    pub width: f64,
    pub max_speed: f64,
    pub max_pos_acc: f64,
    pub max_neg_acc: f64,
    pub usual_pos_acc: f64,
    pub usual_neg_acc: f64,
    pub min_gap: f64,
    pub headway_time: f64,
    pub yield_distance: f64,
}

impl Default for VehicleTemplate {
    fn default() -> Self {
        VehicleTemplate {
            length: 5.0,
            width: 2.0,
            max_speed: 16.7,
            max_pos_acc: 2.0,
            max_neg_acc: 4.5,
            usual_pos_acc: 2.0,
            usual_neg_acc: 4.5,
            min_gap: 2.5,
            headway_time: 1.5,
            yield_distance: 5.0,
        }
    }
}

/// Periodic vehicle emitter (spec §3, component C8): accumulates elapsed
/// time in `now_time` and emits one vehicle per whole `interval` consumed,
/// within `[start_time, end_time]`.
#[derive(Debug, Clone)]
pub struct Flow {
    pub id: String,
    pub template: VehicleTemplate,
    pub route: Vec<String>,
    pub interval: f64,
    pub start_time: f64,
    pub end_time: Option<f64>,
    pub now_time: f64,
    pub current_time: f64,
    pub valid: bool,
    pub emitted_count: u64,
}

pub struct FlowBuilder {
    flow: Flow,
}

impl Flow {
    pub fn new(id: impl Into<String>, route: Vec<String>, interval: f64) -> FlowBuilder {
        FlowBuilder {
            flow: Flow {
                id: id.into(),
                template: VehicleTemplate::default(),
                route,
                interval,
                start_time: 0.0,
                end_time: None,
                now_time: interval,
                current_time: 0.0,
                valid: true,
                emitted_count: 0,
            },
        }
    }

    /// Advances the flow's clock by `dt` and returns the ids of any
    /// vehicles emitted this call (spec §4.1 stage 1, `advanceFlows`).
    pub fn advance(&mut self, dt: f64) -> Vec<String> {
        let mut emitted = Vec::new();
        if !self.valid {
            return emitted;
        }
        if let Some(end) = self.end_time {
            if self.current_time > end {
                self.current_time += dt;
                return emitted;
            }
        }
        if self.current_time >= self.start_time {
            self.now_time += dt;
            while self.now_time >= self.interval {
                self.now_time -= self.interval;
                emitted.push(format!("{}_{}", self.id, self.emitted_count));
                self.emitted_count += 1;
            }
        }
        self.current_time += dt;
        emitted
    }

    /// Marks the flow invalid after a spawned vehicle's route turned out
    /// infeasible (spec §4.1 stage 2). Once invalid, a flow never emits
    /// again.
    pub fn set_valid(&mut self, valid: bool) {
        if self.valid && !valid {
            log_main!(EVENT_VEHICLE_SPAWN, "flow marked invalid: route is infeasible, omitted from further emission", flow_id = self.id.as_str());
        }
        self.valid = valid;
    }

    pub fn reset(&mut self) {
        self.now_time = self.interval;
        self.current_time = 0.0;
        self.emitted_count = 0;
    }
}

impl FlowBuilder {
    pub fn with_template(mut self, template: VehicleTemplate) -> Self {
        self.flow.template = template;
        self
    }
    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.flow.start_time = start_time;
        self
    }
    pub fn with_end_time(mut self, end_time: f64) -> Self {
        self.flow.end_time = Some(end_time);
        self
    }
    pub fn build(self) -> Result<Flow, FlowError> {
        if self.flow.route.is_empty() {
            return Err(FlowError::EmptyRoute(self.flow.id));
        }
        if self.flow.interval <= 0.0 {
            return Err(FlowError::InvalidInterval { flow_id: self.flow.id, interval: self.flow.interval });
        }
        Ok(self.flow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emits_one_vehicle_per_interval() {
        let mut flow = Flow::new("f0", vec!["r0".to_string()], 2.0).build().unwrap();
        assert!(flow.advance(1.0).is_empty());
        let ids = flow.advance(1.0);
        assert_eq!(ids, vec!["f0_0".to_string()]);
    }

    #[test]
    fn test_respects_start_time() {
        let mut flow = Flow::new("f0", vec!["r0".to_string()], 1.0).with_start_time(5.0).build().unwrap();
        assert!(flow.advance(1.0).is_empty());
    }

    #[test]
    fn test_stops_emitting_after_end_time() {
        let mut flow = Flow::new("f0", vec!["r0".to_string()], 1.0).with_end_time(0.5).build().unwrap();
        flow.advance(1.0);
        assert!(!flow.valid || flow.advance(1.0).is_empty());
    }

    #[test]
    fn test_invalid_flow_never_emits() {
        let mut flow = Flow::new("f0", vec!["r0".to_string()], 1.0).build().unwrap();
        flow.set_valid(false);
        assert!(flow.advance(5.0).is_empty());
    }

    #[test]
    fn test_empty_route_rejected() {
        let result = Flow::new("f0", vec![], 1.0).build();
        assert!(matches!(result, Err(FlowError::EmptyRoute(_))));
    }
}
