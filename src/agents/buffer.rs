use crate::roadnet::drivable::VehicleHandle;

/// Staging record for everything a step mutates on a vehicle (spec §4.3).
/// Every field is an `Option`, doubling as its own "is set" flag — reads
/// during a step always see last-step state; `updateAction` flushes this
/// into the vehicle's authoritative fields. This is what lets the pipeline
/// workers mutate vehicles without locking: two workers never write the
/// same vehicle's buffer in the same stage.
#[derive(Debug, Clone, Default)]
pub struct WriteBuffer {
    pub distance: Option<f64>,
    pub speed: Option<f64>,
    pub drivable: Option<String>,
    pub end: Option<bool>,
    pub blocker: Option<Option<VehicleHandle>>,
    pub enter_lane_link_time: Option<Option<u64>>,
    pub custom_speed: Option<Option<f64>>,
}

impl WriteBuffer {
    pub fn clear(&mut self) {
        *self = WriteBuffer::default();
    }

    pub fn is_empty(&self) -> bool {
        self.distance.is_none()
            && self.speed.is_none()
            && self.drivable.is_none()
            && self.end.is_none()
            && self.blocker.is_none()
            && self.enter_lane_link_time.is_none()
            && self.custom_speed.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_resets_all_flags() {
        let mut buf = WriteBuffer::default();
        buf.distance = Some(10.0);
        buf.end = Some(true);
        assert!(!buf.is_empty());
        buf.clear();
        assert!(buf.is_empty());
    }
}
