use crate::geom::Point;
use crate::roadnet::lane::Lane;
use crate::roadnet::lane_link::LaneLink;

/// Stable handle into the engine's vehicle pool (the vehicle's priority).
/// Non-owning: handles must be resolved through the pool, never dereferenced
/// directly, so that a terminated vehicle cannot leave a dangling reference
/// (spec §9 Design Notes).
pub type VehicleHandle = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrivableKind {
    Lane,
    LaneLink,
}

/// The polymorphic supertype of [`Lane`] and [`LaneLink`] (spec §9): both
/// model a 1-D strip vehicles travel along, differing in the bookkeeping
/// they carry (a lane has a waiting buffer, segments and history; a
/// lane-link has crosses and availability). Modeled as a tagged variant
/// rather than a trait object so the hot per-step loops can match once and
/// avoid virtual dispatch.
#[derive(Debug, Clone)]
pub enum Drivable {
    Lane(Lane),
    LaneLink(LaneLink),
}

impl Drivable {
    pub fn kind(&self) -> DrivableKind {
        match self {
            Drivable::Lane(_) => DrivableKind::Lane,
            Drivable::LaneLink(_) => DrivableKind::LaneLink,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Drivable::Lane(l) => &l.id,
            Drivable::LaneLink(l) => &l.id,
        }
    }

    pub fn length(&self) -> f64 {
        match self {
            Drivable::Lane(l) => l.length,
            Drivable::LaneLink(l) => l.length,
        }
    }

    pub fn width(&self) -> f64 {
        match self {
            Drivable::Lane(l) => l.width,
            Drivable::LaneLink(l) => l.width,
        }
    }

    pub fn max_speed(&self) -> f64 {
        match self {
            Drivable::Lane(l) => l.max_speed,
            Drivable::LaneLink(l) => l.max_speed,
        }
    }

    pub fn points(&self) -> &[Point] {
        match self {
            Drivable::Lane(l) => &l.points,
            Drivable::LaneLink(l) => &l.points,
        }
    }

    pub fn vehicles(&self) -> &[VehicleHandle] {
        match self {
            Drivable::Lane(l) => &l.vehicles,
            Drivable::LaneLink(l) => &l.vehicles,
        }
    }

    pub fn vehicles_mut(&mut self) -> &mut Vec<VehicleHandle> {
        match self {
            Drivable::Lane(l) => &mut l.vehicles,
            Drivable::LaneLink(l) => &mut l.vehicles,
        }
    }

    pub fn remove_vehicle(&mut self, handle: VehicleHandle) {
        match self {
            Drivable::Lane(l) => l.remove_vehicle(handle),
            Drivable::LaneLink(l) => l.remove_vehicle(handle),
        }
    }

    /// Point and unit tangent at arc-length `distance` along this
    /// drivable's centerline.
    pub fn point_at_distance(&self, distance: f64) -> (Point, Point) {
        crate::geom::point_at_distance(self.points(), distance)
    }

    pub fn as_lane(&self) -> Option<&Lane> {
        match self {
            Drivable::Lane(l) => Some(l),
            Drivable::LaneLink(_) => None,
        }
    }

    pub fn as_lane_mut(&mut self) -> Option<&mut Lane> {
        match self {
            Drivable::Lane(l) => Some(l),
            Drivable::LaneLink(_) => None,
        }
    }

    pub fn as_lane_link(&self) -> Option<&LaneLink> {
        match self {
            Drivable::LaneLink(l) => Some(l),
            Drivable::Lane(_) => None,
        }
    }

    pub fn as_lane_link_mut(&mut self) -> Option<&mut LaneLink> {
        match self {
            Drivable::LaneLink(l) => Some(l),
            Drivable::Lane(_) => None,
        }
    }

    pub fn is_available(&self, road_link_available: impl Fn(&str) -> bool) -> bool {
        match self {
            Drivable::Lane(_) => true,
            Drivable::LaneLink(l) => road_link_available(&l.road_link_id),
        }
    }
}
