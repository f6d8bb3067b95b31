/// Snapshot of a vehicle's public state, used by the control API's
/// introspection calls (spec §10.5).
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleInfo {
    pub running: bool,
    pub distance: f64,
    pub speed: f64,
    pub drivable: String,
    pub road: Option<String>,
    pub intersection: Option<String>,
    pub route: Vec<String>,
}
