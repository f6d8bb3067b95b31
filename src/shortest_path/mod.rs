//! # Router module
//!
//! Road-sequence planning: plain Dijkstra over the road graph (spec §4,
//! component C4). Each vehicle owns a [`Router`] instance tracking its
//! planned road sequence and cursor.
//!
//! ## Example
//!
//! ```rust,no_run
//! use kinetic_traffic_kernel::roadnet::RoadNet;
//! use kinetic_traffic_kernel::shortest_path::Router;
//!
//! let net = RoadNet::new();
//! let mut router = Router::new(vec!["road_a".to_string(), "road_b".to_string()]);
//! let _ = router.plan(&net);
//! ```
pub mod router;

pub use self::router::*;
