//! Per-drone neighbor graph
//!
//! ε — who a drone can hear, and the role edges derived from that. Role
//! relationships (leader, followers, relay links) are recomputed from
//! positions and roles of other drones; they are never independent ground
//! truth.

use crate::types::{DroneId, MAX_BASE_STATIONS, MAX_NEIGHBORS};
use heapless::Vec;

/// ε — the neighbor and role-edge view of one drone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighborGraph {
    /// Drones within comm range
    pub neighbors: Vec<DroneId, MAX_NEIGHBORS>,
    /// The leader this drone follows, when it is a follower
    pub leader: Option<DroneId>,
    /// Followers tracking this drone, when it is a leader
    pub followers: Vec<DroneId, MAX_NEIGHBORS>,
    /// The drone this relay serves, when it is a relay
    pub relay_target: Option<DroneId>,
    /// A neighboring relay serving this drone
    pub relay_source: Option<DroneId>,
    /// Dock assignment, populated by external systems
    pub dock_target: Option<DroneId>,
    /// Visible base stations, populated by external systems
    pub base_stations: Vec<DroneId, MAX_BASE_STATIONS>,
}

impl NeighborGraph {
    /// Empty graph (no contact)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether `id` is a spatial neighbor
    pub fn has_neighbor(&self, id: DroneId) -> bool {
        self.neighbors.contains(&id)
    }

    /// Neighbor count plus visible base stations, the reference count used
    /// by pattern preconditions
    pub fn reference_count(&self) -> usize {
        self.neighbors.len() + self.base_stations.len()
    }
}
