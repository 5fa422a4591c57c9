//! Authoritative per-drone world model
//!
//! Single writer point for sensor state, neighbor graphs, and structural
//! coordinates. Telemetry updates recompute the neighbor graph of the
//! touched drone and of every drone whose membership changed, so spatial
//! edges stay symmetric; pattern updates are classified into structural
//! deltas for the blast-radius engine.

pub mod delta;
pub mod neighbor;

pub use delta::{DeltaResult, StructuralDimension};
pub use neighbor::NeighborGraph;

use crate::config::WorldConfig;
use crate::dimensions::{
    AutonomyLevel, BehavioralMode, CorePattern, FormationRole, HardwareTarget, PhysicalTraits,
    ResourceOwnership,
};
use crate::types::{
    CoordinationError, DroneId, Position, Result, SensorState, MAX_DRONE_RECORDS,
};
use heapless::FnvIndexMap;
use log::{debug, trace, warn};

/// FNV-1a over the current pattern id; Σ in the 9D coordinate
fn intent_hash(pattern_id: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in pattern_id.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// World-model record for one drone
#[derive(Debug, Clone)]
pub struct DroneRecord {
    /// Drone identifier
    pub id: DroneId,
    /// The six structural coordinates
    pub core: CorePattern,
    /// Catalog id of the pattern currently flying
    pub current_pattern: String,
    /// δ — latest sensor state
    pub sensors: SensorState,
    /// ε — neighbor and role-edge view
    pub neighbors: NeighborGraph,
    /// Σ — hash of the current intent
    pub intent_hash: u64,
    /// Monotonic time of the last telemetry (ms)
    pub last_update_ms: u64,
    /// Telemetry is older than the staleness threshold
    pub stale: bool,
}

/// Swarm-level summary computed over active drones
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwarmMetrics {
    /// Center of mass
    pub center: Position,
    /// Maximum distance from the center (m)
    pub spread_m: f32,
    /// Minimum pairwise separation (m); 0 with fewer than two drones
    pub min_separation_m: f32,
    /// Non-stale drone count
    pub active_drones: usize,
    /// All registered drones
    pub total_drones: usize,
}

/// The authoritative store of per-drone state
#[derive(Debug, Clone)]
pub struct WorldModel {
    drones: FnvIndexMap<u64, DroneRecord, MAX_DRONE_RECORDS>,
    config: WorldConfig,
}

impl WorldModel {
    /// Empty world with the given configuration
    pub fn new(config: WorldConfig) -> Self {
        Self {
            drones: FnvIndexMap::new(),
            config,
        }
    }

    /// Communication range in meters
    pub fn comm_range_m(&self) -> f32 {
        self.config.comm_range_m
    }

    /// Registered drone count
    pub fn len(&self) -> usize {
        self.drones.len()
    }

    /// True when no drones are registered
    pub fn is_empty(&self) -> bool {
        self.drones.is_empty()
    }

    /// Whether a drone is registered
    pub fn contains(&self, id: DroneId) -> bool {
        self.drones.contains_key(&id.as_u64())
    }

    /// Record for one drone
    pub fn get_drone(&self, id: DroneId) -> Option<&DroneRecord> {
        self.drones.get(&id.as_u64())
    }

    /// Neighbor graph for one drone
    pub fn get_neighbor_graph(&self, id: DroneId) -> Option<&NeighborGraph> {
        self.drones.get(&id.as_u64()).map(|r| &r.neighbors)
    }

    /// All records, in registration order
    pub fn drones(&self) -> impl Iterator<Item = &DroneRecord> {
        self.drones.values()
    }

    /// All drone ids, in registration order
    pub fn drone_ids(&self) -> Vec<DroneId> {
        self.drones.values().map(|r| r.id).collect()
    }

    /// Non-stale drone ids, in registration order
    pub fn get_active_drone_ids(&self) -> Vec<DroneId> {
        self.drones
            .values()
            .filter(|r| !r.stale)
            .map(|r| r.id)
            .collect()
    }

    /// Register a drone.
    ///
    /// New drones start grounded, autonomous, in reserve with a shared
    /// corridor; re-registering replaces the existing record.
    pub fn add_drone(
        &mut self,
        id: DroneId,
        rho: HardwareTarget,
        tau: PhysicalTraits,
        initial_pattern_id: &str,
        telemetry: SensorState,
        now_ms: u64,
    ) -> Result<()> {
        let core = CorePattern {
            sigma: BehavioralMode::Grounded,
            kappa: AutonomyLevel::Autonomous,
            chi: FormationRole::Reserve,
            lambda: ResourceOwnership::SharedCorridor,
            tau,
            rho,
        };
        let record = DroneRecord {
            id,
            core,
            current_pattern: initial_pattern_id.to_string(),
            sensors: telemetry,
            neighbors: NeighborGraph::empty(),
            intent_hash: intent_hash(initial_pattern_id),
            last_update_ms: now_ms,
            stale: false,
        };
        let former_neighbors = if self.drones.contains_key(&id.as_u64()) {
            debug!("re-registering {id}, replacing existing record");
            self.neighbor_ids(id)
        } else {
            Vec::new()
        };
        self.drones
            .insert(id.as_u64(), record)
            .map_err(|_| CoordinationError::SwarmSizeExceeded)?;

        self.recompute_graph(id);
        let mut affected = self.neighbor_ids(id);
        for other in former_neighbors {
            if !affected.contains(&other) {
                affected.push(other);
            }
        }
        for other in affected {
            self.recompute_graph(other);
        }
        debug!("registered {id} on pattern {initial_pattern_id}");
        Ok(())
    }

    /// Deregister a drone; returns whether it existed
    pub fn remove_drone(&mut self, id: DroneId) -> bool {
        match self.drones.remove(&id.as_u64()) {
            Some(record) => {
                for other in record.neighbors.neighbors.iter() {
                    self.recompute_graph(*other);
                }
                debug!("removed {id}");
                true
            }
            None => false,
        }
    }

    /// Absorb a telemetry update; unknown drones are ignored
    pub fn update_telemetry(&mut self, id: DroneId, telemetry: SensorState, now_ms: u64) {
        let old_neighbors = match self.drones.get_mut(&id.as_u64()) {
            Some(record) => {
                let old = record.neighbors.neighbors.clone();
                record.sensors = telemetry;
                record.last_update_ms = now_ms;
                record.stale = false;
                old
            }
            None => {
                trace!("telemetry for unknown {id} ignored");
                return;
            }
        };

        self.recompute_graph(id);
        let new_neighbors = self.neighbor_ids(id);
        for other in old_neighbors.iter() {
            self.recompute_graph(*other);
        }
        for other in new_neighbors {
            if !old_neighbors.contains(&other) {
                self.recompute_graph(other);
            }
        }
    }

    /// Apply a structural pattern update and classify the delta.
    ///
    /// τ and ρ are fixed at registration; only the four mutable structural
    /// dimensions are taken. Unknown drones yield an empty delta.
    pub fn update_pattern(
        &mut self,
        id: DroneId,
        pattern_id: &str,
        sigma: BehavioralMode,
        kappa: AutonomyLevel,
        chi: FormationRole,
        lambda: ResourceOwnership,
    ) -> DeltaResult {
        let Some(record) = self.drones.get_mut(&id.as_u64()) else {
            trace!("pattern update for unknown {id} ignored");
            return DeltaResult::default();
        };

        let old_core = record.core;
        let new_core = CorePattern {
            sigma,
            kappa,
            chi,
            lambda,
            tau: old_core.tau,
            rho: old_core.rho,
        };
        record.core = new_core;
        record.current_pattern = pattern_id.to_string();
        record.intent_hash = intent_hash(pattern_id);

        let delta = DeltaResult::classify(&old_core, &new_core);
        if delta.contains(StructuralDimension::Chi) {
            // Role edges of this drone and of everyone in contact depend on χ
            self.recompute_graph(id);
            for other in self.neighbor_ids(id) {
                self.recompute_graph(other);
            }
        }
        if delta.is_structural() {
            trace!("{id} structural delta: {} dims", delta.changed.len());
        }
        delta
    }

    /// Mark drones whose telemetry is older than the staleness threshold;
    /// returns the newly stale ids
    pub fn mark_stale_drones(&mut self, now_ms: u64) -> Vec<DroneId> {
        let mut newly_stale = Vec::new();
        let mut orphaned: Vec<DroneId> = Vec::new();

        let threshold = self.config.stale_threshold_ms;
        for record in self.drones.values_mut() {
            if !record.stale && now_ms.saturating_sub(record.last_update_ms) > threshold {
                record.stale = true;
                newly_stale.push(record.id);
                for other in record.neighbors.neighbors.iter() {
                    if !orphaned.contains(other) {
                        orphaned.push(*other);
                    }
                }
                record.neighbors = NeighborGraph::empty();
            }
        }

        for other in orphaned {
            self.recompute_graph(other);
        }
        if !newly_stale.is_empty() {
            warn!("{} drone(s) went stale", newly_stale.len());
        }
        newly_stale
    }

    /// Attach visible base stations (external positioning infrastructure)
    pub fn set_base_stations(&mut self, id: DroneId, stations: &[DroneId]) {
        if let Some(record) = self.drones.get_mut(&id.as_u64()) {
            record.neighbors.base_stations.clear();
            for station in stations {
                if record.neighbors.base_stations.push(*station).is_err() {
                    warn!("base station capacity reached for {id}");
                    break;
                }
            }
        }
    }

    /// Swarm-level summary over active drones
    pub fn metrics(&self) -> SwarmMetrics {
        let active: Vec<&DroneRecord> = self.drones.values().filter(|r| !r.stale).collect();
        let total = self.drones.len();
        if active.is_empty() {
            return SwarmMetrics {
                center: Position::default(),
                spread_m: 0.0,
                min_separation_m: 0.0,
                active_drones: 0,
                total_drones: total,
            };
        }

        let mut center = Position::default();
        for record in &active {
            center.x += record.sensors.position.x;
            center.y += record.sensors.position.y;
            center.z += record.sensors.position.z;
        }
        let n = active.len() as f32;
        center.x /= n;
        center.y /= n;
        center.z /= n;

        let mut spread = 0.0f32;
        let mut min_separation = f32::INFINITY;
        for (i, record) in active.iter().enumerate() {
            let pos = record.sensors.position;
            spread = spread.max(pos.distance_to(&center));
            for other in active.iter().skip(i + 1) {
                min_separation = min_separation.min(pos.distance_to(&other.sensors.position));
            }
        }

        SwarmMetrics {
            center,
            spread_m: spread,
            min_separation_m: if min_separation.is_finite() {
                min_separation
            } else {
                0.0
            },
            active_drones: active.len(),
            total_drones: total,
        }
    }

    /// Current spatial neighbors of a drone
    fn neighbor_ids(&self, id: DroneId) -> Vec<DroneId> {
        self.drones
            .get(&id.as_u64())
            .map(|r| r.neighbors.neighbors.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Rebuild one drone's neighbor graph from current positions and roles.
    ///
    /// Externally-fed fields (dock target, base stations) survive the
    /// rebuild. Stale drones hold an empty graph and appear in nobody
    /// else's.
    fn recompute_graph(&mut self, id: DroneId) {
        let mut graph = self.build_graph(id);
        if let Some(record) = self.drones.get_mut(&id.as_u64()) {
            graph.dock_target = record.neighbors.dock_target;
            graph.base_stations = record.neighbors.base_stations.clone();
            record.neighbors = graph;
        }
    }

    fn build_graph(&self, id: DroneId) -> NeighborGraph {
        let mut graph = NeighborGraph::empty();
        let Some(record) = self.drones.get(&id.as_u64()) else {
            return graph;
        };
        if record.stale {
            return graph;
        }

        let position = record.sensors.position;
        let chi = record.core.chi;

        for other in self.drones.values() {
            if other.id == id || other.stale {
                continue;
            }
            if position.distance_to(&other.sensors.position) <= self.config.comm_range_m {
                if graph.neighbors.push(other.id).is_err() {
                    warn!("neighbor capacity reached for {id}");
                    break;
                }
            }
        }

        // Derived role edges; ties resolve in registration order because
        // the drone map iterates in insertion order.
        for neighbor_id in graph.neighbors.iter() {
            let Some(other) = self.drones.get(&neighbor_id.as_u64()) else {
                continue;
            };
            match other.core.chi {
                FormationRole::Leader if chi == FormationRole::Follower => {
                    if graph.leader.is_none() {
                        graph.leader = Some(other.id);
                    }
                }
                FormationRole::Follower if chi == FormationRole::Leader => {
                    graph.followers.push(other.id).ok();
                }
                FormationRole::Relay => {
                    if graph.relay_source.is_none() {
                        graph.relay_source = Some(other.id);
                    }
                }
                _ => {}
            }
        }
        if chi == FormationRole::Relay {
            graph.relay_target = graph.neighbors.first().copied();
        }

        graph
    }
}
