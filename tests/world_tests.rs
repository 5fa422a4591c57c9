//! Comprehensive tests for the world model
//!
//! Tests cover:
//! - Registration defaults and lifecycle
//! - Neighbor graph symmetry under movement
//! - Derived role edges (leader/follower/relay)
//! - Staleness marking and revival
//! - Structural delta classification

use swarm_coordination_core::dependency::default_ownership;
use swarm_coordination_core::world::StructuralDimension;
use swarm_coordination_core::{
    AutonomyLevel, BehavioralMode, DroneId, FormationRole, HardwareTarget, PhysicalTraits,
    Position, ResourceOwnership, SensorState, WorldConfig, WorldModel,
};

const HOVER: &str = "hover-autonomous-performer-bare.crazyflie-2.1";

fn world(comm_range: f32) -> WorldModel {
    WorldModel::new(WorldConfig {
        comm_range_m: comm_range,
        ..WorldConfig::default()
    })
}

fn add(w: &mut WorldModel, id: u64, x: f32, y: f32, now_ms: u64) {
    w.add_drone(
        DroneId::new(id),
        HardwareTarget::Crazyflie21,
        PhysicalTraits::Bare,
        HOVER,
        SensorState::stationary(Position::new(x, y, 1.0)),
        now_ms,
    )
    .unwrap();
}

fn set_role(w: &mut WorldModel, id: u64, chi: FormationRole) {
    w.update_pattern(
        DroneId::new(id),
        HOVER,
        BehavioralMode::Hover,
        AutonomyLevel::Autonomous,
        chi,
        default_ownership(chi),
    );
}

// ============================================================================
// Registration and Lifecycle
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_new_drone_starts_grounded_reserve() {
        let mut w = world(5.0);
        add(&mut w, 1, 0.0, 0.0, 0);
        let record = w.get_drone(DroneId::new(1)).unwrap();
        assert_eq!(record.core.sigma, BehavioralMode::Grounded);
        assert_eq!(record.core.chi, FormationRole::Reserve);
        assert_eq!(record.core.lambda, ResourceOwnership::SharedCorridor);
        assert_eq!(record.current_pattern, HOVER);
        assert_eq!(w.get_active_drone_ids(), vec![DroneId::new(1)]);
    }

    #[test]
    fn test_remove_returns_existence() {
        let mut w = world(5.0);
        add(&mut w, 1, 0.0, 0.0, 0);
        assert!(w.remove_drone(DroneId::new(1)));
        assert!(!w.remove_drone(DroneId::new(1)));
        assert!(w.is_empty());
    }

    #[test]
    fn test_active_ids_in_registration_order() {
        let mut w = world(5.0);
        add(&mut w, 5, 0.0, 0.0, 0);
        add(&mut w, 1, 1.0, 0.0, 0);
        add(&mut w, 3, 2.0, 0.0, 0);
        assert_eq!(
            w.get_active_drone_ids(),
            vec![DroneId::new(5), DroneId::new(1), DroneId::new(3)]
        );
    }
}

// ============================================================================
// Neighbor Graph
// ============================================================================

mod neighbor_tests {
    use super::*;

    #[test]
    fn test_comm_range_boundary_inclusive() {
        let mut w = world(3.0);
        add(&mut w, 1, 0.0, 0.0, 0);
        add(&mut w, 2, 3.0, 0.0, 0);
        // Exactly at range: still neighbors
        assert!(w
            .get_neighbor_graph(DroneId::new(1))
            .unwrap()
            .has_neighbor(DroneId::new(2)));
    }

    #[test]
    fn test_symmetry_after_movement() {
        let mut w = world(5.0);
        add(&mut w, 1, 0.0, 0.0, 0);
        add(&mut w, 2, 2.0, 0.0, 0);
        add(&mut w, 3, 20.0, 0.0, 0);

        // Drone 3 flies into range of both
        w.update_telemetry(
            DroneId::new(3),
            SensorState::stationary(Position::new(1.0, 1.0, 1.0)),
            100,
        );
        for (a, b) in [(1u64, 3u64), (2, 3), (1, 2)] {
            assert!(w
                .get_neighbor_graph(DroneId::new(a))
                .unwrap()
                .has_neighbor(DroneId::new(b)));
            assert!(w
                .get_neighbor_graph(DroneId::new(b))
                .unwrap()
                .has_neighbor(DroneId::new(a)));
        }

        // And leaves again
        w.update_telemetry(
            DroneId::new(3),
            SensorState::stationary(Position::new(50.0, 0.0, 1.0)),
            200,
        );
        assert!(!w
            .get_neighbor_graph(DroneId::new(1))
            .unwrap()
            .has_neighbor(DroneId::new(3)));
        assert!(!w
            .get_neighbor_graph(DroneId::new(3))
            .unwrap()
            .has_neighbor(DroneId::new(1)));
    }

    #[test]
    fn test_first_leader_in_registration_order_wins() {
        let mut w = world(10.0);
        add(&mut w, 1, 0.0, 0.0, 0);
        add(&mut w, 2, 1.0, 0.0, 0);
        add(&mut w, 3, 2.0, 0.0, 0);
        set_role(&mut w, 1, FormationRole::Leader);
        set_role(&mut w, 2, FormationRole::Leader);
        set_role(&mut w, 3, FormationRole::Follower);
        // Two leaders in range: the earliest-registered one is chosen
        let graph = w.get_neighbor_graph(DroneId::new(3)).unwrap();
        assert_eq!(graph.leader, Some(DroneId::new(1)));
    }

    #[test]
    fn test_relay_target_is_first_neighbor() {
        let mut w = world(10.0);
        add(&mut w, 1, 0.0, 0.0, 0);
        add(&mut w, 2, 1.0, 0.0, 0);
        add(&mut w, 3, 2.0, 0.0, 0);
        set_role(&mut w, 2, FormationRole::Relay);
        let graph = w.get_neighbor_graph(DroneId::new(2)).unwrap();
        assert_eq!(graph.relay_target, Some(DroneId::new(1)));
        // Both neighbors see the relay as their source
        assert_eq!(
            w.get_neighbor_graph(DroneId::new(1)).unwrap().relay_source,
            Some(DroneId::new(2))
        );
        assert_eq!(
            w.get_neighbor_graph(DroneId::new(3)).unwrap().relay_source,
            Some(DroneId::new(2))
        );
    }

    #[test]
    fn test_role_edges_update_on_role_change() {
        let mut w = world(10.0);
        add(&mut w, 1, 0.0, 0.0, 0);
        add(&mut w, 2, 1.0, 0.0, 0);
        set_role(&mut w, 1, FormationRole::Leader);
        set_role(&mut w, 2, FormationRole::Follower);
        assert_eq!(
            w.get_neighbor_graph(DroneId::new(2)).unwrap().leader,
            Some(DroneId::new(1))
        );
        // Leader steps down: the follower's edge disappears
        set_role(&mut w, 1, FormationRole::Reserve);
        assert_eq!(w.get_neighbor_graph(DroneId::new(2)).unwrap().leader, None);
    }
}

// ============================================================================
// Staleness
// ============================================================================

mod staleness_tests {
    use super::*;

    #[test]
    fn test_threshold_is_strict() {
        let mut w = world(5.0);
        add(&mut w, 1, 0.0, 0.0, 0);
        // Exactly at the threshold: not yet stale
        assert!(w.mark_stale_drones(500).is_empty());
        // One past: stale
        assert_eq!(w.mark_stale_drones(501), vec![DroneId::new(1)]);
    }

    #[test]
    fn test_stale_drone_leaves_all_graphs() {
        let mut w = world(5.0);
        add(&mut w, 1, 0.0, 0.0, 0);
        add(&mut w, 2, 1.0, 0.0, 0);
        w.update_telemetry(
            DroneId::new(1),
            SensorState::stationary(Position::new(0.0, 0.0, 1.0)),
            600,
        );
        assert_eq!(w.mark_stale_drones(600), vec![DroneId::new(2)]);
        assert!(w
            .get_neighbor_graph(DroneId::new(1))
            .unwrap()
            .neighbors
            .is_empty());
        assert_eq!(w.get_active_drone_ids(), vec![DroneId::new(1)]);
    }

    #[test]
    fn test_all_drones_stale_empties_active_list() {
        let mut w = world(5.0);
        add(&mut w, 1, 0.0, 0.0, 0);
        add(&mut w, 2, 1.0, 0.0, 0);
        let stale = w.mark_stale_drones(10_000);
        assert_eq!(stale.len(), 2);
        assert!(w.get_active_drone_ids().is_empty());
    }

    #[test]
    fn test_telemetry_revives() {
        let mut w = world(5.0);
        add(&mut w, 1, 0.0, 0.0, 0);
        w.mark_stale_drones(10_000);
        w.update_telemetry(
            DroneId::new(1),
            SensorState::stationary(Position::new(0.0, 0.0, 1.0)),
            10_001,
        );
        assert!(!w.get_drone(DroneId::new(1)).unwrap().stale);
        assert_eq!(w.get_active_drone_ids(), vec![DroneId::new(1)]);
    }
}

// ============================================================================
// Delta Classification
// ============================================================================

mod delta_tests {
    use super::*;

    #[test]
    fn test_role_change_is_structural() {
        let mut w = world(5.0);
        add(&mut w, 1, 0.0, 0.0, 0);
        let delta = w.update_pattern(
            DroneId::new(1),
            HOVER,
            BehavioralMode::Grounded,
            AutonomyLevel::Autonomous,
            FormationRole::Performer,
            ResourceOwnership::SharedCorridor,
        );
        assert!(delta.is_structural());
        assert_eq!(delta.changed.len(), 1);
        assert!(delta.contains(StructuralDimension::Chi));
    }

    #[test]
    fn test_telemetry_is_never_structural() {
        let mut w = world(5.0);
        add(&mut w, 1, 0.0, 0.0, 0);
        let before = w.get_drone(DroneId::new(1)).unwrap().core;
        w.update_telemetry(
            DroneId::new(1),
            SensorState::stationary(Position::new(9.0, 9.0, 9.0)).with_battery(0.01),
            50,
        );
        let after = w.get_drone(DroneId::new(1)).unwrap().core;
        assert_eq!(before, after);
    }

    #[test]
    fn test_multi_dimension_delta() {
        let mut w = world(5.0);
        add(&mut w, 1, 0.0, 0.0, 0);
        let delta = w.update_pattern(
            DroneId::new(1),
            HOVER,
            BehavioralMode::Hover,
            AutonomyLevel::Emergency,
            FormationRole::Performer,
            ResourceOwnership::SharedCorridor,
        );
        assert_eq!(delta.changed.len(), 3);
        assert!(delta.contains(StructuralDimension::Sigma));
        assert!(delta.contains(StructuralDimension::Kappa));
        assert!(delta.contains(StructuralDimension::Chi));
        assert!(!delta.contains(StructuralDimension::Lambda));
    }
}

// ============================================================================
// Metrics
// ============================================================================

mod metrics_tests {
    use super::*;

    #[test]
    fn test_metrics_over_active_drones() {
        let mut w = world(5.0);
        add(&mut w, 1, 0.0, 0.0, 0);
        add(&mut w, 2, 2.0, 0.0, 0);
        add(&mut w, 3, 4.0, 0.0, 0);
        let metrics = w.metrics();
        assert_eq!(metrics.active_drones, 3);
        assert!((metrics.center.x - 2.0).abs() < 0.001);
        assert!((metrics.min_separation_m - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_metrics_empty_world() {
        let w = world(5.0);
        let metrics = w.metrics();
        assert_eq!(metrics.active_drones, 0);
        assert_eq!(metrics.total_drones, 0);
        assert_eq!(metrics.min_separation_m, 0.0);
    }

    #[test]
    fn test_metrics_exclude_stale() {
        let mut w = world(5.0);
        add(&mut w, 1, 0.0, 0.0, 0);
        add(&mut w, 2, 100.0, 0.0, 0);
        w.update_telemetry(
            DroneId::new(1),
            SensorState::stationary(Position::new(0.0, 0.0, 1.0)),
            1000,
        );
        w.mark_stale_drones(1000);
        let metrics = w.metrics();
        assert_eq!(metrics.active_drones, 1);
        assert_eq!(metrics.total_drones, 2);
        assert!((metrics.spread_m - 0.0).abs() < 0.001);
    }
}
