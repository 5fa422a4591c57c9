//! Tick-driven coordination loop
//!
//! Composes the world model, blast-radius engine, constraint engine, and
//! role engine behind a single-threaded tick: drain telemetry, mark stale
//! drones, scan forced exits, close the blast radius, solve, apply, and
//! every N ticks rotate formation roles. Command sends are fire-and-forget
//! and the loop never raises on operational events.

use crate::blast::combined_blast_radius;
use crate::catalog::CatalogIndex;
use crate::comms::{telemetry_flags, DroneCommand, SwarmComms, TelemetryFrame};
use crate::config::CoordinatorConfig;
use crate::constraint::{
    forced_exit_condition_holds, Assignment, ConstraintEngine, SwarmObjective,
};
use crate::dependency::default_ownership;
use crate::dimensions::{
    AutonomyLevel, BehavioralMode, HardwareTarget, PartialCorePattern, PhysicalTraits,
};
use crate::roles::{CoverageSpec, FormationSpec, RoleEngine, RoleTickCounts};
use crate::types::{DroneId, Result, SensorState};
use crate::world::WorldModel;
use log::{debug, info, trace, warn};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Observability hook fired at the end of every tick
pub type TickHook = Box<dyn FnMut(u64, &[Assignment])>;

/// Observability hook fired once at shutdown
pub type ShutdownHook = Box<dyn FnMut()>;

/// The ground-station coordination loop
pub struct Coordinator<C: SwarmComms> {
    comms: C,
    catalog: CatalogIndex,
    config: CoordinatorConfig,
    world: WorldModel,
    /// Pattern id string → wire id, frozen at startup from catalog order
    numeric_ids: HashMap<String, u16>,
    tick: u64,
    role_tick_counts: RoleTickCounts,
    running: bool,
    epoch: Instant,
    on_tick: Option<TickHook>,
    on_shutdown: Option<ShutdownHook>,
    /// Swarm-level goals biasing the constraint engine
    pub objectives: Vec<SwarmObjective>,
    /// Formation requirements for the role engine
    pub formation: FormationSpec,
    /// Coverage requirements for the role engine
    pub coverage: CoverageSpec,
}

impl<C: SwarmComms> Coordinator<C> {
    /// Build a coordinator over a validated catalog.
    ///
    /// The numeric pattern-id table is frozen here; it is stable across
    /// runs as long as catalog load order is.
    pub fn new(comms: C, catalog: CatalogIndex, config: CoordinatorConfig) -> Self {
        let numeric_ids = catalog
            .patterns()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i as u16))
            .collect();
        Self {
            comms,
            world: WorldModel::new(config.world),
            catalog,
            config,
            numeric_ids,
            tick: 0,
            role_tick_counts: RoleTickCounts::new(),
            running: false,
            epoch: Instant::now(),
            on_tick: None,
            on_shutdown: None,
            objectives: Vec::new(),
            formation: FormationSpec::default(),
            coverage: CoverageSpec::default(),
        }
    }

    /// The world model (read-only)
    pub fn world(&self) -> &WorldModel {
        &self.world
    }

    /// The catalog
    pub fn catalog(&self) -> &CatalogIndex {
        &self.catalog
    }

    /// The comms implementation (for inspection in tests)
    pub fn comms(&self) -> &C {
        &self.comms
    }

    /// Mutable comms access (for scripting the simulator in tests)
    pub fn comms_mut(&mut self) -> &mut C {
        &mut self.comms
    }

    /// Tick counter
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Whether the loop is running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Wire id for a pattern string, from the startup table
    pub fn numeric_pattern_id(&self, pattern_id: &str) -> Option<u16> {
        self.numeric_ids.get(pattern_id).copied()
    }

    /// Pattern string for a wire id
    pub fn pattern_for_numeric(&self, numeric: u16) -> Option<&str> {
        self.catalog.by_index(numeric as usize).map(|p| p.id.as_str())
    }

    /// Install the per-tick observability hook
    pub fn set_on_tick(&mut self, hook: TickHook) {
        self.on_tick = Some(hook);
    }

    /// Install the shutdown hook
    pub fn set_on_shutdown(&mut self, hook: ShutdownHook) {
        self.on_shutdown = Some(hook);
    }

    /// Register a drone; it starts grounded in reserve
    pub fn register_drone(
        &mut self,
        id: DroneId,
        rho: HardwareTarget,
        tau: PhysicalTraits,
        initial_pattern_id: &str,
        telemetry: SensorState,
    ) -> Result<()> {
        let now_ms = self.now_ms();
        self.world
            .add_drone(id, rho, tau, initial_pattern_id, telemetry, now_ms)?;
        self.role_tick_counts.insert(id, 0);
        Ok(())
    }

    /// Deregister a drone
    pub fn deregister_drone(&mut self, id: DroneId) -> bool {
        self.role_tick_counts.remove(&id);
        self.world.remove_drone(id)
    }

    /// Connect the link and start ticking
    pub fn start(&mut self, drones: &[DroneId]) -> Result<()> {
        self.comms.connect(drones)?;
        self.running = true;
        info!("coordinator started for {} drone(s)", drones.len());
        Ok(())
    }

    /// Stop the loop: land everything best-effort, disconnect, fire the
    /// shutdown hook
    pub fn stop(&mut self) -> Result<()> {
        self.running = false;
        for id in self.world.drone_ids() {
            let Some(record) = self.world.get_drone(id) else {
                continue;
            };
            let (rho, tau) = (record.core.rho, record.core.tau);
            let hardware = PartialCorePattern::for_hardware(rho, tau);
            let landing = self
                .catalog
                .filter_by_core(&hardware.with_sigma(BehavioralMode::Land))
                .into_iter()
                .next()
                .or_else(|| {
                    self.catalog
                        .filter_by_core(&hardware.with_sigma(BehavioralMode::Grounded))
                        .into_iter()
                        .next()
                });
            if let Some(pattern) = landing {
                if let Some(&numeric) = self.numeric_ids.get(&pattern.id) {
                    if let Err(e) = self.comms.send_command(id, &DroneCommand::pattern(numeric)) {
                        debug!("landing command to {id} failed: {e}");
                    }
                }
            }
        }
        if let Err(e) = self.comms.disconnect() {
            debug!("disconnect failed: {e}");
        }
        if let Some(hook) = self.on_shutdown.as_mut() {
            hook();
        }
        info!("coordinator stopped at tick {}", self.tick);
        Ok(())
    }

    /// Run one tick against the wall clock
    pub fn tick(&mut self) -> Vec<Assignment> {
        let now_ms = self.now_ms();
        self.tick_at(now_ms)
    }

    /// Run one tick at an explicit monotonic time (test control of time)
    pub fn tick_at(&mut self, now_ms: u64) -> Vec<Assignment> {
        self.tick += 1;

        // Absorb everything the link delivered before this tick
        while let Some(frame) = self.comms.recv_telemetry() {
            self.ingest_telemetry(frame, now_ms);
        }

        self.world.mark_stale_drones(now_ms);

        // Forced-exit scan seeds the changed set
        let mut changed: Vec<DroneId> = Vec::new();
        for id in self.world.get_active_drone_ids() {
            let Some(record) = self.world.get_drone(id) else {
                continue;
            };
            if let Some(pattern) = self.catalog.lookup(&record.current_pattern) {
                let tripped = pattern
                    .postconditions
                    .forced_exits
                    .iter()
                    .any(|exit| forced_exit_condition_holds(&exit.condition, &record.sensors));
                if tripped {
                    changed.push(id);
                }
            }
        }

        let mut assignments = Vec::new();
        if !changed.is_empty() {
            debug!("tick {}: {} forced exit(s)", self.tick, changed.len());
            let affected = combined_blast_radius(&self.world, &changed);
            let solved =
                ConstraintEngine::new(&self.world, &self.catalog).solve(&affected, &self.objectives);
            self.apply_assignments(&solved);
            assignments.extend(solved);
        }

        if self.tick % self.config.role_reassignment_interval == 0 {
            let role_assignments = self.reassign_roles();
            assignments.extend(role_assignments);
        }

        if let Some(hook) = self.on_tick.as_mut() {
            hook(self.tick, &assignments);
        }
        assignments
    }

    /// Blocking tick loop for the given number of ticks; stops early if
    /// the coordinator is stopped from a hook
    pub fn run_for_ticks(&mut self, ticks: u64) -> u64 {
        let interval = Duration::from_millis(self.config.tick_interval_ms);
        let mut executed = 0;
        for _ in 0..ticks {
            if !self.running {
                break;
            }
            let started = Instant::now();
            self.tick();
            executed += 1;
            let elapsed = started.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
        executed
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn ingest_telemetry(&mut self, frame: TelemetryFrame, now_ms: u64) {
        if !self.world.contains(frame.drone_id) {
            trace!("telemetry from unregistered {} dropped", frame.drone_id);
            return;
        }
        if frame.status_flags & telemetry_flags::EMERGENCY != 0 {
            warn!("{} reports firmware emergency", frame.drone_id);
        }
        if frame.status_flags & telemetry_flags::COMM_LOST != 0 {
            warn!("{} reports a comm-loss episode", frame.drone_id);
        }
        self.world
            .update_telemetry(frame.drone_id, frame.sensors, now_ms);
    }

    /// Periodic role rotation: rules run first, then blast radius over the
    /// changed drones, then the role changes land in the world, then the
    /// constraint engine re-solves the affected set.
    fn reassign_roles(&mut self) -> Vec<Assignment> {
        let changes = RoleEngine::new(&self.world, &self.config.role).assign_roles(
            &self.formation,
            &self.coverage,
            Some(&self.role_tick_counts),
        );

        let mut assignments = Vec::new();
        if !changes.is_empty() {
            debug!("tick {}: {} role change(s)", self.tick, changes.len());
            let changed_ids: Vec<DroneId> = changes.iter().map(|(id, _)| *id).collect();
            let affected = combined_blast_radius(&self.world, &changed_ids);

            for (id, role) in &changes {
                let Some((core, pattern)) = self
                    .world
                    .get_drone(*id)
                    .map(|r| (r.core, r.current_pattern.clone()))
                else {
                    continue;
                };
                self.world.update_pattern(
                    *id,
                    &pattern,
                    core.sigma,
                    core.kappa,
                    *role,
                    default_ownership(*role),
                );
            }

            let solved =
                ConstraintEngine::new(&self.world, &self.catalog).solve(&affected, &self.objectives);
            self.apply_assignments(&solved);
            assignments = solved;
        }

        // Hysteresis bookkeeping: everyone ages one cycle, changed drones
        // start over
        for id in self.world.get_active_drone_ids() {
            *self.role_tick_counts.entry(id).or_insert(0) += 1;
        }
        for (id, _) in &changes {
            self.role_tick_counts.insert(*id, 0);
        }

        assignments
    }

    /// Write assignments into the world model and emit commands.
    ///
    /// Assignments whose pattern is missing from the catalog (the
    /// degenerate retain-current fallback) leave the world untouched and
    /// send nothing. Send failures are swallowed; the drone keeps flying
    /// its last pattern.
    fn apply_assignments(&mut self, assignments: &[Assignment]) {
        for assignment in assignments {
            let Some(pattern) = self.catalog.lookup(&assignment.pattern_id) else {
                trace!(
                    "{}: retaining unknown pattern {}",
                    assignment.drone_id,
                    assignment.pattern_id
                );
                continue;
            };
            let core = pattern.core;
            self.world.update_pattern(
                assignment.drone_id,
                &assignment.pattern_id,
                core.sigma,
                core.kappa,
                core.chi,
                core.lambda,
            );

            let Some(&numeric) = self.numeric_ids.get(&assignment.pattern_id) else {
                continue;
            };
            let mut command = DroneCommand::pattern(numeric);
            command.target_position = assignment.target_position;
            command.target_velocity = assignment.target_velocity;
            if core.kappa == AutonomyLevel::Emergency {
                command.flags |= crate::comms::command_flags::EMERGENCY;
            }
            if let Err(e) = self.comms.send_command(assignment.drone_id, &command) {
                debug!("command to {} failed: {e}", assignment.drone_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BehavioralPattern;
    use crate::comms::SimulatedComms;
    use crate::dependency::default_ownership as ownership;
    use crate::dimensions::{CorePattern, FormationRole};
    use crate::types::Position;

    const HOVER: &str = "hover-autonomous-performer-bare.crazyflie-2.1";
    const LAND: &str = "land-autonomous-performer-bare.crazyflie-2.1";
    const EMERGENCY_LAND: &str = "land-emergency-performer-bare.crazyflie-2.1";
    const GROUNDED: &str = "grounded-autonomous-reserve-bare.crazyflie-2.1";

    fn core(sigma: BehavioralMode, kappa: AutonomyLevel, chi: FormationRole) -> CorePattern {
        CorePattern {
            sigma,
            kappa,
            chi,
            lambda: ownership(chi),
            tau: PhysicalTraits::Bare,
            rho: HardwareTarget::Crazyflie21,
        }
    }

    fn catalog() -> CatalogIndex {
        let hover = BehavioralPattern::new(core(
            BehavioralMode::Hover,
            AutonomyLevel::Autonomous,
            FormationRole::Performer,
        ))
        .with_valid_to(&[LAND])
        .with_forced_exit("battery < 0.10", EMERGENCY_LAND);
        let land = BehavioralPattern::new(core(
            BehavioralMode::Land,
            AutonomyLevel::Autonomous,
            FormationRole::Performer,
        ))
        .with_valid_from(&[HOVER])
        .with_valid_to(&[GROUNDED]);
        let emergency_land = BehavioralPattern::new(core(
            BehavioralMode::Land,
            AutonomyLevel::Emergency,
            FormationRole::Performer,
        ))
        .with_valid_to(&[GROUNDED]);
        let grounded = BehavioralPattern::new(core(
            BehavioralMode::Grounded,
            AutonomyLevel::Autonomous,
            FormationRole::Reserve,
        ))
        .with_valid_from(&[LAND, EMERGENCY_LAND]);
        CatalogIndex::new(vec![hover, land, emergency_land, grounded], vec![])
    }

    fn hovering_coordinator(battery: f32) -> Coordinator<SimulatedComms> {
        let mut coordinator = Coordinator::new(
            SimulatedComms::new(),
            catalog(),
            CoordinatorConfig::default(),
        );
        coordinator
            .register_drone(
                DroneId::new(0),
                HardwareTarget::Crazyflie21,
                PhysicalTraits::Bare,
                HOVER,
                SensorState::stationary(Position::new(0.0, 0.0, 1.0)).with_battery(battery),
            )
            .unwrap();
        // Reflect the hover pattern in the structural state
        coordinator.world.update_pattern(
            DroneId::new(0),
            HOVER,
            BehavioralMode::Hover,
            AutonomyLevel::Autonomous,
            FormationRole::Performer,
            ownership(FormationRole::Performer),
        );
        coordinator.start(&[DroneId::new(0)]).unwrap();
        coordinator
    }

    #[test]
    fn test_numeric_table_follows_load_order() {
        let coordinator = Coordinator::new(
            SimulatedComms::new(),
            catalog(),
            CoordinatorConfig::default(),
        );
        assert_eq!(coordinator.numeric_pattern_id(HOVER), Some(0));
        assert_eq!(coordinator.numeric_pattern_id(LAND), Some(1));
        assert_eq!(coordinator.numeric_pattern_id(GROUNDED), Some(3));
        assert_eq!(coordinator.pattern_for_numeric(1), Some(LAND));
        assert_eq!(coordinator.numeric_pattern_id("missing"), None);
        assert_eq!(coordinator.pattern_for_numeric(9), None);
    }

    #[test]
    fn test_quiet_tick_produces_nothing() {
        let mut coordinator = hovering_coordinator(0.8);
        let assignments = coordinator.tick_at(10);
        assert!(assignments.is_empty());
        assert_eq!(coordinator.current_tick(), 1);
        assert_eq!(coordinator.comms().total_sent(), 0);
    }

    #[test]
    fn test_forced_exit_emits_emergency_command() {
        let mut coordinator = hovering_coordinator(0.05);
        let assignments = coordinator.tick_at(10);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].pattern_id, EMERGENCY_LAND);

        // World took the structural update
        let record = coordinator.world().get_drone(DroneId::new(0)).unwrap();
        assert_eq!(record.current_pattern, EMERGENCY_LAND);
        assert_eq!(record.core.kappa, AutonomyLevel::Emergency);

        // Command carries the numeric id and the emergency flag
        let command = coordinator.comms().last_command(DroneId::new(0)).unwrap();
        assert_eq!(
            coordinator.pattern_for_numeric(command.pattern_id),
            Some(EMERGENCY_LAND)
        );
        assert_ne!(command.flags & crate::comms::command_flags::EMERGENCY, 0);
    }

    #[test]
    fn test_telemetry_drained_before_solving() {
        let mut coordinator = hovering_coordinator(0.8);
        // Battery collapses via telemetry; the same tick must react
        let mut frame = TelemetryFrame::new(
            DroneId::new(0),
            SensorState::stationary(Position::new(0.0, 0.0, 1.0)).with_battery(0.05),
        );
        frame.status_flags |= telemetry_flags::LOW_BATTERY;
        coordinator.comms.push_telemetry(frame);
        let assignments = coordinator.tick_at(10);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].pattern_id, EMERGENCY_LAND);
    }

    #[test]
    fn test_unknown_telemetry_ignored() {
        let mut coordinator = hovering_coordinator(0.8);
        coordinator
            .comms
            .push_telemetry(TelemetryFrame::new(DroneId::new(77), SensorState::default()));
        let assignments = coordinator.tick_at(10);
        assert!(assignments.is_empty());
        assert_eq!(coordinator.world().len(), 1);
    }

    #[test]
    fn test_send_failure_is_swallowed() {
        let mut coordinator = hovering_coordinator(0.05);
        coordinator.comms.fail_sends = true;
        let assignments = coordinator.tick_at(10);
        // Assignment still happens; only delivery failed
        assert_eq!(assignments.len(), 1);
        assert_eq!(coordinator.comms().total_sent(), 0);
    }

    #[test]
    fn test_role_cycle_runs_on_interval() {
        let mut coordinator = hovering_coordinator(0.8);
        coordinator.formation = FormationSpec {
            min_performers: 1,
            needs_leader: true,
            center: Position::default(),
        };
        // Pretend the drone has held its role long enough for hysteresis
        coordinator.role_tick_counts.insert(DroneId::new(0), 10);
        // Ticks 1..99: no role cycle
        for t in 1..100 {
            assert!(coordinator.tick_at(t).is_empty());
        }
        // Tick 100: the role engine promotes the sole drone to leader and
        // the affected set re-solves
        let assignments = coordinator.tick_at(100);
        assert!(assignments.iter().any(|a| a.pattern_id == HOVER));
        // The change registered for hysteresis purposes
        assert_eq!(coordinator.role_tick_counts[&DroneId::new(0)], 0);
        // The re-solve kept the drone on its hover pattern, whose core
        // carries the performer role back into the world
        let record = coordinator.world().get_drone(DroneId::new(0)).unwrap();
        assert_eq!(record.current_pattern, HOVER);
        assert_eq!(record.core.chi, FormationRole::Performer);
    }

    #[test]
    fn test_hysteresis_counters_age_and_reset() {
        let mut coordinator = hovering_coordinator(0.8);
        coordinator.formation = FormationSpec {
            min_performers: 0,
            needs_leader: true,
            center: Position::default(),
        };
        coordinator.role_tick_counts.insert(DroneId::new(0), 10);
        for t in 1..=100 {
            coordinator.tick_at(t);
        }
        // Role changed on the first cycle: counter reset to zero
        assert_eq!(coordinator.role_tick_counts[&DroneId::new(0)], 0);
        for t in 101..=200 {
            coordinator.tick_at(t);
        }
        // No change on the second cycle: counter aged by one
        assert_eq!(coordinator.role_tick_counts[&DroneId::new(0)], 1);
    }

    #[test]
    fn test_on_tick_hook_fires() {
        use std::cell::RefCell;
        use std::rc::Rc;
        let seen: Rc<RefCell<Vec<u64>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut coordinator = hovering_coordinator(0.8);
        coordinator.set_on_tick(Box::new(move |tick, _| sink.borrow_mut().push(tick)));
        coordinator.tick_at(10);
        coordinator.tick_at(20);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_stop_lands_and_disconnects() {
        use std::cell::Cell;
        use std::rc::Rc;
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        let mut coordinator = hovering_coordinator(0.8);
        coordinator.set_on_shutdown(Box::new(move || flag.set(true)));
        coordinator.stop().unwrap();
        assert!(!coordinator.is_running());
        assert!(!coordinator.comms().is_connected());
        assert!(fired.get());
        let command = coordinator.comms().last_command(DroneId::new(0)).unwrap();
        assert_eq!(coordinator.pattern_for_numeric(command.pattern_id), Some(LAND));
    }

    #[test]
    fn test_stale_drone_sits_out() {
        let mut coordinator = hovering_coordinator(0.05);
        // Well past the stale threshold with no telemetry: the forced-exit
        // scan must skip the drone entirely
        let assignments = coordinator.tick_at(10_000);
        assert!(assignments.is_empty());
        assert!(coordinator.world().get_drone(DroneId::new(0)).unwrap().stale);
    }

    #[test]
    fn test_deregister() {
        let mut coordinator = hovering_coordinator(0.8);
        assert!(coordinator.deregister_drone(DroneId::new(0)));
        assert!(!coordinator.deregister_drone(DroneId::new(0)));
        assert!(coordinator.world().is_empty());
    }
}
