//! Priority-ordered formation role assignment
//!
//! Every reassignment cycle walks a fixed rule ladder over the active
//! swarm: battery safety first, then the charging lifecycle, then mission
//! structure (relay, leader, performer counts). Later rules see earlier
//! decisions. Hysteresis suppresses churn on freshly-held roles, but
//! never the safety rule.

use crate::config::RoleConfig;
use crate::dimensions::FormationRole;
use crate::types::{DroneId, Position};
use crate::world::WorldModel;
use log::{debug, trace};
use std::collections::HashMap;

/// What the formation needs from the swarm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormationSpec {
    /// Minimum performers the show requires
    pub min_performers: usize,
    /// Whether a leader must exist
    pub needs_leader: bool,
    /// Formation center
    pub center: Position,
}

impl Default for FormationSpec {
    fn default() -> Self {
        Self {
            min_performers: 0,
            needs_leader: false,
            center: Position::default(),
        }
    }
}

/// What comm coverage needs from the swarm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageSpec {
    /// Radius the relay should sit near (m)
    pub coverage_radius: f32,
    /// Whether a relay must exist
    pub needs_relay: bool,
}

impl Default for CoverageSpec {
    fn default() -> Self {
        Self {
            coverage_radius: 10.0,
            needs_relay: false,
        }
    }
}

/// Ticks each drone has held its current role, owned by the coordinator
pub type RoleTickCounts = HashMap<DroneId, u32>;

/// The priority-ordered role rule system
pub struct RoleEngine<'a> {
    world: &'a WorldModel,
    config: &'a RoleConfig,
}

impl<'a> RoleEngine<'a> {
    /// Engine over a world snapshot
    pub fn new(world: &'a WorldModel, config: &'a RoleConfig) -> Self {
        Self { world, config }
    }

    /// Run the rule ladder and return only the roles that actually change,
    /// in registration order.
    pub fn assign_roles(
        &self,
        formation: &FormationSpec,
        coverage: &CoverageSpec,
        tick_counts: Option<&RoleTickCounts>,
    ) -> Vec<(DroneId, FormationRole)> {
        let active: Vec<_> = self.world.drones().filter(|r| !r.stale).collect();
        if active.is_empty() {
            return Vec::new();
        }

        let stored: Vec<FormationRole> = active.iter().map(|r| r.core.chi).collect();
        let mut effective = stored.clone();
        // Safety assignments are exempt from hysteresis
        let mut safety = vec![false; active.len()];

        // Rule 1: low battery forces the charging lifecycle
        for (i, record) in active.iter().enumerate() {
            if record.sensors.battery.percentage < self.config.battery_charge_threshold
                && !effective[i].in_charging_cycle()
            {
                debug!(
                    "{}: battery {:.2} below charge threshold, sending to charger",
                    record.id, record.sensors.battery.percentage
                );
                effective[i] = FormationRole::ChargerInbound;
                safety[i] = true;
            }
        }

        // Rule 2: charging completes at the return threshold
        for (i, record) in active.iter().enumerate() {
            if effective[i] == FormationRole::Charging
                && record.sensors.battery.percentage >= self.config.battery_return_threshold
            {
                effective[i] = FormationRole::ChargerOutbound;
            }
        }

        // Rule 3: outbound chargers rejoin once airborne
        for (i, record) in active.iter().enumerate() {
            if effective[i] == FormationRole::ChargerOutbound
                && !record.core.sigma.is_on_ground()
            {
                let performers = count_role(&effective, FormationRole::Performer);
                effective[i] = if performers < formation.min_performers {
                    FormationRole::Performer
                } else {
                    FormationRole::Reserve
                };
            }
        }

        // Rule 4: keep one relay near the coverage boundary
        if coverage.needs_relay && !effective.contains(&FormationRole::Relay) {
            let mut best: Option<(usize, f32)> = None;
            for (i, record) in active.iter().enumerate() {
                if !self.eligible(effective[i], record.sensors.battery.percentage) {
                    continue;
                }
                let boundary_error =
                    (record.sensors.position.norm() - coverage.coverage_radius).abs();
                let score = boundary_error - 0.01 * record.sensors.battery.percentage;
                match best {
                    Some((_, best_score)) if best_score <= score => {}
                    _ => best = Some((i, score)),
                }
            }
            if let Some((i, _)) = best {
                trace!("{}: assigned relay", active[i].id);
                effective[i] = FormationRole::Relay;
            }
        }

        // Rule 5: keep one leader, best battery with position quality as
        // the tie-break (battery within 0.001 counts as tied)
        if formation.needs_leader && !effective.contains(&FormationRole::Leader) {
            let mut best: Option<usize> = None;
            for (i, record) in active.iter().enumerate() {
                if !self.eligible(effective[i], record.sensors.battery.percentage) {
                    continue;
                }
                match best {
                    None => best = Some(i),
                    Some(j) => {
                        let battery = record.sensors.battery.percentage;
                        let best_battery = active[j].sensors.battery.percentage;
                        if battery > best_battery + 0.001 {
                            best = Some(i);
                        } else if (battery - best_battery).abs() <= 0.001
                            && record.sensors.position_quality
                                > active[j].sensors.position_quality
                        {
                            best = Some(i);
                        }
                    }
                }
            }
            if let Some(i) = best {
                trace!("{}: assigned leader", active[i].id);
                effective[i] = FormationRole::Leader;
            }
        }

        // Rule 6: promote reserves (best battery first) until the show is
        // staffed
        while count_role(&effective, FormationRole::Performer) < formation.min_performers {
            let mut pick: Option<usize> = None;
            for (i, record) in active.iter().enumerate() {
                if effective[i] != FormationRole::Reserve {
                    continue;
                }
                match pick {
                    Some(j)
                        if active[j].sensors.battery.percentage
                            >= record.sensors.battery.percentage => {}
                    _ => pick = Some(i),
                }
            }
            match pick {
                Some(i) => effective[i] = FormationRole::Performer,
                None => break,
            }
        }

        // Rule 7: demote surplus performers, weakest battery first, but
        // only those under half charge
        let performers = count_role(&effective, FormationRole::Performer);
        if performers > formation.min_performers {
            let mut excess = performers - formation.min_performers;
            let mut weak: Vec<usize> = (0..active.len())
                .filter(|&i| {
                    effective[i] == FormationRole::Performer
                        && active[i].sensors.battery.percentage < 0.50
                })
                .collect();
            weak.sort_by(|&a, &b| {
                active[a]
                    .sensors
                    .battery
                    .percentage
                    .partial_cmp(&active[b].sensors.battery.percentage)
                    .unwrap_or(core::cmp::Ordering::Equal)
            });
            for i in weak {
                if excess == 0 {
                    break;
                }
                effective[i] = FormationRole::Reserve;
                excess -= 1;
            }
        }

        // Rule 8: hysteresis drops fresh-role churn; safety stands
        if let Some(counts) = tick_counts {
            for (i, record) in active.iter().enumerate() {
                if effective[i] == stored[i] || safety[i] {
                    continue;
                }
                let held = counts.get(&record.id).copied().unwrap_or(0);
                if held < self.config.role_hysteresis_ticks {
                    trace!(
                        "{}: suppressing role change after {held} tick(s)",
                        record.id
                    );
                    effective[i] = stored[i];
                }
            }
        }

        active
            .iter()
            .enumerate()
            .filter(|(i, _)| effective[*i] != stored[*i])
            .map(|(i, record)| (record.id, effective[i]))
            .collect()
    }

    fn eligible(&self, role: FormationRole, battery: f32) -> bool {
        matches!(role, FormationRole::Performer | FormationRole::Reserve)
            && battery >= self.config.battery_charge_threshold
    }
}

fn count_role(effective: &[FormationRole], role: FormationRole) -> usize {
    effective.iter().filter(|&&r| r == role).count()
}
