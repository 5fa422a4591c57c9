//! Per-drone catalog constraint solving
//!
//! For every affected drone the engine filters the catalog down to
//! patterns its hardware can fly, its sensors admit, its current pattern
//! can reach, and its neighbors tolerate, then picks the best-scoring
//! survivor. Forced exits short-circuit everything; an empty survivor set
//! walks the fallback chain (hover, then any zero-floor emergency pattern,
//! then the current pattern). The engine never fails: missing drones are
//! skipped and missing patterns degrade to fallbacks.

use crate::catalog::CatalogIndex;
use crate::dimensions::{BehavioralMode, PartialCorePattern};
use crate::types::{DroneId, Position, SensorState, Velocity};
use crate::world::{DroneRecord, WorldModel};
use log::{debug, trace};
use std::collections::HashMap;

/// A swarm-level goal biasing pattern selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwarmObjective {
    /// Hold a formation around a center
    Formation {
        /// Formation center
        center: Position,
    },
    /// Orbit a center point
    Orbit {
        /// Orbit center
        center: Position,
        /// Orbit radius (m)
        radius: f32,
    },
    /// Translate to a target
    Translate {
        /// Destination
        target: Position,
    },
    /// Hold position
    Hover,
    /// Bring the whole swarm down
    LandAll,
}

impl SwarmObjective {
    /// The behavioral mode this objective favors
    pub const fn favored_sigma(&self) -> BehavioralMode {
        match self {
            SwarmObjective::Formation { .. } => BehavioralMode::FormationHold,
            SwarmObjective::Orbit { .. } => BehavioralMode::Orbit,
            SwarmObjective::Translate { .. } => BehavioralMode::Translate,
            SwarmObjective::Hover => BehavioralMode::Hover,
            SwarmObjective::LandAll => BehavioralMode::Land,
        }
    }

    /// Target position carried by the objective, if any
    pub const fn target_position(&self) -> Option<Position> {
        match self {
            SwarmObjective::Formation { center } => Some(*center),
            SwarmObjective::Orbit { center, .. } => Some(*center),
            SwarmObjective::Translate { target } => Some(*target),
            SwarmObjective::Hover | SwarmObjective::LandAll => None,
        }
    }
}

/// One solved pattern assignment
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// The drone being assigned
    pub drone_id: DroneId,
    /// Catalog id of the assigned pattern
    pub pattern_id: String,
    /// Optional position target for the generator
    pub target_position: Option<Position>,
    /// Optional velocity target for the generator
    pub target_velocity: Option<Velocity>,
}

impl Assignment {
    fn bare(drone_id: DroneId, pattern_id: &str) -> Self {
        Self {
            drone_id,
            pattern_id: pattern_id.to_string(),
            target_position: None,
            target_velocity: None,
        }
    }
}

/// Evaluate a forced-exit condition against sensor state.
///
/// The grammar is a single comparison `<field> < <number>` with field
/// `battery` or `position_quality`. Anything else is false, never an
/// error.
pub fn forced_exit_condition_holds(condition: &str, sensors: &SensorState) -> bool {
    let mut tokens = condition.split_whitespace();
    let (Some(field), Some(op), Some(value), None) =
        (tokens.next(), tokens.next(), tokens.next(), tokens.next())
    else {
        return false;
    };
    if op != "<" {
        return false;
    }
    let Ok(threshold) = value.parse::<f32>() else {
        return false;
    };
    match field {
        "battery" => sensors.battery.percentage < threshold,
        "position_quality" => sensors.position_quality < threshold,
        _ => false,
    }
}

/// Greedy per-drone selection over the affected set
pub struct ConstraintEngine<'a> {
    world: &'a WorldModel,
    catalog: &'a CatalogIndex,
}

impl<'a> ConstraintEngine<'a> {
    /// Engine over a world snapshot and the loaded catalog
    pub fn new(world: &'a WorldModel, catalog: &'a CatalogIndex) -> Self {
        Self { world, catalog }
    }

    /// Produce one assignment per affected drone, in the order given.
    ///
    /// Drones missing from the world model are skipped. Later drones see
    /// the assignments already made to their neighbors during this call.
    pub fn solve(&self, affected: &[DroneId], objectives: &[SwarmObjective]) -> Vec<Assignment> {
        let mut assignments = Vec::new();
        let mut assigned_now: HashMap<u64, String> = HashMap::new();

        for id in affected {
            let Some(record) = self.world.get_drone(*id) else {
                trace!("skipping unknown drone {id} in affected set");
                continue;
            };
            let assignment = self.select_for(record, objectives, &assigned_now);
            assigned_now.insert(id.as_u64(), assignment.pattern_id.clone());
            assignments.push(assignment);
        }
        assignments
    }

    fn select_for(
        &self,
        record: &DroneRecord,
        objectives: &[SwarmObjective],
        assigned_now: &HashMap<u64, String>,
    ) -> Assignment {
        // 1. Forced exits override everything, objectives included
        if let Some(current) = self.catalog.lookup(&record.current_pattern) {
            for exit in &current.postconditions.forced_exits {
                if forced_exit_condition_holds(&exit.condition, &record.sensors)
                    && self.catalog.lookup(&exit.target_pattern).is_some()
                {
                    debug!(
                        "{}: forced exit ({}) -> {}",
                        record.id, exit.condition, exit.target_pattern
                    );
                    return Assignment::bare(record.id, &exit.target_pattern);
                }
            }
        }

        // 2. Hardware filter
        let hardware_key = PartialCorePattern::for_hardware(record.core.rho, record.core.tau);
        let mut candidates = self.catalog.filter_by_core(&hardware_key);

        // 3. Preconditions against current sensors
        let sensors = &record.sensors;
        let references = record.neighbors.reference_count() as u32;
        candidates.retain(|p| {
            p.preconditions.battery_floor <= sensors.battery.percentage
                && p.preconditions.position_quality_floor <= sensors.position_quality
                && p.preconditions.min_references <= references
        });

        // 4. Transition validity from the current pattern
        if !record.current_pattern.is_empty() {
            let current = record.current_pattern.as_str();
            candidates.retain(|p| {
                p.id == current || self.catalog.is_transition_valid(current, &p.id)
            });
        }

        // 5. Pairwise compatibility with neighbors, seeing this call's
        //    earlier assignments
        candidates.retain(|p| {
            record.neighbors.neighbors.iter().all(|neighbor_id| {
                let Some(neighbor) = self.world.get_drone(*neighbor_id) else {
                    return true;
                };
                let neighbor_pattern = assigned_now
                    .get(&neighbor_id.as_u64())
                    .map(String::as_str)
                    .unwrap_or(neighbor.current_pattern.as_str());
                let separation = sensors.position.distance_to(&neighbor.sensors.position);
                self.catalog.is_compatible(&p.id, neighbor_pattern, separation)
            })
        });

        // 6. Score survivors; catalog load order breaks ties
        let mut best: Option<(&crate::catalog::BehavioralPattern, i32)> = None;
        for &candidate in &candidates {
            let mut score = 0i32;
            if candidate.id == record.current_pattern {
                score += 10;
            }
            for objective in objectives {
                if objective.favored_sigma() == candidate.core.sigma {
                    score += 5;
                }
            }
            if candidate.core.chi == record.core.chi {
                score += 2;
            }
            if candidate.preconditions.battery_floor > 0.3 && sensors.battery.percentage < 0.5 {
                score -= 5;
            }
            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((candidate, score)),
            }
        }
        if let Some((winner, score)) = best {
            trace!("{}: selected {} (score {score})", record.id, winner.id);
            let target = objectives
                .iter()
                .find(|o| o.favored_sigma() == winner.core.sigma)
                .and_then(|o| o.target_position());
            return Assignment {
                drone_id: record.id,
                pattern_id: winner.id.clone(),
                target_position: target,
                target_velocity: None,
            };
        }

        // 7. Fallback: hover with the lowest entry floor
        let hover_key = hardware_key.with_sigma(BehavioralMode::Hover);
        let hover = self
            .catalog
            .filter_by_core(&hover_key)
            .into_iter()
            .min_by(|a, b| {
                a.preconditions
                    .battery_floor
                    .partial_cmp(&b.preconditions.battery_floor)
                    .unwrap_or(core::cmp::Ordering::Equal)
            });
        if let Some(pattern) = hover {
            debug!("{}: no candidate survived, falling back to {}", record.id, pattern.id);
            return Assignment::bare(record.id, &pattern.id);
        }

        // 8. Fallback: any zero-floor pattern, preferring land or grounded
        let emergency: Vec<_> = self
            .catalog
            .filter_by_core(&hardware_key)
            .into_iter()
            .filter(|p| p.preconditions.battery_floor == 0.0)
            .collect();
        let pick = emergency
            .iter()
            .find(|p| {
                matches!(
                    p.core.sigma,
                    BehavioralMode::Land | BehavioralMode::Grounded
                )
            })
            .or_else(|| emergency.first());
        if let Some(pattern) = pick {
            debug!("{}: emergency fallback to {}", record.id, pattern.id);
            return Assignment::bare(record.id, &pattern.id);
        }

        // 9. Fallback: keep flying what it already flies
        debug!(
            "{}: catalog has nothing for this hardware, retaining {}",
            record.id, record.current_pattern
        );
        Assignment::bare(record.id, &record.current_pattern)
    }
}
