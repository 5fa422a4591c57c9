//! Blast-radius computation
//!
//! When a drone's structural state changes, its neighbors and role
//! dependents must re-evaluate their own pattern choices. The cascading
//! closure uses a two-set discipline (evaluated, frontier) so each drone
//! is expanded at most once, bounding the work at O(N) predicate
//! evaluations even in dense ring topologies.

use crate::dimensions::FormationRole;
use crate::types::DroneId;
use crate::world::WorldModel;
use log::trace;

/// Drones affected by a structural change on one drone: itself, its
/// spatial neighbors, and its role dependents. Unknown drones still
/// include themselves.
pub fn blast_radius(world: &WorldModel, id: DroneId) -> Vec<DroneId> {
    let mut affected = vec![id];

    let Some(record) = world.get_drone(id) else {
        return affected;
    };
    let graph = &record.neighbors;

    for neighbor in graph.neighbors.iter() {
        push_unique(&mut affected, *neighbor);
    }

    match record.core.chi {
        FormationRole::Leader => {
            for follower in graph.followers.iter() {
                push_unique(&mut affected, *follower);
            }
        }
        FormationRole::Follower => {
            if let Some(leader) = graph.leader {
                push_unique(&mut affected, leader);
            }
        }
        FormationRole::Relay => {
            if let Some(target) = graph.relay_target {
                push_unique(&mut affected, target);
            }
        }
        _ => {}
    }
    if let Some(source) = graph.relay_source {
        push_unique(&mut affected, source);
    }

    affected
}

/// Affected set for a batch of changed drones, without cascade: the union
/// of their blast radii in discovery order.
pub fn combined_blast_radius(world: &WorldModel, changed: &[DroneId]) -> Vec<DroneId> {
    let mut affected = Vec::new();
    for id in changed {
        for hit in blast_radius(world, *id) {
            push_unique(&mut affected, hit);
        }
    }
    affected
}

/// Affected set closed under cascade.
///
/// `would_change_pattern` is consulted once per drone outside the initial
/// changed set; a `true` answer expands that drone's own blast radius into
/// the closure.
pub fn cascading_blast_radius<F>(
    world: &WorldModel,
    changed: &[DroneId],
    mut would_change_pattern: F,
) -> Vec<DroneId>
where
    F: FnMut(DroneId) -> bool,
{
    let mut affected = combined_blast_radius(world, changed);

    let mut evaluated: Vec<DroneId> = changed.to_vec();
    let mut frontier: Vec<DroneId> = affected
        .iter()
        .copied()
        .filter(|id| !evaluated.contains(id))
        .collect();

    while !frontier.is_empty() {
        let mut next_frontier: Vec<DroneId> = Vec::new();
        for id in &frontier {
            evaluated.push(*id);
            if !would_change_pattern(*id) {
                continue;
            }
            for hit in blast_radius(world, *id) {
                push_unique(&mut affected, hit);
                if !evaluated.contains(&hit)
                    && !frontier.contains(&hit)
                    && !next_frontier.contains(&hit)
                {
                    next_frontier.push(hit);
                }
            }
        }
        frontier = next_frontier;
    }

    trace!(
        "cascade over {} changed drone(s) affected {}",
        changed.len(),
        affected.len()
    );
    affected
}

fn push_unique(list: &mut Vec<DroneId>, id: DroneId) {
    if !list.contains(&id) {
        list.push(id);
    }
}
