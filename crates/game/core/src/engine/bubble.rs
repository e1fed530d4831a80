//! Keeping the window centred on the player.
use crate::actor::{Actor, ActorKind};
use crate::config::{SimConfig, ZLevelMode};
use crate::env::SimEnv;
use crate::registry::{ActorId, Occupant};
use crate::stairs::StairEntry;
use crate::state::{Point, Tripoint, WorldState, rl_dist, square_dist};
use crate::window::{SpatialWindow, VerticalDirection, WindowError};

/// Shifts the window when the player has left its central submap.
///
/// Returns the shift applied, in submaps.
pub fn recenter_window(world: &mut WorldState, env: &mut SimEnv<'_>) -> Point {
    let focus = world.registry.player().core.pos.xy();
    let shift = SpatialWindow::shift_for(focus);
    if shift.is_zero() {
        return shift;
    }
    world.shift(shift, env.chunks);
    despawn_nonlocal(world);
    world.reload_deferred(|creature| creature.kind() == ActorKind::Monster);
    world.npcs_dirty = true;
    world.window.build_map_cache(world.window.z());
    shift
}

/// Defers every actor outside the window plus its despawn margin.
///
/// Deferred actors keep their state; nothing about this counts as death.
pub fn despawn_nonlocal(world: &mut WorldState) -> usize {
    let margin = world.config.despawn_margin();
    let outside: Vec<ActorId> = world
        .registry
        .iter()
        .filter(|(_, creature)| !world.window.within_margin(creature.core().pos, margin))
        .map(|(id, _)| id)
        .collect();
    for &id in &outside {
        world.defer(id);
    }
    outside.len()
}

/// Reactivates deferred NPCs now inside the window.
pub fn load_npcs(world: &mut WorldState) -> usize {
    world.npcs_dirty = false;
    world.reload_deferred(|creature| creature.is_npc())
}

/// Takes the player one level up (`dz > 0`) or down along a staircase.
///
/// Nothing is mutated if the target level is out of range or the player is
/// not standing on a matching connector.
pub fn vertical_move(world: &mut WorldState, env: &mut SimEnv<'_>, dz: i32) -> Result<(), WindowError> {
    let direction = VerticalDirection::from_dz(dz);
    let from = world.registry.player().core.pos;
    let new_z = from.z + direction.dz();
    SpatialWindow::check_z(new_z)?;
    if !world.window.flags(from).contains(direction.departure_flag()) {
        return Err(WindowError::NoConnector { at: from, direction });
    }

    let now = world.now();
    if world.window.mode() == ZLevelMode::Flat {
        let returning = world.stairs.drain();
        queue_followers(world, from, direction);

        let report = world.window.vertical_shift(new_z, env.chunks, now)?;
        world.record_paging(&report);
        place_player(world, from.with_z(new_z), direction);

        for entry in returning {
            if entry.from_z == new_z {
                restore_follower(world, entry);
            } else {
                world.overmap.defer(entry.origin, entry.creature);
            }
        }
        world.reload_deferred(|_| true);
    } else {
        world.window.vertical_shift(new_z, env.chunks, now)?;
        place_player(world, from.with_z(new_z), direction);
    }

    world.scent.clear();
    world.sounds.clear();
    world.registry.mark_groups_dirty();
    world.annotate_connectors();
    tracing::info!(z = new_z, %direction, "player changed level");
    recenter_window(world, env);
    // Anchor where the window settled, which may be away from `from`.
    if !world.stairs.is_empty() {
        let abs_sub = world.window.abs_sub();
        world.stairs.set_anchor(abs_sub);
    }
    Ok(())
}

/// Splits the actors on a level the player is leaving: hostiles chasing the
/// player queue at the stairs, everyone else is deferred.
fn queue_followers(world: &mut WorldState, from: Tripoint, direction: VerticalDirection) {
    let radius = world.config.stair_follow_radius;
    let step = world.config.stair_countdown_step;
    let player_faction = world.registry.player().core.faction;
    let ids: Vec<ActorId> = world.registry.ids().collect();
    let mut queued = 0;
    for id in ids {
        let Some(creature) = world.registry.get(id) else {
            continue;
        };
        let core = creature.core();
        let pos = core.pos;
        let distance = rl_dist(pos, from);
        let follows = !core.dead
            && pos.z == from.z
            && creature.memory().tracking_player
            && core.faction.is_hostile_to(player_faction)
            && distance <= radius;
        if !follows {
            world.defer(id);
            continue;
        }
        let origin = world.window.local_to_abs(pos);
        if let Some(creature) = world.registry.remove(id) {
            world.stairs.push(StairEntry {
                creature,
                countdown: step * distance.max(1) as i32,
                from_z: from.z,
                direction,
                origin,
            });
            queued += 1;
        }
    }
    if queued > 0 {
        tracing::debug!(queued, "actors follow the player onto the stairs");
    }
}

/// Puts the player on the nearest arrival connector within two submaps of
/// `target`, or on `target` itself.
fn place_player(world: &mut WorldState, target: Tripoint, direction: VerticalDirection) {
    let radius = (2 * SimConfig::SEEX) as u32;
    let dest = world
        .window
        .tiles_within(target, radius, direction.arrival_flag())
        .into_iter()
        .filter(|&p| world.registry.is_free(p))
        .min_by_key(|&p| (square_dist(p, target), p.y, p.x))
        .unwrap_or(target);
    if let Err(err) = world.registry.relocate(Occupant::Player, dest) {
        world.diagnostics.record_error(world.clock.turn(), &err);
    }
}

/// Returns a queued follower to the level it came from.
fn restore_follower(world: &mut WorldState, entry: StairEntry) {
    let StairEntry { origin, creature, .. } = entry;
    world.add_actor(origin, creature);
}
