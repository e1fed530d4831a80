//! Queued stair followers arriving on the player's level.
use arrayvec::ArrayVec;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::actor::{Actor, Creature, Effects};
use crate::config::{SimConfig, ZLevelMode};
use crate::env::WorldHooks;
use crate::error::ErrorSeverity;
use crate::registry::{ActorId, Occupant};
use crate::stairs::StairEntry;
use crate::state::{Diagnostics, Direction, MessageKind, Tripoint, WorldState, rl_dist, square_dist};

use super::melee;

/// Counts down every queued follower and lets those at zero arrive.
///
/// Entries are only processed while the window is within one submap of
/// the queue's anchor on a flat window; otherwise they are deferred at the
/// tile they left from.
pub fn update_stair_monsters(world: &mut WorldState, hooks: &mut dyn WorldHooks) {
    if world.stairs.is_empty() {
        return;
    }
    if world.window.mode() == ZLevelMode::Stacked || !world.stairs.is_near(world.window.abs_sub()) {
        drop_queue(world);
        return;
    }

    let anchor = world.stairs.anchor();
    let step = world.config.stair_countdown_step;
    let mut waiting = Vec::new();
    for mut entry in world.stairs.drain() {
        entry.countdown -= step;
        if entry.countdown > 0 {
            announce(world, &entry);
            waiting.push(entry);
        } else {
            arrive(world, hooks, entry);
        }
    }
    world.stairs.restore(anchor, waiting);
}

fn drop_queue(world: &mut WorldState) {
    let now = world.now();
    let entries = world.stairs.drain();
    world.diagnostics.record(
        now,
        ErrorSeverity::Recoverable,
        Diagnostics::STAIR_QUEUE_DROPPED,
        format!("{} stair followers dropped away from their anchor", entries.len()),
    );
    for entry in entries {
        world.overmap.defer(entry.origin, entry.creature);
    }
}

/// Arrival tiles near the player, nearest first.
fn candidates(world: &WorldState, entry: &StairEntry) -> Vec<Tripoint> {
    let player = world.registry.player().core.pos;
    let mut found = world.window.tiles_within(
        player,
        world.config.stair_search_radius,
        entry.direction.arrival_flag(),
    );
    found.sort_by_key(|&p| (rl_dist(p, player), square_dist(p, player), p.y, p.x));
    found
}

fn announce(world: &mut WorldState, entry: &StairEntry) {
    let now = world.now();
    let player = world.registry.player().core.pos;
    let name = entry.creature.name();
    let visible = candidates(world, entry)
        .first()
        .is_some_and(|&stairs| world.window.sees(player, stairs, SimConfig::WINDOW_TILES as u32));
    let text = match (visible, entry.countdown) {
        (true, c) if c <= 4 => format!("The {name} is almost at the bottom of the stairs!"),
        (true, c) if c <= 8 => format!("The {name} is on the stairs."),
        (true, _) => format!("You see a {name} in the distance on the stairs."),
        (false, c) if c <= 4 => "You hear something right at the stairs!".to_owned(),
        (false, c) if c <= 8 => "You hear footsteps on the stairs.".to_owned(),
        (false, _) => "You hear distant footsteps on the stairs.".to_owned(),
    };
    world.log.add(now, MessageKind::Warning, text);
}

fn arrive(world: &mut WorldState, hooks: &mut dyn WorldHooks, entry: StairEntry) {
    let nearest: ArrayVec<Tripoint, { SimConfig::STAIR_CANDIDATES }> = candidates(world, &entry)
        .into_iter()
        .take(SimConfig::STAIR_CANDIDATES)
        .collect();
    let Some(&dest) = nearest.choose(&mut world.rng) else {
        tracing::debug!(name = entry.creature.name(), "no stairs to arrive on");
        world.overmap.defer(entry.origin, entry.creature);
        return;
    };

    let verb = entry.direction;
    match world.registry.occupant_at(dest) {
        None => {
            let name = entry.creature.name().to_owned();
            if place(world, entry, dest).is_some() {
                world.log.add(
                    world.clock.turn(),
                    MessageKind::Warning,
                    format!("The {name} comes {verb} the stairs!"),
                );
            }
        }
        Some(Occupant::Player) => push_player(world, hooks, entry, dest),
        Some(Occupant::Actor(other)) => displace_actor(world, hooks, entry, dest, other),
    }
}

/// Registers a queued creature at `at`, deferring it at its origin if that
/// fails.
fn place(world: &mut WorldState, entry: StairEntry, at: Tripoint) -> Option<ActorId> {
    let StairEntry {
        mut creature,
        origin,
        ..
    } = entry;
    if !world.registry.is_free(at) {
        world.overmap.defer(origin, creature);
        return None;
    }
    creature.core_mut().pos = at;
    match world.registry.insert(creature) {
        Ok(id) => Some(id),
        Err(err) => {
            world.diagnostics.record_error(world.clock.turn(), &err);
            None
        }
    }
}

/// A random free tile next to `around`, trying at most `push_attempts` times.
fn free_neighbour(world: &mut WorldState, around: Tripoint) -> Option<Tripoint> {
    for _ in 0..world.config.push_attempts {
        let dir = Direction::ALL.choose(&mut world.rng)?;
        let to = around + dir.delta();
        if world.window.is_passable(to) && world.registry.is_free(to) {
            return Some(to);
        }
    }
    None
}

fn resists_push(world: &mut WorldState, effects: Effects) -> bool {
    effects.intersects(Effects::BRACED | Effects::PUSH_IMMUNE) && world.rng.random_ratio(1, 3)
}

fn push_player(world: &mut WorldState, hooks: &mut dyn WorldHooks, entry: StairEntry, dest: Tripoint) {
    let now = world.now();
    let name = entry.creature.name().to_owned();
    let Some(free) = free_neighbour(world, dest) else {
        attack_from_stairs(world, hooks, entry, dest, Occupant::Player);
        return;
    };

    let player = world.registry.player();
    let (effects, dodge) = (player.core.effects, player.dodge);
    if resists_push(world, effects) {
        world.log.add(
            now,
            MessageKind::Warning,
            format!("The {name} tries to push you off the stairs, but you hold your ground!"),
        );
        if let Some(id) = place(world, entry, free) {
            melee(world, hooks, Occupant::Actor(id), Occupant::Player);
        }
    } else if world.rng.random_range(0..100) < dodge {
        world.log.add(
            now,
            MessageKind::Good,
            format!("You sidestep the {name} as it comes off the stairs."),
        );
        place(world, entry, free);
    } else {
        if world.registry.relocate(Occupant::Player, free).is_ok() {
            world.registry.player_mut().core.move_points -= 100;
        }
        world.log.add(
            now,
            MessageKind::Bad,
            format!("The {name} pushes you out of the way!"),
        );
        place(world, entry, dest);
    }
}

fn displace_actor(
    world: &mut WorldState,
    hooks: &mut dyn WorldHooks,
    entry: StairEntry,
    dest: Tripoint,
    other: ActorId,
) {
    let Some(free) = free_neighbour(world, dest) else {
        attack_from_stairs(world, hooks, entry, dest, Occupant::Actor(other));
        return;
    };
    let Some(effects) = world.registry.get(other).map(|c| c.core().effects) else {
        place(world, entry, dest);
        return;
    };

    let now = world.now();
    let name = entry.creature.name().to_owned();
    let other_name = world
        .registry
        .get(other)
        .map(|c| c.name().to_owned())
        .unwrap_or_default();
    let resisted = resists_push(world, effects);
    let stunned = resisted || world.rng.random_bool(0.5);
    if resisted {
        world.log.add(
            now,
            MessageKind::Info,
            format!("The {name} tries to shove the {other_name}, but it holds its ground!"),
        );
        if let Some(id) = place(world, entry, free) {
            melee(world, hooks, Occupant::Actor(id), Occupant::Actor(other));
        }
    } else {
        if let Err(err) = world.registry.relocate(Occupant::Actor(other), free) {
            world.diagnostics.record_error(world.clock.turn(), &err);
        }
        world.log.add(
            now,
            MessageKind::Info,
            format!("The {name} shoves the {other_name} aside!"),
        );
        place(world, entry, dest);
    }
    if stunned && let Some(creature) = world.registry.get_mut(other) {
        creature.core_mut().stun(1);
        world.log.add(now, MessageKind::Info, format!("The {other_name} is stunned!"));
    }
}

/// No room to push: the arrival attacks whoever blocks the stairs and then
/// looks for space nearby, or goes back where it came from.
fn attack_from_stairs(
    world: &mut WorldState,
    hooks: &mut dyn WorldHooks,
    entry: StairEntry,
    dest: Tripoint,
    target: Occupant,
) {
    let now = world.now();
    let StairEntry {
        mut creature,
        origin,
        ..
    } = entry;
    if target == Occupant::Player {
        world.log.add(
            now,
            MessageKind::Bad,
            format!("The {} attacks you from the stairs!", creature.name()),
        );
    }
    let spot = world.free_tile_near(dest, SimConfig::RELOCATION_RADIUS);
    let Some(spot) = spot else {
        strike_from_outside(world, hooks, &creature, target);
        world.overmap.defer(origin, creature);
        return;
    };
    creature.core_mut().pos = spot;
    match world.registry.insert(creature) {
        Ok(id) => {
            melee(world, hooks, Occupant::Actor(id), target);
        }
        Err(err) => world.diagnostics.record_error(now, &err),
    }
}

/// Attack by a creature that is not registered (still on the stairs).
fn strike_from_outside(
    world: &mut WorldState,
    hooks: &mut dyn WorldHooks,
    attacker: &Creature,
    target: Occupant,
) {
    let Some(core) = world.registry.core_of(target) else {
        return;
    };
    let damage = hooks.melee_attack(attacker.core(), core);
    let killed = world
        .registry
        .core_of_mut(target)
        .is_some_and(|core| core.take_damage(damage));
    if killed && let Occupant::Actor(id) = target {
        world.registry.mark_dead(id);
    }
}
