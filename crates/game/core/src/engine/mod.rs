//! The per-turn pipeline.
//!
//! [`do_turn`] runs one tick of the world in a fixed order: clock and
//! periodic events, environment (scent, fields, caches), the player's
//! actions, every other actor's movement, the stair queue, then the
//! player's end-of-turn upkeep. Each step sees the completed result of the
//! one before it.
mod bubble;
mod movement;
mod player;
mod stairs;

pub use bubble::{despawn_nonlocal, load_npcs, recenter_window, vertical_move};
pub use movement::move_actors;
pub use player::player_turn;
pub use stairs::update_stair_monsters;

use rand::Rng;

use crate::actor::{Actor, Creature, Distraction, Player};
use crate::config::SimConfig;
use crate::env::{SimEnv, WorldHooks};
use crate::error::ErrorSeverity;
use crate::registry::{ActorId, Occupant};
use crate::state::{Diagnostics, MessageKind, QuitReason, TimeDuration, Tripoint, WorldState};

/// How often horde movement and random encounters run.
const HORDE_PERIOD: TimeDuration = TimeDuration::from_seconds(150);
/// How often emitting terrain releases its field.
const EMISSION_PERIOD: TimeDuration = TimeDuration::from_seconds(10);
const PHYSIOLOGY_PERIOD: TimeDuration = TimeDuration::from_minutes(5);
/// Random tiles tried when placing an encounter out of the player's sight.
const ENCOUNTER_PLACEMENT_TRIES: usize = 30;

/// Runs one turn. Returns `true` when the session should end.
pub fn do_turn(world: &mut WorldState, env: &mut SimEnv<'_>) -> bool {
    if world.is_game_over() {
        cleanup_at_end(world, env);
        return true;
    }

    if world.new_game {
        world.new_game = false;
    } else {
        world.clock.advance();
        env.hooks.game_mode_per_turn(&world.clock);
    }
    let _span = tracing::debug_span!("turn", turn = world.clock.turn().0).entered();
    env.hooks.process_missions(&world.clock);

    if world.npcs_dirty {
        load_npcs(world);
    }

    periodic_events(world, env);
    environment_step(world, env.hooks);

    player_turn(world, env);
    if world.is_game_over() {
        cleanup_at_end(world, env);
        return true;
    }

    move_actors(world, env);
    update_stair_monsters(world, env.hooks);
    if world.clock.once_every(EMISSION_PERIOD) {
        let z = world.window.z();
        for at in world.window.emitters(z) {
            if let Some(terrain) = world.window.terrain(at) {
                env.hooks.emit_field(at, terrain);
            }
        }
    }

    player_end_of_turn(world, env);
    env.hooks.render(world);
    false
}

/// Hands everything to persistent storage once the game is over.
///
/// Active actors and queued stair followers go to the deferred store, the
/// store and maps are saved, and derived state is cleared. Save failures
/// are reported to the player but never abort the cleanup.
pub fn cleanup_at_end(world: &mut WorldState, env: &mut SimEnv<'_>) {
    let now = world.now();
    if world.registry.player().core.dead && world.quit == QuitReason::None {
        world.quit = QuitReason::Died;
    }

    sweep_dead(world, env.hooks);
    for creature in world.registry.drain() {
        let abs = world.window.local_to_abs(creature.core().pos);
        world.overmap.defer(abs, creature);
    }
    for entry in world.stairs.drain() {
        world.overmap.defer(entry.origin, entry.creature);
    }

    if let Err(err) = env.hooks.save_factions_and_actors(&world.overmap) {
        world.diagnostics.record_error(now, &err);
        world
            .log
            .add(now, MessageKind::Bad, format!("Failed to save actors: {err}"));
    }
    let failures = world.window.save_all(env.chunks, now);
    let flushed = env.chunks.flush();
    for err in failures.iter().chain(flushed.as_ref().err()) {
        world.diagnostics.record_error(now, err);
    }
    if !failures.is_empty() || flushed.is_err() {
        world
            .log
            .add(now, MessageKind::Bad, "Failed to save the map.");
    }
    if let Err(err) = env.hooks.save_maps(&world.window) {
        world.diagnostics.record_error(now, &err);
        world
            .log
            .add(now, MessageKind::Bad, format!("Failed to save the map: {err}"));
    }

    env.hooks.show_epilogue(world);
    world.scent.clear();
    world.sounds.clear();
    world.window.clear_caches();
    tracing::info!(
        turn = now.0,
        reason = %world.quit,
        deferred = world.overmap.deferred_len(),
        "session ended"
    );
}

fn periodic_events(world: &mut WorldState, env: &mut SimEnv<'_>) {
    if world.clock.once_every(TimeDuration::DAY) {
        env.hooks.process_monster_groups(&world.clock);
    }
    if world.clock.once_every(HORDE_PERIOD) {
        env.hooks.move_hordes(&world.clock);
        let spawned = env.hooks.spawn_encounters(&world.clock, &world.window);
        for creature in spawned {
            place_encounter(world, creature);
        }
    }
    if let Some(period) = world.config.autosave_turns
        && world.clock.once_every(TimeDuration::from_turns(period))
        && let Err(err) = env.hooks.autosave(world)
    {
        let now = world.now();
        world.diagnostics.record_error(now, &err);
        world
            .log
            .add(now, MessageKind::Bad, format!("Autosave failed: {err}"));
    }
}

/// Puts an encounter on a free tile the player cannot see, or defers it.
fn place_encounter(world: &mut WorldState, mut creature: Creature) {
    let player = world.registry.player().core.pos;
    let side = SimConfig::WINDOW_TILES;
    let mut last = player;
    for _ in 0..ENCOUNTER_PLACEMENT_TRIES {
        let at = Tripoint::new(
            world.rng.random_range(0..side),
            world.rng.random_range(0..side),
            player.z,
        );
        last = at;
        if world.window.is_passable(at)
            && world.registry.is_free(at)
            && !world.window.sees(player, at, side as u32)
        {
            creature.core_mut().pos = at;
            match world.registry.insert(creature) {
                Ok(_) => {}
                Err(err) => world.diagnostics.record_error(world.clock.turn(), &err),
            }
            return;
        }
    }
    let abs = world.window.local_to_abs(last);
    world.overmap.defer(abs, creature);
}

fn environment_step(world: &mut WorldState, hooks: &mut dyn WorldHooks) {
    let now = world.now();
    let player = world.registry.player();
    world.scent.update(
        player.core.pos,
        player.scent_source(),
        &world.window,
        now,
        &mut world.diagnostics,
    );
    hooks.update_weather(&world.clock);
    world.window.build_map_cache(world.window.z());
    hooks.build_floor_caches(&world.window);
    hooks.process_falling(&world.window);
    hooks.vehicle_move(&world.window);
    hooks.process_fields(&world.window);
    hooks.process_items(&world.window);
}

fn player_end_of_turn(world: &mut WorldState, env: &mut SimEnv<'_>) {
    let now = world.now();
    let allotment = world.config.move_allotment;
    let physiology = world.clock.once_every(PHYSIOLOGY_PERIOD);
    let morale = world.clock.once_every(TimeDuration::MINUTE);

    let player = world.registry.player_mut();
    player.core.tick_effects();
    if physiology {
        player.hunger += 1;
        player.thirst += 1;
        player.fatigue += 1;
        if player.fatigue == Player::TIRED {
            world.log.add(now, MessageKind::Warning, "You feel tired.");
            if let Some(activity) = player.activity.as_ref()
                && activity.interruptible
                && env.input.confirm_cancel(activity, Distraction::Tired)
            {
                player.cancel_activity();
            }
        }
    }
    if morale {
        env.hooks.update_morale(player);
    }
    player.volume = 0;
    player.begin_turn(allotment);
}

/// Resolves a melee attack through the combat hook. Returns damage dealt.
pub(crate) fn melee(
    world: &mut WorldState,
    hooks: &mut dyn WorldHooks,
    attacker: Occupant,
    target: Occupant,
) -> i32 {
    let (Some(a), Some(t)) = (world.registry.core_of(attacker), world.registry.core_of(target))
    else {
        return 0;
    };
    let damage = hooks.melee_attack(a, t);
    let attacker_name = a.name.clone();
    let target_name = t.name.clone();
    let now = world.now();

    let killed = world
        .registry
        .core_of_mut(target)
        .is_some_and(|core| core.take_damage(damage));
    match target {
        Occupant::Player if damage > 0 => world.log.add(
            now,
            MessageKind::Bad,
            format!("The {attacker_name} hits you for {damage} damage."),
        ),
        Occupant::Player => {}
        Occupant::Actor(id) => {
            if attacker == Occupant::Player && damage > 0 {
                world
                    .log
                    .add(now, MessageKind::Good, format!("You hit the {target_name}."));
            }
            if killed {
                world.registry.mark_dead(id);
            }
        }
    }
    if killed && target == Occupant::Player {
        world
            .log
            .add(now, MessageKind::Bad, format!("You were killed by the {attacker_name}."));
    }
    damage
}

/// Removes dead actors, running the death hook for each.
pub(crate) fn sweep_dead(world: &mut WorldState, hooks: &mut dyn WorldHooks) {
    let now = world.now();
    for (id, creature) in world.registry.sweep_dead() {
        hooks.on_death(id, &creature);
        world
            .log
            .add(now, MessageKind::Info, format!("The {} dies.", creature.name()));
    }
}

/// Checks an actor stands on a passable tile, relocating it within
/// [`SimConfig::RELOCATION_RADIUS`] or killing it otherwise.
/// Returns false if the actor died.
pub(crate) fn ensure_valid_position(world: &mut WorldState, id: ActorId) -> bool {
    let Some(creature) = world.registry.get(id) else {
        return false;
    };
    let pos = creature.core().pos;
    if world.window.is_passable(pos) {
        return true;
    }
    let name = creature.name().to_owned();
    let now = world.now();
    match world.free_tile_near(pos, SimConfig::RELOCATION_RADIUS) {
        Some(to) if world.registry.relocate(Occupant::Actor(id), to).is_ok() => {
            world.diagnostics.record(
                now,
                ErrorSeverity::Internal,
                Diagnostics::INVALID_POSITION,
                format!("{name} stood on impassable {pos}, moved to {to}"),
            );
            true
        }
        _ => {
            world.diagnostics.record(
                now,
                ErrorSeverity::Internal,
                Diagnostics::INVALID_POSITION,
                format!("{name} stuck in impassable {pos} with no room nearby"),
            );
            world
                .log
                .add(now, MessageKind::Info, format!("The {name} dies of natural causes."));
            world.registry.mark_dead(id);
            false
        }
    }
}
