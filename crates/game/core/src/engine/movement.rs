//! The movement pass: every active non-player actor spends its move points.
//!
//! Each actor repeatedly plans, picks one intent and has it executed until
//! its move points run out. Iterations that cost nothing are counted, and an
//! actor that makes no progress for `loop_limit` iterations in a row is
//! forced to end its turn, so the pass always terminates.
use crate::actor::{Actor, ActorCore, Effects, Intent, LoopOutcome, PlayerFlags};
use crate::ai::PlanView;
use crate::config::SimConfig;
use crate::env::SimEnv;
use crate::error::ErrorSeverity;
use crate::registry::{ActorId, Occupant};
use crate::state::{Diagnostics, MessageKind, Sound, TimeDuration, WorldState, rl_dist};

use super::{despawn_nonlocal, ensure_valid_position, melee, sweep_dead};

/// Move points an attack costs.
const ATTACK_COST: i32 = 100;

pub fn move_actors(world: &mut WorldState, env: &mut SimEnv<'_>) {
    sweep_dead(world, env.hooks);
    world.registry.refresh_groups();
    deliver_sounds(world);

    let allotment = world.config.move_allotment;
    let daily = world.clock.once_every(TimeDuration::DAY);
    let ids: Vec<ActorId> = world.registry.ids().collect();
    for id in ids {
        let Some(creature) = world.registry.get(id) else {
            continue;
        };
        // Actors in the despawn margin are kept but do not act.
        if creature.is_dead() || !world.window.contains(creature.core().pos) {
            continue;
        }
        if !ensure_valid_position(world, id) {
            continue;
        }

        if let Some(creature) = world.registry.get_mut(id) {
            creature.begin_turn(allotment);
            if daily {
                if let Some(monster) = creature.as_monster_mut() {
                    monster.days_alive += 1;
                }
                env.hooks.creature_daily_cycle(id, creature);
            }
            env.hooks.creature_in_field(Some(id), creature.core_mut());
        }

        act(world, env, id);

        if let Some(creature) = world.registry.get_mut(id) {
            creature.end_turn();
        }
        motion_alarm(world, id);
    }

    sweep_dead(world, env.hooks);
    despawn_nonlocal(world);
}

/// Runs one actor's plan/intent loop until it is out of move points.
fn act(world: &mut WorldState, env: &mut SimEnv<'_>, id: ActorId) {
    let limit = world.config.loop_limit;
    loop {
        let Some(creature) = world.registry.get_mut(id) else {
            return;
        };
        let core = creature.core_mut();
        if core.move_points <= 0 || core.dead {
            return;
        }
        // Mounts and controlled actors move only through whoever drives them.
        if core.effects.intersects(Effects::RIDDEN | Effects::CONTROLLED | Effects::INACTIVE) {
            core.move_points = 0;
            return;
        }

        let intent = {
            let WorldState {
                registry,
                window,
                scent,
                clock,
                rng,
                ..
            } = &mut *world;
            let Some((creature, actors)) = registry.split_for_plan(id) else {
                return;
            };
            let view = PlanView {
                window,
                scent,
                clock,
                actors,
            };
            creature.plan(&view, rng);
            creature.next_intent(&view)
        };

        let spent = execute_intent(world, env, id, intent);
        let Some(creature) = world.registry.get_mut(id) else {
            return;
        };
        if spent > 0 {
            creature.core_mut().stalled_iterations = 0;
            continue;
        }

        let core = creature.core_mut();
        core.stalled_iterations += 1;
        let stalled = core.stalled_iterations;
        if stalled + 1 == limit {
            tracing::warn!(name = %core.name, stalled, "actor is not making progress");
        }
        if stalled >= limit {
            let name = core.name.clone();
            let outcome = creature.on_loop_detected();
            let now = world.now();
            world.diagnostics.record(
                now,
                ErrorSeverity::Internal,
                Diagnostics::STUCK_AI,
                format!("{name} made no progress in {stalled} iterations ({outcome:?})"),
            );
            if outcome == LoopOutcome::Incapacitated {
                world.log.add(now, MessageKind::Warning, format!("{name} faints!"));
            }
            return;
        }
    }
}

/// Validates and applies one intent. Returns the move points spent.
fn execute_intent(world: &mut WorldState, env: &mut SimEnv<'_>, id: ActorId, intent: Intent) -> i32 {
    let Some(creature) = world.registry.get(id) else {
        return 0;
    };
    let from = creature.core().pos;
    let speed = creature.core().speed.max(1);
    let volume = creature.footstep_volume();
    match intent {
        Intent::Move(to) => {
            if rl_dist(from, to) != 1 || !world.window.is_passable(to) || !world.registry.is_free(to) {
                return 0;
            }
            if world.registry.relocate(Occupant::Actor(id), to).is_err() {
                return 0;
            }
            // Terrain costs are quoted for an actor of nominal speed.
            let cost = (world.window.move_cost(to) * ActorCore::DEFAULT_SPEED / speed).max(1);
            world.sounds.push(Sound {
                at: to,
                volume,
                source: Some(Occupant::Actor(id)),
            });
            if let Some(creature) = world.registry.get_mut(id) {
                let core = creature.core_mut();
                core.move_points -= cost;
                env.hooks.creature_in_field(Some(id), core);
            }
            cost
        }
        Intent::Attack { target, at } => {
            let in_reach = rl_dist(from, at) == 1 && world.registry.position_of(target) == Some(at);
            if !in_reach {
                return 0;
            }
            melee(world, env.hooks, Occupant::Actor(id), target);
            if let Some(creature) = world.registry.get_mut(id) {
                creature.core_mut().move_points -= ATTACK_COST;
            }
            ATTACK_COST
        }
        Intent::Wait => {
            let Some(creature) = world.registry.get_mut(id) else {
                return 0;
            };
            let core = creature.core_mut();
            let spent = core.move_points.max(0);
            core.move_points = 0;
            spent
        }
        Intent::Think => 0,
    }
}

/// Hands this turn's sounds to every actor in earshot.
fn deliver_sounds(world: &mut WorldState) {
    let sounds = world.sounds.take();
    if sounds.is_empty() {
        return;
    }
    let ids: Vec<ActorId> = world.registry.ids().collect();
    for id in ids {
        let Some(creature) = world.registry.get_mut(id) else {
            continue;
        };
        let pos = creature.core().pos;
        let heard = sounds
            .iter()
            .filter(|sound| sound.source != Some(Occupant::Actor(id)))
            .filter(|sound| sound.at.z == pos.z && rl_dist(sound.at, pos) <= sound.volume)
            .max_by_key(|sound| sound.volume);
        if let Some(sound) = heard {
            creature.memory_mut().heard = Some(sound.at);
        }
    }
}

/// A hostile ending its turn close to a player with a motion alarm drains
/// one unit of power and interrupts whatever the player is doing.
fn motion_alarm(world: &mut WorldState, id: ActorId) {
    let player = world.registry.player();
    if !player.flags.contains(PlayerFlags::MOTION_ALARM) || player.power < 1 {
        return;
    }
    let Some(creature) = world.registry.get(id) else {
        return;
    };
    let core = creature.core();
    let close = !core.dead
        && core.pos.z == player.core.pos.z
        && rl_dist(core.pos, player.core.pos) <= SimConfig::MOTION_ALARM_RADIUS
        && core.faction.is_hostile_to(player.core.faction);
    if !close {
        return;
    }
    let now = world.now();
    let player = world.registry.player_mut();
    player.power -= 1;
    player.cancel_activity();
    player.core.effects.remove(Effects::SLEEPING);
    world
        .log
        .add(now, MessageKind::Warning, "Your motion alarm goes off!");
}
