//! The player's share of a turn: activities first, then input actions.
use crate::actor::{Actor, ActorCore, Distraction, Effects};
use crate::config::SimConfig;
use crate::env::{PlayerAction, SimEnv};
use crate::error::ErrorSeverity;
use crate::registry::Occupant;
use crate::state::{Diagnostics, MessageKind, QuitReason, Sound, WorldState, rl_dist};
use crate::window::WindowError;

use super::{melee, recenter_window, vertical_move};

/// Move points climbing a staircase costs.
const STAIRS_COST: i32 = 100;
const ATTACK_COST: i32 = 100;

/// Spends the player's move points on their activity and then on actions
/// from the input collaborator.
pub fn player_turn(world: &mut WorldState, env: &mut SimEnv<'_>) {
    let core = &mut world.registry.player_mut().core;
    if core.effects.intersects(Effects::INACTIVE) {
        core.move_points = core.move_points.min(0);
        return;
    }

    run_activity(world, env);

    let mut idle = 0;
    while world.registry.player().core.move_points > 0 && !world.is_game_over() {
        if world.registry.player().activity.is_some() {
            run_activity(world, env);
            continue;
        }
        let action = env.input.next_action(world);
        tracing::trace!(?action, "player action");
        if perform(world, env, action) > 0 {
            idle = 0;
            continue;
        }
        idle += 1;
        if idle >= SimConfig::PLAYER_IDLE_LIMIT {
            let now = world.now();
            world.diagnostics.record(
                now,
                ErrorSeverity::Recoverable,
                Diagnostics::PLAYER_IDLE_LOOP,
                format!("{idle} player actions in a row took no time; ending the turn"),
            );
            world.registry.player_mut().core.move_points = 0;
            break;
        }
    }
}

/// Works on the current activity while move points last.
fn run_activity(world: &mut WorldState, env: &mut SimEnv<'_>) {
    loop {
        let now = world.now();
        let distraction = hostile_in_view(world).then_some(Distraction::HostileSpotted);
        let player = world.registry.player_mut();
        if player.core.move_points <= 0 {
            return;
        }
        let Some(activity) = player.activity.as_mut() else {
            return;
        };

        if activity.interruptible
            && let Some(reason) = distraction
            && !activity.ignored.contains(&reason)
        {
            if env.input.confirm_cancel(activity, reason) {
                let kind = activity.kind;
                player.cancel_activity();
                world
                    .log
                    .add(now, MessageKind::Info, format!("You stop {kind}: {reason}."));
                return;
            }
            activity.ignored.push(reason);
        }

        let step = player.core.move_points.min(activity.moves_left.max(0));
        activity.moves_left -= step;
        player.core.move_points -= step;
        if activity.moves_left <= 0 {
            let kind = activity.kind;
            player.activity = None;
            world
                .log
                .add(now, MessageKind::Good, format!("You finish {kind}."));
        }
    }
}

/// True if a hostile the player can see is within the warning radius.
fn hostile_in_view(world: &WorldState) -> bool {
    let player = &world.registry.player().core;
    let radius = world.config.proximity_warning_radius;
    world.registry.iter().any(|(_, creature)| {
        let core = creature.core();
        !core.dead
            && core.faction.is_hostile_to(player.faction)
            && rl_dist(core.pos, player.pos) <= radius
            && world.window.sees(player.pos, core.pos, radius)
    })
}

/// Applies one player action. Returns the move points it cost.
fn perform(world: &mut WorldState, env: &mut SimEnv<'_>, action: PlayerAction) -> i32 {
    match action {
        PlayerAction::Move(direction) => step(world, env, direction),
        PlayerAction::Wait => {
            let core = &mut world.registry.player_mut().core;
            let spent = core.move_points.max(0);
            core.move_points = 0;
            spent
        }
        PlayerAction::Ascend => climb(world, env, 1),
        PlayerAction::Descend => climb(world, env, -1),
        PlayerAction::StartActivity(activity) => {
            let before = world.registry.player().core.move_points;
            world.registry.player_mut().activity = Some(activity);
            run_activity(world, env);
            before - world.registry.player().core.move_points
        }
        PlayerAction::Quit => {
            world.quit = QuitReason::Quit;
            0
        }
        PlayerAction::SaveAndQuit => {
            world.quit = QuitReason::SaveAndQuit;
            0
        }
    }
}

/// Steps one tile, attacking a hostile standing there.
fn step(world: &mut WorldState, env: &mut SimEnv<'_>, direction: crate::state::Direction) -> i32 {
    let player = world.registry.player();
    let to = player.core.pos + direction.delta();
    let faction = player.core.faction;
    let speed = player.core.speed.max(1);
    let volume = player.footstep_volume();

    match world.registry.occupant_at(to) {
        Some(target @ Occupant::Actor(id)) => {
            let hostile = world
                .registry
                .get(id)
                .is_some_and(|creature| creature.core().faction.is_hostile_to(faction));
            if !hostile {
                return 0;
            }
            melee(world, env.hooks, Occupant::Player, target);
            world.registry.player_mut().core.move_points -= ATTACK_COST;
            ATTACK_COST
        }
        Some(Occupant::Player) => 0,
        None => {
            if !world.window.is_passable(to) || world.registry.relocate(Occupant::Player, to).is_err() {
                return 0;
            }
            let cost = (world.window.move_cost(to) * ActorCore::DEFAULT_SPEED / speed).max(1);
            let player = world.registry.player_mut();
            player.core.move_points -= cost;
            player.volume = player.volume.max(volume);
            world.sounds.push(Sound {
                at: to,
                volume,
                source: Some(Occupant::Player),
            });
            recenter_window(world, env);
            cost
        }
    }
}

fn climb(world: &mut WorldState, env: &mut SimEnv<'_>, dz: i32) -> i32 {
    match vertical_move(world, env, dz) {
        Ok(()) => {
            world.registry.player_mut().core.move_points -= STAIRS_COST;
            STAIRS_COST
        }
        Err(err) => {
            let now = world.now();
            if let WindowError::NoConnector { direction, .. } = &err {
                world
                    .log
                    .add(now, MessageKind::Info, format!("You can't go {direction} here."));
            }
            world.diagnostics.record_error(now, &err);
            0
        }
    }
}
