mod common;

use common::{CENTER, Script, run, run_idle, world};
use sim_core::state::Diagnostics;
use sim_core::{
    Activity, ActivityKind, Actor, Creature, Effects, Faction, Monster, Npc, NpcAttitude,
    Placement, PlayerAction, QuitReason, TerrainKind, Tick, Tripoint,
};

#[test]
fn first_turn_does_not_advance_the_clock() {
    let (mut world, mut store) = world();
    assert!(!run_idle(&mut world, &mut store, 1));
    assert_eq!(world.now(), Tick::ZERO);
    assert!(!world.new_game);

    run_idle(&mut world, &mut store, 3);
    assert_eq!(world.now(), Tick(3));
}

#[test]
fn idle_player_stops_scent_diffusion() {
    let (mut world, mut store) = world();
    run_idle(&mut world, &mut store, 1005);
    assert!(world.scent.max_value() > 0);

    let before = world.scent.values().to_vec();
    run_idle(&mut world, &mut store, 1);
    assert_eq!(world.scent.values(), &before[..]);
}

#[test]
fn walled_in_follower_faints_after_loop_limit() {
    let (mut world, mut store) = world();
    let spot = Tripoint::new(30, 66, 0);
    for p in spot.neighbors() {
        world.window.set_terrain(p, TerrainKind::Wall);
    }
    let npc = Npc::new("Ana", Tripoint::ORIGIN, Faction::Ally).with_attitude(NpcAttitude::Follow);
    let abs = world.window.local_to_abs(spot);
    let Placement::Active(id) = world.add_actor(abs, npc.into()) else {
        panic!("follower should be active");
    };

    run_idle(&mut world, &mut store, 1);

    assert!(world.diagnostics.contains(Diagnostics::STUCK_AI));
    assert!(world.log.mentions("Ana faints!"));
    let npc = world.registry.get(id).expect("npc stays registered");
    assert_eq!(npc.core().move_points, 0);
    assert_eq!(npc.core().pos, spot);
}

#[test]
fn stalled_monster_yields_without_fainting() {
    let (mut world, mut store) = world();
    let spot = Tripoint::new(40, 40, 0);
    for p in spot.neighbors() {
        world.window.set_terrain(p, TerrainKind::Wall);
    }
    // Walled in and wandering: every plan fails and the monster holds.
    let abs = world.window.local_to_abs(spot);
    let Placement::Active(id) = world.add_actor(abs, Monster::zombie(Tripoint::ORIGIN).into()) else {
        panic!("zombie should be active");
    };

    run_idle(&mut world, &mut store, 3);
    let zombie = world.registry.get(id).expect("zombie stays registered");
    assert!(!zombie.core().effects.contains(Effects::INCAPACITATED));
    assert!(!world.log.mentions("faints"));
}

#[test]
fn ridden_mount_does_not_bank_move_points() {
    let (mut world, mut store) = world();
    let spot = CENTER + sim_core::Point::new(8, 0);
    let abs = world.window.local_to_abs(spot);
    let Placement::Active(id) = world.add_actor(abs, Monster::zombie(Tripoint::ORIGIN).into()) else {
        panic!("mount should be active");
    };
    if let Some(mount) = world.registry.get_mut(id) {
        mount.core_mut().effects.insert(Effects::RIDDEN);
    }

    run_idle(&mut world, &mut store, 5);
    let mount = world.registry.get(id).expect("mount stays registered");
    assert_eq!(mount.core().move_points, 0);
    assert_eq!(mount.core().pos, spot);
}

#[test]
fn player_death_ends_session_and_saves_everyone() {
    let (mut world, mut store) = world();
    let abs = world.window.local_to_abs(CENTER + sim_core::Point::new(5, 0));
    world.add_actor(abs, Monster::zombie(Tripoint::ORIGIN).into());
    world.registry.player_mut().core.dead = true;

    assert!(run_idle(&mut world, &mut store, 1));
    assert_eq!(world.quit, QuitReason::Died);
    assert!(world.registry.is_empty());
    assert_eq!(world.overmap.deferred_len(), 1);
    assert_eq!(world.overmap.deferred()[0].abs_pos, abs);
    assert!(store.stored() >= 121);
    assert_eq!(world.scent.max_value(), 0);
}

#[test]
fn quitting_ends_the_session_on_the_same_turn() {
    let (mut world, mut store) = world();
    let mut input = Script::new([PlayerAction::SaveAndQuit]);
    assert!(run(&mut world, &mut store, &mut input, 5));
    assert_eq!(world.quit, QuitReason::SaveAndQuit);
    assert_eq!(world.now(), Tick::ZERO);
}

#[test]
fn endless_free_actions_end_the_players_turn() {
    let (mut world, mut store) = world();
    // Walking into a wall costs nothing.
    world
        .window
        .set_terrain(CENTER + sim_core::Point::new(1, 0), TerrainKind::Wall);
    let mut input = Script::new(std::iter::repeat_n(
        PlayerAction::Move(sim_core::Direction::East),
        20,
    ));

    assert!(!run(&mut world, &mut store, &mut input, 1));
    assert!(world.diagnostics.contains(Diagnostics::PLAYER_IDLE_LOOP));
    assert_eq!(input.remaining(), 10);
    assert_eq!(world.player().core.pos, CENTER);
}

#[test]
fn activity_finishes_across_turns() {
    let (mut world, mut store) = world();
    let mut input = Script::new([PlayerAction::StartActivity(Activity::new(
        ActivityKind::Read,
        250,
    ))]);

    run(&mut world, &mut store, &mut input, 2);
    assert!(world.player().activity.is_some());
    run(&mut world, &mut store, &mut input, 1);
    assert!(world.player().activity.is_none());
    assert!(world.log.mentions("You finish reading."));
}

#[test]
fn visible_hostile_interrupts_activity() {
    let (mut world, mut store) = world();
    let abs = world.window.local_to_abs(CENTER + sim_core::Point::new(6, 0));
    let zombie: Creature = Monster::zombie(Tripoint::ORIGIN).into();
    world.add_actor(abs, zombie);
    let mut input = Script::new([PlayerAction::StartActivity(Activity::new(
        ActivityKind::Craft,
        1000,
    ))]);

    run(&mut world, &mut store, &mut input, 1);
    assert!(world.player().activity.is_none());
    assert!(world.log.mentions("You stop crafting"));
}
