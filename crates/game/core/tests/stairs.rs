mod common;

use common::{CENTER, world, world_with};
use proptest::prelude::*;
use sim_core::engine::{update_stair_monsters, vertical_move};
use sim_core::state::{Diagnostics, rl_dist};
use sim_core::{
    Actor, ActorId, Creature, Effects, Faction, IdleInput, Monster, NoopHooks, Npc, Occupant,
    Placement, Point, SimConfig, SimEnv, StairEntry, Submap, TerrainKind, Tripoint,
    VerticalDirection, WorldState,
};

/// The only up-staircase in reach of arriving followers.
const LANDING: Tripoint = Tripoint::new(69, 66, 0);

/// Four up-staircases three tiles from the player.
fn place_arrival_stairs(world: &mut WorldState) {
    for offset in [Point::new(3, 0), Point::new(-3, 0), Point::new(0, 3), Point::new(0, -3)] {
        world.window.set_terrain(CENTER + offset, TerrainKind::StairsUp);
    }
}

fn queue(world: &mut WorldState, countdowns: &[i32]) {
    let origin = Tripoint::new(6, 6, 1);
    for (i, &countdown) in countdowns.iter().enumerate() {
        let mut zombie = Monster::zombie(Tripoint::ORIGIN);
        zombie.core.name = format!("zombie {i}");
        world.stairs.push(StairEntry {
            creature: zombie.into(),
            countdown,
            from_z: 1,
            direction: VerticalDirection::Down,
            origin,
        });
    }
    let abs_sub = world.window.abs_sub();
    world.stairs.set_anchor(abs_sub);
}

fn seeded(seed: u64) -> WorldState {
    let (mut world, _store) = world_with(SimConfig::new().with_seed(seed));
    world.window.set_terrain(LANDING, TerrainKind::StairsUp);
    world
}

fn wall_in(world: &mut WorldState, around: Tripoint, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx != 0 || dy != 0 {
                world.window.set_terrain(around + Point::new(dx, dy), TerrainKind::Wall);
            }
        }
    }
}

fn player_on_landing(world: &mut WorldState) {
    world
        .registry
        .relocate(Occupant::Player, LANDING)
        .expect("landing is free");
}

fn npc_on_landing(world: &mut WorldState, effects: Effects) -> ActorId {
    let mut npc = Npc::new("Ana", Tripoint::ORIGIN, Faction::Ally);
    npc.core.effects = effects;
    let abs = world.window.local_to_abs(LANDING);
    match world.add_actor(abs, npc.into()) {
        Placement::Active(id) => id,
        other => panic!("npc should be active, got {other:?}"),
    }
}

fn arriving_zombie(world: &WorldState) -> Option<Tripoint> {
    world
        .registry
        .iter()
        .find(|(_, c)| c.name() == "zombie 0")
        .map(|(_, c)| c.core().pos)
}

fn waiting(world: &WorldState) -> Vec<i32> {
    world.stairs.entries().iter().map(|entry| entry.countdown).collect()
}

#[test]
fn shorter_countdowns_arrive_first() {
    let (mut world, _store) = world();
    place_arrival_stairs(&mut world);
    queue(&mut world, &[4, 4, 8, 12]);
    let mut hooks = NoopHooks;

    update_stair_monsters(&mut world, &mut hooks);
    assert_eq!(waiting(&world), vec![4, 8]);
    assert_eq!(world.registry.len(), 2);
    let arrived: Vec<&str> = world.registry.iter().map(|(_, c)| c.name()).collect();
    assert!(arrived.contains(&"zombie 0") && arrived.contains(&"zombie 1"));
    assert!(world.log.mentions("comes down the stairs!"));

    update_stair_monsters(&mut world, &mut hooks);
    assert_eq!(waiting(&world), vec![4]);
    assert_eq!(world.registry.len(), 3);

    update_stair_monsters(&mut world, &mut hooks);
    assert!(world.stairs.is_empty());
    assert_eq!(world.stairs.anchor(), None);
    assert_eq!(world.registry.len(), 4);
    assert_eq!(world.population(), 4);
}

#[test]
fn queue_far_from_anchor_is_deferred() {
    let (mut world, _store) = world();
    place_arrival_stairs(&mut world);
    queue(&mut world, &[4, 8]);
    let anchor = world.window.abs_sub() + Point::new(3, 0);
    world.stairs.set_anchor(anchor);

    update_stair_monsters(&mut world, &mut NoopHooks);
    assert!(world.stairs.is_empty());
    assert!(world.registry.is_empty());
    assert_eq!(world.overmap.deferred_len(), 2);
    assert!(world.diagnostics.contains(Diagnostics::STAIR_QUEUE_DROPPED));
}

#[test]
fn no_arrival_stairs_sends_followers_back() {
    let (mut world, _store) = world();
    queue(&mut world, &[4]);

    update_stair_monsters(&mut world, &mut NoopHooks);
    assert!(world.stairs.is_empty());
    assert_eq!(world.overmap.deferred_len(), 1);
    assert_eq!(world.overmap.deferred()[0].abs_pos, Tripoint::new(6, 6, 1));
}

#[test]
fn descending_queues_trackers_and_defers_the_rest() {
    let (mut world, mut store) = world();
    world.window.set_terrain(CENTER, TerrainKind::StairsDown);

    let chaser_abs = world.window.local_to_abs(CENTER + Point::new(2, 0));
    let Placement::Active(chaser) = world.add_actor(chaser_abs, Monster::zombie(Tripoint::ORIGIN).into())
    else {
        panic!("chaser should be active");
    };
    if let Some(creature) = world.registry.get_mut(chaser) {
        creature.memory_mut().tracking_player = true;
    }
    let bystander: Creature = Npc::new("Ana", Tripoint::ORIGIN, Faction::Ally).into();
    world.add_actor(world.window.local_to_abs(CENTER + Point::new(0, 4)), bystander);

    let mut hooks = NoopHooks;
    let mut input = IdleInput;
    let mut env = SimEnv::new(&mut store, &mut hooks, &mut input);
    vertical_move(&mut world, &mut env, -1).expect("stairs lead down");

    assert_eq!(world.player().core.pos.z, -1);
    assert_eq!(world.window.z(), -1);
    assert!(world.registry.is_empty());
    assert_eq!(world.stairs.len(), 1);
    assert_eq!(world.stairs.entries()[0].countdown, 8);
    assert_eq!(world.stairs.entries()[0].origin, chaser_abs);
    let abs_sub = world.window.abs_sub();
    assert_eq!(world.stairs.anchor(), Some(abs_sub));
    assert_eq!(world.overmap.deferred_len(), 1);
    assert_eq!(world.scent.max_value(), 0);

    // Going straight back up returns the follower to where it left from.
    let here = world.player().core.pos;
    world.window.set_terrain(here, TerrainKind::StairsUp);
    let mut env = SimEnv::new(&mut store, &mut hooks, &mut input);
    vertical_move(&mut world, &mut env, 1).expect("stairs lead up");
    assert!(world.stairs.is_empty());
    assert_eq!(world.registry.len(), 2);
    assert_eq!(world.overmap.deferred_len(), 0);
}

#[test]
fn queue_survives_a_recentre_after_descending() {
    let (mut world, mut store) = world();
    world.window.set_terrain(CENTER, TerrainKind::StairsDown);
    // Only staircase below sits two submaps east of the player, at abs (26, 6, -1).
    let mut below = Submap::default();
    below.set_terrain(Point::new(2, 6), TerrainKind::StairsUp);
    store.insert(Tripoint::new(2, 0, -1), below);

    let chaser_abs = world.window.local_to_abs(CENTER + Point::new(2, 0));
    let Placement::Active(chaser) = world.add_actor(chaser_abs, Monster::zombie(Tripoint::ORIGIN).into())
    else {
        panic!("chaser should be active");
    };
    if let Some(creature) = world.registry.get_mut(chaser) {
        creature.memory_mut().tracking_player = true;
    }
    let start_sub = world.window.abs_sub();

    let mut hooks = NoopHooks;
    let mut input = IdleInput;
    let mut env = SimEnv::new(&mut store, &mut hooks, &mut input);
    vertical_move(&mut world, &mut env, -1).expect("stairs lead down");

    let abs_sub = world.window.abs_sub();
    assert_eq!(abs_sub, Tripoint::new(-3, -5, -1));
    assert_ne!(abs_sub.xy(), start_sub.xy());
    assert_eq!(world.window.local_to_abs(world.player().core.pos), Tripoint::new(26, 6, -1));
    assert_eq!(world.stairs.anchor(), Some(abs_sub));
    assert_eq!(waiting(&world), vec![8]);

    update_stair_monsters(&mut world, &mut hooks);
    assert!(!world.diagnostics.contains(Diagnostics::STAIR_QUEUE_DROPPED));
    assert_eq!(waiting(&world), vec![4]);

    update_stair_monsters(&mut world, &mut hooks);
    assert!(world.stairs.is_empty());
    assert_eq!(world.overmap.deferred_len(), 0);
    assert_eq!(world.registry.len(), 1);
    assert_eq!(world.population(), 1);
}

#[test]
fn nimble_player_sidesteps_the_arrival() {
    let mut world = seeded(7);
    player_on_landing(&mut world);
    world.registry.player_mut().dodge = 100;
    queue(&mut world, &[4]);

    update_stair_monsters(&mut world, &mut NoopHooks);
    assert!(world.log.mentions("You sidestep the zombie 0"));
    assert_eq!(world.player().core.pos, LANDING);
    let zombie = arriving_zombie(&world).expect("zombie arrived");
    assert_eq!(rl_dist(zombie, LANDING), 1);
    assert_eq!(world.population(), 1);
}

#[test]
fn arrival_pushes_an_unwary_player_off_the_stairs() {
    let mut world = seeded(7);
    player_on_landing(&mut world);
    world.registry.player_mut().dodge = 0;
    let before = world.player().core.move_points;
    queue(&mut world, &[4]);

    update_stair_monsters(&mut world, &mut NoopHooks);
    assert!(world.log.mentions("The zombie 0 pushes you out of the way!"));
    let player = world.player().core.pos;
    assert_eq!(rl_dist(player, LANDING), 1);
    assert_eq!(world.player().core.move_points, before - 100);
    assert_eq!(arriving_zombie(&world), Some(LANDING));
    assert_eq!(world.population(), 1);
}

#[test]
fn braced_player_sometimes_holds_the_stairs() {
    let mut held = 0;
    for seed in 0..48 {
        let mut world = seeded(seed);
        player_on_landing(&mut world);
        world.registry.player_mut().dodge = 0;
        world.registry.player_mut().core.effects.insert(Effects::BRACED);
        queue(&mut world, &[4]);

        update_stair_monsters(&mut world, &mut NoopHooks);
        assert_eq!(world.population(), 1);
        let zombie = arriving_zombie(&world).expect("zombie arrived");
        if world.log.mentions("but you hold your ground!") {
            held += 1;
            assert_eq!(world.player().core.pos, LANDING);
            assert_eq!(rl_dist(zombie, LANDING), 1);
        } else {
            assert!(world.log.mentions("pushes you out of the way!"));
            assert_eq!(zombie, LANDING);
        }
    }
    assert!(held > 0 && held < 48, "held {held} of 48");
}

#[test]
fn walled_in_player_is_attacked_and_arrival_lands_nearby() {
    let mut world = seeded(3);
    player_on_landing(&mut world);
    wall_in(&mut world, LANDING, 1);
    queue(&mut world, &[4]);

    update_stair_monsters(&mut world, &mut NoopHooks);
    assert!(world.log.mentions("The zombie 0 attacks you from the stairs!"));
    assert_eq!(world.player().core.pos, LANDING);
    let zombie = arriving_zombie(&world).expect("zombie found room nearby");
    let distance = rl_dist(zombie, LANDING);
    assert!((2..=SimConfig::RELOCATION_RADIUS as u32).contains(&distance));
    assert_eq!(world.overmap.deferred_len(), 0);
    assert_eq!(world.population(), 1);
}

#[test]
fn sealed_landing_strikes_from_the_stairs_and_goes_back() {
    let mut world = seeded(3);
    player_on_landing(&mut world);
    wall_in(&mut world, LANDING, SimConfig::RELOCATION_RADIUS);
    queue(&mut world, &[4]);

    update_stair_monsters(&mut world, &mut NoopHooks);
    assert!(world.log.mentions("attacks you from the stairs!"));
    assert!(world.registry.is_empty());
    assert_eq!(world.overmap.deferred_len(), 1);
    assert_eq!(world.overmap.deferred()[0].abs_pos, Tripoint::new(6, 6, 1));
    assert_eq!(world.population(), 1);
}

#[test]
fn arrival_shoves_an_npc_aside() {
    let mut stunned = 0;
    for seed in 0..32 {
        let mut world = seeded(seed);
        let npc = npc_on_landing(&mut world, Effects::empty());
        queue(&mut world, &[4]);

        update_stair_monsters(&mut world, &mut NoopHooks);
        assert!(world.log.mentions("The zombie 0 shoves the Ana aside!"));
        assert_eq!(arriving_zombie(&world), Some(LANDING));
        let ana = world.registry.get(npc).expect("npc stays registered");
        assert_eq!(rl_dist(ana.core().pos, LANDING), 1);
        let is_stunned = ana.core().effects.contains(Effects::STUNNED);
        assert_eq!(is_stunned, world.log.mentions("The Ana is stunned!"));
        stunned += usize::from(is_stunned);
        assert_eq!(world.population(), 2);
    }
    assert!(stunned > 0 && stunned < 32, "stunned {stunned} of 32");
}

#[test]
fn braced_npc_that_holds_is_always_stunned() {
    let mut held = 0;
    for seed in 0..48 {
        let mut world = seeded(seed);
        let npc = npc_on_landing(&mut world, Effects::BRACED);
        queue(&mut world, &[4]);

        update_stair_monsters(&mut world, &mut NoopHooks);
        assert_eq!(world.population(), 2);
        if !world.log.mentions("but it holds its ground!") {
            continue;
        }
        held += 1;
        let ana = world.registry.get(npc).expect("npc stays registered");
        assert_eq!(ana.core().pos, LANDING);
        assert!(ana.core().effects.contains(Effects::STUNNED));
        assert!(world.log.mentions("The Ana is stunned!"));
        let zombie = arriving_zombie(&world).expect("zombie arrived");
        assert_eq!(rl_dist(zombie, LANDING), 1);
    }
    assert!(held > 0, "no seed let the npc hold");
}

#[test]
fn walled_in_npc_is_attacked_without_player_messages() {
    let mut world = seeded(5);
    let npc = npc_on_landing(&mut world, Effects::empty());
    wall_in(&mut world, LANDING, 1);
    queue(&mut world, &[4]);

    update_stair_monsters(&mut world, &mut NoopHooks);
    assert!(!world.log.mentions("attacks you from the stairs!"));
    assert!(!world.log.mentions("shoves"));
    let ana = world.registry.get(npc).expect("npc stays registered");
    assert_eq!(ana.core().pos, LANDING);
    let zombie = arriving_zombie(&world).expect("zombie found room nearby");
    assert!(rl_dist(zombie, LANDING) <= SimConfig::RELOCATION_RADIUS as u32);
    assert_eq!(world.population(), 2);
}

#[test]
fn climbing_without_stairs_changes_nothing() {
    let (mut world, mut store) = world();
    let mut hooks = NoopHooks;
    let mut input = IdleInput;
    let mut env = SimEnv::new(&mut store, &mut hooks, &mut input);

    assert!(vertical_move(&mut world, &mut env, 1).is_err());
    assert_eq!(world.player().core.pos, CENTER);
    assert_eq!(world.window.z(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn crowded_landing_never_loses_anyone(seed in any::<u64>(), walled in 0i32..=3, npc in any::<bool>()) {
        let mut world = seeded(seed);
        if npc {
            npc_on_landing(&mut world, Effects::BRACED);
        } else {
            player_on_landing(&mut world);
        }
        wall_in(&mut world, LANDING, walled);
        queue(&mut world, &[4, 4]);
        let total = world.population();

        update_stair_monsters(&mut world, &mut NoopHooks);
        prop_assert!(world.stairs.is_empty());
        prop_assert_eq!(world.population(), total);
    }

    #[test]
    fn stair_queue_always_drains(countdowns in prop::collection::vec(1i32..=40, 1..8)) {
        let (mut world, _store) = world();
        place_arrival_stairs(&mut world);
        queue(&mut world, &countdowns);
        let total = countdowns.len();
        let step = world.config.stair_countdown_step;
        let rounds = countdowns.iter().map(|c| (c + step - 1) / step).max().unwrap_or(0);

        for _ in 0..rounds {
            prop_assert_eq!(world.population(), total);
            update_stair_monsters(&mut world, &mut NoopHooks);
        }
        prop_assert!(world.stairs.is_empty());
        prop_assert_eq!(world.population(), total);
    }
}
