//! Shared fixtures for the turn pipeline tests.
#![allow(dead_code)]

use std::collections::VecDeque;

use sim_core::{
    FlatGenerator, MemoryChunkStore, NoopHooks, Player, PlayerAction, PlayerInput, SimConfig,
    SimEnv, Tripoint, WorldState, do_turn,
};

pub type Store = MemoryChunkStore<FlatGenerator>;

/// Absolute tile that lands at window-local (66, 66).
pub const START: Tripoint = Tripoint::new(6, 6, 0);

/// Window-local position of the player at the start of every fixture.
pub const CENTER: Tripoint = Tripoint::new(66, 66, 0);

pub fn world_with(config: SimConfig) -> (WorldState, Store) {
    let mut store = MemoryChunkStore::new(FlatGenerator);
    let world = WorldState::new(config, Player::new("you", START), &mut store)
        .expect("flat world loads");
    (world, store)
}

pub fn world() -> (WorldState, Store) {
    world_with(SimConfig::new())
}

/// Plays back a fixed list of actions, then waits forever.
#[derive(Debug, Default)]
pub struct Script {
    actions: VecDeque<PlayerAction>,
}

impl Script {
    pub fn new(actions: impl IntoIterator<Item = PlayerAction>) -> Self {
        Self {
            actions: actions.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.actions.len()
    }
}

impl PlayerInput for Script {
    fn next_action(&mut self, _world: &WorldState) -> PlayerAction {
        self.actions.pop_front().unwrap_or(PlayerAction::Wait)
    }
}

/// Runs `turns` turns with no-op hooks. Returns `true` if the session ended.
pub fn run(world: &mut WorldState, store: &mut Store, input: &mut dyn PlayerInput, turns: usize) -> bool {
    let mut hooks = NoopHooks;
    for _ in 0..turns {
        let mut env = SimEnv::new(store, &mut hooks, input);
        if do_turn(world, &mut env) {
            return true;
        }
    }
    false
}

pub fn run_idle(world: &mut WorldState, store: &mut Store, turns: usize) -> bool {
    run(world, store, &mut Script::default(), turns)
}
