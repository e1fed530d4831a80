//! Player input sources for headless sessions.
use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use sim_core::{Activity, Direction, Distraction, PlayerAction, PlayerInput, TerrainFlags, WorldState};

/// Replays a fixed list of actions, then waits forever.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    actions: VecDeque<PlayerAction>,
    /// Answer given when an activity is interrupted.
    pub cancel_on_distraction: bool,
}

impl ScriptedInput {
    pub fn new(actions: impl IntoIterator<Item = PlayerAction>) -> Self {
        Self {
            actions: actions.into_iter().collect(),
            cancel_on_distraction: true,
        }
    }

    pub fn remaining(&self) -> usize {
        self.actions.len()
    }
}

impl PlayerInput for ScriptedInput {
    fn next_action(&mut self, _world: &WorldState) -> PlayerAction {
        self.actions.pop_front().unwrap_or(PlayerAction::Wait)
    }

    fn confirm_cancel(&mut self, _activity: &Activity, _reason: Distraction) -> bool {
        self.cancel_on_distraction
    }
}

/// Seeded wanderer: keeps a heading, turns at random or when blocked, and
/// now and then takes a staircase it is standing on.
#[derive(Clone, Debug)]
pub struct RandomWalk {
    rng: StdRng,
    heading: Direction,
}

impl RandomWalk {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            heading: Direction::North,
        }
    }
}

impl PlayerInput for RandomWalk {
    fn next_action(&mut self, world: &WorldState) -> PlayerAction {
        let pos = world.player().core.pos;
        let flags = world.window.flags(pos);
        if self.rng.random_ratio(1, 4) {
            if flags.contains(TerrainFlags::GOES_DOWN) {
                return PlayerAction::Descend;
            }
            if flags.contains(TerrainFlags::GOES_UP) {
                return PlayerAction::Ascend;
            }
        }
        if self.rng.random_ratio(1, 10) {
            return PlayerAction::Wait;
        }

        let blocked = !world.window.is_passable(pos + self.heading.delta());
        if (blocked || self.rng.random_ratio(1, 8))
            && let Some(&dir) = Direction::ALL.choose(&mut self.rng)
        {
            self.heading = dir;
        }
        PlayerAction::Move(self.heading)
    }

    fn confirm_cancel(&mut self, _activity: &Activity, _reason: Distraction) -> bool {
        true
    }
}
