//! Actors: the player, NPCs and monsters.
//!
//! Every actor carries an [`ActorCore`] with the state the scheduler reads
//! (position, move points, effects). Autonomous behavior is split in two
//! steps the movement scheduler drives: [`Actor::plan`] picks a goal and
//! [`Actor::next_intent`] turns it into one [`Intent`] that the scheduler
//! validates and executes.
mod creature;
mod faction;
mod monster;
mod npc;
mod player;

use bitflags::bitflags;
use rand::rngs::StdRng;

pub use creature::Creature;
pub use faction::Faction;
pub use monster::Monster;
pub use npc::{Npc, NpcAttitude};
pub use player::{Activity, ActivityKind, Distraction, Player, PlayerFlags};

use crate::ai::PlanView;
use crate::registry::Occupant;
use crate::state::Tripoint;

bitflags! {
    /// Status effects relevant to scheduling.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Effects: u16 {
        /// Under someone else's control; acts only through its controller.
        const CONTROLLED    = 1 << 0;
        /// Mounted by a rider who moves it.
        const RIDDEN        = 1 << 1;
        const STUNNED       = 1 << 2;
        const SLEEPING      = 1 << 3;
        const SUSPENDED     = 1 << 4;
        const INCAPACITATED = 1 << 5;
        /// Holding position; resists being pushed off a staircase.
        const BRACED        = 1 << 6;
        const PUSH_IMMUNE   = 1 << 7;
    }
}

impl Effects {
    /// Effects under which an actor forfeits its move points.
    pub const INACTIVE: Effects = Effects::STUNNED
        .union(Effects::SLEEPING)
        .union(Effects::SUSPENDED)
        .union(Effects::INCAPACITATED);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActorKind {
    Player,
    Npc,
    Monster,
}

/// State shared by every actor.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorCore {
    pub name: String,
    /// Window-local x/y, absolute z.
    pub pos: Tripoint,
    pub move_points: i32,
    /// Move points gained per turn at the nominal allotment.
    pub speed: i32,
    pub hp: i32,
    pub max_hp: i32,
    pub dead: bool,
    pub faction: Faction,
    pub effects: Effects,
    /// Consecutive zero-progress iterations in the current turn.
    pub stalled_iterations: u32,
    stun_turns: u16,
    incapacitated_turns: u16,
}

impl ActorCore {
    pub const DEFAULT_SPEED: i32 = 100;
    pub const DEFAULT_HP: i32 = 20;

    pub fn new(name: impl Into<String>, pos: Tripoint, faction: Faction) -> Self {
        Self {
            name: name.into(),
            pos,
            move_points: 0,
            speed: Self::DEFAULT_SPEED,
            hp: Self::DEFAULT_HP,
            max_hp: Self::DEFAULT_HP,
            dead: false,
            faction,
            effects: Effects::empty(),
            stalled_iterations: 0,
            stun_turns: 0,
            incapacitated_turns: 0,
        }
    }

    #[must_use]
    pub fn with_speed(mut self, speed: i32) -> Self {
        self.speed = speed;
        self
    }

    #[must_use]
    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp;
        self.max_hp = hp;
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: Effects) -> Self {
        self.effects = effects;
        self
    }

    /// Stuns for `turns` full turns.
    pub fn stun(&mut self, turns: u16) {
        self.effects.insert(Effects::STUNNED);
        self.stun_turns = self.stun_turns.max(turns);
    }

    pub fn incapacitate(&mut self, turns: u16) {
        self.effects.insert(Effects::INCAPACITATED);
        self.incapacitated_turns = self.incapacitated_turns.max(turns);
        self.move_points = 0;
    }

    /// Counts timed effects down by one turn.
    pub fn tick_effects(&mut self) {
        if self.effects.contains(Effects::STUNNED) {
            self.stun_turns = self.stun_turns.saturating_sub(1);
            if self.stun_turns == 0 {
                self.effects.remove(Effects::STUNNED);
            }
        }
        if self.effects.contains(Effects::INCAPACITATED) {
            self.incapacitated_turns = self.incapacitated_turns.saturating_sub(1);
            if self.incapacitated_turns == 0 {
                self.effects.remove(Effects::INCAPACITATED);
            }
        }
    }

    /// Applies damage and reports whether it was lethal.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.hp -= amount.max(0);
        if self.hp <= 0 {
            self.dead = true;
        }
        self.dead
    }

    pub fn hp_percent(&self) -> i32 {
        if self.max_hp <= 0 {
            return 0;
        }
        self.hp * 100 / self.max_hp
    }
}

/// Short-lived knowledge an autonomous actor plans with.
///
/// Handles in here are only valid while the actor is active, so memory is
/// dropped when the actor is deferred.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActorMemory {
    pub target: Option<Occupant>,
    /// Last sound the actor heard and has not yet investigated.
    pub heard: Option<Tripoint>,
    /// Set while the current target is the player; stair followers need it.
    pub tracking_player: bool,
}

impl ActorMemory {
    /// Shifts remembered window-local positions.
    pub(crate) fn remap(&mut self, offset: crate::state::Point) {
        if let Some(heard) = self.heard.as_mut() {
            *heard = *heard + offset;
        }
    }
}

/// Single step an actor wants to take this iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Step onto an adjacent tile.
    Move(Tripoint),
    Attack { target: Occupant, at: Tripoint },
    /// Spend the remaining move points.
    Wait,
    /// Deliberate without spending move points.
    Think,
}

/// What happened to an actor that made no progress for too long.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopOutcome {
    Yielded,
    Incapacitated,
}

/// Behavior shared by every actor the scheduler drives.
pub trait Actor {
    fn core(&self) -> &ActorCore;

    fn core_mut(&mut self) -> &mut ActorCore;

    fn kind(&self) -> ActorKind;

    /// Chooses what to pursue given the current view of the world.
    fn plan(&mut self, view: &PlanView<'_>, rng: &mut StdRng);

    /// Turns the current plan into a single step.
    fn next_intent(&mut self, view: &PlanView<'_>) -> Intent;

    /// Forced yield after too many zero-progress iterations.
    fn on_loop_detected(&mut self) -> LoopOutcome {
        self.core_mut().move_points = 0;
        LoopOutcome::Yielded
    }

    /// Loudness of one step, in tiles.
    fn footstep_volume(&self) -> u32 {
        4
    }

    /// Grants the turn's move points; `allotment` is the nominal budget.
    fn begin_turn(&mut self, allotment: i32) {
        let core = self.core_mut();
        core.move_points += core.speed * allotment / ActorCore::DEFAULT_SPEED;
        core.stalled_iterations = 0;
    }

    fn end_turn(&mut self) {
        self.core_mut().tick_effects();
    }

    fn position(&self) -> Tripoint {
        self.core().pos
    }

    fn is_dead(&self) -> bool {
        self.core().dead
    }
}
