//! Planning for autonomous actors.
//!
//! Monsters and NPCs choose a [`Plan`] by ticking a behavior tree against a
//! [`PlanContext`], then [`intent_for`] turns the plan into a single step.
//! Planning only reads the world through [`PlanView`]; the movement
//! scheduler applies the resulting intent.
mod nodes;
mod tree;

use rand::rngs::StdRng;

pub use tree::{Behavior, Selector, Sequence, Status};

use crate::actor::{ActorCore, ActorMemory, Intent};
use crate::registry::{Occupant, RosterView};
use crate::scent::ScentField;
use crate::state::{Tripoint, TurnClock, rl_dist, square_dist};
use crate::window::SpatialWindow;

/// Read-only view of the world an actor plans against.
#[derive(Clone, Copy)]
pub struct PlanView<'a> {
    pub window: &'a SpatialWindow,
    pub scent: &'a ScentField,
    pub clock: &'a TurnClock,
    pub actors: RosterView<'a>,
}

impl PlanView<'_> {
    /// True if an actor could step onto `pos` right now.
    pub fn can_enter(&self, pos: Tripoint) -> bool {
        self.window.is_passable(pos) && self.actors.is_free(pos)
    }
}

/// Goal an actor pursues until it re-plans.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Plan {
    #[default]
    Hold,
    Goto(Tripoint),
    Engage { target: Occupant, at: Tripoint },
    Flee { from: Tripoint },
}

/// Per-actor tuning consulted by the tree nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AiProfile {
    pub sight_range: u32,
    pub tracks_scent: bool,
    pub attacks_hostiles: bool,
    pub flee_below_percent: Option<i32>,
    pub follows_player: bool,
    pub wanders: bool,
}

/// Blackboard for one planning pass.
pub struct PlanContext<'a> {
    pub view: &'a PlanView<'a>,
    pub me: &'a ActorCore,
    pub memory: &'a mut ActorMemory,
    pub profile: AiProfile,
    pub rng: &'a mut StdRng,
    /// Hostile picked by the sight check, with its position.
    pub target: Option<(Occupant, Tripoint)>,
    pub plan: Option<Plan>,
}

/// Which tree an actor plans with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Brain {
    Monster,
    Npc,
}

/// Monster tree: attack what it sees, else follow scent, else investigate
/// noise, else wander.
pub fn monster_brain<'a>() -> Selector<'a, PlanContext<'a>> {
    use nodes::*;
    Selector::new(vec![
        Box::new(Sequence::new(vec![
            Box::new(IsAggressive),
            Box::new(FindVisibleHostile),
            Box::new(Engage),
        ])),
        Box::new(FollowScent),
        Box::new(InvestigateNoise),
        Box::new(Wander),
        Box::new(Hold),
    ])
}

/// NPC tree: flee when badly hurt, fight, follow the player, investigate,
/// wander or hold.
pub fn npc_brain<'a>() -> Selector<'a, PlanContext<'a>> {
    use nodes::*;
    Selector::new(vec![
        Box::new(Sequence::new(vec![
            Box::new(FindVisibleHostile),
            Box::new(IsBadlyHurt),
            Box::new(FleeFrom),
        ])),
        Box::new(Sequence::new(vec![
            Box::new(IsAggressive),
            Box::new(FindVisibleHostile),
            Box::new(Engage),
        ])),
        Box::new(FollowPlayer),
        Box::new(InvestigateNoise),
        Box::new(Wander),
        Box::new(Hold),
    ])
}

/// Runs `brain` for one actor and returns the chosen plan.
pub fn think(
    brain: Brain,
    me: &ActorCore,
    memory: &mut ActorMemory,
    profile: AiProfile,
    view: &PlanView<'_>,
    rng: &mut StdRng,
) -> Plan {
    let mut ctx = PlanContext {
        view,
        me,
        memory,
        profile,
        rng,
        target: None,
        plan: None,
    };
    let tree = match brain {
        Brain::Monster => monster_brain(),
        Brain::Npc => npc_brain(),
    };
    tree.tick(&mut ctx);
    ctx.plan.unwrap_or_default()
}

/// Converts a plan into one step. `blocked` is returned when the plan calls
/// for movement but no neighbouring tile makes progress.
pub fn intent_for(plan: &Plan, me: &ActorCore, view: &PlanView<'_>, blocked: Intent) -> Intent {
    match *plan {
        Plan::Hold => Intent::Wait,
        Plan::Goto(goal) if goal == me.pos => Intent::Wait,
        Plan::Goto(goal) => step_toward(me.pos, goal, view).map_or(blocked, Intent::Move),
        Plan::Engage { target, at } if at.z == me.pos.z && rl_dist(me.pos, at) <= 1 => {
            Intent::Attack { target, at }
        }
        Plan::Engage { at, .. } => step_toward(me.pos, at, view).map_or(blocked, Intent::Move),
        Plan::Flee { from } => step_away(me.pos, from, view).map_or(blocked, Intent::Move),
    }
}

/// Neighbour of `from` that is strictly closer to `goal`, preferring the
/// straightest line.
pub fn step_toward(from: Tripoint, goal: Tripoint, view: &PlanView<'_>) -> Option<Tripoint> {
    let current = rl_dist(from, goal);
    from.neighbors()
        .filter(|&next| rl_dist(next, goal) < current && view.can_enter(next))
        .min_by_key(|&next| (rl_dist(next, goal), square_dist(next, goal)))
}

/// Neighbour of `from` that is strictly further from `threat`.
pub fn step_away(from: Tripoint, threat: Tripoint, view: &PlanView<'_>) -> Option<Tripoint> {
    let current = rl_dist(from, threat);
    from.neighbors()
        .filter(|&next| rl_dist(next, threat) > current && view.can_enter(next))
        .max_by_key(|&next| (rl_dist(next, threat), square_dist(next, threat)))
}
