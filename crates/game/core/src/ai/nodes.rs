//! Condition and action nodes for the planning trees.
//!
//! Conditions only read the context. Action nodes write the chosen
//! [`Plan`] and succeed, or fail when the plan is not applicable.
use rand::seq::IndexedRandom;

use crate::registry::Occupant;
use crate::state::{Tripoint, rl_dist, square_dist};

use super::{Behavior, Plan, PlanContext, Status};

/// NPCs that follow the player close in once they are further than this.
const FOLLOW_DISTANCE: u32 = 3;

pub struct IsAggressive;

impl Behavior<PlanContext<'_>> for IsAggressive {
    fn tick(&self, ctx: &mut PlanContext<'_>) -> Status {
        Status::from_bool(ctx.profile.attacks_hostiles)
    }
}

pub struct IsBadlyHurt;

impl Behavior<PlanContext<'_>> for IsBadlyHurt {
    fn tick(&self, ctx: &mut PlanContext<'_>) -> Status {
        let hurt = ctx
            .profile
            .flee_below_percent
            .is_some_and(|percent| ctx.me.hp_percent() < percent);
        Status::from_bool(hurt)
    }
}

/// Picks the nearest hostile in sight and remembers it as the target.
///
/// Re-evaluated on every plan, so a window shift or a registry change
/// never leaves a stale target behind.
pub struct FindVisibleHostile;

impl Behavior<PlanContext<'_>> for FindVisibleHostile {
    fn tick(&self, ctx: &mut PlanContext<'_>) -> Status {
        let me = ctx.me.pos;
        let range = ctx.profile.sight_range;
        let view = ctx.view;
        let best = view
            .actors
            .hostiles_of(ctx.me.faction)
            .filter(|&(_, pos)| pos.z == me.z && rl_dist(me, pos) <= range)
            .filter(|&(_, pos)| view.window.sees(me, pos, range))
            .min_by_key(|&(_, pos)| (rl_dist(me, pos), square_dist(me, pos)));

        match best {
            Some((target, pos)) => {
                ctx.memory.target = Some(target);
                ctx.memory.tracking_player = target == Occupant::Player;
                ctx.target = Some((target, pos));
                Status::Success
            }
            None => {
                ctx.memory.target = None;
                ctx.memory.tracking_player = false;
                ctx.target = None;
                Status::Failure
            }
        }
    }
}

pub struct Engage;

impl Behavior<PlanContext<'_>> for Engage {
    fn tick(&self, ctx: &mut PlanContext<'_>) -> Status {
        match ctx.target {
            Some((target, at)) => {
                ctx.plan = Some(Plan::Engage { target, at });
                Status::Success
            }
            None => Status::Failure,
        }
    }
}

pub struct FleeFrom;

impl Behavior<PlanContext<'_>> for FleeFrom {
    fn tick(&self, ctx: &mut PlanContext<'_>) -> Status {
        match ctx.target {
            Some((_, from)) => {
                ctx.plan = Some(Plan::Flee { from });
                Status::Success
            }
            None => Status::Failure,
        }
    }
}

/// Moves up the scent gradient. Scent only exists on the window's z-level.
pub struct FollowScent;

impl Behavior<PlanContext<'_>> for FollowScent {
    fn tick(&self, ctx: &mut PlanContext<'_>) -> Status {
        if !ctx.profile.tracks_scent || ctx.me.pos.z != ctx.view.window.z() {
            return Status::Failure;
        }
        match ctx.view.scent.gradient_step(ctx.me.pos.xy()) {
            Some(next) => {
                ctx.plan = Some(Plan::Goto(Tripoint::new(next.x, next.y, ctx.me.pos.z)));
                Status::Success
            }
            None => Status::Failure,
        }
    }
}

pub struct InvestigateNoise;

impl Behavior<PlanContext<'_>> for InvestigateNoise {
    fn tick(&self, ctx: &mut PlanContext<'_>) -> Status {
        match ctx.memory.heard {
            Some(at) if at == ctx.me.pos || at.z != ctx.me.pos.z => {
                ctx.memory.heard = None;
                Status::Failure
            }
            Some(at) => {
                ctx.plan = Some(Plan::Goto(at));
                Status::Success
            }
            None => Status::Failure,
        }
    }
}

pub struct FollowPlayer;

impl Behavior<PlanContext<'_>> for FollowPlayer {
    fn tick(&self, ctx: &mut PlanContext<'_>) -> Status {
        let player = ctx.view.actors.player_pos();
        let me = ctx.me.pos;
        if !ctx.profile.follows_player || player.z != me.z || rl_dist(me, player) <= FOLLOW_DISTANCE {
            return Status::Failure;
        }
        ctx.plan = Some(Plan::Goto(player));
        Status::Success
    }
}

/// Steps to a random open neighbour.
pub struct Wander;

impl Behavior<PlanContext<'_>> for Wander {
    fn tick(&self, ctx: &mut PlanContext<'_>) -> Status {
        if !ctx.profile.wanders {
            return Status::Failure;
        }
        let view = ctx.view;
        let open: Vec<Tripoint> = ctx.me.pos.neighbors().filter(|&p| view.can_enter(p)).collect();
        match open.choose(&mut *ctx.rng) {
            Some(&next) => {
                ctx.plan = Some(Plan::Goto(next));
                Status::Success
            }
            None => Status::Failure,
        }
    }
}

pub struct Hold;

impl Behavior<PlanContext<'_>> for Hold {
    fn tick(&self, ctx: &mut PlanContext<'_>) -> Status {
        ctx.plan = Some(Plan::Hold);
        Status::Success
    }
}
