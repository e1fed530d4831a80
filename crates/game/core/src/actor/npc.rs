use rand::rngs::StdRng;

use crate::ai::{self, AiProfile, Plan, PlanView};
use crate::state::Tripoint;

use super::{Actor, ActorCore, ActorKind, ActorMemory, Faction, Intent, LoopOutcome};

/// Standing orders for an NPC when no threat is in sight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NpcAttitude {
    /// Stay close to the player.
    Follow,
    /// Hold position.
    #[default]
    Guard,
    Wander,
}

/// Human non-player character.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Npc {
    pub core: ActorCore,
    pub attitude: NpcAttitude,
    pub sight_range: u32,
    /// Flees from visible hostiles below this hp percentage.
    pub flee_below_percent: i32,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub memory: ActorMemory,
    #[cfg_attr(feature = "serde", serde(skip))]
    plan: Plan,
}

impl Npc {
    pub const DEFAULT_SIGHT_RANGE: u32 = 30;
    pub const DEFAULT_FLEE_BELOW_PERCENT: i32 = 25;

    pub fn new(name: impl Into<String>, pos: Tripoint, faction: Faction) -> Self {
        Self {
            core: ActorCore::new(name, pos, faction),
            attitude: NpcAttitude::default(),
            sight_range: Self::DEFAULT_SIGHT_RANGE,
            flee_below_percent: Self::DEFAULT_FLEE_BELOW_PERCENT,
            memory: ActorMemory::default(),
            plan: Plan::default(),
        }
    }

    #[must_use]
    pub fn with_attitude(mut self, attitude: NpcAttitude) -> Self {
        self.attitude = attitude;
        self
    }

    pub fn plan_state(&self) -> &Plan {
        &self.plan
    }

    fn profile(&self) -> AiProfile {
        AiProfile {
            sight_range: self.sight_range,
            tracks_scent: false,
            attacks_hostiles: true,
            flee_below_percent: Some(self.flee_below_percent),
            follows_player: self.attitude == NpcAttitude::Follow
                && self.core.faction.is_friendly_to_player(),
            wanders: self.attitude == NpcAttitude::Wander,
        }
    }
}

impl Actor for Npc {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Npc
    }

    fn plan(&mut self, view: &PlanView<'_>, rng: &mut StdRng) {
        let profile = self.profile();
        self.plan = ai::think(ai::Brain::Npc, &self.core, &mut self.memory, profile, view, rng);
    }

    /// A blocked NPC reconsiders instead of waiting, which costs nothing.
    fn next_intent(&mut self, view: &PlanView<'_>) -> Intent {
        ai::intent_for(&self.plan, &self.core, view, Intent::Think)
    }

    fn on_loop_detected(&mut self) -> LoopOutcome {
        self.core.incapacitate(1);
        LoopOutcome::Incapacitated
    }
}
