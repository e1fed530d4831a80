use rand::rngs::StdRng;

use crate::ai::{self, AiProfile, Plan, PlanView};
use crate::state::Tripoint;

use super::{Actor, ActorCore, ActorKind, ActorMemory, Faction, Intent};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Monster {
    pub core: ActorCore,
    pub species: String,
    pub sight_range: u32,
    /// Follows the player's scent trail when nothing is in sight.
    pub tracks_scent: bool,
    /// Attacks hostile factions on sight.
    pub aggressive: bool,
    pub days_alive: u32,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub memory: ActorMemory,
    #[cfg_attr(feature = "serde", serde(skip))]
    plan: Plan,
}

impl Monster {
    pub const DEFAULT_SIGHT_RANGE: u32 = 20;

    pub fn new(species: impl Into<String>, pos: Tripoint, faction: Faction) -> Self {
        let species = species.into();
        Self {
            core: ActorCore::new(species.clone(), pos, faction),
            species,
            sight_range: Self::DEFAULT_SIGHT_RANGE,
            tracks_scent: true,
            aggressive: faction != Faction::Wildlife,
            days_alive: 0,
            memory: ActorMemory::default(),
            plan: Plan::default(),
        }
    }

    /// The standard shambling zombie.
    pub fn zombie(pos: Tripoint) -> Self {
        Self::new("zombie", pos, Faction::Zombie).with_speed(70)
    }

    #[must_use]
    pub fn with_speed(mut self, speed: i32) -> Self {
        self.core.speed = speed;
        self
    }

    #[must_use]
    pub fn with_sight_range(mut self, range: u32) -> Self {
        self.sight_range = range;
        self
    }

    pub fn plan_state(&self) -> &Plan {
        &self.plan
    }

    fn profile(&self) -> AiProfile {
        AiProfile {
            sight_range: self.sight_range,
            tracks_scent: self.tracks_scent,
            attacks_hostiles: self.aggressive,
            flee_below_percent: None,
            follows_player: false,
            wanders: true,
        }
    }
}

impl Actor for Monster {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Monster
    }

    fn plan(&mut self, view: &PlanView<'_>, rng: &mut StdRng) {
        let profile = self.profile();
        self.plan = ai::think(ai::Brain::Monster, &self.core, &mut self.memory, profile, view, rng);
    }

    fn next_intent(&mut self, view: &PlanView<'_>) -> Intent {
        ai::intent_for(&self.plan, &self.core, view, Intent::Wait)
    }
}
