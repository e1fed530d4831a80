use rand::rngs::StdRng;

use crate::ai::PlanView;

use super::{Actor, ActorCore, ActorKind, ActorMemory, Intent, LoopOutcome, Monster, Npc};

/// Any non-player actor, in a form that can be stored and serialized.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Creature {
    Npc(Npc),
    Monster(Monster),
}

impl Creature {
    pub fn name(&self) -> &str {
        &self.core().name
    }

    pub fn is_npc(&self) -> bool {
        matches!(self, Creature::Npc(_))
    }

    pub fn as_npc(&self) -> Option<&Npc> {
        match self {
            Creature::Npc(npc) => Some(npc),
            Creature::Monster(_) => None,
        }
    }

    pub fn as_monster(&self) -> Option<&Monster> {
        match self {
            Creature::Monster(monster) => Some(monster),
            Creature::Npc(_) => None,
        }
    }

    pub fn as_monster_mut(&mut self) -> Option<&mut Monster> {
        match self {
            Creature::Monster(monster) => Some(monster),
            Creature::Npc(_) => None,
        }
    }

    pub fn memory(&self) -> &ActorMemory {
        match self {
            Creature::Npc(npc) => &npc.memory,
            Creature::Monster(monster) => &monster.memory,
        }
    }

    pub fn memory_mut(&mut self) -> &mut ActorMemory {
        match self {
            Creature::Npc(npc) => &mut npc.memory,
            Creature::Monster(monster) => &mut monster.memory,
        }
    }
}

impl From<Npc> for Creature {
    fn from(npc: Npc) -> Self {
        Creature::Npc(npc)
    }
}

impl From<Monster> for Creature {
    fn from(monster: Monster) -> Self {
        Creature::Monster(monster)
    }
}

impl Actor for Creature {
    fn core(&self) -> &ActorCore {
        match self {
            Creature::Npc(npc) => npc.core(),
            Creature::Monster(monster) => monster.core(),
        }
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        match self {
            Creature::Npc(npc) => npc.core_mut(),
            Creature::Monster(monster) => monster.core_mut(),
        }
    }

    fn kind(&self) -> ActorKind {
        match self {
            Creature::Npc(_) => ActorKind::Npc,
            Creature::Monster(_) => ActorKind::Monster,
        }
    }

    fn plan(&mut self, view: &PlanView<'_>, rng: &mut StdRng) {
        match self {
            Creature::Npc(npc) => npc.plan(view, rng),
            Creature::Monster(monster) => monster.plan(view, rng),
        }
    }

    fn next_intent(&mut self, view: &PlanView<'_>) -> Intent {
        match self {
            Creature::Npc(npc) => npc.next_intent(view),
            Creature::Monster(monster) => monster.next_intent(view),
        }
    }

    fn on_loop_detected(&mut self) -> LoopOutcome {
        match self {
            Creature::Npc(npc) => npc.on_loop_detected(),
            Creature::Monster(monster) => monster.on_loop_detected(),
        }
    }

    fn footstep_volume(&self) -> u32 {
        match self {
            Creature::Npc(npc) => npc.footstep_volume(),
            Creature::Monster(monster) => monster.footstep_volume(),
        }
    }
}
