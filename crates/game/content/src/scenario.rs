//! Scenario descriptions: where the player starts and who is around.
use sim_core::{
    Creature, Faction, Monster, Npc, NpcAttitude, Player, PlayerFlags, Tripoint,
};

/// Player start. `pos` is an absolute tile.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerSpec {
    pub name: String,
    pub pos: Tripoint,
    #[cfg_attr(feature = "serde", serde(default))]
    pub power: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub motion_alarm: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub scent_mask: bool,
}

impl PlayerSpec {
    pub fn build(&self) -> Player {
        let mut flags = PlayerFlags::empty();
        flags.set(PlayerFlags::MOTION_ALARM, self.motion_alarm);
        flags.set(PlayerFlags::SCENT_MASK, self.scent_mask);
        Player::new(self.name.clone(), self.pos)
            .with_flags(flags)
            .with_power(self.power)
    }
}

/// An actor placed when the scenario starts. Positions are absolute tiles.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActorSpec {
    Zombie {
        pos: Tripoint,
    },
    Monster {
        species: String,
        faction: Faction,
        pos: Tripoint,
        #[cfg_attr(feature = "serde", serde(default))]
        speed: Option<i32>,
    },
    Npc {
        name: String,
        faction: Faction,
        pos: Tripoint,
        #[cfg_attr(feature = "serde", serde(default))]
        attitude: NpcAttitude,
    },
}

impl ActorSpec {
    pub fn pos(&self) -> Tripoint {
        match self {
            ActorSpec::Zombie { pos } | ActorSpec::Monster { pos, .. } | ActorSpec::Npc { pos, .. } => {
                *pos
            }
        }
    }

    pub fn build(&self) -> Creature {
        match self {
            ActorSpec::Zombie { pos } => Monster::zombie(*pos).into(),
            ActorSpec::Monster {
                species,
                faction,
                pos,
                speed,
            } => {
                let monster = Monster::new(species.clone(), *pos, *faction);
                match speed {
                    Some(speed) => monster.with_speed(*speed).into(),
                    None => monster.into(),
                }
            }
            ActorSpec::Npc {
                name,
                faction,
                pos,
                attitude,
            } => Npc::new(name.clone(), *pos, *faction)
                .with_attitude(*attitude)
                .into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScenarioSpec {
    pub name: String,
    pub player: PlayerSpec,
    #[cfg_attr(feature = "serde", serde(default))]
    pub actors: Vec<ActorSpec>,
}

impl ScenarioSpec {
    /// A lone player at the absolute origin.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            player: PlayerSpec {
                name: "you".to_owned(),
                pos: Tripoint::ORIGIN,
                power: 0,
                motion_alarm: false,
                scent_mask: false,
            },
            actors: Vec::new(),
        }
    }

    /// Builds the initial actors with their absolute positions.
    pub fn actors(&self) -> impl Iterator<Item = (Tripoint, Creature)> + '_ {
        self.actors.iter().map(|spec| (spec.pos(), spec.build()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::Actor;

    #[test]
    fn built_player_carries_flags_and_power() {
        let mut scenario = ScenarioSpec::empty("test");
        scenario.player.motion_alarm = true;
        scenario.player.power = 5;
        let player = scenario.player.build();
        assert!(player.flags.contains(PlayerFlags::MOTION_ALARM));
        assert!(!player.flags.contains(PlayerFlags::SCENT_MASK));
        assert_eq!(player.power, 5);
    }

    #[test]
    fn monster_speed_override() {
        let spec = ActorSpec::Monster {
            species: "dog".to_owned(),
            faction: Faction::Wildlife,
            pos: Tripoint::new(1, 2, 0),
            speed: Some(150),
        };
        let creature = spec.build();
        assert_eq!(creature.core().speed, 150);
        assert_eq!(creature.core().pos, spec.pos());
    }
}
