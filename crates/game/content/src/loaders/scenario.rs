//! Scenario loader.

use std::path::Path;

use crate::loaders::{LoadResult, read_file};
use crate::scenario::ScenarioSpec;

/// Loader for scenarios from RON files.
///
/// RON format: a single `ScenarioSpec`.
pub struct ScenarioLoader;

impl ScenarioLoader {
    pub fn load(path: &Path) -> LoadResult<ScenarioSpec> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<ScenarioSpec> {
        let scenario: ScenarioSpec = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse scenario RON: {}", e))?;
        for spec in &scenario.actors {
            if spec.pos() == scenario.player.pos {
                anyhow::bail!(
                    "scenario '{}' places an actor on the player's tile {}",
                    scenario.name,
                    spec.pos()
                );
            }
        }
        Ok(scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ActorSpec;
    use sim_core::{Faction, NpcAttitude, Tripoint};

    const SAMPLE: &str = r#"(
        name: "basement",
        player: (name: "Riley", pos: (x: 6, y: 6, z: 0), motion_alarm: true, power: 3),
        actors: [
            Zombie(pos: (x: 20, y: 6, z: 0)),
            Npc(name: "Ana", faction: Ally, pos: (x: 8, y: 8, z: 0), attitude: Follow),
            Monster(species: "dog", faction: Wildlife, pos: (x: -4, y: 2, z: 0)),
        ],
    )"#;

    #[test]
    fn parses_sample_scenario() {
        let scenario = ScenarioLoader::parse(SAMPLE).expect("valid scenario");
        assert_eq!(scenario.name, "basement");
        assert_eq!(scenario.player.pos, Tripoint::new(6, 6, 0));
        assert!(scenario.player.motion_alarm);
        assert_eq!(scenario.actors.len(), 3);
        assert_eq!(
            scenario.actors[1],
            ActorSpec::Npc {
                name: "Ana".to_owned(),
                faction: Faction::Ally,
                pos: Tripoint::new(8, 8, 0),
                attitude: NpcAttitude::Follow,
            }
        );
        assert_eq!(scenario.actors().count(), 3);
    }

    #[test]
    fn actor_on_player_tile_is_rejected() {
        let bad = r#"(
            name: "crowded",
            player: (name: "you", pos: (x: 0, y: 0, z: 0)),
            actors: [Zombie(pos: (x: 0, y: 0, z: 0))],
        )"#;
        assert!(ScenarioLoader::parse(bad).is_err());
    }
}
