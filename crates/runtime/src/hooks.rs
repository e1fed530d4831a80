//! World systems a headless session simulates around the core turn.
use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use sim_core::state::OvermapBuffer;
use sim_core::{
    Actor, ActorCore, ActorId, Creature, Monster, Player, SpatialWindow, StoreError, TerrainKind,
    Tick, Tripoint, TurnClock, WorldHooks, WorldState,
};

/// Counters a session reports when it ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub attacks: u32,
    pub deaths: u32,
    pub encounters: u32,
    pub emissions: u32,
    pub autosaves: u32,
}

/// Hooks for a headless session: seeded combat and encounters, and JSON
/// saves under `save_dir` when one is configured.
pub struct SessionHooks {
    rng: StdRng,
    save_dir: Option<PathBuf>,
    stats: SessionStats,
}

#[derive(Serialize)]
struct AutosaveRecord<'a> {
    turn: Tick,
    abs_sub: Tripoint,
    player: &'a Player,
    overmap: &'a OvermapBuffer,
}

impl SessionHooks {
    /// Chance out of 100 that a horde tick brings a zombie into the window.
    const ENCOUNTER_CHANCE: u32 = 10;
    const ACTORS_FILE: &'static str = "actors.json";
    const AUTOSAVE_FILE: &'static str = "autosave.json";

    pub fn new(seed: u64, save_dir: Option<PathBuf>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed.rotate_left(17)),
            save_dir,
            stats: SessionStats::default(),
        }
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn save_dir(&self) -> Option<&Path> {
        self.save_dir.as_deref()
    }

    fn write_json<T: Serialize>(&self, file: &str, value: &T, at: Tripoint) -> Result<(), StoreError> {
        let Some(dir) = &self.save_dir else {
            return Ok(());
        };
        let io = |e: std::io::Error| StoreError::io(at, e.to_string());
        fs::create_dir_all(dir).map_err(io)?;
        let path = dir.join(file);
        let temp_path = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(value).map_err(|e| StoreError::io(at, e.to_string()))?;
        fs::write(&temp_path, json).map_err(io)?;
        fs::rename(&temp_path, &path).map_err(io)?;
        tracing::debug!(path = %path.display(), "saved");
        Ok(())
    }
}

impl WorldHooks for SessionHooks {
    fn spawn_encounters(&mut self, clock: &TurnClock, window: &SpatialWindow) -> Vec<Creature> {
        if !self.rng.random_ratio(Self::ENCOUNTER_CHANCE, 100) {
            return Vec::new();
        }
        self.stats.encounters += 1;
        tracing::debug!(turn = clock.turn().0, z = window.z(), "zombie encounter");
        vec![Monster::zombie(Tripoint::new(0, 0, window.z())).into()]
    }

    fn autosave(&mut self, world: &WorldState) -> Result<(), StoreError> {
        let record = AutosaveRecord {
            turn: world.now(),
            abs_sub: world.window.abs_sub(),
            player: world.player(),
            overmap: &world.overmap,
        };
        self.write_json(Self::AUTOSAVE_FILE, &record, record.abs_sub)?;
        self.stats.autosaves += 1;
        Ok(())
    }

    fn emit_field(&mut self, at: Tripoint, terrain: TerrainKind) {
        self.stats.emissions += 1;
        tracing::trace!(%at, ?terrain, "field emitted");
    }

    fn melee_attack(&mut self, attacker: &ActorCore, target: &ActorCore) -> i32 {
        self.stats.attacks += 1;
        let damage = self.rng.random_range(1..=6);
        tracing::debug!(attacker = %attacker.name, target = %target.name, damage, "melee");
        damage
    }

    fn on_death(&mut self, _id: ActorId, creature: &Creature) {
        self.stats.deaths += 1;
        tracing::info!(name = creature.name(), kind = ?creature.kind(), "actor died");
    }

    fn show_epilogue(&mut self, world: &WorldState) {
        tracing::info!(
            turn = world.now().0,
            reason = %world.quit,
            deaths = self.stats.deaths,
            "epilogue"
        );
    }

    fn save_factions_and_actors(&mut self, overmap: &OvermapBuffer) -> Result<(), StoreError> {
        self.write_json(Self::ACTORS_FILE, &overmap.deferred(), Tripoint::ORIGIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::Faction;
    use tempfile::TempDir;

    #[test]
    fn melee_damage_is_seeded() {
        let attacker = ActorCore::new("a", Tripoint::ORIGIN, Faction::Zombie);
        let target = ActorCore::new("b", Tripoint::ORIGIN, Faction::Player);
        let mut first = SessionHooks::new(3, None);
        let mut second = SessionHooks::new(3, None);
        for _ in 0..10 {
            let damage = first.melee_attack(&attacker, &target);
            assert!((1..=6).contains(&damage));
            assert_eq!(damage, second.melee_attack(&attacker, &target));
        }
        assert_eq!(first.stats().attacks, 10);
    }

    #[test]
    fn actors_are_written_as_json() {
        let temp = TempDir::new().unwrap();
        let mut hooks = SessionHooks::new(0, Some(temp.path().to_path_buf()));
        let mut overmap = OvermapBuffer::new();
        overmap.defer(Tripoint::new(30, 2, 0), Monster::zombie(Tripoint::ORIGIN).into());
        hooks.save_factions_and_actors(&overmap).unwrap();

        let text = fs::read_to_string(temp.path().join("actors.json")).unwrap();
        let saved: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(saved.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn without_save_dir_nothing_is_written() {
        let mut hooks = SessionHooks::new(0, None);
        assert!(hooks.save_factions_and_actors(&OvermapBuffer::new()).is_ok());
    }
}
