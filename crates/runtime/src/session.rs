//! A headless play session: world, storage, hooks and input wired together.
use std::path::Path;

use sim_content::{ContentFactory, ScenarioSpec};
use sim_core::{
    Placement, PlayerInput, QuitReason, SimConfig, SimEnv, Tick, WorldState, do_turn,
};

use crate::digest::state_digest;
use crate::error::{Result, RuntimeError};
use crate::generator::TerrainGenerator;
use crate::hooks::{SessionHooks, SessionStats};
use crate::store::FileChunkStore;

/// What a finished (or stopped) run reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    pub turns_run: u64,
    pub final_turn: Tick,
    pub reason: QuitReason,
    pub stats: SessionStats,
    pub deferred: usize,
    pub digest: String,
}

pub struct Session {
    world: WorldState,
    store: FileChunkStore<TerrainGenerator>,
    hooks: SessionHooks,
    input: Box<dyn PlayerInput>,
    finished: bool,
}

impl Session {
    /// Builds a world for `scenario` with maps and saves under `save_dir`.
    pub fn new(
        config: SimConfig,
        scenario: &ScenarioSpec,
        save_dir: &Path,
        input: Box<dyn PlayerInput>,
    ) -> Result<Self> {
        let mut store = FileChunkStore::new(save_dir.join("maps"), TerrainGenerator::new(config.seed))?;
        let hooks = SessionHooks::new(config.seed, Some(save_dir.to_path_buf()));
        let mut world = WorldState::new(config, scenario.player.build(), &mut store)?;

        let mut deferred = 0;
        for (abs, creature) in scenario.actors() {
            if world.add_actor(abs, creature) == Placement::Deferred {
                deferred += 1;
            }
        }
        tracing::info!(
            scenario = %scenario.name,
            active = world.registry.len(),
            deferred,
            "session started"
        );
        Ok(Self {
            world,
            store,
            hooks,
            input,
            finished: false,
        })
    }

    /// Loads `config.toml` and `scenarios/{scenario}.ron` from `data_dir`.
    pub fn from_content(
        data_dir: &Path,
        scenario: &str,
        save_dir: &Path,
        input: Box<dyn PlayerInput>,
    ) -> Result<Self> {
        let factory = ContentFactory::new(data_dir);
        let config = factory
            .load_config()
            .map_err(|e| RuntimeError::Content(format!("{e:#}")))?;
        let scenario = factory
            .load_scenario(scenario)
            .map_err(|e| RuntimeError::Content(format!("{e:#}")))?;
        Self::new(config, &scenario, save_dir, input)
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn stats(&self) -> SessionStats {
        self.hooks.stats()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Runs one turn. Returns `true` once the session has ended.
    pub fn run_turn(&mut self) -> bool {
        if self.finished {
            return true;
        }
        let mut env = SimEnv::new(&mut self.store, &mut self.hooks, self.input.as_mut());
        self.finished = do_turn(&mut self.world, &mut env);
        self.finished
    }

    /// Runs until the session ends or `max_turns` have passed, then saves.
    pub fn run(&mut self, max_turns: u64) -> Result<SessionSummary> {
        let mut turns_run = 0;
        while turns_run < max_turns && !self.run_turn() {
            turns_run += 1;
        }
        self.finish();
        self.summary(turns_run)
    }

    /// Ends the session with a save if it is still running.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        if self.world.quit == QuitReason::None {
            self.world.quit = QuitReason::SaveAndQuit;
        }
        self.run_turn();
    }

    pub fn digest(&self) -> Result<String> {
        state_digest(&self.world)
    }

    fn summary(&self, turns_run: u64) -> Result<SessionSummary> {
        Ok(SessionSummary {
            turns_run,
            final_turn: self.world.now(),
            reason: self.world.quit,
            stats: self.hooks.stats(),
            deferred: self.world.overmap.deferred_len(),
            digest: self.digest()?,
        })
    }
}
