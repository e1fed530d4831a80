//! Headless run configuration read from the environment.
use std::env;
use std::path::PathBuf;

use sim_core::{SimConfig, ZLevelMode};

#[derive(Clone, Debug)]
pub struct CliConfig {
    pub seed: Option<u64>,
    pub turns: u64,
    pub z_levels: Option<ZLevelMode>,
    pub autosave_turns: Option<u64>,
    pub session_id: Option<String>,
    /// Directory holding `config.toml` and `scenarios/`.
    pub data_dir: Option<PathBuf>,
    pub scenario: String,
    pub save_dir: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            seed: None,
            turns: Self::DEFAULT_TURNS,
            z_levels: None,
            autosave_turns: None,
            session_id: None,
            data_dir: None,
            scenario: Self::DEFAULT_SCENARIO.to_owned(),
            save_dir: None,
        }
    }
}

impl CliConfig {
    pub const DEFAULT_TURNS: u64 = 500;
    pub const DEFAULT_SCENARIO: &'static str = "outskirts";

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SIM_SEED` - World seed (default: from `config.toml`)
    /// - `SIM_TURNS` - Turns to run before saving (default: 500)
    /// - `SIM_Z_LEVELS` - `flat` or `stacked`
    /// - `SIM_AUTOSAVE_TURNS` - Turns between autosaves (default: never)
    /// - `SIM_SESSION_ID` - Session identifier for logs and saves
    /// - `SIM_DATA_DIR` - Content directory (default: built-in scenario)
    /// - `SIM_SCENARIO` - Scenario name under `scenarios/`
    /// - `SIM_SAVE_DIR` - Save directory (default: platform-specific)
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.seed = read_env("SIM_SEED");
        if let Some(turns) = read_env::<u64>("SIM_TURNS") {
            config.turns = turns.max(1);
        }
        config.z_levels = read_env("SIM_Z_LEVELS");
        config.autosave_turns = read_env::<u64>("SIM_AUTOSAVE_TURNS").filter(|&t| t > 0);
        config.session_id = env::var("SIM_SESSION_ID").ok();
        config.data_dir = env::var("SIM_DATA_DIR").ok().map(PathBuf::from);
        if let Ok(scenario) = env::var("SIM_SCENARIO") {
            config.scenario = scenario;
        }
        config.save_dir = env::var("SIM_SAVE_DIR").ok().map(PathBuf::from);
        config
    }

    /// Applies the environment overrides to a loaded simulation config.
    pub fn apply(&self, mut sim: SimConfig) -> SimConfig {
        if let Some(seed) = self.seed {
            sim = sim.with_seed(seed);
        }
        if let Some(mode) = self.z_levels {
            sim = sim.with_z_levels(mode);
        }
        if self.autosave_turns.is_some() {
            sim = sim.with_autosave_turns(self.autosave_turns);
        }
        sim
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
