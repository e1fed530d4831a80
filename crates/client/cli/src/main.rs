//! Headless survival-sim runner.
mod config;

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use config::CliConfig;
use directories::ProjectDirs;
use runtime::{RandomWalk, Session, default_save_dir};
use sim_content::{ActorSpec, ContentFactory, ScenarioSpec};
use sim_core::{Faction, NpcAttitude, SimConfig, Tripoint};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = CliConfig::from_env();
    let session_id = config.session_id.clone().unwrap_or_else(|| {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        format!("session_{secs}")
    });
    setup_logging(&session_id)?;

    let save_dir = match &config.save_dir {
        Some(dir) => dir.clone(),
        None => default_save_dir(&session_id)?,
    };
    let (sim, scenario) = load_content(&config)?;
    let seed = sim.seed;
    tracing::info!(seed, scenario = %scenario.name, save_dir = %save_dir.display(), "starting");

    let mut session = Session::new(sim, &scenario, &save_dir, Box::new(RandomWalk::new(seed)))?;
    let summary = session.run(config.turns)?;

    println!("session   {session_id}");
    println!("turns     {} (clock {})", summary.turns_run, summary.final_turn.0);
    println!("ended     {}", summary.reason);
    println!(
        "actors    {} deferred, {} died, {} encounters",
        summary.deferred, summary.stats.deaths, summary.stats.encounters
    );
    println!("digest    {}", summary.digest);
    println!("saved to  {}", save_dir.display());
    Ok(())
}

/// Simulation config and scenario from `SIM_DATA_DIR`, or the built-in
/// scenario when no content directory is set.
fn load_content(config: &CliConfig) -> Result<(SimConfig, ScenarioSpec)> {
    let Some(data_dir) = &config.data_dir else {
        return Ok((config.apply(SimConfig::new()), builtin_scenario()));
    };
    let factory = ContentFactory::new(data_dir);
    let sim = factory.load_config().context("loading config.toml")?;
    let scenario = factory
        .load_scenario(&config.scenario)
        .with_context(|| format!("loading scenario {}", config.scenario))?;
    Ok((config.apply(sim), scenario))
}

fn builtin_scenario() -> ScenarioSpec {
    let mut scenario = ScenarioSpec::empty(CliConfig::DEFAULT_SCENARIO);
    scenario.player.name = "Riley".to_owned();
    scenario.player.pos = Tripoint::new(6, 6, 0);
    scenario.actors = vec![
        ActorSpec::Zombie {
            pos: Tripoint::new(30, 10, 0),
        },
        ActorSpec::Zombie {
            pos: Tripoint::new(-20, 40, 0),
        },
        ActorSpec::Npc {
            name: "Ana".to_owned(),
            faction: Faction::Ally,
            pos: Tripoint::new(8, 8, 0),
            attitude: NpcAttitude::Follow,
        },
        ActorSpec::Monster {
            species: "dog".to_owned(),
            faction: Faction::Wildlife,
            pos: Tripoint::new(-10, 2, 0),
            speed: Some(150),
        },
    ];
    scenario
}

/// Setup logging to a per-session file
fn setup_logging(session_id: &str) -> Result<()> {
    let session_log_dir = log_directory().join(session_id);
    std::fs::create_dir_all(&session_log_dir)?;

    let file_appender = tracing_appender::rolling::never(&session_log_dir, "sim.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    // Leak the guard to keep file writer alive
    std::mem::forget(guard);

    tracing::info!("Logging initialized: session={}", session_id);
    tracing::info!("Log file: {}/sim.log", session_log_dir.display());
    Ok(())
}

/// Get the platform-specific log directory
fn log_directory() -> PathBuf {
    ProjectDirs::from("", "", "survival-sim")
        .map(|dirs| dirs.cache_dir().join("logs"))
        .unwrap_or_else(|| Path::new("/tmp/survival-sim/logs").to_path_buf())
}
