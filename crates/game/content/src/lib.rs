//! Data-driven content for the simulation.
//!
//! This crate turns data files into the values the core consumes:
//! - Simulation tuning (`SimConfig`) from TOML
//! - Scenarios (player start and initial actors) from RON
//!
//! Content never appears in world state directly; a session builds its
//! `WorldState` from what these loaders return.

pub mod scenario;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use scenario::{ActorSpec, PlayerSpec, ScenarioSpec};

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, ContentFactory, LoadResult, ScenarioLoader};
