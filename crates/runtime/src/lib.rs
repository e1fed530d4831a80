//! Headless runtime for the survival simulation.
//!
//! Wires [`sim_core`] to concrete collaborators: a seeded terrain generator,
//! a file-backed submap store, session hooks that resolve combat and write
//! JSON saves, and scripted or random player input.
pub mod digest;
pub mod error;
pub mod generator;
pub mod hooks;
pub mod input;
pub mod session;
pub mod store;

pub use digest::state_digest;
pub use error::{Result, RuntimeError};
pub use generator::TerrainGenerator;
pub use hooks::{SessionHooks, SessionStats};
pub use input::{RandomWalk, ScriptedInput};
pub use session::{Session, SessionSummary};
pub use store::{FileChunkStore, default_save_dir};
