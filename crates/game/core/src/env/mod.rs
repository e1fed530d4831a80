//! Collaborators the turn pipeline talks to.
//!
//! Storage, the surrounding game systems and player input are reached through
//! traits so the core stays deterministic and testable. [`SimEnv`] bundles
//! one of each for a call to [`crate::engine::do_turn`].
mod hooks;
mod input;
mod map;
mod store;

pub use hooks::{NoopHooks, WorldHooks};
pub use input::{IdleInput, PlayerAction, PlayerInput};
pub use map::{FlatGenerator, MapGenerator, Submap, TerrainFlags, TerrainKind};
pub use store::{ChunkStore, MemoryChunkStore, StoreError};

/// Borrowed collaborators for one call into the scheduler.
pub struct SimEnv<'a> {
    pub chunks: &'a mut dyn ChunkStore,
    pub hooks: &'a mut dyn WorldHooks,
    pub input: &'a mut dyn PlayerInput,
}

impl<'a> SimEnv<'a> {
    pub fn new(
        chunks: &'a mut dyn ChunkStore,
        hooks: &'a mut dyn WorldHooks,
        input: &'a mut dyn PlayerInput,
    ) -> Self {
        Self {
            chunks,
            hooks,
            input,
        }
    }
}
