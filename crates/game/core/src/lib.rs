//! Deterministic turn pipeline for a survival simulation.
//!
//! `sim-core` owns the rules of a single game turn: the clock, scent
//! diffusion, the paged spatial window around the player, the actor registry
//! with its deferred store, the stair queue and the movement scheduler.
//! Everything outside those rules (submap storage, combat resolution, weather,
//! player input) is reached through the collaborator traits in [`env`].
//! A session calls [`engine::do_turn`] once per turn with a [`WorldState`]
//! and a [`SimEnv`].
pub mod actor;
pub mod ai;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod registry;
pub mod scent;
pub mod stairs;
pub mod state;
pub mod window;

pub use actor::{
    Activity, ActivityKind, Actor, ActorCore, ActorKind, Creature, Distraction, Effects, Faction,
    Intent, Monster, Npc, NpcAttitude, Player, PlayerFlags,
};
pub use config::{SimConfig, ZLevelMode};
pub use engine::{cleanup_at_end, do_turn};
pub use env::{
    ChunkStore, FlatGenerator, IdleInput, MapGenerator, MemoryChunkStore, NoopHooks,
    PlayerAction, PlayerInput, SimEnv, StoreError, Submap, TerrainFlags, TerrainKind, WorldHooks,
};
pub use error::{ErrorSeverity, SimError};
pub use registry::{ActorId, ActorRegistry, Occupant, RegistryError};
pub use scent::ScentField;
pub use stairs::{StairEntry, StairQueue};
pub use state::{
    Direction, Placement, Point, QuitReason, Tick, TimeDuration, Tripoint, TurnClock, WorldState,
};
pub use window::{SpatialWindow, VerticalDirection, WindowError};
