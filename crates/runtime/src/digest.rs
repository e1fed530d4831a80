//! Content hash of a world, for comparing runs.
use serde::Serialize;
use sha2::{Digest, Sha256};
use sim_core::state::DeferredActor;
use sim_core::{Actor, Creature, Player, Tick, Tripoint, WorldState};

use crate::error::{Result, RuntimeError};

#[derive(Serialize)]
struct Snapshot<'a> {
    turn: Tick,
    abs_sub: Tripoint,
    player: &'a Player,
    actors: Vec<(Tripoint, &'a Creature)>,
    scent: &'a [i32],
    deferred: &'a [DeferredActor],
}

/// SHA-256 over the clock, window origin, actors, scent and deferred store,
/// hex encoded. Two runs with the same seed and inputs have equal digests.
pub fn state_digest(world: &WorldState) -> Result<String> {
    let snapshot = Snapshot {
        turn: world.now(),
        abs_sub: world.window.abs_sub(),
        player: world.player(),
        actors: world
            .registry
            .iter()
            .map(|(_, creature)| (world.window.local_to_abs(creature.core().pos), creature))
            .collect(),
        scent: world.scent.values(),
        deferred: world.overmap.deferred(),
    };
    let bytes =
        bincode::serialize(&snapshot).map_err(|e| RuntimeError::Serialization(e.to_string()))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
