use crate::actor::{ActorCore, Creature, Player};
use crate::registry::ActorId;
use crate::state::{OvermapBuffer, Tripoint, TurnClock, WorldState};
use crate::window::SpatialWindow;

use super::{StoreError, TerrainKind};

/// Callbacks into the subsystems surrounding the turn pipeline.
///
/// The scheduler calls these at fixed points of `do_turn`; every method has
/// a no-op default so embedders implement only what they simulate.
pub trait WorldHooks {
    fn render(&mut self, _world: &WorldState) {}

    /// Game-mode specific per-turn logic. Not called on the first turn.
    fn game_mode_per_turn(&mut self, _clock: &TurnClock) {}

    fn process_missions(&mut self, _clock: &TurnClock) {}

    /// Daily monster-group bookkeeping on the overmap.
    fn process_monster_groups(&mut self, _clock: &TurnClock) {}

    fn move_hordes(&mut self, _clock: &TurnClock) {}

    /// Creatures to spawn near the player. Their positions are ignored; the
    /// scheduler picks a free tile the player cannot see.
    fn spawn_encounters(&mut self, _clock: &TurnClock, _window: &SpatialWindow) -> Vec<Creature> {
        Vec::new()
    }

    fn autosave(&mut self, _world: &WorldState) -> Result<(), StoreError> {
        Ok(())
    }

    fn update_weather(&mut self, _clock: &TurnClock) {}

    fn build_floor_caches(&mut self, _window: &SpatialWindow) {}

    fn process_falling(&mut self, _window: &SpatialWindow) {}

    fn vehicle_move(&mut self, _window: &SpatialWindow) {}

    fn process_fields(&mut self, _window: &SpatialWindow) {}

    fn process_items(&mut self, _window: &SpatialWindow) {}

    /// A tile flagged `EMITS` releases its field. `at` is window-local.
    fn emit_field(&mut self, _at: Tripoint, _terrain: TerrainKind) {}

    /// Field effects on an actor standing in them.
    fn creature_in_field(&mut self, _actor: Option<ActorId>, _core: &mut ActorCore) {}

    /// Resolves a melee attack and returns the damage dealt.
    fn melee_attack(&mut self, _attacker: &ActorCore, _target: &ActorCore) -> i32 {
        0
    }

    /// Once-a-day processing for an active creature (reproduction, biosignature).
    fn creature_daily_cycle(&mut self, _id: ActorId, _creature: &mut Creature) {}

    fn update_morale(&mut self, _player: &mut Player) {}

    fn on_death(&mut self, _id: ActorId, _creature: &Creature) {}

    fn show_epilogue(&mut self, _world: &WorldState) {}

    /// Persists faction state and the deferred actor store.
    fn save_factions_and_actors(&mut self, _overmap: &OvermapBuffer) -> Result<(), StoreError> {
        Ok(())
    }

    /// Called after the window has written every loaded submap to the store.
    fn save_maps(&mut self, _window: &SpatialWindow) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Hooks that do nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHooks;

impl WorldHooks for NoopHooks {}
