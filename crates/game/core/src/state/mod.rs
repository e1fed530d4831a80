//! Simulation state owned by a session.
//!
//! [`WorldState`] gathers every component the turn scheduler mutates: the
//! clock, the spatial window, the scent field, the actor registry, the
//! deferred-actor store and the stair queue. It is passed explicitly into
//! each turn step; there is no ambient global state.
mod clock;
mod common;
mod log;
mod overmap;
mod sound;

use rand::SeedableRng;
use rand::rngs::StdRng;

pub use clock::{TimeDuration, TurnClock};
pub use common::{Direction, Point, Tick, Tripoint, line_to, rl_dist, square_dist};
pub use log::{Diagnostic, Diagnostics, Message, MessageKind, MessageLog};
pub use overmap::{DeferredActor, MapNote, OvermapBuffer};
pub use sound::{Sound, SoundQueue};

use crate::actor::{Actor, Creature, Player};
use crate::config::SimConfig;
use crate::env::{ChunkStore, TerrainFlags};
use crate::error::ErrorSeverity;
use crate::registry::{ActorId, ActorRegistry};
use crate::scent::ScentField;
use crate::stairs::StairQueue;
use crate::window::{PagingReport, Remap, SpatialWindow, WindowError};

/// Why the session is ending, if it is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QuitReason {
    #[default]
    None,
    Died,
    Quit,
    SaveAndQuit,
}

/// Where [`WorldState::add_actor`] put a new actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Active(ActorId),
    Deferred,
}

pub struct WorldState {
    pub config: SimConfig,
    pub clock: TurnClock,
    pub window: SpatialWindow,
    pub scent: ScentField,
    pub registry: ActorRegistry,
    pub overmap: OvermapBuffer,
    pub stairs: StairQueue,
    pub sounds: SoundQueue,
    pub log: MessageLog,
    pub diagnostics: Diagnostics,
    pub rng: StdRng,
    /// Set until the first turn has run; the clock does not advance on it.
    pub new_game: bool,
    /// Deferred NPCs should be reloaded at the start of the next turn.
    pub npcs_dirty: bool,
    pub quit: QuitReason,
}

impl WorldState {
    /// Builds a world around `player`, whose position is absolute.
    pub fn new(
        config: SimConfig,
        mut player: Player,
        store: &mut dyn ChunkStore,
    ) -> Result<Self, WindowError> {
        let abs = player.core.pos;
        let (window, report) =
            SpatialWindow::load(config.z_levels, SpatialWindow::origin_for(abs), store)?;
        player.core.pos = window.abs_to_local(abs);

        let mut world = Self {
            scent: ScentField::new(&config),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            clock: TurnClock::default(),
            window,
            registry: ActorRegistry::new(player),
            overmap: OvermapBuffer::new(),
            stairs: StairQueue::default(),
            sounds: SoundQueue::default(),
            log: MessageLog::new(),
            diagnostics: Diagnostics::new(),
            new_game: true,
            npcs_dirty: false,
            quit: QuitReason::None,
        };
        world.record_paging(&report);
        world.annotate_connectors();
        tracing::info!(
            origin = %world.window.abs_sub(),
            mode = %world.config.z_levels,
            "world loaded"
        );
        Ok(world)
    }

    pub fn now(&self) -> Tick {
        self.clock.turn()
    }

    pub fn player(&self) -> &Player {
        self.registry.player()
    }

    pub fn is_game_over(&self) -> bool {
        self.registry.player().core.dead || self.quit != QuitReason::None
    }

    /// Adds an actor at absolute position `abs`.
    ///
    /// An occupied tile moves the actor to the nearest free tile; actors
    /// outside the window or without room nearby are deferred.
    pub fn add_actor(&mut self, abs: Tripoint, mut creature: Creature) -> Placement {
        let local = self.window.abs_to_local(abs);
        if !self.window.contains(local) {
            self.overmap.defer(abs, creature);
            return Placement::Deferred;
        }
        let spot = if self.registry.is_free(local) {
            Some(local)
        } else {
            self.free_tile_near(local, SimConfig::RELOCATION_RADIUS)
        };
        let Some(spot) = spot else {
            self.overmap.defer(abs, creature);
            return Placement::Deferred;
        };
        creature.core_mut().pos = spot;
        match self.registry.insert(creature) {
            Ok(id) => Placement::Active(id),
            Err(err) => {
                self.diagnostics.record_error(self.clock.turn(), &err);
                Placement::Deferred
            }
        }
    }

    /// Moves an active actor into the deferred store.
    pub fn defer(&mut self, id: ActorId) -> bool {
        let Some(creature) = self.registry.remove(id) else {
            return false;
        };
        let abs = self.window.local_to_abs(creature.core().pos);
        tracing::debug!(name = creature.name(), %abs, "actor deferred");
        self.overmap.defer(abs, creature);
        true
    }

    /// Brings back deferred actors matching `filter` whose last position is
    /// inside the window. Returns how many were reactivated.
    pub fn reload_deferred(&mut self, filter: impl Fn(&Creature) -> bool) -> usize {
        let window = &self.window;
        let candidates = self.overmap.take_where(|deferred| {
            filter(&deferred.creature) && window.contains(window.abs_to_local(deferred.abs_pos))
        });
        let mut reloaded = 0;
        for DeferredActor { abs_pos, creature } in candidates {
            if let Placement::Active(_) = self.add_actor(abs_pos, creature) {
                reloaded += 1;
            }
        }
        if reloaded > 0 {
            tracing::debug!(reloaded, "deferred actors reloaded");
        }
        reloaded
    }

    /// Nearest passable, unoccupied tile within `radius` of `center` on the
    /// same level, searching outward ring by ring.
    pub fn free_tile_near(&self, center: Tripoint, radius: i32) -> Option<Tripoint> {
        (1..=radius).find_map(|r| {
            let mut ring = Vec::new();
            for dy in -r..=r {
                for dx in -r..=r {
                    if dx.abs() == r || dy.abs() == r {
                        ring.push(center + Point::new(dx, dy));
                    }
                }
            }
            ring.into_iter()
                .filter(|&p| self.window.is_passable(p) && self.registry.is_free(p))
                .min_by_key(|&p| (square_dist(center, p), p.y, p.x))
        })
    }

    /// Shifts the window by `shift` submaps and re-addresses every subsystem
    /// holding window-local coordinates.
    pub fn shift(&mut self, shift: Point, store: &mut dyn ChunkStore) -> PagingReport {
        let report = self.window.shift(shift, store, self.clock.turn());
        if shift.is_zero() {
            return report;
        }
        let offset = SpatialWindow::remap_offset(shift);
        let targets: [&mut dyn Remap; 3] = [&mut self.registry, &mut self.scent, &mut self.sounds];
        for target in targets {
            target.remap(offset);
        }
        self.record_paging(&report);
        report
    }

    /// Active, deferred and queued actors that are still alive.
    pub fn population(&self) -> usize {
        let active = self
            .registry
            .iter()
            .filter(|(_, creature)| !creature.is_dead())
            .count();
        active + self.overmap.deferred_len() + self.stairs.len()
    }

    /// Turns paging failures into diagnostics and player-visible notices.
    pub fn record_paging(&mut self, report: &PagingReport) {
        let now = self.clock.turn();
        for err in &report.load_failures {
            self.diagnostics.record(
                now,
                ErrorSeverity::Internal,
                Diagnostics::SUBMAP_LOAD_FAILED,
                format!("{err}; replaced by a blank submap"),
            );
        }
        for err in &report.store_failures {
            self.diagnostics.record(
                now,
                ErrorSeverity::Recoverable,
                Diagnostics::SUBMAP_STORE_FAILED,
                err.to_string(),
            );
            self.log
                .add(now, MessageKind::Bad, format!("Failed to save part of the map: {err}"));
        }
    }

    /// Adds "AUTO: goes up/down" notes for overmap tiles of the current
    /// level that hold a staircase and have not been seen before.
    pub fn annotate_connectors(&mut self) -> usize {
        let z = self.window.z();
        let mut found: Vec<(Tripoint, &'static str)> = Vec::new();
        for (p, flags) in self.window.level_flags(z) {
            let label = if flags.contains(TerrainFlags::GOES_DOWN) {
                "AUTO: goes down"
            } else if flags.contains(TerrainFlags::GOES_UP) {
                "AUTO: goes up"
            } else {
                continue;
            };
            let omt = OvermapBuffer::omt_of(self.window.abs_sub_of(Tripoint::new(p.x, p.y, z)));
            if !found.iter().any(|(seen, _)| *seen == omt) {
                found.push((omt, label));
            }
        }
        let mut added = 0;
        for (omt, label) in found {
            if self.overmap.mark_seen(omt) && self.overmap.add_note_if_absent(omt, label) {
                added += 1;
            }
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{Faction, Monster, Npc};
    use crate::env::{FlatGenerator, MemoryChunkStore, TerrainKind};

    fn world() -> (WorldState, MemoryChunkStore<FlatGenerator>) {
        let mut store = MemoryChunkStore::new(FlatGenerator);
        let player = Player::new("you", Tripoint::new(6, 6, 0));
        let world = WorldState::new(SimConfig::new(), player, &mut store).unwrap();
        (world, store)
    }

    #[test]
    fn player_starts_in_central_submap() {
        let (world, _) = world();
        let pos = world.player().core.pos;
        assert_eq!(SpatialWindow::shift_for(pos.xy()), Point::ZERO);
        assert_eq!(world.window.local_to_abs(pos), Tripoint::new(6, 6, 0));
    }

    #[test]
    fn add_actor_defers_outside_window() {
        let (mut world, _) = world();
        let far = world.add_actor(Tripoint::new(500, 0, 0), Monster::zombie(Tripoint::ORIGIN).into());
        assert_eq!(far, Placement::Deferred);
        let near = world.add_actor(Tripoint::new(8, 8, 0), Monster::zombie(Tripoint::ORIGIN).into());
        assert!(matches!(near, Placement::Active(_)));
        let crowded = world.add_actor(Tripoint::new(8, 8, 0), Monster::zombie(Tripoint::ORIGIN).into());
        assert!(matches!(crowded, Placement::Active(_)));
        assert_eq!(world.population(), 3);
    }

    #[test]
    fn defer_and_reload_roundtrip() {
        let (mut world, _) = world();
        let npc = Npc::new("Ana", Tripoint::ORIGIN, Faction::Ally);
        let Placement::Active(id) = world.add_actor(Tripoint::new(9, 9, 0), npc.into()) else {
            panic!("npc should be active");
        };
        assert!(world.defer(id));
        assert_eq!(world.registry.len(), 0);
        assert_eq!(world.overmap.deferred()[0].abs_pos, Tripoint::new(9, 9, 0));
        assert_eq!(world.reload_deferred(Creature::is_npc), 1);
        assert_eq!(world.overmap.deferred_len(), 0);
    }

    #[test]
    fn free_tile_prefers_nearest_ring() {
        let (mut world, _) = world();
        let center = Tripoint::new(66, 66, 0);
        for p in center.neighbors() {
            world.window.set_terrain(p, TerrainKind::Wall);
        }
        let found = world.free_tile_near(center, 3).unwrap();
        assert_eq!(rl_dist(center, found), 2);
        world.window.set_terrain(Tripoint::new(66, 67, 0), TerrainKind::Floor);
        assert_eq!(world.free_tile_near(center, 3), Some(Tripoint::new(66, 67, 0)));
    }

    #[test]
    fn shift_remaps_actors_and_scent() {
        let (mut world, mut store) = world();
        let id = match world.add_actor(Tripoint::new(10, 6, 0), Monster::zombie(Tripoint::ORIGIN).into()) {
            Placement::Active(id) => id,
            other => panic!("unexpected {other:?}"),
        };
        let before = world.registry.get(id).unwrap().core().pos;
        world.scent.set(before.xy(), 42);
        world.shift(Point::new(1, 0), &mut store);
        let after = world.registry.get(id).unwrap().core().pos;
        assert_eq!(after, before + Point::new(-12, 0));
        assert_eq!(world.scent.get(after.xy()), 42);
        assert_eq!(world.window.local_to_abs(after), Tripoint::new(10, 6, 0));
    }
}
