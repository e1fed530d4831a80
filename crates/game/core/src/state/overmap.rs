use std::collections::BTreeSet;

use crate::actor::{Actor, ActorKind, Creature};

use super::Tripoint;

/// An actor held outside the window, with its absolute tile position.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeferredActor {
    pub abs_pos: Tripoint,
    pub creature: Creature,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapNote {
    /// Absolute overmap-terrain coordinate.
    pub at: Tripoint,
    pub text: String,
}

/// Compact world store for everything outside the window: deferred actors,
/// map notes and explored overmap tiles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OvermapBuffer {
    deferred: Vec<DeferredActor>,
    notes: Vec<MapNote>,
    seen: BTreeSet<Tripoint>,
}

impl OvermapBuffer {
    /// Submaps per overmap-terrain tile side.
    pub const SUBMAPS_PER_OMT: i32 = 2;

    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of an actor leaving the window. Its planning memory
    /// is dropped because it refers to window-local state.
    pub fn defer(&mut self, abs_pos: Tripoint, mut creature: Creature) {
        *creature.memory_mut() = Default::default();
        self.deferred.push(DeferredActor { abs_pos, creature });
    }

    /// Removes and returns every deferred actor matching `predicate`.
    pub fn take_where(
        &mut self,
        mut predicate: impl FnMut(&DeferredActor) -> bool,
    ) -> Vec<DeferredActor> {
        let (taken, kept) = std::mem::take(&mut self.deferred)
            .into_iter()
            .partition(|actor| predicate(actor));
        self.deferred = kept;
        taken
    }

    pub fn deferred(&self) -> &[DeferredActor] {
        &self.deferred
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    pub fn count_kind(&self, kind: ActorKind) -> usize {
        self.deferred
            .iter()
            .filter(|d| d.creature.kind() == kind)
            .count()
    }

    /// Overmap-terrain tile containing absolute submap `abs_sub`.
    pub fn omt_of(abs_sub: Tripoint) -> Tripoint {
        Tripoint::new(
            abs_sub.x.div_euclid(Self::SUBMAPS_PER_OMT),
            abs_sub.y.div_euclid(Self::SUBMAPS_PER_OMT),
            abs_sub.z,
        )
    }

    /// Marks an overmap tile seen; returns true the first time.
    pub fn mark_seen(&mut self, omt: Tripoint) -> bool {
        self.seen.insert(omt)
    }

    pub fn is_seen(&self, omt: Tripoint) -> bool {
        self.seen.contains(&omt)
    }

    pub fn note(&self, omt: Tripoint) -> Option<&str> {
        self.notes
            .iter()
            .find(|n| n.at == omt)
            .map(|n| n.text.as_str())
    }

    /// Adds a note unless the tile already has one.
    pub fn add_note_if_absent(&mut self, omt: Tripoint, text: impl Into<String>) -> bool {
        if self.note(omt).is_some() {
            return false;
        }
        self.notes.push(MapNote {
            at: omt,
            text: text.into(),
        });
        true
    }

    pub fn notes(&self) -> &[MapNote] {
        &self.notes
    }
}
