//! Actors following the player across a staircase.
//!
//! When the player changes level in a flat window, hostiles chasing them
//! leave the registry and wait here with a countdown. The queue is anchored
//! to the absolute submap the player arrived at, so it needs no re-addressing
//! when the window shifts.
use crate::actor::Creature;
use crate::state::Tripoint;
use crate::window::VerticalDirection;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StairEntry {
    pub creature: Creature,
    /// Arrives once this drops to zero.
    pub countdown: i32,
    pub from_z: i32,
    /// Direction of travel, the same the player took.
    pub direction: VerticalDirection,
    /// Absolute tile the actor left from.
    pub origin: Tripoint,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StairQueue {
    entries: Vec<StairEntry>,
    /// Absolute window origin (submap) and level where the queue arrives.
    anchor: Option<Tripoint>,
}

impl StairQueue {
    pub fn anchor(&self) -> Option<Tripoint> {
        self.anchor
    }

    pub fn set_anchor(&mut self, anchor: Tripoint) {
        self.anchor = Some(anchor);
    }

    pub fn push(&mut self, entry: StairEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[StairEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True while the window origin `abs_sub` is within one submap of the
    /// anchor on the anchor's level.
    pub fn is_near(&self, abs_sub: Tripoint) -> bool {
        self.anchor.is_some_and(|anchor| {
            anchor.z == abs_sub.z && (anchor.x - abs_sub.x).abs() <= 1 && (anchor.y - abs_sub.y).abs() <= 1
        })
    }

    /// Removes every entry and clears the anchor.
    pub fn drain(&mut self) -> Vec<StairEntry> {
        self.anchor = None;
        std::mem::take(&mut self.entries)
    }

    /// Puts back entries still waiting; the anchor is cleared once the queue
    /// is empty.
    pub(crate) fn restore(&mut self, anchor: Option<Tripoint>, entries: Vec<StairEntry>) {
        self.entries = entries;
        self.anchor = if self.entries.is_empty() { None } else { anchor };
    }
}
