use crate::registry::Occupant;
use crate::window::Remap;

use super::{Point, Tripoint};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sound {
    /// Window-local origin.
    pub at: Tripoint,
    /// Audible distance in tiles.
    pub volume: u32,
    pub source: Option<Occupant>,
}

/// Sounds made this turn, delivered to listeners at the start of the next
/// movement pass.
#[derive(Clone, Debug, Default)]
pub struct SoundQueue {
    pending: Vec<Sound>,
}

impl SoundQueue {
    pub fn push(&mut self, sound: Sound) {
        self.pending.push(sound);
    }

    pub fn take(&mut self) -> Vec<Sound> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl Remap for SoundQueue {
    fn remap(&mut self, offset: Point) {
        for sound in &mut self.pending {
            sound.at = sound.at + offset;
        }
    }
}
