use std::collections::HashMap;

use crate::error::{ErrorSeverity, SimError};
use crate::state::Tripoint;

use super::{MapGenerator, Submap};

/// Failure reported by a [`ChunkStore`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("submap {at} is unavailable")]
    Unavailable { at: Tripoint },

    #[error("i/o failure for submap {at}: {reason}")]
    Io { at: Tripoint, reason: String },

    #[error("submap {at} is corrupt: {reason}")]
    Corrupt { at: Tripoint, reason: String },
}

impl StoreError {
    pub fn io(at: Tripoint, reason: impl Into<String>) -> Self {
        Self::Io {
            at,
            reason: reason.into(),
        }
    }

    pub fn corrupt(at: Tripoint, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            at,
            reason: reason.into(),
        }
    }
}

impl SimError for StoreError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "STORE_UNAVAILABLE",
            Self::Io { .. } => "STORE_IO",
            Self::Corrupt { .. } => "STORE_CORRUPT",
        }
    }
}

/// Compact world store that submaps are paged to and from.
///
/// `load` returns the stored submap, or a freshly generated one when the
/// coordinate has never been visited.
pub trait ChunkStore {
    fn load(&mut self, abs_sub: Tripoint) -> Result<Submap, StoreError>;

    fn store(&mut self, abs_sub: Tripoint, submap: Submap) -> Result<(), StoreError>;

    /// Makes previously stored submaps durable.
    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// In-memory store backed by a [`MapGenerator`].
#[derive(Debug, Default)]
pub struct MemoryChunkStore<G> {
    submaps: HashMap<Tripoint, Submap>,
    generator: G,
    generated: usize,
}

impl<G: MapGenerator> MemoryChunkStore<G> {
    pub fn new(generator: G) -> Self {
        Self {
            submaps: HashMap::new(),
            generator,
            generated: 0,
        }
    }

    /// Stores `submap` at `abs_sub` without going through the window.
    pub fn insert(&mut self, abs_sub: Tripoint, submap: Submap) {
        self.submaps.insert(abs_sub, submap);
    }

    pub fn get(&self, abs_sub: Tripoint) -> Option<&Submap> {
        self.submaps.get(&abs_sub)
    }

    pub fn stored(&self) -> usize {
        self.submaps.len()
    }

    /// Number of submaps produced by the generator so far.
    pub fn generated(&self) -> usize {
        self.generated
    }
}

impl<G: MapGenerator> ChunkStore for MemoryChunkStore<G> {
    fn load(&mut self, abs_sub: Tripoint) -> Result<Submap, StoreError> {
        if let Some(submap) = self.submaps.get(&abs_sub) {
            return Ok(submap.clone());
        }
        self.generated += 1;
        Ok(self.generator.generate(abs_sub))
    }

    fn store(&mut self, abs_sub: Tripoint, submap: Submap) -> Result<(), StoreError> {
        self.submaps.insert(abs_sub, submap);
        Ok(())
    }
}
