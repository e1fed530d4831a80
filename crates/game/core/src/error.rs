//! Common error infrastructure for sim-core.
//!
//! Domain errors (`WindowError`, `StoreError`, `RegistryError`) live next to
//! the component that raises them. This module holds what they share: a
//! severity classification and the [`SimError`] trait.
//!
//! Conditions that must not abort the turn (stuck AI, scent overflow, actors
//! stranded on impassable tiles) are not returned as errors. They are
//! recorded as [`crate::state::Diagnostic`]s instead.

/// Severity level of an error or diagnostic.
///
/// - **Recoverable**: temporary conditions, the turn continues
/// - **Validation**: rejected input, nothing was mutated
/// - **Internal**: state inconsistency that was repaired in place
/// - **Fatal**: the simulation cannot continue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error.
    ///
    /// Examples: destination occupied, submap store write failed
    Recoverable,

    /// Validation error - invalid request, should not retry without changes.
    ///
    /// Examples: z-level out of range, no staircase under the player
    Validation,

    /// Internal error - unexpected state inconsistency.
    ///
    /// Examples: actor on an impassable tile, scent above ceiling, AI dead-lock
    Internal,

    /// Fatal error - world state cannot be trusted any more.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all sim-core errors.
///
/// - All error enums implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait SimError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
