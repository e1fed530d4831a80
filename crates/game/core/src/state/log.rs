//! Player-visible message log and the internal diagnostics ring.
use std::collections::VecDeque;

use crate::config::SimConfig;
use crate::error::{ErrorSeverity, SimError};

use super::Tick;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageKind {
    Info,
    Good,
    Bad,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    pub turn: Tick,
    pub kind: MessageKind,
    pub text: String,
}

/// Bounded log of messages shown to the player, oldest first.
#[derive(Clone, Debug, Default)]
pub struct MessageLog {
    entries: VecDeque<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, turn: Tick, kind: MessageKind, text: impl Into<String>) {
        if self.entries.len() == SimConfig::MAX_MESSAGES {
            self.entries.pop_front();
        }
        let text = text.into();
        tracing::debug!(turn = turn.0, %kind, "{text}");
        self.entries.push_back(Message { turn, kind, text });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if any retained message contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.entries.iter().any(|m| m.text.contains(needle))
    }
}

/// Internal condition recorded without aborting the turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub turn: Tick,
    pub severity: ErrorSeverity,
    pub code: &'static str,
    pub message: String,
}

/// Bounded ring of diagnostics, mirrored to `tracing`.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    entries: VecDeque<Diagnostic>,
    total: u64,
}

impl Diagnostics {
    pub const STUCK_AI: &'static str = "STUCK_AI";
    pub const SCENT_OVERFLOW: &'static str = "SCENT_OVERFLOW";
    pub const INVALID_POSITION: &'static str = "INVALID_POSITION";
    pub const PLAYER_IDLE_LOOP: &'static str = "PLAYER_IDLE_LOOP";
    pub const STAIR_QUEUE_DROPPED: &'static str = "STAIR_QUEUE_DROPPED";
    pub const SUBMAP_LOAD_FAILED: &'static str = "SUBMAP_LOAD_FAILED";
    pub const SUBMAP_STORE_FAILED: &'static str = "SUBMAP_STORE_FAILED";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        turn: Tick,
        severity: ErrorSeverity,
        code: &'static str,
        message: impl Into<String>,
    ) {
        let message = message.into();
        if severity.is_internal() {
            tracing::error!(turn = turn.0, code, severity = severity.as_str(), "{message}");
        } else {
            tracing::warn!(turn = turn.0, code, severity = severity.as_str(), "{message}");
        }
        if self.entries.len() == SimConfig::MAX_DIAGNOSTICS {
            self.entries.pop_front();
        }
        self.total += 1;
        self.entries.push_back(Diagnostic {
            turn,
            severity,
            code,
            message,
        });
    }

    /// Records a [`SimError`] under its own code and severity.
    pub fn record_error(&mut self, turn: Tick, error: &dyn SimError) {
        self.record(turn, error.severity(), error.error_code(), error.to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.iter().any(|d| d.code == code)
    }

    pub fn count(&self, code: &str) -> usize {
        self.entries.iter().filter(|d| d.code == code).count()
    }

    /// Diagnostics recorded since creation, including evicted ones.
    pub fn total(&self) -> u64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_ring_is_bounded() {
        let mut diags = Diagnostics::new();
        for i in 0..(SimConfig::MAX_DIAGNOSTICS + 10) {
            diags.record(Tick(i as u64), ErrorSeverity::Internal, Diagnostics::STUCK_AI, "stuck");
        }
        assert_eq!(diags.iter().count(), SimConfig::MAX_DIAGNOSTICS);
        assert_eq!(diags.total(), (SimConfig::MAX_DIAGNOSTICS + 10) as u64);
        assert_eq!(diags.iter().next().map(|d| d.turn), Some(Tick(10)));
    }

    #[test]
    fn message_log_drops_oldest() {
        let mut log = MessageLog::new();
        for i in 0..(SimConfig::MAX_MESSAGES + 1) {
            log.add(Tick(0), MessageKind::Info, format!("m{i}"));
        }
        assert_eq!(log.len(), SimConfig::MAX_MESSAGES);
        assert_eq!(log.iter().next().map(|m| m.text.as_str()), Some("m1"));
        assert_eq!(log.last().map(|m| m.text.as_str()), Some("m128"));
    }
}
