//! Global turn counter and the periodic-event predicate built on it.
use super::Tick;

/// Span of game time measured in turns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeDuration(u64);

impl TimeDuration {
    pub const TURN: Self = Self(1);
    pub const MINUTE: Self = Self(60);
    pub const HOUR: Self = Self(60 * 60);
    pub const DAY: Self = Self(24 * 60 * 60);

    pub const fn from_turns(turns: u64) -> Self {
        Self(turns)
    }

    pub const fn from_seconds(seconds: u64) -> Self {
        Self(seconds)
    }

    pub const fn from_minutes(minutes: u64) -> Self {
        Self(minutes * 60)
    }

    pub const fn turns(self) -> u64 {
        self.0
    }
}

/// Monotonic turn clock owned by the world state.
///
/// Only the turn scheduler advances it; everything else reads it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnClock {
    turn: Tick,
}

impl TurnClock {
    pub const fn new(start: Tick) -> Self {
        Self { turn: start }
    }

    pub const fn turn(&self) -> Tick {
        self.turn
    }

    pub(crate) fn advance(&mut self) {
        self.turn = self.turn + 1;
    }

    pub const fn seconds(&self) -> u64 {
        self.turn.0
    }

    pub const fn minutes(&self) -> u64 {
        self.turn.0 / TimeDuration::MINUTE.0
    }

    pub const fn hours(&self) -> u64 {
        self.turn.0 / TimeDuration::HOUR.0
    }

    pub const fn days(&self) -> u64 {
        self.turn.0 / TimeDuration::DAY.0
    }

    /// True on turns that are an exact multiple of `period`.
    ///
    /// A zero period never fires.
    pub const fn once_every(&self, period: TimeDuration) -> bool {
        period.0 != 0 && self.turn.0 % period.0 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn once_every_is_phase_locked() {
        let mut clock = TurnClock::new(Tick(0));
        let mut fired = Vec::new();
        for _ in 0..30 {
            clock.advance();
            if clock.once_every(TimeDuration::from_seconds(10)) {
                fired.push(clock.turn().0);
            }
        }
        assert_eq!(fired, vec![10, 20, 30]);
    }

    #[test]
    fn zero_period_never_fires() {
        let clock = TurnClock::new(Tick(0));
        assert!(!clock.once_every(TimeDuration::from_turns(0)));
    }

    #[test]
    fn derived_units() {
        let clock = TurnClock::new(Tick(TimeDuration::DAY.turns() + 3 * 3600 + 125));
        assert_eq!(clock.days(), 1);
        assert_eq!(clock.hours(), 27);
        assert_eq!(clock.minutes(), 27 * 60 + 2);
    }
}
