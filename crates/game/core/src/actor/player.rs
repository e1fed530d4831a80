use bitflags::bitflags;
use rand::rngs::StdRng;

use crate::ai::PlanView;
use crate::state::Tripoint;

use super::{Actor, ActorCore, ActorKind, Faction, Intent};

bitflags! {
    /// Player-only traits and installed bionics.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct PlayerFlags: u8 {
        /// Leaves no scent trail.
        const SCENT_MASK   = 1 << 0;
        /// Warns about hostiles moving nearby, draining power.
        const MOTION_ALARM = 1 << 1;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActivityKind {
    #[strum(serialize = "reading")]
    Read,
    #[strum(serialize = "crafting")]
    Craft,
    #[strum(serialize = "resting")]
    Rest,
    #[strum(serialize = "butchering")]
    Butcher,
    #[strum(serialize = "digging")]
    Dig,
}

/// Why an activity might be interrupted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Distraction {
    #[strum(serialize = "a hostile comes into view")]
    HostileSpotted,
    #[strum(serialize = "your motion alarm goes off")]
    MotionAlarm,
    #[strum(serialize = "you feel tired")]
    Tired,
}

/// Long-running player action that consumes move points over several turns.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Activity {
    pub kind: ActivityKind,
    pub moves_left: i32,
    pub interruptible: bool,
    /// Distractions the player already chose to ignore for this activity.
    pub ignored: Vec<Distraction>,
}

impl Activity {
    pub fn new(kind: ActivityKind, moves_left: i32) -> Self {
        Self {
            kind,
            moves_left,
            interruptible: true,
            ignored: Vec::new(),
        }
    }

    #[must_use]
    pub fn uninterruptible(mut self) -> Self {
        self.interruptible = false;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Player {
    pub core: ActorCore,
    /// Strength of the scent the player leaves behind.
    pub scent: i32,
    pub activity: Option<Activity>,
    /// Bionic power units.
    pub power: i32,
    /// Percent chance to sidestep something shoving onto the player's tile.
    pub dodge: u32,
    pub flags: PlayerFlags,
    pub hunger: i32,
    pub thirst: i32,
    pub fatigue: i32,
    /// Noise made this turn; reset at end of turn.
    pub volume: u32,
}

impl Player {
    pub const DEFAULT_SCENT: i32 = 500;
    pub const DEFAULT_DODGE: u32 = 10;
    /// Fatigue at which the player starts feeling tired.
    pub const TIRED: i32 = 192;

    pub fn new(name: impl Into<String>, pos: Tripoint) -> Self {
        let mut core = ActorCore::new(name, pos, Faction::Player).with_hp(100);
        core.move_points = core.speed;
        Self {
            core,
            scent: Self::DEFAULT_SCENT,
            activity: None,
            power: 0,
            dodge: Self::DEFAULT_DODGE,
            flags: PlayerFlags::empty(),
            hunger: 0,
            thirst: 0,
            fatigue: 0,
            volume: 0,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: PlayerFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_power(mut self, power: i32) -> Self {
        self.power = power;
        self
    }

    /// Scent stamped at the player's tile this turn.
    pub fn scent_source(&self) -> i32 {
        if self.flags.contains(PlayerFlags::SCENT_MASK) {
            0
        } else {
            self.scent
        }
    }

    pub fn cancel_activity(&mut self) -> Option<Activity> {
        self.activity.take()
    }
}

impl Actor for Player {
    fn core(&self) -> &ActorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActorCore {
        &mut self.core
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Player
    }

    /// The player's decisions come from `PlayerInput`.
    fn plan(&mut self, _view: &PlanView<'_>, _rng: &mut StdRng) {}

    fn next_intent(&mut self, _view: &PlanView<'_>) -> Intent {
        Intent::Wait
    }

    fn footstep_volume(&self) -> u32 {
        6
    }
}
