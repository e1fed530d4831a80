/// How many z-levels the spatial window keeps resident.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[strum(serialize_all = "lowercase")]
pub enum ZLevelMode {
    /// Only the player's z-level is loaded; stair crossings go through the
    /// stair queue.
    #[default]
    Flat,
    /// Every z-level is loaded and actors on all levels stay active.
    Stacked,
}

/// Simulation constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Seed for the world random number generator.
    pub seed: u64,
    pub z_levels: ZLevelMode,
    /// Move points an actor of nominal speed receives per turn.
    pub move_allotment: i32,
    /// Consecutive zero-progress iterations before an actor is forced to yield.
    pub loop_limit: u32,
    /// Turns the player may stand still before scent diffusion is skipped.
    pub scent_idle_turns: u64,
    pub scent_ceiling: i32,
    pub scent_radius: i32,
    /// Distance at which a visible hostile interrupts the player's activity.
    pub proximity_warning_radius: u32,
    pub stair_search_radius: u32,
    /// Hostiles tracking the player within this distance follow them on stairs.
    pub stair_follow_radius: u32,
    pub stair_countdown_step: i32,
    pub push_attempts: u32,
    /// Autosave period in turns; `None` disables autosave.
    pub autosave_turns: Option<u64>,
    /// Actors further than `window / divisor` outside the window are deferred.
    pub despawn_margin_divisor: i32,
}

impl SimConfig {
    // ===== geometry =====
    /// Tiles per submap side.
    pub const SEEX: i32 = 12;
    pub const SEEY: i32 = 12;
    /// Submaps per window side.
    pub const MAPSIZE: i32 = 11;
    /// Window side in tiles.
    pub const WINDOW_TILES: i32 = Self::SEEX * Self::MAPSIZE;
    pub const OVERMAP_DEPTH: i32 = 10;
    pub const OVERMAP_HEIGHT: i32 = 10;

    // ===== bounded buffers =====
    pub const MAX_DIAGNOSTICS: usize = 256;
    pub const MAX_MESSAGES: usize = 128;
    /// Nearest stair tiles an arriving actor chooses between.
    pub const STAIR_CANDIDATES: usize = 4;
    pub const RELOCATION_RADIUS: i32 = 3;
    pub const MOTION_ALARM_RADIUS: u32 = 5;
    /// Zero-cost player actions tolerated before the turn is ended.
    pub const PLAYER_IDLE_LIMIT: u32 = 10;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_SEED: u64 = 0x5EED;
    pub const DEFAULT_MOVE_ALLOTMENT: i32 = 100;
    pub const DEFAULT_LOOP_LIMIT: u32 = 10;
    pub const DEFAULT_SCENT_IDLE_TURNS: u64 = 1000;
    pub const DEFAULT_SCENT_CEILING: i32 = 10_000;
    pub const DEFAULT_SCENT_RADIUS: i32 = 40;
    pub const DEFAULT_PROXIMITY_WARNING_RADIUS: u32 = 10;
    pub const DEFAULT_STAIR_SEARCH_RADIUS: u32 = 10;
    pub const DEFAULT_STAIR_FOLLOW_RADIUS: u32 = 10;
    pub const DEFAULT_STAIR_COUNTDOWN_STEP: i32 = 4;
    pub const DEFAULT_PUSH_ATTEMPTS: u32 = 9;
    pub const DEFAULT_DESPAWN_MARGIN_DIVISOR: i32 = 6;

    pub fn new() -> Self {
        Self {
            seed: Self::DEFAULT_SEED,
            z_levels: ZLevelMode::Flat,
            move_allotment: Self::DEFAULT_MOVE_ALLOTMENT,
            loop_limit: Self::DEFAULT_LOOP_LIMIT,
            scent_idle_turns: Self::DEFAULT_SCENT_IDLE_TURNS,
            scent_ceiling: Self::DEFAULT_SCENT_CEILING,
            scent_radius: Self::DEFAULT_SCENT_RADIUS,
            proximity_warning_radius: Self::DEFAULT_PROXIMITY_WARNING_RADIUS,
            stair_search_radius: Self::DEFAULT_STAIR_SEARCH_RADIUS,
            stair_follow_radius: Self::DEFAULT_STAIR_FOLLOW_RADIUS,
            stair_countdown_step: Self::DEFAULT_STAIR_COUNTDOWN_STEP,
            push_attempts: Self::DEFAULT_PUSH_ATTEMPTS,
            autosave_turns: None,
            despawn_margin_divisor: Self::DEFAULT_DESPAWN_MARGIN_DIVISOR,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_z_levels(mut self, mode: ZLevelMode) -> Self {
        self.z_levels = mode;
        self
    }

    #[must_use]
    pub fn with_autosave_turns(mut self, turns: Option<u64>) -> Self {
        self.autosave_turns = turns;
        self
    }

    /// Width of the band outside the window inside which actors stay active.
    pub fn despawn_margin(&self) -> i32 {
        Self::WINDOW_TILES / self.despawn_margin_divisor.max(1)
    }

    /// Inclusive z-range that can ever be loaded.
    pub const fn z_range() -> std::ops::RangeInclusive<i32> {
        -Self::OVERMAP_DEPTH..=Self::OVERMAP_HEIGHT
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new()
    }
}
