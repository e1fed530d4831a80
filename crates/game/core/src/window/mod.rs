//! The reality bubble: the fully simulated square of map around the player.
//!
//! The window is a `MAPSIZE × MAPSIZE` grid of submaps per loaded z-level.
//! Window-local tile coordinates run from `0` to `WINDOW_TILES` on x and y;
//! z is always absolute. Submaps leaving the window are paged out to a
//! [`ChunkStore`] and new ones paged in, so memory stays bounded no matter
//! how far the player travels.
mod cache;

use std::collections::BTreeMap;

use cache::{LevelCache, clear_line};

use crate::config::{SimConfig, ZLevelMode};
use crate::env::{ChunkStore, StoreError, Submap, TerrainFlags, TerrainKind};
use crate::error::{ErrorSeverity, SimError};
use crate::state::{Point, Tick, Tripoint, rl_dist};

const SEEX: i32 = SimConfig::SEEX;
const SEEY: i32 = SimConfig::SEEY;
const MAPSIZE: i32 = SimConfig::MAPSIZE;

/// A subsystem holding window-local coordinates that must follow a shift.
pub trait Remap {
    /// `offset` is added to every stored window-local x/y.
    fn remap(&mut self, offset: Point);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "lowercase")]
pub enum VerticalDirection {
    Up,
    Down,
}

impl VerticalDirection {
    pub const fn from_dz(dz: i32) -> Self {
        if dz > 0 { Self::Up } else { Self::Down }
    }

    pub const fn dz(self) -> i32 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }

    /// Terrain flag needed to leave a level in this direction.
    pub const fn departure_flag(self) -> TerrainFlags {
        match self {
            Self::Up => TerrainFlags::GOES_UP,
            Self::Down => TerrainFlags::GOES_DOWN,
        }
    }

    /// Terrain flag of the connector one arrives on.
    pub const fn arrival_flag(self) -> TerrainFlags {
        match self {
            Self::Up => TerrainFlags::GOES_DOWN,
            Self::Down => TerrainFlags::GOES_UP,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    #[error("z-level {requested} is outside [{min}, {max}]")]
    ZLevelOutOfRange { requested: i32, min: i32, max: i32 },

    #[error("nothing at {at} leads {direction}")]
    NoConnector {
        at: Tripoint,
        direction: VerticalDirection,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SimError for WindowError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ZLevelOutOfRange { .. } | Self::NoConnector { .. } => ErrorSeverity::Validation,
            Self::Store(inner) => inner.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ZLevelOutOfRange { .. } => "WINDOW_Z_OUT_OF_RANGE",
            Self::NoConnector { .. } => "WINDOW_NO_CONNECTOR",
            Self::Store(inner) => inner.error_code(),
        }
    }
}

/// Outcome of paging submaps in and out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PagingReport {
    pub paged_in: usize,
    pub paged_out: usize,
    /// Load failures were replaced by blank submaps; store failures lost
    /// the submap's changes.
    pub load_failures: Vec<StoreError>,
    pub store_failures: Vec<StoreError>,
}

impl PagingReport {
    fn merge(&mut self, other: PagingReport) {
        self.paged_in += other.paged_in;
        self.paged_out += other.paged_out;
        self.load_failures.extend(other.load_failures);
        self.store_failures.extend(other.store_failures);
    }
}

#[derive(Clone, Debug)]
pub struct SpatialWindow {
    mode: ZLevelMode,
    /// Absolute submap coordinate of grid cell (0, 0); z is the player's level.
    abs_sub: Tripoint,
    levels: BTreeMap<i32, Vec<Submap>>,
    caches: BTreeMap<i32, LevelCache>,
}

impl SpatialWindow {
    /// Pages in the window whose origin is `abs_sub`.
    pub fn load(
        mode: ZLevelMode,
        abs_sub: Tripoint,
        store: &mut dyn ChunkStore,
    ) -> Result<(Self, PagingReport), WindowError> {
        Self::check_z(abs_sub.z)?;
        let mut window = Self {
            mode,
            abs_sub,
            levels: BTreeMap::new(),
            caches: BTreeMap::new(),
        };
        let mut report = PagingReport::default();
        let levels: Vec<i32> = match mode {
            ZLevelMode::Flat => vec![abs_sub.z],
            ZLevelMode::Stacked => SimConfig::z_range().collect(),
        };
        for z in levels {
            report.merge(window.page_in_level(z, store));
        }
        window.build_map_cache(abs_sub.z);
        Ok((window, report))
    }

    /// Window origin such that absolute tile `abs` lands in the central submap.
    pub fn origin_for(abs: Tripoint) -> Tripoint {
        Tripoint::new(
            abs.x.div_euclid(SEEX) - MAPSIZE / 2,
            abs.y.div_euclid(SEEY) - MAPSIZE / 2,
            abs.z,
        )
    }

    pub fn check_z(z: i32) -> Result<(), WindowError> {
        if SimConfig::z_range().contains(&z) {
            Ok(())
        } else {
            Err(WindowError::ZLevelOutOfRange {
                requested: z,
                min: -SimConfig::OVERMAP_DEPTH,
                max: SimConfig::OVERMAP_HEIGHT,
            })
        }
    }

    pub fn mode(&self) -> ZLevelMode {
        self.mode
    }

    pub fn abs_sub(&self) -> Tripoint {
        self.abs_sub
    }

    /// The player's z-level.
    pub fn z(&self) -> i32 {
        self.abs_sub.z
    }

    pub fn is_loaded(&self, z: i32) -> bool {
        self.levels.contains_key(&z)
    }

    pub fn loaded_levels(&self) -> impl Iterator<Item = i32> + '_ {
        self.levels.keys().copied()
    }

    /// True for window-local tiles inside the loaded window.
    pub fn contains(&self, local: Tripoint) -> bool {
        let side = SimConfig::WINDOW_TILES;
        (0..side).contains(&local.x) && (0..side).contains(&local.y) && self.is_loaded(local.z)
    }

    /// True for tiles within `margin` tiles of the window on a loaded level.
    pub fn within_margin(&self, local: Tripoint, margin: i32) -> bool {
        let range = -margin..SimConfig::WINDOW_TILES + margin;
        range.contains(&local.x) && range.contains(&local.y) && self.is_loaded(local.z)
    }

    pub fn local_to_abs(&self, local: Tripoint) -> Tripoint {
        Tripoint::new(
            local.x + self.abs_sub.x * SEEX,
            local.y + self.abs_sub.y * SEEY,
            local.z,
        )
    }

    pub fn abs_to_local(&self, abs: Tripoint) -> Tripoint {
        Tripoint::new(
            abs.x - self.abs_sub.x * SEEX,
            abs.y - self.abs_sub.y * SEEY,
            abs.z,
        )
    }

    /// Absolute submap holding window-local tile `local`.
    pub fn abs_sub_of(&self, local: Tripoint) -> Tripoint {
        let abs = self.local_to_abs(local);
        Tripoint::new(abs.x.div_euclid(SEEX), abs.y.div_euclid(SEEY), abs.z)
    }

    fn grid_index(gx: i32, gy: i32) -> Option<usize> {
        ((0..MAPSIZE).contains(&gx) && (0..MAPSIZE).contains(&gy))
            .then(|| (gy * MAPSIZE + gx) as usize)
    }

    fn locate(local: Tripoint) -> Option<(usize, Point)> {
        if local.x < 0 || local.y < 0 {
            return None;
        }
        let index = Self::grid_index(local.x / SEEX, local.y / SEEY)?;
        Some((index, Point::new(local.x % SEEX, local.y % SEEY)))
    }

    pub fn terrain(&self, local: Tripoint) -> Option<TerrainKind> {
        let (index, within) = Self::locate(local)?;
        self.levels.get(&local.z)?.get(index)?.terrain(within)
    }

    /// Flags of the tile, empty outside the window.
    pub fn flags(&self, local: Tripoint) -> TerrainFlags {
        self.terrain(local).map(TerrainKind::flags).unwrap_or_default()
    }

    pub fn is_passable(&self, local: Tripoint) -> bool {
        match self.caches.get(&local.z) {
            Some(cache) if cache.valid => cache.is_passable(local.xy()),
            _ => self.flags(local).contains(TerrainFlags::PASSABLE),
        }
    }

    /// Move cost at nominal speed; 0 for impassable or unloaded tiles.
    pub fn move_cost(&self, local: Tripoint) -> i32 {
        self.terrain(local).map_or(0, TerrainKind::move_cost)
    }

    pub fn set_terrain(&mut self, local: Tripoint, kind: TerrainKind) -> bool {
        let Some((index, within)) = Self::locate(local) else {
            return false;
        };
        let changed = self
            .levels
            .get_mut(&local.z)
            .and_then(|level| level.get_mut(index))
            .is_some_and(|submap| submap.set_terrain(within, kind));
        if changed && let Some(cache) = self.caches.get_mut(&local.z) {
            cache.invalidate();
        }
        changed
    }

    /// Every tile of level `z` with its flags.
    pub fn level_flags(&self, z: i32) -> impl Iterator<Item = (Point, TerrainFlags)> + '_ {
        self.levels.get(&z).into_iter().flat_map(|level| {
            level.iter().enumerate().flat_map(|(i, submap)| {
                let i = i as i32;
                let corner = Point::new((i % MAPSIZE) * SEEX, (i / MAPSIZE) * SEEY);
                submap.tiles().map(move |(p, kind)| (corner + p, kind.flags()))
            })
        })
    }

    /// Tiles on `center`'s level within `radius` whose flags contain `flag`.
    pub fn tiles_within(&self, center: Tripoint, radius: u32, flag: TerrainFlags) -> Vec<Tripoint> {
        let r = radius as i32;
        let mut found = Vec::new();
        for y in (center.y - r)..=(center.y + r) {
            for x in (center.x - r)..=(center.x + r) {
                let p = Tripoint::new(x, y, center.z);
                if self.flags(p).contains(flag) {
                    found.push(p);
                }
            }
        }
        found
    }

    /// Tiles flagged `EMITS` on level `z`.
    pub fn emitters(&self, z: i32) -> Vec<Tripoint> {
        match self.caches.get(&z) {
            Some(cache) if cache.valid => cache
                .emitters
                .iter()
                .map(|p| Tripoint::new(p.x, p.y, z))
                .collect(),
            _ => self
                .level_flags(z)
                .filter(|(_, f)| f.contains(TerrainFlags::EMITS))
                .map(|(p, _)| Tripoint::new(p.x, p.y, z))
                .collect(),
        }
    }

    /// Line of sight between two window-local tiles on the same level.
    pub fn sees(&self, from: Tripoint, to: Tripoint, range: u32) -> bool {
        if from.z != to.z || rl_dist(from, to) > range {
            return false;
        }
        if !self.contains(from) || !self.contains(to) {
            return false;
        }
        let z = from.z;
        match self.caches.get(&z) {
            Some(cache) if cache.valid => {
                clear_line(from.xy(), to.xy(), |p| cache.is_transparent(p))
            }
            _ => clear_line(from.xy(), to.xy(), |p| {
                self.flags(Tripoint::new(p.x, p.y, z))
                    .contains(TerrainFlags::TRANSPARENT)
            }),
        }
    }

    /// Rebuilds the derived caches of level `z` if they are stale.
    pub fn build_map_cache(&mut self, z: i32) {
        if !self.is_loaded(z) {
            return;
        }
        if self.caches.get(&z).is_some_and(|cache| cache.valid) {
            return;
        }
        let mut cache = self.caches.remove(&z).unwrap_or_default();
        cache.rebuild(self.level_flags(z));
        self.caches.insert(z, cache);
    }

    pub fn invalidate_caches(&mut self) {
        self.caches.values_mut().for_each(LevelCache::invalidate);
    }

    pub fn clear_caches(&mut self) {
        self.caches.clear();
    }

    /// Shift (in submaps) that brings `focus` back into the central submap.
    pub fn shift_for(focus: Point) -> Point {
        let low = SEEX * (MAPSIZE / 2);
        let high = SEEX * (MAPSIZE / 2 + 1);
        let mut shift = Point::ZERO;
        let mut x = focus.x;
        while x < low {
            x += SEEX;
            shift.x -= 1;
        }
        while x >= high {
            x -= SEEX;
            shift.x += 1;
        }
        let low = SEEY * (MAPSIZE / 2);
        let high = SEEY * (MAPSIZE / 2 + 1);
        let mut y = focus.y;
        while y < low {
            y += SEEY;
            shift.y -= 1;
        }
        while y >= high {
            y -= SEEY;
            shift.y += 1;
        }
        shift
    }

    /// Tile offset window-local coordinates receive after shifting by `shift`
    /// submaps.
    pub fn remap_offset(shift: Point) -> Point {
        Point::new(-shift.x * SEEX, -shift.y * SEEY)
    }

    /// Moves the window origin by `shift` submaps on every loaded level.
    pub fn shift(&mut self, shift: Point, store: &mut dyn ChunkStore, now: Tick) -> PagingReport {
        let mut report = PagingReport::default();
        if shift.is_zero() {
            return report;
        }
        let old_origin = self.abs_sub;
        let new_origin = old_origin + shift;
        let levels: Vec<i32> = self.levels.keys().copied().collect();
        for z in levels {
            let Some(old) = self.levels.remove(&z) else {
                continue;
            };
            let mut next: Vec<Option<Submap>> = vec![None; (MAPSIZE * MAPSIZE) as usize];
            for (i, mut submap) in old.into_iter().enumerate() {
                let (gx, gy) = (i as i32 % MAPSIZE, i as i32 / MAPSIZE);
                match Self::grid_index(gx - shift.x, gy - shift.y) {
                    Some(slot) => next[slot] = Some(submap),
                    None => {
                        submap.last_touched = now;
                        let at = Tripoint::new(old_origin.x + gx, old_origin.y + gy, z);
                        if let Err(err) = store.store(at, submap) {
                            report.store_failures.push(err);
                        }
                        report.paged_out += 1;
                    }
                }
            }
            let mut level = Vec::with_capacity(next.len());
            for (i, slot) in next.into_iter().enumerate() {
                let submap = match slot {
                    Some(submap) => submap,
                    None => {
                        let (gx, gy) = (i as i32 % MAPSIZE, i as i32 / MAPSIZE);
                        report.paged_in += 1;
                        Self::load_submap(
                            store,
                            Tripoint::new(new_origin.x + gx, new_origin.y + gy, z),
                            &mut report,
                        )
                    }
                };
                level.push(submap);
            }
            self.levels.insert(z, level);
        }
        self.abs_sub = new_origin;
        self.invalidate_caches();
        tracing::debug!(
            dx = shift.x,
            dy = shift.y,
            paged_in = report.paged_in,
            paged_out = report.paged_out,
            "window shifted"
        );
        report
    }

    /// Makes `new_z` the player's level.
    ///
    /// Flat windows swap the loaded level; stacked windows only move the
    /// reference z. Nothing is mutated when `new_z` is out of range.
    pub fn vertical_shift(
        &mut self,
        new_z: i32,
        store: &mut dyn ChunkStore,
        now: Tick,
    ) -> Result<PagingReport, WindowError> {
        Self::check_z(new_z)?;
        let mut report = PagingReport::default();
        if self.mode == ZLevelMode::Flat && new_z != self.abs_sub.z {
            let old_z = self.abs_sub.z;
            report.merge(self.page_out_level(old_z, store, now));
            self.caches.remove(&old_z);
            report.merge(self.page_in_level(new_z, store));
        }
        self.abs_sub.z = new_z;
        self.build_map_cache(new_z);
        Ok(report)
    }

    /// Writes every loaded submap to `store`.
    pub fn save_all(&self, store: &mut dyn ChunkStore, now: Tick) -> Vec<StoreError> {
        let mut failures = Vec::new();
        for (&z, level) in &self.levels {
            for (i, submap) in level.iter().enumerate() {
                let (gx, gy) = (i as i32 % MAPSIZE, i as i32 / MAPSIZE);
                let at = Tripoint::new(self.abs_sub.x + gx, self.abs_sub.y + gy, z);
                let mut copy = submap.clone();
                copy.last_touched = now;
                if let Err(err) = store.store(at, copy) {
                    failures.push(err);
                }
            }
        }
        failures
    }

    fn page_in_level(&mut self, z: i32, store: &mut dyn ChunkStore) -> PagingReport {
        let mut report = PagingReport::default();
        let mut level = Vec::with_capacity((MAPSIZE * MAPSIZE) as usize);
        for gy in 0..MAPSIZE {
            for gx in 0..MAPSIZE {
                let at = Tripoint::new(self.abs_sub.x + gx, self.abs_sub.y + gy, z);
                level.push(Self::load_submap(store, at, &mut report));
                report.paged_in += 1;
            }
        }
        self.levels.insert(z, level);
        report
    }

    fn page_out_level(&mut self, z: i32, store: &mut dyn ChunkStore, now: Tick) -> PagingReport {
        let mut report = PagingReport::default();
        let Some(level) = self.levels.remove(&z) else {
            return report;
        };
        for (i, mut submap) in level.into_iter().enumerate() {
            let (gx, gy) = (i as i32 % MAPSIZE, i as i32 / MAPSIZE);
            submap.last_touched = now;
            let at = Tripoint::new(self.abs_sub.x + gx, self.abs_sub.y + gy, z);
            if let Err(err) = store.store(at, submap) {
                report.store_failures.push(err);
            }
            report.paged_out += 1;
        }
        report
    }

    fn load_submap(store: &mut dyn ChunkStore, at: Tripoint, report: &mut PagingReport) -> Submap {
        match store.load(at) {
            Ok(submap) if submap.is_well_formed() => submap,
            Ok(_) => {
                report
                    .load_failures
                    .push(StoreError::corrupt(at, "wrong tile count"));
                Submap::default()
            }
            Err(err) => {
                report.load_failures.push(err);
                Submap::default()
            }
        }
    }
}
