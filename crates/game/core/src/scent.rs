//! Scent diffusion over the window.
//!
//! The player stamps scent at their tile every turn and it spreads to the
//! surrounding tiles by a two-pass box blur restricted to a square around
//! the player. Walls (`BLOCKS_SCENT`) hold no scent; fences and similar
//! terrain (`REDUCES_SCENT`) let it through at a fifth of the normal rate.
use crate::config::SimConfig;
use crate::env::TerrainFlags;
use crate::error::ErrorSeverity;
use crate::state::{Diagnostics, Point, Tick, Tripoint};
use crate::window::{Remap, SpatialWindow};

const SIDE: i32 = SimConfig::WINDOW_TILES;

/// Diffusion weight of a tile in the first pass.
const WEIGHT_NORMAL: i64 = 10;
const WEIGHT_REDUCED: i64 = 2;
/// Per-ten-thousand diffusivity of normal and scent-reducing tiles.
const DIFFUSIVITY_NORMAL: i64 = 100;
const DIFFUSIVITY_REDUCED: i64 = 20;
/// Sum of the nine weights around an open tile.
const FULL_WEIGHT: i64 = 9 * WEIGHT_NORMAL;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScentUpdate {
    Diffused,
    /// The player has not moved for long enough that nothing can change.
    Skipped,
}

#[derive(Clone, Debug)]
pub struct ScentField {
    values: Vec<i32>,
    ceiling: i32,
    radius: i32,
    idle_turns: u64,
    last_center: Option<Tripoint>,
    last_moved: Tick,
    // Scratch buffers for the column pass, reused between turns.
    sums: Vec<i64>,
    weights: Vec<i64>,
}

impl ScentField {
    pub fn new(config: &SimConfig) -> Self {
        let tiles = (SIDE * SIDE) as usize;
        Self {
            values: vec![0; tiles],
            ceiling: config.scent_ceiling,
            radius: config.scent_radius,
            idle_turns: config.scent_idle_turns,
            last_center: None,
            last_moved: Tick::ZERO,
            sums: vec![0; tiles],
            weights: vec![0; tiles],
        }
    }

    fn index(p: Point) -> Option<usize> {
        ((0..SIDE).contains(&p.x) && (0..SIDE).contains(&p.y)).then(|| (p.y * SIDE + p.x) as usize)
    }

    /// Scent at a window-local tile; 0 outside the window.
    pub fn get(&self, p: Point) -> i32 {
        Self::index(p).map_or(0, |i| self.values[i])
    }

    pub fn set(&mut self, p: Point, value: i32) {
        if let Some(i) = Self::index(p) {
            self.values[i] = value.max(0);
        }
    }

    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0);
        self.last_center = None;
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    pub fn max_value(&self) -> i32 {
        self.values.iter().copied().max().unwrap_or(0)
    }

    /// The neighbour of `from` with the strongest scent, if it beats `from`.
    pub fn gradient_step(&self, from: Point) -> Option<Point> {
        let here = self.get(from);
        crate::state::Direction::ALL
            .into_iter()
            .map(|dir| from + dir.delta())
            .filter(|&p| Self::index(p).is_some())
            .map(|p| (self.get(p), p))
            .filter(|&(value, _)| value > here)
            .max_by_key(|&(value, p)| (value, std::cmp::Reverse(p)))
            .map(|(_, p)| p)
    }

    /// Stamps `source` at `center` and diffuses one step.
    ///
    /// `center` is the player's window-local tile; terrain is read from the
    /// player's level.
    pub fn update(
        &mut self,
        center: Tripoint,
        source: i32,
        window: &SpatialWindow,
        now: Tick,
        diagnostics: &mut Diagnostics,
    ) -> ScentUpdate {
        if self.last_center == Some(center) {
            if self.last_moved + self.idle_turns < now {
                return ScentUpdate::Skipped;
            }
        } else {
            self.last_center = Some(center);
            self.last_moved = now;
        }

        self.set(center.xy(), source);

        let min = Point::new((center.x - self.radius).max(1), (center.y - self.radius).max(1));
        let max = Point::new(
            (center.x + self.radius).min(SIDE - 2),
            (center.y + self.radius).min(SIDE - 2),
        );
        if min.x > max.x || min.y > max.y {
            return ScentUpdate::Diffused;
        }
        let flags = |x: i32, y: i32| window.flags(Tripoint::new(x, y, center.z));

        // Pass 1: weighted vertical sums of three tiles per column.
        for x in (min.x - 1)..=(max.x + 1) {
            for y in min.y..=max.y {
                let mut sum = 0;
                let mut weight = 0;
                for ny in (y - 1)..=(y + 1) {
                    let w = tile_weight(flags(x, ny));
                    sum += w * i64::from(self.get(Point::new(x, ny)));
                    weight += w;
                }
                let i = (y * SIDE + x) as usize;
                self.sums[i] = sum;
                self.weights[i] = weight;
            }
        }

        // Pass 2: combine three columns and move part of the tile's own value.
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                let i = (y * SIDE + x) as usize;
                let tile = flags(x, y);
                if tile.contains(TerrainFlags::BLOCKS_SCENT) {
                    self.values[i] = 0;
                    continue;
                }
                let d = if tile.contains(TerrainFlags::REDUCES_SCENT) {
                    DIFFUSIVITY_REDUCED
                } else {
                    DIFFUSIVITY_NORMAL
                };
                let (left, right) = (i - 1, i + 1);
                let used = self.weights[left] + self.weights[i] + self.weights[right];
                let sum = self.sums[left] + self.sums[i] + self.sums[right];
                let value = i64::from(self.values[i]);
                let kept = value * (10_000 - used * d) - value * d * (FULL_WEIGHT - used) / 5;
                let next = ((kept + d * sum) / 10_000).max(0);

                if next > i64::from(self.ceiling) {
                    diagnostics.record(
                        now,
                        ErrorSeverity::Internal,
                        Diagnostics::SCENT_OVERFLOW,
                        format!("scent {next} at ({x}, {y}) exceeds ceiling, reset"),
                    );
                    self.values[i] = 0;
                } else {
                    self.values[i] = next as i32;
                }
            }
        }
        ScentUpdate::Diffused
    }
}

fn tile_weight(flags: TerrainFlags) -> i64 {
    if flags.contains(TerrainFlags::BLOCKS_SCENT) {
        0
    } else if flags.contains(TerrainFlags::REDUCES_SCENT) {
        WEIGHT_REDUCED
    } else {
        WEIGHT_NORMAL
    }
}

impl Remap for ScentField {
    fn remap(&mut self, offset: Point) {
        let mut shifted = vec![0; self.values.len()];
        for y in 0..SIDE {
            for x in 0..SIDE {
                let from = Point::new(x, y);
                if let Some(to) = Self::index(from + offset) {
                    shifted[to] = self.values[(y * SIDE + x) as usize];
                }
            }
        }
        self.values = shifted;
        self.last_center = self.last_center.map(|c| c + offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZLevelMode;
    use crate::env::{FlatGenerator, MemoryChunkStore, TerrainKind};

    fn setup() -> (ScentField, SpatialWindow, Diagnostics) {
        let config = SimConfig::new();
        let mut store = MemoryChunkStore::new(FlatGenerator);
        let (window, _) =
            SpatialWindow::load(ZLevelMode::Flat, Tripoint::new(0, 0, 0), &mut store).unwrap();
        (ScentField::new(&config), window, Diagnostics::new())
    }

    #[test]
    fn uniform_open_field_is_stable() {
        let (mut scent, window, mut diags) = setup();
        for y in 0..SIDE {
            for x in 0..SIDE {
                scent.set(Point::new(x, y), 300);
            }
        }
        let center = Tripoint::new(66, 66, 0);
        scent.update(center, 300, &window, Tick(1), &mut diags);
        assert_eq!(scent.get(Point::new(66, 66)), 300);
        assert_eq!(scent.get(Point::new(40, 90)), 300);
    }

    #[test]
    fn scent_spreads_to_neighbours() {
        let (mut scent, window, mut diags) = setup();
        let center = Tripoint::new(66, 66, 0);
        scent.update(center, 500, &window, Tick(1), &mut diags);
        assert!(scent.get(Point::new(67, 66)) > 0);
        assert!(scent.get(Point::new(66, 66)) < 500);
        assert_eq!(scent.get(Point::new(70, 66)), 0);
        assert_eq!(scent.gradient_step(Point::new(67, 67)), Some(Point::new(66, 66)));
    }

    #[test]
    fn blockers_hold_no_scent() {
        let (mut scent, mut window, mut diags) = setup();
        let wall = Tripoint::new(67, 66, 0);
        window.set_terrain(wall, TerrainKind::Wall);
        scent.set(wall.xy(), 900);
        for t in 1..20 {
            scent.update(Tripoint::new(66, 66, 0), 500, &window, Tick(t), &mut diags);
        }
        assert_eq!(scent.get(wall.xy()), 0);
    }

    #[test]
    fn overflow_is_reset_and_reported() {
        let (mut scent, window, mut diags) = setup();
        scent.set(Point::new(30, 30), 200_000);
        scent.update(Tripoint::new(40, 40, 0), 0, &window, Tick(1), &mut diags);
        assert_eq!(scent.get(Point::new(30, 30)), 0);
        assert!(diags.contains(Diagnostics::SCENT_OVERFLOW));
    }

    #[test]
    fn idle_player_skips_diffusion() {
        let (mut scent, window, mut diags) = setup();
        let center = Tripoint::new(66, 66, 0);
        assert_eq!(scent.update(center, 500, &window, Tick(0), &mut diags), ScentUpdate::Diffused);
        assert_eq!(
            scent.update(center, 500, &window, Tick(1000), &mut diags),
            ScentUpdate::Diffused
        );
        let before = scent.values().to_vec();
        assert_eq!(scent.update(center, 500, &window, Tick(1001), &mut diags), ScentUpdate::Skipped);
        assert_eq!(scent.values(), before.as_slice());
    }

    #[test]
    fn remap_moves_values() {
        let (mut scent, _window, _) = setup();
        scent.set(Point::new(20, 20), 77);
        scent.remap(Point::new(-12, 0));
        assert_eq!(scent.get(Point::new(8, 20)), 77);
        assert_eq!(scent.get(Point::new(20, 20)), 0);
        scent.remap(Point::new(-12, 0));
        assert_eq!(scent.max_value(), 0);
    }
}
