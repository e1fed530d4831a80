use crate::config::SimConfig;
use crate::env::TerrainFlags;
use crate::state::{Point, line_to};

/// Derived per-level caches rebuilt after the window moves.
#[derive(Clone, Debug, Default)]
pub(super) struct LevelCache {
    transparent: Vec<bool>,
    passable: Vec<bool>,
    /// Tiles flagged `EMITS`, window-local.
    pub(super) emitters: Vec<Point>,
    pub(super) valid: bool,
}

impl LevelCache {
    fn index(p: Point) -> Option<usize> {
        let side = SimConfig::WINDOW_TILES;
        ((0..side).contains(&p.x) && (0..side).contains(&p.y)).then(|| (p.y * side + p.x) as usize)
    }

    pub(super) fn rebuild(&mut self, flags: impl Iterator<Item = (Point, TerrainFlags)>) {
        let tiles = (SimConfig::WINDOW_TILES * SimConfig::WINDOW_TILES) as usize;
        self.transparent.clear();
        self.transparent.resize(tiles, false);
        self.passable.clear();
        self.passable.resize(tiles, false);
        self.emitters.clear();
        for (p, f) in flags {
            let Some(i) = Self::index(p) else { continue };
            self.transparent[i] = f.contains(TerrainFlags::TRANSPARENT);
            self.passable[i] = f.contains(TerrainFlags::PASSABLE);
            if f.contains(TerrainFlags::EMITS) {
                self.emitters.push(p);
            }
        }
        self.valid = true;
    }

    pub(super) fn invalidate(&mut self) {
        self.valid = false;
    }

    pub(super) fn is_transparent(&self, p: Point) -> bool {
        Self::index(p).is_some_and(|i| self.transparent[i])
    }

    pub(super) fn is_passable(&self, p: Point) -> bool {
        Self::index(p).is_some_and(|i| self.passable[i])
    }
}

/// Straight-line visibility: every tile strictly between the two ends must
/// let light through.
pub(super) fn clear_line(from: Point, to: Point, transparent: impl Fn(Point) -> bool) -> bool {
    let line = line_to(from, to);
    let between = line.len().saturating_sub(1);
    line.into_iter().take(between).all(transparent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_blocked_by_opaque_tile() {
        let wall = Point::new(3, 0);
        let open = |p: Point| p != wall;
        assert!(!clear_line(Point::new(0, 0), Point::new(6, 0), open));
        assert!(clear_line(Point::new(0, 0), Point::new(3, 0), open));
        assert!(clear_line(Point::new(0, 1), Point::new(6, 1), open));
    }
}
