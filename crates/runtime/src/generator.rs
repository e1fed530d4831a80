//! Seeded terrain for submaps the store has never seen.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sim_core::{MapGenerator, Point, SimConfig, Submap, TerrainKind, Tripoint};

/// Procedural generator: the same seed and coordinate always produce the
/// same submap.
#[derive(Clone, Copy, Debug)]
pub struct TerrainGenerator {
    seed: u64,
}

impl TerrainGenerator {
    /// Submaps on this lattice hold a staircase pair.
    const STAIR_SPACING: i32 = 4;

    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn rng_for(&self, abs_sub: Tripoint) -> StdRng {
        let mut h = self.seed ^ 0x9E37_79B9_7F4A_7C15;
        for v in [abs_sub.x, abs_sub.y, abs_sub.z] {
            h = (h ^ v as u32 as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            h ^= h >> 31;
        }
        StdRng::seed_from_u64(h)
    }

    /// Whether `abs_sub` carries a staircase pair.
    pub fn has_stairs(abs_sub: Tripoint) -> bool {
        abs_sub.x.rem_euclid(Self::STAIR_SPACING) == 1 && abs_sub.y.rem_euclid(Self::STAIR_SPACING) == 1
    }

    /// Local tiles of the down and up staircases in a stair submap.
    pub fn stair_tiles(z: i32) -> (Point, Point) {
        let (low, high) = (Point::new(3, 3), Point::new(8, 8));
        if z.rem_euclid(2) == 0 { (low, high) } else { (high, low) }
    }
}

impl MapGenerator for TerrainGenerator {
    fn generate(&self, abs_sub: Tripoint) -> Submap {
        let mut rng = self.rng_for(abs_sub);
        let mut submap = Submap::filled(TerrainKind::Floor);
        let side = SimConfig::SEEX;

        for _ in 0..rng.random_range(0..4) {
            let kind = match rng.random_range(0..3) {
                0 => TerrainKind::Grass,
                1 => TerrainKind::Dirt,
                _ => TerrainKind::Rubble,
            };
            let (cx, cy) = (rng.random_range(0..side), rng.random_range(0..side));
            for dy in -1..=1 {
                for dx in -1..=1 {
                    submap.set_terrain(Point::new(cx + dx, cy + dy), kind);
                }
            }
        }

        if rng.random_ratio(1, 4) {
            building(&mut submap, &mut rng);
        } else {
            for _ in 0..rng.random_range(0..3) {
                let at = Point::new(rng.random_range(0..side), rng.random_range(0..side));
                submap.set_terrain(at, TerrainKind::Wall);
            }
        }

        if rng.random_ratio(1, 20) {
            let at = Point::new(rng.random_range(0..side), rng.random_range(0..side));
            submap.set_terrain(at, TerrainKind::Vent);
        }

        // Stairs go last so nothing overwrites them.
        if Self::has_stairs(abs_sub) {
            let (down, up) = Self::stair_tiles(abs_sub.z);
            submap.set_terrain(down, TerrainKind::StairsDown);
            submap.set_terrain(up, TerrainKind::StairsUp);
        }
        submap
    }
}

/// A walled room with a door and a window.
fn building(submap: &mut Submap, rng: &mut StdRng) {
    let (x0, y0) = (rng.random_range(1..4), rng.random_range(1..4));
    let (x1, y1) = (rng.random_range(7..11), rng.random_range(7..11));
    for x in x0..=x1 {
        submap.set_terrain(Point::new(x, y0), TerrainKind::Wall);
        submap.set_terrain(Point::new(x, y1), TerrainKind::Wall);
    }
    for y in y0..=y1 {
        submap.set_terrain(Point::new(x0, y), TerrainKind::Wall);
        submap.set_terrain(Point::new(x1, y), TerrainKind::Wall);
    }
    let door = if rng.random_bool(0.5) {
        TerrainKind::DoorClosed
    } else {
        TerrainKind::DoorOpen
    };
    submap.set_terrain(Point::new((x0 + x1) / 2, y1), door);
    submap.set_terrain(Point::new(x0, (y0 + y1) / 2), TerrainKind::Window);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic_per_coordinate() {
        let generator = TerrainGenerator::new(7);
        let at = Tripoint::new(-3, 12, 0);
        assert_eq!(generator.generate(at), generator.generate(at));
        assert!(generator.generate(at).is_well_formed());
    }

    #[test]
    fn stair_submaps_alternate_by_level() {
        let generator = TerrainGenerator::new(1);
        let ground = generator.generate(Tripoint::new(1, 5, 0));
        let above = generator.generate(Tripoint::new(1, 5, 1));
        let (down, up) = TerrainGenerator::stair_tiles(0);
        assert_eq!(ground.terrain(down), Some(TerrainKind::StairsDown));
        assert_eq!(ground.terrain(up), Some(TerrainKind::StairsUp));
        assert_eq!(above.terrain(down), Some(TerrainKind::StairsUp));
        assert_eq!(above.terrain(up), Some(TerrainKind::StairsDown));
        assert!(!TerrainGenerator::has_stairs(Tripoint::new(2, 5, 0)));
        assert!(TerrainGenerator::has_stairs(Tripoint::new(-3, -7, 0)));
    }
}
