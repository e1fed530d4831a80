use bitflags::bitflags;

use crate::config::SimConfig;
use crate::state::{Point, Tick, Tripoint};

bitflags! {
    /// Static properties of a terrain type consulted by the simulation.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct TerrainFlags: u16 {
        const PASSABLE      = 1 << 0;
        const TRANSPARENT   = 1 << 1;
        const GOES_UP       = 1 << 2;
        const GOES_DOWN     = 1 << 3;
        const BLOCKS_SCENT  = 1 << 4;
        const REDUCES_SCENT = 1 << 5;
        const BASHABLE      = 1 << 6;
        const ROUGH         = 1 << 7;
        /// Periodically emits a field (smoke vents, fumaroles).
        const EMITS         = 1 << 8;
        const SWIMMABLE     = 1 << 9;
    }
}

/// Canonical terrain classes for map tiles.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display, strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerrainKind {
    #[default]
    Floor,
    Dirt,
    Grass,
    Rubble,
    Wall,
    Window,
    DoorClosed,
    DoorOpen,
    /// Chain-link fence: passable for scent at reduced rate.
    Fence,
    StairsUp,
    StairsDown,
    Water,
    Vent,
}

impl TerrainKind {
    pub const fn flags(self) -> TerrainFlags {
        const OPEN: TerrainFlags = TerrainFlags::PASSABLE.union(TerrainFlags::TRANSPARENT);
        match self {
            TerrainKind::Floor | TerrainKind::Dirt | TerrainKind::Grass | TerrainKind::DoorOpen => {
                OPEN
            }
            TerrainKind::Rubble => OPEN.union(TerrainFlags::ROUGH),
            TerrainKind::Wall => TerrainFlags::BLOCKS_SCENT,
            TerrainKind::Window => TerrainFlags::TRANSPARENT
                .union(TerrainFlags::BLOCKS_SCENT)
                .union(TerrainFlags::BASHABLE),
            TerrainKind::DoorClosed => TerrainFlags::BLOCKS_SCENT.union(TerrainFlags::BASHABLE),
            TerrainKind::Fence => TerrainFlags::TRANSPARENT.union(TerrainFlags::REDUCES_SCENT),
            TerrainKind::StairsUp => OPEN.union(TerrainFlags::GOES_UP),
            TerrainKind::StairsDown => OPEN.union(TerrainFlags::GOES_DOWN),
            TerrainKind::Water => OPEN
                .union(TerrainFlags::SWIMMABLE)
                .union(TerrainFlags::ROUGH),
            TerrainKind::Vent => OPEN.union(TerrainFlags::EMITS),
        }
    }

    /// Movement cost in move points at nominal speed; 0 means impassable.
    pub const fn move_cost(self) -> i32 {
        let flags = self.flags();
        if !flags.contains(TerrainFlags::PASSABLE) {
            0
        } else if flags.contains(TerrainFlags::ROUGH) {
            200
        } else {
            100
        }
    }

    pub const fn is_passable(self) -> bool {
        self.flags().contains(TerrainFlags::PASSABLE)
    }
}

/// Fixed-size square chunk of terrain, the unit of paging.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Submap {
    terrain: Vec<TerrainKind>,
    /// Last turn the window held this submap.
    pub last_touched: Tick,
}

impl Submap {
    pub const TILES: usize = (SimConfig::SEEX * SimConfig::SEEY) as usize;

    pub fn filled(kind: TerrainKind) -> Self {
        Self {
            terrain: vec![kind; Self::TILES],
            last_touched: Tick::ZERO,
        }
    }

    fn index(local: Point) -> Option<usize> {
        let in_range = (0..SimConfig::SEEX).contains(&local.x) && (0..SimConfig::SEEY).contains(&local.y);
        in_range.then(|| (local.y * SimConfig::SEEX + local.x) as usize)
    }

    /// Terrain at a tile relative to the submap's corner.
    pub fn terrain(&self, local: Point) -> Option<TerrainKind> {
        Self::index(local).and_then(|i| self.terrain.get(i).copied())
    }

    pub fn set_terrain(&mut self, local: Point, kind: TerrainKind) -> bool {
        match Self::index(local).and_then(|i| self.terrain.get_mut(i)) {
            Some(slot) => {
                *slot = kind;
                true
            }
            None => false,
        }
    }

    /// A deserialized submap with the wrong tile count is unusable.
    pub fn is_well_formed(&self) -> bool {
        self.terrain.len() == Self::TILES
    }

    /// Iterates `(local point, terrain)` in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = (Point, TerrainKind)> + '_ {
        self.terrain.iter().enumerate().map(|(i, kind)| {
            let i = i as i32;
            (Point::new(i % SimConfig::SEEX, i / SimConfig::SEEX), *kind)
        })
    }
}

impl Default for Submap {
    fn default() -> Self {
        Self::filled(TerrainKind::Floor)
    }
}

/// Produces terrain for submaps that have never been stored.
pub trait MapGenerator {
    fn generate(&self, abs_sub: Tripoint) -> Submap;
}

/// Generator that returns open floor everywhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatGenerator;

impl MapGenerator for FlatGenerator {
    fn generate(&self, _abs_sub: Tripoint) -> Submap {
        Submap::filled(TerrainKind::Floor)
    }
}

impl<G: MapGenerator + ?Sized> MapGenerator for &G {
    fn generate(&self, abs_sub: Tripoint) -> Submap {
        (**self).generate(abs_sub)
    }
}
