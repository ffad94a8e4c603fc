use std::collections::BTreeMap;
use std::fmt::Display;

use getset::CopyGetters;

use crate::flowcell::{GridConfig, MicroTile, Tile};

/// Tiles of one lane, keyed by tile number.
#[derive(Debug, Clone, PartialEq, CopyGetters)]
pub struct Lane {
    #[getset(get_copy = "pub")]
    lane: u32,
    #[getset(get_copy = "pub")]
    grid: GridConfig,
    tiles: BTreeMap<u32, Tile>,
}

impl Lane {
    pub fn new(lane: u32, grid: GridConfig) -> Self {
        Lane {
            lane,
            grid,
            tiles: BTreeMap::new(),
        }
    }

    pub fn get_tile(&mut self, tile: u32) -> &mut Tile {
        let (lane, grid) = (self.lane, self.grid);
        self.tiles
            .entry(tile)
            .or_insert_with(|| Tile::new(lane, tile, grid))
    }

    pub fn find_tile(&self, tile: u32) -> Option<&Tile> {
        self.tiles.get(&tile)
    }

    pub fn get_micro_tile(&mut self, tile: u32, x: u32, y: u32) -> &mut MicroTile {
        self.get_tile(tile).get(x, y)
    }

    pub fn add(&mut self, other: &Lane) {
        for tile in other.tiles() {
            self.get_tile(tile.tile()).add(tile);
        }
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn tiles_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.tiles.values_mut()
    }

    pub fn micro_tiles(&self) -> impl Iterator<Item = &MicroTile> {
        self.tiles().flat_map(|t| t.micro_tiles())
    }
}

impl Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for tile in self.tiles() {
            write!(f, "{}", tile)?;
        }
        Ok(())
    }
}
