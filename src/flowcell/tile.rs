use std::collections::BTreeMap;
use std::fmt::Display;

use getset::CopyGetters;

use crate::flowcell::{GridConfig, MicroTile};

/// Micro-tiles of one physical tile; only cells that saw a read exist.
#[derive(Debug, Clone, PartialEq, CopyGetters)]
pub struct Tile {
    #[getset(get_copy = "pub")]
    lane: u32,
    #[getset(get_copy = "pub")]
    tile: u32,
    #[getset(get_copy = "pub")]
    grid: GridConfig,
    // keyed by (x cell, y cell), so iteration is x-major
    cells: BTreeMap<(usize, usize), MicroTile>,
}

impl Tile {
    pub fn new(lane: u32, tile: u32, grid: GridConfig) -> Self {
        Tile {
            lane,
            tile,
            grid,
            cells: BTreeMap::new(),
        }
    }

    /// Micro-tile covering `(x, y)`, created on first access.
    pub fn get(&mut self, x: u32, y: u32) -> &mut MicroTile {
        let (xi, yi) = self.grid.cell_of(x, y);
        let grid = self.grid;
        let (lane, tile) = (self.lane, self.tile);
        let mt = self.cells.entry((xi, yi)).or_insert_with(|| {
            let [x1, x2, y1, y2] = grid.cell_rect(xi, yi);
            MicroTile::new(lane, tile, x1, x2, y1, y2)
        });
        debug_assert!(
            mt.contains(x, y),
            "micro-tile {} does not contain ({}, {}) under grid {}",
            mt,
            x,
            y,
            grid
        );
        mt
    }

    /// Micro-tile covering `(x, y)` if it was ever allocated.
    pub fn find(&self, x: u32, y: u32) -> Option<&MicroTile> {
        self.cells.get(&self.grid.cell_of(x, y))
    }

    /// Adds every micro-tile of `other` into the cell holding its origin.
    pub fn add(&mut self, other: &Tile) {
        for mt in other.micro_tiles() {
            self.get(mt.x1(), mt.y1()).add(mt);
        }
    }

    pub fn micro_tiles(&self) -> impl Iterator<Item = &MicroTile> {
        self.cells.values()
    }

    pub fn micro_tiles_mut(&mut self) -> impl Iterator<Item = &mut MicroTile> {
        self.cells.values_mut()
    }

    pub fn micro_tile_count(&self) -> usize {
        self.micro_tiles().count()
    }

    pub fn read_count(&self) -> u64 {
        self.micro_tiles().map(|mt| mt.read_count()).sum()
    }
}

impl Display for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for mt in self.micro_tiles() {
            writeln!(f, "{}", mt.to_text())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flowcell::read_facts::ReadObservation;

    #[test]
    fn test_get_contains_point() {
        let mut tile = Tile::new(1, 1101, GridConfig::new(100, 60));
        for (x, y) in [(0, 0), (99, 59), (100, 60), (1234, 987), (5, 400)] {
            let mt = tile.get(x, y);
            assert!(mt.contains(x, y), "{} should contain ({}, {})", mt, x, y);
            assert_eq!(mt.lane(), 1);
            assert_eq!(mt.tile(), 1101);
        }
        // (0, 0) and (99, 59) share a cell
        assert_eq!(tile.micro_tile_count(), 4);
        tile.get(1, 1);
        assert_eq!(tile.micro_tile_count(), 4);
        assert!(tile.find(150, 10).is_none());
        assert!(tile.find(1299, 1019).is_some());
    }

    #[test]
    fn test_add_uses_other_origin() {
        let fine = GridConfig::new(100, 100);
        let coarse = GridConfig::new(200, 200);
        let mut small = Tile::new(1, 5, fine);
        let read = ReadObservation::new(b"ACGT", 30.0, 90.0);
        small.get(50, 50).add_read(&read, 25);
        small.get(150, 150).add_read(&read, 25);
        small.get(250, 50).add_read(&read, 25);

        let mut big = Tile::new(1, 5, coarse);
        big.add(&small);
        assert_eq!(big.micro_tile_count(), 2);
        assert_eq!(big.find(0, 0).unwrap().read_count(), 2);
        assert_eq!(big.find(399, 0).unwrap().read_count(), 1);
        assert_eq!(big.read_count(), 3);
    }

    #[test]
    fn test_far_coordinates_stay_sparse() {
        let mut tile = Tile::new(1, 1101, GridConfig::new(1, 1));
        tile.get(u32::MAX, u32::MAX);
        tile.get(0, 5);
        assert_eq!(tile.cells.len(), 2);
        assert!(tile.find(u32::MAX, u32::MAX).unwrap().contains(u32::MAX, u32::MAX));
        let origins: Vec<u32> = tile.micro_tiles().map(|mt| mt.x1()).collect();
        assert_eq!(origins, vec![0, u32::MAX]);
    }

    #[test]
    fn test_display_one_line_per_micro_tile() {
        let mut tile = Tile::new(3, 2, GridConfig::default());
        tile.get(10, 10);
        tile.get(900, 10);
        let text = tile.to_string();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().all(|l| l.starts_with("3\t2\t")));
    }
}
