use std::collections::BTreeMap;
use std::fmt::Display;

use getset::CopyGetters;

use crate::flowcell::read_facts::ReadFacts;
use crate::flowcell::{FlowCellError, FlowCellStats, GridConfig, Lane, MicroTile};
use crate::helper::header::ReadLocation;

/// Root of the lane -> tile -> micro-tile hierarchy.
#[derive(Debug, Clone, PartialEq, CopyGetters)]
pub struct FlowCell {
    #[getset(get_copy = "pub")]
    grid: GridConfig,
    /// Keyed by lane number; only lanes that saw a read exist.
    lanes: BTreeMap<u32, Lane>,
    #[getset(get_copy = "pub")]
    reads_processed: u64,
    /// Summary from the last [`FlowCell::calc_stats`] (or loaded from a dump).
    #[getset(get_copy = "pub")]
    stats: FlowCellStats,
}

impl Default for FlowCell {
    fn default() -> Self {
        FlowCell::new(GridConfig::default())
    }
}

impl FlowCell {
    pub fn new(grid: GridConfig) -> Self {
        FlowCell {
            grid,
            lanes: BTreeMap::new(),
            reads_processed: 0,
            stats: FlowCellStats::default(),
        }
    }

    pub fn get_lane(&mut self, lane: u32) -> &mut Lane {
        let grid = self.grid;
        self.lanes.entry(lane).or_insert_with(|| Lane::new(lane, grid))
    }

    pub fn find_lane(&self, lane: u32) -> Option<&Lane> {
        self.lanes.get(&lane)
    }

    pub fn get_micro_tile(&mut self, lane: u32, tile: u32, x: u32, y: u32) -> &mut MicroTile {
        self.get_lane(lane).get_micro_tile(tile, x, y)
    }

    pub fn find_micro_tile(&self, lane: u32, tile: u32, x: u32, y: u32) -> Option<&MicroTile> {
        self.find_lane(lane)?.find_tile(tile)?.find(x, y)
    }

    /// Micro-tile addressed by an instrument read id, `None` when the id has no location.
    pub fn micro_tile_for_header(&mut self, id: &str) -> Option<&mut MicroTile> {
        let loc = ReadLocation::parse(id)?;
        Some(self.get_micro_tile(loc.lane, loc.tile, loc.x, loc.y))
    }

    /// Routes one read to its micro-tile. Returns whether the read was counted.
    pub fn add_read<R: ReadFacts + ?Sized>(
        &mut self,
        lane: u32,
        tile: u32,
        x: u32,
        y: u32,
        read: &R,
    ) -> bool {
        let min_poly_g = self.grid.min_poly_g();
        let counted = self.get_micro_tile(lane, tile, x, y).add_read(read, min_poly_g);
        if counted {
            self.reads_processed += 1;
        }
        counted
    }

    /// Merges a flow cell populated on the same grid.
    pub fn add(&mut self, other: &FlowCell) -> Result<(), FlowCellError> {
        if !self.grid.same_geometry(&other.grid) {
            return Err(FlowCellError::GridMismatch {
                left: self.grid,
                right: other.grid,
            });
        }
        self.absorb(other);
        Ok(())
    }

    /// Adds every micro-tile of `other` into the cell of `self` holding its origin,
    /// re-bucketing when the grids differ.
    pub(crate) fn absorb(&mut self, other: &FlowCell) {
        for lane in other.lanes() {
            self.get_lane(lane.lane()).add(lane);
        }
        self.reads_processed += other.reads_processed;
    }

    /// Sequential reduction of independently populated shards.
    pub fn merge_all<I>(grid: GridConfig, shards: I) -> Result<FlowCell, FlowCellError>
    where
        I: IntoIterator<Item = FlowCell>,
    {
        let mut merged = FlowCell::new(grid);
        for shard in shards {
            merged.add(&shard)?;
        }
        Ok(merged)
    }

    pub fn lanes(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.values()
    }

    pub fn micro_tiles(&self) -> impl Iterator<Item = &MicroTile> {
        self.lanes().flat_map(|l| l.micro_tiles())
    }

    pub fn micro_tiles_mut(&mut self) -> impl Iterator<Item = &mut MicroTile> {
        self.lanes
            .values_mut()
            .flat_map(|l| l.tiles_mut())
            .flat_map(|t| t.micro_tiles_mut())
    }

    pub fn to_list(&self) -> Vec<&MicroTile> {
        self.micro_tiles().collect()
    }

    pub fn micro_tile_count(&self) -> usize {
        self.micro_tiles().count()
    }

    /// Recomputes the flow-cell summary from the micro-tiles.
    pub fn calc_stats(&mut self) -> FlowCellStats {
        let stats = FlowCellStats::compute(&self.to_list());
        self.reads_processed = stats.reads_processed();
        self.stats = stats;
        stats
    }

    pub fn avg_reads(&self) -> f64 {
        self.stats.avg_reads()
    }

    pub(crate) fn set_stats(&mut self, stats: FlowCellStats) {
        self.reads_processed = stats.reads_processed();
        self.stats = stats;
    }
}

impl Display for FlowCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for lane in self.lanes() {
            write!(f, "{}", lane)?;
        }
        Ok(())
    }
}
