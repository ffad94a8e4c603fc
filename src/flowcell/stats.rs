use getset::{CopyGetters, Setters};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::flowcell::MicroTile;

/// Upper bound of the per-micro-tile read count needed to enter the averages.
pub const MAX_MIN_COUNT_TO_USE: u64 = 500;
/// Fraction of the mean read count a micro-tile needs to enter the averages.
pub const MIN_COUNT_FRACTION: f64 = 0.25;

// Fixed-point scales: metrics are truncated at these resolutions before averaging.
const QUALITY_SCALE: f64 = 1_000.0;
const UNIQUE_SCALE: f64 = 1_000.0;
const ERROR_FREE_SCALE: f64 = 1_000.0;
const G_SCALE: f64 = 100_000.0;

/// Flow-cell wide summary, derived from the micro-tiles by [`FlowCellStats::compute`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct FlowCellStats {
    reads_processed: u64,
    avg_reads: f64,
    min_count_to_use: u64,
    avg_quality: f64,
    std_quality: f64,
    avg_unique: f64,
    std_unique: f64,
    avg_error_free: f64,
    std_error_free: f64,
    avg_g: f64,
    std_g: f64,
}

impl FlowCellStats {
    pub fn compute(micro_tiles: &[&MicroTile]) -> Self {
        let reads_processed: u64 = micro_tiles.iter().map(|mt| mt.read_count()).sum();
        let avg_reads = if micro_tiles.is_empty() {
            0.0
        } else {
            reads_processed as f64 / micro_tiles.len() as f64
        };
        let min_count_to_use = MAX_MIN_COUNT_TO_USE.min((avg_reads * MIN_COUNT_FRACTION) as u64);

        let used: Vec<&MicroTile> = micro_tiles
            .iter()
            .copied()
            .filter(|mt| mt.read_count() >= min_count_to_use)
            .collect();

        let scaled = |f: fn(&MicroTile) -> f64, scale: f64| -> Vec<i64> {
            used.iter().map(|mt| (f(mt) * scale) as i64).collect()
        };

        let (avg_quality, std_quality) =
            scaled_mean_std(&scaled(MicroTile::average_quality, QUALITY_SCALE), QUALITY_SCALE);
        let (avg_unique, std_unique) =
            scaled_mean_std(&scaled(MicroTile::unique_percent, UNIQUE_SCALE), UNIQUE_SCALE);
        let (avg_error_free, std_error_free) = scaled_mean_std(
            &scaled(MicroTile::percent_error_free, ERROR_FREE_SCALE),
            ERROR_FREE_SCALE,
        );
        let (avg_g, std_g) = scaled_mean_std(&scaled(MicroTile::average_g, G_SCALE), G_SCALE);

        FlowCellStats {
            reads_processed,
            avg_reads,
            min_count_to_use,
            avg_quality,
            std_quality,
            avg_unique,
            std_unique,
            avg_error_free,
            std_error_free,
            avg_g,
            std_g,
        }
    }
}

/// Mean and population standard deviation of fixed-point values, unscaled.
fn scaled_mean_std(values: &[i64], scale: f64) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let data: Vec<f64> = values.iter().map(|&v| v as f64).collect();
    let mean = data.iter().mean();
    let std = data.iter().population_std_dev();
    (mean / scale, std / scale)
}
