use serde::{Deserialize, Serialize};

use crate::flowcell::{FlowCell, FlowCellStats, MicroTile};

/// Thresholds for flagging micro-tiles that stand out from the rest of the flow cell.
///
/// Deviations are counted in flow-cell standard deviations, and only in the
/// direction that signals a bad tile: low quality, high uniqueness, low
/// error-free percentage, high G content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscardPolicy {
    pub quality_deviations: f64,
    pub unique_deviations: f64,
    pub error_free_deviations: f64,
    pub g_deviations: f64,
    /// Poly-G read fraction above which a tile is discarded regardless of the averages.
    pub max_poly_g_fraction: f64,
}

impl Default for DiscardPolicy {
    fn default() -> Self {
        DiscardPolicy {
            quality_deviations: 2.4,
            unique_deviations: 1.5,
            error_free_deviations: 3.0,
            g_deviations: 3.0,
            max_poly_g_fraction: 0.2,
        }
    }
}

impl DiscardPolicy {
    /// Recomputes stats and sets `discard = 1` on every outlier micro-tile with
    /// enough reads. Existing marks are never cleared. Returns the number of
    /// newly marked micro-tiles.
    pub fn mark_discards(&self, fc: &mut FlowCell) -> usize {
        let stats = fc.calc_stats();
        let mut marked = 0;
        for mt in fc.micro_tiles_mut() {
            if mt.discard > 0 || mt.read_count() < stats.min_count_to_use() {
                continue;
            }
            if self.is_outlier(mt, &stats) {
                mt.discard = 1;
                marked += 1;
            }
        }
        marked
    }

    pub fn is_outlier(&self, mt: &MicroTile, stats: &FlowCellStats) -> bool {
        let low = |value: f64, avg: f64, std: f64, k: f64| std > 0.0 && avg - value > k * std;
        let high = |value: f64, avg: f64, std: f64, k: f64| std > 0.0 && value - avg > k * std;

        low(
            mt.average_quality(),
            stats.avg_quality(),
            stats.std_quality(),
            self.quality_deviations,
        ) || high(
            mt.unique_percent(),
            stats.avg_unique(),
            stats.std_unique(),
            self.unique_deviations,
        ) || low(
            mt.percent_error_free(),
            stats.avg_error_free(),
            stats.std_error_free(),
            self.error_free_deviations,
        ) || high(mt.average_g(), stats.avg_g(), stats.std_g(), self.g_deviations)
            || mt.poly_g_fraction() > self.max_poly_g_fraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flowcell::read_facts::ReadObservation;
    use crate::flowcell::GridConfig;

    fn populated(bad_quality: f64) -> FlowCell {
        let mut fc = FlowCell::new(GridConfig::new(100, 100));
        for cell in 0..20u32 {
            let quality = if cell == 7 { bad_quality } else { 30.0 + (cell % 3) as f64 };
            let read = ReadObservation::new(b"ACGTACGTAC", quality, 90.0);
            for _ in 0..50 {
                fc.add_read(1, 1101, cell * 100 + 5, 5, &read);
            }
        }
        fc
    }

    #[test]
    fn test_marks_low_quality_outlier() {
        let mut fc = populated(10.0);
        let marked = DiscardPolicy::default().mark_discards(&mut fc);
        assert_eq!(marked, 1);
        let bad = fc.find_micro_tile(1, 1101, 705, 5).unwrap();
        assert_eq!(bad.discard(), 1);
        assert_eq!(fc.find_micro_tile(1, 1101, 5, 5).unwrap().discard(), 0);

        // marks stick and are not counted twice
        assert_eq!(DiscardPolicy::default().mark_discards(&mut fc), 0);
        assert_eq!(fc.find_micro_tile(1, 1101, 705, 5).unwrap().discard(), 1);
    }

    #[test]
    fn test_high_quality_is_not_an_outlier() {
        let mut fc = populated(60.0);
        assert_eq!(DiscardPolicy::default().mark_discards(&mut fc), 0);
    }

    #[test]
    fn test_poly_g_ceiling() {
        let mut fc = FlowCell::new(GridConfig::new(100, 100).with_min_poly_g(5));
        let clean = ReadObservation::new(b"ACGTACGTAC", 30.0, 90.0);
        let poly_g = ReadObservation::new(b"AGGGGGGGGC", 30.0, 90.0);
        for _ in 0..10 {
            fc.add_read(1, 1101, 5, 5, &clean);
            fc.add_read(1, 1101, 105, 5, &poly_g);
        }
        let policy = DiscardPolicy {
            g_deviations: 100.0,
            ..Default::default()
        };
        assert_eq!(policy.mark_discards(&mut fc), 1);
        assert_eq!(fc.find_micro_tile(1, 1101, 105, 5).unwrap().discard(), 1);
    }

    #[test]
    fn test_policy_deserializes_with_defaults() {
        let policy: DiscardPolicy = serde_json::from_str(r#"{"quality_deviations": 2.0}"#).unwrap();
        assert_eq!(policy.quality_deviations, 2.0);
        assert_eq!(policy.unique_deviations, 1.5);
    }
}
