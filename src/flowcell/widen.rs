use std::fmt::Display;

use crate::flowcell::{FlowCell, GridConfig};

/// Upper bound on grid doublings in one search.
pub const MAX_WIDEN_STEPS: usize = 32;

/// Why a widening search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidenStop {
    /// No reads were processed; nothing to widen.
    NoReads,
    /// Fewer reads in total than the target, so no grid can reach it.
    TooFewReads,
    /// The per-micro-tile average already met the target.
    AlreadyWide,
    TargetReached,
    /// The last doubling did not raise the average and was undone.
    RolledBack,
    /// Step limit hit, or the grid cannot double any further.
    StepLimit,
}

impl WidenStop {
    /// Stops that leave the input untouched and deserve a warning in the run log.
    pub fn is_warning(&self) -> bool {
        matches!(self, WidenStop::NoReads | WidenStop::TooFewReads)
    }
}

impl Display for WidenStop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            WidenStop::NoReads => "no reads processed, flow cell left unchanged",
            WidenStop::TooFewReads => "fewer reads than the target, flow cell left unchanged",
            WidenStop::AlreadyWide => "average reads already at target",
            WidenStop::TargetReached => "target reached",
            WidenStop::RolledBack => "average stopped growing, last step rolled back",
            WidenStop::StepLimit => "step limit reached",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone)]
pub struct Widened {
    pub flow_cell: FlowCell,
    /// Doublings kept in `flow_cell`.
    pub steps: usize,
    pub stop: WidenStop,
}

impl FlowCell {
    /// Searches for the finest grid whose average reads per micro-tile reaches
    /// `target_reads`, doubling the smaller grid dimension at each step.
    ///
    /// The returned flow cell has fresh stats and an area no smaller than the input.
    pub fn widen(mut self, target_reads: u64) -> Widened {
        let stats = self.calc_stats();
        let target = target_reads as f64;

        let early = if stats.reads_processed() == 0 {
            Some(WidenStop::NoReads)
        } else if stats.avg_reads() >= target {
            Some(WidenStop::AlreadyWide)
        } else if stats.reads_processed() < target_reads {
            Some(WidenStop::TooFewReads)
        } else {
            None
        };
        if let Some(stop) = early {
            return Widened {
                flow_cell: self,
                steps: 0,
                stop,
            };
        }

        let mut best = self;
        let mut steps = 0;
        while steps < MAX_WIDEN_STEPS {
            let Some(next_grid) = best.grid().widened() else {
                break;
            };
            let mut next = best.rebucket(next_grid);
            next.calc_stats();
            if next.avg_reads() <= best.avg_reads() {
                return Widened {
                    flow_cell: best,
                    steps,
                    stop: WidenStop::RolledBack,
                };
            }
            best = next;
            steps += 1;
            if best.avg_reads() >= target {
                return Widened {
                    flow_cell: best,
                    steps,
                    stop: WidenStop::TargetReached,
                };
            }
        }

        Widened {
            flow_cell: best,
            steps,
            stop: WidenStop::StepLimit,
        }
    }

    /// A new flow cell on `grid` holding every micro-tile of `self`, bucketed by origin.
    pub fn rebucket(&self, grid: GridConfig) -> FlowCell {
        let mut next = FlowCell::new(grid);
        next.absorb(self);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flowcell::read_facts::ReadObservation;

    fn spread(grid: GridConfig, reads_per_point: usize, points: &[(u32, u32)]) -> FlowCell {
        let mut fc = FlowCell::new(grid);
        let read = ReadObservation::new(b"ACGTACGT", 30.0, 90.0);
        for &(x, y) in points {
            for _ in 0..reads_per_point {
                fc.add_read(1, 1101, x, y, &read);
            }
        }
        fc
    }

    fn even_points(step: u32, extent: u32) -> Vec<(u32, u32)> {
        let mut points = Vec::new();
        for x in (0..extent).step_by(step as usize) {
            for y in (0..extent).step_by(step as usize) {
                points.push((x, y));
            }
        }
        points
    }

    #[test]
    fn test_widen_below_average_is_noop() {
        let fc = spread(GridConfig::default(), 20, &even_points(500, 2000));
        let widened = fc.clone().widen(5);
        assert_eq!(widened.stop, WidenStop::AlreadyWide);
        assert_eq!(widened.steps, 0);
        assert_eq!(widened.flow_cell.grid(), fc.grid());
        assert_eq!(widened.flow_cell.micro_tile_count(), fc.micro_tile_count());
    }

    #[test]
    fn test_widen_without_reads_warns() {
        let widened = FlowCell::default().widen(100);
        assert_eq!(widened.stop, WidenStop::NoReads);
        assert!(widened.stop.is_warning());
        assert_eq!(widened.flow_cell.grid(), GridConfig::default());
    }

    #[test]
    fn test_widen_reaches_target() {
        // 16 cells of 20 reads on a 500x500 grid over a 2000x2000 tile
        let fc = spread(GridConfig::default(), 20, &even_points(500, 2000));
        let widened = fc.widen(80);
        assert_eq!(widened.stop, WidenStop::TargetReached);
        assert_eq!(widened.steps, 2);
        let grid = widened.flow_cell.grid();
        assert_eq!((grid.x_size(), grid.y_size()), (1000, 1000));
        assert_eq!(widened.flow_cell.micro_tile_count(), 4);
        assert!((widened.flow_cell.avg_reads() - 80.0).abs() < 1e-9);
        assert_eq!(widened.flow_cell.reads_processed(), 320);
    }

    #[test]
    fn test_widen_is_monotonic() {
        let points: Vec<(u32, u32)> = (0..40u32).map(|i| (i * 97 % 3000, i * 211 % 3000)).collect();
        let fc = spread(GridConfig::new(200, 300), 3, &points);
        let input_area = fc.grid().area();
        let input_reads = fc.reads_processed();
        let mut input = fc.clone();
        let input_avg = input.calc_stats().avg_reads();

        let widened = fc.widen(50);
        assert!(widened.flow_cell.avg_reads() >= input_avg);
        assert!(widened.flow_cell.grid().area() >= input_area);
        assert_eq!(widened.flow_cell.reads_processed(), input_reads);
        let counted: u64 = widened.flow_cell.micro_tiles().map(|mt| mt.read_count()).sum();
        assert_eq!(counted, input_reads);
    }

    #[test]
    fn test_widen_rolls_back_when_average_stalls() {
        // micro-tiles in different tiles never share a coarser cell
        let mut fc = FlowCell::default();
        let read = ReadObservation::new(b"ACGT", 30.0, 90.0);
        for _ in 0..10 {
            fc.add_read(1, 1101, 10, 10, &read);
            fc.add_read(1, 1102, 10, 10, &read);
        }
        let widened = fc.widen(15);
        assert_eq!(widened.stop, WidenStop::RolledBack);
        assert_eq!(widened.steps, 0);
        assert_eq!(widened.flow_cell.grid(), GridConfig::default());
        assert!((widened.flow_cell.avg_reads() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_widen_with_too_few_reads() {
        let fc = spread(GridConfig::default(), 10, &[(10, 10), (900, 900)]);
        let widened = fc.widen(30);
        assert_eq!(widened.stop, WidenStop::TooFewReads);
        assert!(widened.stop.is_warning());
    }
}
