use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use crate::flowcell::{Lane, MicroTile};

// blank columns between neighbouring tiles
const TILE_GAP_FRACTION: f64 = 0.05;

/// Placement of one micro-tile on the lane canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatCell {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    pub quality: f64,
    pub discarded: bool,
}

/// Lays the tiles of a lane side by side, in tile order, and returns every
/// micro-tile with its canvas rectangle plus the canvas extent `(width, height)`.
pub fn lane_layout(lane: &Lane) -> (Vec<HeatCell>, (f64, f64)) {
    let micro_tiles: Vec<&MicroTile> = lane.micro_tiles().collect();
    let tile_width = micro_tiles.iter().map(|mt| mt.x2() + 1).max().unwrap_or(1) as f64;
    let height = micro_tiles.iter().map(|mt| mt.y2() + 1).max().unwrap_or(1) as f64;
    let stride = tile_width * (1.0 + TILE_GAP_FRACTION);

    let mut cells = Vec::with_capacity(micro_tiles.len());
    let mut width = 0.0f64;
    for (slot, tile) in lane.tiles().enumerate() {
        let offset = slot as f64 * stride;
        for mt in tile.micro_tiles() {
            cells.push(HeatCell {
                x0: offset + mt.x1() as f64,
                x1: offset + mt.x2() as f64 + 1.0,
                y0: mt.y1() as f64,
                y1: mt.y2() as f64 + 1.0,
                quality: mt.average_quality(),
                discarded: mt.discard() > 0,
            });
        }
        width = offset + tile_width;
    }
    (cells, (width.max(1.0), height))
}

/// Red for the lowest quality in range, green for the highest.
pub fn quality_color(quality: f64, min: f64, max: f64) -> HSLColor {
    let t = if max > min {
        ((quality - min) / (max - min)).clamp(0.0, 1.0)
    } else {
        1.0
    };
    HSLColor(t / 3.0, 0.85, 0.5)
}

pub fn plot_lane_heatmap(lane: &Lane, output_path: &Path) -> Result<(), Box<dyn Error>> {
    let (cells, (width, height)) = lane_layout(lane);
    let (min_q, max_q) = cells
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), c| (lo.min(c.quality), hi.max(c.quality)));

    let root = BitMapBackend::new(output_path, (1600, 900)).into_drawing_area();
    root.fill(&WHITE)?;

    let caption = format!(
        "Lane {}: average quality per micro-tile ({:.1} to {:.1})",
        lane.lane(),
        if cells.is_empty() { 0.0 } else { min_q },
        if cells.is_empty() { 0.0 } else { max_q },
    );
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 36).into_font())
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..width, 0f64..height)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Tiles (left to right), x within tile")
        .y_desc("y")
        .axis_desc_style(("sans-serif", 20))
        .x_label_formatter(&|x| format!("{:.0}", x))
        .y_label_formatter(&|y| format!("{:.0}", y))
        .draw()?;

    chart.draw_series(cells.iter().map(|c| {
        Rectangle::new(
            [(c.x0, c.y0), (c.x1, c.y1)],
            quality_color(c.quality, min_q, max_q).filled(),
        )
    }))?;

    chart.draw_series(
        cells
            .iter()
            .filter(|c| c.discarded)
            .map(|c| Rectangle::new([(c.x0, c.y0), (c.x1, c.y1)], BLACK.stroke_width(2))),
    )?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flowcell::GridConfig;
    use crate::flowcell::read_facts::ReadObservation;

    #[test]
    fn test_lane_layout_places_tiles_side_by_side() {
        let mut lane = Lane::new(1, GridConfig::new(100, 100));
        let read = ReadObservation::new(b"ACGT", 30.0, 90.0);
        lane.get_micro_tile(1101, 150, 50).add_read(&read, 25);
        lane.get_micro_tile(1102, 10, 250).add_read(&read, 25);
        lane.get_micro_tile(1102, 10, 250).discard = 1;

        let (cells, (width, height)) = lane_layout(&lane);
        assert_eq!(cells.len(), 2);
        assert_eq!(height, 300.0);
        assert_eq!(cells[0].x0, 100.0);
        assert!(!cells[0].discarded);
        // second tile starts one stride to the right
        assert!((cells[1].x0 - 210.0).abs() < 1e-9);
        assert!(cells[1].discarded);
        assert!((width - 410.0).abs() < 1e-9);
    }

    #[test]
    fn test_quality_color_range() {
        let HSLColor(low, _, _) = quality_color(10.0, 10.0, 40.0);
        let HSLColor(high, _, _) = quality_color(40.0, 10.0, 40.0);
        let HSLColor(flat, _, _) = quality_color(25.0, 25.0, 25.0);
        assert_eq!(low, 0.0);
        assert!((high - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(flat, high);
    }
}
