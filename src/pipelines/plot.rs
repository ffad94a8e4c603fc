use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::QcConfig;
use crate::helper::plot::plot_lane_heatmap;
use crate::helper::utils::{log_line, open_log};
use crate::pipelines::{RUN_LOG_NAME, load_dump};

pub fn heatmap_path(output_dir: &Path, lane: u32) -> PathBuf {
    output_dir.join(format!("lane_{}_quality_heatmap.png", lane))
}

/// Writes one quality heatmap per lane of a dump into `output_dir`.
pub fn plot(input: &str, output_dir: &str, config_path: Option<&str>) -> Result<(), Box<dyn Error>> {
    let out = Path::new(output_dir);
    fs::create_dir_all(out)?;
    let mut logger = open_log(&out.join(RUN_LOG_NAME))?;
    log_line(&mut logger, "Starting plot")?;

    let config = QcConfig::from_optional_path(config_path)?;
    let fc = load_dump(input, config.grid(), &mut logger)?;
    for lane in fc.lanes() {
        let path = heatmap_path(out, lane.lane());
        plot_lane_heatmap(lane, &path)?;
        log_line(&mut logger, &format!("Wrote heatmap for lane {}: {}", lane.lane(), path.display()))?;
    }
    log_line(&mut logger, "Plot completed")?;
    Ok(())
}
