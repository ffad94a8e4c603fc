use std::error::Error;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::QcConfig;
use crate::flowcell::{FlowCell, FlowCellStats, GridConfig};
use crate::helper::json::write_json_pretty;
use crate::helper::utils::log_line;
use crate::pipelines::{load_dump, open_run_log};

/// Flow-cell summary written by the `stats` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub grid: GridConfig,
    pub lanes: usize,
    pub micro_tiles: usize,
    pub discarded_micro_tiles: usize,
    pub stats: FlowCellStats,
}

impl StatsReport {
    /// Recomputes the stats of `fc` and summarizes it.
    pub fn from_flow_cell(fc: &mut FlowCell) -> Self {
        let stats = fc.calc_stats();
        StatsReport {
            grid: fc.grid(),
            lanes: fc.lanes().count(),
            micro_tiles: fc.micro_tile_count(),
            discarded_micro_tiles: fc.micro_tiles().filter(|mt| mt.discard() > 0).count(),
            stats,
        }
    }
}

/// Prints the JSON report of a dump, or writes it to `output` when given.
pub fn stats(input: &str, output: Option<&str>, config_path: Option<&str>) -> Result<(), Box<dyn Error>> {
    let log_anchor = output.unwrap_or(input);
    let mut logger = open_run_log(Path::new(log_anchor))?;
    log_line(&mut logger, "Starting stats")?;

    let config = QcConfig::from_optional_path(config_path)?;
    let mut fc = load_dump(input, config.grid(), &mut logger)?;
    let report = StatsReport::from_flow_cell(&mut fc);

    match output {
        Some(path) => {
            write_json_pretty(&report, Path::new(path))?;
            log_line(&mut logger, &format!("Wrote stats report to {}", path))?;
        }
        None => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    log_line(&mut logger, "Stats completed")?;
    Ok(())
}
