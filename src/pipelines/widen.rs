use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::config::QcConfig;
use crate::flowcell::Widened;
use crate::helper::utils::log_line;
use crate::pipelines::{PipelineError, load_dump, open_run_log, require_new_output, write_dump};

/// Coarsens the grid of a dump until micro-tiles average `target` reads.
/// The target falls back to `target_reads` from the config.
pub fn widen(
    input: &str,
    output: &str,
    target: Option<u64>,
    config_path: Option<&str>,
    overwrite: bool,
) -> Result<(), Box<dyn Error>> {
    let mut logger = open_run_log(Path::new(output))?;
    log_line(&mut logger, "Starting widen")?;
    require_new_output(output, overwrite)?;

    let widened = match run_widen(input, target, config_path, &mut logger) {
        Ok(w) => w,
        Err(e) => {
            log_line(&mut logger, &format!("Error running widen: {}", e))?;
            return Err(e.into());
        }
    };
    write_dump(&widened.flow_cell, output, overwrite, &mut logger)?;
    log_line(&mut logger, "Widen completed")?;
    Ok(())
}

pub fn run_widen(
    input: &str,
    target: Option<u64>,
    config_path: Option<&str>,
    logger: &mut BufWriter<File>,
) -> Result<Widened, PipelineError> {
    let config = QcConfig::from_optional_path(config_path)?;
    let target = target
        .or(config.target_reads)
        .ok_or(PipelineError::MissingTarget)?;
    log_line(logger, &format!("Target average reads per micro-tile: {}", target))?;

    let fc = load_dump(input, config.grid(), logger)?;
    let from = fc.grid();
    let widened = fc.widen(target);

    let message = format!(
        "Widen stopped after {} steps ({}): grid {} -> {}, average reads per micro-tile {:.2}",
        widened.steps,
        widened.stop,
        from,
        widened.flow_cell.grid(),
        widened.flow_cell.avg_reads()
    );
    if widened.stop.is_warning() {
        log_line(logger, &format!("WARNING: {}", message))?;
        eprintln!("WARNING: {}", message);
    } else {
        log_line(logger, &message)?;
    }
    Ok(widened)
}
