use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use thiserror::Error;

use crate::flowcell::{FlowCell, FlowCellError, GridConfig};
use crate::helper::utils::{log_line, open_log};

pub mod mark;
pub mod merge;
pub mod plot;
pub mod populate;
pub mod stats;
pub mod widen;

pub const RUN_LOG_NAME: &str = "run_log.txt";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input path {0} does not exist")]
    InputNotFound(String),

    #[error("No input dumps given")]
    NoInputs,

    #[error("No widen target: pass --target or set target_reads in the config")]
    MissingTarget,

    #[error("Could not read config file {0}: {1}")]
    ConfigRead(String, #[source] std::io::Error),

    #[error("Invalid config file {0}: {1}")]
    ConfigParse(String, #[source] serde_json::Error),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    FlowCell(#[from] FlowCellError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run log kept in the directory of `output`.
pub fn open_run_log(output: &Path) -> std::io::Result<BufWriter<File>> {
    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    open_log(&dir.join(RUN_LOG_NAME))
}

pub fn require_input(input: &str) -> Result<&Path, PipelineError> {
    let path = Path::new(input);
    if !path.exists() {
        return Err(PipelineError::InputNotFound(input.to_string()));
    }
    Ok(path)
}

/// Fails early when `output` exists and may not be replaced.
pub fn require_new_output(output: &str, overwrite: bool) -> Result<(), PipelineError> {
    if !overwrite && Path::new(output).exists() {
        return Err(FlowCellError::OutputExists(output.to_string()).into());
    }
    Ok(())
}

/// Loads a dump and logs what came in.
pub fn load_dump(
    input: &str,
    defaults: GridConfig,
    logger: &mut BufWriter<File>,
) -> Result<FlowCell, PipelineError> {
    let path = require_input(input)?;
    log_line(logger, &format!("Loading dump: {}", input))?;
    let fc = FlowCell::load(path, defaults)?;
    log_line(
        logger,
        &format!(
            "Loaded {} micro-tiles on a {} grid, {} reads",
            fc.micro_tile_count(),
            fc.grid(),
            fc.reads_processed()
        ),
    )?;
    Ok(fc)
}

/// Dumps `fc` to `output` and logs it.
pub fn write_dump(
    fc: &FlowCell,
    output: &str,
    overwrite: bool,
    logger: &mut BufWriter<File>,
) -> Result<(), PipelineError> {
    fc.dump(Path::new(output), overwrite)?;
    log_line(
        logger,
        &format!("Wrote {} micro-tiles to {}", fc.micro_tile_count(), output),
    )?;
    Ok(())
}
