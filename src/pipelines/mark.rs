use std::error::Error;
use std::path::Path;

use crate::config::QcConfig;
use crate::helper::utils::log_line;
use crate::pipelines::{load_dump, open_run_log, require_new_output, write_dump};

/// Flags outlier micro-tiles of a dump with the configured discard policy.
pub fn mark(
    input: &str,
    output: &str,
    config_path: Option<&str>,
    overwrite: bool,
) -> Result<(), Box<dyn Error>> {
    let mut logger = open_run_log(Path::new(output))?;
    log_line(&mut logger, "Starting mark")?;
    require_new_output(output, overwrite)?;

    let config = QcConfig::from_optional_path(config_path)?;
    log_line(&mut logger, &format!("Discard policy: {:?}", config.discard))?;
    let mut fc = load_dump(input, config.grid(), &mut logger)?;

    let marked = config.discard.mark_discards(&mut fc);
    let total = fc.micro_tiles().filter(|mt| mt.discard() > 0).count();
    log_line(
        &mut logger,
        &format!(
            "Marked {} new micro-tiles for discard ({} of {} now discarded)",
            marked,
            total,
            fc.micro_tile_count()
        ),
    )?;

    write_dump(&fc, output, overwrite, &mut logger)?;
    log_line(&mut logger, "Mark completed")?;
    Ok(())
}
