use std::error::Error;
use std::path::Path;

use rayon::prelude::*;

use crate::config::QcConfig;
use crate::flowcell::FlowCell;
use crate::helper::utils::{log_line, new_spinner};
use crate::pipelines::{PipelineError, open_run_log, require_input, require_new_output, write_dump};

/// Loads every dump in `inputs`, merges them in the given order and writes the
/// result with fresh stats. All dumps must share one grid.
pub fn merge(
    inputs: &[String],
    output: &str,
    config_path: Option<&str>,
    overwrite: bool,
) -> Result<(), Box<dyn Error>> {
    let mut logger = open_run_log(Path::new(output))?;
    log_line(&mut logger, "Starting merge")?;
    log_line(&mut logger, &format!("Input dumps: {}", inputs.join(", ")))?;
    require_new_output(output, overwrite)?;

    let merged = match merge_dumps(inputs, config_path) {
        Ok(fc) => fc,
        Err(e) => {
            log_line(&mut logger, &format!("Error running merge: {}", e))?;
            return Err(e.into());
        }
    };
    log_line(
        &mut logger,
        &format!(
            "Merged {} dumps: {} micro-tiles, {} reads, average reads per micro-tile {:.2}",
            inputs.len(),
            merged.micro_tile_count(),
            merged.reads_processed(),
            merged.avg_reads()
        ),
    )?;
    write_dump(&merged, output, overwrite, &mut logger)?;
    log_line(&mut logger, "Merge completed")?;
    Ok(())
}

pub fn merge_dumps(inputs: &[String], config_path: Option<&str>) -> Result<FlowCell, PipelineError> {
    if inputs.is_empty() {
        return Err(PipelineError::NoInputs);
    }
    let defaults = QcConfig::from_optional_path(config_path)?.grid();
    for input in inputs {
        require_input(input)?;
    }

    let spinner = new_spinner(&format!("Loading {} dumps", inputs.len()));
    let loaded: Result<Vec<FlowCell>, _> = inputs
        .par_iter()
        .map(|input| FlowCell::load(Path::new(input), defaults))
        .collect();
    spinner.finish_and_clear();
    let shards = loaded?;

    let grid = shards[0].grid();
    let mut merged = FlowCell::merge_all(grid, shards)?;
    merged.calc_stats();
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flowcell::{GridConfig, ReadObservation};

    fn write_shard(dir: &Path, name: &str, grid: GridConfig, offset: u32) -> String {
        let mut fc = FlowCell::new(grid);
        let read = ReadObservation::new(b"ACGTAC", 32.0, 80.0);
        for i in 0..30u32 {
            fc.add_read(1, 1101, (i * 97 + offset) % 2000, (i * 37) % 2000, &read);
        }
        fc.calc_stats();
        let path = dir.join(name);
        fc.dump(&path, true).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_merge_dumps() {
        let dir = std::env::temp_dir().join(format!("flowcell_qc_merge_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let grid = GridConfig::new(250, 250);
        let a = write_shard(&dir, "a.tsv", grid, 0);
        let b = write_shard(&dir, "b.tsv.gz", grid, 11);
        let other = write_shard(&dir, "c.tsv", GridConfig::new(500, 250), 0);

        let merged = merge_dumps(&[a.clone(), b.clone()], None).unwrap();
        assert_eq!(merged.grid().x_size(), 250);
        assert_eq!(merged.reads_processed(), 60);
        assert_eq!(merged.stats().reads_processed(), 60);

        let err = merge_dumps(&[a.clone(), other], None).unwrap_err();
        assert!(matches!(err, PipelineError::FlowCell(_)));
        assert!(matches!(merge_dumps(&[], None).unwrap_err(), PipelineError::NoInputs));

        let output = dir.join("merged.tsv");
        merge(&[a, b], output.to_str().unwrap(), None, true).unwrap();
        let reloaded = FlowCell::load(&output, GridConfig::default()).unwrap();
        assert_eq!(reloaded.reads_processed(), 60);
        std::fs::remove_dir_all(dir).unwrap();
    }
}
