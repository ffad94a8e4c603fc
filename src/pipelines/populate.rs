use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use bio::io::fastq;
use rayon::prelude::*;

use crate::config::QcConfig;
use crate::flowcell::{FlowCell, GridConfig, ReadObservation};
use crate::helper::barcode::ExpectedBarcodes;
use crate::helper::header::ReadLocation;
use crate::helper::io::{fastq_reader, next_fastq_chunk};
use crate::helper::utils::{log_line, new_spinner};
use crate::pipelines::{PipelineError, open_run_log, require_input, require_new_output, write_dump};

/// One shard of a populate run.
#[derive(Debug, Clone)]
pub struct Shard {
    pub flow_cell: FlowCell,
    /// Reads whose id carries no `lane:tile:x:y` location.
    pub unlocated: u64,
}

/// Reads a FASTQ file (plain or gzipped), buckets every read into its
/// micro-tile, computes stats and dumps the flow cell to `output`.
pub fn populate(
    input: &str,
    output: &str,
    config_path: Option<&str>,
    overwrite: bool,
) -> Result<(), Box<dyn Error>> {
    let output_path = Path::new(output);
    let mut logger = open_run_log(output_path)?;

    log_line(&mut logger, "Starting populate")?;
    log_line(&mut logger, &format!("Input FASTQ: {}", input))?;
    log_line(&mut logger, &format!("Output dump: {}", output))?;

    if let Err(e) = run_populate(input, output, config_path, overwrite, &mut logger) {
        log_line(&mut logger, &format!("Error running populate: {}", e))?;
        return Err(e);
    }
    log_line(&mut logger, "Populate completed")?;
    Ok(())
}

fn run_populate(
    input: &str,
    output: &str,
    config_path: Option<&str>,
    overwrite: bool,
    logger: &mut BufWriter<File>,
) -> Result<(), Box<dyn Error>> {
    require_new_output(output, overwrite)?;
    let config = QcConfig::from_optional_path(config_path)?;
    log_line(logger, &format!("Config: {}", config))?;
    let input_path = require_input(input)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
        .map_err(PipelineError::from)?;

    let grid = config.grid();
    let barcodes = config.barcodes();
    let mut flow_cell = FlowCell::new(grid);
    let mut unlocated = 0u64;
    let mut total = 0u64;

    let spinner = new_spinner("Populating flow cell");
    let mut records = fastq_reader(input_path)?.records();
    loop {
        let chunk = next_fastq_chunk(&mut records, config.chunk_size())?;
        if chunk.is_empty() {
            break;
        }
        total += chunk.len() as u64;
        let shard = pool.install(|| populate_records(&chunk, grid, &barcodes));
        flow_cell.add(&shard.flow_cell)?;
        unlocated += shard.unlocated;
        spinner.set_message(format!("Populating flow cell: {} reads", total));
    }
    spinner.finish_with_message(format!("Populated flow cell from {} reads", total));

    log_line(logger, &format!("Reads in input: {}", total))?;
    if unlocated > 0 {
        log_line(
            logger,
            &format!("WARNING: {} reads had no lane:tile:x:y location and were skipped", unlocated),
        )?;
    }

    let stats = flow_cell.calc_stats();
    log_line(
        logger,
        &format!(
            "Micro-tiles: {}, reads counted: {}, average reads per micro-tile: {:.2}",
            flow_cell.micro_tile_count(),
            stats.reads_processed(),
            stats.avg_reads()
        ),
    )?;

    write_dump(&flow_cell, output, overwrite, logger)?;
    Ok(())
}

/// Splits `records` across the current rayon pool, fills one private flow cell
/// per split and reduces them in order.
pub fn populate_records(
    records: &[fastq::Record],
    grid: GridConfig,
    barcodes: &ExpectedBarcodes,
) -> Shard {
    let splits = rayon::current_num_threads().max(1);
    let split_size = records.len().div_ceil(splits).max(1);

    let shards: Vec<Shard> = records
        .par_chunks(split_size)
        .map(|split| populate_shard(split, grid, barcodes))
        .collect();

    let mut merged = Shard {
        flow_cell: FlowCell::new(grid),
        unlocated: 0,
    };
    for shard in shards {
        // every shard shares `grid`
        merged.flow_cell.absorb(&shard.flow_cell);
        merged.unlocated += shard.unlocated;
    }
    merged
}

/// Single-threaded populate of one slice of records.
pub fn populate_shard(records: &[fastq::Record], grid: GridConfig, barcodes: &ExpectedBarcodes) -> Shard {
    let mut flow_cell = FlowCell::new(grid);
    let mut unlocated = 0;
    for record in records {
        let header = match record.desc() {
            Some(desc) => format!("{} {}", record.id(), desc),
            None => record.id().to_string(),
        };
        let Some(loc) = ReadLocation::parse(&header) else {
            unlocated += 1;
            continue;
        };

        let mut read = ReadObservation::from_fastq(record);
        if let Some(distance) = loc
            .barcode
            .as_deref()
            .and_then(|b| barcodes.nearest_distance(b))
        {
            read = read.with_barcode_distance(distance);
        }
        flow_cell.add_read(loc.lane, loc.tile, loc.x, loc.y, &read);
    }
    Shard {
        flow_cell,
        unlocated,
    }
}
