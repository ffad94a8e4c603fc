use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

use csv::{QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};

use crate::flowcell::micro_tile::DUMP_COLUMNS;
use crate::flowcell::stats::{MAX_MIN_COUNT_TO_USE, MIN_COUNT_FRACTION};
use crate::flowcell::{FlowCell, FlowCellError, FlowCellStats, GridConfig, MicroTile};
use crate::helper::io::{OutputStream, open_reader};

type Result<T> = std::result::Result<T, FlowCellError>;

// MARK: dump

impl FlowCell {
    /// Writes the header block and every micro-tile row to `path` (gzipped for `.gz`).
    pub fn dump(&self, path: &Path, overwrite: bool) -> Result<()> {
        if !overwrite && path.exists() {
            return Err(FlowCellError::OutputExists(path.display().to_string()));
        }
        let stream = self.write_to(OutputStream::create(path)?)?;
        stream.finish()?;
        Ok(())
    }

    /// Serializes the flow cell into `writer` and hands the writer back.
    ///
    /// Header stats are computed from the micro-tiles being written, so they
    /// always describe the rows, whether or not `calc_stats` ran first.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<W> {
        let mut wtr = WriterBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .has_headers(false)
            .quote_style(QuoteStyle::Never)
            .from_writer(writer);

        let micro_tiles = self.to_list();
        let stats = FlowCellStats::compute(&micro_tiles);
        let grid = self.grid();
        let header: [(&str, String); 12] = [
            ("#xSize", grid.x_size().to_string()),
            ("#ySize", grid.y_size().to_string()),
            ("#reads", stats.reads_processed().to_string()),
            ("#avgReads", stats.avg_reads().to_string()),
            ("#avgQuality", stats.avg_quality().to_string()),
            ("#avgUnique", stats.avg_unique().to_string()),
            ("#avgErrorFree", stats.avg_error_free().to_string()),
            ("#avgG", stats.avg_g().to_string()),
            ("#stdQuality", stats.std_quality().to_string()),
            ("#stdUnique", stats.std_unique().to_string()),
            ("#stdErrorFree", stats.std_error_free().to_string()),
            ("#stdG", stats.std_g().to_string()),
        ];
        for (key, value) in header.iter() {
            wtr.write_record([*key, value.as_str()])?;
        }

        let mut columns: Vec<String> = DUMP_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns[0] = format!("#{}", columns[0]);
        wtr.write_record(&columns)?;

        for mt in micro_tiles {
            wtr.write_record(mt.to_record())?;
        }
        wtr.flush()?;
        Ok(wtr.into_inner().map_err(|e| e.into_error())?)
    }

    pub fn to_dump_string(&self) -> Result<String> {
        let bytes = self.write_to(Vec::new())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

// MARK: load

impl FlowCell {
    /// Loads a dump. Grid sizes come from the `#xSize`/`#ySize` headers, other
    /// grid settings from `defaults`.
    pub fn load(path: &Path, defaults: GridConfig) -> Result<FlowCell> {
        FlowCell::from_reader(open_reader(path)?, defaults)
    }

    pub fn from_reader<R: Read>(reader: R, defaults: GridConfig) -> Result<FlowCell> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut grid = defaults;
        let mut header = LoadedHeader::default();
        let mut flow_cell: Option<FlowCell> = None;

        for result in rdr.records() {
            let record = result?;
            let line = record.position().map_or(0, |p| p.line());
            let first = record.get(0).unwrap_or("").trim();
            if first.is_empty() {
                continue;
            }

            if let Some(key) = first.strip_prefix('#') {
                let value = record.get(1).unwrap_or("").trim();
                let is_grid_key = key == "xSize" || key == "ySize";
                if is_grid_key && flow_cell.is_some() {
                    return Err(FlowCellError::HeaderAfterData {
                        line,
                        key: key.to_string(),
                    });
                }
                header.apply(key, value, &mut grid, line)?;
                continue;
            }

            let fc = flow_cell.get_or_insert_with(|| FlowCell::new(grid));
            load_row(fc, &record, line)?;
        }

        let mut fc = flow_cell.unwrap_or_else(|| FlowCell::new(grid));
        let stats = header.into_stats(&fc);
        fc.set_stats(stats);
        Ok(fc)
    }
}

#[derive(Debug, Default)]
struct LoadedHeader {
    reads: Option<u64>,
    avg_reads: Option<f64>,
    avg_quality: f64,
    avg_unique: f64,
    avg_error_free: f64,
    avg_g: f64,
    std_quality: f64,
    std_unique: f64,
    std_error_free: f64,
    std_g: f64,
}

impl LoadedHeader {
    fn apply(&mut self, key: &str, value: &str, grid: &mut GridConfig, line: u64) -> Result<()> {
        match key {
            "xSize" => {
                let x_size = parse_header(value, "xSize", line)?;
                *grid = resize(grid, x_size, grid.y_size(), "xSize", value, line)?;
            }
            "ySize" => {
                let y_size = parse_header(value, "ySize", line)?;
                *grid = resize(grid, grid.x_size(), y_size, "ySize", value, line)?;
            }
            "reads" => self.reads = Some(parse_header(value, "reads", line)?),
            "avgReads" => self.avg_reads = Some(parse_header(value, "avgReads", line)?),
            "avgQuality" => self.avg_quality = parse_header(value, "avgQuality", line)?,
            "avgUnique" => self.avg_unique = parse_header(value, "avgUnique", line)?,
            "avgErrorFree" => self.avg_error_free = parse_header(value, "avgErrorFree", line)?,
            "avgG" => self.avg_g = parse_header(value, "avgG", line)?,
            "stdQuality" => self.std_quality = parse_header(value, "stdQuality", line)?,
            "stdUnique" => self.std_unique = parse_header(value, "stdUnique", line)?,
            "stdErrorFree" => self.std_error_free = parse_header(value, "stdErrorFree", line)?,
            "stdG" => self.std_g = parse_header(value, "stdG", line)?,
            // column header line and unknown keys
            _ => {}
        }
        Ok(())
    }

    /// Header values win; missing read totals are recounted from the rows.
    fn into_stats(self, fc: &FlowCell) -> FlowCellStats {
        let reads = self
            .reads
            .unwrap_or_else(|| fc.micro_tiles().map(|mt| mt.read_count()).sum());
        let avg_reads = self.avg_reads.unwrap_or_else(|| {
            let count = fc.micro_tile_count();
            if count == 0 {
                0.0
            } else {
                reads as f64 / count as f64
            }
        });
        let mut stats = FlowCellStats::default();
        stats
            .set_reads_processed(reads)
            .set_avg_reads(avg_reads)
            .set_min_count_to_use(MAX_MIN_COUNT_TO_USE.min((avg_reads * MIN_COUNT_FRACTION) as u64))
            .set_avg_quality(self.avg_quality)
            .set_std_quality(self.std_quality)
            .set_avg_unique(self.avg_unique)
            .set_std_unique(self.std_unique)
            .set_avg_error_free(self.avg_error_free)
            .set_std_error_free(self.std_error_free)
            .set_avg_g(self.avg_g)
            .set_std_g(self.std_g);
        stats
    }
}

/// `grid` with new sizes; a zero size is reported against its header line.
fn resize(
    grid: &GridConfig,
    x_size: u32,
    y_size: u32,
    column: &'static str,
    value: &str,
    line: u64,
) -> Result<GridConfig> {
    GridConfig::try_new(x_size, y_size)
        .map(|g| g.with_min_poly_g(grid.min_poly_g()))
        .map_err(|_| FlowCellError::ParseField {
            line,
            column,
            value: value.to_string(),
        })
}

fn parse_header<T: FromStr>(value: &str, column: &'static str, line: u64) -> Result<T> {
    value.parse().map_err(|_| FlowCellError::ParseField {
        line,
        column,
        value: value.to_string(),
    })
}

fn field<T: FromStr>(record: &StringRecord, idx: usize, line: u64) -> Result<T> {
    let value = record.get(idx).unwrap_or("").trim();
    value.parse().map_err(|_| FlowCellError::ParseField {
        line,
        column: DUMP_COLUMNS[idx],
        value: value.to_string(),
    })
}

/// Parses one data row and merges it into the micro-tile at its origin.
///
/// `hits`/`misses`, `depthSum`, `qualitySum`, `probErrorFreeSum` and the barcode
/// distance sum are rebuilt from their printed averages, so they carry the
/// rounding of the dump.
fn load_row(fc: &mut FlowCell, record: &StringRecord, line: u64) -> Result<()> {
    if record.len() != DUMP_COLUMNS.len() {
        return Err(FlowCellError::ColumnCount {
            line,
            expected: DUMP_COLUMNS.len(),
            found: record.len(),
        });
    }

    let lane: u32 = field(record, 0, line)?;
    let tile: u32 = field(record, 1, line)?;
    let x1: u32 = field(record, 2, line)?;
    let x2: u32 = field(record, 3, line)?;
    let y1: u32 = field(record, 4, line)?;
    let y2: u32 = field(record, 5, line)?;

    let mut loaded = MicroTile::new(lane, tile, x1, x2, y1, y2);
    loaded.read_count = field(record, 6, line)?;
    loaded.aligned_read_count = field(record, 7, line)?;
    loaded.aligned_base_count = field(record, 8, line)?;
    loaded.read_error_count = field(record, 9, line)?;
    loaded.base_error_count = field(record, 10, line)?;
    loaded.kmer_read_error_count = field(record, 11, line)?;
    loaded.kmer_base_error_count = field(record, 12, line)?;
    loaded.read_ins_count = field(record, 13, line)?;
    loaded.read_del_count = field(record, 14, line)?;

    let reads = loaded.read_count as f64;
    let unique_percent: f64 = field(record, 15, line)?;
    let average_quality: f64 = field(record, 16, line)?;
    let percent_error_free: f64 = field(record, 17, line)?;
    let depth: f64 = field(record, 18, line)?;
    // 19..=24 are derived rates, recomputed on demand

    if unique_percent > 0.0 || depth > 0.0 {
        loaded.misses = (unique_percent * 0.01 * reads).round() as u64;
        loaded.hits = loaded.read_count.saturating_sub(loaded.misses);
        loaded.depth_sum = (depth * reads).round() as u64;
    }
    loaded.quality_sum = average_quality * reads;
    loaded.prob_error_free_sum = percent_error_free * reads;

    loaded.discard = field(record, 25, line)?;
    for (i, count) in loaded.acgtn.iter_mut().enumerate() {
        *count = field(record, 26 + i, line)?;
    }
    loaded.homo_poly_g_count = field(record, 31, line)?;
    loaded.homo_poly_g_sum = field(record, 32, line)?;
    // 33 is the bad barcode rate
    for (i, count) in loaded.barcode_hdist.iter_mut().enumerate() {
        *count = field(record, 34 + i, line)?;
    }
    let avg_hdist: f64 = field(record, 38, line)?;
    loaded.barcode_hdist_sum = (avg_hdist * loaded.barcode_count() as f64).round() as u64;

    let mt = fc.get_micro_tile(lane, tile, x1, y1);
    let found = [x1, x2, y1, y2];
    if mt.rect() != found {
        return Err(FlowCellError::RectangleMismatch {
            line,
            lane,
            tile,
            expected: mt.rect(),
            found,
        });
    }
    mt.add(&loaded);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flowcell::read_facts::{AlignmentOutcome, KmerOutcome, ReadObservation};

    fn sample_flow_cell(grid: GridConfig) -> FlowCell {
        let mut fc = FlowCell::new(grid);
        for i in 0..500u32 {
            let read = ReadObservation::new(b"ACGGGTTNAC", 25.0 + (i % 10) as f64, 60.0 + (i % 30) as f64)
                .with_alignment(AlignmentOutcome::Matched {
                    aligned_bases: 10,
                    errors: (i % 3) as u64,
                    insertion: i % 7 == 0,
                    deletion: i % 5 == 0,
                })
                .with_barcode_distance(i % 4)
                .with_kmers(KmerOutcome {
                    hits: 1,
                    misses: 0,
                    depth_sum: 50 + (i % 20) as u64,
                    error_bases: 0,
                });
            fc.add_read(1 + i % 2, 1101 + i % 3, (i * 13) % 1000, (i * 29) % 1000, &read);
        }
        fc.calc_stats();
        fc
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("flowcell_qc_dump_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_dump_header_and_rows() {
        let fc = sample_flow_cell(GridConfig::new(500, 250));
        let text = fc.to_dump_string().unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("#xSize\t500"));
        assert_eq!(lines.next(), Some("#ySize\t250"));
        assert_eq!(lines.next(), Some("#reads\t500"));
        let column_header = text.lines().nth(12).unwrap();
        assert!(column_header.starts_with("#lane\ttile\tx1\tx2\ty1\ty2\treadCount"));
        assert!(column_header.ends_with("hDist3+\tavgHDist"));
        assert_eq!(text.lines().count(), 13 + fc.micro_tile_count());
    }

    #[test]
    fn test_header_stats_without_calc_stats() {
        let mut fc = FlowCell::new(GridConfig::default());
        let read = ReadObservation::new(b"ACGTACGT", 30.0, 90.0);
        for i in 0..30u32 {
            fc.add_read(1, 1101, (i % 3) * 500, 0, &read);
        }
        assert_eq!(fc.stats().avg_reads(), 0.0);

        let text = fc.to_dump_string().unwrap();
        assert!(text.lines().any(|l| l == "#reads\t30"));
        assert!(text.lines().any(|l| l == "#avgReads\t10"));
        assert!(text.lines().any(|l| l == "#avgQuality\t30"));

        let loaded = FlowCell::from_reader(text.as_bytes(), GridConfig::default()).unwrap();
        assert_eq!(loaded.stats(), FlowCellStats::compute(&fc.to_list()));
    }

    #[test]
    fn test_round_trip_preserves_counts_and_rates() {
        let mut fc = sample_flow_cell(GridConfig::new(500, 250));
        let text = fc.to_dump_string().unwrap();
        let mut loaded = FlowCell::from_reader(text.as_bytes(), GridConfig::default()).unwrap();

        assert_eq!(loaded.grid().x_size(), 500);
        assert_eq!(loaded.grid().y_size(), 250);
        assert_eq!(loaded.reads_processed(), 500);
        assert_eq!(loaded.micro_tile_count(), fc.micro_tile_count());
        assert!((loaded.stats().avg_quality() - fc.stats().avg_quality()).abs() < 1e-9);

        for (a, b) in fc.to_list().iter().zip(loaded.to_list().iter()) {
            assert_eq!(a.rect(), b.rect());
            assert_eq!(a.read_count(), b.read_count());
            assert_eq!(a.aligned_read_count(), b.aligned_read_count());
            assert_eq!(a.acgtn(), b.acgtn());
            assert_eq!(a.barcode_hdist(), b.barcode_hdist());
            assert_eq!(a.alignment_rate(), b.alignment_rate());
            assert_eq!(a.true_quality(), b.true_quality());
            assert_eq!(a.read_error_rate(), b.read_error_rate());
            // rebuilt from four-decimal averages
            assert!((a.average_quality() - b.average_quality()).abs() < 1e-4);
            assert!((a.percent_error_free() - b.percent_error_free()).abs() < 1e-4);
            assert!((a.depth() - b.depth()).abs() < 0.01);
            assert!((a.average_hdist() - b.average_hdist()).abs() < 0.01);
        }

        let before = fc.calc_stats();
        let after = loaded.calc_stats();
        assert_eq!(before.reads_processed(), after.reads_processed());
        assert_eq!(before.avg_reads(), after.avg_reads());
        assert!((before.avg_quality() - after.avg_quality()).abs() < 1e-3);
    }

    #[test]
    fn test_rectangle_mismatch_is_fatal() {
        let fc = sample_flow_cell(GridConfig::new(500, 250));
        let text = fc.to_dump_string().unwrap();
        // drop the grid headers so the loader falls back to 500x500
        let stripped: String = text
            .lines()
            .filter(|l| !l.starts_with("#xSize") && !l.starts_with("#ySize"))
            .map(|l| format!("{}\n", l))
            .collect();
        let err = FlowCell::from_reader(stripped.as_bytes(), GridConfig::default()).unwrap_err();
        assert!(matches!(err, FlowCellError::RectangleMismatch { .. }));
    }

    #[test]
    fn test_grid_header_after_data_is_rejected() {
        let fc = sample_flow_cell(GridConfig::default());
        let text = format!("{}#xSize\t100\n", fc.to_dump_string().unwrap());
        let err = FlowCell::from_reader(text.as_bytes(), GridConfig::default()).unwrap_err();
        assert!(matches!(err, FlowCellError::HeaderAfterData { .. }));
    }

    #[test]
    fn test_bad_rows() {
        let zero = "#xSize\t0\n";
        let err = FlowCell::from_reader(zero.as_bytes(), GridConfig::default()).unwrap_err();
        assert!(matches!(err, FlowCellError::ParseField { line: 1, column: "xSize", .. }));

        let short = "#xSize\t500\n1\t1101\t0\t499\n";
        let err = FlowCell::from_reader(short.as_bytes(), GridConfig::default()).unwrap_err();
        assert!(matches!(err, FlowCellError::ColumnCount { found: 4, .. }));

        let fc = sample_flow_cell(GridConfig::default());
        let text = fc.to_dump_string().unwrap().replacen("\n1\t", "\nlane_one\t", 1);
        let err = FlowCell::from_reader(text.as_bytes(), GridConfig::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Line 14: could not parse column 'lane' from value 'lane_one'"
        );
    }

    #[test]
    fn test_dump_refuses_overwrite() {
        let path = temp_path("overwrite.tsv");
        let fc = sample_flow_cell(GridConfig::default());
        fc.dump(&path, true).unwrap();
        let err = fc.dump(&path, false).unwrap_err();
        assert!(matches!(err, FlowCellError::OutputExists(_)));
        fc.dump(&path, true).unwrap();
        let loaded = FlowCell::load(&path, GridConfig::default()).unwrap();
        assert_eq!(loaded.reads_processed(), 500);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_gz_dump_round_trip() {
        let path = temp_path("dump.tsv.gz");
        let fc = sample_flow_cell(GridConfig::default());
        fc.dump(&path, true).unwrap();
        let loaded = FlowCell::load(&path, GridConfig::default()).unwrap();
        assert_eq!(loaded.micro_tile_count(), fc.micro_tile_count());
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_empty_dump() {
        let fc = FlowCell::new(GridConfig::new(100, 100));
        let loaded = FlowCell::from_reader(fc.to_dump_string().unwrap().as_bytes(), GridConfig::default())
            .unwrap();
        assert_eq!(loaded.grid().x_size(), 100);
        assert_eq!(loaded.micro_tile_count(), 0);
        assert_eq!(loaded.reads_processed(), 0);
    }
}
