use std::fmt::Display;
use std::ops::AddAssign;

use getset::CopyGetters;
use serde::Serialize;

use crate::flowcell::read_facts::{AlignmentOutcome, ReadFacts};
use crate::helper::quality::prob_error_to_phred;

/// Column names of one dump row, in output order.
pub const DUMP_COLUMNS: [&str; 39] = [
    "lane",
    "tile",
    "x1",
    "x2",
    "y1",
    "y2",
    "readCount",
    "alignedReadCount",
    "alignedBaseCount",
    "readErrorCount",
    "baseErrorCount",
    "kmerReadErrorCount",
    "kmerBaseErrorCount",
    "readInsCount",
    "readDelCount",
    "uniquePercent",
    "averageQuality",
    "percentErrorFree",
    "depth",
    "alignmentRate",
    "trueQuality",
    "kmerErrorRateR",
    "kmerErrorRateB",
    "readInsRate",
    "readDelRate",
    "discard",
    "A",
    "C",
    "G",
    "T",
    "N",
    "polyG_Count",
    "polyG_Length",
    "badBarcodeRate",
    "hDist0",
    "hDist1",
    "hDist2",
    "hDist3+",
    "avgHDist",
];

/// Leaf accumulator for one closed rectangle `[x1, x2] x [y1, y2]` of a tile.
///
/// Only raw counters are stored. Every rate or average is recomputed from them
/// on demand, so merging two micro-tiles loses nothing relative to counting the
/// union of their reads directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct MicroTile {
    pub(crate) lane: u32,
    pub(crate) tile: u32,
    pub(crate) x1: u32,
    pub(crate) x2: u32,
    pub(crate) y1: u32,
    pub(crate) y2: u32,

    pub(crate) read_count: u64,
    pub(crate) aligned_read_count: u64,
    pub(crate) aligned_base_count: u64,
    pub(crate) read_error_count: u64,
    pub(crate) base_error_count: u64,
    pub(crate) kmer_read_error_count: u64,
    pub(crate) kmer_base_error_count: u64,
    pub(crate) read_ins_count: u64,
    pub(crate) read_del_count: u64,

    pub(crate) quality_sum: f64,
    pub(crate) prob_error_free_sum: f64,

    pub(crate) hits: u64,
    pub(crate) misses: u64,
    pub(crate) depth_sum: u64,

    pub(crate) acgtn: [u64; 5],
    pub(crate) homo_poly_g_count: u64,
    pub(crate) homo_poly_g_sum: u64,

    pub(crate) barcode_hdist: [u64; 4],
    pub(crate) barcode_hdist_sum: u64,

    pub(crate) discard: u64,
}

impl MicroTile {
    pub fn new(lane: u32, tile: u32, x1: u32, x2: u32, y1: u32, y2: u32) -> Self {
        MicroTile {
            lane,
            tile,
            x1,
            x2,
            y1,
            y2,
            ..Default::default()
        }
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }

    /// Bounds as `[x1, x2, y1, y2]`.
    pub fn rect(&self) -> [u32; 4] {
        [self.x1, self.x2, self.y1, self.y2]
    }

    /// Accumulates one read. Reads shorter than one base are ignored and
    /// `false` is returned.
    pub fn add_read<R: ReadFacts + ?Sized>(&mut self, read: &R, min_poly_g: usize) -> bool {
        let len = read.length();
        if len < 1 {
            return false;
        }

        self.read_count += 1;
        self.quality_sum += read.average_quality_estimate();
        self.prob_error_free_sum += read.error_free_probability_estimate();

        match read.alignment() {
            Some(AlignmentOutcome::Matched {
                aligned_bases,
                errors,
                insertion,
                deletion,
            }) if aligned_bases > 0 => {
                self.aligned_read_count += 1;
                self.aligned_base_count += aligned_bases;
                self.base_error_count += errors;
                if errors > 0 {
                    self.read_error_count += 1;
                }
                if insertion {
                    self.read_ins_count += 1;
                }
                if deletion {
                    self.read_del_count += 1;
                }
            }
            Some(AlignmentOutcome::Mapped(true)) => {
                self.aligned_read_count += 1;
            }
            _ => {}
        }

        if let Some(kmers) = read.kmer_outcome() {
            self.hits += kmers.hits;
            self.misses += kmers.misses;
            self.depth_sum += kmers.depth_sum;
            self.kmer_base_error_count += kmers.error_bases;
            if kmers.error_bases > 0 {
                self.kmer_read_error_count += 1;
            }
        }

        if let Some(distance) = read.barcode_distance() {
            self.barcode_hdist[distance.min(3) as usize] += 1;
            self.barcode_hdist_sum += distance as u64;
        }

        let mut longest_g = 0u64;
        let mut current_g = 0u64;
        for &b in read.bases() {
            self.acgtn[base_index(b)] += 1;
            if b == b'G' || b == b'g' {
                current_g += 1;
                longest_g = longest_g.max(current_g);
            } else {
                current_g = 0;
            }
        }
        if longest_g >= min_poly_g as u64 {
            self.homo_poly_g_count += 1;
        }
        self.homo_poly_g_sum += longest_g;

        true
    }

    /// Element-wise sum of every counter. The rectangle of `self` is kept.
    pub fn add(&mut self, other: &MicroTile) {
        self.read_count += other.read_count;
        self.aligned_read_count += other.aligned_read_count;
        self.aligned_base_count += other.aligned_base_count;
        self.read_error_count += other.read_error_count;
        self.base_error_count += other.base_error_count;
        self.kmer_read_error_count += other.kmer_read_error_count;
        self.kmer_base_error_count += other.kmer_base_error_count;
        self.read_ins_count += other.read_ins_count;
        self.read_del_count += other.read_del_count;

        self.quality_sum += other.quality_sum;
        self.prob_error_free_sum += other.prob_error_free_sum;

        self.hits += other.hits;
        self.misses += other.misses;
        self.depth_sum += other.depth_sum;

        for (a, b) in self.acgtn.iter_mut().zip(other.acgtn.iter()) {
            *a += b;
        }
        self.homo_poly_g_count += other.homo_poly_g_count;
        self.homo_poly_g_sum += other.homo_poly_g_sum;

        for (a, b) in self.barcode_hdist.iter_mut().zip(other.barcode_hdist.iter()) {
            *a += b;
        }
        self.barcode_hdist_sum += other.barcode_hdist_sum;

        self.discard += other.discard;
    }

    // MARK: derived metrics

    pub fn kmer_count(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn average_quality(&self) -> f64 {
        ratio(self.quality_sum, self.read_count as f64)
    }

    pub fn percent_error_free(&self) -> f64 {
        ratio(self.prob_error_free_sum, self.read_count as f64)
    }

    pub fn alignment_rate(&self) -> f64 {
        ratio(self.aligned_read_count as f64, self.read_count as f64)
    }

    /// Phred-scaled base error rate, smoothed toward Q20 (4 errors in 400 bases).
    pub fn true_quality(&self) -> f64 {
        let rate = (self.base_error_count as f64 + 4.0) / (self.aligned_base_count as f64 + 400.0);
        prob_error_to_phred(rate)
    }

    /// Fraction of aligned reads with an error, smoothed toward 0.1.
    pub fn read_error_rate(&self) -> f64 {
        (self.read_error_count as f64 + 1.0) / (self.aligned_read_count as f64 + 10.0)
    }

    pub fn read_ins_rate(&self) -> f64 {
        ratio(self.read_ins_count as f64, self.aligned_read_count as f64)
    }

    pub fn read_del_rate(&self) -> f64 {
        ratio(self.read_del_count as f64, self.aligned_read_count as f64)
    }

    pub fn kmer_error_rate_r(&self) -> f64 {
        ratio(self.kmer_read_error_count as f64, self.read_count as f64)
    }

    pub fn kmer_error_rate_b(&self) -> f64 {
        ratio(self.kmer_base_error_count as f64, self.read_count as f64)
    }

    pub fn hit_percent(&self) -> f64 {
        100.0 * ratio(self.hits as f64, self.kmer_count() as f64)
    }

    pub fn unique_percent(&self) -> f64 {
        100.0 * ratio(self.misses as f64, self.kmer_count() as f64)
    }

    pub fn depth(&self) -> f64 {
        ratio(self.depth_sum as f64, self.kmer_count() as f64)
    }

    pub fn base_count(&self) -> u64 {
        self.acgtn.iter().sum()
    }

    /// Fraction of all counted bases that are G.
    pub fn average_g(&self) -> f64 {
        ratio(self.acgtn[2] as f64, self.base_count() as f64)
    }

    /// Fraction of reads whose longest G run reached the poly-G minimum.
    pub fn poly_g_fraction(&self) -> f64 {
        ratio(self.homo_poly_g_count as f64, self.read_count as f64)
    }

    pub fn barcode_count(&self) -> u64 {
        self.barcode_hdist.iter().sum()
    }

    pub fn bad_barcode_rate(&self) -> f64 {
        let total = self.barcode_count();
        if total == 0 {
            0.0
        } else {
            1.0 - self.barcode_hdist[0] as f64 / total as f64
        }
    }

    pub fn average_hdist(&self) -> f64 {
        ratio(self.barcode_hdist_sum as f64, self.barcode_count() as f64)
    }

    // MARK: serialization

    /// One dump row, one field per entry of [`DUMP_COLUMNS`].
    pub fn to_record(&self) -> Vec<String> {
        let mut record = Vec::with_capacity(DUMP_COLUMNS.len());
        record.extend(
            [
                self.lane, self.tile, self.x1, self.x2, self.y1, self.y2,
            ]
            .iter()
            .map(|v| v.to_string()),
        );
        record.extend(
            [
                self.read_count,
                self.aligned_read_count,
                self.aligned_base_count,
                self.read_error_count,
                self.base_error_count,
                self.kmer_read_error_count,
                self.kmer_base_error_count,
                self.read_ins_count,
                self.read_del_count,
            ]
            .iter()
            .map(|v| v.to_string()),
        );
        record.push(format!("{:.4}", self.unique_percent()));
        record.push(format!("{:.4}", self.average_quality()));
        record.push(format!("{:.4}", self.percent_error_free()));
        record.push(format_depth(self.depth()));
        record.push(format!("{:.5}", self.alignment_rate()));
        record.push(format!("{:.4}", self.true_quality()));
        record.push(format!("{:.5}", self.kmer_error_rate_r()));
        record.push(format!("{:.5}", self.kmer_error_rate_b()));
        record.push(format!("{:.5}", self.read_ins_rate()));
        record.push(format!("{:.5}", self.read_del_rate()));
        record.push(self.discard.to_string());
        record.extend(self.acgtn.iter().map(|v| v.to_string()));
        record.push(self.homo_poly_g_count.to_string());
        record.push(self.homo_poly_g_sum.to_string());
        record.push(format!("{:.5}", self.bad_barcode_rate()));
        record.extend(self.barcode_hdist.iter().map(|v| v.to_string()));
        record.push(format!("{:.4}", self.average_hdist()));
        record
    }

    /// The dump row as a single tab-delimited line, without a trailing newline.
    pub fn to_text(&self) -> String {
        self.to_record().join("\t")
    }
}

impl AddAssign<&MicroTile> for MicroTile {
    fn add_assign(&mut self, other: &MicroTile) {
        self.add(other);
    }
}

impl Display for MicroTile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}, {}",
            self.lane, self.tile, self.x1, self.x2, self.y1, self.y2
        )
    }
}

/// Integer above 10000, two decimals from 100, four decimals below.
pub fn format_depth(depth: f64) -> String {
    if depth > 10000.0 {
        format!("{}", depth.round() as u64)
    } else if depth >= 100.0 {
        format!("{:.2}", depth)
    } else {
        format!("{:.4}", depth)
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn base_index(b: u8) -> usize {
    match b {
        b'A' | b'a' => 0,
        b'C' | b'c' => 1,
        b'G' | b'g' => 2,
        b'T' | b't' => 3,
        _ => 4,
    }
}
