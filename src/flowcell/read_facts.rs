use bio::io::fastq;
use getset::{CopyGetters, Getters, Setters};

use crate::helper::quality::{avg_quality_by_probability, percent_error_free};

/// Alignment information a read may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentOutcome {
    /// Detailed outcome derived from a match string.
    Matched {
        aligned_bases: u64,
        errors: u64,
        insertion: bool,
        deletion: bool,
    },
    /// Only a mapped flag is known; no base-level detail.
    Mapped(bool),
}

impl AlignmentOutcome {
    /// Classifies a match string: `m` match, `S` substitution, `N` no-call,
    /// `I` insertion, `D` deletion, `C`/`X` clipped. Anything else is ignored.
    pub fn from_match_string(matches: &[u8]) -> Self {
        let mut aligned_bases = 0;
        let mut errors = 0;
        let mut insertion = false;
        let mut deletion = false;
        for &m in matches {
            match m {
                b'm' | b'N' => aligned_bases += 1,
                b'S' => {
                    aligned_bases += 1;
                    errors += 1;
                }
                b'I' => {
                    aligned_bases += 1;
                    errors += 1;
                    insertion = true;
                }
                b'D' => {
                    errors += 1;
                    deletion = true;
                }
                _ => {}
            }
        }
        AlignmentOutcome::Matched {
            aligned_bases,
            errors,
            insertion,
            deletion,
        }
    }
}

/// k-mer uniqueness signal for one read, produced outside this crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KmerOutcome {
    pub hits: u64,
    pub misses: u64,
    pub depth_sum: u64,
    pub error_bases: u64,
}

/// The read-level facts a [`MicroTile`](crate::flowcell::MicroTile) consumes.
pub trait ReadFacts {
    fn length(&self) -> usize;

    /// Average quality on a phred-like 0-100 scale.
    fn average_quality_estimate(&self) -> f64;

    /// Probability that the read is error free, in percent.
    fn error_free_probability_estimate(&self) -> f64;

    fn alignment(&self) -> Option<AlignmentOutcome> {
        None
    }

    fn bases(&self) -> &[u8];

    fn barcode_distance(&self) -> Option<u32> {
        None
    }

    fn kmer_outcome(&self) -> Option<KmerOutcome> {
        None
    }
}

impl ReadFacts for fastq::Record {
    fn length(&self) -> usize {
        self.seq().len()
    }

    fn average_quality_estimate(&self) -> f64 {
        avg_quality_by_probability(self.qual())
    }

    fn error_free_probability_estimate(&self) -> f64 {
        percent_error_free(self.qual())
    }

    fn bases(&self) -> &[u8] {
        self.seq()
    }
}

/// Owned read facts, for callers that already hold the pre-computed values.
#[derive(Debug, Clone, Default, Getters, CopyGetters, Setters)]
pub struct ReadObservation {
    #[getset(get = "pub", set = "pub")]
    seq: Vec<u8>,
    #[getset(get_copy = "pub", set = "pub")]
    avg_quality: f64,
    #[getset(get_copy = "pub", set = "pub")]
    error_free_percent: f64,
    #[getset(get_copy = "pub", set = "pub")]
    alignment_outcome: Option<AlignmentOutcome>,
    #[getset(get_copy = "pub", set = "pub")]
    hamming_distance: Option<u32>,
    #[getset(get_copy = "pub", set = "pub")]
    kmers: Option<KmerOutcome>,
}

impl ReadObservation {
    pub fn new(seq: &[u8], avg_quality: f64, error_free_percent: f64) -> Self {
        ReadObservation {
            seq: seq.to_vec(),
            avg_quality,
            error_free_percent,
            ..Default::default()
        }
    }

    /// Builds an observation from a FASTQ record, computing both quality estimators.
    pub fn from_fastq(record: &fastq::Record) -> Self {
        ReadObservation::new(
            record.seq(),
            record.average_quality_estimate(),
            record.error_free_probability_estimate(),
        )
    }

    pub fn with_alignment(mut self, alignment: AlignmentOutcome) -> Self {
        self.alignment_outcome = Some(alignment);
        self
    }

    pub fn with_barcode_distance(mut self, distance: u32) -> Self {
        self.hamming_distance = Some(distance);
        self
    }

    pub fn with_kmers(mut self, kmers: KmerOutcome) -> Self {
        self.kmers = Some(kmers);
        self
    }
}

impl ReadFacts for ReadObservation {
    fn length(&self) -> usize {
        self.seq.len()
    }

    fn average_quality_estimate(&self) -> f64 {
        self.avg_quality
    }

    fn error_free_probability_estimate(&self) -> f64 {
        self.error_free_percent
    }

    fn alignment(&self) -> Option<AlignmentOutcome> {
        self.alignment_outcome
    }

    fn bases(&self) -> &[u8] {
        &self.seq
    }

    fn barcode_distance(&self) -> Option<u32> {
        self.hamming_distance
    }

    fn kmer_outcome(&self) -> Option<KmerOutcome> {
        self.kmers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_match_string() {
        let outcome = AlignmentOutcome::from_match_string(b"CCmmmSmmImmDmmN");
        assert_eq!(
            outcome,
            AlignmentOutcome::Matched {
                aligned_bases: 12,
                errors: 3,
                insertion: true,
                deletion: true,
            }
        );
    }

    #[test]
    fn test_from_match_string_clean() {
        let outcome = AlignmentOutcome::from_match_string(b"mmmm");
        assert_eq!(
            outcome,
            AlignmentOutcome::Matched {
                aligned_bases: 4,
                errors: 0,
                insertion: false,
                deletion: false,
            }
        );
    }

    #[test]
    fn test_fastq_record_facts() {
        let record = fastq::Record::with_attrs("r1", None, b"ACGT", b"5555");
        assert_eq!(record.length(), 4);
        assert!((record.average_quality_estimate() - 20.0).abs() < 1e-9);
        assert!((record.error_free_probability_estimate() - 100.0 * 0.99f64.powi(4)).abs() < 1e-9);
        assert!(record.alignment().is_none());

        let obs = ReadObservation::from_fastq(&record).with_barcode_distance(2);
        assert_eq!(obs.bases(), b"ACGT");
        assert_eq!(obs.barcode_distance(), Some(2));
    }
}
