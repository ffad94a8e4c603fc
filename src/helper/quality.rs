/// Phred+33 offset used by FASTQ quality strings.
pub const PHRED_OFFSET: u8 = 33;

/// Lowest error probability a phred transform will accept, caps the score at Q100.
const MIN_PROB_ERROR: f64 = 1e-10;

pub fn phred_to_prob_error(q: u8) -> f64 {
    10f64.powf(-(q as f64) / 10.0)
}

pub fn prob_error_to_phred(prob: f64) -> f64 {
    let prob = prob.clamp(MIN_PROB_ERROR, 1.0);
    -10.0 * prob.log10()
}

/// Average quality computed in probability space: the per-base error
/// probabilities are averaged and the mean is converted back to phred.
pub fn avg_quality_by_probability(qual: &[u8]) -> f64 {
    if qual.is_empty() {
        return 0.0;
    }
    let sum: f64 = qual
        .iter()
        .map(|&q| phred_to_prob_error(q.saturating_sub(PHRED_OFFSET)))
        .sum();
    prob_error_to_phred(sum / qual.len() as f64)
}

/// Probability that every base in the read is correct, in percent.
pub fn percent_error_free(qual: &[u8]) -> f64 {
    if qual.is_empty() {
        return 0.0;
    }
    let product: f64 = qual
        .iter()
        .map(|&q| 1.0 - phred_to_prob_error(q.saturating_sub(PHRED_OFFSET)))
        .product();
    100.0 * product
}
