use itertools::Itertools;

/// Mismatches between two barcodes; extra length on either side counts as mismatches.
pub fn hamming_distance(a: &[u8], b: &[u8]) -> u32 {
    let shared = a
        .iter()
        .zip(b.iter())
        .filter(|(x, y)| !x.eq_ignore_ascii_case(*y))
        .count();
    (shared + a.len().abs_diff(b.len())) as u32
}

/// Barcodes expected on the run, used to score each read's observed barcode.
#[derive(Debug, Clone, Default)]
pub struct ExpectedBarcodes {
    barcodes: Vec<Vec<u8>>,
}

impl ExpectedBarcodes {
    pub fn new<S: AsRef<str>>(barcodes: &[S]) -> Self {
        ExpectedBarcodes {
            barcodes: barcodes
                .iter()
                .map(|b| normalize(b.as_ref()))
                .unique()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.barcodes.is_empty()
    }

    /// Distance to the nearest expected barcode, `None` when no barcodes are expected.
    pub fn nearest_distance(&self, observed: &str) -> Option<u32> {
        let observed = normalize(observed);
        self.barcodes
            .iter()
            .map(|b| hamming_distance(b, &observed))
            .min()
    }
}

// dual indexes are compared as one sequence
fn normalize(barcode: &str) -> Vec<u8> {
    barcode
        .bytes()
        .filter(|&b| b != b'+' && b != b'-')
        .map(|b| b.to_ascii_uppercase())
        .collect()
}
