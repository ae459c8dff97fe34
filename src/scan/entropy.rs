//! Shannon entropy of decoded file text and order-independent summary statistics.

use std::collections::BTreeMap;

/// Shannon entropy in bits per symbol over the characters of `text`.
///
/// Returns 0.0 for empty or single-symbol input. For byte-range alphabets the
/// value lies in [0, 8].
pub fn shannon_entropy(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }

    let mut freq: BTreeMap<char, usize> = BTreeMap::new();
    let mut len = 0usize;
    for c in text.chars() {
        *freq.entry(c).or_insert(0) += 1;
        len += 1;
    }

    let len = len as f64;
    let mut entropy = 0.0;
    for count in freq.values() {
        let p = *count as f64 / len;
        entropy -= p * p.log2();
    }
    // -0.0 for a single symbol
    entropy.max(0.0)
}

/// max / mean / population variance of a multiset of entropies
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EntropyStats {
    pub max: f64,
    pub avg: f64,
    pub variance: f64,
}

impl EntropyStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let max = values.iter().copied().fold(0.0f64, f64::max);
        let avg = values.iter().sum::<f64>() / n;
        let variance = if values.len() > 1 {
            values.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / n
        } else {
            0.0
        };
        Self { max, avg, variance }
    }
}
