//! Cell decoder: sample buffer → one classified symbol per cell.
//!
//! The buffer is cut into consecutive windows of `cell_size` samples. The last
//! window may be shorter when the buffer length is not a multiple of the cell
//! size; it is classified like any other.

use crate::codec::quantizer::{Quantizer, Symbol};
use serde::{Deserialize, Serialize};

/// How a window of samples is reduced to a single symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellStrategy {
    /// Average the raw amplitudes, then classify the mean.
    #[default]
    Mean,
    /// Classify every sample, then take the most frequent symbol in the cell.
    Vote,
}

impl std::fmt::Display for CellStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellStrategy::Mean => write!(f, "mean"),
            CellStrategy::Vote => write!(f, "vote"),
        }
    }
}

impl std::str::FromStr for CellStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mean" => Ok(CellStrategy::Mean),
            "vote" => Ok(CellStrategy::Vote),
            _ => Err(format!("Unknown cell strategy: {}", s)),
        }
    }
}

/// Decode every window of `cell_size` samples into one symbol, in order.
///
/// `cell_size` of 0 yields no symbols.
pub fn decode_cells(
    samples: &[i16],
    quantizer: &Quantizer,
    cell_size: usize,
    strategy: CellStrategy,
) -> Vec<Symbol> {
    if cell_size == 0 {
        return Vec::new();
    }

    samples
        .chunks(cell_size)
        .map(|cell| match strategy {
            CellStrategy::Mean => quantizer.amplitude_to_symbol(cell_mean(cell)),
            CellStrategy::Vote => classify_by_vote(cell, quantizer),
        })
        .collect()
}

/// Arithmetic mean of a window, truncated toward zero.
///
/// Accumulates in `i64`; `cell_size * 32767` overflows narrower types quickly.
pub fn cell_mean(cell: &[i16]) -> i16 {
    if cell.is_empty() {
        return 0;
    }
    let sum: i64 = cell.iter().map(|&sample| sample as i64).sum();
    (sum / cell.len() as i64) as i16
}

/// Per-sample classification followed by a plurality vote inside the cell.
///
/// Ties go to the symbol seen first in the window.
fn classify_by_vote(cell: &[i16], quantizer: &Quantizer) -> Symbol {
    let mut counts = vec![0usize; quantizer.num_bins() as usize];
    let mut first_seen = vec![usize::MAX; quantizer.num_bins() as usize];

    for (index, &sample) in cell.iter().enumerate() {
        let symbol = quantizer.amplitude_to_symbol(sample) as usize;
        counts[symbol] += 1;
        if first_seen[symbol] == usize::MAX {
            first_seen[symbol] = index;
        }
    }

    (0..counts.len())
        .filter(|&symbol| counts[symbol] > 0)
        .max_by(|&a, &b| {
            counts[a]
                .cmp(&counts[b])
                .then_with(|| first_seen[b].cmp(&first_seen[a]))
        })
        .map(|symbol| symbol as Symbol)
        .unwrap_or_else(|| quantizer.amplitude_to_symbol(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_cells_decode() {
        let quantizer = Quantizer::default();
        let mut samples = Vec::new();
        for symbol in [3u8, 10, 0, 9] {
            samples.extend(std::iter::repeat(quantizer.symbol_to_amplitude(symbol)).take(5));
        }

        for strategy in [CellStrategy::Mean, CellStrategy::Vote] {
            assert_eq!(decode_cells(&samples, &quantizer, 5, strategy), vec![3, 10, 0, 9]);
        }
    }

    #[test]
    fn test_short_final_window() {
        let quantizer = Quantizer::default();
        let amplitude = quantizer.symbol_to_amplitude(8);
        let samples = vec![amplitude; 13];

        let symbols = decode_cells(&samples, &quantizer, 5, CellStrategy::Mean);
        assert_eq!(symbols, vec![8, 8, 8]);
    }

    #[test]
    fn test_mean_uses_wide_accumulator() {
        let cell = vec![i16::MAX; 10_000];
        assert_eq!(cell_mean(&cell), i16::MAX);

        let cell = vec![i16::MIN; 10_000];
        assert_eq!(cell_mean(&cell), i16::MIN);
    }

    #[test]
    fn test_mean_truncates_toward_zero() {
        assert_eq!(cell_mean(&[-3, -4]), -3);
        assert_eq!(cell_mean(&[3, 4]), 3);
        assert_eq!(cell_mean(&[]), 0);
    }

    #[test]
    fn test_single_outlier_biases_mean_but_not_vote() {
        let quantizer = Quantizer::default();
        let mut cell = vec![quantizer.symbol_to_amplitude(5); 4];
        // One full-scale spike drags the mean of a 4-sample cell out of its bin
        cell[1] = i16::MAX;

        let by_mean = decode_cells(&cell, &quantizer, 4, CellStrategy::Mean);
        let by_vote = decode_cells(&cell, &quantizer, 4, CellStrategy::Vote);
        assert_ne!(by_mean, vec![5]);
        assert_eq!(by_vote, vec![5]);
    }

    #[test]
    fn test_vote_tie_goes_to_first_seen() {
        let quantizer = Quantizer::default();
        let two = quantizer.symbol_to_amplitude(2);
        let seven = quantizer.symbol_to_amplitude(7);

        assert_eq!(decode_cells(&[seven, two, two, seven], &quantizer, 4, CellStrategy::Vote), vec![7]);
        assert_eq!(decode_cells(&[two, seven, seven, two], &quantizer, 4, CellStrategy::Vote), vec![2]);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("mean".parse::<CellStrategy>().unwrap(), CellStrategy::Mean);
        assert_eq!("VOTE".parse::<CellStrategy>().unwrap(), CellStrategy::Vote);
        assert!("median".parse::<CellStrategy>().is_err());
        assert_eq!(CellStrategy::default().to_string(), "mean");
    }
}
