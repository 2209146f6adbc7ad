//! # Amplitude Quantizer
//!
//! Maps symbols onto 16-bit amplitudes and back. The signed 16-bit domain
//! `[-32768, 32767]` is cut into `num_bins` contiguous bins of equal
//! real-valued width. Symbol `i` owns bin `i` and is transmitted at the floor
//! midpoint of its nominal edges. Classification is `floor(offset / step)`, so
//! the exact bins are the ceiling-edged ranges from `bin_range`, and the margin
//! on either side of a canonical amplitude differs by a few units.

use std::ops::RangeInclusive;

/// Lowest representable sample value.
pub const MIN_AMPLITUDE: i32 = i16::MIN as i32;

/// Number of distinct 16-bit sample values.
pub const AMPLITUDE_DOMAIN: f64 = 65536.0;
const AMPLITUDE_DOMAIN_INT: i64 = 65536;

/// Number of data symbols (digits 0-9).
pub const DIGIT_COUNT: u8 = 10;

/// A classified cell value: digits are `0..=9`, the terminator is `num_bins - 1`.
pub type Symbol = u8;

/// Bidirectional symbol/amplitude map over equal-width bins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    num_bins: u8,
    step: f64,
}

impl Quantizer {
    /// Build a quantizer with `num_bins` bins over the 16-bit domain.
    ///
    /// `num_bins` must be at least 1; callers go through `CodecParams::validate`
    /// which enforces the stricter alphabet requirement (ten digits plus a
    /// terminator).
    pub fn new(num_bins: u8) -> Self {
        let num_bins = num_bins.max(1);
        Self {
            num_bins,
            step: AMPLITUDE_DOMAIN / num_bins as f64,
        }
    }

    pub fn num_bins(&self) -> u8 {
        self.num_bins
    }

    /// Real-valued width of one bin.
    pub fn bin_width(&self) -> f64 {
        self.step
    }

    /// The separator symbol, always the top bin.
    pub fn terminator(&self) -> Symbol {
        self.num_bins - 1
    }

    /// Inclusive amplitude range that `amplitude_to_symbol` maps to `symbol`.
    ///
    /// Bin `i` spans `[MIN + ceil(i*step), MIN + ceil((i+1)*step) - 1]`, the
    /// exact preimage of the classifier. Symbols past the last bin are clamped
    /// to it.
    pub fn bin_range(&self, symbol: Symbol) -> RangeInclusive<i32> {
        let index = symbol.min(self.terminator()) as i64;
        let low = MIN_AMPLITUDE + self.scaled_ceil(index) as i32;
        let high = MIN_AMPLITUDE + self.scaled_ceil(index + 1) as i32 - 1;
        low..=high
    }

    /// Largest shift that never moves a canonical amplitude out of its bin.
    ///
    /// A cell value within `noise_margin()` of the transmitted amplitude is
    /// always classified back to the same symbol; one step further is not.
    pub fn noise_margin(&self) -> i32 {
        (0..self.num_bins)
            .map(|symbol| {
                let centre = self.symbol_to_amplitude(symbol) as i32;
                let range = self.bin_range(symbol);
                let below = if symbol == 0 { i32::MAX } else { centre - range.start() };
                let above = if symbol == self.terminator() { i32::MAX } else { range.end() - centre };
                below.min(above)
            })
            .min()
            .unwrap_or(0)
    }

    /// `floor(index * step)` computed in integers so the top edge lands exactly on 65536.
    fn scaled_floor(&self, index: i64) -> i64 {
        index * AMPLITUDE_DOMAIN_INT / self.num_bins as i64
    }

    fn scaled_ceil(&self, index: i64) -> i64 {
        (index * AMPLITUDE_DOMAIN_INT + self.num_bins as i64 - 1) / self.num_bins as i64
    }

    /// Canonical amplitude for `symbol`: the floor midpoint of its nominal bin
    /// `[MIN + floor(i*step), MIN + floor((i+1)*step) - 1]`.
    pub fn symbol_to_amplitude(&self, symbol: Symbol) -> i16 {
        let index = symbol.min(self.terminator()) as i64;
        let low = MIN_AMPLITUDE + self.scaled_floor(index) as i32;
        let high = MIN_AMPLITUDE + self.scaled_floor(index + 1) as i32 - 1;
        let midpoint = (low + high).div_euclid(2);
        midpoint.clamp(i16::MIN as i32, i16::MAX as i32) as i16
    }

    /// Classify an amplitude into the symbol whose bin contains it.
    ///
    /// Total over `i16`: rounding at the top edge is absorbed by clamping to
    /// the last bin.
    pub fn amplitude_to_symbol(&self, amplitude: i16) -> Symbol {
        // floor(offset / step) == floor(offset * num_bins / 65536), both operands non-negative
        let offset = amplitude as i64 - MIN_AMPLITUDE as i64;
        let bin = offset * self.num_bins as i64 / AMPLITUDE_DOMAIN_INT;
        bin.min(self.terminator() as i64) as Symbol
    }
}

impl Default for Quantizer {
    fn default() -> Self {
        Self::new(DIGIT_COUNT + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_amplitudes_classify_back() {
        let quantizer = Quantizer::default();
        for symbol in 0..=10u8 {
            let amplitude = quantizer.symbol_to_amplitude(symbol);
            assert_eq!(quantizer.amplitude_to_symbol(amplitude), symbol,
                       "symbol {} at amplitude {}", symbol, amplitude);
        }
    }

    #[test]
    fn test_classification_is_total_and_deterministic() {
        let quantizer = Quantizer::default();
        let mut previous = 0u8;
        for amplitude in i16::MIN..=i16::MAX {
            let symbol = quantizer.amplitude_to_symbol(amplitude);
            assert!(symbol <= 10);
            assert_eq!(symbol, quantizer.amplitude_to_symbol(amplitude));
            // Bins are contiguous: classification never goes backwards or skips a bin
            assert!(symbol == previous || symbol == previous + 1);
            previous = symbol;
        }
        assert_eq!(quantizer.amplitude_to_symbol(i16::MIN), 0);
        assert_eq!(quantizer.amplitude_to_symbol(i16::MAX), 10);
    }

    #[test]
    fn test_bin_ranges_partition_domain() {
        let quantizer = Quantizer::default();
        let mut expected_start = MIN_AMPLITUDE;
        for symbol in 0..=10u8 {
            let range = quantizer.bin_range(symbol);
            assert_eq!(*range.start(), expected_start);
            assert!(range.end() > range.start());
            expected_start = range.end() + 1;
        }
        assert_eq!(expected_start - 1, i16::MAX as i32);
    }

    #[test]
    fn test_known_amplitudes() {
        let quantizer = Quantizer::default();
        // step = 65536 / 11 = 5957.81..., offset 5957 is still bin 0
        assert_eq!(quantizer.bin_range(0), -32768..=-26811);
        assert_eq!(quantizer.symbol_to_amplitude(0), -29790);
        assert_eq!(quantizer.bin_range(5), -2978..=2978);
        assert_eq!(quantizer.symbol_to_amplitude(5), -1);
        assert_eq!(quantizer.bin_range(10), 26811..=32767);
        assert_eq!(quantizer.symbol_to_amplitude(10), 29788);
        assert_eq!(quantizer.terminator(), 10);
    }

    #[test]
    fn test_bin_range_is_classifier_preimage() {
        for num_bins in [11u8, 13, 16] {
            let quantizer = Quantizer::new(num_bins);
            for symbol in 0..num_bins {
                let range = quantizer.bin_range(symbol);
                for amplitude in range.clone() {
                    assert_eq!(quantizer.amplitude_to_symbol(amplitude as i16), symbol,
                               "{} bins: amplitude {} outside bin {}", num_bins, amplitude, symbol);
                }
                if *range.start() > MIN_AMPLITUDE {
                    assert_eq!(quantizer.amplitude_to_symbol((range.start() - 1) as i16), symbol - 1);
                }
            }
        }
    }

    #[test]
    fn test_noise_margin_is_exact() {
        let quantizer = Quantizer::default();
        let margin = quantizer.noise_margin();
        assert_eq!(margin, 2977);

        for symbol in 0..=10u8 {
            let centre = quantizer.symbol_to_amplitude(symbol) as i32;
            for offset in [-margin, margin] {
                let shifted = (centre + offset).clamp(i16::MIN as i32, i16::MAX as i32) as i16;
                assert_eq!(quantizer.amplitude_to_symbol(shifted), symbol);
            }
        }

        // One step past the margin pulls symbol 1 down into bin 0
        let centre = quantizer.symbol_to_amplitude(1) as i32;
        assert_eq!(quantizer.amplitude_to_symbol((centre - margin - 1) as i16), 0);

        assert_eq!(Quantizer::new(13).noise_margin(), 2519);
        assert_eq!(Quantizer::new(16).noise_margin(), 2047);
    }

    #[test]
    fn test_wider_alphabet_digit_classes() {
        let quantizer = Quantizer::new(13);
        assert_eq!(quantizer.terminator(), 12);
        for symbol in 0..13u8 {
            assert_eq!(quantizer.amplitude_to_symbol(quantizer.symbol_to_amplitude(symbol)), symbol);
        }
    }
}
