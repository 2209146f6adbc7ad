//! Frame encoder: digit text → fixed-length sample buffer.
//!
//! One Pass is the message's digits, one cell each, followed by
//! `terminator_count` terminator cells. Passes are tiled back to back until the
//! buffer is full; a cell that would cross the end of the buffer is not written
//! and the remaining samples stay at zero.

use crate::codec::quantizer::{Quantizer, Symbol};
use crate::codec::{CodecError, CodecParams};

/// Parse `text` into digit symbols, rejecting empty input and non-digits.
pub fn parse_digits(text: &str) -> Result<Vec<Symbol>, CodecError> {
    if text.is_empty() {
        return Err(CodecError::EmptyInput);
    }

    text.chars()
        .enumerate()
        .map(|(position, character)| match character.to_digit(10) {
            Some(digit) if character.is_ascii_digit() => Ok(digit as Symbol),
            _ => Err(CodecError::InvalidSymbol { character, position }),
        })
        .collect()
}

/// Encode `text` into exactly `params.total_samples()` samples.
pub fn encode(text: &str, params: &CodecParams) -> Result<Vec<i16>, CodecError> {
    params.validate()?;

    // Non-empty from here on, so every Pass advances the cursor
    let digits = parse_digits(text)?;

    let quantizer = params.quantizer();
    let pass = pass_amplitudes(&digits, &quantizer, params.terminator_count);

    let total_samples = params.total_samples();
    let cell_size = params.cell_size;
    let mut buffer = vec![0i16; total_samples];
    let mut cursor = 0usize;

    'tiling: loop {
        for &amplitude in &pass {
            let end = cursor + cell_size;
            if end > total_samples {
                break 'tiling;
            }
            buffer[cursor..end].fill(amplitude);
            cursor = end;
        }
    }

    tracing::trace!(
        digits = digits.len(),
        cells_written = cursor / cell_size,
        zero_tail = total_samples - cursor,
        "Encoded signal buffer"
    );

    Ok(buffer)
}

/// Canonical amplitude of every cell in one Pass, terminators included.
fn pass_amplitudes(digits: &[Symbol], quantizer: &Quantizer, terminator_count: usize) -> Vec<i16> {
    let terminator = quantizer.symbol_to_amplitude(quantizer.terminator());

    digits
        .iter()
        .map(|&digit| quantizer.symbol_to_amplitude(digit))
        .chain(std::iter::repeat(terminator).take(terminator_count))
        .collect()
}

/// Number of complete Passes that fit in the buffer for a message of `digit_count` digits.
pub fn full_passes(digit_count: usize, params: &CodecParams) -> usize {
    let pass_samples = (digit_count + params.terminator_count) * params.cell_size;
    if pass_samples == 0 {
        return 0;
    }
    params.total_samples() / pass_samples
}

/// Longest message that still fits one complete Pass, terminators included.
///
/// Digits past this point are written only once, never followed by a
/// terminator run, and the decoder cannot tell them from a trailing fragment.
pub fn single_pass_capacity(params: &CodecParams) -> usize {
    (params.total_samples() / params.cell_size.max(1)).saturating_sub(params.terminator_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> CodecParams {
        CodecParams {
            sample_rate: 100,
            duration_seconds: 1.0, // 100 samples
            cell_size: 4,
            terminator_count: 2,
            ..CodecParams::default()
        }
    }

    #[test]
    fn test_encode_empty_text() {
        assert!(matches!(encode("", &small_params()), Err(CodecError::EmptyInput)));
    }

    #[test]
    fn test_encode_invalid_symbol() {
        let result = encode("12a3", &small_params());
        assert!(matches!(
            result,
            Err(CodecError::InvalidSymbol { character: 'a', position: 2 })
        ));
    }

    #[test]
    fn test_non_ascii_digits_rejected() {
        // Arabic-Indic digit three: numeric, but not an ASCII digit
        assert!(matches!(
            parse_digits("1\u{0663}"),
            Err(CodecError::InvalidSymbol { position: 1, .. })
        ));
    }

    #[test]
    fn test_output_length_is_fixed() {
        let params = small_params();
        for text in ["0", "07", "123456789", "98765432109876543210"] {
            assert_eq!(encode(text, &params).unwrap().len(), 100);
        }
        assert_eq!(encode("5", &CodecParams::default()).unwrap().len(), 441_000);
    }

    #[test]
    fn test_pass_layout() {
        let params = small_params();
        let quantizer = params.quantizer();
        let buffer = encode("07", &params).unwrap();

        let zero = quantizer.symbol_to_amplitude(0);
        let seven = quantizer.symbol_to_amplitude(7);
        let terminator = quantizer.symbol_to_amplitude(10);

        assert!(buffer[0..4].iter().all(|&s| s == zero));
        assert!(buffer[4..8].iter().all(|&s| s == seven));
        assert!(buffer[8..16].iter().all(|&s| s == terminator));
        // Second pass starts right after the terminators
        assert!(buffer[16..20].iter().all(|&s| s == zero));
    }

    #[test]
    fn test_partial_cell_left_at_zero() {
        // 102 samples with 4-sample cells: 25 cells fit, 2 samples remain
        let params = CodecParams {
            sample_rate: 102,
            ..small_params()
        };
        let buffer = encode("1", &params).unwrap();
        assert_eq!(buffer.len(), 102);
        assert_eq!(&buffer[100..], &[0, 0]);
        assert_ne!(buffer[99], 0);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let params = small_params();
        assert_eq!(encode("31415", &params).unwrap(), encode("31415", &params).unwrap());
    }

    #[test]
    fn test_full_passes() {
        let params = small_params();
        // "07" + 2 terminators = 4 cells = 16 samples; 100 / 16 = 6
        assert_eq!(full_passes(2, &params), 6);
        assert_eq!(full_passes(30, &params), 0);
    }

    #[test]
    fn test_single_pass_capacity() {
        // 25 cells, 2 of them terminators
        let params = small_params();
        assert_eq!(single_pass_capacity(&params), 23);
        assert_eq!(full_passes(23, &params), 1);
        assert_eq!(full_passes(24, &params), 0);

        // 441000 / 16 = 27562 cells at the defaults
        let params = CodecParams::default();
        assert_eq!(single_pass_capacity(&params), 27_560);
        assert_eq!(full_passes(27_560, &params), 1);
        assert_eq!(full_passes(27_561, &params), 0);
    }
}
