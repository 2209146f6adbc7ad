//! # Channel Simulation
//!
//! Reproducible stand-ins for the noisy path between encoder and decoder, plus
//! a score for how much of the message survived it. Used by the
//! `/debug/roundtrip` endpoint and by the codec's noise tests.

pub mod distance;
pub mod noise;

pub use distance::{error_rate, levenshtein};
pub use noise::{Channel, NoiseModel};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{self, decoder, CellStrategy, CodecParams};

    fn digits(count: usize, seed: u64) -> String {
        // Cheap deterministic digit stream; distribution does not matter here
        let mut state = seed;
        (0..count)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                char::from(b'0' + ((state >> 33) % 10) as u8)
            })
            .collect()
    }

    fn transmit_and_decode(text: &str, model: NoiseModel, seed: u64, params: &CodecParams) -> String {
        let samples = codec::encode(text, params).unwrap();
        let received = Channel::new(model, seed).transmit(&samples);
        codec::decode(&params.pcm_format(), &received, params).unwrap().text
    }

    #[test]
    fn test_survives_gaussian_noise() {
        let params = CodecParams::default();
        let text = digits(200, 1);
        let decoded = transmit_and_decode(&text, NoiseModel::Gaussian { sigma: 0.1 }, 5, &params);
        assert_eq!(decoded, text);
    }

    #[test]
    fn test_survives_impulse_noise() {
        let params = CodecParams::default();
        let text = digits(200, 2);
        let model = NoiseModel::Impulse { probability: 0.05, amplitude: 0.5 };
        assert_eq!(transmit_and_decode(&text, model, 9, &params), text);
    }

    #[test]
    fn test_survives_white_noise_at_snr() {
        let params = CodecParams::default();
        let text = digits(500, 3);
        let decoded = transmit_and_decode(&text, NoiseModel::WhiteSnr { snr_db: 20.0 }, 13, &params);
        assert_eq!(decoded, text);
    }

    #[test]
    fn test_vote_strategy_resists_impulses_better_than_mean() {
        let params = CodecParams::default();
        let quantizer = params.quantizer();
        let samples = codec::encode(&digits(100, 4), &params).unwrap();
        let clean = decoder::decode_cells(&samples, &quantizer, params.cell_size, CellStrategy::Mean);

        let model = NoiseModel::Impulse { probability: 0.05, amplitude: 0.5 };
        let received = Channel::new(model, 21).transmit(&samples);

        let cell_errors = |strategy| {
            decoder::decode_cells(&received, &quantizer, params.cell_size, strategy)
                .iter()
                .zip(&clean)
                .filter(|(a, b)| a != b)
                .count()
        };

        let mean_errors = cell_errors(CellStrategy::Mean);
        let vote_errors = cell_errors(CellStrategy::Vote);
        assert!(mean_errors > 0);
        assert!(vote_errors < mean_errors, "vote {} vs mean {}", vote_errors, mean_errors);
    }

    #[test]
    fn test_error_rate_of_noisy_roundtrip() {
        let params = CodecParams::default();
        let text = digits(50, 6);
        let decoded = transmit_and_decode(&text, NoiseModel::Gaussian { sigma: 0.02 }, 17, &params);
        assert_eq!(error_rate(&text, &decoded), 0.0);
    }

    /// Wrong digits plus missing or extra ones, over the message length.
    fn digit_error_rate(sent: &str, received: &str) -> f64 {
        let wrong = sent.bytes().zip(received.bytes()).filter(|(a, b)| a != b).count();
        let missing = sent.len().abs_diff(received.len());
        (wrong + missing) as f64 / sent.len() as f64
    }

    #[test]
    fn test_error_rates_at_reference_settings() {
        let params = CodecParams::default();
        let quantizer = params.quantizer();

        // (name, model, message length, accepted cell error range)
        let settings = [
            ("gaussian 0.1", NoiseModel::Gaussian { sigma: 0.1 }, 24_032, 0.0..0.002),
            ("impulse 5% x 0.5", NoiseModel::Impulse { probability: 0.05, amplitude: 0.5 }, 22_785, 0.0..0.03),
            // Low-frequency noise is barely reduced by a 16-sample mean
            ("pink 10 dB", NoiseModel::Pink { snr_db: 10.0 }, 5_671, 0.3..0.7),
        ];

        for (name, model, length, cell_error_range) in settings {
            let text = digits(length, length as u64);
            let samples = codec::encode(&text, &params).unwrap();
            let received = Channel::new(model, 1).transmit(&samples);

            let clean = decoder::decode_cells(&samples, &quantizer, params.cell_size, CellStrategy::Mean);
            let noisy = decoder::decode_cells(&received, &quantizer, params.cell_size, CellStrategy::Mean);
            let cell_errors = clean.iter().zip(&noisy).filter(|(a, b)| a != b).count();
            let cell_error_rate = cell_errors as f64 / clean.len() as f64;

            let decoded = codec::decode(&params.pcm_format(), &received, &params).unwrap().text;
            let digit_errors = digit_error_rate(&text, &decoded);

            println!(
                "{}: {} digits, cell error rate {:.5}, digit error rate {:.5}, {} digits recovered",
                name,
                length,
                cell_error_rate,
                digit_errors,
                decoded.len()
            );
            assert!(
                cell_error_range.contains(&cell_error_rate),
                "{}: cell error rate {}",
                name,
                cell_error_rate
            );
            if name.starts_with("impulse") {
                // Impulses cannot fake a terminator on a clipped 9, so alignment holds
                assert!(digit_errors < 0.03, "{}: digit error rate {}", name, digit_errors);
            }
        }
    }
}
