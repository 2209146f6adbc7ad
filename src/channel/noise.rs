//! Seeded channel noise
//!
//! Distorts a PCM buffer the way a lossy audio path would. Samples are
//! converted to full-scale floats (`[-1.0, 1.0)`), noise is added, the result
//! is clipped to full scale and re-quantized to 16 bits.
//!
//! Gaussian samples come from a Box-Muller transform over a ChaCha8 stream, so
//! a given seed always produces the same distortion. Pink noise sums Gaussian
//! rows on the Voss-McCartney schedule: row `k` is redrawn every `2^(k+1)`
//! samples, which puts roughly equal power in every octave.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const FULL_SCALE: f64 = 32768.0;

/// Voss-McCartney rows; the slowest one changes every 65536 samples
const PINK_ROWS: usize = 16;

/// Distortion applied by a [`Channel`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoiseModel {
    /// Pass samples through untouched
    #[default]
    None,

    /// Additive Gaussian noise with a fixed standard deviation (full-scale units)
    Gaussian { sigma: f64 },

    /// Additive Gaussian noise scaled to reach a signal-to-noise ratio in dB
    WhiteSnr { snr_db: f64 },

    /// With `probability` per sample, add `±amplitude` (full-scale units)
    Impulse { probability: f64, amplitude: f64 },

    /// Additive 1/f noise scaled to reach a signal-to-noise ratio in dB
    Pink { snr_db: f64 },
}

impl NoiseModel {
    /// Reject parameters that make no physical sense.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            NoiseModel::None => Ok(()),
            NoiseModel::Gaussian { sigma } if sigma.is_finite() && sigma >= 0.0 => Ok(()),
            NoiseModel::Gaussian { sigma } => Err(format!("sigma must be >= 0, got {}", sigma)),
            NoiseModel::WhiteSnr { snr_db } | NoiseModel::Pink { snr_db } if snr_db.is_finite() => Ok(()),
            NoiseModel::WhiteSnr { snr_db } | NoiseModel::Pink { snr_db } => {
                Err(format!("snr_db must be finite, got {}", snr_db))
            }
            NoiseModel::Impulse { probability, amplitude } => {
                if !(0.0..=1.0).contains(&probability) {
                    return Err(format!("probability must be within [0, 1], got {}", probability));
                }
                if !amplitude.is_finite() || amplitude < 0.0 {
                    return Err(format!("amplitude must be >= 0, got {}", amplitude));
                }
                Ok(())
            }
        }
    }
}

/// Standard-normal source using Box-Muller
struct GaussianSource {
    rng: ChaCha8Rng,

    /// Second sample of the last Box-Muller pair
    cached: Option<f64>,
}

impl GaussianSource {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            cached: None,
        }
    }

    fn next_sample(&mut self) -> f64 {
        if let Some(cached) = self.cached.take() {
            return cached;
        }

        let u1: f64 = self.rng.gen();
        let u2: f64 = self.rng.gen();

        // Avoid log(0)
        let u1 = u1.max(1e-10);

        let r = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * PI * u2;

        self.cached = Some(r * theta.sin());
        r * theta.cos()
    }
}

/// A noisy transmission path with a reproducible noise stream.
pub struct Channel {
    model: NoiseModel,
    source: GaussianSource,
}

impl Channel {
    pub fn new(model: NoiseModel, seed: u64) -> Self {
        Self {
            model,
            source: GaussianSource::new(seed),
        }
    }

    /// Distort `samples`, returning a new buffer of the same length.
    pub fn transmit(&mut self, samples: &[i16]) -> Vec<i16> {
        match self.model {
            NoiseModel::None => samples.to_vec(),
            NoiseModel::Gaussian { sigma } => self.add_gaussian(samples, sigma),
            NoiseModel::WhiteSnr { snr_db } => {
                let sigma = (signal_power(samples) / 10f64.powf(snr_db / 10.0)).sqrt();
                self.add_gaussian(samples, sigma)
            }
            NoiseModel::Impulse { probability, amplitude } => {
                let rng = &mut self.source.rng;
                samples
                    .iter()
                    .map(|&sample| {
                        let mut value = to_full_scale(sample);
                        if rng.gen::<f64>() < probability {
                            value += if rng.gen::<bool>() { amplitude } else { -amplitude };
                        }
                        from_full_scale(value)
                    })
                    .collect()
            }
            NoiseModel::Pink { snr_db } => {
                let noise = self.pink_noise(samples.len());
                let variance = noise.iter().map(|x| x * x).sum::<f64>() / noise.len().max(1) as f64;
                if variance == 0.0 {
                    return samples.to_vec();
                }

                let noise_power = signal_power(samples) / 10f64.powf(snr_db / 10.0);
                let scale = (noise_power / variance).sqrt();
                samples
                    .iter()
                    .zip(&noise)
                    .map(|(&sample, &n)| from_full_scale(to_full_scale(sample) + scale * n))
                    .collect()
            }
        }
    }

    /// Zero-mean Voss-McCartney sequence of `len` samples, unit-less.
    fn pink_noise(&mut self, len: usize) -> Vec<f64> {
        let mut rows = [0.0; PINK_ROWS];
        for row in rows.iter_mut() {
            *row = self.source.next_sample();
        }
        let mut running: f64 = rows.iter().sum();

        let mut noise = Vec::with_capacity(len);
        for n in 0..len {
            if n > 0 {
                let row = n.trailing_zeros() as usize;
                if row < PINK_ROWS {
                    running -= rows[row];
                    rows[row] = self.source.next_sample();
                    running += rows[row];
                }
            }
            // White term fills the octaves above the fastest row
            noise.push(running + self.source.next_sample());
        }

        let mean = noise.iter().sum::<f64>() / len.max(1) as f64;
        noise.iter_mut().for_each(|x| *x -= mean);
        noise
    }

    fn add_gaussian(&mut self, samples: &[i16], sigma: f64) -> Vec<i16> {
        samples
            .iter()
            .map(|&sample| from_full_scale(to_full_scale(sample) + sigma * self.source.next_sample()))
            .collect()
    }
}

/// Mean power of the buffer in full-scale units.
pub fn signal_power(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|&s| to_full_scale(s).powi(2)).sum::<f64>() / samples.len() as f64
}

fn to_full_scale(sample: i16) -> f64 {
    sample as f64 / FULL_SCALE
}

/// Clip to full scale and quantize back to 16 bits.
fn from_full_scale(value: f64) -> i16 {
    (value.clamp(-1.0, 1.0) * FULL_SCALE)
        .round()
        .clamp(i16::MIN as f64, i16::MAX as f64) as i16
}
