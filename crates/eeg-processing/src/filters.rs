//! Zero-phase FIR band-pass filtering for raw EEG windows

use eeg_core::{validate_sample_rate, EegError, EegResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::warn;

/// Samples with a larger magnitude are zeroed before filtering
pub const FILTER_ARTIFACT_THRESHOLD: f64 = 2500.0;

/// Band-pass filter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Number of FIR taps
    pub taps: usize,
    /// Low cutoff (Hz)
    pub low_cutoff: f64,
    /// High cutoff (Hz)
    pub high_cutoff: f64,
    /// Magnitude above which input samples are replaced with zero
    pub artifact_threshold: f64,
}

impl FilterConfig {
    /// Create bandpass filter configuration
    pub fn bandpass(low_cutoff: f64, high_cutoff: f64, taps: usize) -> Self {
        Self {
            taps,
            low_cutoff,
            high_cutoff,
            artifact_threshold: FILTER_ARTIFACT_THRESHOLD,
        }
    }

    /// 10-tap 1–45 Hz band-pass used for the live display
    pub fn eeg_bandpass() -> Self {
        Self::bandpass(1.0, 45.0, 10)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::eeg_bandpass()
    }
}

/// Normalized sinc, `sin(pi x) / (pi x)`
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Symmetric Hamming window
fn hamming(len: usize) -> Vec<f64> {
    if len == 1 {
        return vec![1.0];
    }
    let denom = (len - 1) as f64;
    (0..len)
        .map(|n| 0.54 - 0.46 * (2.0 * PI * n as f64 / denom).cos())
        .collect()
}

/// Finite impulse response filter applied forward and backward
#[derive(Debug, Clone, PartialEq)]
pub struct FirFilter {
    coefficients: Vec<f64>,
}

impl FirFilter {
    /// Wrap existing coefficients
    pub fn from_coefficients(coefficients: Vec<f64>) -> EegResult<Self> {
        if coefficients.is_empty() {
            return Err(EegError::InvalidFilterConfig {
                reason: "FIR filter needs at least one coefficient".to_string(),
            });
        }
        Ok(Self { coefficients })
    }

    /// Window-method band-pass design with a Hamming window.
    ///
    /// Cutoffs are normalized to `floor(sample_rate / 2)` and the response is
    /// scaled to unit gain at the centre of the pass band.
    pub fn bandpass(config: &FilterConfig, sample_rate: f64) -> EegResult<Self> {
        let sample_rate = validate_sample_rate(sample_rate)?;
        let nyquist = (sample_rate / 2.0).floor();

        if config.taps == 0 {
            return Err(EegError::InvalidFilterConfig {
                reason: "FIR filter needs at least one tap".to_string(),
            });
        }
        if !(config.low_cutoff > 0.0 && config.low_cutoff < config.high_cutoff) {
            return Err(EegError::InvalidFilterConfig {
                reason: format!(
                    "cutoffs must satisfy 0 < low < high, got {} and {}",
                    config.low_cutoff, config.high_cutoff
                ),
            });
        }
        if config.high_cutoff >= nyquist {
            return Err(EegError::InvalidFilterConfig {
                reason: format!(
                    "high cutoff {}Hz must be below {}Hz for a {}Hz sampling rate",
                    config.high_cutoff, nyquist, sample_rate
                ),
            });
        }

        let low = config.low_cutoff / nyquist;
        let high = config.high_cutoff / nyquist;
        let alpha = 0.5 * (config.taps - 1) as f64;

        let mut coefficients: Vec<f64> = hamming(config.taps)
            .into_iter()
            .enumerate()
            .map(|(n, w)| {
                let m = n as f64 - alpha;
                (high * sinc(high * m) - low * sinc(low * m)) * w
            })
            .collect();

        let centre = 0.5 * (low + high);
        let gain: f64 = coefficients
            .iter()
            .enumerate()
            .map(|(n, h)| h * (PI * (n as f64 - alpha) * centre).cos())
            .sum();
        for h in &mut coefficients {
            *h /= gain;
        }

        Ok(Self { coefficients })
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Delay line contents after a unit step has settled
    fn step_state(&self) -> Vec<f64> {
        let b = &self.coefficients;
        (1..b.len()).map(|i| b[i..].iter().sum()).collect()
    }

    /// Single pass, transposed direct form, starting from delay line `state`
    fn lfilter(&self, input: &[f64], mut state: Vec<f64>) -> Vec<f64> {
        let b = &self.coefficients;
        let order = state.len();
        let mut output = Vec::with_capacity(input.len());

        for &x in input {
            let y = b[0] * x + state.first().copied().unwrap_or(0.0);
            for i in 0..order {
                let next = if i + 1 < order { state[i + 1] } else { 0.0 };
                state[i] = b[i + 1] * x + next;
            }
            output.push(y);
        }

        output
    }

    /// Zero-phase filtering: forward pass, backward pass, same length out.
    ///
    /// The input is padded at both ends with an odd extension of `3 * taps`
    /// samples (fewer for short inputs) and each pass starts from the steady
    /// state for its first sample, which keeps edge transients small.
    pub fn filtfilt(&self, signal: &[f64]) -> Vec<f64> {
        if signal.is_empty() {
            return Vec::new();
        }

        let padlen = (3 * self.coefficients.len()).min(signal.len() - 1);
        let extended = odd_extension(signal, padlen);
        let zi = self.step_state();

        let x0 = extended[0];
        let mut forward = self.lfilter(&extended, zi.iter().map(|z| z * x0).collect());
        forward.reverse();

        let y0 = forward[0];
        let mut backward = self.lfilter(&forward, zi.iter().map(|z| z * y0).collect());
        backward.reverse();

        backward[padlen..padlen + signal.len()].to_vec()
    }
}

/// Point-reflect `n` samples about each end of `signal`
fn odd_extension(signal: &[f64], n: usize) -> Vec<f64> {
    let first = signal[0];
    let last_idx = signal.len() - 1;
    let last = signal[last_idx];

    let mut out = Vec::with_capacity(signal.len() + 2 * n);
    out.extend((1..=n).rev().map(|i| 2.0 * first - signal[i]));
    out.extend_from_slice(signal);
    out.extend((1..=n).map(|i| 2.0 * last - signal[last_idx - i]));
    out
}

/// Copy of `samples` with every `|v| > threshold` replaced by zero
pub fn reject_artifacts(samples: &[f64], threshold: f64) -> Vec<f64> {
    samples
        .iter()
        .map(|&v| if v.abs() > threshold { 0.0 } else { v })
        .collect()
}

/// Artifact rejection followed by a zero-phase FIR band-pass
#[derive(Debug, Clone)]
pub struct BandpassFilter {
    config: FilterConfig,
    fir: FirFilter,
    sample_rate: f64,
}

impl BandpassFilter {
    pub fn new(config: FilterConfig, sample_rate: f64) -> EegResult<Self> {
        let fir = FirFilter::bandpass(&config, sample_rate)?;
        Ok(Self {
            config,
            fir,
            sample_rate,
        })
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn fir(&self) -> &FirFilter {
        &self.fir
    }

    /// Filter one window; output length equals input length
    pub fn apply(&self, samples: &[f64]) -> Vec<f64> {
        let cleaned = reject_artifacts(samples, self.config.artifact_threshold);
        self.fir.filtfilt(&cleaned)
    }
}

/// Band-pass a window with the default 1–45 Hz display filter.
///
/// Never fails: if no filter can be designed for `sample_rate` the window is
/// returned with artifacts removed but otherwise unfiltered.
pub fn bandpass_filter(samples: &[f64], sample_rate: f64) -> Vec<f64> {
    match BandpassFilter::new(FilterConfig::eeg_bandpass(), sample_rate) {
        Ok(filter) => filter.apply(samples),
        Err(e) => {
            warn!("bandpass filter unavailable: {}", e);
            reject_artifacts(samples, FILTER_ARTIFACT_THRESHOLD)
        }
    }
}
