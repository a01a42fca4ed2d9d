//! Periodogram power spectrum with band cropping and Gaussian smoothing

use num_complex::Complex;
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::warn;

/// Spectrum estimation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumConfig {
    /// Lowest frequency kept after cropping (Hz)
    pub min_freq: f64,
    /// Crop end (Hz); the bin nearest this frequency is excluded
    pub max_freq: f64,
    /// Tukey taper fraction, 0 = rectangular, 1 = Hann
    pub tukey_alpha: f64,
    /// Gaussian smoothing width in bins, 0 disables smoothing
    pub smoothing_sigma: f64,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            min_freq: 1.0,
            max_freq: 45.0,
            tukey_alpha: 0.5,
            smoothing_sigma: 1.0,
        }
    }
}

/// Parallel frequency and power sequences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    /// Bin frequencies (Hz)
    pub freqs: Vec<f64>,
    /// Power spectral density per bin
    pub power: Vec<f64>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }

    /// Frequency of the strongest bin
    pub fn peak_frequency(&self) -> Option<f64> {
        self.power
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| self.freqs[i])
    }

    /// Keep bins `[nearest(min_freq), nearest(max_freq))`
    pub fn crop(&self, min_freq: f64, max_freq: f64) -> Spectrum {
        if self.is_empty() {
            return Spectrum::default();
        }
        let lo = nearest_bin(&self.freqs, min_freq);
        let hi = nearest_bin(&self.freqs, max_freq).max(lo);
        Spectrum {
            freqs: self.freqs[lo..hi].to_vec(),
            power: self.power[lo..hi].to_vec(),
        }
    }
}

/// Index of the first bin closest to `target`; 0 for an empty slice
pub fn nearest_bin(freqs: &[f64], target: f64) -> usize {
    freqs
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(best, best_dist), (i, &f)| {
            let dist = (f - target).abs();
            if dist < best_dist { (i, dist) } else { (best, best_dist) }
        })
        .0
}

/// Tukey (tapered cosine) window.
///
/// `periodic` builds the DFT-even variant used for spectral estimation.
pub fn tukey_window(len: usize, alpha: f64, periodic: bool) -> Vec<f64> {
    if len <= 1 {
        return vec![1.0; len];
    }
    let m = if periodic { len + 1 } else { len };

    let window: Vec<f64> = if alpha <= 0.0 {
        vec![1.0; m]
    } else if alpha >= 1.0 {
        // Hann
        (0..m)
            .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / (m - 1) as f64).cos())
            .collect()
    } else {
        let span = (m - 1) as f64;
        let width = (alpha * span / 2.0).floor() as usize;
        (0..m)
            .map(|n| {
                let x = n as f64;
                if n <= width {
                    0.5 * (1.0 + (PI * (-1.0 + 2.0 * x / alpha / span)).cos())
                } else if n >= m - width - 1 {
                    0.5 * (1.0 + (PI * (-2.0 / alpha + 1.0 + 2.0 * x / alpha / span)).cos())
                } else {
                    1.0
                }
            })
            .collect()
    };

    let mut window = window;
    window.truncate(len);
    window
}

/// Gaussian smoothing with `sigma` in samples.
///
/// The kernel reaches four sigma each side and the signal is mirrored at
/// both edges (`d c b a | a b c d | d c b a`).
pub fn gaussian_smooth(values: &[f64], sigma: f64) -> Vec<f64> {
    if values.is_empty() || sigma <= 0.0 {
        return values.to_vec();
    }

    let radius = (4.0 * sigma + 0.5) as isize;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x as f64 / sigma).powi(2)).exp())
        .collect();
    let total: f64 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= total;
    }

    let n = values.len() as isize;
    let reflect = |i: isize| -> usize {
        let period = 2 * n;
        let m = i.rem_euclid(period);
        (if m < n { m } else { period - 1 - m }) as usize
    };

    (0..n)
        .map(|i| {
            kernel
                .iter()
                .zip(-radius..=radius)
                .map(|(k, offset)| k * values[reflect(i + offset)])
                .sum()
        })
        .collect()
}

/// Spectrum estimator holding a reusable FFT planner
pub struct SpectrumAnalyzer {
    config: SpectrumConfig,
    planner: RealFftPlanner<f64>,
}

impl std::fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new(SpectrumConfig::default())
    }
}

impl SpectrumAnalyzer {
    pub fn new(config: SpectrumConfig) -> Self {
        Self {
            config,
            planner: RealFftPlanner::new(),
        }
    }

    pub fn config(&self) -> &SpectrumConfig {
        &self.config
    }

    /// One-sided periodogram over the whole window.
    ///
    /// The mean is removed, the window tapered with a periodic Tukey window
    /// and the result scaled as a density (units²/Hz).
    pub fn periodogram(&mut self, samples: &[f64], sample_rate: f64) -> Spectrum {
        let n = samples.len();
        if n == 0 || sample_rate.is_nan() || sample_rate <= 0.0 {
            return Spectrum::default();
        }

        let window = tukey_window(n, self.config.tukey_alpha, true);
        let mean = samples.iter().sum::<f64>() / n as f64;

        let fft = self.planner.plan_fft_forward(n);
        let mut input = fft.make_input_vec();
        for ((slot, &x), &w) in input.iter_mut().zip(samples).zip(&window) {
            *slot = (x - mean) * w;
        }
        let mut output: Vec<Complex<f64>> = fft.make_output_vec();
        if let Err(e) = fft.process(&mut input, &mut output) {
            warn!("periodogram FFT failed: {}", e);
            return Spectrum::default();
        }

        let scale = 1.0 / (sample_rate * window.iter().map(|w| w * w).sum::<f64>());
        let bins = output.len();
        let power = output
            .iter()
            .enumerate()
            .map(|(k, c)| {
                let p = c.norm_sqr() * scale;
                // every bin except DC (and Nyquist for even n) folds in its mirror
                let mirrored = k > 0 && !(n % 2 == 0 && k == bins - 1);
                if mirrored { 2.0 * p } else { p }
            })
            .collect();
        let freqs = (0..bins).map(|k| k as f64 * sample_rate / n as f64).collect();

        Spectrum { freqs, power }
    }

    /// Periodogram cropped to the configured band and smoothed
    pub fn power_spectrum(&mut self, samples: &[f64], sample_rate: f64) -> Spectrum {
        let cropped = self
            .periodogram(samples, sample_rate)
            .crop(self.config.min_freq, self.config.max_freq);
        Spectrum {
            power: gaussian_smooth(&cropped.power, self.config.smoothing_sigma),
            freqs: cropped.freqs,
        }
    }
}

/// Smoothed power spectrum of `samples` between `min_freq` and `max_freq`
pub fn power_spectrum(samples: &[f64], sample_rate: f64, min_freq: f64, max_freq: f64) -> Spectrum {
    let config = SpectrumConfig {
        min_freq,
        max_freq,
        ..SpectrumConfig::default()
    };
    SpectrumAnalyzer::new(config).power_spectrum(samples, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sample_rate: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_tukey_shape() {
        let w = tukey_window(11, 0.5, false);
        assert_eq!(w.len(), 11);
        assert!(w[0].abs() < 1e-12);
        assert!(w[10].abs() < 1e-12);
        assert!((w[5] - 1.0).abs() < 1e-12);
        for i in 0..5 {
            assert!((w[i] - w[10 - i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_tukey_limits() {
        assert_eq!(tukey_window(4, 0.0, false), vec![1.0; 4]);
        assert_eq!(tukey_window(1, 0.5, true), vec![1.0]);
        assert!(tukey_window(0, 0.5, true).is_empty());
        let hann = tukey_window(5, 1.0, false);
        assert!((hann[2] - 1.0).abs() < 1e-12);
        assert!(hann[0].abs() < 1e-12);
    }

    #[test]
    fn test_periodic_window_drops_last_point() {
        let periodic = tukey_window(8, 0.5, true);
        let symmetric = tukey_window(9, 0.5, false);
        assert_eq!(periodic.as_slice(), &symmetric[..8]);
    }

    #[test]
    fn test_nearest_bin() {
        let freqs = [0.0, 0.5, 1.0, 1.5, 2.0];
        assert_eq!(nearest_bin(&freqs, 1.1), 2);
        assert_eq!(nearest_bin(&freqs, 0.75), 1); // tie keeps the first
        assert_eq!(nearest_bin(&freqs, 99.0), 4);
        assert_eq!(nearest_bin(&[], 3.0), 0);
    }

    #[test]
    fn test_gaussian_preserves_constant_and_mass() {
        let smoothed = gaussian_smooth(&[2.0; 7], 1.0);
        assert!(smoothed.iter().all(|v| (v - 2.0).abs() < 1e-12));

        let mut impulse = vec![0.0; 21];
        impulse[10] = 1.0;
        let spread = gaussian_smooth(&impulse, 1.0);
        assert!((spread.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(spread[10] > spread[9] && spread[9] > spread[8]);
        assert!((spread[9] - spread[11]).abs() < 1e-15);
    }

    #[test]
    fn test_gaussian_short_input() {
        assert_eq!(gaussian_smooth(&[5.0], 1.0), vec![5.0]);
        assert!(gaussian_smooth(&[], 1.0).is_empty());
        assert_eq!(gaussian_smooth(&[1.0, 2.0], 0.0), vec![1.0, 2.0]);
    }

    #[test]
    fn test_periodogram_bins() {
        let mut analyzer = SpectrumAnalyzer::default();
        let spectrum = analyzer.periodogram(&sine(10.0, 512.0, 2560), 512.0);
        assert_eq!(spectrum.len(), 2560 / 2 + 1);
        assert!((spectrum.freqs[1] - 0.2).abs() < 1e-12);
        assert_eq!(spectrum.freqs.last().copied(), Some(256.0));
        assert!((spectrum.peak_frequency().unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_periodogram_removes_mean() {
        let mut analyzer = SpectrumAnalyzer::default();
        let spectrum = analyzer.periodogram(&[500.0; 64], 64.0);
        assert!(spectrum.power.iter().all(|p| p.abs() < 1e-9));
    }

    #[test]
    fn test_density_scaling_integrates_to_variance() {
        // white-ish deterministic sequence, rectangular window: sum(P)*df == variance
        let samples: Vec<f64> = (0..256).map(|i| ((i * 7919) % 97) as f64 - 48.0).collect();
        let mean = samples.iter().sum::<f64>() / 256.0;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 256.0;

        let mut analyzer = SpectrumAnalyzer::new(SpectrumConfig {
            tukey_alpha: 0.0,
            ..SpectrumConfig::default()
        });
        let spectrum = analyzer.periodogram(&samples, 128.0);
        let df = 128.0 / 256.0;
        let integrated: f64 = spectrum.power.iter().sum::<f64>() * df;
        assert!((integrated - variance).abs() / variance < 1e-9);
    }

    #[test]
    fn test_power_spectrum_crops_band() {
        let spectrum = power_spectrum(&sine(10.0, 512.0, 2560), 512.0, 1.0, 45.0);
        assert_eq!(spectrum.freqs.len(), spectrum.power.len());
        assert!((spectrum.freqs[0] - 1.0).abs() < 1e-9);
        assert!(*spectrum.freqs.last().unwrap() < 45.0);
        assert_eq!(spectrum.len(), 220);
        assert!((spectrum.peak_frequency().unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input() {
        let spectrum = power_spectrum(&[], 512.0, 1.0, 45.0);
        assert!(spectrum.freqs.is_empty());
        assert!(spectrum.power.is_empty());
    }
}
