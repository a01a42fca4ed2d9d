//! Configuration for the per-tick spectral pipeline

use crate::filters::{FilterConfig, FirFilter};
use crate::spectrum::SpectrumConfig;
use eeg_core::{config_error, validate_sample_rate, EegResult, DEFAULT_SAMPLE_RATE};
use serde::{Deserialize, Serialize};

/// Window lengths, filter and spectrum settings for one display refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Raw channel sampling rate (Hz)
    pub sample_rate: u32,
    /// Length of the long raw overview window (seconds)
    pub long_window_secs: usize,
    /// Length of the window that is filtered and analysed (seconds)
    pub short_window_secs: usize,
    /// Band-pass applied to the short window
    pub filter: FilterConfig,
    /// Periodogram, crop and smoothing settings
    pub spectrum: SpectrumConfig,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self::eeg_display()
    }
}

impl ProcessingConfig {
    /// 20 s overview, 5 s analysis window, 1-45 Hz at 512 Hz
    pub fn eeg_display() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            long_window_secs: 20,
            short_window_secs: 5,
            filter: FilterConfig::eeg_bandpass(),
            spectrum: SpectrumConfig::default(),
        }
    }

    /// Shorter windows for quicker feedback at the cost of frequency resolution
    pub fn quick_preview() -> Self {
        Self {
            long_window_secs: 10,
            short_window_secs: 2,
            ..Self::eeg_display()
        }
    }

    /// Samples in the long window
    pub fn long_window_len(&self) -> usize {
        self.long_window_secs * self.sample_rate as usize
    }

    /// Samples in the short window
    pub fn short_window_len(&self) -> usize {
        self.short_window_secs * self.sample_rate as usize
    }

    /// Check the configuration for consistency
    pub fn validate(&self) -> EegResult<()> {
        validate_sample_rate(self.sample_rate as f64)?;

        if self.short_window_secs == 0 {
            return Err(config_error!("short_window_secs", "must be at least 1 second"));
        }
        if self.long_window_secs < self.short_window_secs {
            return Err(config_error!(
                "long_window_secs",
                "{}s is shorter than the {}s analysis window",
                self.long_window_secs,
                self.short_window_secs
            ));
        }
        if !(self.spectrum.min_freq >= 0.0 && self.spectrum.min_freq < self.spectrum.max_freq) {
            return Err(config_error!(
                "spectrum",
                "frequency range {}..{}Hz is empty",
                self.spectrum.min_freq,
                self.spectrum.max_freq
            ));
        }
        if !(0.0..=1.0).contains(&self.spectrum.tukey_alpha) {
            return Err(config_error!(
                "spectrum.tukey_alpha",
                "must lie in [0, 1], got {}",
                self.spectrum.tukey_alpha
            ));
        }
        if self.spectrum.smoothing_sigma < 0.0 {
            return Err(config_error!("spectrum.smoothing_sigma", "must not be negative"));
        }

        FirFilter::bandpass(&self.filter, self.sample_rate as f64)?;
        Ok(())
    }

    /// Export configuration as pretty JSON
    pub fn to_json(&self) -> EegResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Import configuration from JSON
    pub fn from_json(json: &str) -> EegResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
