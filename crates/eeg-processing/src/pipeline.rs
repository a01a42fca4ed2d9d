//! Per-refresh spectral pipeline over the recorder's raw channel

use crate::bands::{spectrum_band_power, BandPowers};
use crate::config::ProcessingConfig;
use crate::filters::BandpassFilter;
use crate::spectrum::{Spectrum, SpectrumAnalyzer};
use eeg_core::{Channel, ChannelRecorder, EegResult};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, trace};

/// Everything a display needs for one refresh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayFrame {
    /// Long raw overview window, zero padded and artifact rejected
    pub long_window: Vec<f64>,
    /// Most recent raw samples that feed the analysis
    pub short_window: Vec<f64>,
    /// Band-passed short window
    pub filtered: Vec<f64>,
    /// Smoothed, cropped power spectrum of the filtered window
    pub spectrum: Spectrum,
    pub band_powers: BandPowers,
    /// Band powers scaled to `[0, 1]`
    pub normalized_band_powers: BandPowers,
    /// Latest committed eSense values
    pub attention: Option<u8>,
    pub meditation: Option<u8>,
    /// Wall time spent computing the frame
    pub latency_us: u64,
}

/// Analysis output of a single window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowAnalysis {
    pub filtered: Vec<f64>,
    pub spectrum: Spectrum,
    pub band_powers: BandPowers,
}

/// Filter, spectrum and band-power stages with a cached FFT planner
#[derive(Debug)]
pub struct SpectralPipeline {
    config: ProcessingConfig,
    filter: BandpassFilter,
    analyzer: SpectrumAnalyzer,
    frames: u64,
}

impl SpectralPipeline {
    /// Build the pipeline, rejecting inconsistent configurations
    pub fn new(config: ProcessingConfig) -> EegResult<Self> {
        config.validate()?;
        let filter = BandpassFilter::new(config.filter.clone(), config.sample_rate as f64)?;
        let analyzer = SpectrumAnalyzer::new(config.spectrum.clone());
        debug!(
            "spectral pipeline ready: {}Hz, {}s/{}s windows, {} taps",
            config.sample_rate, config.long_window_secs, config.short_window_secs, config.filter.taps
        );
        Ok(Self {
            config,
            filter,
            analyzer,
            frames: 0,
        })
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Frames produced so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Filter one window and compute its spectrum and band powers
    pub fn process_window(&mut self, window: &[f64]) -> WindowAnalysis {
        let filtered = self.filter.apply(window);
        let spectrum = self
            .analyzer
            .power_spectrum(&filtered, self.config.sample_rate as f64);
        let band_powers = spectrum_band_power(&spectrum);
        WindowAnalysis {
            filtered,
            spectrum,
            band_powers,
        }
    }

    /// Compute a display frame from the recorder's committed data
    pub fn process(&mut self, recorder: &ChannelRecorder) -> DisplayFrame {
        let started = Instant::now();
        let rate = self.config.sample_rate as usize;

        let long_window = recorder.window_of_last_n_seconds(Channel::Raw, self.config.long_window_secs, rate);
        let short_window = recorder.window_of_last_n_seconds(Channel::Raw, self.config.short_window_secs, rate);
        let analysis = self.process_window(&short_window);

        self.frames += 1;
        let latency_us = started.elapsed().as_micros() as u64;
        trace!("frame {} computed in {}us", self.frames, latency_us);

        DisplayFrame {
            long_window,
            short_window,
            filtered: analysis.filtered,
            normalized_band_powers: analysis.band_powers.normalized(),
            band_powers: analysis.band_powers,
            spectrum: analysis.spectrum,
            attention: recorder.attention().last().copied(),
            meditation: recorder.meditation().last().copied(),
            latency_us,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eeg_core::{ChannelValue, EegError};

    #[test]
    fn test_rejects_invalid_config() {
        let config = ProcessingConfig {
            short_window_secs: 0,
            ..ProcessingConfig::default()
        };
        assert!(matches!(
            SpectralPipeline::new(config),
            Err(EegError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_empty_recorder_frame() {
        let mut pipeline = SpectralPipeline::new(ProcessingConfig::default()).unwrap();
        let frame = pipeline.process(&ChannelRecorder::default());

        assert_eq!(frame.long_window.len(), 20 * 512);
        assert_eq!(frame.short_window.len(), 5 * 512);
        assert_eq!(frame.filtered.len(), 5 * 512);
        assert_eq!(frame.spectrum.freqs.len(), frame.spectrum.power.len());
        assert!(frame.band_powers.as_slice().iter().all(|p| p.abs() < 1e-12));
        assert_eq!(frame.attention, None);
        assert_eq!(pipeline.frames(), 1);
    }

    #[test]
    fn test_frame_reports_latest_esense() {
        let mut recorder = ChannelRecorder::default();
        recorder.dispatch(ChannelValue::Attention(30));
        recorder.dispatch(ChannelValue::Attention(70));
        recorder.dispatch(ChannelValue::Meditation(12));
        recorder.commit();

        let mut pipeline = SpectralPipeline::new(ProcessingConfig::quick_preview()).unwrap();
        let frame = pipeline.process(&recorder);
        assert_eq!(frame.attention, Some(70));
        assert_eq!(frame.meditation, Some(12));
        assert_eq!(frame.short_window.len(), 2 * 512);
    }

    #[test]
    fn test_process_window_preserves_length() {
        let mut pipeline = SpectralPipeline::new(ProcessingConfig::default()).unwrap();
        let window: Vec<f64> = (0..700).map(|i| ((i % 13) as f64 - 6.0) * 10.0).collect();
        let analysis = pipeline.process_window(&window);
        assert_eq!(analysis.filtered.len(), 700);
        assert_eq!(analysis.band_powers.as_slice().len(), 5);
    }
}
