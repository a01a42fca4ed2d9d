//! EEG-Processing: Spectral analysis of raw EEG windows
//!
//! Band-pass filtering, periodogram estimation, band powers and the
//! per-refresh pipeline that ties them to a channel recorder.

pub mod bands;
pub mod config;
pub mod filters;
pub mod pipeline;
pub mod scaling;
pub mod spectrum;

pub use bands::{average_band_power, spectrum_band_power, BandPowers, EegBand, BAND_COUNT, EEG_BAND_EDGES};
pub use config::ProcessingConfig;
pub use filters::{bandpass_filter, reject_artifacts, BandpassFilter, FilterConfig, FirFilter, FILTER_ARTIFACT_THRESHOLD};
pub use pipeline::{DisplayFrame, SpectralPipeline, WindowAnalysis};
pub use scaling::{normalize, standardize};
pub use spectrum::{gaussian_smooth, nearest_bin, power_spectrum, tukey_window, Spectrum, SpectrumAnalyzer, SpectrumConfig};
