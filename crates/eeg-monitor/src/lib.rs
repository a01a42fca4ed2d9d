//! EEG-Monitor: headless poll loop tying decoder, recorder and pipeline together

pub mod app;

pub use app::{run, save_recording, Monitor, MonitorConfig, RunSummary, POLL_INTERVAL};
