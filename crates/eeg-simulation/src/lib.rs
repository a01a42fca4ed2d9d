//! EEG-Simulation: Synthetic headset data
//!
//! Brain-state oscillator presets, a headset simulator that emits the framed
//! byte protocol, and a timer-driven stream that stands in for a serial link.

pub mod headset_simulator;
pub mod real_time_stream;
pub mod signal_patterns;

pub use headset_simulator::{HeadsetSimulator, SimulatorConfig};
pub use real_time_stream::{start_headset_stream, RealTimeHeadsetStream, StreamCommand, StreamConfig, StreamStats};
pub use signal_patterns::{BandAmplitudes, BrainState, BAND_FREQUENCIES};
