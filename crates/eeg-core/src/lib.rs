//! EEG-Core: Foundation types for headset stream processing
//!
//! Channel values, the staged per-channel recorder and recording sessions.

pub mod channel;
pub mod error;
pub mod recorder;
pub mod recording;

pub use channel::*;
pub use error::{validate_sample_rate, EegError, EegResult};
pub use recorder::{ChannelRecorder, ChannelSink, RecorderConfig, DEFAULT_ARTIFACT_THRESHOLD};
pub use recording::{Recording, RecordingSession};
