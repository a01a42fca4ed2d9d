//! Recording sessions over the committed raw history
//!
//! A session remembers where the raw sequence ended when it started and, when
//! finished, slices everything committed since. Writing the result anywhere
//! is left to the caller.

use crate::error::{EegError, EegResult};
use crate::recorder::ChannelRecorder;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// A finished recording of raw samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// `%Y-%m%d-%H%M%S-<uuid>` of the finish time
    pub id: String,
    /// Sampling rate of `data` in Hz
    #[serde(rename = "sf")]
    pub sample_rate: u32,
    /// Raw samples in receive order
    pub data: Vec<i16>,
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
}

impl Recording {
    /// Recording length in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.data.len() as f64 / self.sample_rate as f64
        }
    }

    /// Suggested file name for this recording
    pub fn file_name(&self) -> String {
        format!("{}.json", self.id)
    }

    pub fn to_json(&self) -> EegResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> EegResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// An open recording session
#[derive(Debug, Clone)]
pub struct RecordingSession {
    start_index: usize,
    started_at: DateTime<Local>,
}

impl RecordingSession {
    /// Start recording from the current end of the committed raw history
    pub fn start(recorder: &ChannelRecorder) -> Self {
        let start_index = recorder.raw().len();
        debug!(start_index, "recording session started");
        Self {
            start_index,
            started_at: Local::now(),
        }
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Number of raw samples captured so far
    pub fn captured(&self, recorder: &ChannelRecorder) -> usize {
        recorder.raw().len().saturating_sub(self.start_index)
    }

    /// Close the session and slice the samples committed since `start`
    pub fn finish(self, recorder: &ChannelRecorder, sample_rate: u32) -> EegResult<Recording> {
        let raw = recorder.raw();
        if raw.len() < self.start_index {
            return Err(EegError::RecordingInvalidated {
                start_index: self.start_index,
                available: raw.len(),
            });
        }

        let ended_at = Local::now();
        let id = format!("{}{}", ended_at.format("%Y-%m%d-%H%M%S-"), Uuid::new_v4());
        let data = raw[self.start_index..].to_vec();
        debug!(%id, samples = data.len(), "recording session finished");

        Ok(Recording {
            id,
            sample_rate,
            data,
            started_at: self.started_at,
            ended_at,
        })
    }
}
