//! Per-channel staged buffers with commit and windowed reads
//!
//! Every value the decoder produces lands in a staging queue first. Readers
//! only ever see the committed sequences, and a commit moves all staged
//! values of all channels in one call, so a poll tick observes either none
//! or all of a decoded chunk.

use crate::channel::{BandVector, Channel, ChannelValue};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::trace;

/// Default magnitude above which windowed samples are treated as artifacts
pub const DEFAULT_ARTIFACT_THRESHOLD: f64 = 4000.0;

/// Receiver of decoded values.
///
/// The protocol decoder is generic over this trait so tests can capture
/// dispatches without a full recorder.
pub trait ChannelSink {
    /// Stage one decoded value
    fn dispatch(&mut self, value: ChannelValue);

    /// Make everything staged since the last commit visible
    fn commit(&mut self);

    /// Drop all staged and committed data
    fn reset(&mut self);
}

/// Recorder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Window values with a larger magnitude are replaced by zero
    pub artifact_threshold: f64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            artifact_threshold: DEFAULT_ARTIFACT_THRESHOLD,
        }
    }
}

/// One committed sequence plus its staging queue
#[derive(Debug, Clone)]
struct StagedSeries<T> {
    committed: Vec<T>,
    staged: Vec<T>,
}

impl<T: Copy> StagedSeries<T> {
    fn new() -> Self {
        Self {
            committed: Vec::new(),
            staged: Vec::new(),
        }
    }

    fn stage(&mut self, value: T) {
        self.staged.push(value);
    }

    /// Returns the number of values moved
    fn commit(&mut self) -> usize {
        let moved = self.staged.len();
        self.committed.append(&mut self.staged);
        moved
    }

    fn clear(&mut self) {
        self.committed.clear();
        self.staged.clear();
    }
}

impl<T: Copy + Into<f64>> StagedSeries<T> {
    fn window(&self, len: usize, threshold: f64) -> Vec<f64> {
        let available = self.committed.len().min(len);
        let mut out = vec![0.0; len - available];
        out.extend(
            self.committed[self.committed.len() - available..]
                .iter()
                .map(|&v| {
                    let v: f64 = v.into();
                    if v.abs() > threshold { 0.0 } else { v }
                }),
        );
        out
    }

    fn values(&self) -> Vec<f64> {
        self.committed.iter().map(|&v| v.into()).collect()
    }

    fn range(&self, range: Range<usize>) -> Vec<f64> {
        let end = range.end.min(self.committed.len());
        let start = range.start.min(end);
        self.committed[start..end].iter().map(|&v| v.into()).collect()
    }
}

/// Buffers for every channel the headset reports
#[derive(Debug, Clone)]
pub struct ChannelRecorder {
    config: RecorderConfig,
    raw: StagedSeries<i16>,
    attention: StagedSeries<u8>,
    meditation: StagedSeries<u8>,
    blink: StagedSeries<u8>,
    poor_signal: StagedSeries<u8>,
    bands: StagedSeries<BandVector>,
    commits: u64,
}

impl Default for ChannelRecorder {
    fn default() -> Self {
        Self::new(RecorderConfig::default())
    }
}

impl ChannelRecorder {
    /// Create an empty recorder
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            raw: StagedSeries::new(),
            attention: StagedSeries::new(),
            meditation: StagedSeries::new(),
            blink: StagedSeries::new(),
            poor_signal: StagedSeries::new(),
            bands: StagedSeries::new(),
            commits: 0,
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Stage a value on its channel
    pub fn dispatch(&mut self, value: ChannelValue) {
        match value {
            ChannelValue::Raw(v) => self.raw.stage(v),
            ChannelValue::Attention(v) => self.attention.stage(v),
            ChannelValue::Meditation(v) => self.meditation.stage(v),
            ChannelValue::Blink(v) => self.blink.stage(v),
            ChannelValue::PoorSignal(v) => self.poor_signal.stage(v),
            ChannelValue::Bands(v) => self.bands.stage(v),
        }
    }

    /// Append every staging queue to its committed sequence and clear it
    pub fn commit(&mut self) {
        let raw = self.raw.commit();
        let scalars = self.attention.commit()
            + self.meditation.commit()
            + self.blink.commit()
            + self.poor_signal.commit();
        let bands = self.bands.commit();
        self.commits += 1;
        trace!(raw, scalars, bands, "committed staged values");
    }

    /// Clear committed and staged data on every channel
    pub fn reset(&mut self) {
        self.raw.clear();
        self.attention.clear();
        self.meditation.clear();
        self.blink.clear();
        self.poor_signal.clear();
        self.bands.clear();
        self.commits = 0;
    }

    /// Exactly `n_seconds * sample_rate` of the most recent committed values.
    ///
    /// Shorter histories are left-padded with zeros. Values whose magnitude
    /// exceeds the artifact threshold are zeroed in the returned copy; the
    /// stored history is left untouched.
    pub fn window_of_last_n_seconds(&self, channel: Channel, n_seconds: usize, sample_rate: usize) -> Vec<f64> {
        let len = n_seconds * sample_rate;
        let threshold = self.config.artifact_threshold;
        match channel {
            Channel::Raw => self.raw.window(len, threshold),
            Channel::Attention => self.attention.window(len, threshold),
            Channel::Meditation => self.meditation.window(len, threshold),
            Channel::Blink => self.blink.window(len, threshold),
            Channel::PoorSignal => self.poor_signal.window(len, threshold),
        }
    }

    /// Number of committed values on a channel
    pub fn committed_len(&self, channel: Channel) -> usize {
        match channel {
            Channel::Raw => self.raw.committed.len(),
            Channel::Attention => self.attention.committed.len(),
            Channel::Meditation => self.meditation.committed.len(),
            Channel::Blink => self.blink.committed.len(),
            Channel::PoorSignal => self.poor_signal.committed.len(),
        }
    }

    /// Full committed history of a channel as floats, without artifact rejection
    pub fn committed_values(&self, channel: Channel) -> Vec<f64> {
        match channel {
            Channel::Raw => self.raw.values(),
            Channel::Attention => self.attention.values(),
            Channel::Meditation => self.meditation.values(),
            Channel::Blink => self.blink.values(),
            Channel::PoorSignal => self.poor_signal.values(),
        }
    }

    /// Committed values in `range`, clamped to the history length
    pub fn committed_range(&self, channel: Channel, range: Range<usize>) -> Vec<f64> {
        match channel {
            Channel::Raw => self.raw.range(range),
            Channel::Attention => self.attention.range(range),
            Channel::Meditation => self.meditation.range(range),
            Channel::Blink => self.blink.range(range),
            Channel::PoorSignal => self.poor_signal.range(range),
        }
    }

    pub fn raw(&self) -> &[i16] {
        &self.raw.committed
    }

    pub fn attention(&self) -> &[u8] {
        &self.attention.committed
    }

    pub fn meditation(&self) -> &[u8] {
        &self.meditation.committed
    }

    pub fn blink(&self) -> &[u8] {
        &self.blink.committed
    }

    pub fn poor_signal(&self) -> &[u8] {
        &self.poor_signal.committed
    }

    pub fn band_vectors(&self) -> &[BandVector] {
        &self.bands.committed
    }

    /// Latest committed band vector, if any
    pub fn latest_bands(&self) -> Option<BandVector> {
        self.bands.committed.last().copied()
    }

    /// Number of commits since creation or the last reset
    pub fn commit_count(&self) -> u64 {
        self.commits
    }
}

impl ChannelSink for ChannelRecorder {
    fn dispatch(&mut self, value: ChannelValue) {
        ChannelRecorder::dispatch(self, value);
    }

    fn commit(&mut self) {
        ChannelRecorder::commit(self);
    }

    fn reset(&mut self) {
        ChannelRecorder::reset(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_values_invisible_until_commit() {
        let mut recorder = ChannelRecorder::default();
        recorder.dispatch(ChannelValue::Raw(12));
        recorder.dispatch(ChannelValue::Attention(40));

        assert!(recorder.raw().is_empty());
        assert!(recorder.attention().is_empty());
        assert_eq!(recorder.window_of_last_n_seconds(Channel::Raw, 1, 4), vec![0.0; 4]);

        recorder.commit();
        assert_eq!(recorder.raw(), &[12]);
        assert_eq!(recorder.attention(), &[40]);
        assert_eq!(recorder.commit_count(), 1);
    }

    #[test]
    fn test_commit_preserves_order_across_batches() {
        let mut recorder = ChannelRecorder::default();
        recorder.dispatch(ChannelValue::Raw(1));
        recorder.dispatch(ChannelValue::Raw(2));
        recorder.commit();
        recorder.dispatch(ChannelValue::Raw(3));
        recorder.commit();
        assert_eq!(recorder.raw(), &[1, 2, 3]);
    }

    #[test]
    fn test_empty_window_is_all_zeros() {
        let recorder = ChannelRecorder::default();
        let window = recorder.window_of_last_n_seconds(Channel::Raw, 5, 512);
        assert_eq!(window.len(), 5 * 512);
        assert!(window.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_short_history_is_left_padded() {
        let mut recorder = ChannelRecorder::default();
        for v in [5, 6, 7] {
            recorder.dispatch(ChannelValue::Raw(v));
        }
        recorder.commit();

        let window = recorder.window_of_last_n_seconds(Channel::Raw, 1, 5);
        assert_eq!(window, vec![0.0, 0.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_long_history_keeps_most_recent() {
        let mut recorder = ChannelRecorder::default();
        for v in 0..10 {
            recorder.dispatch(ChannelValue::Raw(v));
        }
        recorder.commit();

        let window = recorder.window_of_last_n_seconds(Channel::Raw, 2, 2);
        assert_eq!(window, vec![6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_window_rejects_artifacts_without_touching_history() {
        let mut recorder = ChannelRecorder::default();
        for v in [100, -4001, 4000, 4001, i16::MIN] {
            recorder.dispatch(ChannelValue::Raw(v));
        }
        recorder.commit();

        let window = recorder.window_of_last_n_seconds(Channel::Raw, 1, 5);
        assert_eq!(window, vec![100.0, 0.0, 4000.0, 0.0, 0.0]);
        assert!(window.iter().all(|v| v.abs() <= DEFAULT_ARTIFACT_THRESHOLD));
        assert_eq!(recorder.raw(), &[100, -4001, 4000, 4001, i16::MIN]);
    }

    #[test]
    fn test_reset_clears_staged_and_committed() {
        let mut recorder = ChannelRecorder::default();
        recorder.dispatch(ChannelValue::Meditation(50));
        recorder.commit();
        recorder.dispatch(ChannelValue::Meditation(60));
        recorder.reset();
        recorder.commit();

        assert!(recorder.meditation().is_empty());
        assert_eq!(recorder.committed_len(Channel::Meditation), 0);
    }

    #[test]
    fn test_band_vectors_are_staged() {
        let mut recorder = ChannelRecorder::default();
        let bands = BandVector::new([8, 7, 6, 5, 4, 3, 2, 1]);
        recorder.dispatch(ChannelValue::Bands(bands));
        assert_eq!(recorder.latest_bands(), None);
        recorder.commit();
        assert_eq!(recorder.latest_bands(), Some(bands));
        assert_eq!(recorder.band_vectors().len(), 1);
    }

    #[test]
    fn test_scalar_channel_windows() {
        let mut recorder = ChannelRecorder::default();
        recorder.dispatch(ChannelValue::Blink(90));
        recorder.dispatch(ChannelValue::PoorSignal(200));
        recorder.commit();

        assert_eq!(recorder.window_of_last_n_seconds(Channel::Blink, 1, 2), vec![0.0, 90.0]);
        assert_eq!(recorder.committed_values(Channel::PoorSignal), vec![200.0]);
    }

    #[test]
    fn test_committed_range_clamps() {
        let mut recorder = ChannelRecorder::default();
        for v in [1, 2, 3, 4] {
            recorder.dispatch(ChannelValue::Raw(v));
        }
        recorder.commit();

        assert_eq!(recorder.committed_range(Channel::Raw, 1..3), vec![2.0, 3.0]);
        assert_eq!(recorder.committed_range(Channel::Raw, 2..99), vec![3.0, 4.0]);
        assert!(recorder.committed_range(Channel::Raw, 7..9).is_empty());
    }
}
