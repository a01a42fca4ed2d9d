//! Channel identifiers and the typed values the decoder produces

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sampling rate of the raw EEG channel in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 512;

/// Number of rows in an eSense band-power vector
pub const BAND_VECTOR_LEN: usize = 8;

/// Scalar channels recorded by [`crate::ChannelRecorder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Raw EEG samples (signed 16-bit)
    Raw,
    /// eSense attention, 1..=100
    Attention,
    /// eSense meditation, 1..=100
    Meditation,
    /// Blink strength
    Blink,
    /// Signal quality, 0 is best
    PoorSignal,
}

impl Channel {
    /// All scalar channels in a stable order
    pub const ALL: [Channel; 5] = [
        Channel::Raw,
        Channel::Attention,
        Channel::Meditation,
        Channel::Blink,
        Channel::PoorSignal,
    ];

    /// Short lowercase name used in logs and exports
    pub fn name(&self) -> &'static str {
        match self {
            Channel::Raw => "raw",
            Channel::Attention => "attention",
            Channel::Meditation => "meditation",
            Channel::Blink => "blink",
            Channel::PoorSignal => "poor_signal",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The eight 24-bit power values carried by a band-power sub-field.
///
/// Row order on the wire: delta, theta, low alpha, high alpha, low beta,
/// high beta, low gamma, mid gamma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BandVector {
    pub rows: [u32; BAND_VECTOR_LEN],
}

impl BandVector {
    pub fn new(rows: [u32; BAND_VECTOR_LEN]) -> Self {
        Self { rows }
    }

    pub fn delta(&self) -> u32 {
        self.rows[0]
    }

    pub fn theta(&self) -> u32 {
        self.rows[1]
    }

    /// Low + high alpha
    pub fn alpha(&self) -> u32 {
        self.rows[2].saturating_add(self.rows[3])
    }

    /// Low + high beta
    pub fn beta(&self) -> u32 {
        self.rows[4].saturating_add(self.rows[5])
    }

    /// Low + mid gamma
    pub fn gamma(&self) -> u32 {
        self.rows[6].saturating_add(self.rows[7])
    }
}

/// A single decoded value, tagged with its destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelValue {
    Raw(i16),
    Attention(u8),
    Meditation(u8),
    Blink(u8),
    PoorSignal(u8),
    Bands(BandVector),
}

impl ChannelValue {
    /// Scalar channel this value belongs to, `None` for band vectors
    pub fn channel(&self) -> Option<Channel> {
        match self {
            ChannelValue::Raw(_) => Some(Channel::Raw),
            ChannelValue::Attention(_) => Some(Channel::Attention),
            ChannelValue::Meditation(_) => Some(Channel::Meditation),
            ChannelValue::Blink(_) => Some(Channel::Blink),
            ChannelValue::PoorSignal(_) => Some(Channel::PoorSignal),
            ChannelValue::Bands(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_channel_mapping() {
        assert_eq!(ChannelValue::Raw(-3).channel(), Some(Channel::Raw));
        assert_eq!(ChannelValue::PoorSignal(200).channel(), Some(Channel::PoorSignal));
        assert_eq!(ChannelValue::Bands(BandVector::default()).channel(), None);
    }

    #[test]
    fn test_band_vector_groups() {
        let bands = BandVector::new([1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(bands.delta(), 1);
        assert_eq!(bands.theta(), 2);
        assert_eq!(bands.alpha(), 7);
        assert_eq!(bands.beta(), 11);
        assert_eq!(bands.gamma(), 15);
    }

    #[test]
    fn test_channel_names() {
        let names: Vec<_> = Channel::ALL.iter().map(|c| c.to_string()).collect();
        assert_eq!(names, ["raw", "attention", "meditation", "blink", "poor_signal"]);
    }
}
