//! Resumable byte-at-a-time frame decoder
//!
//! The transport hands over whatever bytes happen to be available, with no
//! regard for frame boundaries. [`ProtocolDecoder`] keeps its position in an
//! explicit [`ParserState`] so a chunk may end anywhere (between the two sync
//! bytes, inside a raw sample, halfway through a band row) and the next
//! chunk continues exactly where the last one stopped.
//!
//! Malformed input is never an error: a bad sync byte or an unknown
//! sub-field code sends the decoder back to scanning for `AA AA`.

use crate::codes::*;
use eeg_core::{BandVector, ChannelRecorder, ChannelSink, ChannelValue, BAND_VECTOR_LEN};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

const BAND_PAYLOAD_BYTES: u8 = (BAND_VECTOR_LEN * BAND_ROW_BYTES) as u8;

/// Position of the decoder inside the frame grammar.
///
/// `remaining` is the frame's payload budget: the declared length minus two,
/// reduced by each sub-field. Once it reaches zero the next byte (the frame
/// checksum on a real headset) closes the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserState {
    #[default]
    AwaitSync1,
    AwaitSync2,
    ReadLength,
    ReadCode { length: u8 },
    DongleLength,
    DongleIdHigh,
    DongleIdLow { high: u8 },
    RawSubLength { remaining: i32 },
    RawHigh { remaining: i32 },
    RawLow { remaining: i32, high: u8 },
    /// Single-byte sub-field
    Scalar { field: ScalarField, remaining: i32 },
    BandSubLength { remaining: i32 },
    BandRows {
        remaining: i32,
        sub_length: u8,
        rows: [u32; BAND_VECTOR_LEN],
        /// Bytes of the band payload consumed so far
        consumed: u8,
    },
    /// Between sub-fields; the next byte is a code or the frame's last byte
    NextCode { remaining: i32 },
}

/// Single-byte sub-fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarField {
    PoorSignal,
    Attention,
    Meditation,
    Blink,
}

/// Headset state reported by standalone status frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HeadsetState {
    #[default]
    Unknown,
    Standby,
    Connected,
}

/// Dongle state reported by the `0xD2` frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DongleState {
    #[default]
    Unknown,
    Disconnected,
}

/// Device status as last reported on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub headset: HeadsetState,
    pub dongle: DongleState,
    /// Headset id carried by the last dongle status frame
    pub headset_id: Option<u16>,
    /// Set once a data frame (any non-status code) has been seen
    pub sending_data: bool,
}

/// Diagnostic counters; nothing in the decoder depends on them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecoderStats {
    /// Sync pairs found
    pub frames: u64,
    /// Second sync byte missing after a first one
    pub sync_failures: u64,
    /// Status frames (standby, connected, dongle)
    pub status_frames: u64,
    /// Values handed to the sink
    pub values_dispatched: u64,
    /// Attention/meditation values outside 1..=100
    pub values_dropped: u64,
    /// Frames abandoned on an unknown sub-field code
    pub unknown_codes: u64,
}

/// Streaming decoder feeding a [`ChannelSink`]
#[derive(Debug)]
pub struct ProtocolDecoder<S: ChannelSink = ChannelRecorder> {
    state: ParserState,
    sink: S,
    status: DeviceStatus,
    stats: DecoderStats,
}

impl Default for ProtocolDecoder<ChannelRecorder> {
    fn default() -> Self {
        Self::new(ChannelRecorder::default())
    }
}

impl<S: ChannelSink> ProtocolDecoder<S> {
    pub fn new(sink: S) -> Self {
        Self {
            state: ParserState::AwaitSync1,
            sink,
            status: DeviceStatus::default(),
            stats: DecoderStats::default(),
        }
    }

    /// Decode a chunk of bytes and commit the sink once.
    ///
    /// The chunk may start and end anywhere inside a frame.
    pub fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state = self.step(byte);
        }
        self.sink.commit();
    }

    /// Forget any partial frame, status and recorded data.
    ///
    /// Call this before reusing the decoder for a new connection.
    pub fn reset(&mut self) {
        debug!(state = ?self.state, "decoder reset");
        self.state = ParserState::AwaitSync1;
        self.status = DeviceStatus::default();
        self.stats = DecoderStats::default();
        self.sink.reset();
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn dispatch(&mut self, value: ChannelValue) {
        self.stats.values_dispatched += 1;
        self.sink.dispatch(value);
    }

    /// Advance by one byte, returning the next state
    fn step(&mut self, byte: u8) -> ParserState {
        use ParserState::*;

        match self.state {
            AwaitSync1 => {
                if byte == SYNC { AwaitSync2 } else { AwaitSync1 }
            }
            AwaitSync2 => {
                if byte == SYNC {
                    self.stats.frames += 1;
                    ReadLength
                } else {
                    self.stats.sync_failures += 1;
                    trace!(byte, "sync failed");
                    AwaitSync1
                }
            }
            ReadLength => ReadCode { length: byte },
            ReadCode { length } => self.read_code(byte, length),
            DongleLength => DongleIdHigh,
            DongleIdHigh => DongleIdLow { high: byte },
            DongleIdLow { high } => {
                let id = u16::from_be_bytes([high, byte]);
                self.status.dongle = DongleState::Disconnected;
                self.status.headset_id = Some(id);
                debug!(headset_id = id, "dongle reports headset disconnected");
                AwaitSync1
            }
            RawSubLength { remaining } => {
                if byte != RAW_SUB_LENGTH {
                    debug!(sub_length = byte, "unexpected raw sub-length");
                }
                RawHigh { remaining }
            }
            RawHigh { remaining } => RawLow { remaining, high: byte },
            RawLow { remaining, high } => {
                self.dispatch(ChannelValue::Raw(i16::from_be_bytes([high, byte])));
                NextCode { remaining: remaining - 2 }
            }
            Scalar { field, remaining } => {
                self.read_scalar(field, byte);
                NextCode { remaining: remaining - 1 }
            }
            BandSubLength { remaining } => BandRows {
                remaining,
                sub_length: byte,
                rows: [0; BAND_VECTOR_LEN],
                consumed: 0,
            },
            BandRows { remaining, sub_length, mut rows, consumed } => {
                let row = consumed as usize / BAND_ROW_BYTES;
                rows[row] = (rows[row] << 8) | byte as u32;
                let consumed = consumed + 1;
                if consumed == BAND_PAYLOAD_BYTES {
                    self.dispatch(ChannelValue::Bands(BandVector::new(rows)));
                    NextCode { remaining: remaining - sub_length as i32 }
                } else {
                    BandRows { remaining, sub_length, rows, consumed }
                }
            }
            NextCode { remaining } => {
                if remaining <= 0 {
                    AwaitSync1
                } else {
                    self.sub_field(byte, remaining)
                }
            }
        }
    }

    fn read_code(&mut self, code: u8, length: u8) -> ParserState {
        match code {
            CODE_STANDBY => {
                self.stats.status_frames += 1;
                self.status.headset = HeadsetState::Standby;
                debug!("headset standing by");
                ParserState::AwaitSync1
            }
            CODE_CONNECTED => {
                self.stats.status_frames += 1;
                self.status.headset = HeadsetState::Connected;
                debug!("headset connected");
                ParserState::AwaitSync1
            }
            CODE_DONGLE_DISCONNECTED => {
                self.stats.status_frames += 1;
                ParserState::DongleLength
            }
            _ => {
                self.status.sending_data = true;
                let remaining = length as i32 - 2;
                if remaining <= 0 {
                    trace!(code, length, "frame too short for a sub-field");
                    ParserState::AwaitSync1
                } else {
                    self.sub_field(code, remaining)
                }
            }
        }
    }

    /// State that reads the body of the sub-field tagged `code`
    fn sub_field(&mut self, code: u8, remaining: i32) -> ParserState {
        match code {
            CODE_RAW => ParserState::RawSubLength { remaining },
            CODE_BANDS => ParserState::BandSubLength { remaining },
            CODE_POOR_SIGNAL => ParserState::Scalar { field: ScalarField::PoorSignal, remaining },
            CODE_ATTENTION => ParserState::Scalar { field: ScalarField::Attention, remaining },
            CODE_MEDITATION => ParserState::Scalar { field: ScalarField::Meditation, remaining },
            CODE_BLINK => ParserState::Scalar { field: ScalarField::Blink, remaining },
            _ => {
                self.stats.unknown_codes += 1;
                trace!(code, remaining, "unknown sub-field code, abandoning frame");
                ParserState::AwaitSync1
            }
        }
    }

    fn read_scalar(&mut self, field: ScalarField, byte: u8) {
        let value = match field {
            ScalarField::PoorSignal => ChannelValue::PoorSignal(byte),
            ScalarField::Blink => ChannelValue::Blink(byte),
            ScalarField::Attention | ScalarField::Meditation => {
                let level = byte as i8;
                if level <= 0 || level > ESENSE_MAX {
                    self.stats.values_dropped += 1;
                    return;
                }
                if field == ScalarField::Attention {
                    ChannelValue::Attention(level as u8)
                } else {
                    ChannelValue::Meditation(level as u8)
                }
            }
        };
        self.dispatch(value);
    }
}
