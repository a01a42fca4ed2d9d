//! EEG-Protocol: Headset wire format
//!
//! Streaming decoder for the framed serial protocol plus a matching encoder.

pub mod codes;
pub mod decoder;
pub mod encoder;

pub use decoder::{DecoderStats, DeviceStatus, DongleState, HeadsetState, ParserState, ProtocolDecoder, ScalarField};
pub use encoder::{connected_frame, dongle_disconnected_frame, standby_frame, FrameBuilder};
