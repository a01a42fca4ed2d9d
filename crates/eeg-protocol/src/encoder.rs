//! Frame encoder producing the byte layout a headset sends.
//!
//! Used by the simulator and by tests. Frames are written as
//! `AA AA <len> <payload> <checksum>`, where `len` is 2 plus the bytes the
//! decoder counts against it: 2 per raw sample, 1 per single-byte value and
//! the sub-length of a band vector.

use crate::codes::*;
use eeg_core::BandVector;

/// Builder for one data frame made of tagged sub-fields
#[derive(Debug, Clone, Default)]
pub struct FrameBuilder {
    payload: Vec<u8>,
    budget: usize,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw sample, high byte first
    pub fn raw(mut self, sample: i16) -> Self {
        self.payload.extend_from_slice(&[CODE_RAW, RAW_SUB_LENGTH]);
        self.payload.extend_from_slice(&sample.to_be_bytes());
        self.budget += 2;
        self
    }

    pub fn poor_signal(self, quality: u8) -> Self {
        self.scalar(CODE_POOR_SIGNAL, quality)
    }

    pub fn attention(self, value: u8) -> Self {
        self.scalar(CODE_ATTENTION, value)
    }

    pub fn meditation(self, value: u8) -> Self {
        self.scalar(CODE_MEDITATION, value)
    }

    pub fn blink(self, strength: u8) -> Self {
        self.scalar(CODE_BLINK, strength)
    }

    fn scalar(mut self, code: u8, value: u8) -> Self {
        self.payload.extend_from_slice(&[code, value]);
        self.budget += 1;
        self
    }

    /// Band vector; rows are truncated to 24 bits
    pub fn bands(mut self, bands: &BandVector) -> Self {
        let sub_length = (bands.rows.len() * BAND_ROW_BYTES) as u8;
        self.payload.extend_from_slice(&[CODE_BANDS, sub_length]);
        for row in bands.rows {
            let [_, hi, mid, lo] = row.to_be_bytes();
            self.payload.extend_from_slice(&[hi, mid, lo]);
        }
        self.budget += sub_length as usize;
        self
    }

    /// Payload bytes written so far
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Length byte announced in the header
    pub fn length(&self) -> u8 {
        debug_assert!(self.budget + 2 <= u8::MAX as usize, "frame too long");
        (self.budget + 2) as u8
    }

    /// Append the finished frame to `out`
    pub fn write_to(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&[SYNC, SYNC, self.length()]);
        out.extend_from_slice(&self.payload);
        out.push(checksum(&self.payload));
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.payload.len() + 4);
        self.write_to(&mut out);
        out
    }
}

/// `AA AA 04 D4`
pub fn standby_frame() -> [u8; 4] {
    [SYNC, SYNC, 0x04, CODE_STANDBY]
}

/// `AA AA 04 D0`
pub fn connected_frame() -> [u8; 4] {
    [SYNC, SYNC, 0x04, CODE_CONNECTED]
}

/// Dongle status frame reporting that headset `id` dropped
pub fn dongle_disconnected_frame(id: u16) -> [u8; 7] {
    let [hi, lo] = id.to_be_bytes();
    [SYNC, SYNC, 0x04, CODE_DONGLE_DISCONNECTED, 0x02, hi, lo]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_frame_layout() {
        let frame = FrameBuilder::new().raw(-2).build();
        assert_eq!(frame, vec![0xAA, 0xAA, 0x04, 0x80, 0x02, 0xFF, 0xFE, checksum(&[0x80, 0x02, 0xFF, 0xFE])]);
    }

    #[test]
    fn test_band_frame_layout() {
        let bands = BandVector::new([0x0102_0304, 0, 0, 0, 0, 0, 0, 0x00AB_CDEF]);
        let frame = FrameBuilder::new().bands(&bands).build();

        assert_eq!(frame.len(), 3 + 2 + 24 + 1);
        assert_eq!(&frame[3..8], &[0x83, 0x18, 0x02, 0x03, 0x04]);
        assert_eq!(&frame[26..29], &[0xAB, 0xCD, 0xEF]);
    }

    #[test]
    fn test_status_frames() {
        assert_eq!(standby_frame(), [0xAA, 0xAA, 0x04, 0xD4]);
        assert_eq!(connected_frame()[3], 0xD0);
        assert_eq!(dongle_disconnected_frame(0xBEEF)[5..], [0xBE, 0xEF]);
    }

    #[test]
    fn test_length_counts_values_not_codes() {
        let esense = FrameBuilder::new()
            .poor_signal(0)
            .bands(&BandVector::default())
            .attention(50)
            .meditation(60);
        assert_eq!(esense.payload().len(), 32);
        assert_eq!(esense.length(), 2 + 1 + 24 + 1 + 1);
        assert_eq!(esense.build()[2], 29);

        let blink = FrameBuilder::new().blink(77).build();
        assert_eq!(blink, vec![0xAA, 0xAA, 0x03, 0x16, 77, checksum(&[0x16, 77])]);
    }

    #[test]
    fn test_frames_decode_back_to_back() {
        let mut stream = FrameBuilder::new().blink(90).build();
        FrameBuilder::new()
            .poor_signal(26)
            .attention(42)
            .meditation(51)
            .write_to(&mut stream);
        FrameBuilder::new().raw(-7).write_to(&mut stream);

        let mut decoder = crate::ProtocolDecoder::default();
        decoder.feed(&stream);
        let recorder = decoder.sink();
        assert_eq!(recorder.raw(), &[-7]);
        assert_eq!(recorder.blink(), &[90]);
        assert_eq!(recorder.attention(), &[42]);
        assert_eq!(recorder.meditation(), &[51]);
        assert_eq!(decoder.stats().unknown_codes, 0);
        assert_eq!(decoder.stats().frames, 3);
    }
}
