//! Byte values of the headset's framed serial protocol.
//!
//! A frame is `AA AA <len> <code> ...`. Three codes are standalone status
//! frames; every other code starts a run of tagged sub-fields:
//!
//! | Code | Meaning | Payload |
//! |---|---|---|
//! | `0xD4` | standby | none |
//! | `0xD0` | connected | none |
//! | `0xD2` | dongle lost headset | 1 length byte + 2-byte headset id |
//! | `0x80` | raw sample | sub-length (2) + i16, high byte first |
//! | `0x02` | poor signal | 1 byte |
//! | `0x04` | attention | 1 byte, valid 1..=100 |
//! | `0x05` | meditation | 1 byte, valid 1..=100 |
//! | `0x16` | blink strength | 1 byte |
//! | `0x83` | band powers | sub-length + 8 × 24-bit big-endian |

// ── Framing ──────────────────────────────────────────────────────────────────

/// Sync marker; two in a row start a frame.
pub const SYNC: u8 = 0xAA;

// ── Standalone status codes ──────────────────────────────────────────────────

pub const CODE_STANDBY: u8 = 0xD4;
pub const CODE_CONNECTED: u8 = 0xD0;
pub const CODE_DONGLE_DISCONNECTED: u8 = 0xD2;

// ── Sub-field codes ──────────────────────────────────────────────────────────

pub const CODE_POOR_SIGNAL: u8 = 0x02;
pub const CODE_ATTENTION: u8 = 0x04;
pub const CODE_MEDITATION: u8 = 0x05;
pub const CODE_BLINK: u8 = 0x16;
pub const CODE_RAW: u8 = 0x80;
pub const CODE_BANDS: u8 = 0x83;

/// Sub-length a raw sub-field is expected to declare
pub const RAW_SUB_LENGTH: u8 = 2;

/// Bytes per band-power row
pub const BAND_ROW_BYTES: usize = 3;

/// Largest value accepted on the attention and meditation channels
pub const ESENSE_MAX: i8 = 100;

/// Checksum the headset appends after a frame's payload
pub fn checksum(payload: &[u8]) -> u8 {
    let sum = payload.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    !sum
}
