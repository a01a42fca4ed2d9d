//! Decoder feeding a real ChannelRecorder, streams built with the encoder

use eeg_core::{BandVector, Channel, ChannelRecorder};
use eeg_protocol::codes::{CODE_ATTENTION, CODE_BANDS, CODE_BLINK, CODE_MEDITATION, CODE_POOR_SIGNAL, CODE_RAW};
use eeg_protocol::{standby_frame, FrameBuilder, HeadsetState, ProtocolDecoder};

fn session_bytes() -> Vec<u8> {
    let mut stream = Vec::new();
    stream.extend_from_slice(&standby_frame());
    for i in 0..64i16 {
        FrameBuilder::new().raw(i * 50 - 1600).write_to(&mut stream);
    }
    FrameBuilder::new()
        .poor_signal(0)
        .bands(&BandVector::new([10, 20, 30, 40, 50, 60, 70, 80]))
        .attention(55)
        .meditation(66)
        .write_to(&mut stream);
    FrameBuilder::new().blink(120).poor_signal(26).write_to(&mut stream);
    stream
}

fn decode_in_chunks(stream: &[u8], chunk: usize) -> ProtocolDecoder {
    let mut decoder = ProtocolDecoder::default();
    for part in stream.chunks(chunk) {
        decoder.feed(part);
    }
    decoder
}

#[test]
fn raw_samples_arrive_in_order() {
    let decoder = decode_in_chunks(&session_bytes(), usize::MAX);
    let recorder = decoder.sink();

    let expected: Vec<i16> = (0..64i16).map(|i| i * 50 - 1600).collect();
    assert_eq!(recorder.raw(), expected.as_slice());
    assert_eq!(decoder.status().headset, HeadsetState::Standby);
}

#[test]
fn esense_frame_fills_scalar_channels() {
    let decoder = decode_in_chunks(&session_bytes(), 1);
    let recorder = decoder.sink();

    assert_eq!(recorder.attention(), &[55]);
    assert_eq!(recorder.meditation(), &[66]);
    assert_eq!(recorder.blink(), &[120]);
    assert_eq!(recorder.poor_signal(), &[0, 26]);
    assert_eq!(
        recorder.latest_bands(),
        Some(BandVector::new([10, 20, 30, 40, 50, 60, 70, 80]))
    );
}

#[test]
fn chunk_size_does_not_change_result() {
    let stream = session_bytes();
    let whole = decode_in_chunks(&stream, usize::MAX);

    for chunk in [1, 2, 3, 5, 7, 13, 64] {
        let decoder = decode_in_chunks(&stream, chunk);
        let (a, b) = (decoder.sink(), whole.sink());
        for channel in Channel::ALL {
            assert_eq!(a.committed_values(channel), b.committed_values(channel), "{channel} @ {chunk}");
        }
        assert_eq!(a.band_vectors(), b.band_vectors());
    }
}

#[test]
fn one_commit_per_feed() {
    let stream = session_bytes();
    let decoder = decode_in_chunks(&stream, 10);
    assert_eq!(decoder.sink().commit_count() as usize, stream.chunks(10).count());
}

#[test]
fn noise_between_frames_is_tolerated() {
    let mut noisy = Vec::new();
    for i in 0..32i16 {
        noisy.extend_from_slice(&[0x01, 0xAA, 0x17]);
        FrameBuilder::new().raw(i).write_to(&mut noisy);
    }

    let decoder = decode_in_chunks(&noisy, 4);
    let expected: Vec<i16> = (0..32).collect();
    assert_eq!(decoder.sink().raw(), expected.as_slice());
    assert_eq!(decoder.stats().sync_failures, 32);
}

#[test]
fn reset_starts_a_fresh_session() {
    let stream = session_bytes();
    let mut decoder = ProtocolDecoder::new(ChannelRecorder::default());
    // stop in the middle of a raw frame
    decoder.feed(&stream[..9]);
    decoder.reset();
    assert!(decoder.sink().raw().is_empty());

    decoder.feed(&FrameBuilder::new().raw(42).build());
    assert_eq!(decoder.sink().raw(), &[42]);
}

#[test]
fn checksum_that_looks_like_a_code_is_not_parsed() {
    let codes = [CODE_POOR_SIGNAL, CODE_ATTENTION, CODE_MEDITATION, CODE_BLINK, CODE_RAW, CODE_BANDS];
    let esense = |attention, meditation| {
        FrameBuilder::new()
            .poor_signal(0)
            .bands(&BandVector::new([1, 2, 3, 4, 5, 6, 7, 8]))
            .attention(attention)
            .meditation(meditation)
            .build()
    };
    // 199 consecutive sums reach a checksum equal to one of the codes
    let (attention, mut stream) = (1..=100u8)
        .flat_map(|a| (1..=100u8).map(move |m| (a, m)))
        .map(|(a, m)| (a, esense(a, m)))
        .find(|(_, frame)| frame.last().is_some_and(|cs| codes.contains(cs)))
        .unwrap();

    FrameBuilder::new().raw(123).write_to(&mut stream);
    FrameBuilder::new().raw(456).write_to(&mut stream);

    let decoder = decode_in_chunks(&stream, usize::MAX);
    assert_eq!(decoder.sink().raw(), &[123, 456]);
    assert_eq!(decoder.sink().attention(), &[attention]);
    assert_eq!(decoder.stats().unknown_codes, 0);
    assert_eq!(decoder.stats().frames, 3);
}
