//! Synthetic headset producing the same framed byte stream as the device

use crate::signal_patterns::BrainState;
use eeg_core::{validate_sample_rate, BandVector, EegError, EegResult, DEFAULT_SAMPLE_RATE};
use eeg_protocol::{connected_frame, standby_frame, FrameBuilder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::{debug, trace};

/// Band rows are 24-bit on the wire
const BAND_ROW_MAX: u32 = 0x00FF_FFFF;
/// Scale from oscillator amplitude squared to band-vector units
const BAND_POWER_SCALE: f64 = 40.0;
/// Duration of the raw deflection caused by a blink
const BLINK_ARTIFACT_SECS: f64 = 0.1;

/// Configuration for headset simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Raw samples per second
    pub sample_rate: u32,
    /// Simulated mental state
    pub state: BrainState,
    /// Gaussian noise standard deviation in ADC units
    pub noise_std: f64,
    /// Average blink rate
    pub blinks_per_minute: f64,
    /// Poor-signal value reported with every eSense frame (0 = good contact)
    pub poor_signal: u8,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            state: BrainState::Relaxed,
            noise_std: 15.0,
            blinks_per_minute: 12.0,
            poor_signal: 0,
            seed: None,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> EegResult<()> {
        validate_sample_rate(self.sample_rate as f64)?;
        if !(self.noise_std.is_finite() && self.noise_std >= 0.0) {
            return Err(EegError::SimulationError {
                reason: format!("noise standard deviation must be >= 0, got {}", self.noise_std),
            });
        }
        if !(self.blinks_per_minute.is_finite() && self.blinks_per_minute >= 0.0) {
            return Err(EegError::SimulationError {
                reason: format!("blink rate must be >= 0, got {}", self.blinks_per_minute),
            });
        }
        Ok(())
    }
}

/// Headset simulator emitting encoded frames
pub struct HeadsetSimulator {
    config: SimulatorConfig,
    rng: StdRng,
    noise: Normal<f64>,
    phases: [f64; 5],
    samples_emitted: u64,
    blink_samples_left: usize,
    blink_amplitude: f64,
}

impl HeadsetSimulator {
    /// Create a simulator; an unset seed is drawn from the thread RNG
    pub fn new(config: SimulatorConfig) -> EegResult<Self> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, config.noise_std).map_err(|e| EegError::SimulationError {
            reason: format!("Failed to create normal distribution: {}", e),
        })?;
        let phases = std::array::from_fn(|_| rng.gen_range(0.0..2.0 * PI));

        debug!("headset simulator seeded with {} ({})", seed, config.state);
        Ok(Self {
            config,
            rng,
            noise,
            phases,
            samples_emitted: 0,
            blink_samples_left: 0,
            blink_amplitude: 0.0,
        })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Raw samples produced since creation or the last time reset
    pub fn samples_emitted(&self) -> u64 {
        self.samples_emitted
    }

    pub fn set_state(&mut self, state: BrainState) {
        debug!("simulated state {} -> {}", self.config.state, state);
        self.config.state = state;
    }

    /// Restart the signal clock
    pub fn reset_time(&mut self) {
        self.samples_emitted = 0;
        self.blink_samples_left = 0;
    }

    /// Status frames a dongle sends before data flows
    pub fn handshake(&self) -> Vec<u8> {
        let mut out = standby_frame().to_vec();
        out.extend_from_slice(&connected_frame());
        out
    }

    /// Encode `samples` raw frames plus any eSense and blink frames due
    pub fn generate(&mut self, samples: usize) -> Vec<u8> {
        let rate = self.config.sample_rate as u64;
        // ~8 bytes per raw frame
        let mut out = Vec::with_capacity(samples * 8 + 64);

        for _ in 0..samples {
            let sample = self.next_raw_sample();
            FrameBuilder::new().raw(sample).write_to(&mut out);
            self.samples_emitted += 1;

            if self.samples_emitted % rate == 0 {
                self.write_esense_frame(&mut out);
            }
            self.maybe_blink(&mut out);
        }
        out
    }

    /// Encode `seconds` worth of traffic
    pub fn generate_seconds(&mut self, seconds: f64) -> Vec<u8> {
        let samples = (seconds.max(0.0) * self.config.sample_rate as f64).round() as usize;
        self.generate(samples)
    }

    fn next_raw_sample(&mut self) -> i16 {
        let t = self.samples_emitted as f64 / self.config.sample_rate as f64;
        let mut value = self.config.state.amplitudes().sample(t, &self.phases);
        value += self.noise.sample(&mut self.rng);

        if self.blink_samples_left > 0 {
            let total = (BLINK_ARTIFACT_SECS * self.config.sample_rate as f64).max(1.0);
            let progress = 1.0 - self.blink_samples_left as f64 / total;
            value += self.blink_amplitude * (PI * progress).sin();
            self.blink_samples_left -= 1;
        }

        value.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
    }

    fn maybe_blink(&mut self, out: &mut Vec<u8>) {
        let per_sample = self.config.blinks_per_minute / 60.0 / self.config.sample_rate as f64;
        if self.blink_samples_left > 0 || self.rng.gen::<f64>() >= per_sample {
            return;
        }

        let strength: u8 = self.rng.gen_range(40..=200);
        self.blink_amplitude = strength as f64 * 3.0;
        self.blink_samples_left = (BLINK_ARTIFACT_SECS * self.config.sample_rate as f64) as usize;
        trace!("blink with strength {}", strength);

        FrameBuilder::new().blink(strength).write_to(out);
    }

    fn write_esense_frame(&mut self, out: &mut Vec<u8>) {
        let (attention, meditation) = self.config.state.esense_levels();
        let attention = self.jitter_level(attention);
        let meditation = self.jitter_level(meditation);
        let bands = self.band_vector();

        FrameBuilder::new()
            .poor_signal(self.config.poor_signal)
            .bands(&bands)
            .attention(attention)
            .meditation(meditation)
            .write_to(out);
    }

    fn jitter_level(&mut self, level: u8) -> u8 {
        let offset: i16 = self.rng.gen_range(-10..=10);
        (level as i16 + offset).clamp(1, 100) as u8
    }

    /// Band-vector rows derived from the oscillator amplitudes
    fn band_vector(&mut self) -> BandVector {
        let amps = self.config.state.amplitudes().as_array();
        // delta, theta, then low/high halves of alpha, beta and gamma
        let shares = [
            (0, 1.0),
            (1, 1.0),
            (2, 0.6),
            (2, 0.4),
            (3, 0.6),
            (3, 0.4),
            (4, 0.6),
            (4, 0.4),
        ];
        let rows = shares.map(|(band, share)| {
            let jitter = self.rng.gen_range(0.8..1.2);
            let value = amps[band] * amps[band] * BAND_POWER_SCALE * share * jitter;
            (value as u32).min(BAND_ROW_MAX)
        });
        BandVector::new(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eeg_protocol::{HeadsetState, ProtocolDecoder};

    fn seeded(state: BrainState, blinks_per_minute: f64) -> HeadsetSimulator {
        HeadsetSimulator::new(SimulatorConfig {
            state,
            blinks_per_minute,
            seed: Some(7),
            ..SimulatorConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_invalid_config() {
        let config = SimulatorConfig {
            noise_std: -1.0,
            ..SimulatorConfig::default()
        };
        assert!(matches!(HeadsetSimulator::new(config), Err(EegError::SimulationError { .. })));

        let config = SimulatorConfig {
            sample_rate: 0,
            ..SimulatorConfig::default()
        };
        assert!(HeadsetSimulator::new(config).is_err());
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = seeded(BrainState::Focused, 30.0).generate_seconds(1.5);
        let b = seeded(BrainState::Focused, 30.0).generate_seconds(1.5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_stream_decodes_at_sample_rate() {
        let mut sim = seeded(BrainState::Relaxed, 0.0);
        let mut decoder = ProtocolDecoder::default();
        decoder.feed(&sim.handshake());
        decoder.feed(&sim.generate_seconds(2.0));

        let recorder = decoder.sink();
        assert_eq!(recorder.raw().len(), 1024);
        assert_eq!(recorder.attention().len(), 2);
        assert_eq!(recorder.meditation().len(), 2);
        assert_eq!(recorder.band_vectors().len(), 2);
        assert!(recorder.attention().iter().all(|&a| (1..=100).contains(&a)));
        assert_eq!(decoder.status().headset, HeadsetState::Connected);
        assert_eq!(decoder.stats().sync_failures, 0);
        assert_eq!(decoder.stats().unknown_codes, 0);
        assert_eq!(sim.samples_emitted(), 1024);
    }

    #[test]
    fn test_band_vector_follows_state() {
        let mut sim = seeded(BrainState::Drowsy, 0.0);
        let mut decoder = ProtocolDecoder::default();
        decoder.feed(&sim.generate(512));

        let bands = decoder.sink().latest_bands().unwrap();
        assert!(bands.delta() > bands.alpha());
        assert!(bands.delta() > bands.beta());
    }

    #[test]
    fn test_frequent_blinks_are_decoded() {
        let mut sim = seeded(BrainState::Relaxed, 600.0);
        let mut decoder = ProtocolDecoder::default();
        decoder.feed(&sim.generate_seconds(10.0));

        let blinks = decoder.sink().blink();
        assert!(!blinks.is_empty());
        assert!(blinks.iter().all(|&b| (40..=200).contains(&b)));
        assert_eq!(decoder.stats().unknown_codes, 0);
        assert!(decoder.sink().raw().iter().all(|&v| v.abs() < 4000));
    }

    #[test]
    fn test_reset_time() {
        let mut sim = seeded(BrainState::Meditative, 0.0);
        sim.generate(100);
        sim.reset_time();
        assert_eq!(sim.samples_emitted(), 0);
    }
}
