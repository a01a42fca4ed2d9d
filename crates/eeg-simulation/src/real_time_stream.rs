//! Real-time headset byte stream for driving the poll loop without hardware

use crate::headset_simulator::{HeadsetSimulator, SimulatorConfig};
use crate::signal_patterns::BrainState;
use eeg_core::EegResult;
use eeg_protocol::dongle_disconnected_frame;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Configuration for real-time streaming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Headset simulation settings
    pub simulator: SimulatorConfig,
    /// Interval between chunks (ms); a serial port read returns about this often
    pub tick_ms: u64,
    /// Relative variation of chunk sizes (0.0 = every chunk the same size)
    pub chunk_jitter: f64,
    /// Chunks buffered before the producer waits for the reader
    pub buffer_size: usize,
    /// Id reported by the dongle when the headset disconnects
    pub headset_id: u16,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            simulator: SimulatorConfig::default(),
            tick_ms: 40,
            chunk_jitter: 0.25,
            buffer_size: 64,
            headset_id: 0x2A17,
        }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> EegResult<()> {
        self.simulator.validate()?;
        if self.tick_ms == 0 {
            return Err(eeg_core::config_error!("tick_ms", "must be at least 1ms"));
        }
        if !(0.0..1.0).contains(&self.chunk_jitter) {
            return Err(eeg_core::config_error!(
                "chunk_jitter",
                "must lie in [0, 1), got {}",
                self.chunk_jitter
            ));
        }
        if self.buffer_size == 0 {
            return Err(eeg_core::config_error!("buffer_size", "must be greater than 0"));
        }
        Ok(())
    }
}

/// Commands for controlling the stream
#[derive(Debug, Clone)]
pub enum StreamCommand {
    /// Send the connection handshake and start streaming
    Start,
    /// Stop streaming and restart the signal clock
    Stop,
    Pause,
    Resume,
    SetState(BrainState),
    /// Report a dongle-side disconnect and stop
    Disconnect,
}

/// Stream statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamStats {
    pub is_running: bool,
    pub chunks_sent: u64,
    pub bytes_sent: u64,
    pub samples_sent: u64,
}

/// Simulated serial link delivering byte chunks on a timer
pub struct RealTimeHeadsetStream {
    config: StreamConfig,
    simulator: HeadsetSimulator,
    chunk_rng: StdRng,
    data_sender: mpsc::Sender<Vec<u8>>,
    control_receiver: mpsc::Receiver<StreamCommand>,
    control_sender: mpsc::Sender<StreamCommand>,
    stats: Arc<Mutex<StreamStats>>,
    samples_owed: f64,
}

impl RealTimeHeadsetStream {
    /// Create a stream and the receiver its chunks arrive on
    pub fn new(config: StreamConfig) -> EegResult<(Self, mpsc::Receiver<Vec<u8>>)> {
        config.validate()?;
        let simulator = HeadsetSimulator::new(config.simulator.clone())?;
        let chunk_rng = match config.simulator.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        let (data_sender, data_receiver) = mpsc::channel(config.buffer_size);
        let (control_sender, control_receiver) = mpsc::channel(32);

        let stream = RealTimeHeadsetStream {
            config,
            simulator,
            chunk_rng,
            data_sender,
            control_receiver,
            control_sender,
            stats: Arc::new(Mutex::new(StreamStats::default())),
            samples_owed: 0.0,
        };
        Ok((stream, data_receiver))
    }

    /// Get control sender for sending commands
    pub fn control_handle(&self) -> mpsc::Sender<StreamCommand> {
        self.control_sender.clone()
    }

    /// Shared handle to the running statistics
    pub fn stats_handle(&self) -> Arc<Mutex<StreamStats>> {
        Arc::clone(&self.stats)
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Drive the stream until the reader or every control handle goes away
    pub async fn run(&mut self) -> EegResult<()> {
        let mut ticker = interval(Duration::from_millis(self.config.tick_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut running = false;

        // release our own sender so the loop ends once every external handle is gone
        let (closed, _) = mpsc::channel(1);
        self.control_sender = closed;

        info!(
            "headset stream ready: {}Hz, {}ms ticks, state {}",
            self.config.simulator.sample_rate, self.config.tick_ms, self.simulator.config().state
        );

        loop {
            tokio::select! {
                _ = ticker.tick(), if running => {
                    let samples = self.next_chunk_len();
                    let chunk = self.simulator.generate(samples);
                    if !self.send(chunk, samples).await {
                        break;
                    }
                }

                command = self.control_receiver.recv() => {
                    match command {
                        Some(StreamCommand::Start) => {
                            let handshake = self.simulator.handshake();
                            if !self.send(handshake, 0).await {
                                break;
                            }
                            running = true;
                            ticker.reset();
                            info!("headset stream started");
                        }
                        Some(StreamCommand::Stop) => {
                            running = false;
                            self.simulator.reset_time();
                            self.samples_owed = 0.0;
                            info!("headset stream stopped");
                        }
                        Some(StreamCommand::Pause) => {
                            running = false;
                            info!("headset stream paused");
                        }
                        Some(StreamCommand::Resume) => {
                            running = true;
                            info!("headset stream resumed");
                        }
                        Some(StreamCommand::SetState(state)) => {
                            self.simulator.set_state(state);
                            info!("simulated state set to {}: {}", state, state.description());
                        }
                        Some(StreamCommand::Disconnect) => {
                            running = false;
                            let frame = dongle_disconnected_frame(self.config.headset_id).to_vec();
                            warn!("simulating headset disconnect (id {:#06x})", self.config.headset_id);
                            if !self.send(frame, 0).await {
                                break;
                            }
                        }
                        None => {
                            debug!("headset stream control channel closed");
                            break;
                        }
                    }
                    self.stats.lock().await.is_running = running;
                }
            }
        }

        self.stats.lock().await.is_running = false;
        Ok(())
    }

    /// Jittered chunk size that averages to the configured sample rate
    fn next_chunk_len(&mut self) -> usize {
        let per_tick = self.config.simulator.sample_rate as f64 * self.config.tick_ms as f64 / 1000.0;
        self.samples_owed += per_tick;

        let jitter = self.config.chunk_jitter;
        let factor = if jitter > 0.0 {
            self.chunk_rng.gen_range(1.0 - jitter..1.0 + jitter)
        } else {
            1.0
        };
        let samples = (self.samples_owed * factor).floor().max(0.0);
        self.samples_owed -= samples;
        samples as usize
    }

    /// Returns false once the reader is gone
    async fn send(&mut self, chunk: Vec<u8>, samples: usize) -> bool {
        let bytes = chunk.len() as u64;
        if self.data_sender.send(chunk).await.is_err() {
            debug!("headset stream reader dropped");
            return false;
        }
        let mut stats = self.stats.lock().await;
        stats.chunks_sent += 1;
        stats.bytes_sent += bytes;
        stats.samples_sent += samples as u64;
        true
    }
}

/// Create a stream and run it in the background
pub fn start_headset_stream(
    config: StreamConfig,
) -> EegResult<(mpsc::Receiver<Vec<u8>>, mpsc::Sender<StreamCommand>)> {
    let (mut stream, data_receiver) = RealTimeHeadsetStream::new(config)?;
    let control_sender = stream.control_handle();

    tokio::spawn(async move {
        if let Err(e) = stream.run().await {
            error!("headset stream error: {}", e);
        }
    });

    Ok((data_receiver, control_sender))
}
