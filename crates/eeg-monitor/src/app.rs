//! Headless monitor: poll loop, recording control and export

use anyhow::{Context, Result};
use eeg_core::{Recording, RecordingSession};
use eeg_processing::{DisplayFrame, EegBand, ProcessingConfig, SpectralPipeline};
use eeg_protocol::{DongleState, ProtocolDecoder};
use eeg_simulation::{start_headset_stream, StreamCommand, StreamConfig};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Poll period of the display refresh
pub const POLL_INTERVAL: Duration = Duration::from_millis(40);

/// Everything the monitor needs to run
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub processing: ProcessingConfig,
    pub stream: StreamConfig,
    /// How long to run before shutting down
    pub duration: Duration,
    /// Directory finished recordings are written to; no recording when unset
    pub record_dir: Option<PathBuf>,
    /// How often band powers are logged
    pub report_every: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            processing: ProcessingConfig::default(),
            stream: StreamConfig::default(),
            duration: Duration::from_secs(30),
            record_dir: None,
            report_every: Duration::from_secs(1),
        }
    }
}

/// What a finished run produced
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub raw_samples: usize,
    pub frames: u64,
    pub saved: Vec<PathBuf>,
}

/// Decoder, pipeline and recording state owned by the poll loop
pub struct Monitor {
    decoder: ProtocolDecoder,
    pipeline: SpectralPipeline,
    session: Option<RecordingSession>,
    recordings: Vec<Recording>,
    record_dir: Option<PathBuf>,
    dongle_lost: bool,
}

impl Monitor {
    pub fn new(processing: ProcessingConfig, record_dir: Option<PathBuf>) -> Result<Self> {
        let pipeline = SpectralPipeline::new(processing).context("invalid processing configuration")?;
        Ok(Self {
            decoder: ProtocolDecoder::default(),
            pipeline,
            session: None,
            recordings: Vec::new(),
            record_dir,
            dongle_lost: false,
        })
    }

    pub fn decoder(&self) -> &ProtocolDecoder {
        &self.decoder
    }

    pub fn recordings(&self) -> &[Recording] {
        &self.recordings
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    /// Feed everything read since the last poll
    pub fn on_bytes(&mut self, bytes: &[u8]) {
        self.decoder.feed(bytes);

        let dongle = self.decoder.status().dongle;
        if dongle == DongleState::Disconnected && !self.dongle_lost {
            self.dongle_lost = true;
            warn!(headset_id = ?self.decoder.status().headset_id, "headset disconnected");
        }
    }

    /// Compute the display frame for this poll
    pub fn refresh(&mut self) -> DisplayFrame {
        self.pipeline.process(self.decoder.sink())
    }

    /// Returns false if a session is already open
    pub fn start_recording(&mut self) -> bool {
        if self.session.is_some() {
            return false;
        }
        let session = RecordingSession::start(self.decoder.sink());
        info!(start_index = session.start_index(), "recording started");
        self.session = Some(session);
        true
    }

    /// Close the open session, keep the recording and export it if a directory is set
    pub fn stop_recording(&mut self) -> Result<Option<(Recording, Option<PathBuf>)>> {
        let Some(session) = self.session.take() else {
            return Ok(None);
        };
        let sample_rate = self.pipeline.config().sample_rate;
        let recording = session.finish(self.decoder.sink(), sample_rate)?;
        info!(
            id = %recording.id,
            "recording stopped: {} samples ({:.1}s)",
            recording.data.len(),
            recording.duration_secs()
        );

        let saved = match &self.record_dir {
            Some(dir) => Some(save_recording(dir, &recording)?),
            None => None,
        };
        self.recordings.push(recording.clone());
        Ok(Some((recording, saved)))
    }

    /// Drop all data and any open session, as on pause/play or reconnect
    pub fn clean_slate(&mut self) {
        if self.session.take().is_some() {
            warn!("open recording discarded");
        }
        self.decoder.reset();
        self.dongle_lost = false;
        debug!("monitor state cleared");
    }
}

/// Write `recording` as `<dir>/<id>.json`, creating `dir` if needed
pub fn save_recording(dir: &Path, recording: &Recording) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(recording.file_name());
    let json = recording.to_json()?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    info!("recording saved to {}", path.display());
    Ok(path)
}

fn log_frame(frame: &DisplayFrame) {
    let bands = &frame.band_powers;
    info!(
        attention = ?frame.attention,
        meditation = ?frame.meditation,
        dominant = ?bands.dominant().map(EegBand::name),
        "delta {:.1} theta {:.1} alpha {:.1} beta {:.1} gamma {:.1} ({}us)",
        bands.get(EegBand::Delta),
        bands.get(EegBand::Theta),
        bands.get(EegBand::Alpha),
        bands.get(EegBand::Beta),
        bands.get(EegBand::Gamma),
        frame.latency_us
    );
}

fn drain(receiver: &mut mpsc::Receiver<Vec<u8>>, buffer: &mut Vec<u8>) {
    while let Ok(chunk) = receiver.try_recv() {
        buffer.extend_from_slice(&chunk);
    }
}

/// Run the simulated headset through the poll loop for `config.duration`
pub async fn run(config: MonitorConfig) -> Result<RunSummary> {
    let mut monitor = Monitor::new(config.processing.clone(), config.record_dir.clone())?;
    let (mut receiver, control) = start_headset_stream(config.stream.clone())?;
    control
        .send(StreamCommand::Start)
        .await
        .context("headset stream stopped before start")?;

    if config.record_dir.is_some() {
        monitor.start_recording();
    }

    let mut poll = interval(POLL_INTERVAL);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let deadline = sleep(config.duration);
    tokio::pin!(deadline);

    let mut buffer = Vec::new();
    let mut last_report = tokio::time::Instant::now();
    info!("monitoring for {:.1}s", config.duration.as_secs_f64());

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = poll.tick() => {
                buffer.clear();
                drain(&mut receiver, &mut buffer);
                monitor.on_bytes(&buffer);

                let frame = monitor.refresh();
                if last_report.elapsed() >= config.report_every {
                    log_frame(&frame);
                    last_report = tokio::time::Instant::now();
                }
            }
        }
    }

    if let Err(e) = control.send(StreamCommand::Stop).await {
        debug!("headset stream already gone: {}", e);
    }
    buffer.clear();
    drain(&mut receiver, &mut buffer);
    monitor.on_bytes(&buffer);

    let mut summary = RunSummary {
        raw_samples: monitor.decoder().sink().raw().len(),
        frames: monitor.pipeline.frames(),
        saved: Vec::new(),
    };
    if let Some((_, Some(path))) = monitor.stop_recording()? {
        summary.saved.push(path);
    }
    info!(
        "done: {} raw samples, {} frames, {} sync failures",
        summary.raw_samples,
        summary.frames,
        monitor.decoder().stats().sync_failures
    );
    Ok(summary)
}
