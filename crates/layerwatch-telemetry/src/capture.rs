//! Telemetry capture loop
//!
//! One background worker polls the printer state. While a print is active
//! it writes paired `<timestamp>.jpg` / `<timestamp>.labels` samples into a
//! per-job directory; when the print leaves the active states the directory
//! is handed off for upload and all per-print state is reset.

use chrono::{DateTime, Utc};
use layerwatch_core::{AppEvent, EventBus, PrinterHost, PrinterStateId, TelemetryError, TelemetryEvent};
use layerwatch_settings::CaptureConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::task::JoinHandle;

use crate::signals::PrintSignals;
use crate::snapshot::SnapshotSource;
use crate::z_offset::PROBE_OFFSET_QUERY;

/// Sleep between two polling iterations
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Receiver of finished job directories
pub trait JobHandoff: Send + Sync {
    /// Take ownership of a finished job directory
    fn hand_off(&self, job_directory: PathBuf);
}

/// Samples of one print
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySession {
    /// Directory receiving the samples
    pub job_directory: PathBuf,
    /// When the session started
    pub started_at: DateTime<Utc>,
    /// Samples attempted so far
    pub sample_count: usize,
    /// Cap on samples for this print
    pub max_samples: usize,
    last_sample: DateTime<Utc>,
}

impl TelemetrySession {
    /// Whether the sample cap has been reached
    pub fn is_full(&self) -> bool {
        self.sample_count >= self.max_samples
    }
}

/// Polling loop driving snapshot capture
pub struct CaptureLoop {
    host: Arc<dyn PrinterHost>,
    snapshots: Arc<dyn SnapshotSource>,
    signals: Arc<PrintSignals>,
    handoff: Arc<dyn JobHandoff>,
    config: CaptureConfig,
    session: Option<TelemetrySession>,
    event_bus: Option<Arc<EventBus>>,
}

impl CaptureLoop {
    /// Create a capture loop
    pub fn new(
        host: Arc<dyn PrinterHost>,
        snapshots: Arc<dyn SnapshotSource>,
        signals: Arc<PrintSignals>,
        handoff: Arc<dyn JobHandoff>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            host,
            snapshots,
            signals,
            handoff,
            config,
            session: None,
            event_bus: None,
        }
    }

    /// Publish session notifications on this bus
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Current session, if a print is being captured
    pub fn session(&self) -> Option<&TelemetrySession> {
        self.session.as_ref()
    }

    fn should_collect(&self) -> bool {
        self.config.collection_allowed && self.signals.ready()
    }

    /// Run one polling iteration at time `now`
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<(), TelemetryError> {
        let state = self.host.state_id();

        if state.is_printing() {
            if !self.should_collect() {
                return Ok(());
            }
            if self.session.as_ref().is_some_and(TelemetrySession::is_full) {
                return Ok(());
            }
            if self.session.is_none() && !self.start_session(now)? {
                return Ok(());
            }
            self.sample(now)
        } else if state == PrinterStateId::Paused {
            Ok(())
        } else {
            self.end_session();
            Ok(())
        }
    }

    fn start_session(&mut self, now: DateTime<Utc>) -> Result<bool, TelemetryError> {
        let Some(filename) = self.host.current_job_filename() else {
            return Ok(false);
        };

        let job_directory = self
            .config
            .data_folder
            .join(format!("{}.{}", sanitize_filename(&filename), now.timestamp()));
        std::fs::create_dir_all(&job_directory).map_err(|e| TelemetryError::JobDirectory {
            path: job_directory.display().to_string(),
            reason: e.to_string(),
        })?;
        tracing::info!("Capturing {} into {}", filename, job_directory.display());

        self.host.send_commands(&[PROBE_OFFSET_QUERY.to_string()]);
        self.publish(TelemetryEvent::SessionStarted {
            job_directory: job_directory.clone(),
        });

        self.session = Some(TelemetrySession {
            job_directory,
            started_at: now,
            sample_count: 0,
            max_samples: self.config.max_samples(),
            last_sample: now,
        });
        Ok(true)
    }

    fn sample(&mut self, now: DateTime<Utc>) -> Result<(), TelemetryError> {
        let interval = self.config.interval;
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        let elapsed = (now - session.last_sample).to_std().unwrap_or(Duration::ZERO);
        if elapsed < interval {
            return Ok(());
        }
        session.last_sample = now;
        session.sample_count += 1;
        let directory = session.job_directory.clone();

        let image = self.snapshots.fetch()?;
        write_sample(&directory, now, &image, &self.signals.labels())
    }

    fn end_session(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!(
                "Print finished after {} samples, handing off {}",
                session.sample_count,
                session.job_directory.display()
            );
            self.publish(TelemetryEvent::SessionEnded {
                job_directory: session.job_directory.clone(),
                samples: session.sample_count,
            });
            self.handoff.hand_off(session.job_directory);
        }
        self.signals.reset_gate();
    }

    fn publish(&self, event: TelemetryEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(AppEvent::Telemetry(event));
        }
    }

    /// Drive the loop on the blocking pool until the handle is stopped or dropped
    ///
    /// Snapshot fetches and sample writes block, so the loop never runs on
    /// an async worker. Every iteration error is logged and the loop continues.
    pub fn spawn(mut self) -> CaptureHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task = tokio::task::spawn_blocking(move || {
            while let Err(TryRecvError::Empty) = shutdown_rx.try_recv() {
                if let Err(e) = self.tick(Utc::now()) {
                    tracing::error!("Capture iteration failed: {}", e);
                }

                std::thread::sleep(POLL_INTERVAL);
            }
            tracing::debug!("Capture loop stopped");
        });

        CaptureHandle { shutdown_tx, task }
    }
}

impl std::fmt::Debug for CaptureLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureLoop")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish()
    }
}

/// Handle on a spawned capture loop
#[derive(Debug)]
pub struct CaptureHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CaptureHandle {
    /// Ask the loop to exit and wait for it
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::warn!("Capture loop task ended abnormally: {}", e);
        }
    }
}

fn sample_stem(now: DateTime<Utc>) -> String {
    format!("{}.{:06}", now.timestamp(), now.timestamp_subsec_micros())
}

fn write_sample(
    directory: &Path,
    now: DateTime<Utc>,
    image: &[u8],
    labels: &str,
) -> Result<(), TelemetryError> {
    let stem = sample_stem(now);
    std::fs::write(directory.join(format!("{}.jpg", stem)), image)?;
    std::fs::write(directory.join(format!("{}.labels", stem)), labels)?;
    Ok(())
}

/// Make a job filename safe to use as a directory name
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_control() || c == ':' { '_' } else { c })
        .collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "job".to_string()
    } else {
        cleaned
    }
}
