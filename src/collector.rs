//! Host-facing facade
//!
//! `Collector` owns one instance of every component and routes the host's
//! callbacks to them: lifecycle events, the outbound command hook, the
//! sent-command hook and the received-line hook. The host calls these from
//! its own threads, so mutable components sit behind locks. Object
//! notifications are published only after the tracker lock is released, so
//! subscriber callbacks may call back into the collector.

use layerwatch_core::{
    AppEvent, EventBus, GcodeError, HostEvent, ObjectEntry, PrinterHost, TelemetryError, TrackingError,
    UploadError, UploadRecord,
};
use layerwatch_gcode::{AnnotateStats, CommentAnnotator, ObjectTracker};
use layerwatch_settings::{CaptureConfig, ConfigResult, ObjectTrackingConfig, Settings, UploadConfig};
use layerwatch_telemetry::{
    CaptureHandle, CaptureLoop, HttpSnapshotSource, PrintSignals, UploadDispatcher, UploadLedger,
    UploadPipeline, ZOffsetTracker,
};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// Object tracking and telemetry collection wired to one printer host
pub struct Collector {
    host: Arc<dyn PrinterHost>,
    event_bus: Arc<EventBus>,
    tracking: Arc<ObjectTrackingConfig>,
    capture: CaptureConfig,
    upload: UploadConfig,
    tracker: Mutex<ObjectTracker>,
    z_offset: Mutex<ZOffsetTracker>,
    signals: Arc<PrintSignals>,
    ledger: UploadLedger,
}

impl Collector {
    /// Compile `settings` and build every component
    pub fn new(
        settings: &Settings,
        host: Arc<dyn PrinterHost>,
        event_bus: Arc<EventBus>,
    ) -> ConfigResult<Self> {
        let tracking = Arc::new(ObjectTrackingConfig::from_settings(settings)?);
        let capture = CaptureConfig::from_settings(settings)?;
        let upload = UploadConfig::from_settings(settings)?;
        let signals = Arc::new(PrintSignals::new());

        let tracker = ObjectTracker::new(tracking.clone());
        let ledger = UploadLedger::new(&upload.data_folder);

        Ok(Self {
            host,
            event_bus,
            tracking,
            capture,
            upload,
            tracker: Mutex::new(tracker),
            z_offset: Mutex::new(ZOffsetTracker::new(signals.clone())),
            signals,
            ledger,
        })
    }

    /// Bus carrying object, telemetry and upload notifications
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Flow rate, Z offset and heat-up gate shared with the capture loop
    pub fn signals(&self) -> &Arc<PrintSignals> {
        &self.signals
    }

    /// Snapshot of the current object list
    pub fn objects(&self) -> Vec<ObjectEntry> {
        self.tracker.lock().registry().entries().to_vec()
    }

    /// Handle a host lifecycle event
    pub fn on_event(&self, event: &HostEvent) {
        match event {
            HostEvent::FileSelected { path, name } | HostEvent::PrintStarted { path, name } => {
                if let Err(e) = self.with_tracker(|t| t.on_file_selected(path, name.as_deref())) {
                    tracing::error!("Could not scan {} for objects: {}", path.display(), e);
                }
            }
            _ if event.ends_job() => {
                let commands = self.with_tracker(ObjectTracker::on_print_ended);
                self.send(&commands);
            }
            _ => {}
        }

        let commands = self.z_offset.lock().on_event(event);
        self.send(&commands);
    }

    /// Outbound command hook; returns the commands to send in its place
    ///
    /// Filtering only applies while a job is printing.
    pub fn on_outbound(&self, command: &str) -> Vec<String> {
        if !self.host.state_id().is_printing() {
            return vec![command.to_string()];
        }
        self.with_tracker(|t| t.process(command)).into_commands(command)
    }

    /// Sent-command hook
    pub fn on_sent(&self, command: &str) {
        self.signals.observe_sent(command);
    }

    /// Received-line hook; the line is returned unchanged
    pub fn on_received<'a>(&self, line: &'a str) -> &'a str {
        let commands = self.z_offset.lock().on_received(line);
        self.send(&commands);
        line
    }

    /// Cancel the object with discovery index `sequence_id`
    pub fn cancel_object(&self, sequence_id: usize) -> Result<ObjectEntry, TrackingError> {
        self.with_tracker(|t| t.cancel_object(sequence_id))
    }

    /// Rewrite slicer comments of `source` into annotations at `destination`
    pub fn annotate_file(&self, source: &Path, destination: &Path) -> Result<AnnotateStats, GcodeError> {
        CommentAnnotator::new(&self.tracking).annotate_file(source, destination)
    }

    /// Jobs uploaded so far, oldest first
    pub fn upload_history(&self) -> Result<Vec<UploadRecord>, UploadError> {
        self.ledger.rows()
    }

    /// Start the capture loop on the current tokio runtime
    pub fn start_capture(&self) -> Result<CaptureHandle, TelemetryError> {
        let url = self
            .capture
            .snapshot_url
            .as_deref()
            .ok_or(TelemetryError::SnapshotNotConfigured)?;
        let snapshots = Arc::new(HttpSnapshotSource::new(url, self.capture.snapshot_timeout));

        let pipeline = Arc::new(UploadPipeline::from_config(&self.upload));
        let dispatcher = UploadDispatcher::new(pipeline).with_event_bus(self.event_bus.clone());

        tracing::info!(
            "Starting capture every {:?} into {}",
            self.capture.interval,
            self.capture.data_folder.display()
        );
        let capture = CaptureLoop::new(
            self.host.clone(),
            snapshots,
            self.signals.clone(),
            Arc::new(dispatcher),
            self.capture.clone(),
        )
        .with_event_bus(self.event_bus.clone());

        Ok(capture.spawn())
    }

    /// Run `f` on the locked tracker, then publish what it queued
    fn with_tracker<T>(&self, f: impl FnOnce(&mut ObjectTracker) -> T) -> T {
        let (result, events) = {
            let mut tracker = self.tracker.lock();
            let result = f(&mut tracker);
            (result, tracker.take_events())
        };
        for event in events {
            self.event_bus.publish(AppEvent::Objects(event));
        }
        result
    }

    fn send(&self, commands: &[String]) {
        if !commands.is_empty() {
            self.host.send_commands(commands);
        }
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("capture", &self.capture)
            .field("upload", &self.upload)
            .field("ledger", &self.ledger)
            .finish()
    }
}
