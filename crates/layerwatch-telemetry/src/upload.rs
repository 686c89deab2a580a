//! Upload pipeline
//!
//! archive → delete directory → upload bundle → delete bundle → ledger row.
//! Any failure abandons the job; whatever is left on disk stays there for
//! manual inspection. Nothing is retried.

use chrono::Local;
use layerwatch_core::{AppEvent, EventBus, UploadError, UploadEvent, UploadRecord};
use layerwatch_settings::{ArchiveFormat, UploadConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::archive::{Archiver, TarGzArchiver, ZipArchiver};
use crate::capture::JobHandoff;
use crate::ledger::UploadLedger;
use crate::storage::{BlobStore, DirectoryBlobStore, HttpBlobStore};

/// Folder under the data folder used as storage when no endpoint is set
pub const LOCAL_STORE_DIR: &str = "uploads";

/// Archive, upload and record one job directory
pub struct UploadPipeline {
    archiver: Arc<dyn Archiver>,
    store: Arc<dyn BlobStore>,
    ledger: UploadLedger,
    namespace: Option<String>,
}

impl UploadPipeline {
    /// Create a pipeline from its parts
    pub fn new(
        archiver: Arc<dyn Archiver>,
        store: Arc<dyn BlobStore>,
        ledger: UploadLedger,
        namespace: Option<String>,
    ) -> Self {
        Self {
            archiver,
            store,
            ledger,
            namespace,
        }
    }

    /// Build the pipeline described by the upload configuration
    pub fn from_config(config: &UploadConfig) -> Self {
        let archiver: Arc<dyn Archiver> = match config.archive_format {
            ArchiveFormat::Tgz => Arc::new(TarGzArchiver::new()),
            ArchiveFormat::Zip => Arc::new(ZipArchiver::new()),
        };
        let store: Arc<dyn BlobStore> = match &config.endpoint {
            Some(endpoint) => Arc::new(HttpBlobStore::new(endpoint.as_str(), config.bucket.as_str())),
            None => {
                tracing::warn!("No upload endpoint configured, keeping bundles locally");
                Arc::new(DirectoryBlobStore::new(config.data_folder.join(LOCAL_STORE_DIR)))
            }
        };

        Self::new(
            archiver,
            store,
            UploadLedger::new(&config.data_folder),
            config.namespace.clone(),
        )
    }

    /// Ledger the pipeline records into
    pub fn ledger(&self) -> &UploadLedger {
        &self.ledger
    }

    /// Run every step for `job_directory`
    pub fn run(&self, job_directory: &Path) -> Result<UploadRecord, UploadError> {
        let namespace = self
            .namespace
            .as_deref()
            .ok_or(UploadError::MissingNamespace)?;
        let job_name = job_directory
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let bundle = self.archiver.archive(job_directory)?;

        tracing::info!("Deleting {}", job_name);
        if let Err(e) = std::fs::remove_dir_all(job_directory) {
            tracing::warn!("Could not delete {}: {}", job_directory.display(), e);
        }

        let bundle_name = bundle
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::info!("Uploading {}", bundle.display());
        self.store.upload_blob(namespace, &bundle_name, &bundle)?;

        tracing::info!("Deleting {}", bundle.display());
        std::fs::remove_file(&bundle)?;

        let record = UploadLedger::record(&job_name, Local::now());
        self.ledger.append(&record)?;
        Ok(record)
    }
}

impl std::fmt::Debug for UploadPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadPipeline")
            .field("ledger", &self.ledger)
            .field("namespace", &self.namespace)
            .finish()
    }
}

/// Runs each pipeline on its own worker thread
///
/// Workers are independent: several may be in flight at once, each on a
/// different job directory, and none is joined or cancelled.
#[derive(Debug, Clone)]
pub struct UploadDispatcher {
    pipeline: Arc<UploadPipeline>,
    event_bus: Option<Arc<EventBus>>,
}

impl UploadDispatcher {
    /// Create a dispatcher for `pipeline`
    pub fn new(pipeline: Arc<UploadPipeline>) -> Self {
        Self {
            pipeline,
            event_bus: None,
        }
    }

    /// Publish upload outcomes on this bus
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Start the pipeline for `job_directory` on a new worker
    ///
    /// The outcome is logged and published; the returned handle may be
    /// dropped.
    pub fn dispatch(
        &self,
        job_directory: PathBuf,
    ) -> std::io::Result<JoinHandle<Result<UploadRecord, UploadError>>> {
        let pipeline = self.pipeline.clone();
        let event_bus = self.event_bus.clone();

        std::thread::Builder::new()
            .name("layerwatch-upload".to_string())
            .spawn(move || {
                let job_name = job_directory
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();

                let result = pipeline.run(&job_directory);
                let event = match &result {
                    Ok(record) => {
                        tracing::info!("Uploaded {}", record.job_name);
                        UploadEvent::Completed { job_name }
                    }
                    Err(e) => {
                        tracing::error!("Upload of {} failed: {}", job_name, e);
                        UploadEvent::Failed {
                            job_name,
                            reason: e.to_string(),
                        }
                    }
                };
                if let Some(bus) = event_bus {
                    bus.publish(AppEvent::Upload(event));
                }
                result
            })
    }
}

impl JobHandoff for UploadDispatcher {
    fn hand_off(&self, job_directory: PathBuf) {
        if let Err(e) = self.dispatch(job_directory) {
            tracing::error!("Could not start upload worker: {}", e);
        }
    }
}
