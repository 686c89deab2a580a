//! Remote storage for archived jobs

use layerwatch_core::UploadError;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Destination for archived job bundles
pub trait BlobStore: Send + Sync {
    /// Store the file at `source` as `<namespace>/<name>`
    fn upload_blob(&self, namespace: &str, name: &str, source: &Path) -> Result<(), UploadError>;
}

/// Object storage reached over HTTP
///
/// Bundles are sent with `PUT <endpoint>/<bucket>/<namespace>/<name>`. The
/// request has no timeout: a bundle can take minutes on a slow uplink, and
/// the upload runs on its own worker.
pub struct HttpBlobStore {
    endpoint: String,
    bucket: String,
    agent: ureq::Agent,
}

impl HttpBlobStore {
    /// Create a store for `bucket` under `endpoint`
    pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    /// URL a blob is uploaded to
    pub fn blob_url(&self, namespace: &str, name: &str) -> String {
        format!("{}/{}/{}/{}", self.endpoint, self.bucket, namespace, name)
    }
}

impl BlobStore for HttpBlobStore {
    fn upload_blob(&self, namespace: &str, name: &str, source: &Path) -> Result<(), UploadError> {
        let url = self.blob_url(namespace, name);
        let failed = |reason: String| UploadError::StorageFailed {
            name: name.to_string(),
            reason,
        };

        let file = File::open(source).map_err(|e| failed(e.to_string()))?;
        let length = file.metadata().map_err(|e| failed(e.to_string()))?.len();

        self.agent
            .put(&url)
            .set("Content-Type", "application/octet-stream")
            .set("Content-Length", &length.to_string())
            .send(BufReader::new(file))
            .map_err(|e| failed(e.to_string()))?;

        tracing::debug!("Uploaded {} bytes to {}", length, url);
        Ok(())
    }
}

impl std::fmt::Debug for HttpBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBlobStore")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .finish()
    }
}

/// Store that copies bundles into a local directory tree
#[derive(Debug, Clone)]
pub struct DirectoryBlobStore {
    root: PathBuf,
}

impl DirectoryBlobStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path a blob is stored at
    pub fn blob_path(&self, namespace: &str, name: &str) -> PathBuf {
        self.root.join(namespace).join(name)
    }
}

impl BlobStore for DirectoryBlobStore {
    fn upload_blob(&self, namespace: &str, name: &str, source: &Path) -> Result<(), UploadError> {
        let destination = self.blob_path(namespace, name);
        let failed = |reason: String| UploadError::StorageFailed {
            name: name.to_string(),
            reason,
        };

        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(|e| failed(e.to_string()))?;
        }
        std::fs::copy(source, &destination).map_err(|e| failed(e.to_string()))?;
        Ok(())
    }
}
