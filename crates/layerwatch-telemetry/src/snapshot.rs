//! Camera snapshot sources

use layerwatch_core::TelemetryError;
use std::io::Read;
use std::time::Duration;

/// Upper bound on a single snapshot body
const MAX_SNAPSHOT_BYTES: u64 = 16 * 1024 * 1024;

/// Source of JPEG snapshots
///
/// Implementations must return within a bounded time since they are called
/// from the polling loop.
pub trait SnapshotSource: Send + Sync {
    /// Fetch one image
    fn fetch(&self) -> Result<Vec<u8>, TelemetryError>;
}

/// Snapshot fetched over HTTP from the camera streamer
pub struct HttpSnapshotSource {
    url: String,
    agent: ureq::Agent,
}

impl HttpSnapshotSource {
    /// Create a source for `url` with a per-request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    /// Snapshot endpoint
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SnapshotSource for HttpSnapshotSource {
    fn fetch(&self) -> Result<Vec<u8>, TelemetryError> {
        let failed = |reason: String| TelemetryError::SnapshotFailed {
            url: self.url.clone(),
            reason,
        };

        let response = self
            .agent
            .get(&self.url)
            .call()
            .map_err(|e| failed(e.to_string()))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_SNAPSHOT_BYTES)
            .read_to_end(&mut bytes)
            .map_err(|e| failed(e.to_string()))?;
        Ok(bytes)
    }
}

impl std::fmt::Debug for HttpSnapshotSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSnapshotSource")
            .field("url", &self.url)
            .finish()
    }
}
