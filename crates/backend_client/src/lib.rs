use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt};
use shared::{
    domain::{BackendKind, DisplayTest, FileLocation, ProfileId},
    protocol::{
        AnalyticsSample, BackendCapabilities, FileListing, PrintMetadata, Profile, ProfileDraft,
        StatusSnapshot, Temperature,
    },
};
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::IntervalStream;
use tracing::info;

pub mod daemon;
pub mod engine;
pub mod error;
pub mod transport;

pub use daemon::DaemonClient;
pub use engine::EngineClient;
pub use error::{BackendError, Result};
pub use transport::HttpTransport;

const MIN_POLL_PERIOD: Duration = Duration::from_millis(10);

/// Everything the panel can ask of a printer-control backend.
///
/// Implementations are plain request/response adapters: no caching, no
/// retries and no client-side locking. Motion commands in particular are not
/// safe to resend blindly, so retry policy stays with the caller.
///
/// Optional operations default to [`BackendError::Unsupported`]; check
/// [`BackendClient::capabilities`] before offering them.
#[async_trait]
pub trait BackendClient: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn capabilities(&self) -> BackendCapabilities;

    async fn start_print(&self, location: FileLocation, path: &str) -> Result<()>;
    async fn cancel_print(&self) -> Result<()>;
    async fn pause_print(&self) -> Result<()>;
    async fn resume_print(&self) -> Result<()>;

    async fn move_to(&self, z_mm: f64) -> Result<()>;
    async fn move_by(&self, delta_mm: f64) -> Result<()>;
    async fn home(&self) -> Result<()>;
    async fn set_curing(&self, enabled: bool) -> Result<()>;
    async fn emergency_stop(&self) -> Result<()>;

    async fn move_to_top(&self) -> Result<()> {
        Err(BackendError::unsupported(self.kind(), "move to top"))
    }

    async fn list_files(
        &self,
        location: FileLocation,
        subdirectory: Option<&str>,
        page_index: usize,
        page_size: usize,
    ) -> Result<FileListing>;
    async fn file_metadata(&self, location: FileLocation, path: &str) -> Result<PrintMetadata>;
    async fn thumbnail(&self, location: FileLocation, path: &str) -> Result<Vec<u8>>;
    async fn delete_file(&self, location: FileLocation, path: &str) -> Result<()>;

    async fn status(&self) -> Result<StatusSnapshot>;

    /// Polls [`BackendClient::status`] every `period`, first poll immediately.
    ///
    /// The stream never ends on its own and yields snapshots in the order the
    /// polls complete; failed polls are yielded as errors and polling goes on.
    /// Calling it again starts an independent sequence.
    fn status_stream(&self, period: Duration) -> BoxStream<'_, Result<StatusSnapshot>> {
        let mut ticks = tokio::time::interval(period.max(MIN_POLL_PERIOD));
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        IntervalStream::new(ticks)
            .then(move |_| self.status())
            .boxed()
    }

    async fn display_test(&self, pattern: DisplayTest) -> Result<()>;

    async fn list_profiles(&self) -> Result<Vec<Profile>> {
        Err(BackendError::unsupported(self.kind(), "profiles"))
    }

    async fn create_profile(&self, _draft: &ProfileDraft) -> Result<Profile> {
        Err(BackendError::unsupported(self.kind(), "profiles"))
    }

    async fn update_profile(&self, _profile: &Profile) -> Result<()> {
        Err(BackendError::unsupported(self.kind(), "profiles"))
    }

    async fn delete_profile(&self, _id: ProfileId) -> Result<()> {
        Err(BackendError::unsupported(self.kind(), "profiles"))
    }

    async fn temperature(&self) -> Result<Temperature> {
        Err(BackendError::unsupported(self.kind(), "temperature"))
    }

    async fn set_temperature(&self, _target_c: f64) -> Result<()> {
        Err(BackendError::unsupported(self.kind(), "temperature"))
    }

    async fn analytics(&self, _limit: usize) -> Result<Vec<AnalyticsSample>> {
        Err(BackendError::unsupported(self.kind(), "analytics"))
    }

    async fn trigger_update(&self) -> Result<()> {
        Err(BackendError::unsupported(self.kind(), "firmware update"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub kind: BackendKind,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Engine,
            base_url: "http://localhost:12357".into(),
            request_timeout: transport::DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Builds the adapter for `config.kind`. The returned handle is meant to be
/// constructed once and passed to whatever drives the panel.
pub fn connect(config: &ClientConfig) -> Result<Arc<dyn BackendClient>> {
    let transport = HttpTransport::new(&config.base_url, config.request_timeout)?;
    info!(
        backend = %config.kind,
        base_url = transport.base_url(),
        "backend client ready"
    );
    let client: Arc<dyn BackendClient> = match config.kind {
        BackendKind::Engine => Arc::new(EngineClient::new(transport)),
        BackendKind::Daemon => Arc::new(DaemonClient::new(transport)),
    };
    Ok(client)
}

#[cfg(test)]
#[path = "tests/fake_backend.rs"]
mod fake_backend;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
