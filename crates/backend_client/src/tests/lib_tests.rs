use super::*;
use crate::fake_backend::{unreachable_base_url, FakeBackend};
use serde_json::json;
use shared::status::RawStatus;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Backend fake that serves a fixed script of status polls and implements
/// nothing optional.
struct ScriptedBackend {
    polls: Mutex<VecDeque<Result<StatusSnapshot>>>,
}

impl ScriptedBackend {
    fn new(polls: Vec<Result<StatusSnapshot>>) -> Self {
        Self {
            polls: Mutex::new(polls.into()),
        }
    }
}

fn snapshot(state_code: i32) -> StatusSnapshot {
    StatusSnapshot {
        raw: RawStatus::new(state_code == 1, false, "scripted", state_code),
        layer: None,
        layer_count: None,
        z_mm: 0.0,
        curing: false,
        file_path: None,
        temperature_c: None,
    }
}

#[async_trait]
impl BackendClient for ScriptedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Engine
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::default()
    }

    async fn start_print(&self, _location: FileLocation, _path: &str) -> Result<()> {
        Ok(())
    }

    async fn cancel_print(&self) -> Result<()> {
        Ok(())
    }

    async fn pause_print(&self) -> Result<()> {
        Ok(())
    }

    async fn resume_print(&self) -> Result<()> {
        Ok(())
    }

    async fn move_to(&self, _z_mm: f64) -> Result<()> {
        Ok(())
    }

    async fn move_by(&self, _delta_mm: f64) -> Result<()> {
        Ok(())
    }

    async fn home(&self) -> Result<()> {
        Ok(())
    }

    async fn set_curing(&self, _enabled: bool) -> Result<()> {
        Ok(())
    }

    async fn emergency_stop(&self) -> Result<()> {
        Ok(())
    }

    async fn list_files(
        &self,
        _location: FileLocation,
        _subdirectory: Option<&str>,
        _page_index: usize,
        _page_size: usize,
    ) -> Result<FileListing> {
        Ok(FileListing::default())
    }

    async fn file_metadata(&self, _location: FileLocation, path: &str) -> Result<PrintMetadata> {
        Err(BackendError::NotFound {
            what: path.to_string(),
        })
    }

    async fn thumbnail(&self, _location: FileLocation, _path: &str) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }

    async fn delete_file(&self, _location: FileLocation, _path: &str) -> Result<()> {
        Ok(())
    }

    async fn status(&self) -> Result<StatusSnapshot> {
        self.polls
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(snapshot(0)))
    }

    async fn display_test(&self, _pattern: DisplayTest) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn status_stream_yields_polls_in_order_and_survives_errors() {
    let backend = ScriptedBackend::new(vec![
        Ok(snapshot(1)),
        Err(BackendError::unexpected("/status", "garbled")),
        Ok(snapshot(4)),
        Ok(snapshot(0)),
    ]);

    let polled: Vec<_> = backend
        .status_stream(Duration::from_millis(1))
        .take(4)
        .collect()
        .await;

    let codes: Vec<_> = polled
        .iter()
        .map(|poll| poll.as_ref().ok().map(|snapshot| snapshot.raw.state_code))
        .collect();
    assert_eq!(codes, vec![Some(1), None, Some(4), Some(0)]);
}

#[tokio::test]
async fn status_stream_restarts_independently() {
    let backend = ScriptedBackend::new(vec![Ok(snapshot(1)), Ok(snapshot(2))]);

    let first: Vec<_> = backend
        .status_stream(Duration::from_millis(1))
        .take(1)
        .collect()
        .await;
    let second: Vec<_> = backend
        .status_stream(Duration::from_millis(1))
        .take(2)
        .collect()
        .await;

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 2);
    assert_eq!(
        second[0].as_ref().expect("poll").raw.state_code,
        2,
        "second stream continues from the backend's current state"
    );
}

#[tokio::test]
async fn optional_operations_default_to_unsupported() {
    let backend: Arc<dyn BackendClient> = Arc::new(ScriptedBackend::new(Vec::new()));

    for result in [
        backend.move_to_top().await,
        backend.set_temperature(30.0).await,
        backend.trigger_update().await,
        backend.delete_profile(ProfileId(1)).await,
    ] {
        let err = result.expect_err("unsupported");
        assert!(
            matches!(err, BackendError::Unsupported { .. }),
            "unexpected error: {err:?}"
        );
    }
    assert!(backend.analytics(5).await.is_err());
    assert!(backend.temperature().await.is_err());
}

#[tokio::test]
async fn connect_selects_adapter_by_kind() {
    let fake = FakeBackend::spawn().await;

    for kind in [BackendKind::Engine, BackendKind::Daemon] {
        let client = connect(&ClientConfig {
            kind,
            base_url: fake.base_url.clone(),
            ..ClientConfig::default()
        })
        .expect("connect");
        assert_eq!(client.kind(), kind);
    }
}

#[test]
fn connect_rejects_invalid_base_urls() {
    for base_url in ["not a url", "ftp://printer.local"] {
        let result = connect(&ClientConfig {
            base_url: base_url.to_string(),
            ..ClientConfig::default()
        });
        assert!(
            matches!(result, Err(BackendError::InvalidConfig(_))),
            "{base_url} should be rejected"
        );
    }
}

#[test]
fn base_url_trailing_slash_is_normalized() {
    let transport =
        HttpTransport::new("http://printer.local:12357/", Duration::from_secs(1)).expect("url");
    assert_eq!(transport.endpoint("/status"), "http://printer.local:12357/status");
}

#[tokio::test]
async fn unreachable_engine_is_a_transport_failure() {
    let client = connect(&ClientConfig {
        base_url: unreachable_base_url().await,
        request_timeout: Duration::from_secs(2),
        ..ClientConfig::default()
    })
    .expect("connect");

    let err = client.cancel_print().await.expect_err("refused");

    assert!(err.is_unavailable(), "unexpected error: {err:?}");
}

#[tokio::test]
async fn engine_status_stream_polls_over_http() {
    let fake = FakeBackend::spawn().await;
    for status in ["Printing", "Cancelling", "Idle"] {
        fake.respond_json(
            "/status",
            json!({
                "status": status,
                "paused": false,
                "layer": null,
                "print_data": null,
                "physical_state": { "z": 1.0 }
            }),
        )
        .await;
    }
    let client = EngineClient::new(fake.transport());

    let labels: Vec<_> = client
        .status_stream(Duration::from_millis(5))
        .take(4)
        .map(|poll| poll.expect("poll").raw.state)
        .collect()
        .await;

    assert_eq!(labels, vec!["Printing", "Cancelling", "Idle", "Idle"]);
}
