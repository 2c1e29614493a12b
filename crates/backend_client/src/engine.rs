//! Adapter for the primary printing engine.
//!
//! The engine speaks snake_case JSON, takes commands as `POST`s with query
//! parameters and reports status as a text label plus a `paused` flag; the
//! numeric state code is derived here.

use async_trait::async_trait;
use serde::Deserialize;
use shared::{
    domain::{BackendKind, DisplayTest, FileLocation},
    protocol::{
        AnalyticsSample, BackendCapabilities, FileListing, PrintMetadata, StatusSnapshot,
    },
    status::{
        RawStatus, STATE_CANCELING, STATE_FINISHED, STATE_IDLE, STATE_PAUSED, STATE_PRINTING,
        STATE_SHUTDOWN,
    },
};
use tracing::debug;

use crate::{
    error::{BackendError, Result},
    transport::HttpTransport,
    BackendClient,
};

const EMERGENCY_STOP_GCODE: &str = "M112";

#[derive(Debug, Deserialize)]
struct EngineStatus {
    status: String,
    #[serde(default)]
    paused: bool,
    layer: Option<u32>,
    print_data: Option<PrintMetadata>,
    physical_state: PhysicalState,
}

#[derive(Debug, Deserialize)]
struct PhysicalState {
    z: f64,
    #[serde(default)]
    curing: bool,
}

pub struct EngineClient {
    transport: HttpTransport,
}

impl EngineClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    async fn fetch_status(&self) -> Result<EngineStatus> {
        self.transport.get_json("/status", &[]).await
    }

    fn file_query(location: FileLocation, path: &str) -> [(&'static str, String); 2] {
        [
            ("location", location.to_string()),
            ("file_path", path.to_string()),
        ]
    }
}

/// Maps an engine status label to the shared state code and the `printing`
/// flag. Unknown labels are a schema mismatch.
fn classify_label(label: &str, paused: bool) -> Option<(bool, i32)> {
    let normalized = label.trim().to_ascii_lowercase();
    let classified = match normalized.as_str() {
        "idle" => (false, STATE_IDLE),
        "printing" if paused => (true, STATE_PAUSED),
        "printing" => (true, STATE_PRINTING),
        "paused" => (true, STATE_PAUSED),
        "finished" | "complete" => (false, STATE_FINISHED),
        "canceling" | "cancelling" => (false, STATE_CANCELING),
        "shutdown" | "error" => (false, STATE_SHUTDOWN),
        _ => return None,
    };
    Some(classified)
}

fn snapshot_from_engine(endpoint: &str, status: EngineStatus) -> Result<StatusSnapshot> {
    let (printing, state_code) = classify_label(&status.status, status.paused)
        .ok_or_else(|| {
            BackendError::unexpected(endpoint, format!("unknown status {:?}", status.status))
        })?;

    Ok(StatusSnapshot {
        raw: RawStatus::new(printing, status.paused, status.status, state_code),
        layer: status.layer,
        layer_count: status.print_data.as_ref().map(|data| data.layer_count),
        z_mm: status.physical_state.z,
        curing: status.physical_state.curing,
        file_path: status.print_data.map(|data| data.file_data.path),
        temperature_c: None,
    })
}

#[async_trait]
impl BackendClient for EngineClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Engine
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            move_to_top: false,
            profiles: false,
            temperature: false,
            analytics: true,
            firmware_update: true,
        }
    }

    async fn start_print(&self, location: FileLocation, path: &str) -> Result<()> {
        self.transport
            .post("/print/start", &Self::file_query(location, path))
            .await
    }

    async fn cancel_print(&self) -> Result<()> {
        self.transport.post("/print/cancel", &[]).await
    }

    async fn pause_print(&self) -> Result<()> {
        self.transport.post("/print/pause", &[]).await
    }

    async fn resume_print(&self) -> Result<()> {
        self.transport.post("/print/resume", &[]).await
    }

    async fn move_to(&self, z_mm: f64) -> Result<()> {
        self.transport
            .post("/manual", &[("z", z_mm.to_string())])
            .await
    }

    async fn move_by(&self, delta_mm: f64) -> Result<()> {
        // The engine only takes absolute targets.
        let current = self.fetch_status().await?.physical_state.z;
        let target = (current + delta_mm).max(0.0);
        debug!(current, target, "relative move resolved to absolute target");
        self.move_to(target).await
    }

    async fn home(&self) -> Result<()> {
        self.transport.post("/manual/home", &[]).await
    }

    async fn set_curing(&self, enabled: bool) -> Result<()> {
        self.transport
            .post("/manual", &[("cure", enabled.to_string())])
            .await
    }

    async fn emergency_stop(&self) -> Result<()> {
        self.transport
            .post(
                "/manual/hardware_command",
                &[("command", EMERGENCY_STOP_GCODE.to_string())],
            )
            .await
    }

    async fn list_files(
        &self,
        location: FileLocation,
        subdirectory: Option<&str>,
        page_index: usize,
        page_size: usize,
    ) -> Result<FileListing> {
        let mut query = vec![
            ("location", location.to_string()),
            ("page_index", page_index.to_string()),
            ("page_size", page_size.to_string()),
        ];
        if let Some(subdirectory) = subdirectory {
            query.push(("subdirectory", subdirectory.to_string()));
        }
        self.transport.get_json("/files", &query).await
    }

    async fn file_metadata(&self, location: FileLocation, path: &str) -> Result<PrintMetadata> {
        self.transport
            .get_json("/files/metadata", &Self::file_query(location, path))
            .await
    }

    async fn thumbnail(&self, location: FileLocation, path: &str) -> Result<Vec<u8>> {
        self.transport
            .get_bytes("/files/thumbnail", &Self::file_query(location, path))
            .await
    }

    async fn delete_file(&self, location: FileLocation, path: &str) -> Result<()> {
        self.transport
            .delete("/files", &Self::file_query(location, path))
            .await
    }

    async fn status(&self) -> Result<StatusSnapshot> {
        let status = self.fetch_status().await?;
        snapshot_from_engine(&self.transport.endpoint("/status"), status)
    }

    async fn display_test(&self, pattern: DisplayTest) -> Result<()> {
        self.transport
            .post(
                "/manual/display_test",
                &[("test", pattern.as_str().to_string())],
            )
            .await
    }

    async fn analytics(&self, limit: usize) -> Result<Vec<AnalyticsSample>> {
        self.transport
            .get_json("/analytics", &[("limit", limit.to_string())])
            .await
    }

    async fn trigger_update(&self) -> Result<()> {
        self.transport.post("/update/upgrade", &[]).await
    }
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
