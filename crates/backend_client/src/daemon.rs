//! Adapter for the alternate control daemon.
//!
//! The daemon drives everything through `GET` routes with path parameters,
//! answers in PascalCase JSON, measures heights in microns and addresses
//! files as numbered plates. Plate ids are resolved from paths through the
//! plate listing on each call; nothing is cached.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    domain::{BackendKind, DisplayTest, FileLocation, PlateId, ProfileId},
    protocol::{
        AnalyticsSample, BackendCapabilities, FileData, FileListing, PrintMetadata, Profile,
        ProfileDraft, StatusSnapshot, Temperature,
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

const MICRONS_PER_MM: f64 = 1000.0;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DaemonStatus {
    printing: bool,
    paused: bool,
    state: i32,
    #[serde(rename = "LayerID", default)]
    layer_id: u32,
    #[serde(default)]
    layers_count: u32,
    #[serde(default)]
    current_height: i64,
    #[serde(default)]
    path: String,
    #[serde(default)]
    curing: bool,
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DaemonPlate {
    #[serde(rename = "PlateID")]
    plate_id: PlateId,
    path: String,
    layers_count: u32,
    #[serde(with = "shared::print_time", default)]
    print_time: u64,
    #[serde(default)]
    layer_thickness: f64,
    #[serde(default)]
    used_material: f64,
    #[serde(default)]
    size: u64,
    #[serde(with = "chrono::serde::ts_seconds")]
    created_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DaemonProfile {
    #[serde(rename = "ProfileID", skip_serializing_if = "Option::is_none")]
    profile_id: Option<ProfileId>,
    title: String,
    /// Layer height in microns.
    depth: u32,
    cure_time: f64,
    support_cure_time: f64,
    support_layer_number: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DaemonHeater {
    current: f64,
    target: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DaemonAnalytic {
    #[serde(rename = "T", with = "chrono::serde::ts_seconds")]
    recorded_at: DateTime<Utc>,
    #[serde(rename = "K")]
    metric: String,
    #[serde(rename = "V")]
    value: f64,
}

fn label_for_code(code: i32) -> String {
    match code {
        STATE_IDLE => "Idle".into(),
        STATE_PRINTING => "Printing".into(),
        STATE_PAUSED => "Paused".into(),
        STATE_FINISHED => "Finished".into(),
        STATE_CANCELING => "Canceling".into(),
        STATE_SHUTDOWN => "Error".into(),
        other => format!("State {other}"),
    }
}

fn mm_to_microns(mm: f64) -> i64 {
    (mm * MICRONS_PER_MM).round() as i64
}

fn file_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

impl DaemonPlate {
    fn into_metadata(self) -> PrintMetadata {
        PrintMetadata {
            file_data: FileData {
                name: file_name(&self.path),
                path: self.path,
                last_modified: self.created_date,
                file_size: self.size,
                location: FileLocation::Local,
            },
            print_time: self.print_time,
            layer_count: self.layers_count,
            layer_height_mm: self.layer_thickness,
            used_material_ml: self.used_material,
        }
    }
}

impl DaemonProfile {
    fn from_draft(id: Option<ProfileId>, draft: &ProfileDraft) -> Self {
        Self {
            profile_id: id,
            title: draft.name.clone(),
            depth: mm_to_microns(draft.layer_height_mm).max(0) as u32,
            cure_time: draft.exposure_s,
            support_cure_time: draft.bottom_exposure_s,
            support_layer_number: draft.bottom_layers,
        }
    }

    fn into_profile(self, endpoint: &str) -> Result<Profile> {
        let id = self
            .profile_id
            .ok_or_else(|| BackendError::unexpected(endpoint, "profile without ProfileID"))?;
        Ok(Profile {
            id,
            settings: ProfileDraft {
                name: self.title,
                layer_height_mm: f64::from(self.depth) / MICRONS_PER_MM,
                exposure_s: self.cure_time,
                bottom_exposure_s: self.support_cure_time,
                bottom_layers: self.support_layer_number,
            },
        })
    }
}

pub struct DaemonClient {
    transport: HttpTransport,
}

impl DaemonClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    async fn fetch_status(&self) -> Result<DaemonStatus> {
        self.transport.get_json("/status", &[]).await
    }

    async fn plates(&self) -> Result<Vec<DaemonPlate>> {
        self.transport.get_json("/plates/list/json", &[]).await
    }

    async fn find_plate(&self, location: FileLocation, path: &str) -> Result<DaemonPlate> {
        self.require_local(location)?;
        self.plates()
            .await?
            .into_iter()
            .find(|plate| plate.path == path)
            .ok_or_else(|| BackendError::NotFound {
                what: format!("plate {path:?}"),
            })
    }

    async fn move_microns(&self, delta: i64) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }
        let direction = if delta > 0 { "up" } else { "down" };
        self.transport
            .get(&format!(
                "/z-axis/move/{direction}/micron/{}",
                delta.unsigned_abs()
            ))
            .await
    }

    // The daemon only knows its own plate store.
    fn require_local(&self, location: FileLocation) -> Result<()> {
        match location {
            FileLocation::Local => Ok(()),
            FileLocation::Usb => Err(BackendError::unsupported(self.kind(), "usb storage")),
        }
    }
}

#[async_trait]
impl BackendClient for DaemonClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Daemon
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            move_to_top: true,
            profiles: true,
            temperature: true,
            analytics: true,
            firmware_update: true,
        }
    }

    async fn start_print(&self, location: FileLocation, path: &str) -> Result<()> {
        let plate = self.find_plate(location, path).await?;
        self.transport
            .get(&format!("/printer/start/{}", plate.plate_id))
            .await
    }

    async fn cancel_print(&self) -> Result<()> {
        self.transport.get("/printer/stop").await
    }

    async fn pause_print(&self) -> Result<()> {
        self.transport.get("/printer/pause").await
    }

    async fn resume_print(&self) -> Result<()> {
        self.transport.get("/printer/unpause").await
    }

    async fn move_to(&self, z_mm: f64) -> Result<()> {
        // The daemon only takes relative moves.
        let current = self.fetch_status().await?.current_height;
        let delta = mm_to_microns(z_mm.max(0.0)) - current;
        debug!(current, delta, "absolute move resolved to relative steps");
        self.move_microns(delta).await
    }

    async fn move_by(&self, delta_mm: f64) -> Result<()> {
        self.move_microns(mm_to_microns(delta_mm)).await
    }

    async fn home(&self) -> Result<()> {
        self.transport.get("/z-axis/calibrate").await
    }

    async fn move_to_top(&self) -> Result<()> {
        self.transport.get("/z-axis/top").await
    }

    async fn set_curing(&self, enabled: bool) -> Result<()> {
        if enabled {
            self.transport.get("/projector/white").await
        } else {
            self.transport.get("/projector/blank").await
        }
    }

    async fn emergency_stop(&self) -> Result<()> {
        self.transport.get("/printer/force-stop").await
    }

    async fn list_files(
        &self,
        location: FileLocation,
        _subdirectory: Option<&str>,
        page_index: usize,
        page_size: usize,
    ) -> Result<FileListing> {
        self.require_local(location)?;
        let plates = self.plates().await?;
        let page_size = page_size.max(1);
        let start = page_index.saturating_mul(page_size);
        let next_index = (start.saturating_add(page_size) < plates.len()).then_some(page_index + 1);

        let files = plates
            .into_iter()
            .skip(start)
            .take(page_size)
            .map(DaemonPlate::into_metadata)
            .collect();

        Ok(FileListing {
            files,
            dirs: Vec::new(),
            next_index,
        })
    }

    async fn file_metadata(&self, location: FileLocation, path: &str) -> Result<PrintMetadata> {
        Ok(self.find_plate(location, path).await?.into_metadata())
    }

    async fn thumbnail(&self, location: FileLocation, path: &str) -> Result<Vec<u8>> {
        let plate = self.find_plate(location, path).await?;
        self.transport
            .get_bytes(&format!("/static/plates/{}/3d.png", plate.plate_id), &[])
            .await
    }

    async fn delete_file(&self, location: FileLocation, path: &str) -> Result<()> {
        let plate = self.find_plate(location, path).await?;
        self.transport
            .get(&format!("/plate/delete/{}", plate.plate_id))
            .await
    }

    async fn status(&self) -> Result<StatusSnapshot> {
        let status = self.fetch_status().await?;
        let active = status.state != STATE_IDLE && !status.path.is_empty();

        Ok(StatusSnapshot {
            raw: RawStatus::new(
                status.printing,
                status.paused,
                label_for_code(status.state),
                status.state,
            ),
            layer: active.then_some(status.layer_id),
            layer_count: active.then_some(status.layers_count),
            z_mm: status.current_height as f64 / MICRONS_PER_MM,
            curing: status.curing,
            file_path: active.then_some(status.path),
            temperature_c: status.temp,
        })
    }

    async fn display_test(&self, pattern: DisplayTest) -> Result<()> {
        self.transport
            .get(&format!("/projector/test/{}", pattern.as_str()))
            .await
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>> {
        let endpoint = self.transport.endpoint("/json/db/profiles.json");
        let profiles: Vec<DaemonProfile> =
            self.transport.get_json("/json/db/profiles.json", &[]).await?;
        profiles
            .into_iter()
            .map(|profile| profile.into_profile(&endpoint))
            .collect()
    }

    async fn create_profile(&self, draft: &ProfileDraft) -> Result<Profile> {
        let endpoint = self.transport.endpoint("/profile/add");
        let created: DaemonProfile = self
            .transport
            .post_json("/profile/add", &DaemonProfile::from_draft(None, draft))
            .await?;
        created.into_profile(&endpoint)
    }

    async fn update_profile(&self, profile: &Profile) -> Result<()> {
        self.transport
            .post_json_ignore(
                &format!("/profile/edit/{}", profile.id),
                &DaemonProfile::from_draft(Some(profile.id), &profile.settings),
            )
            .await
    }

    async fn delete_profile(&self, id: ProfileId) -> Result<()> {
        self.transport.get(&format!("/profile/delete/{id}")).await
    }

    async fn temperature(&self) -> Result<Temperature> {
        let heater: DaemonHeater = self.transport.get_json("/heater", &[]).await?;
        Ok(Temperature {
            current_c: heater.current,
            target_c: heater.target,
        })
    }

    async fn set_temperature(&self, target_c: f64) -> Result<()> {
        self.transport
            .get(&format!("/heater/target/{target_c}"))
            .await
    }

    async fn analytics(&self, limit: usize) -> Result<Vec<AnalyticsSample>> {
        let samples: Vec<DaemonAnalytic> = self
            .transport
            .get_json(&format!("/analytic/data/{limit}"), &[])
            .await?;
        Ok(samples
            .into_iter()
            .map(|sample| AnalyticsSample {
                metric: sample.metric,
                value: sample.value,
                recorded_at: sample.recorded_at,
            })
            .collect())
    }

    async fn trigger_update(&self) -> Result<()> {
        self.transport.get("/system/upgrade").await
    }
}

#[cfg(test)]
#[path = "tests/daemon_tests.rs"]
mod tests;
