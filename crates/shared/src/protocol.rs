use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{FileLocation, ProfileId},
    status::RawStatus,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileData {
    pub path: String,
    pub name: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_modified: DateTime<Utc>,
    pub file_size: u64,
    #[serde(default)]
    pub location: FileLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintMetadata {
    pub file_data: FileData,
    #[serde(with = "crate::print_time", default)]
    pub print_time: u64,
    pub layer_count: u32,
    #[serde(default)]
    pub layer_height_mm: f64,
    #[serde(default)]
    pub used_material_ml: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub path: String,
    pub name: String,
}

/// One page of a library listing. `next_index` is the page to request next,
/// absent on the last page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FileListing {
    #[serde(default)]
    pub files: Vec<PrintMetadata>,
    #[serde(default)]
    pub dirs: Vec<DirEntry>,
    #[serde(default)]
    pub next_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub raw: RawStatus,
    pub layer: Option<u32>,
    pub layer_count: Option<u32>,
    pub z_mm: f64,
    pub curing: bool,
    pub file_path: Option<String>,
    pub temperature_c: Option<f64>,
}

impl StatusSnapshot {
    /// Fraction of layers done, when the backend reports both counters.
    pub fn progress(&self) -> Option<f64> {
        match (self.layer, self.layer_count) {
            (Some(layer), Some(count)) if count > 0 => {
                Some((f64::from(layer) / f64::from(count)).clamp(0.0, 1.0))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub name: String,
    pub layer_height_mm: f64,
    pub exposure_s: f64,
    pub bottom_exposure_s: f64,
    pub bottom_layers: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    #[serde(flatten)]
    pub settings: ProfileDraft,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub current_c: f64,
    pub target_c: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSample {
    pub metric: String,
    pub value: f64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub recorded_at: DateTime<Utc>,
}

/// What a backend can do beyond the operations every backend supports.
///
/// Callers probe this before offering the matching action; invoking an
/// operation whose flag is false fails with `Unsupported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BackendCapabilities {
    pub move_to_top: bool,
    pub profiles: bool,
    pub temperature: bool,
    pub analytics: bool,
    pub firmware_update: bool,
}
