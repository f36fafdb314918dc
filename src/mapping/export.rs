//! # Mapping Export
//!
//! The finished mapping as a serializable snapshot, meant to be copied out
//! and transcribed into a driver mapping table.
//!
//! ## Format
//!
//! ```json
//! {
//!   "deviceId": "Wireless Controller (Vendor: 054c Product: 0ce6)",
//!   "mappings": [
//!     { "name": "Button A", "target": "button", "index": 0, "mapsTo": { "button": 1 } },
//!     { "name": "Button B", "target": "button", "index": 1, "mapsTo": {} },
//!     { "name": "Axis Left Analog Stick Horizontal", "target": "axis", "index": 0, "mapsTo": { "axis": "0+" } }
//!   ]
//! }
//! ```
//!
//! An empty `mapsTo` object means the step was skipped.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use super::control::ActiveControl;
use super::state::MappingState;
use super::step::StepTarget;
use crate::error::Result;

/// One exported step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedMapping {
    /// Step display name.
    pub name: String,
    /// Logical slot kind.
    pub target: StepTarget,
    /// Logical slot index.
    pub index: usize,
    /// Observed physical control, `{}` when unassigned.
    #[serde(with = "maps_to", default)]
    pub maps_to: Option<ActiveControl>,
}

/// Device identifier plus every step's result, in step order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingExport {
    /// Device id string as reported by the input backend.
    pub device_id: String,
    /// Ordered step results.
    pub mappings: Vec<ExportedMapping>,
}

impl MappingExport {
    /// Captures the current results of `state` for `device_id`.
    #[must_use]
    pub fn from_state(device_id: impl Into<String>, state: &MappingState) -> Self {
        let mappings = state
            .mappings()
            .iter()
            .map(|m| ExportedMapping {
                name: m.step.name.clone(),
                target: m.step.target,
                index: m.step.index,
                maps_to: m.maps_to,
            })
            .collect();

        Self {
            device_id: device_id.into(),
            mappings,
        }
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `Json` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads an export previously written by [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, `Json` if it is malformed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Writes the export to `<dir>/mapping-YYYYMMDD-HHMMSS-mmm.json`.
    ///
    /// Creates `dir` if it does not exist. Existing files are never
    /// overwritten: a `-N` suffix is added until the name is free.
    ///
    /// # Returns
    ///
    /// The path of the written file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory or file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let json = self.to_json_pretty()?;
        let stamp = Local::now().format("%Y%m%d-%H%M%S-%3f").to_string();

        for attempt in 0u32.. {
            let file_name = match attempt {
                0 => format!("mapping-{}.json", stamp),
                n => format!("mapping-{}-{}.json", stamp, n),
            };
            let path = dir.join(file_name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(json.as_bytes())?;
                    info!("Saved mapping for '{}' to {}", self.device_id, path.display());
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(io::Error::new(io::ErrorKind::AlreadyExists, "no free export file name").into())
    }
}

mod maps_to {
    use serde::de::{self, Deserializer};
    use serde::ser::{SerializeMap, Serializer};
    use serde::{Deserialize, Serialize};

    use crate::mapping::control::{ActiveControl, RawControl};

    pub fn serialize<S: Serializer>(
        value: &Option<ActiveControl>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(control) => control.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<ActiveControl>, D::Error> {
        RawControl::deserialize(deserializer)?
            .into_control()
            .map_err(de::Error::custom)
    }
}
