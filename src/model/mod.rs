//! Wire Data Types
//!
//! Serde types mirroring the monitoring backend's JSON payloads.
//! All field names follow the backend's camelCase convention.

mod device;
mod emission;
mod mock;
mod prediction;
mod user;

pub use device::{Device, DeviceFilter, DeviceForm, DeviceReading, DeviceStatus};
pub use emission::{EmissionForm, EmissionRecord, EmissionReport, ReportStatus, SourcesBreakdown};
pub use mock::{GenerateParams, MockSystemStatus, MockTask, ScenarioIntensity, ScenarioParams, TaskKind, TaskStatus};
pub use prediction::{PredictionInterval, PredictionModel, PredictionPoint, PredictionRequest, PredictionResult};
pub use user::{User, UserForm, UserRole};

use serde::Deserialize;

/// Collection payload wrapper.
///
/// Backend list endpoints answer either a bare JSON array or an
/// envelope `{ "data": [...], "total": n }`. Both shapes decode
/// through this type.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListPayload<T> {
    Envelope {
        data: Vec<T>,
        #[serde(default)]
        total: Option<u64>,
    },
    Bare(Vec<T>),
}

/// Decode an id that the backend may serve as either a JSON string or
/// a JSON number, normalizing to a string.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

impl<T> ListPayload<T> {
    /// Unpack into `(items, total)`, defaulting the total to the
    /// item count when the envelope omits it.
    pub fn into_parts(self) -> (Vec<T>, u64) {
        match self {
            ListPayload::Envelope { data, total } => {
                let total = total.unwrap_or(data.len() as u64);
                (data, total)
            }
            ListPayload::Bare(items) => {
                let total = items.len() as u64;
                (items, total)
            }
        }
    }
}
