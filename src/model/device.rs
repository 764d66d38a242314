//! Device Types
//!
//! Monitored physical assets (trucks, gates, sensors) tracked by the
//! park, plus the filter criteria used by the device store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Operational status of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Active,
    Inactive,
    Maintenance,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceStatus::Active => write!(f, "active"),
            DeviceStatus::Inactive => write!(f, "inactive"),
            DeviceStatus::Maintenance => write!(f, "maintenance"),
        }
    }
}

/// A monitored device as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[serde(deserialize_with = "crate::model::string_or_number")]
    pub id: String,
    pub name: String,
    /// Asset tag, distinct from the opaque record id.
    pub device_id: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub status: DeviceStatus,
    #[serde(default)]
    pub location: Option<String>,
    /// Whether the device is currently reporting, independent of `status`.
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub installation_date: Option<String>,
    #[serde(default)]
    pub last_maintenance_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields accepted by device create/update calls.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DeviceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installation_date: Option<String>,
}

/// Filter criteria for the device collection.
///
/// Each `Some` field is an independent AND-conjunction predicate;
/// a `None` field places no constraint. Replacing the record with one
/// where a field is `None` clears that constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceFilter {
    /// Exact category match.
    pub device_type: Option<String>,
    /// Exact status match.
    pub status: Option<DeviceStatus>,
    /// Substring match over the device location.
    pub location: Option<String>,
    /// Exact reporting-flag match.
    pub is_active: Option<bool>,
}

impl DeviceFilter {
    /// True when no constraint is set.
    pub fn is_empty(&self) -> bool {
        self.device_type.is_none()
            && self.status.is_none()
            && self.location.is_none()
            && self.is_active.is_none()
    }

    /// Whether a single device satisfies every enabled constraint.
    pub fn matches(&self, device: &Device) -> bool {
        if let Some(ref t) = self.device_type {
            if &device.device_type != t {
                return false;
            }
        }
        if let Some(status) = self.status {
            if device.status != status {
                return false;
            }
        }
        if let Some(ref loc) = self.location {
            let contained = device
                .location
                .as_deref()
                .map(|l| l.contains(loc.as_str()))
                .unwrap_or(false);
            if !contained {
                return false;
            }
        }
        if let Some(active) = self.is_active {
            if device.is_active != active {
                return false;
            }
        }
        true
    }
}

/// One historical time-series sample from `/devices/{id}/data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceReading {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub energy_consumption: f64,
    pub co2_emission: f64,
    #[serde(default)]
    pub operational_hours: f64,
    #[serde(default)]
    pub additional_data: Option<HashMap<String, serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(device_type: &str, status: DeviceStatus) -> Device {
        Device {
            id: "1".into(),
            name: "Gate-1".into(),
            device_id: "D1".into(),
            device_type: device_type.into(),
            status,
            location: Some("north yard".into()),
            is_active: true,
            description: None,
            manufacturer: None,
            model: None,
            serial_number: None,
            installation_date: None,
            last_maintenance_date: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = DeviceFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&device("truck", DeviceStatus::Active)));
    }

    #[test]
    fn test_status_mismatch_rejects() {
        let filter = DeviceFilter {
            status: Some(DeviceStatus::Maintenance),
            ..Default::default()
        };
        assert!(!filter.matches(&device("truck", DeviceStatus::Active)));
        assert!(filter.matches(&device("truck", DeviceStatus::Maintenance)));
    }

    #[test]
    fn test_location_is_substring_match() {
        let filter = DeviceFilter {
            location: Some("north".into()),
            ..Default::default()
        };
        assert!(filter.matches(&device("truck", DeviceStatus::Active)));

        let mut missing = device("truck", DeviceStatus::Active);
        missing.location = None;
        assert!(!filter.matches(&missing));
    }

    #[test]
    fn test_device_wire_shape() {
        let json = r#"{
            "id": "42",
            "name": "Forklift A",
            "deviceId": "FLT-42",
            "type": "forklift",
            "status": "maintenance",
            "isActive": false
        }"#;
        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device.device_id, "FLT-42");
        assert_eq!(device.status, DeviceStatus::Maintenance);
        assert!(!device.is_active);
        assert!(device.location.is_none());
    }

    #[test]
    fn test_numeric_id_decodes_as_string() {
        let json = r#"{
            "id": 42,
            "name": "Forklift A",
            "deviceId": "FLT-42",
            "type": "forklift",
            "status": "active",
            "isActive": true
        }"#;
        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device.id, "42");
    }
}
