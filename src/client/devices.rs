//! Device Endpoints
//!
//! `/devices` CRUD, status patches, and the per-device historical
//! time-series read.

use super::{ApiClient, ApiResult};
use crate::model::{Device, DeviceForm, DeviceReading, DeviceStatus, ListPayload};
use serde_json::json;

/// Optional server-side paging/sorting parameters for device listing.
///
/// The backend does not guarantee it honors these uniformly; callers
/// that need a consistent view load the full collection and filter
/// client-side (see the device store).
#[derive(Debug, Clone, Default)]
pub struct DeviceListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
}

impl DeviceListParams {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(ref sort) = self.sort {
            query.push(("sort", sort.clone()));
        }
        query
    }
}

impl ApiClient {
    /// List devices, returning `(devices, total)` regardless of whether
    /// the backend answered a bare array or an envelope.
    pub async fn list_devices(
        &self,
        params: &DeviceListParams,
    ) -> ApiResult<(Vec<Device>, u64)> {
        let payload: ListPayload<Device> = self.get("/devices", &params.to_query()).await?;
        Ok(payload.into_parts())
    }

    pub async fn get_device(&self, id: &str) -> ApiResult<Device> {
        self.get(&format!("/devices/{id}"), &[]).await
    }

    pub async fn create_device(&self, form: &DeviceForm) -> ApiResult<Device> {
        self.post("/devices", form).await
    }

    pub async fn update_device(&self, id: &str, form: &DeviceForm) -> ApiResult<Device> {
        self.put(&format!("/devices/{id}"), form).await
    }

    /// Patch a single device's operational status.
    pub async fn set_device_status(&self, id: &str, status: DeviceStatus) -> ApiResult<Device> {
        self.patch(&format!("/devices/{id}/status"), &json!({ "status": status }))
            .await
    }

    /// Patch the status of several devices in one call.
    pub async fn set_devices_status(
        &self,
        ids: &[String],
        status: DeviceStatus,
    ) -> ApiResult<Vec<Device>> {
        let payload: ListPayload<Device> = self
            .patch("/devices/batch-status", &json!({ "ids": ids, "status": status }))
            .await?;
        Ok(payload.into_parts().0)
    }

    pub async fn delete_device(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/devices/{id}")).await
    }

    /// Historical time-series for one device.
    pub async fn device_data(
        &self,
        id: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
        interval: Option<&str>,
    ) -> ApiResult<Vec<DeviceReading>> {
        let mut query = Vec::new();
        if let Some(start) = start_date {
            query.push(("startDate", start.to_string()));
        }
        if let Some(end) = end_date {
            query.push(("endDate", end.to_string()));
        }
        if let Some(interval) = interval {
            query.push(("interval", interval.to_string()));
        }

        let payload: ListPayload<DeviceReading> =
            self.get(&format!("/devices/{id}/data"), &query).await?;
        Ok(payload.into_parts().0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_to_query() {
        let params = DeviceListParams {
            page: Some(2),
            limit: Some(50),
            sort: None,
        };
        assert_eq!(
            params.to_query(),
            vec![("page", "2".to_string()), ("limit", "50".to_string())]
        );
        assert!(DeviceListParams::default().to_query().is_empty());
    }
}
