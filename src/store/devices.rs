//! Device Collection Store
//!
//! Owns the authoritative in-memory device collection and its derived
//! filtered/searched projection. The projection is a pure function of
//! `(items, filters, search_term)` and is recomputed after every
//! mutation of any of the three, so reads never observe a stale view.

use super::FetchStatus;
use crate::client::{ApiClient, ApiError, ApiResult, DeviceListParams};
use crate::model::{Device, DeviceFilter, DeviceForm, DeviceStatus};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Pure filter application.
///
/// Every enabled constraint is an independent AND-conjunction, so
/// application order does not matter. The search term matches
/// case-insensitively against name, asset tag, and description,
/// combined with OR. Server response order is preserved.
pub fn apply_filters(items: &[Device], filters: &DeviceFilter, search_term: &str) -> Vec<Device> {
    let needle = search_term.to_lowercase();

    items
        .iter()
        .filter(|device| filters.matches(device))
        .filter(|device| {
            if needle.is_empty() {
                return true;
            }
            device.name.to_lowercase().contains(&needle)
                || device.device_id.to_lowercase().contains(&needle)
                || device
                    .description
                    .as_deref()
                    .map(|d| d.to_lowercase().contains(&needle))
                    .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Read-only copy of the store's state.
#[derive(Debug, Clone, Default)]
pub struct DeviceSnapshot {
    /// Full collection, server response order.
    pub items: Vec<Device>,
    /// Derived projection, always consistent with `items`/`filters`/`search_term`.
    pub filtered: Vec<Device>,
    /// Server-reported total (collection length when absent).
    pub total: u64,
    pub filters: DeviceFilter,
    pub search_term: String,
    pub fetch_status: FetchStatus,
    pub last_error: Option<String>,
    /// Detail-view mirror, kept coherent across update/remove.
    pub selected: Option<Device>,
}

impl DeviceSnapshot {
    fn recompute(&mut self) {
        self.filtered = apply_filters(&self.items, &self.filters, &self.search_term);
    }

    fn absorb_collection(&mut self, items: Vec<Device>, total: u64) {
        self.items = items;
        self.total = total;
        self.fetch_status = FetchStatus::Succeeded;
        self.last_error = None;
        self.recompute();
    }

    fn absorb_load_failure(&mut self, error: &ApiError) {
        self.fetch_status = FetchStatus::Failed;
        self.last_error = Some(error.to_string());
        // An unusable payload is the one case where the last-known-good
        // collection is dropped; plain request failures keep it.
        if error.is_unparseable() {
            self.items.clear();
            self.filtered.clear();
            self.total = 0;
        }
    }

    fn absorb_created(&mut self, device: Device) {
        self.items.push(device);
        self.total += 1;
        self.fetch_status = FetchStatus::Succeeded;
        self.recompute();
    }

    fn absorb_updated(&mut self, device: Device) {
        if let Some(existing) = self.items.iter_mut().find(|d| d.id == device.id) {
            *existing = device.clone();
        }
        if self.selected.as_ref().map(|s| s.id == device.id).unwrap_or(false) {
            self.selected = Some(device);
        }
        self.fetch_status = FetchStatus::Succeeded;
        self.recompute();
    }

    fn absorb_removed(&mut self, id: &str) {
        let before = self.items.len();
        self.items.retain(|d| d.id != id);
        if self.items.len() < before {
            self.total = self.total.saturating_sub(1);
        }
        if self.selected.as_ref().map(|s| s.id == id).unwrap_or(false) {
            self.selected = None;
        }
        self.fetch_status = FetchStatus::Succeeded;
        self.recompute();
    }

    fn absorb_mutation_failure(&mut self, error: &ApiError) {
        self.fetch_status = FetchStatus::Failed;
        self.last_error = Some(error.to_string());
    }
}

/// Store for the device inventory.
pub struct DeviceStore {
    client: Arc<ApiClient>,
    state: RwLock<DeviceSnapshot>,
}

impl DeviceStore {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            state: RwLock::new(DeviceSnapshot::default()),
        }
    }

    /// Current state, cloned.
    pub async fn snapshot(&self) -> DeviceSnapshot {
        self.state.read().await.clone()
    }

    /// Derived projection only.
    pub async fn filtered(&self) -> Vec<Device> {
        self.state.read().await.filtered.clone()
    }

    /// Pure identity lookup over the full collection.
    pub async fn select_by_id(&self, id: &str) -> Option<Device> {
        self.state
            .read()
            .await
            .items
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    /// Fetch the full collection and replace `items` wholesale.
    ///
    /// The projection is recomputed from the filters/search term as
    /// they are *after* the response arrives, so a filter change made
    /// while the request was in flight still applies.
    pub async fn load_all(&self) -> ApiResult<()> {
        self.state.write().await.fetch_status = FetchStatus::Loading;

        match self.client.list_devices(&DeviceListParams::default()).await {
            Ok((items, total)) => {
                tracing::debug!(count = items.len(), total, "Loaded device collection");
                self.state.write().await.absorb_collection(items, total);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Device load failed: {}", e);
                self.state.write().await.absorb_load_failure(&e);
                Err(e)
            }
        }
    }

    /// Replace the filter criteria; a `None` field clears that constraint.
    pub async fn set_filters(&self, filters: DeviceFilter) {
        let mut state = self.state.write().await;
        state.filters = filters;
        state.recompute();
    }

    pub async fn set_search_term(&self, term: impl Into<String>) {
        let mut state = self.state.write().await;
        state.search_term = term.into();
        state.recompute();
    }

    /// Clear filters and search term; the projection becomes the
    /// identity projection of the full collection.
    pub async fn reset_filters(&self) {
        let mut state = self.state.write().await;
        state.filters = DeviceFilter::default();
        state.search_term.clear();
        state.recompute();
    }

    /// Populate the detail-view mirror.
    pub async fn fetch_by_id(&self, id: &str) -> ApiResult<Device> {
        match self.client.get_device(id).await {
            Ok(device) => {
                self.state.write().await.selected = Some(device.clone());
                Ok(device)
            }
            Err(e) => {
                self.state.write().await.absorb_mutation_failure(&e);
                Err(e)
            }
        }
    }

    pub async fn create(&self, form: &DeviceForm) -> ApiResult<Device> {
        match self.client.create_device(form).await {
            Ok(device) => {
                self.state.write().await.absorb_created(device.clone());
                Ok(device)
            }
            Err(e) => {
                self.state.write().await.absorb_mutation_failure(&e);
                Err(e)
            }
        }
    }

    pub async fn update(&self, id: &str, form: &DeviceForm) -> ApiResult<Device> {
        match self.client.update_device(id, form).await {
            Ok(device) => {
                self.state.write().await.absorb_updated(device.clone());
                Ok(device)
            }
            Err(e) => {
                self.state.write().await.absorb_mutation_failure(&e);
                Err(e)
            }
        }
    }

    /// Patch one device's operational status in place.
    pub async fn set_status(&self, id: &str, status: DeviceStatus) -> ApiResult<Device> {
        match self.client.set_device_status(id, status).await {
            Ok(device) => {
                self.state.write().await.absorb_updated(device.clone());
                Ok(device)
            }
            Err(e) => {
                self.state.write().await.absorb_mutation_failure(&e);
                Err(e)
            }
        }
    }

    /// Patch several devices' status in one backend call.
    pub async fn set_status_batch(
        &self,
        ids: &[String],
        status: DeviceStatus,
    ) -> ApiResult<Vec<Device>> {
        match self.client.set_devices_status(ids, status).await {
            Ok(devices) => {
                let mut state = self.state.write().await;
                for device in &devices {
                    if let Some(existing) = state.items.iter_mut().find(|d| d.id == device.id) {
                        *existing = device.clone();
                    }
                }
                state.fetch_status = FetchStatus::Succeeded;
                state.recompute();
                Ok(devices)
            }
            Err(e) => {
                self.state.write().await.absorb_mutation_failure(&e);
                Err(e)
            }
        }
    }

    pub async fn remove(&self, id: &str) -> ApiResult<()> {
        match self.client.delete_device(id).await {
            Ok(()) => {
                self.state.write().await.absorb_removed(id);
                Ok(())
            }
            Err(e) => {
                self.state.write().await.absorb_mutation_failure(&e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str, name: &str, device_id: &str, device_type: &str, status: DeviceStatus) -> Device {
        Device {
            id: id.into(),
            name: name.into(),
            device_id: device_id.into(),
            device_type: device_type.into(),
            status,
            location: None,
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

    fn populated_state() -> DeviceSnapshot {
        let mut state = DeviceSnapshot::default();
        state.absorb_collection(
            vec![
                device("1", "Truck-1", "T1", "truck", DeviceStatus::Active),
                device("2", "Truck-2", "T2", "truck", DeviceStatus::Maintenance),
                device("3", "Lift-1", "F1", "forklift", DeviceStatus::Active),
            ],
            3,
        );
        state
    }

    #[test]
    fn test_apply_filters_is_idempotent() {
        let items = vec![
            device("1", "Truck-1", "T1", "truck", DeviceStatus::Active),
            device("2", "Lift-1", "F1", "forklift", DeviceStatus::Active),
        ];
        let filters = DeviceFilter {
            device_type: Some("truck".into()),
            ..Default::default()
        };

        let first = apply_filters(&items, &filters, "");
        let second = apply_filters(&items, &filters, "");
        assert_eq!(first, second);
    }

    #[test]
    fn test_and_conjunction() {
        let items = vec![
            device("1", "a", "a", "truck", DeviceStatus::Active),
            device("2", "b", "b", "truck", DeviceStatus::Maintenance),
            device("3", "c", "c", "forklift", DeviceStatus::Active),
        ];
        let filters = DeviceFilter {
            device_type: Some("truck".into()),
            status: Some(DeviceStatus::Active),
            ..Default::default()
        };

        let result = apply_filters(&items, &filters, "");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "1");
    }

    #[test]
    fn test_search_or_across_fields() {
        let mut gate = device("1", "Gate-1", "D1", "gate", DeviceStatus::Active);
        gate.description = Some("north".into());
        let scale = device("2", "Scale-2", "north-02", "scale", DeviceStatus::Active);

        let result = apply_filters(&[gate, scale], &DeviceFilter::default(), "north");
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let items = vec![device("1", "Gate-NORTH", "D1", "gate", DeviceStatus::Active)];
        let result = apply_filters(&items, &DeviceFilter::default(), "North");
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_reset_restores_identity() {
        let mut state = populated_state();
        state.filters = DeviceFilter {
            device_type: Some("truck".into()),
            ..Default::default()
        };
        state.search_term = "Truck".into();
        state.recompute();
        assert_eq!(state.filtered.len(), 2);

        state.filters = DeviceFilter::default();
        state.search_term.clear();
        state.recompute();
        assert_eq!(state.filtered, state.items);
    }

    #[test]
    fn test_load_recomputes_with_current_filters() {
        let mut state = DeviceSnapshot::default();
        state.filters = DeviceFilter {
            device_type: Some("forklift".into()),
            ..Default::default()
        };

        state.absorb_collection(
            vec![
                device("1", "Truck-1", "T1", "truck", DeviceStatus::Active),
                device("2", "Lift-1", "F1", "forklift", DeviceStatus::Active),
            ],
            2,
        );

        // Filters set before the load still shape the projection
        assert_eq!(state.filtered.len(), 1);
        assert_eq!(state.filtered[0].id, "2");
        assert_eq!(state.fetch_status, FetchStatus::Succeeded);
    }

    #[test]
    fn test_delete_removes_from_projection() {
        let mut state = populated_state();
        state.filters = DeviceFilter {
            status: Some(DeviceStatus::Active),
            ..Default::default()
        };
        state.recompute();
        assert!(state.filtered.iter().any(|d| d.id == "1"));

        state.absorb_removed("1");
        assert!(!state.filtered.iter().any(|d| d.id == "1"));
        assert_eq!(state.total, 2);
    }

    #[test]
    fn test_update_patches_in_place_and_recomputes() {
        let mut state = populated_state();
        state.filters = DeviceFilter {
            status: Some(DeviceStatus::Active),
            ..Default::default()
        };
        state.recompute();
        assert_eq!(state.filtered.len(), 2);

        let mut patched = state.items[0].clone();
        patched.status = DeviceStatus::Inactive;
        state.absorb_updated(patched);

        // Same position in items, gone from the active projection
        assert_eq!(state.items[0].status, DeviceStatus::Inactive);
        assert_eq!(state.filtered.len(), 1);
    }

    #[test]
    fn test_create_appends_and_recomputes() {
        let mut state = populated_state();
        state.search_term = "Crane".into();
        state.recompute();
        assert!(state.filtered.is_empty());

        state.absorb_created(device("4", "Crane-1", "C1", "crane", DeviceStatus::Active));
        assert_eq!(state.items.len(), 4);
        assert_eq!(state.total, 4);
        assert_eq!(state.filtered.len(), 1);
        assert_eq!(state.filtered[0].id, "4");
    }

    #[test]
    fn test_failed_load_preserves_prior_state() {
        let mut state = populated_state();
        assert_eq!(state.items.len(), 3);

        state.absorb_load_failure(&ApiError::Server { status: 500 });
        assert_eq!(state.items.len(), 3);
        assert_eq!(state.filtered.len(), 3);
        assert_eq!(state.fetch_status, FetchStatus::Failed);
        assert!(state.last_error.is_some());
    }

    #[test]
    fn test_unparseable_load_clears_collections() {
        let mut state = populated_state();

        state.absorb_load_failure(&ApiError::UnexpectedPayload("bad shape".into()));
        assert!(state.items.is_empty());
        assert!(state.filtered.is_empty());
        assert_eq!(state.total, 0);
        assert_eq!(state.fetch_status, FetchStatus::Failed);
    }

    fn test_store() -> DeviceStore {
        let dir = std::env::temp_dir().join("carbonpark-store-test");
        let session = Arc::new(crate::client::SessionStore::open(dir.join("session.json")));
        let client = Arc::new(
            ApiClient::new(&crate::config::ApiConfig::default(), session).unwrap(),
        );
        DeviceStore::new(client)
    }

    #[tokio::test]
    async fn test_store_filtering_through_public_api() {
        let store = test_store();
        *store.state.write().await = populated_state();

        store
            .set_filters(DeviceFilter {
                device_type: Some("truck".into()),
                ..Default::default()
            })
            .await;
        assert_eq!(store.filtered().await.len(), 2);

        store.set_search_term("Truck-2").await;
        let filtered = store.filtered().await;
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "2");

        store.reset_filters().await;
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.filtered, snapshot.items);
    }

    #[tokio::test]
    async fn test_select_by_id_is_exact() {
        let store = test_store();
        *store.state.write().await = populated_state();

        assert_eq!(store.select_by_id("2").await.unwrap().name, "Truck-2");
        // No fuzzy matching on ids
        assert!(store.select_by_id("2x").await.is_none());
        assert!(store.select_by_id("").await.is_none());
    }

    #[test]
    fn test_remove_clears_matching_selection() {
        let mut state = populated_state();
        state.selected = Some(state.items[0].clone());

        state.absorb_removed("1");
        assert!(state.selected.is_none());
    }

    #[test]
    fn test_update_refreshes_matching_selection() {
        let mut state = populated_state();
        state.selected = Some(state.items[0].clone());

        let mut patched = state.items[0].clone();
        patched.name = "Truck-1b".into();
        state.absorb_updated(patched);
        assert_eq!(state.selected.as_ref().unwrap().name, "Truck-1b");
    }
}
