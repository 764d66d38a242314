//! # Carbonpark
//!
//! Client and state-synchronization layer for a logistics-park
//! carbon-emission monitoring service. All computation, storage, and
//! scheduling live in the backend; this crate provides the typed REST
//! client, the persisted session, and the in-memory stores that mirror
//! server collections.
//!
//! ## Modules
//!
//! - [`client`]: REST client, session store, and per-resource endpoints
//! - [`store`]: device collection with its derived filter projection,
//!   and the background task-polling monitor
//! - [`model`]: wire data types
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use carbonpark::client::{ApiClient, SessionStore};
//! use carbonpark::config::Config;
//! use carbonpark::model::DeviceFilter;
//! use carbonpark::store::DeviceStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let session = Arc::new(SessionStore::open(&config.session.file));
//!     let client = Arc::new(ApiClient::new(&config.api, session)?);
//!
//!     let devices = DeviceStore::new(client);
//!     devices.load_all().await?;
//!     devices
//!         .set_filters(DeviceFilter {
//!             device_type: Some("truck".into()),
//!             ..Default::default()
//!         })
//!         .await;
//!
//!     for device in devices.filtered().await {
//!         println!("{} ({})", device.name, device.status);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod model;
pub mod store;

// Re-export top-level types for convenience
pub use client::{ApiClient, ApiError, ApiResult, Session, SessionStore};

pub use config::{Config, ConfigError};

pub use model::{
    Device, DeviceFilter, DeviceStatus, EmissionRecord, EmissionReport, MockSystemStatus,
    MockTask, PredictionModel, PredictionResult, TaskKind, TaskStatus, User, UserRole,
};

pub use store::{apply_filters, DeviceStore, FetchStatus, TaskBackend, TaskMonitor, TaskParams};
