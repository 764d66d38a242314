//! Client-Side State Stores
//!
//! In-memory mirrors of backend collections. Each store exclusively
//! owns its state; views and the CLI go through the store's operations
//! and never mutate collections directly.

mod devices;
mod tasks;

pub use devices::{apply_filters, DeviceSnapshot, DeviceStore};
pub use tasks::{TaskBackend, TaskMonitor, TaskParams};

use std::fmt;

/// Lifecycle of an asynchronous fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStatus::Idle => write!(f, "idle"),
            FetchStatus::Loading => write!(f, "loading"),
            FetchStatus::Succeeded => write!(f, "succeeded"),
            FetchStatus::Failed => write!(f, "failed"),
        }
    }
}
