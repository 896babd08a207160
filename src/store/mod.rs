//! Scenario persistence.
//!
//! Both backends implement [`ScenarioStore`] with the same observable
//! semantics: lists are ordered most-recent first, ids are unique within a
//! namespace, and a store never sees another namespace's entries. The
//! controller picks one through a [`StoreFactory`] on every mode change.

mod local;
mod remote;
mod storage;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{InvestmentInputs, ValidationError};

pub use local::{GUEST_NAMESPACE, LocalStore, MAX_LOCAL_SCENARIOS, namespace_for};
pub use remote::RemoteStore;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub inputs: InvestmentInputs,
}

/// Authenticated identity as reported by the session provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            display_name: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("device storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to encode scenarios: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid scenario service URL {url}: {reason}")]
    BaseUrl { url: String, reason: String },
    #[error("request to scenario service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("scenario service responded with status {status}")]
    Status { status: u16 },
    #[error("scenario {id} was not found")]
    NotFound { id: String },
    #[error("not signed in to the scenario service")]
    Unauthorized,
}

#[async_trait]
pub trait ScenarioStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Scenario>, StoreError>;

    /// Persists a new scenario and returns the canonical stored record.
    async fn save(&self, name: &str, inputs: &InvestmentInputs) -> Result<Scenario, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Maximum number of entries the store retains, if bounded.
    fn capacity(&self) -> Option<usize> {
        None
    }
}

/// Chooses the store backing a given identity (or guest when `None`).
pub trait StoreFactory: Send + Sync {
    fn open(&self, identity: Option<&Identity>) -> Arc<dyn ScenarioStore>;
}

/// Guest → local guest namespace. Signed in → remote service when one is
/// configured, otherwise a local namespace owned by that identity.
pub struct DefaultStoreFactory {
    storage: Arc<dyn KeyValueStorage>,
    remote_base_url: Option<String>,
    client: reqwest::Client,
}

impl DefaultStoreFactory {
    pub fn new(storage: Arc<dyn KeyValueStorage>, remote_base_url: Option<String>) -> Self {
        Self {
            storage,
            remote_base_url,
            client: reqwest::Client::new(),
        }
    }
}

impl StoreFactory for DefaultStoreFactory {
    fn open(&self, identity: Option<&Identity>) -> Arc<dyn ScenarioStore> {
        match (identity, self.remote_base_url.as_deref()) {
            (Some(identity), Some(base_url)) => Arc::new(RemoteStore::with_client(
                self.client.clone(),
                base_url,
                identity.clone(),
            )),
            (identity, _) => Arc::new(LocalStore::new(
                Arc::clone(&self.storage),
                namespace_for(identity),
            )),
        }
    }
}
