use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{Identity, KeyValueStorage, Scenario, ScenarioStore, StoreError};
use crate::core::{InvestmentInputs, validate_inputs, validate_scenario_name};

pub const GUEST_NAMESPACE: &str = "scenarios:guest";
pub const MAX_LOCAL_SCENARIOS: usize = 10;

pub fn namespace_for(identity: Option<&Identity>) -> String {
    match identity {
        Some(identity) => format!("scenarios:{}", identity.id),
        None => GUEST_NAMESPACE.to_string(),
    }
}

/// Earlier builds stored `createdAt` as epoch milliseconds.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredTimestamp {
    Iso(DateTime<Utc>),
    EpochMillis(f64),
}

impl StoredTimestamp {
    fn normalize(self) -> Option<DateTime<Utc>> {
        match self {
            StoredTimestamp::Iso(at) => Some(at),
            StoredTimestamp::EpochMillis(ms) if ms.is_finite() => {
                Utc.timestamp_millis_opt(ms as i64).single()
            }
            StoredTimestamp::EpochMillis(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredScenario {
    id: String,
    name: String,
    created_at: StoredTimestamp,
    inputs: InvestmentInputs,
}

fn decode_scenarios(raw: &str) -> Result<Vec<Scenario>, String> {
    let stored: Vec<StoredScenario> = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    stored
        .into_iter()
        .map(|entry| {
            let created_at = entry
                .created_at
                .normalize()
                .ok_or_else(|| format!("scenario {} has an out-of-range timestamp", entry.id))?;
            Ok(Scenario {
                id: entry.id,
                name: entry.name,
                created_at,
                inputs: entry.inputs,
            })
        })
        .collect()
}

/// Scenario list kept in device storage under a single namespace.
pub struct LocalStore {
    storage: Arc<dyn KeyValueStorage>,
    namespace: String,
}

impl LocalStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, namespace: impl Into<String>) -> Self {
        Self {
            storage,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    // Corrupt or unreadable data reads as empty; the next write replaces it.
    fn read(&self) -> Vec<Scenario> {
        let raw = match self.storage.get(&self.namespace) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(namespace = %self.namespace, error = %e, "failed to read local scenarios");
                return Vec::new();
            }
        };

        let mut scenarios = match decode_scenarios(&raw) {
            Ok(scenarios) => scenarios,
            Err(e) => {
                warn!(namespace = %self.namespace, error = %e, "discarding malformed local scenarios");
                return Vec::new();
            }
        };
        scenarios.retain(|scenario| match validate_inputs(&scenario.inputs) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    namespace = %self.namespace,
                    id = %scenario.id,
                    error = %e,
                    "dropping local scenario with invalid inputs"
                );
                false
            }
        });
        scenarios
    }

    fn write(&self, scenarios: &[Scenario]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(scenarios)?;
        self.storage.set(&self.namespace, raw)?;
        Ok(())
    }
}

#[async_trait]
impl ScenarioStore for LocalStore {
    async fn list(&self) -> Result<Vec<Scenario>, StoreError> {
        Ok(self.read())
    }

    async fn save(&self, name: &str, inputs: &InvestmentInputs) -> Result<Scenario, StoreError> {
        let name = validate_scenario_name(name)?;
        let scenario = Scenario {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
            inputs: inputs.clone(),
        };

        let mut scenarios = self.read();
        scenarios.insert(0, scenario.clone());
        scenarios.truncate(MAX_LOCAL_SCENARIOS);
        self.write(&scenarios)?;

        debug!(namespace = %self.namespace, id = %scenario.id, "saved local scenario");
        Ok(scenario)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut scenarios = self.read();
        let before = scenarios.len();
        scenarios.retain(|s| s.id != id);
        if scenarios.len() == before {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        self.write(&scenarios)?;

        debug!(namespace = %self.namespace, id, "deleted local scenario");
        Ok(())
    }

    fn capacity(&self) -> Option<usize> {
        Some(MAX_LOCAL_SCENARIOS)
    }
}
