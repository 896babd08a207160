use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::core::InvestmentInputs;
use crate::store::Scenario;

/// Server-side scenario persistence, partitioned by owner.
pub trait ScenarioRepository: Send + Sync {
    /// Newest first.
    fn list(&self, owner: &str) -> Vec<Scenario>;
    fn insert(&self, owner: &str, name: &str, inputs: InvestmentInputs) -> Scenario;
    /// Returns `false` when `owner` has no scenario with that id.
    fn delete(&self, owner: &str, id: &str) -> bool;
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    by_owner: Mutex<HashMap<String, Vec<Scenario>>>,
}

impl ScenarioRepository for MemoryRepository {
    fn list(&self, owner: &str) -> Vec<Scenario> {
        self.by_owner
            .lock()
            .get(owner)
            .cloned()
            .unwrap_or_default()
    }

    fn insert(&self, owner: &str, name: &str, inputs: InvestmentInputs) -> Scenario {
        let scenario = Scenario {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
            inputs,
        };
        self.by_owner
            .lock()
            .entry(owner.to_string())
            .or_default()
            .insert(0, scenario.clone());
        scenario
    }

    fn delete(&self, owner: &str, id: &str) -> bool {
        let mut by_owner = self.by_owner.lock();
        let Some(scenarios) = by_owner.get_mut(owner) else {
            return false;
        };
        let before = scenarios.len();
        scenarios.retain(|s| s.id != id);
        scenarios.len() != before
    }
}
