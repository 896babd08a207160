use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Serialize;
use tracing::{debug, warn};

use super::{Identity, Scenario, ScenarioStore, StoreError};
use crate::core::{InvestmentInputs, validate_scenario_name};

#[derive(Debug, Serialize)]
struct CreateScenarioRequest<'a> {
    name: &'a str,
    inputs: &'a InvestmentInputs,
}

/// Client for the authenticated `/scenarios` resource.
pub struct RemoteStore {
    client: Client,
    base_url: String,
    identity: Identity,
}

impl RemoteStore {
    pub fn new(base_url: &str, identity: Identity) -> Self {
        Self::with_client(Client::new(), base_url, identity)
    }

    pub fn with_client(client: Client, base_url: &str, identity: Identity) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            identity,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Appends `segments` to the base path, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let invalid = |reason: String| StoreError::BaseUrl {
            url: self.base_url.clone(),
            reason,
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("not a hierarchical URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn check_status(&self, response: &Response, id: Option<&str>) -> Result<(), StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        warn!(status = status.as_u16(), user = %self.identity.id, "scenario service rejected request");
        Err(match (status, id) {
            (StatusCode::UNAUTHORIZED, _) => StoreError::Unauthorized,
            (StatusCode::NOT_FOUND, Some(id)) => StoreError::NotFound { id: id.to_string() },
            _ => StoreError::Status {
                status: status.as_u16(),
            },
        })
    }
}

#[async_trait]
impl ScenarioStore for RemoteStore {
    async fn list(&self) -> Result<Vec<Scenario>, StoreError> {
        let response = self
            .client
            .get(self.url(&["scenarios"])?)
            .bearer_auth(&self.identity.id)
            .send()
            .await?;
        self.check_status(&response, None)?;
        let scenarios: Vec<Scenario> = response.json().await?;
        debug!(count = scenarios.len(), user = %self.identity.id, "fetched remote scenarios");
        Ok(scenarios)
    }

    async fn save(&self, name: &str, inputs: &InvestmentInputs) -> Result<Scenario, StoreError> {
        let name = validate_scenario_name(name)?;
        let response = self
            .client
            .post(self.url(&["scenarios"])?)
            .bearer_auth(&self.identity.id)
            .json(&CreateScenarioRequest { name, inputs })
            .send()
            .await?;
        self.check_status(&response, None)?;
        let scenario: Scenario = response.json().await?;
        debug!(id = %scenario.id, user = %self.identity.id, "saved remote scenario");
        Ok(scenario)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.url(&["scenarios", id])?)
            .bearer_auth(&self.identity.id)
            .send()
            .await?;
        self.check_status(&response, Some(id))?;
        debug!(id, user = %self.identity.id, "deleted remote scenario");
        Ok(())
    }
}
