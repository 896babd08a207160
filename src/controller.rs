//! Scenario lifecycle: current inputs, the cached scenario list and the
//! guest/authenticated mode state machine.
//!
//! The state lock is never held across an `.await`. Every reinitialization
//! bumps a generation counter; a store call that completes under an older
//! generation is discarded instead of being applied to the cache.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::{
    InvestmentInputs, Projection, ValidationError, project, validate_inputs,
    validate_scenario_name,
};
use crate::store::{Identity, Scenario, ScenarioStore, StoreError, StoreFactory};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Guest,
    Authenticated(Identity),
}

impl Mode {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Mode::Guest => None,
            Mode::Authenticated(identity) => Some(identity),
        }
    }
}

impl From<Option<Identity>> for Mode {
    fn from(value: Option<Identity>) -> Self {
        value.map_or(Mode::Guest, Mode::Authenticated)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    Uninitialized,
    Loading,
    Ready,
}

/// Transient failure message for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Notice {
    #[error("Could not save scenario: {message}")]
    SaveFailed { message: String },
    #[error("Could not delete scenario {id}: {message}")]
    DeleteFailed { id: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub id: String,
    pub confirmed: bool,
}

impl DeleteRequest {
    pub fn confirmed(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            confirmed: true,
        }
    }

    pub fn unconfirmed(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            confirmed: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("scenarios are not loaded yet")]
    NotReady,
    #[error("a save is already in progress")]
    SaveInFlight,
    #[error("a delete is still in progress")]
    DeleteInFlight,
    #[error("deleting scenario {id} requires confirmation")]
    DeleteNotConfirmed { id: String },
    #[error("failed to load scenarios: {0}")]
    Load(#[source] StoreError),
    #[error("failed to save scenario: {0}")]
    Save(#[source] StoreError),
    #[error("failed to delete scenario {id}: {source}")]
    Delete {
        id: String,
        #[source]
        source: StoreError,
    },
    #[error("the active account changed before the operation completed")]
    Superseded,
}

/// Everything the scenario list UI renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioListView {
    pub mode: Mode,
    pub phase: Phase,
    pub scenarios: Vec<Scenario>,
    pub loading: bool,
    /// Persistent load failure; cleared on the next reinitialization.
    pub error: Option<String>,
    pub notice: Option<Notice>,
    pub saving: bool,
}

struct ControllerState {
    mode: Mode,
    phase: Phase,
    generation: u64,
    store: Option<Arc<dyn ScenarioStore>>,
    scenarios: Vec<Scenario>,
    load_error: Option<String>,
    notice: Option<Notice>,
    saving: bool,
    deleting: usize,
    inputs: InvestmentInputs,
}

impl ControllerState {
    fn ready_store(&self) -> Result<Arc<dyn ScenarioStore>, ControllerError> {
        match (&self.store, self.phase) {
            (Some(store), Phase::Ready) => Ok(Arc::clone(store)),
            _ => Err(ControllerError::NotReady),
        }
    }
}

pub struct ScenarioController {
    factory: Arc<dyn StoreFactory>,
    state: Mutex<ControllerState>,
}

impl ScenarioController {
    pub fn new(factory: Arc<dyn StoreFactory>, inputs: InvestmentInputs) -> Self {
        Self {
            factory,
            state: Mutex::new(ControllerState {
                mode: Mode::Guest,
                phase: Phase::Uninitialized,
                generation: 0,
                store: None,
                scenarios: Vec::new(),
                load_error: None,
                notice: None,
                saving: false,
                deleting: 0,
                inputs,
            }),
        }
    }

    pub fn inputs(&self) -> InvestmentInputs {
        self.state.lock().inputs.clone()
    }

    pub fn set_inputs(&self, inputs: InvestmentInputs) {
        self.state.lock().inputs = inputs;
    }

    /// Projection of the current inputs.
    pub fn summary(&self) -> Projection {
        let inputs = self.inputs();
        project(&inputs)
    }

    pub fn view(&self) -> ScenarioListView {
        let state = self.state.lock();
        ScenarioListView {
            mode: state.mode.clone(),
            phase: state.phase,
            scenarios: state.scenarios.clone(),
            loading: state.phase == Phase::Loading,
            error: state.load_error.clone(),
            notice: state.notice.clone(),
            saving: state.saving,
        }
    }

    pub fn take_notice(&self) -> Option<Notice> {
        self.state.lock().notice.take()
    }

    /// Switches to the mode implied by `identity` and loads its scenarios.
    /// A call that does not change the mode of an initialized controller
    /// is a no-op.
    pub async fn set_identity(&self, identity: Option<Identity>) -> Result<(), ControllerError> {
        let mode = Mode::from(identity);
        let (generation, store) = {
            let mut state = self.state.lock();
            if state.phase != Phase::Uninitialized && state.mode == mode {
                return Ok(());
            }
            self.begin_load(&mut state, mode)
        };
        self.finish_load(generation, store).await
    }

    /// Reloads the current mode's scenarios, e.g. after a load failure.
    /// Refused while a save or delete against the current store is pending.
    pub async fn reload(&self) -> Result<(), ControllerError> {
        let (generation, store) = {
            let mut state = self.state.lock();
            if state.saving {
                return Err(ControllerError::SaveInFlight);
            }
            if state.deleting > 0 {
                return Err(ControllerError::DeleteInFlight);
            }
            let mode = state.mode.clone();
            self.begin_load(&mut state, mode)
        };
        self.finish_load(generation, store).await
    }

    fn begin_load(
        &self,
        state: &mut ControllerState,
        mode: Mode,
    ) -> (u64, Arc<dyn ScenarioStore>) {
        let store = self.factory.open(mode.identity());
        state.generation += 1;
        state.mode = mode;
        state.phase = Phase::Loading;
        state.store = Some(Arc::clone(&store));
        state.scenarios.clear();
        state.load_error = None;
        state.notice = None;
        state.saving = false;
        state.deleting = 0;

        info!(
            generation = state.generation,
            user = state.mode.identity().map(|i| i.id.as_str()).unwrap_or("guest"),
            "loading scenarios"
        );
        (state.generation, store)
    }

    async fn finish_load(
        &self,
        generation: u64,
        store: Arc<dyn ScenarioStore>,
    ) -> Result<(), ControllerError> {
        let result = store.list().await;

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(generation, current = state.generation, "discarding stale scenario list");
            return Err(ControllerError::Superseded);
        }
        state.phase = Phase::Ready;
        match result {
            Ok(scenarios) => {
                state.scenarios = scenarios;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to load scenarios");
                state.load_error = Some(e.to_string());
                Err(ControllerError::Load(e))
            }
        }
    }

    /// Saves the current inputs under `name`. Refused while another save
    /// is pending.
    pub async fn save(&self, name: &str) -> Result<Scenario, ControllerError> {
        let name = validate_scenario_name(name)?.to_string();
        let (generation, store, inputs) = {
            let mut state = self.state.lock();
            let store = state.ready_store()?;
            if state.saving {
                return Err(ControllerError::SaveInFlight);
            }
            validate_inputs(&state.inputs)?;
            state.saving = true;
            state.notice = None;
            (state.generation, store, state.inputs.clone())
        };

        let result = store.save(&name, &inputs).await;

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(generation, "dropping save result from a previous mode");
            return Err(ControllerError::Superseded);
        }
        state.saving = false;
        match result {
            Ok(scenario) => {
                state.scenarios.insert(0, scenario.clone());
                if let Some(capacity) = store.capacity() {
                    state.scenarios.truncate(capacity);
                }
                Ok(scenario)
            }
            Err(e) => {
                warn!(error = %e, "failed to save scenario");
                state.notice = Some(Notice::SaveFailed {
                    message: e.to_string(),
                });
                Err(ControllerError::Save(e))
            }
        }
    }

    /// Replaces the current inputs with the scenario's snapshot. Returns
    /// `false` and leaves inputs untouched when `id` is unknown.
    pub fn load_into_inputs(&self, id: &str) -> Result<bool, ControllerError> {
        let mut state = self.state.lock();
        state.ready_store()?;
        let Some(inputs) = state
            .scenarios
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.inputs.clone())
        else {
            return Ok(false);
        };
        state.inputs = inputs;
        Ok(true)
    }

    pub async fn delete(&self, request: DeleteRequest) -> Result<(), ControllerError> {
        if !request.confirmed {
            return Err(ControllerError::DeleteNotConfirmed { id: request.id });
        }
        let (generation, store) = {
            let mut state = self.state.lock();
            let store = state.ready_store()?;
            state.notice = None;
            state.deleting += 1;
            (state.generation, store)
        };

        let result = store.delete(&request.id).await;

        let mut state = self.state.lock();
        if state.generation != generation {
            return Err(ControllerError::Superseded);
        }
        state.deleting -= 1;
        match result {
            Ok(()) => {
                state.scenarios.retain(|s| s.id != request.id);
                Ok(())
            }
            Err(e) => {
                warn!(id = %request.id, error = %e, "failed to delete scenario");
                state.notice = Some(Notice::DeleteFailed {
                    id: request.id.clone(),
                    message: e.to_string(),
                });
                Err(ControllerError::Delete {
                    id: request.id,
                    source: e,
                })
            }
        }
    }
}
