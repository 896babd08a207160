//! Compound growth projections with saved scenarios.
//!
//! - [`core`]: the month-by-month projection engine and input validation
//! - [`store`]: local and remote scenario persistence behind one trait
//! - [`controller`]: scenario lifecycle and guest/authenticated mode handling
//! - [`api`]: HTTP API serving projections and the `/scenarios` resource
//! - [`cli`]: command line surface

pub mod api;
pub mod cli;
pub mod controller;
pub mod core;
pub mod store;

pub use controller::{DeleteRequest, Mode, Phase, ScenarioController, ScenarioListView};
pub use self::core::{ContributionFrequency, InvestmentInputs, Projection, YearlySnapshot, project};
pub use store::{Identity, Scenario, ScenarioStore};
