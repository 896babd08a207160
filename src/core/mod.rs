mod engine;
mod types;
mod validate;

pub use engine::project;
pub use types::{ContributionFrequency, InvestmentInputs, Projection, YearlySnapshot};
pub use validate::{
    MAX_SCENARIO_NAME_CHARS, MAX_YEARS_TO_GROW, ValidationError, validate_inputs,
    validate_scenario_name,
};
