use thiserror::Error;

use super::types::InvestmentInputs;

pub const MAX_SCENARIO_NAME_CHARS: usize = 80;
pub const MAX_YEARS_TO_GROW: i32 = 100;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("scenario name must not be empty")]
    EmptyName,
    #[error("scenario name must be at most {} characters", MAX_SCENARIO_NAME_CHARS)]
    NameTooLong,
    #[error("{field} must be a finite number >= 0")]
    NegativeAmount { field: &'static str },
    #[error("{field} must be a finite number > -100")]
    InvalidRate { field: &'static str },
    #[error("yearsToGrow must be between 1 and {}", MAX_YEARS_TO_GROW)]
    InvalidHorizon,
}

/// Trims surrounding whitespace and checks length; returns the name to persist.
pub fn validate_scenario_name(name: &str) -> Result<&str, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if trimmed.chars().count() > MAX_SCENARIO_NAME_CHARS {
        return Err(ValidationError::NameTooLong);
    }
    Ok(trimmed)
}

pub fn validate_inputs(inputs: &InvestmentInputs) -> Result<(), ValidationError> {
    for (field, amount) in [
        ("startingAmount", inputs.starting_amount),
        ("contributionAmount", inputs.contribution_amount),
    ] {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ValidationError::NegativeAmount { field });
        }
    }

    for (field, rate) in [
        ("annualGrowthRate", inputs.annual_growth_rate),
        ("inflationRate", inputs.inflation_rate),
    ] {
        if !rate.is_finite() || rate <= -100.0 {
            return Err(ValidationError::InvalidRate { field });
        }
    }

    if !(1..=MAX_YEARS_TO_GROW).contains(&inputs.years_to_grow) {
        return Err(ValidationError::InvalidHorizon);
    }

    Ok(())
}
