use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionFrequency {
    #[default]
    Monthly,
    #[serde(alias = "yearly")]
    Annual,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentInputs {
    pub starting_amount: f64,
    pub contribution_amount: f64,
    pub contribution_frequency: ContributionFrequency,
    /// Percent per year, e.g. 8 for 8%.
    pub annual_growth_rate: f64,
    /// Percent per year.
    pub inflation_rate: f64,
    pub years_to_grow: i32,
}

impl Default for InvestmentInputs {
    fn default() -> Self {
        Self {
            starting_amount: 10_000.0,
            contribution_amount: 500.0,
            contribution_frequency: ContributionFrequency::Monthly,
            annual_growth_rate: 8.0,
            inflation_rate: 2.5,
            years_to_grow: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlySnapshot {
    pub year: u32,
    pub contribution: f64,
    pub growth: f64,
    pub balance: f64,
    pub total_contributions: f64,
    pub real_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub rows: Vec<YearlySnapshot>,
    pub final_balance: f64,
    pub final_real_balance: f64,
    pub total_contributions: f64,
    pub total_growth: f64,
}
