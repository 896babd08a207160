use super::types::{ContributionFrequency, InvestmentInputs, Projection, YearlySnapshot};
use super::validate::MAX_YEARS_TO_GROW;

const MONTHS_PER_YEAR: u32 = 12;

#[derive(Debug)]
struct AccountState {
    balance: f64,
    total_contributions: f64,
    inflation_factor: f64,
}

#[derive(Debug, Default)]
struct YearTotals {
    contribution: f64,
    growth: f64,
}

#[derive(Debug, Clone, Copy)]
struct MonthlyRates {
    growth: f64,
    inflation: f64,
}

impl MonthlyRates {
    fn from_inputs(inputs: &InvestmentInputs) -> Self {
        Self {
            growth: inputs.annual_growth_rate / 100.0 / MONTHS_PER_YEAR as f64,
            inflation: inputs.inflation_rate / 100.0 / MONTHS_PER_YEAR as f64,
        }
    }
}

pub fn project(inputs: &InvestmentInputs) -> Projection {
    let rates = MonthlyRates::from_inputs(inputs);
    let years = u32::try_from(inputs.years_to_grow).unwrap_or(0);

    let mut state = AccountState {
        balance: inputs.starting_amount,
        total_contributions: inputs.starting_amount,
        inflation_factor: 1.0,
    };
    let mut rows = Vec::with_capacity(years.min(MAX_YEARS_TO_GROW as u32) as usize);

    for year in 1..=years {
        let mut totals = YearTotals::default();
        for month in 1..=MONTHS_PER_YEAR {
            simulate_month(inputs, rates, month, &mut state, &mut totals);
        }
        rows.push(YearlySnapshot {
            year,
            contribution: totals.contribution,
            growth: totals.growth,
            balance: state.balance,
            total_contributions: state.total_contributions,
            real_balance: state.balance / state.inflation_factor,
        });
    }

    build_projection(rows, inputs.starting_amount)
}

fn simulate_month(
    inputs: &InvestmentInputs,
    rates: MonthlyRates,
    month: u32,
    state: &mut AccountState,
    totals: &mut YearTotals,
) {
    let deposit = contribution_for_month(inputs, month);
    state.balance += deposit;
    state.total_contributions += deposit;
    totals.contribution += deposit;

    let growth = state.balance * rates.growth;
    state.balance += growth;
    totals.growth += growth;

    // Non-positive inflation never deflates.
    if rates.inflation > 0.0 {
        state.inflation_factor *= 1.0 + rates.inflation;
    }
}

fn contribution_for_month(inputs: &InvestmentInputs, month: u32) -> f64 {
    match inputs.contribution_frequency {
        ContributionFrequency::Monthly => inputs.contribution_amount,
        ContributionFrequency::Annual if month == 1 => inputs.contribution_amount,
        ContributionFrequency::Annual => 0.0,
    }
}

fn build_projection(rows: Vec<YearlySnapshot>, starting_amount: f64) -> Projection {
    let (final_balance, final_real_balance, total_contributions) = rows
        .last()
        .map(|row| (row.balance, row.real_balance, row.total_contributions))
        .unwrap_or((starting_amount, starting_amount, starting_amount));

    Projection {
        rows,
        final_balance,
        final_real_balance,
        total_contributions,
        total_growth: final_balance - total_contributions,
    }
}
