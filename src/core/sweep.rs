use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::engine::run_projection;
use super::types::{Config, ProjectionSummary, Snapshot};
use super::validate::{ConfigError, validate_config};

pub const MAX_SWEEP_POINTS: usize = 100;

/// The single config input a sweep perturbs.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepParameter {
    AnnualSalary,
    AnnualSalaryGrowth,
    MonthlyExpenses,
    AnnualExpenseGrowth,
    MonthlySavingsRate,
    /// Added to every configured investment return.
    ReturnShift,
}

impl SweepParameter {
    fn apply(self, config: &mut Config, value: f64) {
        match self {
            SweepParameter::AnnualSalary => config.annual_salary = value,
            SweepParameter::AnnualSalaryGrowth => config.annual_salary_growth = value,
            SweepParameter::MonthlyExpenses => config.monthly_expenses = value,
            SweepParameter::AnnualExpenseGrowth => config.annual_expense_growth = value,
            SweepParameter::MonthlySavingsRate => config.monthly_savings_rate = value,
            SweepParameter::ReturnShift => {
                for rate in config.investment_returns.values_mut() {
                    *rate += value;
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SweepRequest {
    pub parameter: SweepParameter,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub value: f64,
    pub summary: ProjectionSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
    pub parameter: SweepParameter,
    pub baseline: ProjectionSummary,
    pub points: Vec<SweepPoint>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SweepError {
    #[error("values must not be empty")]
    NoValues,
    #[error("at most {max} values per sweep, got {0}", max = MAX_SWEEP_POINTS)]
    TooManyValues(usize),
    #[error("values[{0}] must be a finite number")]
    NonFiniteValue(usize),
    #[error("value {value} produces an invalid config: {source}")]
    InvalidPoint { value: f64, source: ConfigError },
}

/// Re-runs the projection once per value of `request.parameter`, everything
/// else held at `config`. Each run is independent of the others.
pub fn run_sensitivity_sweep(
    config: &Config,
    snapshot: &Snapshot,
    start: NaiveDate,
    request: &SweepRequest,
) -> Result<SweepResult, SweepError> {
    validate_request(request)?;

    let mut candidates = Vec::with_capacity(request.values.len());
    for &value in &request.values {
        let mut candidate = config.clone();
        request.parameter.apply(&mut candidate, value);
        validate_config(&candidate).map_err(|source| SweepError::InvalidPoint { value, source })?;
        candidates.push((value, candidate));
    }

    let baseline = run_projection(config, snapshot, start).summary();
    let points = candidates
        .into_iter()
        .map(|(value, candidate)| SweepPoint {
            value,
            summary: run_projection(&candidate, snapshot, start).summary(),
        })
        .collect::<Vec<_>>();

    debug!(
        parameter = ?request.parameter,
        points = points.len(),
        "sensitivity sweep complete"
    );

    Ok(SweepResult {
        parameter: request.parameter,
        baseline,
        points,
    })
}

fn validate_request(request: &SweepRequest) -> Result<(), SweepError> {
    if request.values.is_empty() {
        return Err(SweepError::NoValues);
    }
    if request.values.len() > MAX_SWEEP_POINTS {
        return Err(SweepError::TooManyValues(request.values.len()));
    }
    if let Some(index) = request.values.iter().position(|v| !v.is_finite()) {
        return Err(SweepError::NonFiniteValue(index));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AccountSnapshot, AccountType, DebtSnapshot, TaxBracket};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn sample_config() -> Config {
        let mut config = Config {
            time_horizon_years: 5,
            annual_salary: 90_000.0,
            federal_tax_brackets: vec![
                TaxBracket {
                    up_to_income: 55_867.0,
                    rate: 0.15,
                },
                TaxBracket {
                    up_to_income: 0.0,
                    rate: 0.205,
                },
            ],
            monthly_expenses: 3_500.0,
            monthly_savings_rate: 0.3,
            ..Config::default()
        };
        config.investment_returns.insert(AccountType::Brokerage, 0.06);
        config.savings_allocation.insert(AccountType::Brokerage, 1.0);
        config
    }

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            accounts: vec![
                AccountSnapshot {
                    id: "b1".to_string(),
                    account_type: AccountType::Brokerage,
                    is_asset: true,
                    currency: "CAD".to_string(),
                    balance: 25_000.0,
                },
                AccountSnapshot {
                    id: "l1".to_string(),
                    account_type: AccountType::Loan,
                    is_asset: false,
                    currency: "CAD".to_string(),
                    balance: -12_000.0,
                },
            ],
            debts: vec![DebtSnapshot {
                account_id: "l1".to_string(),
                current_balance: 12_000.0,
                interest_rate: 7.0,
                payment_amount: 400.0,
            }],
        }
    }

    fn sweep(parameter: SweepParameter, values: Vec<f64>) -> Result<SweepResult, SweepError> {
        run_sensitivity_sweep(
            &sample_config(),
            &sample_snapshot(),
            date(2026, 1, 1),
            &SweepRequest { parameter, values },
        )
    }

    fn final_values(result: &SweepResult) -> Vec<f64> {
        result
            .points
            .iter()
            .map(|p| p.summary.final_net_worth)
            .collect()
    }

    #[test]
    fn higher_savings_rate_ends_with_more_net_worth() {
        let result = sweep(SweepParameter::MonthlySavingsRate, vec![0.1, 0.3, 0.6, 0.9])
            .expect("sweep should run");
        let finals = final_values(&result);
        assert!(finals.windows(2).all(|w| w[0] < w[1]), "{finals:?}");
    }

    #[test]
    fn higher_expenses_end_with_less_net_worth() {
        let result = sweep(
            SweepParameter::MonthlyExpenses,
            vec![2_000.0, 3_000.0, 4_000.0],
        )
        .expect("sweep should run");
        let finals = final_values(&result);
        assert!(finals.windows(2).all(|w| w[0] > w[1]), "{finals:?}");
    }

    #[test]
    fn zero_shift_point_matches_baseline() {
        let result =
            sweep(SweepParameter::ReturnShift, vec![-0.02, 0.0, 0.02]).expect("sweep should run");
        assert_eq!(result.points[1].summary, result.baseline);
        let finals = final_values(&result);
        assert!(finals[0] < finals[1] && finals[1] < finals[2]);
    }

    #[test]
    fn loan_payoff_date_is_reported() {
        let result =
            sweep(SweepParameter::AnnualSalary, vec![90_000.0]).expect("sweep should run");
        let payoff = result.points[0]
            .summary
            .debt_free_date
            .expect("loan clears inside five years");
        assert!(payoff > date(2028, 1, 1) && payoff < date(2030, 1, 1));
    }

    #[test]
    fn rejects_empty_and_oversized_requests() {
        assert_eq!(
            sweep(SweepParameter::AnnualSalary, Vec::new()),
            Err(SweepError::NoValues)
        );
        assert_eq!(
            sweep(SweepParameter::AnnualSalary, vec![1.0; MAX_SWEEP_POINTS + 1]),
            Err(SweepError::TooManyValues(MAX_SWEEP_POINTS + 1))
        );
        assert_eq!(
            sweep(SweepParameter::AnnualSalary, vec![1.0, f64::INFINITY]),
            Err(SweepError::NonFiniteValue(1))
        );
    }

    #[test]
    fn rejects_values_that_break_the_config() {
        let err = sweep(SweepParameter::MonthlySavingsRate, vec![0.5, 1.5])
            .expect_err("savings rate above one is invalid");
        match err {
            SweepError::InvalidPoint { value, source } => {
                assert_eq!(value, 1.5);
                assert_eq!(source.field(), "monthly_savings_rate");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
