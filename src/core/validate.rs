use std::collections::BTreeSet;

use chrono::{Months, NaiveDate};

use super::types::{Config, Snapshot, TaxBracket};

pub const MAX_HORIZON_YEARS: u32 = 30;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("time_horizon_years must be between 1 and {max}, got {0}", max = MAX_HORIZON_YEARS)]
    HorizonOutOfRange(u32),
    #[error("{field} must be a finite number")]
    NotFinite { field: String },
    #[error("{field} must be >= 0")]
    Negative { field: String },
    #[error("{field} must be > -1 (a rate of -100% or worse)")]
    RateTooLow { field: String },
    #[error("{field} must be between 0 and 1")]
    FractionOutOfRange { field: String },
    #[error("{field}: bracket {index} {reason}")]
    InvalidBracket {
        field: String,
        index: usize,
        reason: &'static str,
    },
    #[error("{field}: duplicate account id {id}")]
    DuplicateAccount { field: String, id: String },
    #[error("start_date {0} leaves no room for the projection horizon")]
    StartDateOutOfRange(NaiveDate),
}

impl ConfigError {
    pub fn field(&self) -> String {
        match self {
            ConfigError::HorizonOutOfRange(_) => "time_horizon_years".to_string(),
            ConfigError::StartDateOutOfRange(_) => "start_date".to_string(),
            ConfigError::NotFinite { field }
            | ConfigError::Negative { field }
            | ConfigError::RateTooLow { field }
            | ConfigError::FractionOutOfRange { field }
            | ConfigError::InvalidBracket { field, .. }
            | ConfigError::DuplicateAccount { field, .. } => field.clone(),
        }
    }
}

/// Rejects configs that would simulate to nonsense. The engine never calls
/// this itself; callers run it before handing a config over.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if !(1..=MAX_HORIZON_YEARS).contains(&config.time_horizon_years) {
        return Err(ConfigError::HorizonOutOfRange(config.time_horizon_years));
    }

    finite("inflation_rate", config.inflation_rate)?;
    non_negative("annual_salary", config.annual_salary)?;
    non_negative("monthly_expenses", config.monthly_expenses)?;
    growth_rate("annual_salary_growth", config.annual_salary_growth)?;
    growth_rate("annual_expense_growth", config.annual_expense_growth)?;
    fraction("monthly_savings_rate", config.monthly_savings_rate)?;

    brackets("federal_tax_brackets", &config.federal_tax_brackets)?;
    brackets("provincial_tax_brackets", &config.provincial_tax_brackets)?;

    for (account_type, rate) in &config.investment_returns {
        growth_rate(&format!("investment_returns.{account_type}"), *rate)?;
    }
    for (account_type, rate) in &config.asset_appreciation {
        growth_rate(&format!("asset_appreciation.{account_type}"), *rate)?;
    }
    for (account_type, share) in &config.savings_allocation {
        fraction(&format!("savings_allocation.{account_type}"), *share)?;
    }
    for (account_id, amount) in &config.extra_debt_payments {
        non_negative(&format!("extra_debt_payments.{account_id}"), *amount)?;
    }
    for (i, event) in config.one_time_expenses.iter().enumerate() {
        non_negative(&format!("one_time_expenses[{i}].amount"), event.amount)?;
    }
    for (i, event) in config.one_time_incomes.iter().enumerate() {
        non_negative(&format!("one_time_incomes[{i}].amount"), event.amount)?;
    }

    Ok(())
}

pub fn validate_snapshot(snapshot: &Snapshot) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for (i, account) in snapshot.accounts.iter().enumerate() {
        finite(&format!("accounts[{i}].balance"), account.balance)?;
        if !seen.insert(account.id.as_str()) {
            return Err(ConfigError::DuplicateAccount {
                field: "accounts".to_string(),
                id: account.id.clone(),
            });
        }
    }

    let mut seen = BTreeSet::new();
    for (i, debt) in snapshot.debts.iter().enumerate() {
        finite(&format!("debts[{i}].current_balance"), debt.current_balance)?;
        non_negative(&format!("debts[{i}].interest_rate"), debt.interest_rate)?;
        non_negative(&format!("debts[{i}].payment_amount"), debt.payment_amount)?;
        if !seen.insert(debt.account_id.as_str()) {
            return Err(ConfigError::DuplicateAccount {
                field: "debts".to_string(),
                id: debt.account_id.clone(),
            });
        }
    }
    Ok(())
}

/// Every month of the horizon must be a representable calendar date.
pub fn validate_start_date(config: &Config, start: NaiveDate) -> Result<(), ConfigError> {
    match start.checked_add_months(Months::new(config.total_months())) {
        Some(_) => Ok(()),
        None => Err(ConfigError::StartDateOutOfRange(start)),
    }
}

fn finite(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite {
            field: field.to_string(),
        })
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn growth_rate(field: &str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value <= -1.0 {
        return Err(ConfigError::RateTooLow {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn fraction(field: &str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::FractionOutOfRange {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn brackets(field: &str, table: &[TaxBracket]) -> Result<(), ConfigError> {
    let invalid = |index, reason| ConfigError::InvalidBracket {
        field: field.to_string(),
        index,
        reason,
    };

    let mut previous = 0.0;
    for (i, bracket) in table.iter().enumerate() {
        fraction(&format!("{field}[{i}].rate"), bracket.rate)?;
        finite(&format!("{field}[{i}].up_to_income"), bracket.up_to_income)?;

        if bracket.up_to_income < 0.0 {
            return Err(invalid(i, "has a negative threshold"));
        }
        if bracket.is_unbounded() {
            if i + 1 != table.len() {
                return Err(invalid(i, "is unbounded but not last"));
            }
            continue;
        }
        if bracket.up_to_income <= previous {
            return Err(invalid(i, "is not above the previous threshold"));
        }
        previous = bracket.up_to_income;
    }
    Ok(())
}
