use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Account category used to key growth-rate, allocation and breakdown maps.
///
/// Labels that do not name a known category are kept verbatim in `Other`, so a
/// config can still target them explicitly.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AccountType {
    Cash,
    Checking,
    Savings,
    Brokerage,
    Tfsa,
    Rrsp,
    Fhsa,
    Retirement,
    Crypto,
    RealEstate,
    Vehicle,
    CreditCard,
    Mortgage,
    Loan,
    LineOfCredit,
    Other(String),
}

impl AccountType {
    pub fn label(&self) -> &str {
        match self {
            AccountType::Cash => "cash",
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
            AccountType::Brokerage => "brokerage",
            AccountType::Tfsa => "tfsa",
            AccountType::Rrsp => "rrsp",
            AccountType::Fhsa => "fhsa",
            AccountType::Retirement => "retirement",
            AccountType::Crypto => "crypto",
            AccountType::RealEstate => "real_estate",
            AccountType::Vehicle => "vehicle",
            AccountType::CreditCard => "credit_card",
            AccountType::Mortgage => "mortgage",
            AccountType::Loan => "loan",
            AccountType::LineOfCredit => "line_of_credit",
            AccountType::Other(label) => label,
        }
    }
}

impl From<&str> for AccountType {
    /// Case and separators are normalized for every label, so `"Real Estate"`
    /// and `"real_estate"` agree, as do `"Boat"` and `"boat"`. Distinct labels
    /// never collapse into one variant.
    fn from(value: &str) -> Self {
        let normalized = normalize_label(value);
        match normalized.as_str() {
            "cash" => AccountType::Cash,
            "checking" => AccountType::Checking,
            "savings" => AccountType::Savings,
            "brokerage" => AccountType::Brokerage,
            "tfsa" => AccountType::Tfsa,
            "rrsp" => AccountType::Rrsp,
            "fhsa" => AccountType::Fhsa,
            "retirement" => AccountType::Retirement,
            "crypto" => AccountType::Crypto,
            "real_estate" => AccountType::RealEstate,
            "vehicle" => AccountType::Vehicle,
            "credit_card" => AccountType::CreditCard,
            "mortgage" => AccountType::Mortgage,
            "loan" => AccountType::Loan,
            "line_of_credit" => AccountType::LineOfCredit,
            _ => AccountType::Other(normalized),
        }
    }
}

fn normalize_label(raw: &str) -> String {
    raw.trim().to_lowercase().replace(['-', ' '], "_")
}

impl From<String> for AccountType {
    fn from(value: String) -> Self {
        AccountType::from(value.as_str())
    }
}

impl From<AccountType> for String {
    fn from(value: AccountType) -> Self {
        match value {
            AccountType::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One marginal band. `up_to_income == 0.0` marks the unbounded top band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub up_to_income: f64,
    pub rate: f64,
}

impl TaxBracket {
    pub fn is_unbounded(&self) -> bool {
        self.up_to_income == 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashEvent {
    pub date: NaiveDate,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
}

impl CashEvent {
    /// True when the event lands in the same calendar month as `date`.
    pub fn falls_in_month_of(&self, date: NaiveDate) -> bool {
        self.date.year() == date.year() && self.date.month() == date.month()
    }
}

/// Economic assumptions for one projection run.
///
/// Field names are the persisted scenario format, so a stored scenario
/// deserializes straight into this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub time_horizon_years: u32,
    /// Kept for scenario compatibility; no projected value depends on it.
    pub inflation_rate: f64,
    pub annual_salary: f64,
    pub annual_salary_growth: f64,
    pub federal_tax_brackets: Vec<TaxBracket>,
    pub provincial_tax_brackets: Vec<TaxBracket>,
    pub monthly_expenses: f64,
    pub annual_expense_growth: f64,
    pub monthly_savings_rate: f64,
    pub investment_returns: BTreeMap<AccountType, f64>,
    pub asset_appreciation: BTreeMap<AccountType, f64>,
    pub extra_debt_payments: BTreeMap<String, f64>,
    pub one_time_expenses: Vec<CashEvent>,
    pub one_time_incomes: Vec<CashEvent>,
    pub savings_allocation: BTreeMap<AccountType, f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_horizon_years: 5,
            inflation_rate: 0.0,
            annual_salary: 0.0,
            annual_salary_growth: 0.0,
            federal_tax_brackets: Vec::new(),
            provincial_tax_brackets: Vec::new(),
            monthly_expenses: 0.0,
            annual_expense_growth: 0.0,
            monthly_savings_rate: 0.0,
            investment_returns: BTreeMap::new(),
            asset_appreciation: BTreeMap::new(),
            extra_debt_payments: BTreeMap::new(),
            one_time_expenses: Vec::new(),
            one_time_incomes: Vec::new(),
            savings_allocation: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn total_months(&self) -> u32 {
        self.time_horizon_years * 12
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub id: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub is_asset: bool,
    #[serde(default)]
    pub currency: String,
    pub balance: f64,
}

/// Terms of a tracked mortgage or loan at the snapshot instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtSnapshot {
    pub account_id: String,
    pub current_balance: f64,
    /// Annual rate in percent, e.g. `4.5`.
    pub interest_rate: f64,
    /// Scheduled monthly payment.
    pub payment_amount: f64,
}

impl DebtSnapshot {
    /// Current balance is the balance left by the latest recorded payment, or
    /// the original principal when nothing has been paid yet.
    pub fn from_payment_history(
        account_id: impl Into<String>,
        original_principal: f64,
        latest_payment_balance: Option<f64>,
        interest_rate: f64,
        payment_amount: f64,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            current_balance: latest_payment_balance.unwrap_or(original_principal),
            interest_rate,
            payment_amount,
        }
    }
}

/// Point-in-time read of account and debt state supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub accounts: Vec<AccountSnapshot>,
    pub debts: Vec<DebtSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuePoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlowPoint {
    pub date: NaiveDate,
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetBreakdownPoint {
    pub date: NaiveDate,
    pub assets: BTreeMap<AccountType, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtPayoffPoint {
    pub date: NaiveDate,
    pub debts: BTreeMap<String, f64>,
    pub total_debt: f64,
}

/// Six month-aligned series; every series has `total_months + 1` entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub net_worth: Vec<ValuePoint>,
    pub assets: Vec<ValuePoint>,
    pub liabilities: Vec<ValuePoint>,
    pub cash_flow: Vec<CashFlowPoint>,
    pub asset_breakdown: Vec<AssetBreakdownPoint>,
    pub debt_payoff: Vec<DebtPayoffPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectionSummary {
    pub start_net_worth: f64,
    pub final_net_worth: f64,
    pub final_assets: f64,
    pub final_liabilities: f64,
    pub net_worth_change: f64,
    pub lowest_net_worth: f64,
    pub debt_free_date: Option<NaiveDate>,
}

impl ProjectionResult {
    pub fn months(&self) -> usize {
        self.net_worth.len()
    }

    pub fn summary(&self) -> ProjectionSummary {
        let start_net_worth = self.net_worth.first().map_or(0.0, |p| p.value);
        let final_net_worth = self.net_worth.last().map_or(0.0, |p| p.value);
        let lowest_net_worth = self
            .net_worth
            .iter()
            .map(|p| p.value)
            .fold(f64::INFINITY, f64::min);
        ProjectionSummary {
            start_net_worth,
            final_net_worth,
            final_assets: self.assets.last().map_or(0.0, |p| p.value),
            final_liabilities: self.liabilities.last().map_or(0.0, |p| p.value),
            net_worth_change: final_net_worth - start_net_worth,
            lowest_net_worth: if lowest_net_worth.is_finite() {
                lowest_net_worth
            } else {
                0.0
            },
            debt_free_date: self
                .debt_payoff
                .iter()
                .find(|p| p.total_debt <= 0.0)
                .map(|p| p.date),
        }
    }
}
