use std::collections::BTreeMap;

use tracing::debug;

use super::types::{AccountSnapshot, AccountType, Config};

/// Where an account's annual growth rate came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrowthRate {
    Investment(f64),
    Appreciation(f64),
    Unconfigured,
}

impl GrowthRate {
    /// Investment returns win over appreciation; neither means no growth.
    pub fn resolve(config: &Config, account_type: &AccountType) -> Self {
        if let Some(rate) = config.investment_returns.get(account_type) {
            GrowthRate::Investment(*rate)
        } else if let Some(rate) = config.asset_appreciation.get(account_type) {
            GrowthRate::Appreciation(*rate)
        } else {
            GrowthRate::Unconfigured
        }
    }

    pub fn annual(self) -> f64 {
        match self {
            GrowthRate::Investment(rate) | GrowthRate::Appreciation(rate) => rate,
            GrowthRate::Unconfigured => 0.0,
        }
    }
}

/// Monthly rate that compounds to `annual_rate` over twelve months.
pub fn monthly_compound_rate(annual_rate: f64) -> f64 {
    (1.0 + annual_rate).max(0.0).powf(1.0 / 12.0) - 1.0
}

#[derive(Debug, Clone)]
struct AssetPosition {
    account_type: AccountType,
    balance: f64,
    monthly_rate: f64,
    allocation: Option<f64>,
}

/// Asset totals for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetValuation {
    pub total: f64,
    pub by_type: BTreeMap<AccountType, f64>,
}

/// Running balances of every asset account in the snapshot.
#[derive(Debug, Clone)]
pub struct AssetLedger {
    positions: Vec<AssetPosition>,
}

impl AssetLedger {
    pub fn new(config: &Config, accounts: &[AccountSnapshot]) -> Self {
        let positions = accounts
            .iter()
            .filter(|account| account.is_asset)
            .map(|account| {
                let growth = GrowthRate::resolve(config, &account.account_type);
                if growth == GrowthRate::Unconfigured {
                    debug!(
                        account_id = %account.id,
                        account_type = %account.account_type,
                        "no growth rate configured; holding balance flat"
                    );
                }
                AssetPosition {
                    account_type: account.account_type.clone(),
                    balance: account.balance,
                    monthly_rate: monthly_compound_rate(growth.annual()),
                    allocation: config.savings_allocation.get(&account.account_type).copied(),
                }
            })
            .collect();
        Self { positions }
    }

    /// Applies one month of growth, then deposits this month's allocated savings.
    /// Deposits do not earn growth in the month they arrive.
    pub fn advance_month(&mut self, savings: f64) {
        for position in &mut self.positions {
            position.balance *= 1.0 + position.monthly_rate;
            if let Some(fraction) = position.allocation.filter(|_| savings > 0.0) {
                position.balance += savings * fraction;
            }
        }
    }

    pub fn valuation(&self) -> AssetValuation {
        let mut by_type = BTreeMap::new();
        let mut total = 0.0;
        for position in &self.positions {
            total += position.balance;
            *by_type.entry(position.account_type.clone()).or_insert(0.0) += position.balance;
        }
        AssetValuation { total, by_type }
    }
}
