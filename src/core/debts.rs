use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::types::{AccountSnapshot, Config, DebtSnapshot};

/// Interest/principal split for one payment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmortizationStep {
    pub interest: f64,
    pub principal: f64,
    pub balance: f64,
}

/// Applies one monthly payment to `balance`.
///
/// `annual_rate_pct` is a percentage (`6.0` for 6%). Principal is capped at the
/// outstanding balance and the balance never drops below zero. A settled
/// balance stays settled and accrues nothing.
pub fn amortize_month(balance: f64, annual_rate_pct: f64, payment: f64) -> AmortizationStep {
    if balance.is_nan() || balance <= 0.0 {
        return AmortizationStep {
            interest: 0.0,
            principal: 0.0,
            balance: 0.0,
        };
    }

    let monthly_rate = annual_rate_pct / 12.0 / 100.0;
    let interest = balance * monthly_rate;
    let principal = (payment - interest).min(balance);
    AmortizationStep {
        interest,
        principal,
        balance: (balance - principal).max(0.0),
    }
}

#[derive(Debug, Clone)]
struct TrackedDebt {
    account_id: String,
    balance: f64,
    annual_rate_pct: f64,
    payment: f64,
}

/// Liability totals for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct DebtValuation {
    pub total: f64,
    pub by_account: BTreeMap<String, f64>,
}

/// Tracked mortgages/loans that amortize, plus other liability accounts whose
/// balances pass through unchanged.
#[derive(Debug, Clone)]
pub struct DebtLedger {
    tracked: Vec<TrackedDebt>,
    untracked: Vec<(String, f64)>,
}

impl DebtLedger {
    pub fn new(config: &Config, accounts: &[AccountSnapshot], debts: &[DebtSnapshot]) -> Self {
        let known_ids: BTreeSet<&str> = accounts.iter().map(|a| a.id.as_str()).collect();

        let tracked: Vec<TrackedDebt> = debts
            .iter()
            .filter(|debt| {
                let known = known_ids.contains(debt.account_id.as_str());
                if !known {
                    debug!(
                        account_id = %debt.account_id,
                        "debt snapshot has no matching account; ignoring"
                    );
                }
                known
            })
            .map(|debt| TrackedDebt {
                account_id: debt.account_id.clone(),
                balance: debt.current_balance.abs(),
                annual_rate_pct: debt.interest_rate,
                payment: debt.payment_amount
                    + config
                        .extra_debt_payments
                        .get(&debt.account_id)
                        .copied()
                        .unwrap_or(0.0),
            })
            .collect();

        let tracked_ids: BTreeSet<&str> = tracked.iter().map(|d| d.account_id.as_str()).collect();
        let untracked = accounts
            .iter()
            .filter(|a| !a.is_asset && a.balance != 0.0 && !tracked_ids.contains(a.id.as_str()))
            .map(|a| (a.id.clone(), a.balance.abs()))
            .collect();

        Self { tracked, untracked }
    }

    /// Applies one scheduled (plus extra) payment to every tracked debt.
    pub fn advance_month(&mut self, month: u32) {
        for debt in &mut self.tracked {
            if debt.balance <= 0.0 {
                continue;
            }
            let step = amortize_month(debt.balance, debt.annual_rate_pct, debt.payment);
            debt.balance = step.balance;
            if debt.balance <= 0.0 {
                debug!(account_id = %debt.account_id, month, "debt paid off");
            }
        }
    }

    pub fn valuation(&self) -> DebtValuation {
        let mut by_account = BTreeMap::new();
        let mut total = 0.0;
        for (account_id, balance) in &self.untracked {
            total += balance;
            *by_account.entry(account_id.clone()).or_insert(0.0) += balance;
        }
        for debt in &self.tracked {
            total += debt.balance;
            *by_account.entry(debt.account_id.clone()).or_insert(0.0) += debt.balance;
        }
        DebtValuation { total, by_account }
    }
}
