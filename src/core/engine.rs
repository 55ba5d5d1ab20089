use chrono::{Months, NaiveDate};
use tracing::{debug, trace};

use super::assets::AssetLedger;
use super::cash_flow::monthly_cash_flow;
use super::debts::DebtLedger;
use super::types::{
    AssetBreakdownPoint, Config, DebtPayoffPoint, ProjectionResult, Snapshot, ValuePoint,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SimulatorState {
    Initialized,
    Running { month: u32 },
    Completed,
}

/// Month-by-month net worth simulation over one config and snapshot.
///
/// Month 0 records the snapshot as given; growth, savings deposits and debt
/// payments start at month 1. The simulator owns its working balances, so
/// the snapshot itself is never modified.
#[derive(Debug)]
pub struct ProjectionSimulator<'a> {
    config: &'a Config,
    start: NaiveDate,
    total_months: u32,
    assets: AssetLedger,
    debts: DebtLedger,
    state: SimulatorState,
    result: ProjectionResult,
}

impl<'a> ProjectionSimulator<'a> {
    pub fn new(config: &'a Config, snapshot: &Snapshot, start: NaiveDate) -> Self {
        let total_months = config.total_months();
        let capacity = total_months as usize + 1;
        Self {
            config,
            start,
            total_months,
            assets: AssetLedger::new(config, &snapshot.accounts),
            debts: DebtLedger::new(config, &snapshot.accounts, &snapshot.debts),
            state: SimulatorState::Initialized,
            result: ProjectionResult {
                net_worth: Vec::with_capacity(capacity),
                assets: Vec::with_capacity(capacity),
                liabilities: Vec::with_capacity(capacity),
                cash_flow: Vec::with_capacity(capacity),
                asset_breakdown: Vec::with_capacity(capacity),
                debt_payoff: Vec::with_capacity(capacity),
            },
        }
    }

    pub fn state(&self) -> SimulatorState {
        self.state
    }

    /// Simulates the next month and returns its index, or `None` once the
    /// horizon is complete.
    pub fn step(&mut self) -> Option<u32> {
        let month = match self.state {
            SimulatorState::Initialized => 0,
            SimulatorState::Running { month } => month + 1,
            SimulatorState::Completed => return None,
        };

        let date = add_months(self.start, month);
        let cash = monthly_cash_flow(self.config, month, date);
        if month > 0 {
            self.assets.advance_month(cash.savings);
            self.debts.advance_month(month);
        }

        let assets = self.assets.valuation();
        let debts = self.debts.valuation();
        let net_worth = assets.total - debts.total;
        trace!(
            month,
            %date,
            net_worth,
            savings = cash.savings,
            "simulated month"
        );

        self.result.net_worth.push(ValuePoint {
            date,
            value: net_worth,
        });
        self.result.assets.push(ValuePoint {
            date,
            value: assets.total,
        });
        self.result.liabilities.push(ValuePoint {
            date,
            value: debts.total,
        });
        self.result.cash_flow.push(cash.point(date));
        self.result.asset_breakdown.push(AssetBreakdownPoint {
            date,
            assets: assets.by_type,
        });
        self.result.debt_payoff.push(DebtPayoffPoint {
            date,
            debts: debts.by_account,
            total_debt: debts.total,
        });

        self.state = if month >= self.total_months {
            SimulatorState::Completed
        } else {
            SimulatorState::Running { month }
        };
        Some(month)
    }

    /// Runs the remaining months and returns the assembled series.
    pub fn run(mut self) -> ProjectionResult {
        while self.step().is_some() {}
        debug!(
            months = self.total_months,
            start = %self.start,
            "projection complete"
        );
        self.result
    }
}

pub fn run_projection(config: &Config, snapshot: &Snapshot, start: NaiveDate) -> ProjectionResult {
    ProjectionSimulator::new(config, snapshot, start).run()
}

/// Calendar date `months` after `start`; month-end days clamp to the shorter month.
///
/// Saturates at `NaiveDate::MAX` past chrono's range. `validate_start_date`
/// rejects any start whose horizon would reach that point.
pub fn add_months(start: NaiveDate, months: u32) -> NaiveDate {
    start
        .checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}
