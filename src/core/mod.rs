mod assets;
mod cash_flow;
mod debts;
mod engine;
mod sweep;
mod tax;
mod types;
mod validate;

pub use assets::{AssetLedger, AssetValuation, GrowthRate, monthly_compound_rate};
pub use cash_flow::{MonthlyCashFlow, monthly_cash_flow, savings_from_net};
pub use debts::{AmortizationStep, DebtLedger, DebtValuation, amortize_month};
pub use engine::{ProjectionSimulator, SimulatorState, add_months, run_projection};
pub use sweep::{
    MAX_SWEEP_POINTS, SweepError, SweepParameter, SweepPoint, SweepRequest, SweepResult,
    run_sensitivity_sweep,
};
pub use tax::{annual_income_tax, calculate_tax};
pub use types::{
    AccountSnapshot, AccountType, AssetBreakdownPoint, CashEvent, CashFlowPoint, Config,
    DebtPayoffPoint, DebtSnapshot, ProjectionResult, ProjectionSummary, Snapshot, TaxBracket,
    ValuePoint,
};
pub use validate::{
    ConfigError, MAX_HORIZON_YEARS, validate_config, validate_snapshot, validate_start_date,
};
