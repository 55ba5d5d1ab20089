use chrono::NaiveDate;

use super::tax::annual_income_tax;
use super::types::{CashEvent, CashFlowPoint, Config};

/// Income, spending and savings for one simulated month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyCashFlow {
    pub gross_annual_salary: f64,
    pub annual_tax: f64,
    pub net_monthly_income: f64,
    pub one_time_income: f64,
    pub total_income: f64,
    pub expenses: f64,
    pub net: f64,
    pub savings: f64,
}

impl MonthlyCashFlow {
    pub fn point(&self, date: NaiveDate) -> CashFlowPoint {
        CashFlowPoint {
            date,
            income: self.total_income,
            expenses: self.expenses,
            net: self.net,
        }
    }
}

/// Cash flow for month `month` (0-based) whose calendar date is `date`.
pub fn monthly_cash_flow(config: &Config, month: u32, date: NaiveDate) -> MonthlyCashFlow {
    let years_elapsed = month as f64 / 12.0;

    let gross_annual_salary =
        config.annual_salary * compound_factor(config.annual_salary_growth, years_elapsed);
    let annual_tax = annual_income_tax(
        gross_annual_salary,
        &config.federal_tax_brackets,
        &config.provincial_tax_brackets,
    );
    let net_monthly_income = (gross_annual_salary - annual_tax) / 12.0;

    let expenses = config.monthly_expenses
        * compound_factor(config.annual_expense_growth, years_elapsed)
        + events_in_month(&config.one_time_expenses, date);
    let one_time_income = events_in_month(&config.one_time_incomes, date);

    let total_income = net_monthly_income + one_time_income;
    let net = total_income - expenses;

    MonthlyCashFlow {
        gross_annual_salary,
        annual_tax,
        net_monthly_income,
        one_time_income,
        total_income,
        expenses,
        net,
        savings: savings_from_net(net, config.monthly_savings_rate),
    }
}

/// Share of `net` set aside, kept within `[0, net]`; a deficit saves nothing.
pub fn savings_from_net(net: f64, savings_rate: f64) -> f64 {
    if net.is_nan() || net <= 0.0 {
        return 0.0;
    }
    (net * savings_rate).clamp(0.0, net)
}

fn events_in_month(events: &[CashEvent], date: NaiveDate) -> f64 {
    events
        .iter()
        .filter(|event| event.falls_in_month_of(date))
        .map(|event| event.amount)
        .sum()
}

fn compound_factor(annual_rate: f64, years: f64) -> f64 {
    (1.0 + annual_rate).powf(years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TaxBracket;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn sample_config() -> Config {
        Config {
            annual_salary: 80_000.0,
            federal_tax_brackets: vec![
                TaxBracket {
                    up_to_income: 55_867.0,
                    rate: 0.15,
                },
                TaxBracket {
                    up_to_income: 0.0,
                    rate: 0.2,
                },
            ],
            monthly_expenses: 3_000.0,
            monthly_savings_rate: 0.2,
            ..Config::default()
        }
    }

    #[test]
    fn month_zero_applies_no_growth() {
        let mut config = sample_config();
        config.annual_salary_growth = 0.05;
        config.annual_expense_growth = 0.03;
        let flow = monthly_cash_flow(&config, 0, date(2026, 1, 15));

        let tax = 55_867.0 * 0.15 + (80_000.0 - 55_867.0) * 0.2;
        assert_approx(flow.gross_annual_salary, 80_000.0);
        assert_approx(flow.annual_tax, tax);
        assert_approx(flow.net_monthly_income, (80_000.0 - tax) / 12.0);
        assert_approx(flow.expenses, 3_000.0);
        assert_approx(flow.net, (80_000.0 - tax) / 12.0 - 3_000.0);
        assert_approx(flow.savings, flow.net * 0.2);
    }

    #[test]
    fn salary_and_expenses_compound_by_elapsed_years() {
        let mut config = sample_config();
        config.annual_salary_growth = 0.10;
        config.annual_expense_growth = 0.05;
        let flow = monthly_cash_flow(&config, 18, date(2027, 7, 1));
        assert_approx(flow.gross_annual_salary, 80_000.0 * 1.10f64.powf(1.5));
        assert_approx(flow.expenses, 3_000.0 * 1.05f64.powf(1.5));
    }

    #[test]
    fn one_time_events_apply_only_in_their_calendar_month() {
        let mut config = sample_config();
        config.one_time_expenses.push(CashEvent {
            date: date(2026, 6, 20),
            amount: 5_000.0,
            description: "roof".to_string(),
        });
        config.one_time_incomes.push(CashEvent {
            date: date(2026, 6, 2),
            amount: 1_200.0,
            description: "bonus".to_string(),
        });
        config.one_time_incomes.push(CashEvent {
            date: date(2027, 6, 2),
            amount: 9_999.0,
            description: "next year".to_string(),
        });

        let june = monthly_cash_flow(&config, 5, date(2026, 6, 1));
        assert_approx(june.expenses, 8_000.0);
        assert_approx(june.one_time_income, 1_200.0);
        assert_approx(june.total_income, june.net_monthly_income + 1_200.0);

        let july = monthly_cash_flow(&config, 6, date(2026, 7, 1));
        assert_approx(july.expenses, 3_000.0);
        assert_approx(july.one_time_income, 0.0);
    }

    #[test]
    fn deficit_month_saves_nothing() {
        let mut config = sample_config();
        config.monthly_expenses = 20_000.0;
        let flow = monthly_cash_flow(&config, 0, date(2026, 1, 1));
        assert!(flow.net < 0.0);
        assert_approx(flow.savings, 0.0);
    }

    #[test]
    fn savings_rate_above_one_is_capped_at_net() {
        assert_approx(savings_from_net(1_000.0, 1.5), 1_000.0);
        assert_approx(savings_from_net(1_000.0, -0.5), 0.0);
        assert_approx(savings_from_net(f64::NAN, 0.5), 0.0);
    }

    #[test]
    fn point_carries_total_income_and_net() {
        let flow = monthly_cash_flow(&sample_config(), 0, date(2026, 1, 1));
        let point = flow.point(date(2026, 1, 1));
        assert_approx(point.income, flow.total_income);
        assert_approx(point.expenses, flow.expenses);
        assert_approx(point.net, flow.net);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_negative_net_never_saves(
            deficit in 1u32..1_000_000,
            rate_bp in 0u32..20_000,
        ) {
            let net = -(deficit as f64);
            prop_assert!(savings_from_net(net, rate_bp as f64 / 10_000.0) == 0.0);
        }

        #[test]
        fn prop_savings_stay_within_net(
            net in 0u32..1_000_000,
            rate_bp in 0u32..20_000,
        ) {
            let net = net as f64;
            let savings = savings_from_net(net, rate_bp as f64 / 10_000.0);
            prop_assert!(savings >= 0.0);
            prop_assert!(savings <= net + EPS);
        }
    }
}
