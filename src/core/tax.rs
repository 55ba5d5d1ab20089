use super::types::TaxBracket;

/// Progressive tax owed on `income` under one bracket table.
///
/// Brackets must be ascending by `up_to_income`; a bracket with
/// `up_to_income == 0.0` absorbs all remaining income. The table is not
/// checked here, so an unsorted or gapped table yields a wrong figure
/// rather than an error.
pub fn calculate_tax(income: f64, brackets: &[TaxBracket]) -> f64 {
    let mut remaining = income;
    let mut tax = 0.0;

    for (i, bracket) in brackets.iter().enumerate() {
        if remaining <= 0.0 {
            break;
        }

        let width = if bracket.is_unbounded() {
            remaining
        } else if i == 0 {
            bracket.up_to_income
        } else {
            bracket.up_to_income - brackets[i - 1].up_to_income
        };

        let taxed = remaining.min(width);
        tax += taxed * bracket.rate;
        remaining -= taxed;
    }

    tax
}

/// Federal and provincial ledgers applied independently to the same gross
/// income and summed.
pub fn annual_income_tax(gross: f64, federal: &[TaxBracket], provincial: &[TaxBracket]) -> f64 {
    calculate_tax(gross, federal) + calculate_tax(gross, provincial)
}
