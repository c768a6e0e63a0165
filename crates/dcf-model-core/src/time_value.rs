use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::ComputationError;
use crate::types::Rate;

/// End-of-year discount factor `1 / (1 + rate)^period`.
pub fn discount_factor(rate: Rate, period: u32) -> Result<Decimal, ComputationError> {
    if rate <= dec!(-1) {
        return Err(ComputationError::InvalidRate {
            field: "wacc".into(),
            value: rate,
            reason: "Discount rate must be greater than -100%".into(),
        });
    }
    let growth = compound_factor(rate, period)?;
    Decimal::ONE
        .checked_div(growth)
        .ok_or_else(|| ComputationError::overflow("discount_factor", Some(period), rate))
}

/// Compounding factor `(1 + rate)^period`, guarded against overflow.
pub fn compound_factor(rate: Rate, period: u32) -> Result<Decimal, ComputationError> {
    (Decimal::ONE + rate)
        .checked_powi(i64::from(period))
        .filter(|f| !f.is_zero())
        .ok_or_else(|| ComputationError::InvalidRate {
            field: "rate".into(),
            value: rate,
            reason: format!("(1 + rate)^{period} is not representable"),
        })
}

/// Overflow-checked arithmetic for one forecast year (or the terminal
/// value when `year` is `None`). Errors name the line item and the year.
#[derive(Debug, Clone, Copy)]
pub struct Checked {
    pub year: Option<u32>,
}

impl Checked {
    pub fn year(period: u32) -> Self {
        Checked { year: Some(period) }
    }

    pub fn terminal() -> Self {
        Checked { year: None }
    }

    pub fn mul(self, field: &str, a: Decimal, b: Decimal) -> Result<Decimal, ComputationError> {
        a.checked_mul(b)
            .ok_or_else(|| ComputationError::overflow(field, self.year, b))
    }

    pub fn div(self, field: &str, a: Decimal, b: Decimal) -> Result<Decimal, ComputationError> {
        a.checked_div(b)
            .ok_or_else(|| ComputationError::overflow(field, self.year, b))
    }

    pub fn add(self, field: &str, a: Decimal, b: Decimal) -> Result<Decimal, ComputationError> {
        a.checked_add(b)
            .ok_or_else(|| ComputationError::overflow(field, self.year, b))
    }

    pub fn sub(self, field: &str, a: Decimal, b: Decimal) -> Result<Decimal, ComputationError> {
        a.checked_sub(b)
            .ok_or_else(|| ComputationError::overflow(field, self.year, b))
    }

    pub fn sum(
        self,
        field: &str,
        values: impl IntoIterator<Item = Decimal>,
    ) -> Result<Decimal, ComputationError> {
        values
            .into_iter()
            .try_fold(Decimal::ZERO, |acc, v| self.add(field, acc, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_factor_period_zero_is_one() {
        assert_eq!(discount_factor(dec!(0.20), 0).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_discount_factor_two_periods() {
        // 1 / 1.25^2 = 1 / 1.5625 = 0.64
        assert_eq!(discount_factor(dec!(0.25), 2).unwrap(), dec!(0.64));
    }

    #[test]
    fn test_discount_factor_rejects_minus_one() {
        let err = discount_factor(dec!(-1), 1).unwrap_err();
        assert!(matches!(err, ComputationError::InvalidRate { .. }));
    }

    #[test]
    fn test_discount_factor_near_minus_one_is_large_but_finite() {
        // 1 / (0.00001)^2 = 1e10
        assert_eq!(discount_factor(dec!(-0.99999), 2).unwrap(), dec!(10000000000));
    }

    #[test]
    fn test_checked_mul_overflow_names_field_and_year() {
        let err = Checked::year(3)
            .mul("discounted_fcf", Decimal::MAX, dec!(2))
            .unwrap_err();
        match err {
            ComputationError::InvalidRate { field, value, .. } => {
                assert_eq!(field, "discounted_fcf (forecast year 3)");
                assert_eq!(value, dec!(2));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_checked_sum() {
        let total = Checked::terminal()
            .sum("pv", [dec!(1.5), dec!(2.5), dec!(-1)])
            .unwrap();
        assert_eq!(total, dec!(3));
        assert!(Checked::terminal().sum("pv", [Decimal::MAX, Decimal::MAX]).is_err());
    }

    #[test]
    fn test_compound_factor_fixed_cost_inflation() {
        assert_eq!(compound_factor(dec!(0.03), 2).unwrap(), dec!(1.0609));
    }
}
