//! Unpaid-absence retention (phase 4).
//!
//! The retention prices each unpaid day at the running gross over the
//! month's working days, floored at 22 days so short months do not
//! inflate the daily rate. The retention reduces paid gross only; the
//! social and taxable bases keep reflecting entitled pay.

use rust_decimal::Decimal;

use crate::models::{LineKind, PaySlipLine};

use super::rounding::round_money;

/// Rubric code of the synthetic retention line.
pub const ABSENCE_RUBRIC: &str = "RETENUE_ABS";

/// Display position of the retention line.
const ABSENCE_DISPLAY_ORDER: u32 = 60;

/// Minimum working-day divisor for the daily rate.
const MIN_WORKING_DAYS: u32 = 22;

/// The outcome of the unpaid-absence phase.
#[derive(Debug, Clone, PartialEq)]
pub struct AbsenceResult {
    /// The retention line; absent when no unpaid days accrued.
    pub line: Option<PaySlipLine>,
    /// The retained amount, zero when no line was produced.
    pub amount: Decimal,
}

/// Computes the unpaid-absence retention from the running gross.
pub fn compute_absence_retention(
    gross_running: Decimal,
    working_days: u32,
    absence_days_unpaid: Decimal,
) -> AbsenceResult {
    if absence_days_unpaid <= Decimal::ZERO {
        return AbsenceResult {
            line: None,
            amount: Decimal::ZERO,
        };
    }

    let divisor = Decimal::from(working_days.max(MIN_WORKING_DAYS));
    let daily = gross_running / divisor;
    let amount = round_money(daily * absence_days_unpaid);

    AbsenceResult {
        line: Some(PaySlipLine {
            rubric_code: ABSENCE_RUBRIC.to_string(),
            label: "Unpaid absence".to_string(),
            kind: LineKind::Deduction,
            base: round_money(daily),
            rate: None,
            quantity: absence_days_unpaid,
            amount,
            display_order: ABSENCE_DISPLAY_ORDER,
        }),
        amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_no_unpaid_days_no_line() {
        let result = compute_absence_retention(dec("2200000"), 22, Decimal::ZERO);
        assert!(result.line.is_none());
        assert_eq!(result.amount, Decimal::ZERO);
    }

    #[test]
    fn test_reference_retention_five_days_of_twenty_two() {
        let result = compute_absence_retention(dec("2200000"), 22, dec("5"));
        assert_eq!(result.amount, dec("500000.00"));
        let line = result.line.unwrap();
        assert_eq!(line.base, dec("100000.00"));
        assert_eq!(line.quantity, dec("5"));
    }

    #[test]
    fn test_short_month_floors_divisor_at_22() {
        // 20 working days still divide by 22.
        let result = compute_absence_retention(dec("2200000"), 20, dec("1"));
        assert_eq!(result.amount, dec("100000.00"));
    }

    #[test]
    fn test_long_month_uses_actual_working_days() {
        let result = compute_absence_retention(dec("2300000"), 23, dec("1"));
        assert_eq!(result.amount, dec("100000.00"));
    }
}
