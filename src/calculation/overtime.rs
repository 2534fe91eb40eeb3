//! Overtime pay (phase 3).
//!
//! The hourly rate derives from the base salary over the statutory
//! monthly hours; the first-tier statutory multiplier applies to every
//! overtime hour the attendance aggregator reports. Multipliers for the
//! higher tiers (extended hours, night and holiday work) are loaded from
//! the constants store through [`overtime_premium`] but are not wired
//! into the calculator; payroll profiles that need them attach the
//! corresponding rubrics instead.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::{ConstantKey, ConstantsView};
use crate::error::EngineResult;
use crate::models::{LineKind, PaySlipLine};

use super::rounding::round_money;

/// Rubric code of the synthetic overtime line.
pub const OVERTIME_RUBRIC: &str = "HEURES_SUP";

/// Display position of the overtime line, after the standing gains.
const OVERTIME_DISPLAY_ORDER: u32 = 50;

/// Overtime premium tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OvertimeTier {
    /// First tier: the hours the aggregator reports (default 125%).
    First,
    /// Second tier: extended weekly overtime (default 150%).
    Second,
    /// Night and holiday hours (default 200%).
    Night,
}

/// The statutory multiplier for an overtime tier at a date.
pub fn overtime_premium(
    tier: OvertimeTier,
    constants: &ConstantsView<'_>,
    at: NaiveDate,
) -> EngineResult<Decimal> {
    let key = match tier {
        OvertimeTier::First => ConstantKey::OvertimeMultiplier,
        OvertimeTier::Second => ConstantKey::OvertimeMultiplierT2,
        OvertimeTier::Night => ConstantKey::OvertimeMultiplierNight,
    };
    constants.lookup(&key, at)
}

/// The outcome of the overtime phase.
#[derive(Debug, Clone, PartialEq)]
pub struct OvertimeResult {
    /// The overtime pay line; absent when no overtime hours accrued.
    pub line: Option<PaySlipLine>,
    /// The overtime amount, zero when no line was produced.
    pub amount: Decimal,
}

/// Computes first-tier overtime pay.
///
/// `hourly = base_salary / MONTHLY_HOURS`; the pay is
/// `hourly × overtime_hours × OVERTIME_MULTIPLIER`, rounded half-up.
pub fn compute_overtime(
    base_salary: Decimal,
    overtime_hours: Decimal,
    constants: &ConstantsView<'_>,
    at: NaiveDate,
) -> EngineResult<OvertimeResult> {
    if overtime_hours <= Decimal::ZERO {
        return Ok(OvertimeResult {
            line: None,
            amount: Decimal::ZERO,
        });
    }

    let monthly_hours = constants.lookup(&ConstantKey::MonthlyHours, at)?;
    let multiplier = overtime_premium(OvertimeTier::First, constants, at)?;

    let hourly = base_salary / monthly_hours;
    let amount = round_money(hourly * overtime_hours * multiplier);

    Ok(OvertimeResult {
        line: Some(PaySlipLine {
            rubric_code: OVERTIME_RUBRIC.to_string(),
            label: "Overtime".to_string(),
            kind: LineKind::Gain,
            base: round_money(hourly),
            rate: Some(multiplier),
            quantity: overtime_hours,
            amount,
            display_order: OVERTIME_DISPLAY_ORDER,
        }),
        amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConstantRow, ConstantsStore};
    use crate::config::SeniorityTable;
    use chrono::{DateTime, NaiveDate};
    use std::collections::HashMap;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> ConstantsStore {
        let row = |key, value: &str| ConstantRow {
            key,
            value: dec(value),
            effective_from: date(2020, 1, 1),
            effective_to: None,
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        };
        ConstantsStore::new(
            vec![
                row(ConstantKey::MonthlyHours, "173.33"),
                row(ConstantKey::OvertimeMultiplier, "1.25"),
                row(ConstantKey::OvertimeMultiplierT2, "1.50"),
                row(ConstantKey::OvertimeMultiplierNight, "2.00"),
            ],
            HashMap::new(),
            SeniorityTable::default(),
        )
    }

    #[test]
    fn test_zero_hours_produces_no_line() {
        let store = store();
        let view = store.view();
        let result =
            compute_overtime(dec("4000000"), Decimal::ZERO, &view, date(2025, 9, 1)).unwrap();
        assert!(result.line.is_none());
        assert_eq!(result.amount, Decimal::ZERO);
    }

    #[test]
    fn test_overtime_pay_uses_statutory_multiplier() {
        let store = store();
        let view = store.view();
        let result =
            compute_overtime(dec("1733300"), dec("10"), &view, date(2025, 9, 1)).unwrap();
        // hourly = 1,733,300 / 173.33 = 10,000; 10 h x 1.25 = 125,000.
        assert_eq!(result.amount, dec("125000.00"));
        let line = result.line.unwrap();
        assert_eq!(line.quantity, dec("10"));
        assert_eq!(line.rate, Some(dec("1.25")));
    }

    #[test]
    fn test_fractional_hours_round_half_up() {
        let store = store();
        let view = store.view();
        let result = compute_overtime(dec("1733300"), dec("2.5"), &view, date(2025, 9, 1)).unwrap();
        // 10,000 x 2.5 x 1.25 = 31,250.
        assert_eq!(result.amount, dec("31250.00"));
    }

    #[test]
    fn test_premium_tiers_are_data_driven() {
        let store = store();
        let view = store.view();
        assert_eq!(
            overtime_premium(OvertimeTier::Second, &view, date(2025, 9, 1)).unwrap(),
            dec("1.50")
        );
        assert_eq!(
            overtime_premium(OvertimeTier::Night, &view, date(2025, 9, 1)).unwrap(),
            dec("2.00")
        );
    }
}
