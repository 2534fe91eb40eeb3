//! Social contributions (phase 5).
//!
//! The contribution base is the accumulated social base clamped between
//! the statutory floor and ceiling, with one liveness exception: a period
//! with essentially no effective work (base under 10% of the floor)
//! contributes nothing.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::{ConstantKey, ConstantsView};
use crate::error::EngineResult;
use crate::models::{LineKind, PaySlipLine};

use super::rounding::round_money;

/// Rubric code of the employee contribution line.
pub const SOCIAL_RUBRIC: &str = "CNSS";

/// Display position of the employee contribution line.
const SOCIAL_DISPLAY_ORDER: u32 = 90;

/// Share of the floor under which the base is zeroed.
fn liveness_threshold(floor: Decimal) -> Decimal {
    floor * Decimal::new(10, 2)
}

/// The outcome of the social-contribution phase.
#[derive(Debug, Clone, PartialEq)]
pub struct SocialResult {
    /// The clamped contribution base.
    pub clamped_base: Decimal,
    /// Employee-side contribution, shown as a deduction line.
    pub employee: Decimal,
    /// Employer-side contribution, recorded on the slip only.
    pub employer: Decimal,
    /// The employee contribution line; absent when the contribution is
    /// zero.
    pub line: Option<PaySlipLine>,
}

/// Computes both sides of the social contribution from the accumulated
/// social base.
pub fn compute_social(
    social_base: Decimal,
    constants: &ConstantsView<'_>,
    at: NaiveDate,
) -> EngineResult<SocialResult> {
    let floor = constants.lookup(&ConstantKey::SocFloor, at)?;
    let ceiling = constants.lookup(&ConstantKey::SocCeiling, at)?;
    let rate_employee = constants.lookup(&ConstantKey::SocRateEmployee, at)?;
    let rate_employer = constants.lookup(&ConstantKey::SocRateEmployer, at)?;

    let clamped_base = if social_base < liveness_threshold(floor) {
        Decimal::ZERO
    } else {
        social_base.min(ceiling).max(floor)
    };

    let employee = round_money(clamped_base * rate_employee);
    let employer = round_money(clamped_base * rate_employer);

    let line = (employee > Decimal::ZERO).then(|| PaySlipLine {
        rubric_code: SOCIAL_RUBRIC.to_string(),
        label: "Social contribution".to_string(),
        kind: LineKind::Deduction,
        base: clamped_base,
        rate: Some(rate_employee),
        quantity: Decimal::ONE,
        amount: employee,
        display_order: SOCIAL_DISPLAY_ORDER,
    });

    Ok(SocialResult {
        clamped_base,
        employee,
        employer,
        line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConstantRow, ConstantsStore, SeniorityTable};
    use chrono::DateTime;
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
                row(ConstantKey::SocFloor, "440000"),
                row(ConstantKey::SocCeiling, "2500000"),
                row(ConstantKey::SocRateEmployee, "0.05"),
                row(ConstantKey::SocRateEmployer, "0.18"),
            ],
            HashMap::new(),
            SeniorityTable::default(),
        )
    }

    fn social(base: &str) -> SocialResult {
        let store = store();
        let view = store.view();
        compute_social(dec(base), &view, date(2025, 9, 1)).unwrap()
    }

    #[test]
    fn test_base_above_ceiling_is_clamped() {
        let result = social("8000000");
        assert_eq!(result.clamped_base, dec("2500000"));
        assert_eq!(result.employee, dec("125000.00"));
        assert_eq!(result.employer, dec("450000.00"));
        assert!(result.line.is_some());
    }

    #[test]
    fn test_base_below_floor_is_raised_to_floor() {
        let result = social("200000");
        assert_eq!(result.clamped_base, dec("440000"));
        assert_eq!(result.employee, dec("22000.00"));
    }

    #[test]
    fn test_liveness_rule_zeroes_sub_threshold_base() {
        // 40,000 < 10% of 440,000.
        let result = social("40000");
        assert_eq!(result.clamped_base, Decimal::ZERO);
        assert_eq!(result.employee, Decimal::ZERO);
        assert_eq!(result.employer, Decimal::ZERO);
        assert!(result.line.is_none());
    }

    #[test]
    fn test_base_exactly_at_liveness_threshold_contributes() {
        // Exactly 10% of the floor is not "below" the threshold.
        let result = social("44000");
        assert_eq!(result.clamped_base, dec("440000"));
    }

    #[test]
    fn test_base_within_corridor_is_unchanged() {
        let result = social("2200000");
        assert_eq!(result.clamped_base, dec("2200000"));
        assert_eq!(result.employee, dec("110000.00"));
    }

    #[test]
    fn test_boundary_bases() {
        assert_eq!(social("440000").clamped_base, dec("440000"));
        assert_eq!(social("2500000").clamped_base, dec("2500000"));
        assert_eq!(social("2499999").clamped_base, dec("2499999"));
    }
}
