//! Employer surcharges (phase 7).
//!
//! Both surcharges are employer-side only: they are recorded on the slip
//! but never appear as deduction lines. The VF uses the two-step
//! ("biétagée") formula: the ceiling-capped gross taxed once forms a
//! deduction, and the rate then applies to the remainder.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::{ConstantKey, ConstantsView};
use crate::error::EngineResult;

use super::rounding::round_money;

/// The outcome of the surcharges phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurchargesResult {
    /// Versement Forfaitaire.
    pub vf: Decimal,
    /// Taxe d'Apprentissage.
    pub ta: Decimal,
}

/// Computes VF and TA from the running gross.
pub fn compute_surcharges(
    gross: Decimal,
    constants: &ConstantsView<'_>,
    at: NaiveDate,
) -> EngineResult<SurchargesResult> {
    let vf_rate = constants.lookup(&ConstantKey::VfRate, at)?;
    let ta_rate = constants.lookup(&ConstantKey::TaRate, at)?;
    let ceiling = constants.lookup(&ConstantKey::SocCeiling, at)?;

    let ceiling_deduction = gross.min(ceiling) * vf_rate;
    let vf = round_money((gross - ceiling_deduction) * vf_rate);
    let ta = round_money(gross * ta_rate);

    Ok(SurchargesResult { vf, ta })
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

    fn store(ta_rate: &str) -> ConstantsStore {
        let row = |key, value: &str| ConstantRow {
            key,
            value: dec(value),
            effective_from: date(2020, 1, 1),
            effective_to: None,
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        };
        ConstantsStore::new(
            vec![
                row(ConstantKey::VfRate, "0.06"),
                row(ConstantKey::TaRate, ta_rate),
                row(ConstantKey::SocCeiling, "2500000"),
            ],
            HashMap::new(),
            SeniorityTable::default(),
        )
    }

    #[test]
    fn test_vf_two_step_formula_below_ceiling_effect() {
        let store = store("0.015");
        let view = store.view();
        let result = compute_surcharges(dec("4800000"), &view, date(2025, 9, 1)).unwrap();
        // deduction = 2,500,000 x 6% = 150,000; VF = 4,650,000 x 6%.
        assert_eq!(result.vf, dec("279000.00"));
    }

    #[test]
    fn test_vf_on_high_gross() {
        let store = store("0.015");
        let view = store.view();
        let result = compute_surcharges(dec("8000000"), &view, date(2025, 9, 1)).unwrap();
        assert_eq!(result.vf, dec("471000.00"));
    }

    #[test]
    fn test_ta_applies_to_full_gross() {
        let store = store("0.015");
        let view = store.view();
        let result = compute_surcharges(dec("8000000"), &view, date(2025, 9, 1)).unwrap();
        assert_eq!(result.ta, dec("120000.00"));
    }

    #[test]
    fn test_ta_rate_toggles_without_code_change() {
        let store = store("0.02");
        let view = store.view();
        let result = compute_surcharges(dec("8000000"), &view, date(2025, 9, 1)).unwrap();
        assert_eq!(result.ta, dec("160000.00"));
    }

    #[test]
    fn test_gross_below_ceiling_self_deducts() {
        let store = store("0.015");
        let view = store.view();
        let result = compute_surcharges(dec("2000000"), &view, date(2025, 9, 1)).unwrap();
        // deduction = 2,000,000 x 6% = 120,000; VF = 1,880,000 x 6%.
        assert_eq!(result.vf, dec("112800.00"));
    }
}
