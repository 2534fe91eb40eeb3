//! Gain line computation (phase 2).
//!
//! Loads the employee's standing gain elements effective in the period
//! and turns them into pay slip lines, accumulating the running gross,
//! social and taxable bases.
//!
//! Rate-based elements may reference the running gross or social base,
//! which are themselves in progress. The forward reference is resolved by
//! two-pass execution ordered by `computation_order`: first every
//! fixed-amount gain, then rate-based gains in their declared order.

use rust_decimal::Decimal;

use crate::models::{ComputationBase, ElementBasis, LineKind, PaySlipLine, Rubric, SalaryElement};

use super::rounding::round_money;

/// Rubric code of the base-salary element, the anchor of the
/// `BASE_SALARY` computation base.
pub const BASE_SALARY_RUBRIC: &str = "SAL_BASE";

/// The outcome of the gains phase.
#[derive(Debug, Clone, PartialEq)]
pub struct GainsResult {
    /// Gain lines in computation order.
    pub lines: Vec<PaySlipLine>,
    /// Sum of all gain lines.
    pub gross: Decimal,
    /// Sum of gain lines whose rubric is subject to social contributions.
    pub social_base: Decimal,
    /// Sum of gain lines whose rubric is subject to tax.
    pub taxable_base: Decimal,
    /// Amount of the base-salary element, zero when absent.
    pub base_salary: Decimal,
}

/// Computes the gain lines from the employee's effective (element, rubric)
/// pairs. The caller filters pairs to gain rubrics effective in the
/// period.
pub fn compute_gains(pairs: &[(&SalaryElement, &Rubric)]) -> GainsResult {
    let mut fixed: Vec<&(&SalaryElement, &Rubric)> = Vec::new();
    let mut rated: Vec<&(&SalaryElement, &Rubric)> = Vec::new();
    for pair in pairs {
        match pair.0.basis {
            ElementBasis::Fixed { .. } => fixed.push(pair),
            ElementBasis::RateOn { .. } => rated.push(pair),
        }
    }
    fixed.sort_by_key(|(_, r)| r.computation_order);
    rated.sort_by_key(|(_, r)| r.computation_order);

    let mut result = GainsResult {
        lines: Vec::with_capacity(pairs.len()),
        gross: Decimal::ZERO,
        social_base: Decimal::ZERO,
        taxable_base: Decimal::ZERO,
        base_salary: Decimal::ZERO,
    };

    for (element, rubric) in fixed.into_iter() {
        let ElementBasis::Fixed { amount } = element.basis else {
            continue;
        };
        let amount = round_money(amount);
        if rubric.code == BASE_SALARY_RUBRIC {
            result.base_salary = amount;
        }
        push_gain(&mut result, rubric, amount, amount, None);
    }

    for (element, rubric) in rated.into_iter() {
        let ElementBasis::RateOn { rate, base } = element.basis else {
            continue;
        };
        let base_value = match base {
            ComputationBase::BaseSalary => result.base_salary,
            ComputationBase::Gross => result.gross,
            ComputationBase::SocialBase => result.social_base,
        };
        let amount = round_money(base_value * rate);
        push_gain(&mut result, rubric, base_value, amount, Some(rate));
    }

    result
}

fn push_gain(
    result: &mut GainsResult,
    rubric: &Rubric,
    base: Decimal,
    amount: Decimal,
    rate: Option<Decimal>,
) {
    result.gross += amount;
    if rubric.subject_to_social {
        result.social_base += amount;
    }
    if rubric.subject_to_tax {
        result.taxable_base += amount;
    }
    result.lines.push(PaySlipLine {
        rubric_code: rubric.code.clone(),
        label: rubric.label.clone(),
        kind: LineKind::Gain,
        base,
        rate,
        quantity: Decimal::ONE,
        amount,
        display_order: rubric.display_order,
    });
}
