//! Other deductions (phase 8).
//!
//! The union of the employee's standing deduction elements (mutual
//! insurance, union dues, voluntary savings) and the loan installments
//! falling due in the period. Statutory deductions (social contribution,
//! tax, absence retention) are computed by their own phases and excluded
//! here.

use rust_decimal::Decimal;

use crate::models::{
    ComputationBase, ElementBasis, LineKind, LoanInstallment, PaySlipLine, Rubric, SalaryElement,
};

use super::rounding::round_money;

/// Rubric code of loan repayment lines.
pub const LOAN_RUBRIC: &str = "PRET";

/// Display position of loan repayment lines.
const LOAN_DISPLAY_ORDER: u32 = 95;

/// The outcome of the other-deductions phase.
#[derive(Debug, Clone, PartialEq)]
pub struct OtherDeductionsResult {
    /// Deduction lines in computation order.
    pub lines: Vec<PaySlipLine>,
    /// Sum of all lines.
    pub total: Decimal,
}

/// Computes the standing deduction lines and loan repayment lines.
///
/// Rate-based deduction elements resolve their base against the final
/// gains figures; the running bases no longer move in this phase.
pub fn compute_other_deductions(
    pairs: &[(&SalaryElement, &Rubric)],
    base_salary: Decimal,
    gross: Decimal,
    social_base: Decimal,
    due_installments: &[LoanInstallment],
) -> OtherDeductionsResult {
    let mut ordered: Vec<&(&SalaryElement, &Rubric)> = pairs.iter().collect();
    ordered.sort_by_key(|(_, r)| r.computation_order);

    let mut lines = Vec::with_capacity(ordered.len() + due_installments.len());
    let mut total = Decimal::ZERO;

    for (element, rubric) in ordered {
        let (base, rate, amount) = match element.basis {
            ElementBasis::Fixed { amount } => (amount, None, round_money(amount)),
            ElementBasis::RateOn { rate, base } => {
                let base_value = match base {
                    ComputationBase::BaseSalary => base_salary,
                    ComputationBase::Gross => gross,
                    ComputationBase::SocialBase => social_base,
                };
                (base_value, Some(rate), round_money(base_value * rate))
            }
        };
        total += amount;
        lines.push(PaySlipLine {
            rubric_code: rubric.code.clone(),
            label: rubric.label.clone(),
            kind: LineKind::Deduction,
            base,
            rate,
            quantity: Decimal::ONE,
            amount,
            display_order: rubric.display_order,
        });
    }

    for installment in due_installments {
        total += installment.amount;
        lines.push(PaySlipLine {
            rubric_code: LOAN_RUBRIC.to_string(),
            label: format!("Loan repayment #{}", installment.index),
            kind: LineKind::Deduction,
            base: installment.opening_balance,
            rate: None,
            quantity: Decimal::ONE,
            amount: installment.amount,
            display_order: LOAN_DISPLAY_ORDER,
        });
    }

    OtherDeductionsResult { lines, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InstallmentState, RubricKind};
    use chrono::NaiveDate;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rubric(code: &str, display_order: u32, computation_order: u32) -> Rubric {
        Rubric {
            code: code.to_string(),
            label: code.to_string(),
            kind: RubricKind::Deduction,
            subject_to_social: false,
            subject_to_tax: false,
            display_order,
            computation_order,
            effective_from: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            effective_to: None,
        }
    }

    fn fixed_element(rubric_code: &str, amount: &str) -> SalaryElement {
        SalaryElement {
            id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            rubric_code: rubric_code.to_string(),
            basis: ElementBasis::Fixed { amount: dec(amount) },
            effective_from: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            effective_to: None,
        }
    }

    fn installment(amount: &str, opening: &str) -> LoanInstallment {
        LoanInstallment {
            loan_id: Uuid::new_v4(),
            index: 1,
            due_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            amount: dec(amount),
            opening_balance: dec(opening),
            closing_balance: dec(opening) - dec(amount),
            state: InstallmentState::Pending,
            paid_via_slip: None,
        }
    }

    #[test]
    fn test_fixed_deduction_elements_sum() {
        let mutual = rubric("MUTUELLE", 92, 10);
        let union = rubric("SYNDICAT", 93, 11);
        let mutual_el = fixed_element("MUTUELLE", "25000");
        let union_el = fixed_element("SYNDICAT", "10000");

        let result = compute_other_deductions(
            &[(&mutual_el, &mutual), (&union_el, &union)],
            dec("4000000"),
            dec("4800000"),
            dec("4000000"),
            &[],
        );

        assert_eq!(result.total, dec("35000"));
        assert_eq!(result.lines.len(), 2);
    }

    #[test]
    fn test_rate_based_deduction_resolves_against_final_bases() {
        let savings = rubric("EPARGNE", 94, 12);
        let savings_el = SalaryElement {
            id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            rubric_code: "EPARGNE".to_string(),
            basis: ElementBasis::RateOn {
                rate: dec("0.02"),
                base: ComputationBase::Gross,
            },
            effective_from: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            effective_to: None,
        };

        let result = compute_other_deductions(
            &[(&savings_el, &savings)],
            dec("4000000"),
            dec("4800000"),
            dec("4000000"),
            &[],
        );

        assert_eq!(result.lines[0].amount, dec("96000.00"));
    }

    #[test]
    fn test_loan_installments_append_lines() {
        let result = compute_other_deductions(
            &[],
            dec("4000000"),
            dec("4800000"),
            dec("4000000"),
            &[installment("250000", "1000000")],
        );

        assert_eq!(result.total, dec("250000"));
        assert_eq!(result.lines[0].rubric_code, LOAN_RUBRIC);
        assert_eq!(result.lines[0].base, dec("1000000"));
    }
}
