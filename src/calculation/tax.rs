//! Income-tax withholding (phase 6).
//!
//! The RTS is a progressive-bracket tax on the taxable base net of the
//! employee social contribution, family deductions and the professional
//! abatement. Interns and apprentices are exempt during their first
//! twelve months when their compensation stays under the stipend cap.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::config::{ConstantKey, ConstantsView, TaxTable};
use crate::error::EngineResult;
use crate::models::{Employee, LineKind, MaritalStatus, PaySlipLine};

use super::rounding::round_money;

/// Rubric code of the tax line.
pub const TAX_RUBRIC: &str = "RTS";

/// Display position of the tax line, after the social contribution.
const TAX_DISPLAY_ORDER: u32 = 91;

/// Months of stipend exemption counted from contract start.
const STIPEND_EXEMPTION_MONTHS: i32 = 12;

/// The outcome of the tax phase.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxResult {
    /// The tax base after all deductions and clipping.
    pub tax_base: Decimal,
    /// The withheld tax.
    pub tax: Decimal,
    /// True when the stipend exemption zeroed the tax.
    pub exempted: bool,
    /// The tax line; absent when no tax is due.
    pub line: Option<PaySlipLine>,
}

/// Computes the progressive income-tax withholding.
pub fn compute_tax(
    employee: &Employee,
    taxable_base: Decimal,
    employee_social: Decimal,
    table: &TaxTable,
    constants: &ConstantsView<'_>,
    at: NaiveDate,
) -> EngineResult<TaxResult> {
    if stipend_exempt(employee, taxable_base, constants, at)? {
        return Ok(TaxResult {
            tax_base: Decimal::ZERO,
            tax: Decimal::ZERO,
            exempted: true,
            line: None,
        });
    }

    let mut tax_base = taxable_base - employee_social;

    if employee.marital_status == MaritalStatus::Married {
        tax_base -= constants.lookup(&ConstantKey::SpouseDeduction, at)?;
    }

    if employee.children_count > 0 {
        let max_children = constants
            .lookup(&ConstantKey::MaxChildren, at)?
            .to_u32()
            .unwrap_or(0);
        let per_child = constants.lookup(&ConstantKey::PerChildDeduction, at)?;
        tax_base -= per_child * Decimal::from(employee.children_count.min(max_children));
    }

    let abatement_rate = constants.lookup(&ConstantKey::ProfAbatementRate, at)?;
    let abatement_cap = constants.lookup(&ConstantKey::ProfAbatementCap, at)?;
    if abatement_rate > Decimal::ZERO && tax_base > Decimal::ZERO {
        tax_base -= (abatement_rate * tax_base).min(abatement_cap);
    }

    let tax_base = tax_base.max(Decimal::ZERO);
    let tax = round_money(table.tax_on(tax_base));

    let line = (tax > Decimal::ZERO).then(|| PaySlipLine {
        rubric_code: TAX_RUBRIC.to_string(),
        label: "Income tax".to_string(),
        kind: LineKind::Deduction,
        base: tax_base,
        rate: None,
        quantity: Decimal::ONE,
        amount: tax,
        display_order: TAX_DISPLAY_ORDER,
    });

    Ok(TaxResult {
        tax_base,
        tax,
        exempted: false,
        line,
    })
}

/// The stipend exemption: internship or apprenticeship contracts within
/// their first twelve months and under the compensation cap pay no tax.
/// Months are counted from contract start.
fn stipend_exempt(
    employee: &Employee,
    taxable_base: Decimal,
    constants: &ConstantsView<'_>,
    at: NaiveDate,
) -> EngineResult<bool> {
    if !employee.is_stipendiary() {
        return Ok(false);
    }
    let months = (at.year() - employee.contract_start.year()) * 12 + at.month() as i32
        - employee.contract_start.month() as i32;
    if months > STIPEND_EXEMPTION_MONTHS {
        return Ok(false);
    }
    let cap = constants.lookup(&ConstantKey::StipendExemptionCap, at)?;
    Ok(taxable_base <= cap)
}
