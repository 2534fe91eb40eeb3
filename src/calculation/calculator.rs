//! The payroll calculator (phases 1-9).
//!
//! Pure given its inputs: the calculator assembles gains, computes the
//! statutory deductions and surcharges, and produces the ordered line
//! breakdown plus headline totals. Persistence happens elsewhere.

use std::collections::HashMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{ConstantKey, ConstantsView};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Absence, AttendanceRecord, Employee, LeaveRequest, LineKind, LoanInstallment, PayPeriod,
    PaySlipLine, Rubric, RubricKind, SalaryElement,
};

use super::absence::compute_absence_retention;
use super::attendance_totals::{AttendanceTotals, aggregate_attendance};
use super::deductions::compute_other_deductions;
use super::gains::compute_gains;
use super::overtime::compute_overtime;
use super::rounding::round_money;
use super::social::compute_social;
use super::surcharges::compute_surcharges;
use super::tax::compute_tax;

/// Rubric code of the net-zeroing adjustment line.
pub const ZERO_ADJUSTMENT_RUBRIC: &str = "AJUST_NET";

/// Display position of the zeroing adjustment, last on the slip.
const ZERO_ADJUSTMENT_DISPLAY_ORDER: u32 = 99;

/// The phase of the calculation pipeline, reported with failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationPhase {
    /// Phase 1: attendance aggregation.
    Attendance,
    /// Phase 2: gain lines.
    Gains,
    /// Phase 3: overtime pay.
    Overtime,
    /// Phase 4: unpaid-absence retention.
    Absence,
    /// Phase 5: social contributions.
    Social,
    /// Phase 6: income tax.
    Tax,
    /// Phase 7: employer surcharges.
    Surcharges,
    /// Phase 8: other deductions.
    Deductions,
    /// Phase 9: net and currency conversion.
    Net,
}

impl fmt::Display for CalculationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CalculationPhase::Attendance => "attendance",
            CalculationPhase::Gains => "gains",
            CalculationPhase::Overtime => "overtime",
            CalculationPhase::Absence => "absence",
            CalculationPhase::Social => "social",
            CalculationPhase::Tax => "tax",
            CalculationPhase::Surcharges => "surcharges",
            CalculationPhase::Deductions => "deductions",
            CalculationPhase::Net => "net",
        };
        f.write_str(s)
    }
}

/// A calculation failure tagged with the phase it occurred in.
#[derive(Debug)]
pub struct PhaseFailure {
    /// The phase that failed.
    pub phase: CalculationPhase,
    /// The underlying error.
    pub error: EngineError,
}

impl PhaseFailure {
    fn tag(phase: CalculationPhase) -> impl FnOnce(EngineError) -> PhaseFailure {
        move |error| PhaseFailure { phase, error }
    }
}

impl From<PhaseFailure> for EngineError {
    fn from(failure: PhaseFailure) -> Self {
        failure.error
    }
}

/// Everything the calculator needs for one (employee, period), already
/// filtered to the employee and scoped to the tenant by the caller.
#[derive(Debug)]
pub struct CalculationInput<'a> {
    /// The employee being paid.
    pub employee: &'a Employee,
    /// The period being computed.
    pub period: &'a PayPeriod,
    /// The employee's standing salary elements.
    pub elements: &'a [SalaryElement],
    /// The tenant's rubric catalog, by code.
    pub rubrics: &'a HashMap<String, Rubric>,
    /// The employee's clock records.
    pub attendance: &'a [AttendanceRecord],
    /// The employee's declared absences.
    pub absences: &'a [Absence],
    /// The employee's leave requests.
    pub leaves: &'a [LeaveRequest],
    /// Loan installments falling due in the period.
    pub due_installments: &'a [LoanInstallment],
    /// The caching constants view for this computation.
    pub constants: &'a ConstantsView<'a>,
}

/// Headline totals of a computed slip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlipTotals {
    /// Sum of all gain lines.
    pub gross: Decimal,
    /// The taxable base accumulated by the gains and overtime phases.
    pub taxable_base: Decimal,
    /// Employee-side social contribution.
    pub social_employee: Decimal,
    /// Employer-side social contribution.
    pub social_employer: Decimal,
    /// Income tax withheld.
    pub tax: Decimal,
    /// Versement Forfaitaire (employer side).
    pub vf: Decimal,
    /// Taxe d'Apprentissage (employer side).
    pub ta: Decimal,
    /// Unpaid-absence retention.
    pub absence_retention: Decimal,
    /// Standing deductions plus loan installments.
    pub other_deductions: Decimal,
    /// Sum of all deduction lines.
    pub total_deductions: Decimal,
    /// `gross - total_deductions`, clipped at zero.
    pub net: Decimal,
    /// Net in the employee currency, when it differs from GNF.
    pub net_employee_currency: Option<Decimal>,
}

/// The complete result of one slip computation.
#[derive(Debug, Clone, PartialEq)]
pub struct SlipComputation {
    /// Lines sorted by display order.
    pub lines: Vec<PaySlipLine>,
    /// Headline totals.
    pub totals: SlipTotals,
    /// The attendance totals the computation consumed.
    pub attendance: AttendanceTotals,
    /// Identifiers of the loan installments settled by this slip.
    pub paid_installments: Vec<(uuid::Uuid, u32)>,
}

/// Runs phases 1-9 for one (employee, period).
///
/// Later phases consume outputs of earlier phases only; failures carry
/// the phase they occurred in.
pub fn compute_slip(input: &CalculationInput<'_>) -> Result<SlipComputation, PhaseFailure> {
    let at = input.period.date_start;
    let constants = input.constants;

    // Phase 1: attendance.
    let attendance = aggregate_attendance(
        input.period,
        input.attendance,
        input.absences,
        input.leaves,
    );

    // Phase 2: gains. Elements pair with their rubric; an element whose
    // rubric's effective window excludes the period's month produces no
    // line.
    let mut gain_pairs: Vec<(&SalaryElement, &Rubric)> = Vec::new();
    let mut deduction_pairs: Vec<(&SalaryElement, &Rubric)> = Vec::new();
    for element in input.elements {
        if !element.effective_at(at) {
            continue;
        }
        let Some(rubric) = input.rubrics.get(&element.rubric_code) else {
            return Err(PhaseFailure {
                phase: CalculationPhase::Gains,
                error: EngineError::Internal {
                    message: format!("element references unknown rubric '{}'", element.rubric_code),
                },
            });
        };
        if !rubric.effective_at(at) {
            continue;
        }
        match rubric.kind {
            RubricKind::Gain => gain_pairs.push((element, rubric)),
            RubricKind::Deduction => deduction_pairs.push((element, rubric)),
        }
    }
    let gains = compute_gains(&gain_pairs);

    let mut lines = gains.lines;
    let mut gross_entitled = gains.gross;
    let mut social_base = gains.social_base;
    let mut taxable_base = gains.taxable_base;

    // Phase 3: overtime.
    let overtime = compute_overtime(
        gains.base_salary,
        attendance.overtime_hours,
        constants,
        at,
    )
    .map_err(PhaseFailure::tag(CalculationPhase::Overtime))?;
    if let Some(line) = overtime.line {
        lines.push(line);
        gross_entitled += overtime.amount;
        social_base += overtime.amount;
        taxable_base += overtime.amount;
    }

    // Phase 4: unpaid-absence retention. Reduces paid gross only; the
    // social and taxable bases reflect entitled pay.
    let retention = compute_absence_retention(
        gross_entitled,
        attendance.working_days,
        attendance.absence_days_unpaid,
    );
    let mut gross_paid = gross_entitled;
    if let Some(line) = retention.line {
        lines.push(line);
        gross_paid -= retention.amount;
    }

    // Phase 5: social contributions.
    let social = compute_social(social_base, constants, at)
        .map_err(PhaseFailure::tag(CalculationPhase::Social))?;
    if let Some(line) = social.line {
        lines.push(line);
    }

    // Phase 6: income tax.
    let table = constants
        .tax_table(input.period.year)
        .map_err(PhaseFailure::tag(CalculationPhase::Tax))?;
    let tax = compute_tax(
        input.employee,
        taxable_base,
        social.employee,
        table,
        constants,
        at,
    )
    .map_err(PhaseFailure::tag(CalculationPhase::Tax))?;
    if let Some(line) = tax.line {
        lines.push(line);
    }

    // Phase 7: employer surcharges on the paid gross.
    let surcharges = compute_surcharges(gross_paid, constants, at)
        .map_err(PhaseFailure::tag(CalculationPhase::Surcharges))?;

    // Phase 8: other deductions.
    let other = compute_other_deductions(
        &deduction_pairs,
        gains.base_salary,
        gross_entitled,
        social_base,
        input.due_installments,
    );
    lines.extend(other.lines);

    // Phase 9: net.
    let total_deductions =
        social.employee + tax.tax + other.total + retention.amount;
    let mut net = gross_entitled - total_deductions;
    let mut gross = gross_entitled;
    if net < Decimal::ZERO {
        // Deductions exceeded entitled pay: clip the net at zero and
        // record the shortfall on its own line.
        let shortfall = -net;
        lines.push(PaySlipLine {
            rubric_code: ZERO_ADJUSTMENT_RUBRIC.to_string(),
            label: "Net zeroing adjustment".to_string(),
            kind: LineKind::Gain,
            base: shortfall,
            rate: None,
            quantity: Decimal::ONE,
            amount: shortfall,
            display_order: ZERO_ADJUSTMENT_DISPLAY_ORDER,
        });
        gross += shortfall;
        net = Decimal::ZERO;
    }
    let net = round_money(net);

    let net_employee_currency = if input.employee.paid_in_local_currency() {
        None
    } else {
        let fx = constants
            .lookup(&ConstantKey::FxRate(input.employee.currency.clone()), at)
            .map_err(PhaseFailure::tag(CalculationPhase::Net))?;
        if fx <= Decimal::ZERO {
            return Err(PhaseFailure {
                phase: CalculationPhase::Net,
                error: EngineError::Internal {
                    message: format!("non-positive FX rate for {}", input.employee.currency),
                },
            });
        }
        Some(round_money(net / fx))
    };

    lines.sort_by_key(|l| l.display_order);

    let paid_installments = input
        .due_installments
        .iter()
        .map(|i| (i.loan_id, i.index))
        .collect();

    Ok(SlipComputation {
        lines,
        totals: SlipTotals {
            gross,
            taxable_base,
            social_employee: social.employee,
            social_employer: social.employer,
            tax: tax.tax,
            vf: surcharges.vf,
            ta: surcharges.ta,
            absence_retention: retention.amount,
            other_deductions: other.total,
            total_deductions,
            net,
            net_employee_currency,
        },
        attendance,
        paid_installments,
    })
}

/// Checks the slip-level invariant: headline totals agree with the line
/// sums to the last decimal.
pub fn check_slip_invariant(computation: &SlipComputation) -> EngineResult<()> {
    let gains: Decimal = computation
        .lines
        .iter()
        .filter(|l| l.kind == LineKind::Gain)
        .map(|l| l.amount)
        .sum();
    let deductions: Decimal = computation
        .lines
        .iter()
        .filter(|l| l.kind == LineKind::Deduction)
        .map(|l| l.amount)
        .sum();

    let t = &computation.totals;
    if gains != t.gross || deductions != t.total_deductions || t.net != t.gross - t.total_deductions
    {
        return Err(EngineError::Internal {
            message: format!(
                "slip invariant violated: gross {} vs gains {}, deductions {} vs lines {}, net {}",
                t.gross, gains, t.total_deductions, deductions, t.net
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConstantRow, ConstantsStore, SeniorityTable, TaxBracket, TaxTable};
    use crate::models::{
        AbsenceKind, AttendanceStatus, ContractKind, ElementBasis, EmployeeStatus, MaritalStatus,
        PayImpact,
    };
    use chrono::{DateTime, NaiveDate};
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn constants_store() -> ConstantsStore {
        let row = |key, value: &str| ConstantRow {
            key,
            value: dec(value),
            effective_from: date(2020, 1, 1),
            effective_to: None,
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        };
        let bracket = |rank, lower: &str, upper: Option<&str>, rate: &str| TaxBracket {
            rank,
            lower: dec(lower),
            upper: upper.map(dec),
            rate: dec(rate),
        };
        let table = TaxTable::normalize(
            2025,
            vec![
                bracket(1, "0", Some("1000000"), "0"),
                bracket(2, "1000000", Some("3000000"), "0.05"),
                bracket(3, "3000000", Some("5000000"), "0.08"),
                bracket(4, "5000000", Some("10000000"), "0.10"),
                bracket(5, "10000000", None, "0.15"),
            ],
        )
        .unwrap();
        ConstantsStore::new(
            vec![
                row(ConstantKey::SocFloor, "440000"),
                row(ConstantKey::SocCeiling, "2500000"),
                row(ConstantKey::SocRateEmployee, "0.05"),
                row(ConstantKey::SocRateEmployer, "0.18"),
                row(ConstantKey::VfRate, "0.06"),
                row(ConstantKey::TaRate, "0.015"),
                row(ConstantKey::OvertimeMultiplier, "1.25"),
                row(ConstantKey::MonthlyHours, "173.33"),
                row(ConstantKey::MinWage, "440000"),
                row(ConstantKey::SpouseDeduction, "100000"),
                row(ConstantKey::PerChildDeduction, "50000"),
                row(ConstantKey::MaxChildren, "6"),
                row(ConstantKey::ProfAbatementRate, "0"),
                row(ConstantKey::ProfAbatementCap, "0"),
                row(ConstantKey::StipendExemptionCap, "1200000"),
                row(ConstantKey::FxRate("USD".to_string()), "8650"),
            ],
            [(2025, table)].into_iter().collect(),
            SeniorityTable::default(),
        )
    }

    fn employee() -> Employee {
        Employee {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            matricule: "EMP-0001".to_string(),
            marital_status: MaritalStatus::Single,
            children_count: 0,
            hiring_date: date(2020, 1, 1),
            seniority_date: date(2020, 1, 1),
            contract_start: date(2020, 1, 1),
            contract_kind: ContractKind::Indefinite,
            status: EmployeeStatus::Active,
            currency: "GNF".to_string(),
            departure_date: None,
        }
    }

    fn gain_rubric(code: &str, social: bool, tax: bool, order: u32) -> Rubric {
        Rubric {
            code: code.to_string(),
            label: code.to_string(),
            kind: RubricKind::Gain,
            subject_to_social: social,
            subject_to_tax: tax,
            display_order: order,
            computation_order: order,
            effective_from: date(2020, 1, 1),
            effective_to: None,
        }
    }

    fn fixed_element(employee_id: Uuid, rubric_code: &str, amount: &str) -> SalaryElement {
        SalaryElement {
            id: Uuid::new_v4(),
            employee_id,
            rubric_code: rubric_code.to_string(),
            basis: ElementBasis::Fixed { amount: dec(amount) },
            effective_from: date(2020, 1, 1),
            effective_to: None,
        }
    }

    struct Fixture {
        employee: Employee,
        period: PayPeriod,
        rubrics: HashMap<String, Rubric>,
        elements: Vec<SalaryElement>,
        attendance: Vec<AttendanceRecord>,
        absences: Vec<Absence>,
    }

    impl Fixture {
        fn new() -> Self {
            let employee = employee();
            let mut rubrics = HashMap::new();
            for rubric in [
                gain_rubric("SAL_BASE", true, true, 1),
                gain_rubric("PRIME_VIE_CHERE", false, false, 2),
                gain_rubric("PRIME_TRANSPORT", false, false, 3),
                gain_rubric("PRIME_LOGEMENT", false, false, 4),
            ] {
                rubrics.insert(rubric.code.clone(), rubric);
            }
            Self {
                employee,
                period: PayPeriod::for_month(Uuid::new_v4(), 2025, 9).unwrap(),
                rubrics,
                elements: Vec::new(),
                attendance: Vec::new(),
                absences: Vec::new(),
            }
        }

        fn with_base(mut self, amount: &str) -> Self {
            self.elements
                .push(fixed_element(self.employee.id, "SAL_BASE", amount));
            self
        }

        fn compute(&self) -> Result<SlipComputation, PhaseFailure> {
            let store = constants_store();
            let view = store.view();
            compute_slip(&CalculationInput {
                employee: &self.employee,
                period: &self.period,
                elements: &self.elements,
                rubrics: &self.rubrics,
                attendance: &self.attendance,
                absences: &self.absences,
                leaves: &[],
                due_installments: &[],
                constants: &view,
            })
        }
    }

    /// S1: gross 8,000,000, no primes, no dependents.
    #[test]
    fn test_scenario_ceiling_clamp() {
        let fixture = Fixture::new().with_base("8000000");
        let result = fixture.compute().unwrap();

        assert_eq!(result.totals.gross, dec("8000000"));
        assert_eq!(result.totals.social_employee, dec("125000.00"));
        assert_eq!(result.totals.social_employer, dec("450000.00"));
        assert_eq!(result.totals.tax, dec("547500.00"));
        assert_eq!(result.totals.ta, dec("120000.00"));
        assert_eq!(result.totals.vf, dec("471000.00"));
        assert_eq!(result.totals.net, dec("7327500.00"));
        check_slip_invariant(&result).unwrap();
    }

    /// S2: base 4,000,000 plus tax-exempt allowances of 800,000.
    #[test]
    fn test_scenario_exempt_allowances() {
        let mut fixture = Fixture::new().with_base("4000000");
        fixture.elements.push(fixed_element(
            fixture.employee.id,
            "PRIME_VIE_CHERE",
            "300000",
        ));
        fixture.elements.push(fixed_element(
            fixture.employee.id,
            "PRIME_TRANSPORT",
            "300000",
        ));
        fixture.elements.push(fixed_element(
            fixture.employee.id,
            "PRIME_LOGEMENT",
            "200000",
        ));

        let result = fixture.compute().unwrap();

        assert_eq!(result.totals.gross, dec("4800000"));
        assert_eq!(result.totals.social_employee, dec("125000.00"));
        assert_eq!(result.totals.tax, dec("170000.00"));
        assert_eq!(result.totals.vf, dec("279000.00"));
        assert_eq!(result.totals.net, dec("4505000.00"));
        check_slip_invariant(&result).unwrap();
    }

    /// S4: sub-threshold gross triggers the liveness rule.
    #[test]
    fn test_scenario_liveness_zeroing() {
        let fixture = Fixture::new().with_base("40000");
        let result = fixture.compute().unwrap();

        assert_eq!(result.totals.social_employee, Decimal::ZERO);
        assert_eq!(result.totals.social_employer, Decimal::ZERO);
    }

    /// S5: five unpaid days out of twenty-two.
    #[test]
    fn test_scenario_unpaid_absence() {
        let mut fixture = Fixture::new().with_base("2200000");
        fixture.absences.push(Absence {
            id: Uuid::new_v4(),
            employee_id: fixture.employee.id,
            date: date(2025, 9, 8),
            kind: AbsenceKind::Unjustified,
            duration_days: dec("5"),
            justified: false,
            pay_impact: PayImpact::Unpaid,
            partial_rate: Decimal::ZERO,
        });

        let result = fixture.compute().unwrap();

        assert_eq!(result.totals.absence_retention, dec("500000.00"));
        // Social is computed on the entitled 2,200,000.
        assert_eq!(result.totals.social_employee, dec("110000.00"));
        // Entitled gross stays the headline; retention is a deduction line.
        assert_eq!(result.totals.gross, dec("2200000"));
        assert!(
            result
                .lines
                .iter()
                .any(|l| l.rubric_code == "RETENUE_ABS" && l.amount == dec("500000.00"))
        );
        check_slip_invariant(&result).unwrap();
    }

    #[test]
    fn test_overtime_enters_all_bases() {
        let mut fixture = Fixture::new().with_base("1733300");
        fixture.attendance.push(AttendanceRecord {
            id: Uuid::new_v4(),
            employee_id: fixture.employee.id,
            date: date(2025, 9, 3),
            clock_in: None,
            clock_out: None,
            worked_hours: dec("8"),
            overtime_hours: dec("10"),
            status: AttendanceStatus::Present,
        });

        let result = fixture.compute().unwrap();

        // 10 h x 10,000/h x 1.25 = 125,000 on top of the base.
        assert_eq!(result.totals.gross, dec("1858300.00"));
        assert_eq!(result.totals.taxable_base, dec("1858300.00"));
        check_slip_invariant(&result).unwrap();
    }

    #[test]
    fn test_net_clips_to_zero_with_adjustment_line() {
        let mut fixture = Fixture::new().with_base("500000");
        fixture.absences.push(Absence {
            id: Uuid::new_v4(),
            employee_id: fixture.employee.id,
            date: date(2025, 9, 1),
            kind: AbsenceKind::Unjustified,
            duration_days: dec("22"),
            justified: false,
            pay_impact: PayImpact::Unpaid,
            partial_rate: Decimal::ZERO,
        });

        let result = fixture.compute().unwrap();

        assert_eq!(result.totals.net, Decimal::ZERO);
        assert!(
            result
                .lines
                .iter()
                .any(|l| l.rubric_code == ZERO_ADJUSTMENT_RUBRIC)
        );
        check_slip_invariant(&result).unwrap();
    }

    #[test]
    fn test_foreign_currency_net_converted_at_period_rate() {
        let mut fixture = Fixture::new().with_base("8650000");
        fixture.employee.currency = "USD".to_string();

        let result = fixture.compute().unwrap();

        let net = result.totals.net;
        let converted = result.totals.net_employee_currency.unwrap();
        assert_eq!(converted, round_money(net / dec("8650")));
    }

    #[test]
    fn test_missing_constant_reports_phase() {
        let fixture = Fixture::new().with_base("40000");
        let store = ConstantsStore::default();
        let view = store.view();
        let failure = compute_slip(&CalculationInput {
            employee: &fixture.employee,
            period: &fixture.period,
            elements: &fixture.elements,
            rubrics: &fixture.rubrics,
            attendance: &[],
            absences: &[],
            leaves: &[],
            due_installments: &[],
            constants: &view,
        })
        .unwrap_err();

        assert_eq!(failure.phase, CalculationPhase::Social);
        assert_eq!(failure.error.code(), "NO_ACTIVE_CONSTANT");
    }

    #[test]
    fn test_lines_sorted_by_display_order() {
        let mut fixture = Fixture::new().with_base("4000000");
        fixture.elements.push(fixed_element(
            fixture.employee.id,
            "PRIME_TRANSPORT",
            "300000",
        ));
        let result = fixture.compute().unwrap();
        let orders: Vec<u32> = result.lines.iter().map(|l| l.display_order).collect();
        let mut sorted = orders.clone();
        sorted.sort_unstable();
        assert_eq!(orders, sorted);
    }
}
