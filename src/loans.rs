//! Loan amortization engine.
//!
//! Generates installment schedules under simple interest and exposes the
//! installment due in a pay period. The final installment absorbs the
//! rounding drift so the schedule sums exactly to principal plus
//! interest.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::calculation::round_money;
use crate::error::{EngineError, EngineResult};
use crate::models::{InstallmentState, Loan, LoanInstallment, LoanState, PayPeriod};
use crate::store::MemoryStore;

/// Generates the amortization schedule for a loan.
///
/// Simple interest: `total_interest = principal × rate × term / 1200`
/// with `rate` in percent per annum. Produces exactly `term_months` rows
/// with monthly due dates starting at the loan's start date.
pub fn generate_schedule(loan: &Loan) -> EngineResult<Vec<LoanInstallment>> {
    if loan.term_months == 0 {
        return Err(EngineError::Internal {
            message: format!("loan {} has a zero-month term", loan.id),
        });
    }
    if loan.principal <= Decimal::ZERO {
        return Err(EngineError::Internal {
            message: format!("loan {} has a non-positive principal", loan.id),
        });
    }

    let term = Decimal::from(loan.term_months);
    let total_interest = if loan.rate > Decimal::ZERO {
        loan.principal * loan.rate * term / Decimal::from(1200)
    } else {
        Decimal::ZERO
    };
    let total_due = loan.principal + total_interest;
    let installment_amount = round_money(total_due / term);

    let mut schedule = Vec::with_capacity(loan.term_months as usize);
    let mut opening = total_due;
    for index in 1..=loan.term_months {
        let due_date = loan
            .start_date
            .checked_add_months(Months::new(index - 1))
            .ok_or_else(|| EngineError::Internal {
                message: format!("due date overflow for loan {}", loan.id),
            })?;
        let amount = if index == loan.term_months {
            // Final installment absorbs the rounding drift.
            opening
        } else {
            installment_amount
        };
        let closing = opening - amount;
        schedule.push(LoanInstallment {
            loan_id: loan.id,
            index,
            due_date,
            amount,
            opening_balance: opening,
            closing_balance: closing,
            state: InstallmentState::Pending,
            paid_via_slip: None,
        });
        opening = closing;
    }

    Ok(schedule)
}

/// The regular installment amount for a loan, as stored on the loan row.
pub fn installment_amount(loan: &Loan) -> Decimal {
    let term = Decimal::from(loan.term_months.max(1));
    let total_interest = if loan.rate > Decimal::ZERO {
        loan.principal * loan.rate * term / Decimal::from(1200)
    } else {
        Decimal::ZERO
    };
    round_money((loan.principal + total_interest) / term)
}

/// The earliest pending installment due within the period, if any.
pub fn next_due<'a>(loan: &'a Loan, period: &PayPeriod) -> Option<&'a LoanInstallment> {
    if !matches!(loan.state, LoanState::Approved | LoanState::Active) {
        return None;
    }
    loan.schedule
        .iter()
        .filter(|i| i.state == InstallmentState::Pending && period.contains_date(i.due_date))
        .min_by_key(|i| i.index)
}

/// Records a payment made through a pay slip.
///
/// Marks the installment paid, links the slip, moves the loan to
/// `active` on first payment and to `settled` once fully repaid.
pub fn record_payment(loan: &mut Loan, index: u32, slip_id: uuid::Uuid) -> EngineResult<()> {
    if matches!(loan.state, LoanState::Settled | LoanState::Cancelled) {
        return Err(EngineError::LoanAlreadySettled {
            loan_id: loan.id.to_string(),
        });
    }
    let installment = loan
        .schedule
        .iter_mut()
        .find(|i| i.index == index)
        .ok_or_else(|| EngineError::NotFound {
            entity: "LoanInstallment".to_string(),
            id: format!("{}#{}", loan.id, index),
        })?;
    installment.state = InstallmentState::Paid;
    installment.paid_via_slip = Some(slip_id);

    loan.state = if loan.fully_repaid() {
        LoanState::Settled
    } else {
        LoanState::Active
    };
    Ok(())
}

/// Reverts a payment when the paying slip is cancelled.
///
/// Reopens the installment and moves a settled loan back to `active`
/// (or `approved` when no payment remains).
pub fn revert_payment(loan: &mut Loan, slip_id: uuid::Uuid) {
    let mut reverted = false;
    for installment in &mut loan.schedule {
        if installment.paid_via_slip == Some(slip_id) {
            installment.state = InstallmentState::Pending;
            installment.paid_via_slip = None;
            reverted = true;
        }
    }
    if reverted {
        let any_paid = loan
            .schedule
            .iter()
            .any(|i| i.state == InstallmentState::Paid);
        loan.state = if any_paid {
            LoanState::Active
        } else {
            LoanState::Approved
        };
    }
}

/// Registers a loan request in `pending` state.
pub fn request_loan(
    store: &MemoryStore,
    tenant_id: Uuid,
    employee_id: Uuid,
    principal: Decimal,
    rate: Decimal,
    term_months: u32,
    start_date: NaiveDate,
) -> EngineResult<Loan> {
    store.employee(tenant_id, employee_id)?;
    if principal <= Decimal::ZERO {
        return Err(EngineError::Validation {
            message: "loan principal must be positive".to_string(),
        });
    }
    if term_months == 0 {
        return Err(EngineError::Validation {
            message: "loan term must be at least one month".to_string(),
        });
    }
    if rate < Decimal::ZERO {
        return Err(EngineError::Validation {
            message: "loan rate cannot be negative".to_string(),
        });
    }

    let mut loan = Loan {
        id: Uuid::new_v4(),
        tenant_id,
        employee_id,
        principal,
        rate,
        term_months,
        installment_amount: Decimal::ZERO,
        state: LoanState::Pending,
        start_date,
        schedule: Vec::new(),
    };
    loan.installment_amount = installment_amount(&loan);
    store.insert_loan(loan.clone());
    Ok(loan)
}

/// Approves a pending loan, generating its amortization schedule.
pub fn approve_loan(store: &MemoryStore, tenant_id: Uuid, loan_id: Uuid) -> EngineResult<Loan> {
    store.with_loan_mut(tenant_id, loan_id, |loan| {
        if loan.state != LoanState::Pending {
            return Err(EngineError::InvalidTransition {
                entity: "Loan".to_string(),
                from: loan.state.as_str().to_string(),
                to: LoanState::Approved.as_str().to_string(),
            });
        }
        loan.schedule = generate_schedule(loan)?;
        loan.installment_amount = installment_amount(loan);
        loan.state = LoanState::Approved;
        Ok(loan.clone())
    })
}

/// Cancels a loan before any repayment.
pub fn cancel_loan(store: &MemoryStore, tenant_id: Uuid, loan_id: Uuid) -> EngineResult<Loan> {
    store.with_loan_mut(tenant_id, loan_id, |loan| {
        if !matches!(loan.state, LoanState::Pending | LoanState::Approved) {
            return Err(EngineError::InvalidTransition {
                entity: "Loan".to_string(),
                from: loan.state.as_str().to_string(),
                to: LoanState::Cancelled.as_str().to_string(),
            });
        }
        loan.state = LoanState::Cancelled;
        Ok(loan.clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan(principal: &str, rate: &str, term: u32) -> Loan {
        Loan {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            principal: dec(principal),
            rate: dec(rate),
            term_months: term,
            installment_amount: Decimal::ZERO,
            state: LoanState::Approved,
            start_date: date(2025, 2, 15),
            schedule: Vec::new(),
        }
    }

    #[test]
    fn test_interest_free_schedule_sums_to_principal() {
        let loan = loan("1000000", "0", 3);
        let schedule = generate_schedule(&loan).unwrap();
        assert_eq!(schedule.len(), 3);
        let total: Decimal = schedule.iter().map(|i| i.amount).sum();
        assert_eq!(total, dec("1000000"));
        assert_eq!(schedule.last().unwrap().closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_simple_interest_schedule() {
        // 1,200,000 at 10% over 12 months: interest = 120,000.
        let loan = loan("1200000", "10", 12);
        let schedule = generate_schedule(&loan).unwrap();
        let total: Decimal = schedule.iter().map(|i| i.amount).sum();
        assert_eq!(total, dec("1320000"));
        assert_eq!(schedule[0].amount, dec("110000.00"));
    }

    #[test]
    fn test_final_installment_absorbs_drift() {
        // 1,000,000 over 3 months: 333,333.33 x 2 + 333,333.34.
        let loan = loan("1000000", "0", 3);
        let schedule = generate_schedule(&loan).unwrap();
        assert_eq!(schedule[0].amount, dec("333333.33"));
        assert_eq!(schedule[1].amount, dec("333333.33"));
        assert_eq!(schedule[2].amount, dec("333333.34"));
    }

    #[test]
    fn test_balances_chain() {
        let loan = loan("900000", "0", 3);
        let schedule = generate_schedule(&loan).unwrap();
        for row in &schedule {
            assert_eq!(row.opening_balance - row.amount, row.closing_balance);
        }
        for pair in schedule.windows(2) {
            assert_eq!(pair[0].closing_balance, pair[1].opening_balance);
            assert!(pair[0].due_date < pair[1].due_date);
        }
    }

    #[test]
    fn test_due_dates_step_monthly() {
        let loan = loan("300000", "0", 3);
        let schedule = generate_schedule(&loan).unwrap();
        assert_eq!(schedule[0].due_date, date(2025, 2, 15));
        assert_eq!(schedule[1].due_date, date(2025, 3, 15));
        assert_eq!(schedule[2].due_date, date(2025, 4, 15));
    }

    #[test]
    fn test_next_due_picks_earliest_pending_in_period() {
        let mut l = loan("300000", "0", 3);
        l.schedule = generate_schedule(&l).unwrap();
        let period = PayPeriod::for_month(l.tenant_id, 2025, 3).unwrap();
        let due = next_due(&l, &period).unwrap();
        assert_eq!(due.index, 2);

        let off_period = PayPeriod::for_month(l.tenant_id, 2025, 6).unwrap();
        assert!(next_due(&l, &off_period).is_none());
    }

    #[test]
    fn test_next_due_ignores_unapproved_loans() {
        let mut l = loan("300000", "0", 3);
        l.schedule = generate_schedule(&l).unwrap();
        l.state = LoanState::Pending;
        let period = PayPeriod::for_month(l.tenant_id, 2025, 2).unwrap();
        assert!(next_due(&l, &period).is_none());
    }

    #[test]
    fn test_record_payment_progresses_to_settled() {
        let mut l = loan("300000", "0", 2);
        l.schedule = generate_schedule(&l).unwrap();
        let slip = Uuid::new_v4();

        record_payment(&mut l, 1, slip).unwrap();
        assert_eq!(l.state, LoanState::Active);

        record_payment(&mut l, 2, slip).unwrap();
        assert_eq!(l.state, LoanState::Settled);

        let err = record_payment(&mut l, 2, slip).unwrap_err();
        assert_eq!(err.code(), "LOAN_ALREADY_SETTLED");
    }

    #[test]
    fn test_revert_payment_reopens_installment() {
        let mut l = loan("300000", "0", 2);
        l.schedule = generate_schedule(&l).unwrap();
        let slip = Uuid::new_v4();
        record_payment(&mut l, 1, slip).unwrap();

        revert_payment(&mut l, slip);
        assert_eq!(l.state, LoanState::Approved);
        assert_eq!(l.schedule[0].state, InstallmentState::Pending);
        assert!(l.schedule[0].paid_via_slip.is_none());
    }
}
