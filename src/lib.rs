//! Payroll computation engine for Guinean labour and tax rules.
//!
//! This crate computes legally conformant pay slips from an employee's
//! compensation structure, a pay period and the attendance recorded over
//! that period: gross pay, social-security contributions, progressive
//! income-tax withholding (RTS), employer surcharges (VF, TA), loan and
//! other deductions, and net pay, together with annual cumulants and an
//! auditable line-by-line breakdown.

#![warn(missing_docs)]

pub mod api;
pub mod bulletin;
pub mod calculation;
pub mod config;
pub mod error;
pub mod leave;
pub mod ledger;
pub mod loans;
pub mod models;
pub mod period;
pub mod store;
