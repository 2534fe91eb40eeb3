//! Monetary rounding policy.
//!
//! Every persisted monetary field is rounded half-up to two fractional
//! digits. Percentages carry up to four fractional digits and are never
//! pre-rounded; intermediate products keep full precision until they hit
//! a persisted field.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary amount half-up to two fractional digits.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
