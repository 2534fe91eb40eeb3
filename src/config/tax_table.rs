//! Progressive tax bracket table.
//!
//! The RTS bracket table is data-driven and normalized on read: brackets
//! must tile the non-negative line with no gap. Legacy tables that use
//! inclusive boundaries with one-unit gaps are repaired by snapping the
//! lower bound of the next bracket down onto the upper bound of the
//! previous one, as long as the gap does not exceed two units.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The widest legacy gap the normalizer will close.
const MAX_SNAP_GAP: Decimal = Decimal::TWO;

/// One row of a progressive tax table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// 1-based rank; ranks are contiguous within a table.
    pub rank: u32,
    /// Lower bound of the bracket (closed).
    pub lower: Decimal,
    /// Upper bound of the bracket (open); `None` for the top bracket.
    #[serde(default)]
    pub upper: Option<Decimal>,
    /// Marginal rate applied within the bracket, as a decimal fraction.
    pub rate: Decimal,
}

/// A normalized bracket table for one tax year.
///
/// Construction via [`TaxTable::normalize`] guarantees that brackets are
/// rank-ordered, start at zero, tile the line without gaps or overlaps,
/// and end with an open-ended top bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxTable {
    /// The tax year the table applies to.
    year: i32,
    /// Rank-ordered brackets.
    brackets: Vec<TaxBracket>,
}

impl TaxTable {
    /// Normalizes a loaded bracket table, repairing small legacy gaps.
    ///
    /// Fails with `TaxTableIncoherent` when the table is empty, ranks are
    /// not contiguous from 1, the first bracket does not start at zero,
    /// a gap wider than two units separates consecutive brackets, brackets
    /// overlap, or the last bracket is bounded.
    pub fn normalize(year: i32, mut rows: Vec<TaxBracket>) -> EngineResult<Self> {
        if rows.is_empty() {
            return Err(EngineError::TaxTableIncoherent {
                year,
                message: "table has no brackets".to_string(),
            });
        }

        rows.sort_by_key(|b| b.rank);
        for (i, bracket) in rows.iter().enumerate() {
            let expected = (i + 1) as u32;
            if bracket.rank != expected {
                return Err(EngineError::TaxTableIncoherent {
                    year,
                    message: format!("expected rank {expected}, found {}", bracket.rank),
                });
            }
        }

        if rows[0].lower != Decimal::ZERO {
            return Err(EngineError::TaxTableIncoherent {
                year,
                message: format!("first bracket starts at {}, not 0", rows[0].lower),
            });
        }

        for i in 0..rows.len() {
            let is_last = i + 1 == rows.len();
            match rows[i].upper {
                None if !is_last => {
                    return Err(EngineError::TaxTableIncoherent {
                        year,
                        message: format!("bracket {} is unbounded but not last", rows[i].rank),
                    });
                }
                None => {}
                Some(upper) => {
                    if upper <= rows[i].lower {
                        return Err(EngineError::TaxTableIncoherent {
                            year,
                            message: format!("bracket {} is empty or inverted", rows[i].rank),
                        });
                    }
                    if is_last {
                        return Err(EngineError::TaxTableIncoherent {
                            year,
                            message: "last bracket must be open-ended".to_string(),
                        });
                    }
                    let next_lower = rows[i + 1].lower;
                    if next_lower < upper {
                        return Err(EngineError::TaxTableIncoherent {
                            year,
                            message: format!(
                                "brackets {} and {} overlap",
                                rows[i].rank,
                                rows[i + 1].rank
                            ),
                        });
                    }
                    let gap = next_lower - upper;
                    if gap > MAX_SNAP_GAP {
                        return Err(EngineError::TaxTableIncoherent {
                            year,
                            message: format!(
                                "gap of {} between brackets {} and {}",
                                gap,
                                rows[i].rank,
                                rows[i + 1].rank
                            ),
                        });
                    }
                    if gap > Decimal::ZERO {
                        // Legacy inclusive-boundary data: snap the next
                        // lower bound down onto this upper bound.
                        rows[i + 1].lower = upper;
                    }
                }
            }
        }

        Ok(Self {
            year,
            brackets: rows,
        })
    }

    /// The tax year this table applies to.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The normalized brackets.
    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    /// Progressive tax on a non-negative base, unrounded.
    ///
    /// Brackets are closed at the lower bound and open at the upper:
    /// a base sitting exactly on a boundary is taxed entirely by the
    /// brackets below it.
    pub fn tax_on(&self, base: Decimal) -> Decimal {
        let mut tax = Decimal::ZERO;
        for bracket in &self.brackets {
            if base <= bracket.lower {
                break;
            }
            let slice = match bracket.upper {
                Some(upper) => base.min(upper) - bracket.lower,
                None => base - bracket.lower,
            };
            tax += slice * bracket.rate;
        }
        tax
    }
}
