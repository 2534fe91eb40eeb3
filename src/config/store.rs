//! Effective-dated constants store.
//!
//! Exposes `lookup(key, at_date)` with the effective-window policy: the
//! row whose `[effective_from, effective_to)` window contains the date is
//! selected; among overlapping rows the most recently created wins.
//! Lookups during one pay-period computation go through a caching
//! [`ConstantsView`].

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};

use super::keys::ConstantKey;
use super::seniority::SeniorityTable;
use super::tax_table::TaxTable;

/// One effective-dated row of the constants table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantRow {
    /// The constant this row defines.
    pub key: ConstantKey,
    /// The scalar value.
    pub value: Decimal,
    /// Start of the effective window (inclusive).
    pub effective_from: NaiveDate,
    /// End of the effective window (exclusive); `None` means open-ended.
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
    /// Creation timestamp; breaks ties between overlapping rows.
    pub created_at: DateTime<Utc>,
}

impl ConstantRow {
    fn covers(&self, date: NaiveDate) -> bool {
        if date < self.effective_from {
            return false;
        }
        match self.effective_to {
            Some(to) => date < to,
            None => true,
        }
    }
}

/// The parametric store: scalar constants, tax tables and the seniority
/// step table, all keyed by effective date or year.
#[derive(Debug, Clone, Default)]
pub struct ConstantsStore {
    rows: Vec<ConstantRow>,
    tax_tables: HashMap<i32, TaxTable>,
    seniority: SeniorityTable,
}

impl ConstantsStore {
    /// Builds a store from its component tables.
    pub fn new(
        rows: Vec<ConstantRow>,
        tax_tables: HashMap<i32, TaxTable>,
        seniority: SeniorityTable,
    ) -> Self {
        Self {
            rows,
            tax_tables,
            seniority,
        }
    }

    /// Inserts a row. Callers hold the tenant-global exclusive lock when
    /// updating a shared store; per-computation caches are created after
    /// the update and therefore never observe stale values.
    pub fn push(&mut self, row: ConstantRow) {
        self.rows.push(row);
    }

    /// Looks up the value effective for `key` at `date`.
    ///
    /// Among rows whose window covers the date, the most recently created
    /// wins. Fails with `NoActiveConstant` when none applies.
    pub fn lookup(&self, key: &ConstantKey, date: NaiveDate) -> EngineResult<Decimal> {
        self.rows
            .iter()
            .filter(|r| &r.key == key && r.covers(date))
            .max_by_key(|r| r.created_at)
            .map(|r| r.value)
            .ok_or_else(|| EngineError::NoActiveConstant {
                key: key.to_string(),
                date,
            })
    }

    /// The normalized tax table for a year.
    pub fn tax_table(&self, year: i32) -> EngineResult<&TaxTable> {
        self.tax_tables
            .get(&year)
            .ok_or_else(|| EngineError::TaxTableIncoherent {
                year,
                message: "no table loaded for this year".to_string(),
            })
    }

    /// The seniority step table.
    pub fn seniority(&self) -> &SeniorityTable {
        &self.seniority
    }

    /// Opens a caching view for the lifetime of one pay-period
    /// computation.
    pub fn view(&self) -> ConstantsView<'_> {
        ConstantsView {
            store: self,
            cache: RefCell::new(HashMap::new()),
        }
    }
}

/// A per-computation caching view over the constants store.
///
/// Caches each `(key, date)` lookup for the lifetime of the view; the
/// view is dropped when the computation ends, so store updates never
/// leak stale values across computations.
#[derive(Debug)]
pub struct ConstantsView<'a> {
    store: &'a ConstantsStore,
    cache: RefCell<HashMap<(ConstantKey, NaiveDate), Decimal>>,
}

impl ConstantsView<'_> {
    /// Cached lookup; see [`ConstantsStore::lookup`].
    pub fn lookup(&self, key: &ConstantKey, date: NaiveDate) -> EngineResult<Decimal> {
        let cache_key = (key.clone(), date);
        if let Some(value) = self.cache.borrow().get(&cache_key) {
            return Ok(*value);
        }
        let value = self.store.lookup(key, date)?;
        self.cache.borrow_mut().insert(cache_key, value);
        Ok(value)
    }

    /// The normalized tax table for a year.
    pub fn tax_table(&self, year: i32) -> EngineResult<&TaxTable> {
        self.store.tax_table(year)
    }

    /// The seniority step table.
    pub fn seniority(&self) -> &SeniorityTable {
        self.store.seniority()
    }
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

    fn row(
        key: ConstantKey,
        value: &str,
        from: NaiveDate,
        to: Option<NaiveDate>,
        created_offset_secs: i64,
    ) -> ConstantRow {
        ConstantRow {
            key,
            value: dec(value),
            effective_from: from,
            effective_to: to,
            created_at: DateTime::from_timestamp(1_700_000_000 + created_offset_secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_lookup_selects_covering_window() {
        let store = ConstantsStore::new(
            vec![
                row(
                    ConstantKey::SocCeiling,
                    "2000000",
                    date(2020, 1, 1),
                    Some(date(2024, 1, 1)),
                    0,
                ),
                row(
                    ConstantKey::SocCeiling,
                    "2500000",
                    date(2024, 1, 1),
                    None,
                    1,
                ),
            ],
            HashMap::new(),
            SeniorityTable::default(),
        );

        assert_eq!(
            store
                .lookup(&ConstantKey::SocCeiling, date(2023, 6, 1))
                .unwrap(),
            dec("2000000")
        );
        assert_eq!(
            store
                .lookup(&ConstantKey::SocCeiling, date(2025, 3, 1))
                .unwrap(),
            dec("2500000")
        );
    }

    #[test]
    fn test_window_upper_bound_is_exclusive() {
        let store = ConstantsStore::new(
            vec![row(
                ConstantKey::VfRate,
                "0.06",
                date(2024, 1, 1),
                Some(date(2025, 1, 1)),
                0,
            )],
            HashMap::new(),
            SeniorityTable::default(),
        );

        assert!(store.lookup(&ConstantKey::VfRate, date(2024, 12, 31)).is_ok());
        let err = store
            .lookup(&ConstantKey::VfRate, date(2025, 1, 1))
            .unwrap_err();
        assert_eq!(err.code(), "NO_ACTIVE_CONSTANT");
    }

    #[test]
    fn test_overlap_resolved_by_most_recent_creation() {
        let store = ConstantsStore::new(
            vec![
                row(ConstantKey::TaRate, "0.015", date(2024, 1, 1), None, 0),
                row(ConstantKey::TaRate, "0.02", date(2024, 1, 1), None, 100),
            ],
            HashMap::new(),
            SeniorityTable::default(),
        );

        assert_eq!(
            store.lookup(&ConstantKey::TaRate, date(2025, 6, 1)).unwrap(),
            dec("0.02")
        );
    }

    #[test]
    fn test_missing_key_fails() {
        let store = ConstantsStore::default();
        let err = store
            .lookup(&ConstantKey::MinWage, date(2025, 1, 1))
            .unwrap_err();
        assert_eq!(err.code(), "NO_ACTIVE_CONSTANT");
    }

    #[test]
    fn test_view_caches_lookups() {
        let mut store = ConstantsStore::new(
            vec![row(ConstantKey::MinWage, "440000", date(2024, 1, 1), None, 0)],
            HashMap::new(),
            SeniorityTable::default(),
        );

        let view = store.view();
        assert_eq!(
            view.lookup(&ConstantKey::MinWage, date(2025, 1, 1)).unwrap(),
            dec("440000")
        );
        drop(view);

        // A later row would win an uncached lookup; a fresh view sees it.
        store.push(row(ConstantKey::MinWage, "550000", date(2024, 1, 1), None, 50));
        let view = store.view();
        assert_eq!(
            view.lookup(&ConstantKey::MinWage, date(2025, 1, 1)).unwrap(),
            dec("550000")
        );
    }
}
