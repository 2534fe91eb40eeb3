//! Constants & schedules store.
//!
//! Statutory rates, ceilings, bracket tables and the seniority table are
//! data-driven: everything is keyed by effective-date ranges and loaded
//! through this module. The calculator never hard-codes a statutory
//! value.

mod keys;
mod loader;
mod seniority;
mod store;
mod tax_table;

pub use keys::ConstantKey;
pub use loader::ConfigLoader;
pub use seniority::{SeniorityStep, SeniorityTable};
pub use store::{ConstantRow, ConstantsStore, ConstantsView};
pub use tax_table::{TaxBracket, TaxTable};
