//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the
//! parametric payroll configuration from YAML files.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::models::Rubric;

use super::seniority::{SeniorityStep, SeniorityTable};
use super::store::{ConstantRow, ConstantsStore};
use super::tax_table::{TaxBracket, TaxTable};

/// Seniority configuration file structure.
#[derive(Debug, Clone, serde::Deserialize)]
struct SeniorityConfig {
    steps: Vec<SeniorityStep>,
}

/// Rubric catalog file structure.
#[derive(Debug, Clone, serde::Deserialize)]
struct RubricsConfig {
    rubrics: Vec<Rubric>,
}

/// Tax table file structure.
#[derive(Debug, Clone, serde::Deserialize)]
struct TaxTableConfig {
    year: i32,
    brackets: Vec<TaxBracket>,
}

/// Loads and provides access to the payroll configuration.
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/gn/
/// ├── constants.yaml   # effective-dated scalar constants
/// ├── seniority.yaml   # seniority step table
/// ├── rubrics.yaml     # rubric catalog seed
/// └── tax/
///     └── 2025.yaml    # RTS bracket table for 2025
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/gn").unwrap();
/// let constants = loader.constants();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    constants: ConstantsStore,
    rubrics: Vec<Rubric>,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if any required file is missing, contains invalid
    /// YAML, or if a tax table fails normalization.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let constants_path = path.join("constants.yaml");
        let rows = Self::load_yaml::<Vec<ConstantRow>>(&constants_path)?;

        let seniority_path = path.join("seniority.yaml");
        let seniority_config = Self::load_yaml::<SeniorityConfig>(&seniority_path)?;

        let rubrics_path = path.join("rubrics.yaml");
        let rubrics_config = Self::load_yaml::<RubricsConfig>(&rubrics_path)?;

        let tax_dir = path.join("tax");
        let tax_tables = Self::load_tax_tables(&tax_dir)?;

        let constants = ConstantsStore::new(
            rows,
            tax_tables,
            SeniorityTable::new(seniority_config.steps),
        );

        Ok(Self {
            constants,
            rubrics: rubrics_config.rubrics,
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads and normalizes all tax tables from the tax directory.
    fn load_tax_tables(tax_dir: &Path) -> EngineResult<HashMap<i32, TaxTable>> {
        let tax_dir_str = tax_dir.display().to_string();

        if !tax_dir.exists() {
            return Err(EngineError::ConfigNotFound { path: tax_dir_str });
        }

        let entries = fs::read_dir(tax_dir).map_err(|_| EngineError::ConfigNotFound {
            path: tax_dir_str.clone(),
        })?;

        let mut tables = HashMap::new();

        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: tax_dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                let config = Self::load_yaml::<TaxTableConfig>(&path)?;
                let table = TaxTable::normalize(config.year, config.brackets)?;
                tables.insert(config.year, table);
            }
        }

        if tables.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no tax table files found)", tax_dir_str),
            });
        }

        Ok(tables)
    }

    /// The loaded constants store.
    pub fn constants(&self) -> &ConstantsStore {
        &self.constants
    }

    /// Consumes the loader, returning the constants store.
    pub fn into_constants(self) -> ConstantsStore {
        self.constants
    }

    /// The loaded rubric catalog seed.
    pub fn rubrics(&self) -> &[Rubric] {
        &self.rubrics
    }
}
