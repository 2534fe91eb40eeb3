//! Constant keys recognized by the parametric store.
//!
//! Every statutory rate, ceiling and threshold the calculator consumes is
//! named here and loaded through the effective-dated constants store;
//! nothing is baked into code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named scalar in the constants store.
///
/// The string form matches the configuration file spelling (e.g.
/// `SOC_FLOOR`, `FX_RATE_USD`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ConstantKey {
    /// Social-contribution base floor (SMIG reference).
    SocFloor,
    /// Social-contribution base ceiling.
    SocCeiling,
    /// Employee-side social-contribution rate.
    SocRateEmployee,
    /// Employer-side social-contribution rate.
    SocRateEmployer,
    /// Versement Forfaitaire rate.
    VfRate,
    /// Taxe d'Apprentissage rate.
    TaRate,
    /// First-tier overtime multiplier.
    OvertimeMultiplier,
    /// Second-tier overtime multiplier.
    OvertimeMultiplierT2,
    /// Night/holiday overtime multiplier.
    OvertimeMultiplierNight,
    /// Reference monthly hours used to derive the hourly rate.
    MonthlyHours,
    /// Statutory minimum wage.
    MinWage,
    /// Tax-base deduction for a married employee.
    SpouseDeduction,
    /// Tax-base deduction per dependent child.
    PerChildDeduction,
    /// Maximum number of deductible children.
    MaxChildren,
    /// Professional abatement rate on the tax base.
    ProfAbatementRate,
    /// Cap on the professional abatement.
    ProfAbatementCap,
    /// Monthly compensation cap for the stipend tax exemption.
    StipendExemptionCap,
    /// Maximum leave days carried over between years.
    MaxCarryOver,
    /// Leave days accrued per eligible month.
    DaysPerMonth,
    /// Exchange rate for a foreign currency, in local units per foreign
    /// unit, keyed `FX_RATE_<code>`.
    FxRate(String),
}

impl fmt::Display for ConstantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConstantKey::SocFloor => "SOC_FLOOR",
            ConstantKey::SocCeiling => "SOC_CEILING",
            ConstantKey::SocRateEmployee => "SOC_RATE_EMPLOYEE",
            ConstantKey::SocRateEmployer => "SOC_RATE_EMPLOYER",
            ConstantKey::VfRate => "VF_RATE",
            ConstantKey::TaRate => "TA_RATE",
            ConstantKey::OvertimeMultiplier => "OVERTIME_MULTIPLIER",
            ConstantKey::OvertimeMultiplierT2 => "OVERTIME_MULTIPLIER_T2",
            ConstantKey::OvertimeMultiplierNight => "OVERTIME_MULTIPLIER_NIGHT",
            ConstantKey::MonthlyHours => "MONTHLY_HOURS",
            ConstantKey::MinWage => "MIN_WAGE",
            ConstantKey::SpouseDeduction => "SPOUSE_DEDUCTION",
            ConstantKey::PerChildDeduction => "PER_CHILD_DEDUCTION",
            ConstantKey::MaxChildren => "MAX_CHILDREN",
            ConstantKey::ProfAbatementRate => "PROF_ABATEMENT_RATE",
            ConstantKey::ProfAbatementCap => "PROF_ABATEMENT_CAP",
            ConstantKey::StipendExemptionCap => "STIPEND_EXEMPTION_CAP",
            ConstantKey::MaxCarryOver => "MAX_CARRY_OVER",
            ConstantKey::DaysPerMonth => "DAYS_PER_MONTH",
            ConstantKey::FxRate(code) => return write!(f, "FX_RATE_{code}"),
        };
        f.write_str(s)
    }
}

impl FromStr for ConstantKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s {
            "SOC_FLOOR" => ConstantKey::SocFloor,
            "SOC_CEILING" => ConstantKey::SocCeiling,
            "SOC_RATE_EMPLOYEE" => ConstantKey::SocRateEmployee,
            "SOC_RATE_EMPLOYER" => ConstantKey::SocRateEmployer,
            "VF_RATE" => ConstantKey::VfRate,
            "TA_RATE" => ConstantKey::TaRate,
            "OVERTIME_MULTIPLIER" => ConstantKey::OvertimeMultiplier,
            "OVERTIME_MULTIPLIER_T2" => ConstantKey::OvertimeMultiplierT2,
            "OVERTIME_MULTIPLIER_NIGHT" => ConstantKey::OvertimeMultiplierNight,
            "MONTHLY_HOURS" => ConstantKey::MonthlyHours,
            "MIN_WAGE" => ConstantKey::MinWage,
            "SPOUSE_DEDUCTION" => ConstantKey::SpouseDeduction,
            "PER_CHILD_DEDUCTION" => ConstantKey::PerChildDeduction,
            "MAX_CHILDREN" => ConstantKey::MaxChildren,
            "PROF_ABATEMENT_RATE" => ConstantKey::ProfAbatementRate,
            "PROF_ABATEMENT_CAP" => ConstantKey::ProfAbatementCap,
            "STIPEND_EXEMPTION_CAP" => ConstantKey::StipendExemptionCap,
            "MAX_CARRY_OVER" => ConstantKey::MaxCarryOver,
            "DAYS_PER_MONTH" => ConstantKey::DaysPerMonth,
            other => match other.strip_prefix("FX_RATE_") {
                Some(code) if !code.is_empty() => ConstantKey::FxRate(code.to_string()),
                _ => return Err(format!("unknown constant key '{other}'")),
            },
        };
        Ok(key)
    }
}

impl TryFrom<String> for ConstantKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ConstantKey> for String {
    fn from(key: ConstantKey) -> Self {
        key.to_string()
    }
}
