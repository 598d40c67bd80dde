//! Problem kinds and their names.

use std::fmt;
use std::str::FromStr;

use super::ConfigError;

/// Problem family of a fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum ProblemKind {
    #[default]
    Classification,
    Regression,
    OrdinalRegression,
    LupiClassification,
    LupiRegression,
    LupiOrdinalRegression,
}

impl ProblemKind {
    /// Accepted names, canonical name first in each group.
    pub const VALID_NAMES: &'static str = "classification|class, regression|reg, \
        ordinalregression|ordreg, lupi_classification|lupi_class, \
        lupi_regression|lupi_reg, lupi_ordinalregression|lupi_ordreg";

    /// Whether the last columns are privileged features.
    pub fn is_lupi(self) -> bool {
        matches!(
            self,
            ProblemKind::LupiClassification
                | ProblemKind::LupiRegression
                | ProblemKind::LupiOrdinalRegression
        )
    }

    /// The non-LUPI family with the same targets.
    pub fn base(self) -> ProblemKind {
        match self {
            ProblemKind::LupiClassification => ProblemKind::Classification,
            ProblemKind::LupiRegression => ProblemKind::Regression,
            ProblemKind::LupiOrdinalRegression => ProblemKind::OrdinalRegression,
            other => other,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ProblemKind::Classification => "classification",
            ProblemKind::Regression => "regression",
            ProblemKind::OrdinalRegression => "ordinalregression",
            ProblemKind::LupiClassification => "lupi_classification",
            ProblemKind::LupiRegression => "lupi_regression",
            ProblemKind::LupiOrdinalRegression => "lupi_ordinalregression",
        }
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProblemKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classification" | "class" => Ok(ProblemKind::Classification),
            "regression" | "reg" => Ok(ProblemKind::Regression),
            "ordinalregression" | "ordreg" => Ok(ProblemKind::OrdinalRegression),
            "lupi_classification" | "lupi_class" => Ok(ProblemKind::LupiClassification),
            "lupi_regression" | "lupi_reg" => Ok(ProblemKind::LupiRegression),
            "lupi_ordinalregression" | "lupi_ordreg" => Ok(ProblemKind::LupiOrdinalRegression),
            _ => Err(ConfigError::UnknownProblem {
                name: s.to_string(),
                valid: Self::VALID_NAMES,
            }),
        }
    }
}
