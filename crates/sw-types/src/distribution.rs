use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every distribution name a sweep parameter may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    Constant,
    Categorical,
    CategoricalWProbabilities,
    IntUniform,
    Uniform,
    QUniform,
    LogUniform,
    LogUniformValues,
    InvLogUniform,
    InvLogUniformValues,
    QLogUniform,
    QLogUniformValues,
    Normal,
    QNormal,
    LogNormal,
    QLogNormal,
    Beta,
    QBeta,
}

impl Distribution {
    pub const ALL: [Distribution; 18] = [
        Self::Constant,
        Self::Categorical,
        Self::CategoricalWProbabilities,
        Self::IntUniform,
        Self::Uniform,
        Self::QUniform,
        Self::LogUniform,
        Self::LogUniformValues,
        Self::InvLogUniform,
        Self::InvLogUniformValues,
        Self::QLogUniform,
        Self::QLogUniformValues,
        Self::Normal,
        Self::QNormal,
        Self::LogNormal,
        Self::QLogNormal,
        Self::Beta,
        Self::QBeta,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Categorical => "categorical",
            Self::CategoricalWProbabilities => "categorical_w_probabilities",
            Self::IntUniform => "int_uniform",
            Self::Uniform => "uniform",
            Self::QUniform => "q_uniform",
            Self::LogUniform => "log_uniform",
            Self::LogUniformValues => "log_uniform_values",
            Self::InvLogUniform => "inv_log_uniform",
            Self::InvLogUniformValues => "inv_log_uniform_values",
            Self::QLogUniform => "q_log_uniform",
            Self::QLogUniformValues => "q_log_uniform_values",
            Self::Normal => "normal",
            Self::QNormal => "q_normal",
            Self::LogNormal => "log_normal",
            Self::QLogNormal => "q_log_normal",
            Self::Beta => "beta",
            Self::QBeta => "q_beta",
        }
    }

    /// Distributions declared with `min`/`max` bounds.
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            Self::IntUniform
                | Self::Uniform
                | Self::QUniform
                | Self::LogUniform
                | Self::LogUniformValues
                | Self::InvLogUniform
                | Self::InvLogUniformValues
                | Self::QLogUniform
                | Self::QLogUniformValues
        )
    }

    /// Distributions declared with `mu`/`sigma`.
    pub fn is_normal(&self) -> bool {
        matches!(
            self,
            Self::Normal | Self::QNormal | Self::LogNormal | Self::QLogNormal
        )
    }

    /// Distributions declared with `a`/`b`.
    pub fn is_beta(&self) -> bool {
        matches!(self, Self::Beta | Self::QBeta)
    }

    /// Only finite, explicitly enumerated kinds can be laid out on a grid.
    pub fn is_grid_compatible(&self) -> bool {
        matches!(self, Self::Constant | Self::Categorical)
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Distribution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("unknown distribution {s:?}"))
    }
}
