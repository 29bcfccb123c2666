//! Combination mode selection and iteration counting.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use log::debug;
use serde::Serialize;

use crate::error::{MixgenError, Result};
use crate::variable::{RowCounts, VARIABLE_COUNT};

/// Requested pairing policy for independent variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Combine {
    /// Pair row `m` of every variable with row `m` of the others.
    Rows,
    /// Take the full cross-product of every variable's rows.
    All,
}

impl FromStr for Combine {
    type Err = MixgenError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "rows" => Ok(Combine::Rows),
            "all" => Ok(Combine::All),
            _ => Err(MixgenError::Configuration(format!(
                "unknown combine mode \"{}\" (expected \"rows\" or \"all\")",
                value
            ))),
        }
    }
}

impl Display for Combine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Combine::Rows => write!(f, "rows"),
            Combine::All => write!(f, "all"),
        }
    }
}

/// Resolved combination, consumed by the index mapper and the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combination {
    /// Positional pairing. `rows` holds every variable's effective row count.
    Rows {
        iterations: usize,
        rows: [usize; VARIABLE_COUNT],
    },
    /// Cross-product over `dims`, first dimension fastest.
    All { dims: [usize; VARIABLE_COUNT] },
}

impl Combination {
    /// Pick the combination for the given row counts.
    ///
    /// Without an explicit mode, `rows` is chosen when all non-trivial row
    /// counts agree and `all` otherwise. An explicit `rows` request with
    /// differing counts fails with [`MixgenError::UnequalRows`].
    pub fn decide(counts: &RowCounts, requested: Option<Combine>) -> Result<Self> {
        let equal = counts.equal();
        let mode = requested.unwrap_or(if equal { Combine::Rows } else { Combine::All });

        let combination = match mode {
            Combine::Rows => {
                if !equal {
                    return Err(MixgenError::UnequalRows(counts.non_trivial_variables()));
                }
                Combination::Rows {
                    iterations: counts.common(),
                    rows: counts.clamped(),
                }
            }
            Combine::All => Combination::All {
                dims: counts.clamped(),
            },
        };

        debug!(
            "combine mode {} ({} iteration(s), requested {:?})",
            combination.mode(),
            combination.iteration_count(),
            requested
        );

        Ok(combination)
    }

    pub fn mode(&self) -> Combine {
        match self {
            Combination::Rows { .. } => Combine::Rows,
            Combination::All { .. } => Combine::All,
        }
    }

    /// Total number of mixtures this combination produces.
    pub fn iteration_count(&self) -> usize {
        match self {
            Combination::Rows { iterations, .. } => *iterations,
            Combination::All { dims } => dims.iter().map(|dim| (*dim).max(1)).product(),
        }
    }
}
