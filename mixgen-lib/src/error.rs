use std::fmt::{Display, Formatter};

use crate::variable::Variable;

/// Error type for parameter validation, mixture rendering, and persistence.
#[derive(Debug)]
pub enum MixgenError {
    /// A value has the wrong type or capability for its option.
    Type(String),
    /// Azimuth/elevation matrices do not match the interferer layout.
    Shape(String),
    /// Malformed option list or an unknown combine mode.
    Configuration(String),
    /// Row combination was requested but non-trivial row counts differ.
    UnequalRows(Vec<(Variable, usize)>),
    /// The mixture collaborator refused to build a mixture.
    Render(String),
    Io(std::io::Error),
    Decode(symphonia::core::errors::Error),
    Wav(hound::Error),
    Json(serde_json::Error),
}

impl Display for MixgenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Type(err) => write!(f, "type error: {}", err),
            Self::Shape(err) => write!(f, "shape error: {}", err),
            Self::Configuration(err) => write!(f, "configuration error: {}", err),
            Self::UnequalRows(counts) => {
                let counts = counts
                    .iter()
                    .map(|(variable, count)| format!("{}={}", variable.name(), count))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "variables must have equal row counts for row-combination (got {})",
                    counts
                )
            }
            Self::Render(err) => write!(f, "render error: {}", err),
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::Decode(err) => write!(f, "decode error: {}", err),
            Self::Wav(err) => write!(f, "wav error: {}", err),
            Self::Json(err) => write!(f, "json error: {}", err),
        }
    }
}

impl std::error::Error for MixgenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::Wav(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MixgenError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<symphonia::core::errors::Error> for MixgenError {
    fn from(value: symphonia::core::errors::Error) -> Self {
        Self::Decode(value)
    }
}

impl From<hound::Error> for MixgenError {
    fn from(value: hound::Error) -> Self {
        Self::Wav(value)
    }
}

impl From<serde_json::Error> for MixgenError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, MixgenError>;
