//! Transformation modes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::PolishError;

/// The kind of transformation applied to the input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolishMode {
    /// Fix grammar, spelling and clarity in the same language.
    #[default]
    Improve,
    /// Reword with different vocabulary and structure.
    Rephrase,
    /// Translate between Chinese and English.
    Translate,
}

impl PolishMode {
    /// All modes, in display order.
    pub const ALL: [PolishMode; 3] = [PolishMode::Improve, PolishMode::Rephrase, PolishMode::Translate];

    /// Wire name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            PolishMode::Improve => "improve",
            PolishMode::Rephrase => "rephrase",
            PolishMode::Translate => "translate",
        }
    }
}

impl fmt::Display for PolishMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolishMode {
    type Err = PolishError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "improve" => Ok(PolishMode::Improve),
            "rephrase" => Ok(PolishMode::Rephrase),
            "translate" => Ok(PolishMode::Translate),
            other => Err(PolishError::validation(format!("Unknown mode: {}", other))),
        }
    }
}
