//! Response handling strategy of a version.

use serde::{Deserialize, Serialize};

use crate::error::TreatyError;

/// Whether executor output is passed through or adapted to the response schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Executor output is returned verbatim; the response schema is not applied.
    Direct,
    /// Executor output is always validated and transformed by the response schema.
    #[default]
    Adapter,
}

impl Strategy {
    pub const CODES: &'static [&'static str] = &["direct", "adapter"];

    /// Parse a strategy code.
    ///
    /// # Errors
    ///
    /// Returns `TreatyError::Schema` for codes other than `direct` and `adapter`.
    pub fn parse(code: &str) -> Result<Self, TreatyError> {
        match code {
            "direct" => Ok(Strategy::Direct),
            "adapter" => Ok(Strategy::Adapter),
            other => Err(TreatyError::schema(format!(
                "Unknown strategy '{}'. Expected one of: {}",
                other,
                Self::CODES.join(", ")
            ))),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Strategy::Direct => "direct",
            Strategy::Adapter => "adapter",
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, Strategy::Direct)
    }

    pub fn is_adapter(&self) -> bool {
        matches!(self, Strategy::Adapter)
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
