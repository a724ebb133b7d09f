use serde::Deserialize;

use crate::error::ReconError;

/// Matching parameters. Unsigned tolerance: a negative window cannot be expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct MatchConfig {
    /// Maximum |submitted - recorded| act timestamp gap, in minutes (inclusive).
    #[serde(default)]
    pub date_tolerance_minutes: u32,
}

impl MatchConfig {
    pub fn with_tolerance(date_tolerance_minutes: u32) -> Self {
        Self { date_tolerance_minutes }
    }

    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))
    }

    pub(crate) fn tolerance_seconds(&self) -> i64 {
        i64::from(self.date_tolerance_minutes) * 60
    }
}
