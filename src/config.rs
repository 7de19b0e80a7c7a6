use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{PaymentsError, Result};
use crate::schedule::{MAX_INSTALLMENTS, RemainderPolicy};

/// Tunables for allocation and validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Installment count used when a project does not name one.
    #[serde(default = "EngineConfig::default_installment_count_value")]
    pub default_installment_count: u32,
    /// Upper bound on installment counts, at most [`MAX_INSTALLMENTS`].
    #[serde(default = "EngineConfig::default_max_installment_count")]
    pub max_installment_count: u32,
    /// Where the cents that do not divide evenly are placed.
    #[serde(default)]
    pub remainder_policy: RemainderPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_installment_count: Self::default_installment_count_value(),
            max_installment_count: Self::default_max_installment_count(),
            remainder_policy: RemainderPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn default_installment_count_value() -> u32 {
        12
    }

    pub fn default_max_installment_count() -> u32 {
        MAX_INSTALLMENTS
    }

    /// Parses a JSON document; missing fields fall back to their defaults.
    pub fn from_json_str(data: &str) -> anyhow::Result<Self> {
        let config: Self =
            serde_json::from_str(data).context("failed to parse engine configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration from a JSON file, or the defaults when it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read engine configuration at {}", path.display()))?;
        Self::from_json_str(&data)
    }

    /// The maximum may narrow the allowed installment range but never widen it past
    /// [`MAX_INSTALLMENTS`].
    pub fn validate(&self) -> Result<()> {
        if self.max_installment_count == 0 || self.max_installment_count > MAX_INSTALLMENTS {
            return Err(PaymentsError::InvalidInstallmentCount {
                count: self.max_installment_count,
                max: MAX_INSTALLMENTS,
            });
        }
        self.check_installment_count(self.default_installment_count)
    }

    pub(crate) fn check_installment_count(&self, count: u32) -> Result<()> {
        let max = self.max_installment_count.min(MAX_INSTALLMENTS);
        if count == 0 || count > max {
            return Err(PaymentsError::InvalidInstallmentCount { count, max });
        }
        Ok(())
    }
}
