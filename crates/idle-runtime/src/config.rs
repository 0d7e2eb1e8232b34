//! Engine configuration.

use idle_core::{Catalog, ValidationError};
use serde::{Deserialize, Serialize};

/// Seconds per step when replaying offline time.
pub const DEFAULT_OFFLINE_STEP_SECONDS: u64 = 10;
/// Offline time beyond this is discarded (8 hours).
pub const DEFAULT_OFFLINE_CAP_SECONDS: u64 = 8 * 60 * 60;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub catalog: Catalog,
    /// Seed of the snippet deck used by the manual analysis action.
    pub snippet_seed: u64,
    pub offline_step_seconds: u64,
    pub offline_cap_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catalog: Catalog::default(),
            snippet_seed: 42,
            offline_step_seconds: DEFAULT_OFFLINE_STEP_SECONDS,
            offline_cap_seconds: DEFAULT_OFFLINE_CAP_SECONDS,
        }
    }
}

impl EngineConfig {
    /// Parse a YAML config. Omitted keys keep their defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, ValidationError> {
        let cfg: EngineConfig =
            serde_yaml::from_str(text).map_err(|e| ValidationError::Malformed(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.offline_step_seconds == 0 {
            return Err(ValidationError::Malformed(
                "offlineStepSeconds must be positive".to_string(),
            ));
        }
        self.catalog.validate()
    }
}
