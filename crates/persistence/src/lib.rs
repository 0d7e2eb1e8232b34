#![deny(warnings)]

//! Persistence layer: the versioned save file and its JSON and binary codecs.
//!
//! Every game value is written as a base-10 string. JSON loads are tolerant:
//! unknown keys are ignored and missing keys fall back to defaults, while data
//! of the wrong shape is rejected as [`SaveError::InvalidSaveData`]. The codec
//! never touches storage; hosts decide where the bytes go.

use chrono::{DateTime, Utc};
use idle_core::{
    Decimal, GameSettings, GameStatistics, PrestigeState, ResourceKind, ResourceLedger,
    UpgradeState,
};
use idle_pipeline::Stage3;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Written into every save.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Leading bytes of a binary save.
pub const BINARY_MAGIC: &[u8; 4] = b"CIDL";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SaveError {
    #[error("invalid save data: {0}")]
    InvalidSaveData(String),
    #[error("failed to encode save: {0}")]
    Encode(String),
}

/// Everything needed to restore a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFile {
    pub version: String,
    pub saved_at: DateTime<Utc>,
    /// Keyed by resource name (`tokens`, `astNodes`, ...).
    pub resources: BTreeMap<String, Decimal>,
    pub upgrades: UpgradeState,
    pub prestige: PrestigeState,
    pub stage3: Stage3,
    pub settings: GameSettings,
    pub statistics: GameStatistics,
}

impl Default for SaveFile {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            saved_at: Utc::now(),
            resources: BTreeMap::new(),
            upgrades: UpgradeState::default(),
            prestige: PrestigeState::default(),
            stage3: Stage3::default(),
            settings: GameSettings::default(),
            statistics: GameStatistics::default(),
        }
    }
}

impl SaveFile {
    pub fn resources_from_ledger(ledger: &ResourceLedger) -> BTreeMap<String, Decimal> {
        ledger
            .iter()
            .map(|(kind, amount)| (kind.key().to_string(), amount.clone()))
            .collect()
    }

    /// Rebuild the ledger. Unknown resource names are skipped; negative
    /// amounts are rejected.
    pub fn ledger(&self) -> Result<ResourceLedger, SaveError> {
        let mut ledger = ResourceLedger::new();
        for (key, amount) in &self.resources {
            let Some(kind) = ResourceKind::from_key(key) else {
                debug!(key = key.as_str(), "ignoring unknown resource in save");
                continue;
            };
            if amount.is_negative() {
                return Err(SaveError::InvalidSaveData(format!(
                    "resource {kind} is negative: {amount}"
                )));
            }
            ledger.set(kind, amount.clone());
        }
        Ok(ledger)
    }

    /// Enforce the invariants a running game relies on: non-negative
    /// balances and statistics, and Stage-3 within its bounds. An
    /// over-long deployment history is trimmed to its newest entries.
    pub fn validated(mut self) -> Result<Self, SaveError> {
        self.ledger()?;
        let stats = &self.statistics;
        for (what, value) in [
            ("lifetime tokens", &stats.lifetime_tokens),
            ("simulated seconds", &stats.simulated_seconds),
            ("best prestige gain", &stats.best_prestige_gain),
        ] {
            if value.is_negative() {
                return Err(SaveError::InvalidSaveData(format!("{what} is negative: {value}")));
            }
        }
        self.stage3
            .validate_restored()
            .map_err(|e| SaveError::InvalidSaveData(e.to_string()))?;
        Ok(self)
    }
}

pub fn to_json(save: &SaveFile) -> Result<String, SaveError> {
    serde_json::to_string_pretty(save).map_err(|e| SaveError::Encode(e.to_string()))
}

fn field<T: DeserializeOwned + Default>(obj: &Map<String, Value>, key: &str) -> Result<T, SaveError> {
    match obj.get(key) {
        None | Some(Value::Null) => {
            debug!(key, "save field missing, using default");
            Ok(T::default())
        }
        Some(v) => T::deserialize(v).map_err(|e| SaveError::InvalidSaveData(format!("{key}: {e}"))),
    }
}

/// Parse a JSON save.
pub fn from_json(text: &str) -> Result<SaveFile, SaveError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| SaveError::InvalidSaveData(e.to_string()))?;
    let Value::Object(obj) = value else {
        return Err(SaveError::InvalidSaveData("top level is not an object".to_string()));
    };

    let mut version: String = field(&obj, "version")?;
    if version.is_empty() {
        version = SCHEMA_VERSION.to_string();
    } else if version != SCHEMA_VERSION {
        warn!(found = version.as_str(), expected = SCHEMA_VERSION, "loading save from another schema version");
    }

    let save = SaveFile {
        version,
        saved_at: field::<Option<DateTime<Utc>>>(&obj, "savedAt")?.unwrap_or_else(Utc::now),
        resources: field(&obj, "resources")?,
        upgrades: field(&obj, "upgrades")?,
        prestige: field(&obj, "prestige")?,
        stage3: field(&obj, "stage3")?,
        settings: field(&obj, "settings")?,
        statistics: field(&obj, "statistics")?,
    };
    save.validated()
}

/// Encode as [`BINARY_MAGIC`] followed by a bincode payload.
pub fn to_binary(save: &SaveFile) -> Result<Vec<u8>, SaveError> {
    let payload = bincode::serialize(save).map_err(|e| SaveError::Encode(e.to_string()))?;
    let mut out = Vec::with_capacity(BINARY_MAGIC.len() + payload.len());
    out.extend_from_slice(BINARY_MAGIC);
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decode a binary save. Unlike JSON, the binary layout is strict.
pub fn from_binary(bytes: &[u8]) -> Result<SaveFile, SaveError> {
    let payload = bytes
        .strip_prefix(BINARY_MAGIC.as_slice())
        .ok_or_else(|| SaveError::InvalidSaveData("missing binary save header".to_string()))?;
    let save: SaveFile =
        bincode::deserialize(payload).map_err(|e| SaveError::InvalidSaveData(e.to_string()))?;
    save.validated()
}

/// Sniff the format from the leading bytes.
pub fn decode(bytes: &[u8]) -> Result<SaveFile, SaveError> {
    if bytes.starts_with(BINARY_MAGIC) {
        return from_binary(bytes);
    }
    let text = std::str::from_utf8(bytes).map_err(|e| SaveError::InvalidSaveData(e.to_string()))?;
    from_json(text)
}
