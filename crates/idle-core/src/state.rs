//! Prestige progress, operational settings, and lifetime statistics.

use crate::{Decimal, UpgradeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Progress that survives prestige resets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrestigeState {
    /// Incremented by exactly one per reset.
    pub level: u64,
    /// Incremented by exactly one per reset.
    pub total_resets: u64,
    /// Owned levels of prestige upgrades.
    pub upgrades: BTreeMap<UpgradeId, u64>,
}

impl PrestigeState {
    /// Owned level of a prestige upgrade.
    pub fn upgrade_level(&self, id: &UpgradeId) -> u64 {
        self.upgrades.get(id).copied().unwrap_or(0)
    }
}

/// Quantity bought per click.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BulkBuy {
    #[default]
    One,
    Ten,
    Hundred,
}

/// Bulk quantity outside {1, 10, 100}.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("bulk quantity must be 1, 10 or 100, got {0}")]
pub struct InvalidBulkQuantity(pub u32);

impl BulkBuy {
    pub fn quantity(self) -> u64 {
        match self {
            BulkBuy::One => 1,
            BulkBuy::Ten => 10,
            BulkBuy::Hundred => 100,
        }
    }
}

impl From<BulkBuy> for u32 {
    fn from(b: BulkBuy) -> u32 {
        b.quantity() as u32
    }
}

impl TryFrom<u32> for BulkBuy {
    type Error = InvalidBulkQuantity;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(BulkBuy::One),
            10 => Ok(BulkBuy::Ten),
            100 => Ok(BulkBuy::Hundred),
            other => Err(InvalidBulkQuantity(other)),
        }
    }
}

/// Operational settings. Only `bulk_buy` feeds the simulation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSettings {
    pub bulk_buy: BulkBuy,
    pub developer_mode_enabled: bool,
    pub session_start: DateTime<Utc>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            bulk_buy: BulkBuy::One,
            developer_mode_enabled: false,
            session_start: Utc::now(),
        }
    }
}

/// Lifetime counters; never reset by prestige.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameStatistics {
    pub total_ticks: u64,
    pub manual_analyses: u64,
    /// Every token ever credited, from any source.
    pub lifetime_tokens: Decimal,
    pub simulated_seconds: Decimal,
    pub best_prestige_gain: Decimal,
    pub deployments: u64,
}
