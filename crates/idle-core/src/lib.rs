#![deny(warnings)]

//! Core domain models for Compiler Idle.
//!
//! This crate defines the arbitrary-precision [`Decimal`] used for every game
//! value, the resource ledger, upgrade definitions with catalog validation,
//! and the persistent prestige/settings/statistics records.

pub mod decimal;
pub mod resources;
pub mod state;
pub mod upgrades;

pub use decimal::{Decimal, DecimalError};
pub use resources::{LedgerError, ResourceKind, ResourceLedger};
pub use state::{BulkBuy, GameSettings, GameStatistics, InvalidBulkQuantity, PrestigeState};
pub use upgrades::{
    default_catalog, validate_definition, validate_prestige_definition, Catalog,
    PrestigeUpgradeDefinition, UpgradeDefinition, UpgradeId, UpgradeKind, UpgradeState,
    ValidationError,
};

/// Exact base-10 configuration constant (growth rates, efficiencies,
/// multipliers). Converted losslessly into [`Decimal`] before use.
pub type Rate = rust_decimal::Decimal;

/// Stage-3 unlocks once this many AST nodes are held.
pub const STAGE3_UNLOCK_AST_NODES: u64 = 1000;

/// Convert a configuration rate into a game value.
pub fn rate(r: Rate) -> Decimal {
    Decimal::from(r)
}
