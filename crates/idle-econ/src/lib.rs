#![deny(warnings)]

//! Economy of Compiler Idle: costs, purchases, production and prestige.
//!
//! This crate provides validated utilities for:
//! - The exponential cost law and exact, budget-bounded bulk-cost summation
//! - Visibility gating and atomic (bulk) purchases
//! - Per-tick production of generators and converters with multipliers
//! - Prestige gain and the stage 1/2 part of a prestige reset

pub mod cost;
pub mod prestige;
pub mod production;
pub mod purchase;

pub use cost::{
    affordable_bulk_cost, bulk_cost, cost_at_level, exponential_bulk_cost, exponential_cost,
    max_affordable,
};
pub use prestige::{
    prestige_gain, reset_run, weighted_total, weighted_total_for_gain, PrestigeOutcome,
    PRESTIGE_DIVISOR,
};
pub use production::{
    apply_production, manual_multiplier, prestige_multiplier, production_rates, ProductionPlan,
    TickDelta,
};
pub use purchase::{
    can_purchase, is_visible, purchase, purchase_prestige_upgrade, PurchaseReceipt,
};

use idle_core::{Decimal, LedgerError, ResourceKind, UpgradeId};
use thiserror::Error;

/// Errors produced by economic operations. None of them leave partial state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EconError {
    /// No upgrade with this id exists in the catalog.
    #[error("unknown upgrade: {0}")]
    UnknownUpgrade(UpgradeId),
    /// The upgrade's unlock threshold has not been reached.
    #[error("upgrade {0} is not visible yet")]
    ItemNotVisible(UpgradeId),
    /// Balance too small for the requested purchase.
    #[error("insufficient {resource}: required {required}, available {available}")]
    InsufficientResources {
        resource: ResourceKind,
        required: Decimal,
        available: Decimal,
    },
    /// Quantity must be at least one.
    #[error("invalid purchase quantity: {0}")]
    InvalidQuantity(u64),
    /// A reset would grant no compiler points.
    #[error("prestige not available: weighted total {weighted_total} is below threshold")]
    PrestigeNotAvailable { weighted_total: Decimal },
    /// Any other ledger rejection.
    #[error(transparent)]
    Ledger(LedgerError),
}

impl From<LedgerError> for EconError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientResources {
                resource,
                required,
                available,
            } => EconError::InsufficientResources {
                resource,
                required,
                available,
            },
            other => EconError::Ledger(other),
        }
    }
}
