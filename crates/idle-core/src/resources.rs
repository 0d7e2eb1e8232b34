//! Resource kinds and the mutable ledger holding their balances.

use crate::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Every resource tracked by the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    /// Produced by manual analysis and token generators.
    Tokens,
    /// Produced by parsers from tokens.
    AstNodes,
    /// Output of the Stage-3 code generator.
    GeneratedCode,
    /// Output of the Stage-3 optimizer.
    OptimizedCode,
    /// Prestige currency; survives resets.
    CompilerPoints,
}

impl ResourceKind {
    /// All kinds in canonical order.
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Tokens,
        ResourceKind::AstNodes,
        ResourceKind::GeneratedCode,
        ResourceKind::OptimizedCode,
        ResourceKind::CompilerPoints,
    ];

    /// Resources wiped by a prestige reset.
    pub const RUN_SCOPED: [ResourceKind; 4] = [
        ResourceKind::Tokens,
        ResourceKind::AstNodes,
        ResourceKind::GeneratedCode,
        ResourceKind::OptimizedCode,
    ];

    /// Stable key used in save files and snapshots.
    pub fn key(self) -> &'static str {
        match self {
            ResourceKind::Tokens => "tokens",
            ResourceKind::AstNodes => "astNodes",
            ResourceKind::GeneratedCode => "generatedCode",
            ResourceKind::OptimizedCode => "optimizedCode",
            ResourceKind::CompilerPoints => "compilerPoints",
        }
    }

    /// Inverse of [`ResourceKind::key`].
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Ledger errors. Subtraction never clamps; callers see the shortfall.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A debit exceeded the available balance.
    #[error("insufficient {resource}: required {required}, available {available}")]
    InsufficientResources {
        resource: ResourceKind,
        required: Decimal,
        available: Decimal,
    },
    /// Credits and debits must be non-negative amounts.
    #[error("negative amount {amount} for {resource}")]
    NegativeAmount {
        resource: ResourceKind,
        amount: Decimal,
    },
}

/// Non-negative balance per resource kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLedger {
    balances: BTreeMap<ResourceKind, Decimal>,
}

impl Default for ResourceLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceLedger {
    /// A ledger with every resource at zero.
    pub fn new() -> Self {
        Self {
            balances: ResourceKind::ALL
                .into_iter()
                .map(|k| (k, Decimal::zero()))
                .collect(),
        }
    }

    /// Current balance of `kind`.
    pub fn get(&self, kind: ResourceKind) -> &Decimal {
        static ZERO: OnceLock<Decimal> = OnceLock::new();
        self.balances
            .get(&kind)
            .unwrap_or_else(|| ZERO.get_or_init(Decimal::zero))
    }

    /// True when the balance of `kind` is at least `amount`.
    pub fn has(&self, kind: ResourceKind, amount: &Decimal) -> bool {
        self.get(kind) >= amount
    }

    /// Add a non-negative amount.
    pub fn credit(&mut self, kind: ResourceKind, amount: &Decimal) -> Result<(), LedgerError> {
        if amount.is_negative() {
            return Err(LedgerError::NegativeAmount {
                resource: kind,
                amount: amount.clone(),
            });
        }
        *self.slot(kind) += amount;
        Ok(())
    }

    /// Remove `amount`, rejecting the call when the balance is too small.
    pub fn debit(&mut self, kind: ResourceKind, amount: &Decimal) -> Result<(), LedgerError> {
        if amount.is_negative() {
            return Err(LedgerError::NegativeAmount {
                resource: kind,
                amount: amount.clone(),
            });
        }
        let available = self.get(kind);
        if available < amount {
            return Err(LedgerError::InsufficientResources {
                resource: kind,
                required: amount.clone(),
                available: available.clone(),
            });
        }
        *self.slot(kind) -= amount;
        Ok(())
    }

    /// Remove up to `amount`, stopping at zero. Returns what was removed.
    pub fn drain_clamped(&mut self, kind: ResourceKind, amount: &Decimal) -> Decimal {
        if !amount.is_positive() {
            return Decimal::zero();
        }
        let slot = self.slot(kind);
        let drained = if &*slot < amount {
            slot.clone()
        } else {
            amount.clone()
        };
        *slot -= &drained;
        drained
    }

    /// Overwrite a balance; negative values are clamped to zero.
    pub fn set(&mut self, kind: ResourceKind, amount: Decimal) {
        let value = if amount.is_negative() {
            Decimal::zero()
        } else {
            amount
        };
        *self.slot(kind) = value;
    }

    /// Zero the run-scoped resources, keeping compiler points.
    pub fn reset_run(&mut self) {
        for kind in ResourceKind::RUN_SCOPED {
            *self.slot(kind) = Decimal::zero();
        }
    }

    /// Iterate balances in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, &Decimal)> {
        self.balances.iter().map(|(k, v)| (*k, v))
    }

    fn slot(&mut self, kind: ResourceKind) -> &mut Decimal {
        self.balances.entry(kind).or_default()
    }
}
