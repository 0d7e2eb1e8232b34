//! Prestige gain and the economy half of a prestige reset.

use crate::EconError;
use idle_core::{Decimal, PrestigeState, ResourceKind, ResourceLedger, UpgradeState};
use serde::Serialize;
use tracing::info;

/// Weighted total is divided by this before taking the square root.
pub const PRESTIGE_DIVISOR: u64 = 1000;

/// `tokens + astNodes*10 + generatedCode*100 + optimizedCode*1000`.
pub fn weighted_total(ledger: &ResourceLedger) -> Decimal {
    ledger.get(ResourceKind::Tokens)
        + &(ledger.get(ResourceKind::AstNodes) * &Decimal::from(10u32))
        + (ledger.get(ResourceKind::GeneratedCode) * &Decimal::from(100u32))
        + (ledger.get(ResourceKind::OptimizedCode) * &Decimal::from(1000u32))
}

/// `floor(sqrt(weighted_total / 1000))`, zero below a weighted total of 1000.
pub fn prestige_gain(ledger: &ResourceLedger) -> Decimal {
    let total = weighted_total(ledger);
    if total < PRESTIGE_DIVISOR {
        return Decimal::zero();
    }
    (total / Decimal::from(PRESTIGE_DIVISOR))
        .pow(&Decimal::new(5, 1))
        .map(|root| root.floor())
        .unwrap_or_default()
}

/// Smallest weighted total yielding `gain` points.
pub fn weighted_total_for_gain(gain: u64) -> Decimal {
    Decimal::from(PRESTIGE_DIVISOR) * Decimal::from(gain).powi(2)
}

/// What a reset handed out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PrestigeOutcome {
    pub gain: Decimal,
    pub new_level: u64,
    pub compiler_points: Decimal,
}

/// Reset the run-scoped economy and award compiler points.
///
/// Fails without touching anything when the gain would be zero. Stage-3
/// retention is the caller's job.
pub fn reset_run(
    ledger: &mut ResourceLedger,
    upgrades: &mut UpgradeState,
    prestige: &mut PrestigeState,
) -> Result<PrestigeOutcome, EconError> {
    let gain = prestige_gain(ledger);
    if !gain.is_positive() {
        return Err(EconError::PrestigeNotAvailable {
            weighted_total: weighted_total(ledger),
        });
    }
    ledger.credit(ResourceKind::CompilerPoints, &gain)?;
    prestige.level += 1;
    prestige.total_resets += 1;
    ledger.reset_run();
    upgrades.reset();
    let compiler_points = ledger.get(ResourceKind::CompilerPoints).clone();
    info!(%gain, level = prestige.level, %compiler_points, "prestige reset");
    Ok(PrestigeOutcome {
        gain,
        new_level: prestige.level,
        compiler_points,
    })
}
