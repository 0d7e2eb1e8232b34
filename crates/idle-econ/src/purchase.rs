//! Visibility gating and atomic purchases.

use crate::cost::{affordable_bulk_cost, exponential_cost, max_affordable};
use crate::EconError;
use idle_core::{
    Decimal, PrestigeState, PrestigeUpgradeDefinition, ResourceKind, ResourceLedger,
    UpgradeDefinition, UpgradeId, UpgradeState,
};
use serde::Serialize;
use tracing::info;

/// Outcome of a successful purchase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PurchaseReceipt {
    pub id: UpgradeId,
    pub quantity: u64,
    pub cost: Decimal,
    pub resource: ResourceKind,
    pub new_level: u64,
}

/// True when `def` has no unlock threshold or its reference resource has
/// reached it.
pub fn is_visible(def: &UpgradeDefinition, ledger: &ResourceLedger) -> bool {
    match &def.unlock_threshold {
        None => true,
        Some(threshold) => ledger.has(def.reference_resource(), threshold),
    }
}

/// True when `quantity` levels of `def` are visible and affordable.
pub fn can_purchase(
    def: &UpgradeDefinition,
    state: &UpgradeState,
    ledger: &ResourceLedger,
    quantity: u64,
) -> bool {
    quantity > 0
        && is_visible(def, ledger)
        && max_affordable(def, state.level(&def.id), ledger.get(def.cost_resource), quantity)
            == quantity
}

/// Buy `quantity` levels of `def`, debiting the summed cost.
///
/// Either the whole purchase applies or nothing changes. Pricing stops at the
/// first level the balance cannot cover, so an oversized quantity fails fast;
/// the reported `required` is the running total at that level.
pub fn purchase(
    def: &UpgradeDefinition,
    state: &mut UpgradeState,
    ledger: &mut ResourceLedger,
    quantity: u64,
) -> Result<PurchaseReceipt, EconError> {
    if quantity == 0 {
        return Err(EconError::InvalidQuantity(quantity));
    }
    if !is_visible(def, ledger) {
        return Err(EconError::ItemNotVisible(def.id.clone()));
    }
    let current = state.level(&def.id);
    let available = ledger.get(def.cost_resource);
    let cost = affordable_bulk_cost(def, current, quantity, available).map_err(|required| {
        EconError::InsufficientResources {
            resource: def.cost_resource,
            required,
            available: available.clone(),
        }
    })?;
    ledger.debit(def.cost_resource, &cost)?;
    state.increment(&def.id, quantity);
    let new_level = state.level(&def.id);
    info!(id = %def.id, quantity, %cost, new_level, "upgrade purchased");
    Ok(PurchaseReceipt {
        id: def.id.clone(),
        quantity,
        cost,
        resource: def.cost_resource,
        new_level,
    })
}

/// Buy one level of a prestige upgrade with compiler points.
pub fn purchase_prestige_upgrade(
    def: &PrestigeUpgradeDefinition,
    prestige: &mut PrestigeState,
    ledger: &mut ResourceLedger,
) -> Result<PurchaseReceipt, EconError> {
    let current = prestige.upgrade_level(&def.id);
    let cost = exponential_cost(&def.base_cost, def.growth_rate, current);
    ledger.debit(ResourceKind::CompilerPoints, &cost)?;
    let new_level = current + 1;
    prestige.upgrades.insert(def.id.clone(), new_level);
    info!(id = %def.id, %cost, new_level, "prestige upgrade purchased");
    Ok(PurchaseReceipt {
        id: def.id.clone(),
        quantity: 1,
        cost,
        resource: ResourceKind::CompilerPoints,
        new_level,
    })
}
