//! Passive production of generators and converters.

use idle_core::{
    rate, Catalog, Decimal, LedgerError, PrestigeState, ResourceKind, ResourceLedger,
    UpgradeKind, UpgradeState,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Global production multiplier from prestige.
///
/// `2^level * product(multiplier_per_level^owned)` over prestige upgrades.
/// The value is the same for every resource.
pub fn prestige_multiplier(
    catalog: &Catalog,
    prestige: &PrestigeState,
    _resource: ResourceKind,
) -> Decimal {
    let base = Decimal::from(2u32).powi(prestige.level);
    catalog
        .prestige_upgrades
        .iter()
        .map(|def| (def, prestige.upgrade_level(&def.id)))
        .filter(|(_, level)| *level > 0)
        .fold(base, |acc, (def, level)| {
            acc * rate(def.multiplier_per_level).powi(level)
        })
}

/// Multiplier on the manual analysis reward:
/// `(1 + sum(output * level of manual upgrades)) * prestige_multiplier`.
pub fn manual_multiplier(
    catalog: &Catalog,
    upgrades: &UpgradeState,
    prestige: &PrestigeState,
) -> Decimal {
    let bonus: Decimal = catalog
        .iter()
        .filter(|def| matches!(def.kind, UpgradeKind::Manual))
        .map(|def| &def.base_output_per_level * &Decimal::from(upgrades.level(&def.id)))
        .sum();
    (Decimal::one() + bonus) * prestige_multiplier(catalog, prestige, ResourceKind::Tokens)
}

/// Per-second production and consumption rates sampled from one ledger state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProductionPlan {
    pub produced: BTreeMap<ResourceKind, Decimal>,
    pub consumed: BTreeMap<ResourceKind, Decimal>,
}

impl ProductionPlan {
    /// Production rate of `kind`, zero if absent.
    pub fn produced(&self, kind: ResourceKind) -> Decimal {
        self.produced.get(&kind).cloned().unwrap_or_default()
    }

    /// Add `amount` per second of `kind`.
    pub fn add_produced(&mut self, kind: ResourceKind, amount: Decimal) {
        *self.produced.entry(kind).or_default() += amount;
    }

    fn add_consumed(&mut self, kind: ResourceKind, amount: Decimal) {
        *self.consumed.entry(kind).or_default() += amount;
    }
}

/// Compute per-second rates for the current state.
///
/// Generators yield `output * level * prestige_multiplier`. Converters yield
/// `output * level * stock` of their consumed resource (only while that stock
/// is positive) and drain it at `output * level` per second.
pub fn production_rates(
    catalog: &Catalog,
    upgrades: &UpgradeState,
    prestige: &PrestigeState,
    ledger: &ResourceLedger,
) -> ProductionPlan {
    let mut plan = ProductionPlan::default();
    for def in catalog.iter() {
        let level = upgrades.level(&def.id);
        if level == 0 {
            continue;
        }
        let per_level = &def.base_output_per_level * &Decimal::from(level);
        match &def.kind {
            UpgradeKind::Manual => {}
            UpgradeKind::Generator { produces } => {
                let mult = prestige_multiplier(catalog, prestige, *produces);
                plan.add_produced(*produces, &per_level * &mult);
            }
            UpgradeKind::Converter { consumes, produces } => {
                let stock = ledger.get(*consumes);
                if stock.is_positive() {
                    plan.add_produced(*produces, &per_level * stock);
                    plan.add_consumed(*consumes, per_level);
                }
            }
        }
    }
    plan
}

/// Amounts actually moved by [`apply_production`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TickDelta {
    pub produced: BTreeMap<ResourceKind, Decimal>,
    pub consumed: BTreeMap<ResourceKind, Decimal>,
}

/// Apply `plan` over `dt` seconds.
///
/// Consumption is drained first and clamped at zero; production is then
/// credited in full, since it was sampled from the stock at tick start.
/// Because of the clamp, a converter ticked once with `dt` may drain less
/// than the same converter ticked twice with `dt / 2` near an empty stock.
pub fn apply_production(
    plan: &ProductionPlan,
    ledger: &mut ResourceLedger,
    dt: &Decimal,
) -> Result<TickDelta, LedgerError> {
    let mut delta = TickDelta::default();
    for (kind, per_second) in &plan.consumed {
        let drained = ledger.drain_clamped(*kind, &(per_second * dt));
        if drained.is_positive() {
            delta.consumed.insert(*kind, drained);
        }
    }
    for (kind, per_second) in &plan.produced {
        let amount = per_second * dt;
        ledger.credit(*kind, &amount)?;
        if amount.is_positive() {
            delta.produced.insert(*kind, amount);
        }
    }
    Ok(delta)
}
