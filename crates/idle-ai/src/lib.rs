#![deny(warnings)]

//! Greedy autobuyer: ranks affordable upgrades by value gained per value spent.
//!
//! Resources are valued with the prestige weights (tokens 1, AST nodes 10,
//! generated code 100, optimized code 1000) so that costs and outputs in
//! different resources compare on one scale.

use idle_core::{
    rate, Catalog, Decimal, PrestigeState, Rate, ResourceKind, ResourceLedger, UpgradeDefinition,
    UpgradeId, UpgradeKind, UpgradeState,
};
use idle_econ::{affordable_bulk_cost, is_visible, prestige_multiplier};
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::debug;

/// Value of one unit of `kind` on the common scale.
pub fn resource_weight(kind: ResourceKind) -> Decimal {
    match kind {
        ResourceKind::Tokens => Decimal::from(1u32),
        ResourceKind::AstNodes => Decimal::from(10u32),
        ResourceKind::GeneratedCode => Decimal::from(100u32),
        ResourceKind::OptimizedCode => Decimal::from(1000u32),
        ResourceKind::CompilerPoints => Decimal::zero(),
    }
}

/// Tuning of the autobuyer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AutobuyPolicy {
    /// Base tokens per second the host earns from manual analyses. Manual
    /// upgrades are worthless to a host that never analyzes.
    pub manual_tokens_per_second: Rate,
}

impl Default for AutobuyPolicy {
    fn default() -> Self {
        Self {
            manual_tokens_per_second: dec!(0),
        }
    }
}

/// A ranked purchase option.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub id: UpgradeId,
    pub quantity: u64,
    pub cost: Decimal,
    pub utility: Decimal,
}

/// Weighted value per second added by one more level of `def`.
pub fn marginal_value(
    def: &UpgradeDefinition,
    catalog: &Catalog,
    prestige: &PrestigeState,
    ledger: &ResourceLedger,
    policy: &AutobuyPolicy,
) -> Decimal {
    let out = &def.base_output_per_level;
    match &def.kind {
        UpgradeKind::Manual => {
            out * &prestige_multiplier(catalog, prestige, ResourceKind::Tokens)
                * rate(policy.manual_tokens_per_second)
        }
        UpgradeKind::Generator { produces } => {
            out * &prestige_multiplier(catalog, prestige, *produces) * resource_weight(*produces)
        }
        UpgradeKind::Converter { consumes, produces } => {
            let gained = out * ledger.get(*consumes) * resource_weight(*produces);
            let spent = out * &resource_weight(*consumes);
            gained.sub_clamped(&spent)
        }
    }
}

/// Affordable options for buying `quantity` levels, best first. Ties break
/// on id so the order is deterministic.
pub fn candidates(
    catalog: &Catalog,
    upgrades: &UpgradeState,
    prestige: &PrestigeState,
    ledger: &ResourceLedger,
    quantity: u64,
    policy: &AutobuyPolicy,
) -> Vec<Candidate> {
    let mut out: Vec<Candidate> = catalog
        .iter()
        .filter(|def| quantity > 0 && is_visible(def, ledger))
        .filter_map(|def| {
            let level = upgrades.level(&def.id);
            let cost =
                affordable_bulk_cost(def, level, quantity, ledger.get(def.cost_resource)).ok()?;
            let value = marginal_value(def, catalog, prestige, ledger, policy)
                * Decimal::from(quantity);
            let weighted_cost = &cost * &resource_weight(def.cost_resource);
            let utility = value.checked_div(&weighted_cost).unwrap_or(value);
            Some(Candidate {
                id: def.id.clone(),
                quantity,
                cost,
                utility,
            })
        })
        .collect();
    out.sort_by(|a, b| b.utility.cmp(&a.utility).then_with(|| a.id.cmp(&b.id)));
    out
}

/// The best affordable option with positive utility, if any.
pub fn choose_purchase(
    catalog: &Catalog,
    upgrades: &UpgradeState,
    prestige: &PrestigeState,
    ledger: &ResourceLedger,
    quantity: u64,
    policy: &AutobuyPolicy,
) -> Option<Candidate> {
    let best = candidates(catalog, upgrades, prestige, ledger, quantity, policy)
        .into_iter()
        .find(|c| c.utility.is_positive());
    if let Some(c) = &best {
        debug!(id = %c.id, utility = %c.utility, "autobuyer pick");
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use idle_core::default_catalog;
    use proptest::prelude::*;

    fn ledger(pairs: &[(ResourceKind, u64)]) -> ResourceLedger {
        let mut l = ResourceLedger::new();
        for (k, v) in pairs {
            l.credit(*k, &Decimal::from(*v)).unwrap();
        }
        l
    }

    #[test]
    fn idle_host_buys_generators() {
        let catalog = default_catalog();
        let l = ledger(&[(ResourceKind::Tokens, 20)]);
        let pick = choose_purchase(
            &catalog,
            &UpgradeState::new(),
            &PrestigeState::default(),
            &l,
            1,
            &AutobuyPolicy::default(),
        )
        .unwrap();
        assert_eq!(pick.id, UpgradeId::new("lexer_daemon"));
        assert_eq!(pick.cost, Decimal::from(15u32));
    }

    #[test]
    fn clicking_host_values_manual_upgrades() {
        let catalog = default_catalog();
        let l = ledger(&[(ResourceKind::Tokens, 20)]);
        let policy = AutobuyPolicy {
            manual_tokens_per_second: dec!(5),
        };
        let pick = choose_purchase(
            &catalog,
            &UpgradeState::new(),
            &PrestigeState::default(),
            &l,
            1,
            &policy,
        )
        .unwrap();
        assert_eq!(pick.id, UpgradeId::new("syntax_highlighter"));
    }

    #[test]
    fn nothing_affordable_means_no_pick() {
        let catalog = default_catalog();
        let l = ledger(&[(ResourceKind::Tokens, 5)]);
        assert!(choose_purchase(
            &catalog,
            &UpgradeState::new(),
            &PrestigeState::default(),
            &l,
            1,
            &AutobuyPolicy::default()
        )
        .is_none());
    }

    #[test]
    fn converters_need_stock_to_be_worth_it() {
        let catalog = default_catalog();
        let parser = catalog.get(&UpgradeId::new("recursive_descent")).unwrap();
        let policy = AutobuyPolicy::default();
        let p = PrestigeState::default();
        let poor = ledger(&[(ResourceKind::Tokens, 50)]);
        let rich = ledger(&[(ResourceKind::Tokens, 100_000)]);
        assert!(marginal_value(parser, &catalog, &p, &poor, &policy)
            < marginal_value(parser, &catalog, &p, &rich, &policy));
    }

    proptest! {
        #[test]
        fn candidates_are_sorted_and_affordable(tokens in 0u64..1_000_000, ast in 0u64..10_000) {
            let catalog = default_catalog();
            let l = ledger(&[(ResourceKind::Tokens, tokens), (ResourceKind::AstNodes, ast)]);
            let upgrades = UpgradeState::new();
            let list = candidates(&catalog, &upgrades, &PrestigeState::default(), &l, 1, &AutobuyPolicy::default());
            for pair in list.windows(2) {
                prop_assert!(pair[0].utility >= pair[1].utility);
            }
            for c in &list {
                let def = catalog.get(&c.id).unwrap();
                prop_assert!(l.has(def.cost_resource, &c.cost));
            }
        }
    }
}
