//! The exponential cost law.

use idle_core::{rate, Decimal, Rate, UpgradeDefinition};

/// `base * growth^level`, evaluated in [`Decimal`] arithmetic.
pub fn exponential_cost(base: &Decimal, growth: Rate, level: u64) -> Decimal {
    base * &rate(growth).powi(level)
}

/// Sum of [`exponential_cost`] for levels `current..current + quantity`.
///
/// Each term is computed independently, so splitting a purchase into two
/// consecutive parts yields exactly the same total. The work grows with
/// `quantity`; when a balance bounds the purchase use
/// [`affordable_bulk_cost`] instead.
pub fn exponential_bulk_cost(base: &Decimal, growth: Rate, current: u64, quantity: u64) -> Decimal {
    (0..quantity)
        .map(|i| exponential_cost(base, growth, current.saturating_add(i)))
        .sum()
}

/// Cost of buying level `level + 1` of `def`.
pub fn cost_at_level(def: &UpgradeDefinition, level: u64) -> Decimal {
    exponential_cost(&def.base_cost, def.growth_rate, level)
}

/// Cost of buying `quantity` levels of `def` starting from `current_level`.
pub fn bulk_cost(def: &UpgradeDefinition, current_level: u64, quantity: u64) -> Decimal {
    exponential_bulk_cost(&def.base_cost, def.growth_rate, current_level, quantity)
}

/// Levels fitting in `budget`, walked upward from `current_level` and
/// stopping at `cap` or at the first level that overflows the budget.
///
/// Returns the count, what those levels cost, and the running total that
/// first exceeded the budget (if the walk stopped there).
fn walk_levels(
    def: &UpgradeDefinition,
    current_level: u64,
    budget: &Decimal,
    cap: u64,
) -> (u64, Decimal, Option<Decimal>) {
    let mut spent = Decimal::zero();
    let mut n = 0;
    while n < cap {
        let next = &spent + &cost_at_level(def, current_level.saturating_add(n));
        if &next > budget {
            return (n, spent, Some(next));
        }
        spent = next;
        n += 1;
    }
    (n, spent, None)
}

/// Largest quantity (up to `cap`) whose bulk cost fits in `budget`.
pub fn max_affordable(def: &UpgradeDefinition, current_level: u64, budget: &Decimal, cap: u64) -> u64 {
    walk_levels(def, current_level, budget, cap).0
}

/// [`bulk_cost`] when it fits in `budget`.
///
/// Otherwise `Err` carries the running total at the first level that did not
/// fit, which already exceeds the budget. The walk never goes past that
/// level, so the work is bounded by the budget rather than by `quantity`.
pub fn affordable_bulk_cost(
    def: &UpgradeDefinition,
    current_level: u64,
    quantity: u64,
    budget: &Decimal,
) -> Result<Decimal, Decimal> {
    match walk_levels(def, current_level, budget, quantity) {
        (_, spent, None) => Ok(spent),
        (_, _, Some(overflow)) => Err(overflow),
    }
}
