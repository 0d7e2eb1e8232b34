//! Leveled optimization techniques applied to generated code.

use crate::PipelineError;
use idle_core::{rate, Decimal, Rate, ResourceKind, ResourceLedger};
use idle_econ::exponential_cost;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    DeadCodeElimination,
    LoopOptimization,
    FunctionInlining,
    RegisterAllocation,
}

/// Static tuning of one technique.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TechniqueSpec {
    pub max_level: u32,
    pub base_cost: u64,
    pub growth: Rate,
    pub efficiency: Rate,
}

impl Technique {
    pub const ALL: [Technique; 4] = [
        Technique::DeadCodeElimination,
        Technique::LoopOptimization,
        Technique::FunctionInlining,
        Technique::RegisterAllocation,
    ];

    pub fn spec(self) -> TechniqueSpec {
        let (max_level, base_cost, growth, efficiency) = match self {
            Technique::DeadCodeElimination => (10, 100, dec!(1.5), dec!(0.10)),
            Technique::LoopOptimization => (10, 500, dec!(1.6), dec!(0.15)),
            Technique::FunctionInlining => (5, 2_000, dec!(1.8), dec!(0.25)),
            Technique::RegisterAllocation => (5, 10_000, dec!(2.0), dec!(0.30)),
        };
        TechniqueSpec {
            max_level,
            base_cost,
            growth,
            efficiency,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Technique::DeadCodeElimination => "dead_code_elimination",
            Technique::LoopOptimization => "loop_optimization",
            Technique::FunctionInlining => "function_inlining",
            Technique::RegisterAllocation => "register_allocation",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.key() == key)
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Level, cap and next price of one technique, for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechniqueView {
    pub technique: Technique,
    pub level: u32,
    pub max_level: u32,
    pub next_cost: Option<Decimal>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeOptimizer {
    pub levels: BTreeMap<Technique, u32>,
    pub total_applications: u64,
}

impl CodeOptimizer {
    pub fn level(&self, technique: Technique) -> u32 {
        self.levels.get(&technique).copied().unwrap_or(0)
    }

    /// True when any technique has a level above zero.
    pub fn is_active(&self) -> bool {
        self.levels.values().any(|l| *l > 0)
    }

    /// `product(1 + efficiency * level)` over active techniques.
    pub fn total_multiplier(&self) -> Decimal {
        self.levels
            .iter()
            .filter(|(_, level)| **level > 0)
            .map(|(t, level)| {
                Decimal::one() + rate(t.spec().efficiency) * Decimal::from(*level)
            })
            .product()
    }

    pub fn optimize(&self, generated: &Decimal) -> Decimal {
        generated * &self.total_multiplier()
    }

    /// Count one application when there is input and a technique to apply.
    pub fn record_application(&mut self, input: &Decimal) {
        if input.is_positive() && self.is_active() {
            self.total_applications += 1;
        }
    }

    /// Price of the next level, `None` at the cap.
    pub fn next_cost(&self, technique: Technique) -> Option<Decimal> {
        let spec = technique.spec();
        let level = self.level(technique);
        (level < spec.max_level).then(|| {
            exponential_cost(&Decimal::from(spec.base_cost), spec.growth, u64::from(level))
        })
    }

    /// Buy one level of `technique` with optimized code.
    pub fn upgrade(
        &mut self,
        technique: Technique,
        ledger: &mut ResourceLedger,
    ) -> Result<Decimal, PipelineError> {
        let cost = self
            .next_cost(technique)
            .ok_or_else(|| PipelineError::MaxLevel(technique.to_string()))?;
        ledger.debit(ResourceKind::OptimizedCode, &cost)?;
        let level = self.levels.entry(technique).or_insert(0);
        *level += 1;
        info!(%technique, level = *level, %cost, "optimization technique upgraded");
        Ok(cost)
    }

    /// Keep a tenth of every level (rounded down) and the application count.
    pub fn retain_for_prestige(&mut self) {
        for level in self.levels.values_mut() {
            *level /= 10;
        }
        self.levels.retain(|_, level| *level > 0);
    }

    pub fn views(&self) -> Vec<TechniqueView> {
        Technique::ALL
            .into_iter()
            .map(|t| TechniqueView {
                technique: t,
                level: self.level(t),
                max_level: t.spec().max_level,
                next_cost: self.next_cost(t),
            })
            .collect()
    }
}
