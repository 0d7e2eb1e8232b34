//! Code generation from AST nodes.

use crate::PipelineError;
use idle_core::{rate, Decimal, Rate, ResourceKind, ResourceLedger};
use idle_econ::exponential_cost;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Highest purchasable optimization level of the generator.
pub const MAX_OPTIMIZATION_LEVEL: u32 = 10;

/// Code-generation template. Later templates unlock on cumulative output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    #[default]
    Basic,
    Llvm,
    Jit,
}

impl Template {
    pub const ALL: [Template; 3] = [Template::Basic, Template::Llvm, Template::Jit];

    pub fn efficiency(self) -> Rate {
        match self {
            Template::Basic => dec!(0.1),
            Template::Llvm => dec!(0.15),
            Template::Jit => dec!(0.2),
        }
    }

    /// Cumulative generated code needed before switching to this template.
    pub fn unlock_threshold(self) -> u64 {
        match self {
            Template::Basic => 0,
            Template::Llvm => 5_000,
            Template::Jit => 50_000,
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Template::Basic => "basic",
            Template::Llvm => "llvm",
            Template::Jit => "jit",
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeGenerator {
    pub template: Template,
    pub optimization_level: u32,
    pub total_generated: Decimal,
}

impl CodeGenerator {
    /// `ast * efficiency * (1 + level*0.1) * (1 + total/10000*0.05)`.
    pub fn generate(&self, ast_nodes: &Decimal) -> Decimal {
        let level_bonus =
            Decimal::one() + Decimal::from(self.optimization_level) * rate(dec!(0.1));
        let experience = Decimal::one()
            + &self.total_generated / &Decimal::from(10_000u32) * rate(dec!(0.05));
        ast_nodes * &rate(self.template.efficiency()) * level_bonus * experience
    }

    /// Add freshly generated code to the cumulative total.
    pub fn record(&mut self, amount: &Decimal) {
        self.total_generated += amount;
    }

    pub fn is_template_unlocked(&self, template: Template) -> bool {
        self.total_generated >= template.unlock_threshold()
    }

    /// Switch templates; false (and no change) while the target is locked.
    pub fn switch_template(&mut self, template: Template) -> bool {
        if !self.is_template_unlocked(template) {
            return false;
        }
        self.template = template;
        true
    }

    /// Cost of the next optimization level, `None` at the cap.
    pub fn next_optimization_cost(&self) -> Option<Decimal> {
        (self.optimization_level < MAX_OPTIMIZATION_LEVEL).then(|| {
            exponential_cost(
                &Decimal::from(100u32),
                dec!(2),
                u64::from(self.optimization_level),
            )
        })
    }

    /// Buy one optimization level with generated code.
    pub fn upgrade_optimization(&mut self, ledger: &mut ResourceLedger) -> Result<Decimal, PipelineError> {
        let cost = self
            .next_optimization_cost()
            .ok_or(PipelineError::MaxLevel("code generator".to_string()))?;
        ledger.debit(ResourceKind::GeneratedCode, &cost)?;
        self.optimization_level += 1;
        info!(level = self.optimization_level, %cost, "code generator optimized");
        Ok(cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn fresh_generator_yields_ten_percent() {
        let g = CodeGenerator::default();
        assert_eq!(g.generate(&d("1000")), d("100"));
        assert!(g.generate(&Decimal::zero()).is_zero());
    }

    #[test]
    fn bonuses_compose() {
        let g = CodeGenerator {
            template: Template::Llvm,
            optimization_level: 2,
            total_generated: d("20000"),
        };
        // 1000 * 0.15 * 1.2 * 1.1
        assert_eq!(g.generate(&d("1000")), d("198"));
    }

    #[test]
    fn gated_template_switch_fails_quietly() {
        let mut g = CodeGenerator::default();
        assert!(!g.switch_template(Template::Llvm));
        assert_eq!(g.template, Template::Basic);
        g.record(&d("5000"));
        assert!(g.switch_template(Template::Llvm));
        assert!(!g.switch_template(Template::Jit));
        assert_eq!(g.template, Template::Llvm);
        assert!(g.switch_template(Template::Basic));
    }

    #[test]
    fn optimization_levels_cost_generated_code() {
        let mut g = CodeGenerator::default();
        let mut ledger = ResourceLedger::new();
        ledger.credit(ResourceKind::GeneratedCode, &d("350")).unwrap();
        assert_eq!(g.upgrade_optimization(&mut ledger).unwrap(), d("100"));
        assert_eq!(g.upgrade_optimization(&mut ledger).unwrap(), d("200"));
        assert!(matches!(
            g.upgrade_optimization(&mut ledger),
            Err(PipelineError::InsufficientResources { .. })
        ));
        assert_eq!(g.optimization_level, 2);
    }

    #[test]
    fn optimization_level_is_capped() {
        let mut g = CodeGenerator {
            optimization_level: MAX_OPTIMIZATION_LEVEL,
            ..CodeGenerator::default()
        };
        assert_eq!(g.next_optimization_cost(), None);
        let mut ledger = ResourceLedger::new();
        assert!(matches!(
            g.upgrade_optimization(&mut ledger),
            Err(PipelineError::MaxLevel(_))
        ));
    }
}
