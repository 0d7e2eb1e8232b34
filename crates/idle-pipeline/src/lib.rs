#![deny(warnings)]

//! Stage-3 of Compiler Idle: code generation, optimization and deployment.
//!
//! The three sub-engines are stock driven. Each tick they read the stock of
//! the previous stage and credit their own output; only purchases and
//! [`Stage3::deploy`] debit stock.

pub mod analyzer;
pub mod codegen;
pub mod optimizer;

pub use analyzer::{DeploymentRecord, PerformanceAnalyzer, Platform, PlatformStats, Rating, HISTORY_CAP};
pub use codegen::{CodeGenerator, Template, MAX_OPTIMIZATION_LEVEL};
pub use optimizer::{CodeOptimizer, Technique, TechniqueSpec, TechniqueView};

use idle_core::{
    rate, Decimal, LedgerError, ResourceKind, ResourceLedger, STAGE3_UNLOCK_AST_NODES,
};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("stage 3 is locked")]
    Locked,
    #[error("platform {0} is locked")]
    PlatformLocked(Platform),
    #[error("no optimized code to deploy")]
    NothingToDeploy,
    #[error("{0} is already at max level")]
    MaxLevel(String),
    #[error("insufficient {resource}: need {required}, have {available}")]
    InsufficientResources {
        resource: ResourceKind,
        required: Decimal,
        available: Decimal,
    },
    /// Restored state violates a pipeline bound.
    #[error("invalid stage 3 state: {0}")]
    InvalidState(String),
    #[error(transparent)]
    Ledger(LedgerError),
}

impl From<LedgerError> for PipelineError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientResources {
                resource,
                required,
                available,
            } => PipelineError::InsufficientResources {
                resource,
                required,
                available,
            },
            other => PipelineError::Ledger(other),
        }
    }
}

/// Amounts credited by one [`Stage3::advance`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage3Delta {
    pub generated_code: Decimal,
    pub optimized_code: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stage3 {
    /// Set once AST nodes first reach the unlock threshold; never cleared.
    pub unlocked: bool,
    /// Projected score of deploying the current stock right now.
    pub performance_score: Decimal,
    pub generator: CodeGenerator,
    pub optimizer: CodeOptimizer,
    pub analyzer: PerformanceAnalyzer,
}

impl Stage3 {
    pub fn deployment_platform(&self) -> Platform {
        self.analyzer.platform
    }

    /// Unlock when AST nodes reach the threshold. Returns true on the
    /// transition only.
    pub fn check_unlock(&mut self, ledger: &ResourceLedger) -> bool {
        if self.unlocked || *ledger.get(ResourceKind::AstNodes) < STAGE3_UNLOCK_AST_NODES {
            return false;
        }
        self.unlocked = true;
        info!("stage 3 unlocked");
        true
    }

    /// Run the generation chain for `dt` seconds. Stocks are sampled before
    /// anything is credited. A locked stage does nothing.
    ///
    /// Sub-engine counters only move once both credits went through.
    pub fn advance(&mut self, ledger: &mut ResourceLedger, dt: &Decimal) -> Result<Stage3Delta, PipelineError> {
        if !self.unlocked {
            return Ok(Stage3Delta::default());
        }
        let ast = ledger.get(ResourceKind::AstNodes).clone();
        let optimizer_input = ledger.get(ResourceKind::GeneratedCode) * &rate(dec!(0.05));

        let generated_code = self.generator.generate(&ast) * dt;
        let optimized_code = self.optimizer.optimize(&optimizer_input) * dt;

        ledger.credit(ResourceKind::GeneratedCode, &generated_code)?;
        ledger.credit(ResourceKind::OptimizedCode, &optimized_code)?;
        self.optimizer.record_application(&optimizer_input);
        self.generator.record(&generated_code);
        self.performance_score = self.analyzer.analyze(ledger.get(ResourceKind::OptimizedCode));

        Ok(Stage3Delta {
            generated_code,
            optimized_code,
        })
    }

    /// Ship the whole optimized-code stock to the current platform.
    pub fn deploy(
        &mut self,
        ledger: &mut ResourceLedger,
        prestige_level: u64,
    ) -> Result<DeploymentRecord, PipelineError> {
        if !self.unlocked {
            return Err(PipelineError::Locked);
        }
        let platform = self.analyzer.platform;
        if !self.analyzer.is_unlocked(platform, prestige_level) {
            return Err(PipelineError::PlatformLocked(platform));
        }
        let stock = ledger.get(ResourceKind::OptimizedCode).clone();
        if !stock.is_positive() {
            return Err(PipelineError::NothingToDeploy);
        }
        let score = self.analyzer.analyze(&stock);
        ledger.debit(ResourceKind::OptimizedCode, &stock)?;
        let record = self.analyzer.record(score);
        self.performance_score = Decimal::zero();
        info!(%platform, score = %record.score, rating = %record.rating, "deployed");
        Ok(record)
    }

    pub fn set_platform(&mut self, platform: Platform, prestige_level: u64) -> Result<(), PipelineError> {
        if !self.analyzer.is_unlocked(platform, prestige_level) {
            return Err(PipelineError::PlatformLocked(platform));
        }
        self.analyzer.platform = platform;
        Ok(())
    }

    pub fn switch_template(&mut self, template: Template) -> bool {
        self.generator.switch_template(template)
    }

    pub fn upgrade_technique(
        &mut self,
        technique: Technique,
        ledger: &mut ResourceLedger,
    ) -> Result<Decimal, PipelineError> {
        if !self.unlocked {
            return Err(PipelineError::Locked);
        }
        self.optimizer.upgrade(technique, ledger)
    }

    pub fn upgrade_codegen_optimization(&mut self, ledger: &mut ResourceLedger) -> Result<Decimal, PipelineError> {
        if !self.unlocked {
            return Err(PipelineError::Locked);
        }
        self.generator.upgrade_optimization(ledger)
    }

    /// Check state restored from a save against the pipeline's bounds.
    ///
    /// Amounts must be non-negative, levels within their caps and the active
    /// template unlocked. A deployment history longer than [`HISTORY_CAP`]
    /// keeps its newest entries.
    pub fn validate_restored(&mut self) -> Result<(), PipelineError> {
        fn non_negative(what: &str, value: &Decimal) -> Result<(), PipelineError> {
            if value.is_negative() {
                return Err(PipelineError::InvalidState(format!("{what} is negative: {value}")));
            }
            Ok(())
        }

        non_negative("performance score", &self.performance_score)?;
        let generator = &self.generator;
        non_negative("total generated", &generator.total_generated)?;
        if generator.optimization_level > MAX_OPTIMIZATION_LEVEL {
            return Err(PipelineError::InvalidState(format!(
                "code generator level {} exceeds {MAX_OPTIMIZATION_LEVEL}",
                generator.optimization_level
            )));
        }
        if !generator.is_template_unlocked(generator.template) {
            return Err(PipelineError::InvalidState(format!(
                "template {} is not unlocked",
                generator.template
            )));
        }
        for (technique, level) in &self.optimizer.levels {
            let max = technique.spec().max_level;
            if *level > max {
                return Err(PipelineError::InvalidState(format!(
                    "{technique} level {level} exceeds {max}"
                )));
            }
        }
        for (platform, stats) in &self.analyzer.stats {
            non_negative(&format!("{platform} cumulative score"), &stats.cumulative)?;
            non_negative(&format!("{platform} best score"), &stats.best)?;
            non_negative(&format!("{platform} average score"), &stats.average)?;
        }
        for record in &self.analyzer.history {
            non_negative("deployment score", &record.score)?;
        }
        let history = &mut self.analyzer.history;
        if history.len() > HISTORY_CAP {
            let excess = history.len() - HISTORY_CAP;
            history.drain(..excess);
        }
        Ok(())
    }

    /// Stage-3 part of a prestige reset.
    ///
    /// The generator starts over, the optimizer keeps a tenth of each level
    /// and its application count, and the analyzer returns to the default
    /// platform with history and stats intact.
    pub fn prestige_reset(&mut self) {
        self.generator = CodeGenerator::default();
        self.optimizer.retain_for_prestige();
        self.analyzer.platform = Platform::default();
        self.performance_score = Decimal::zero();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn unlocked_with(ast: &str) -> (Stage3, ResourceLedger) {
        let mut ledger = ResourceLedger::new();
        ledger.credit(ResourceKind::AstNodes, &d(ast)).unwrap();
        let mut s = Stage3::default();
        assert!(s.check_unlock(&ledger));
        (s, ledger)
    }

    #[test]
    fn unlocks_once_at_threshold() {
        let mut ledger = ResourceLedger::new();
        ledger.credit(ResourceKind::AstNodes, &d("999.99")).unwrap();
        let mut s = Stage3::default();
        assert!(!s.check_unlock(&ledger));
        ledger.credit(ResourceKind::AstNodes, &d("0.01")).unwrap();
        assert!(s.check_unlock(&ledger));
        assert!(!s.check_unlock(&ledger));
        ledger.reset_run();
        assert!(!s.check_unlock(&ledger));
        assert!(s.unlocked);
    }

    #[test]
    fn locked_stage_is_inert() {
        let mut s = Stage3::default();
        let mut ledger = ResourceLedger::new();
        ledger.credit(ResourceKind::AstNodes, &d("500")).unwrap();
        let delta = s.advance(&mut ledger, &d("1")).unwrap();
        assert_eq!(delta, Stage3Delta::default());
        assert_eq!(s.deploy(&mut ledger, 0), Err(PipelineError::Locked));
    }

    #[test]
    fn advance_chains_stocks() {
        let (mut s, mut ledger) = unlocked_with("1000");
        ledger.credit(ResourceKind::GeneratedCode, &d("200")).unwrap();
        let delta = s.advance(&mut ledger, &d("0.5")).unwrap();
        // 1000 * 0.1 * 0.5
        assert_eq!(delta.generated_code, d("50"));
        // 200 * 0.05 * 1 * 0.5
        assert_eq!(delta.optimized_code, d("5"));
        assert_eq!(ledger.get(ResourceKind::GeneratedCode), &d("250"));
        assert_eq!(ledger.get(ResourceKind::AstNodes), &d("1000"));
        assert_eq!(s.generator.total_generated, d("50"));
        assert_eq!(s.performance_score, d("0.5"));
        assert_eq!(s.optimizer.total_applications, 0);
    }

    #[test]
    fn deploy_consumes_stock_and_records() {
        let (mut s, mut ledger) = unlocked_with("1000");
        assert_eq!(s.deploy(&mut ledger, 0), Err(PipelineError::NothingToDeploy));
        ledger.credit(ResourceKind::OptimizedCode, &d("60000")).unwrap();
        let record = s.deploy(&mut ledger, 0).unwrap();
        assert_eq!(record.score, d("6000"));
        assert_eq!(record.rating, Rating::S);
        assert!(ledger.get(ResourceKind::OptimizedCode).is_zero());
        assert_eq!(s.analyzer.history.len(), 1);
    }

    #[test]
    fn platform_gating() {
        let (mut s, mut ledger) = unlocked_with("1000");
        assert_eq!(
            s.set_platform(Platform::Desktop, 0),
            Err(PipelineError::PlatformLocked(Platform::Desktop))
        );
        s.set_platform(Platform::Quantum, 3).unwrap();
        ledger.credit(ResourceKind::OptimizedCode, &d("10")).unwrap();
        assert_eq!(
            s.deploy(&mut ledger, 0),
            Err(PipelineError::PlatformLocked(Platform::Quantum))
        );
        assert_eq!(s.deploy(&mut ledger, 3).unwrap().score, d("10"));
    }

    #[test]
    fn prestige_reset_is_asymmetric() {
        let (mut s, mut ledger) = unlocked_with("1000");
        ledger.credit(ResourceKind::OptimizedCode, &d("100000")).unwrap();
        s.deploy(&mut ledger, 0).unwrap();
        s.set_platform(Platform::Desktop, 0).unwrap();
        s.generator.record(&d("6000"));
        assert!(s.switch_template(Template::Llvm));
        s.optimizer.levels.insert(Technique::DeadCodeElimination, 10);
        s.optimizer.levels.insert(Technique::LoopOptimization, 9);
        s.optimizer.total_applications = 42;

        s.prestige_reset();
        assert!(s.unlocked);
        assert_eq!(s.generator, CodeGenerator::default());
        assert_eq!(s.optimizer.level(Technique::DeadCodeElimination), 1);
        assert_eq!(s.optimizer.level(Technique::LoopOptimization), 0);
        assert_eq!(s.optimizer.total_applications, 42);
        assert_eq!(s.deployment_platform(), Platform::Web);
        assert_eq!(s.analyzer.history.len(), 1);
        assert_eq!(s.analyzer.total_deployments(), 1);
    }

    #[test]
    fn technique_upgrades_need_unlock() {
        let mut s = Stage3::default();
        let mut ledger = ResourceLedger::new();
        ledger.credit(ResourceKind::OptimizedCode, &d("1000")).unwrap();
        assert_eq!(
            s.upgrade_technique(Technique::DeadCodeElimination, &mut ledger),
            Err(PipelineError::Locked)
        );
        s.unlocked = true;
        assert_eq!(
            s.upgrade_technique(Technique::DeadCodeElimination, &mut ledger),
            Ok(d("100"))
        );
    }

    #[test]
    fn restored_state_is_bounded() {
        let mut s = Stage3::default();
        for i in 0..(HISTORY_CAP as u64 + 50) {
            s.analyzer.record(Decimal::from(i));
        }
        s.analyzer.history.push_back(DeploymentRecord {
            platform: Platform::Web,
            score: d("7"),
            rating: Rating::D,
        });
        assert!(s.analyzer.history.len() > HISTORY_CAP);
        s.validate_restored().unwrap();
        assert_eq!(s.analyzer.history.len(), HISTORY_CAP);
        assert_eq!(s.analyzer.history.back().map(|r| r.score.clone()), Some(d("7")));

        let mut over = Stage3::default();
        over.optimizer.levels.insert(Technique::DeadCodeElimination, 4_000_000_000);
        assert!(matches!(over.validate_restored(), Err(PipelineError::InvalidState(_))));

        let mut negative = Stage3::default();
        negative.generator.total_generated = d("-300000");
        assert!(matches!(negative.validate_restored(), Err(PipelineError::InvalidState(_))));

        let mut early_jit = Stage3::default();
        early_jit.generator.template = Template::Jit;
        assert!(matches!(early_jit.validate_restored(), Err(PipelineError::InvalidState(_))));

        let mut capped = Stage3::default();
        capped.generator.optimization_level = MAX_OPTIMIZATION_LEVEL + 1;
        assert!(capped.validate_restored().is_err());
    }

    #[test]
    fn failed_advance_leaves_counters_alone() {
        let (mut s, mut ledger) = unlocked_with("1000");
        s.generator.total_generated = d("-300000");
        s.optimizer.levels.insert(Technique::DeadCodeElimination, 1);
        ledger.credit(ResourceKind::GeneratedCode, &d("100")).unwrap();
        assert!(s.advance(&mut ledger, &d("1")).is_err());
        assert_eq!(s.optimizer.total_applications, 0);
        assert_eq!(s.generator.total_generated, d("-300000"));
    }

    #[test]
    fn state_survives_json_and_bincode() {
        let (mut s, mut ledger) = unlocked_with("1000");
        ledger.credit(ResourceKind::OptimizedCode, &d("123.456")).unwrap();
        s.deploy(&mut ledger, 0).unwrap();
        s.optimizer.levels.insert(Technique::FunctionInlining, 2);

        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(serde_json::from_str::<Stage3>(&json).unwrap(), s);
        let bytes = bincode::serialize(&s).unwrap();
        assert_eq!(bincode::deserialize::<Stage3>(&bytes).unwrap(), s);
    }
}
