//! The engine aggregate: sole owner and writer of all game state.

use crate::config::EngineConfig;
use crate::snapshot::{AnalysisResult, OfflineReport, Snapshot, Stage3View, UpgradeView};
use crate::EngineError;
use idle_ai::{choose_purchase, AutobuyPolicy};
use idle_core::{
    rate, BulkBuy, Catalog, Decimal, GameSettings, GameStatistics, PrestigeState, ResourceKind,
    ResourceLedger, UpgradeId, UpgradeState,
};
use idle_econ::{
    apply_production, bulk_cost, can_purchase, is_visible, manual_multiplier, prestige_gain,
    production_rates, purchase, purchase_prestige_upgrade, reset_run, weighted_total_for_gain,
    EconError, PrestigeOutcome, ProductionPlan, PurchaseReceipt, TickDelta,
};
use idle_lexer::{complexity_score, count_by_kind, validate, SnippetDeck, Tokenizer};
use idle_pipeline::{DeploymentRecord, Platform, Stage3, Stage3Delta, Technique, Template};
use persistence::SaveFile;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{debug, info, warn};

/// What one [`Engine::tick`] moved.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub economy: TickDelta,
    pub stage3: Stage3Delta,
    /// True on the tick that unlocked Stage-3.
    pub stage3_unlocked: bool,
}

#[derive(Clone, Debug)]
pub struct Engine {
    config: EngineConfig,
    ledger: ResourceLedger,
    upgrades: UpgradeState,
    prestige: PrestigeState,
    stage3: Stage3,
    settings: GameSettings,
    statistics: GameStatistics,
    tokenizer: Tokenizer,
    deck: SnippetDeck,
}

impl Engine {
    /// Fresh game with a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let deck = SnippetDeck::new(config.snippet_seed);
        Ok(Self {
            config,
            ledger: ResourceLedger::new(),
            upgrades: UpgradeState::new(),
            prestige: PrestigeState::default(),
            stage3: Stage3::default(),
            settings: GameSettings::default(),
            statistics: GameStatistics::default(),
            tokenizer: Tokenizer::new(),
            deck,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.config.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn upgrades(&self) -> &UpgradeState {
        &self.upgrades
    }

    pub fn prestige_state(&self) -> &PrestigeState {
        &self.prestige
    }

    pub fn stage3(&self) -> &Stage3 {
        &self.stage3
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn statistics(&self) -> &GameStatistics {
        &self.statistics
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// Stage 1/2 production runs first; Stage-3 then unlocks if AST nodes
    /// reached the threshold and advances from the updated stocks. Both run
    /// against scratch copies that replace the live state only on success.
    pub fn tick(&mut self, dt: &Decimal) -> Result<TickReport, EngineError> {
        if !dt.is_positive() {
            return Err(EngineError::InvalidDelta(dt.clone()));
        }
        let plan = production_rates(
            &self.config.catalog,
            &self.upgrades,
            &self.prestige,
            &self.ledger,
        );
        let mut ledger = self.ledger.clone();
        let mut pipeline = self.stage3.clone();
        let economy = apply_production(&plan, &mut ledger, dt)?;
        let stage3_unlocked = pipeline.check_unlock(&ledger);
        let stage3 = pipeline.advance(&mut ledger, dt)?;
        self.ledger = ledger;
        self.stage3 = pipeline;

        self.statistics.total_ticks += 1;
        self.statistics.simulated_seconds += dt;
        if let Some(tokens) = economy.produced.get(&ResourceKind::Tokens) {
            self.statistics.lifetime_tokens += tokens;
        }
        Ok(TickReport {
            economy,
            stage3,
            stage3_unlocked,
        })
    }

    /// Replay `elapsed_seconds` of absence in fixed steps, up to the cap.
    pub fn advance_offline(&mut self, elapsed_seconds: u64) -> Result<OfflineReport, EngineError> {
        let step = self.config.offline_step_seconds;
        let total = elapsed_seconds.min(self.config.offline_cap_seconds);
        if total < elapsed_seconds {
            debug!(elapsed_seconds, cap = total, "offline time capped");
        }
        let mut report = OfflineReport {
            requested_seconds: elapsed_seconds,
            ..OfflineReport::default()
        };
        while report.simulated_seconds < total {
            let dt = step.min(total - report.simulated_seconds);
            self.tick(&Decimal::from(dt))?;
            report.simulated_seconds += dt;
            report.steps += 1;
        }
        info!(seconds = report.simulated_seconds, steps = report.steps, "offline progress applied");
        Ok(report)
    }

    /// Buy `quantity` levels of upgrade `id`.
    pub fn purchase(&mut self, id: &UpgradeId, quantity: u64) -> Result<PurchaseReceipt, EngineError> {
        let def = self
            .config
            .catalog
            .get(id)
            .ok_or_else(|| EconError::UnknownUpgrade(id.clone()))?;
        Ok(purchase(def, &mut self.upgrades, &mut self.ledger, quantity)?)
    }

    /// Buy at the current bulk-buy quantity.
    pub fn purchase_with_bulk(&mut self, id: &UpgradeId) -> Result<PurchaseReceipt, EngineError> {
        self.purchase(id, self.settings.bulk_buy.quantity())
    }

    pub fn set_bulk_buy_quantity(&mut self, quantity: u32) -> Result<(), EngineError> {
        self.settings.bulk_buy = BulkBuy::try_from(quantity)?;
        Ok(())
    }

    /// Tokenize `source` and credit `token count * manual multiplier` tokens.
    pub fn analyze_code(&mut self, source: &str) -> Result<AnalysisResult, EngineError> {
        let tokens = self.tokenizer.tokenize(source);
        let report = validate(&tokens);
        let counts = count_by_kind(&tokens);
        let complexity = complexity_score(&tokens);
        let reward = Decimal::from(tokens.len())
            * manual_multiplier(&self.config.catalog, &self.upgrades, &self.prestige);
        self.ledger.credit(ResourceKind::Tokens, &reward)?;
        self.statistics.manual_analyses += 1;
        self.statistics.lifetime_tokens += &reward;
        debug!(tokens = tokens.len(), %reward, valid = report.is_valid, "code analyzed");
        Ok(AnalysisResult {
            tokens,
            report,
            counts,
            complexity,
            reward,
        })
    }

    pub fn next_snippet(&mut self) -> &'static str {
        self.deck.next_snippet()
    }

    /// Analyze the next snippet from the deck.
    pub fn analyze_next_snippet(&mut self) -> Result<AnalysisResult, EngineError> {
        let snippet = self.deck.next_snippet();
        self.analyze_code(snippet)
    }

    pub fn prestige_gain(&self) -> Decimal {
        prestige_gain(&self.ledger)
    }

    /// Soft reset: award compiler points, clear the run and apply Stage-3
    /// retention.
    pub fn prestige(&mut self) -> Result<PrestigeOutcome, EngineError> {
        let outcome = reset_run(&mut self.ledger, &mut self.upgrades, &mut self.prestige)?;
        self.stage3.prestige_reset();
        if outcome.gain > self.statistics.best_prestige_gain {
            self.statistics.best_prestige_gain = outcome.gain.clone();
        }
        Ok(outcome)
    }

    pub fn purchase_prestige_upgrade(&mut self, id: &UpgradeId) -> Result<PurchaseReceipt, EngineError> {
        let def = self
            .config
            .catalog
            .get_prestige(id)
            .ok_or_else(|| EconError::UnknownUpgrade(id.clone()))?;
        Ok(purchase_prestige_upgrade(def, &mut self.prestige, &mut self.ledger)?)
    }

    pub fn set_deployment_platform(&mut self, platform: Platform) -> Result<(), EngineError> {
        Ok(self.stage3.set_platform(platform, self.prestige.level)?)
    }

    pub fn upgrade_optimization_technique(&mut self, technique: Technique) -> Result<Decimal, EngineError> {
        Ok(self.stage3.upgrade_technique(technique, &mut self.ledger)?)
    }

    pub fn upgrade_codegen_optimization(&mut self) -> Result<Decimal, EngineError> {
        Ok(self.stage3.upgrade_codegen_optimization(&mut self.ledger)?)
    }

    /// False (and no change) while the template is locked.
    pub fn switch_template(&mut self, template: Template) -> bool {
        self.stage3.switch_template(template)
    }

    pub fn deploy(&mut self) -> Result<DeploymentRecord, EngineError> {
        let record = self.stage3.deploy(&mut self.ledger, self.prestige.level)?;
        self.statistics.deployments += 1;
        Ok(record)
    }

    pub fn set_developer_mode(&mut self, enabled: bool) {
        self.settings.developer_mode_enabled = enabled;
    }

    /// Add resources directly. Developer mode only.
    pub fn grant(&mut self, resource: ResourceKind, amount: &Decimal) -> Result<(), EngineError> {
        if !self.settings.developer_mode_enabled {
            return Err(EngineError::DeveloperModeDisabled);
        }
        self.ledger.credit(resource, amount)?;
        if resource == ResourceKind::Tokens {
            self.statistics.lifetime_tokens += amount;
        }
        warn!(%resource, %amount, "developer grant");
        Ok(())
    }

    /// Let the autobuyer make one purchase at the bulk-buy quantity.
    pub fn autobuy_step(&mut self, policy: &AutobuyPolicy) -> Result<Option<PurchaseReceipt>, EngineError> {
        let pick = choose_purchase(
            &self.config.catalog,
            &self.upgrades,
            &self.prestige,
            &self.ledger,
            self.settings.bulk_buy.quantity(),
            policy,
        );
        match pick {
            Some(c) => self.purchase(&c.id, c.quantity).map(Some),
            None => Ok(None),
        }
    }

    /// Per-second rates for every resource, including Stage-3.
    pub fn production_rates(&self) -> ProductionPlan {
        let mut plan = production_rates(
            &self.config.catalog,
            &self.upgrades,
            &self.prestige,
            &self.ledger,
        );
        if self.stage3.unlocked {
            let generated = self
                .stage3
                .generator
                .generate(self.ledger.get(ResourceKind::AstNodes));
            let input = self.ledger.get(ResourceKind::GeneratedCode) * &rate(dec!(0.05));
            plan.add_produced(ResourceKind::GeneratedCode, generated);
            plan.add_produced(ResourceKind::OptimizedCode, self.stage3.optimizer.optimize(&input));
        }
        plan
    }

    pub fn snapshot(&self) -> Snapshot {
        let bulk = self.settings.bulk_buy.quantity();
        let upgrades = self
            .config
            .catalog
            .iter()
            .map(|def| {
                let level = self.upgrades.level(&def.id);
                UpgradeView {
                    id: def.id.clone(),
                    name: def.name.clone(),
                    level,
                    visible: is_visible(def, &self.ledger),
                    bulk_cost: bulk_cost(def, level, bulk),
                    bulk_quantity: bulk,
                    affordable: can_purchase(def, &self.upgrades, &self.ledger, bulk),
                }
            })
            .collect();
        let s3 = &self.stage3;
        let stage3 = Stage3View {
            unlocked: s3.unlocked,
            platform: s3.deployment_platform(),
            unlocked_platforms: Platform::ALL
                .into_iter()
                .filter(|p| s3.analyzer.is_unlocked(*p, self.prestige.level))
                .collect(),
            template: s3.generator.template,
            codegen_optimization_level: s3.generator.optimization_level,
            next_codegen_cost: s3.generator.next_optimization_cost(),
            total_generated: s3.generator.total_generated.clone(),
            techniques: s3.optimizer.views(),
            optimizer_multiplier: s3.optimizer.total_multiplier(),
            total_applications: s3.optimizer.total_applications,
            performance_score: s3.performance_score.clone(),
            average_score: s3.analyzer.average_score(),
            rating: s3.analyzer.rating(),
            total_deployments: s3.analyzer.total_deployments(),
        };
        let prestige_gain = self.prestige_gain();
        let next_prestige_at = prestige_gain
            .to_u64()
            .and_then(|g| g.checked_add(1))
            .map(weighted_total_for_gain);
        Snapshot {
            resources: self.ledger.iter().map(|(k, v)| (k, v.clone())).collect(),
            upgrades,
            prestige: self.prestige.clone(),
            prestige_gain,
            next_prestige_at,
            stage3,
            production_rates: self.production_rates(),
            settings: self.settings.clone(),
            statistics: self.statistics.clone(),
        }
    }

    pub fn to_save(&self) -> SaveFile {
        SaveFile {
            resources: SaveFile::resources_from_ledger(&self.ledger),
            upgrades: self.upgrades.clone(),
            prestige: self.prestige.clone(),
            stage3: self.stage3.clone(),
            settings: self.settings.clone(),
            statistics: self.statistics.clone(),
            ..SaveFile::default()
        }
    }

    pub fn save_json(&self) -> Result<String, EngineError> {
        Ok(persistence::to_json(&self.to_save())?)
    }

    pub fn save_binary(&self) -> Result<Vec<u8>, EngineError> {
        Ok(persistence::to_binary(&self.to_save())?)
    }

    /// Replace all game state with `save`. On error nothing changes.
    ///
    /// The save is checked with [`SaveFile::validated`] first. Levels of
    /// upgrades the catalog does not know are dropped.
    pub fn load(&mut self, save: SaveFile) -> Result<(), EngineError> {
        let save = save.validated()?;
        let ledger = save.ledger()?;
        let mut upgrades = UpgradeState::new();
        for (id, level) in save.upgrades.iter() {
            if self.config.catalog.get(id).is_some() {
                upgrades.set_level(id.clone(), level);
            } else {
                debug!(%id, "dropping unknown upgrade from save");
            }
        }
        self.ledger = ledger;
        self.upgrades = upgrades;
        self.prestige = save.prestige;
        self.stage3 = save.stage3;
        self.settings = save.settings;
        self.statistics = save.statistics;
        info!(version = save.version.as_str(), "save loaded");
        Ok(())
    }

    pub fn load_json(&mut self, text: &str) -> Result<(), EngineError> {
        let save = persistence::from_json(text).map_err(|e| {
            warn!(error = %e, "rejected JSON save");
            e
        })?;
        self.load(save)
    }

    pub fn load_binary(&mut self, bytes: &[u8]) -> Result<(), EngineError> {
        let save = persistence::from_binary(bytes).map_err(|e| {
            warn!(error = %e, "rejected binary save");
            e
        })?;
        self.load(save)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn non_positive_delta_is_rejected() {
        let mut e = engine();
        assert!(matches!(
            e.tick(&Decimal::zero()),
            Err(EngineError::InvalidDelta(_))
        ));
        assert_eq!(e.statistics().total_ticks, 0);
    }

    #[test]
    fn failing_stage3_step_rolls_back_the_whole_tick() {
        let mut e = engine();
        e.upgrades.set_level(UpgradeId::new("lexer_daemon"), 4);
        e.ledger.set(ResourceKind::AstNodes, Decimal::from(1000u32));
        e.stage3.unlocked = true;
        e.stage3.generator.total_generated = "-300000".parse().unwrap();
        let (ledger, stage3) = (e.ledger.clone(), e.stage3.clone());

        assert!(matches!(e.tick(&Decimal::one()), Err(EngineError::Pipeline(_))));
        assert_eq!(e.ledger, ledger);
        assert_eq!(e.stage3, stage3);
        assert_eq!(e.statistics().total_ticks, 0);
    }

    #[test]
    fn manual_analysis_rewards_tokens() {
        let mut e = engine();
        let r = e.analyze_code("let x = 1;").unwrap();
        assert_eq!(r.tokens.len(), 5);
        assert_eq!(r.reward, 5u64);
        assert_eq!(e.ledger().get(ResourceKind::Tokens), &Decimal::from(5u32));
        assert_eq!(e.statistics().manual_analyses, 1);
    }

    #[test]
    fn grants_need_developer_mode() {
        let mut e = engine();
        let ten = Decimal::from(10u32);
        assert_eq!(
            e.grant(ResourceKind::Tokens, &ten),
            Err(EngineError::DeveloperModeDisabled)
        );
        e.set_developer_mode(true);
        e.grant(ResourceKind::Tokens, &ten).unwrap();
        assert_eq!(e.ledger().get(ResourceKind::Tokens), &ten);
    }

    #[test]
    fn unknown_upgrade_is_reported() {
        let mut e = engine();
        assert!(matches!(
            e.purchase(&UpgradeId::new("quantum_lexer"), 1),
            Err(EngineError::Econ(EconError::UnknownUpgrade(_)))
        ));
    }

    #[test]
    fn offline_replay_is_stepped_and_capped() {
        let mut e = engine();
        let r = e.advance_offline(25).unwrap();
        assert_eq!((r.simulated_seconds, r.steps), (25, 3));
        let r = e.advance_offline(100_000).unwrap();
        assert_eq!(r.simulated_seconds, 8 * 60 * 60);
        assert_eq!(r.steps, 2880);
    }
}
