//! Read-only views handed to hosts after every mutating call.

use idle_core::{
    Decimal, GameSettings, GameStatistics, PrestigeState, ResourceKind, UpgradeId,
};
use idle_econ::ProductionPlan;
use idle_lexer::{Token, TokenKind, ValidationReport};
use idle_pipeline::{Platform, Rating, Template, TechniqueView};
use serde::Serialize;
use std::collections::BTreeMap;

/// One upgrade as the shop would render it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeView {
    pub id: UpgradeId,
    pub name: String,
    pub level: u64,
    pub visible: bool,
    /// Price of `bulk_quantity` levels at the current bulk-buy setting.
    pub bulk_cost: Decimal,
    pub bulk_quantity: u64,
    pub affordable: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage3View {
    pub unlocked: bool,
    pub platform: Platform,
    pub unlocked_platforms: Vec<Platform>,
    pub template: Template,
    pub codegen_optimization_level: u32,
    pub next_codegen_cost: Option<Decimal>,
    pub total_generated: Decimal,
    pub techniques: Vec<TechniqueView>,
    pub optimizer_multiplier: Decimal,
    pub total_applications: u64,
    pub performance_score: Decimal,
    pub average_score: Decimal,
    pub rating: Rating,
    pub total_deployments: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub resources: BTreeMap<ResourceKind, Decimal>,
    pub upgrades: Vec<UpgradeView>,
    pub prestige: PrestigeState,
    pub prestige_gain: Decimal,
    /// Weighted total at which the next compiler point is earned.
    pub next_prestige_at: Option<Decimal>,
    pub stage3: Stage3View,
    pub production_rates: ProductionPlan,
    pub settings: GameSettings,
    pub statistics: GameStatistics,
}

/// Result of the manual analysis action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub tokens: Vec<Token>,
    pub report: ValidationReport,
    pub counts: BTreeMap<TokenKind, usize>,
    pub complexity: rust_decimal::Decimal,
    /// Tokens credited: token count times the manual multiplier.
    pub reward: Decimal,
}

/// What [`crate::Engine::advance_offline`] replayed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineReport {
    pub requested_seconds: u64,
    pub simulated_seconds: u64,
    pub steps: u64,
}
