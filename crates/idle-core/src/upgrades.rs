//! Upgrade definitions, the default catalog, and per-upgrade levels.

use crate::{Decimal, Rate, ResourceKind};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Unique identifier for an upgrade, e.g. "lexer_daemon".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpgradeId(pub String);

impl UpgradeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UpgradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What an upgrade does once owned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpgradeKind {
    /// Boosts the yield of the manual analysis action.
    Manual,
    /// Produces a resource from nothing.
    Generator { produces: ResourceKind },
    /// Produces one resource at a rate proportional to the stock of another,
    /// draining that stock over time.
    Converter {
        consumes: ResourceKind,
        produces: ResourceKind,
    },
}

/// Static, immutable configuration of a purchasable upgrade.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeDefinition {
    pub id: UpgradeId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Cost of the first level.
    pub base_cost: Decimal,
    /// Per-level cost multiplier (> 1).
    pub growth_rate: Rate,
    /// Output contributed by each owned level.
    pub base_output_per_level: Decimal,
    /// Resource paid when buying levels.
    #[serde(default = "default_cost_resource")]
    pub cost_resource: ResourceKind,
    #[serde(flatten)]
    pub kind: UpgradeKind,
    /// Minimum balance of [`UpgradeDefinition::reference_resource`] before
    /// the upgrade is shown or sold.
    #[serde(default)]
    pub unlock_threshold: Option<Decimal>,
}

fn default_cost_resource() -> ResourceKind {
    ResourceKind::Tokens
}

impl UpgradeDefinition {
    /// Resource compared against `unlock_threshold`.
    pub fn reference_resource(&self) -> ResourceKind {
        match &self.kind {
            UpgradeKind::Converter { consumes, .. } => *consumes,
            UpgradeKind::Generator { produces } => *produces,
            UpgradeKind::Manual => self.cost_resource,
        }
    }

    /// Resource this upgrade adds to, if any.
    pub fn produced_resource(&self) -> Option<ResourceKind> {
        match &self.kind {
            UpgradeKind::Manual => None,
            UpgradeKind::Generator { produces } | UpgradeKind::Converter { produces, .. } => {
                Some(*produces)
            }
        }
    }
}

/// A permanent upgrade bought with compiler points; survives prestige.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrestigeUpgradeDefinition {
    pub id: UpgradeId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_cost: Decimal,
    pub growth_rate: Rate,
    /// Production multiplier applied once per owned level.
    #[serde(default = "default_prestige_multiplier")]
    pub multiplier_per_level: Rate,
}

fn default_prestige_multiplier() -> Rate {
    dec!(1.5)
}

/// Catalog validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Two entries share an id.
    #[error("duplicate upgrade id: {0}")]
    DuplicateId(UpgradeId),
    /// Costs must grow with level.
    #[error("growth rate of {0} must be > 1")]
    GrowthRateTooLow(UpgradeId),
    /// Costs and outputs must be non-negative.
    #[error("negative cost or output on {0}")]
    NegativeValue(UpgradeId),
    /// Display names must not be blank.
    #[error("upgrade {0} has an empty name")]
    EmptyName(UpgradeId),
    /// A converter must turn one resource into a different one.
    #[error("converter {0} consumes the resource it produces")]
    SelfConverter(UpgradeId),
    /// Prestige multipliers must be strictly positive.
    #[error("prestige multiplier of {0} must be > 0")]
    NonPositiveMultiplier(UpgradeId),
    /// YAML input did not describe a catalog.
    #[error("invalid catalog document: {0}")]
    Malformed(String),
}

/// Validate a single upgrade definition.
pub fn validate_definition(def: &UpgradeDefinition) -> Result<(), ValidationError> {
    if def.name.trim().is_empty() {
        return Err(ValidationError::EmptyName(def.id.clone()));
    }
    if def.growth_rate <= Rate::ONE {
        return Err(ValidationError::GrowthRateTooLow(def.id.clone()));
    }
    if def.base_cost.is_negative() || def.base_output_per_level.is_negative() {
        return Err(ValidationError::NegativeValue(def.id.clone()));
    }
    if let Some(t) = &def.unlock_threshold {
        if t.is_negative() {
            return Err(ValidationError::NegativeValue(def.id.clone()));
        }
    }
    if let UpgradeKind::Converter { consumes, produces } = &def.kind {
        if consumes == produces {
            return Err(ValidationError::SelfConverter(def.id.clone()));
        }
    }
    Ok(())
}

/// Validate a prestige upgrade definition.
pub fn validate_prestige_definition(def: &PrestigeUpgradeDefinition) -> Result<(), ValidationError> {
    if def.name.trim().is_empty() {
        return Err(ValidationError::EmptyName(def.id.clone()));
    }
    if def.growth_rate <= Rate::ONE {
        return Err(ValidationError::GrowthRateTooLow(def.id.clone()));
    }
    if def.base_cost.is_negative() {
        return Err(ValidationError::NegativeValue(def.id.clone()));
    }
    if def.multiplier_per_level <= Rate::ZERO {
        return Err(ValidationError::NonPositiveMultiplier(def.id.clone()));
    }
    Ok(())
}

/// The full set of purchasable upgrades.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub upgrades: Vec<UpgradeDefinition>,
    #[serde(default)]
    pub prestige_upgrades: Vec<PrestigeUpgradeDefinition>,
}

impl Default for Catalog {
    fn default() -> Self {
        default_catalog()
    }
}

impl Catalog {
    /// Parse and validate a catalog written in YAML.
    pub fn from_yaml_str(text: &str) -> Result<Self, ValidationError> {
        let catalog: Catalog =
            serde_yaml::from_str(text).map_err(|e| ValidationError::Malformed(e.to_string()))?;
        catalog.validate()?;
        debug!(
            upgrades = catalog.upgrades.len(),
            prestige_upgrades = catalog.prestige_upgrades.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    /// Validate every entry and id uniqueness across both lists.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut ids: BTreeSet<&UpgradeId> = BTreeSet::new();
        for def in &self.upgrades {
            validate_definition(def)?;
            if !ids.insert(&def.id) {
                return Err(ValidationError::DuplicateId(def.id.clone()));
            }
        }
        for def in &self.prestige_upgrades {
            validate_prestige_definition(def)?;
            if !ids.insert(&def.id) {
                return Err(ValidationError::DuplicateId(def.id.clone()));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &UpgradeId) -> Option<&UpgradeDefinition> {
        self.upgrades.iter().find(|d| &d.id == id)
    }

    pub fn get_prestige(&self, id: &UpgradeId) -> Option<&PrestigeUpgradeDefinition> {
        self.prestige_upgrades.iter().find(|d| &d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UpgradeDefinition> {
        self.upgrades.iter()
    }
}

/// Level owned per upgrade id. Absent ids are level 0.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpgradeState {
    levels: BTreeMap<UpgradeId, u64>,
}

impl UpgradeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owned level of `id`.
    pub fn level(&self, id: &UpgradeId) -> u64 {
        self.levels.get(id).copied().unwrap_or(0)
    }

    /// Raise the level of `id` by `by`.
    pub fn increment(&mut self, id: &UpgradeId, by: u64) {
        let lvl = self.levels.entry(id.clone()).or_insert(0);
        *lvl = lvl.saturating_add(by);
    }

    /// Overwrite a level; used when restoring saves.
    pub fn set_level(&mut self, id: UpgradeId, level: u64) {
        if level == 0 {
            self.levels.remove(&id);
        } else {
            self.levels.insert(id, level);
        }
    }

    /// Drop every level back to zero.
    pub fn reset(&mut self) {
        self.levels.clear();
    }

    /// Non-zero levels in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&UpgradeId, u64)> {
        self.levels.iter().map(|(k, v)| (k, *v))
    }
}

fn upgrade(
    id: &str,
    name: &str,
    description: &str,
    base_cost: Decimal,
    growth_rate: Rate,
    output: Decimal,
    kind: UpgradeKind,
    unlock_threshold: Option<Decimal>,
) -> UpgradeDefinition {
    UpgradeDefinition {
        id: UpgradeId::new(id),
        name: name.to_string(),
        description: description.to_string(),
        base_cost,
        growth_rate,
        base_output_per_level: output,
        cost_resource: ResourceKind::Tokens,
        kind,
        unlock_threshold,
    }
}

/// Built-in catalog shipped with the game.
pub fn default_catalog() -> Catalog {
    use ResourceKind::*;
    let mut ast_cache = upgrade(
        "ast_cache",
        "AST Cache",
        "Reuses parsed subtrees, producing AST nodes on its own.",
        Decimal::from(100u32),
        dec!(1.25),
        Decimal::new(5, 1),
        UpgradeKind::Generator { produces: AstNodes },
        Some(Decimal::from(50u32)),
    );
    ast_cache.cost_resource = AstNodes;

    Catalog {
        upgrades: vec![
            upgrade(
                "syntax_highlighter",
                "Syntax Highlighter",
                "Colour makes manual analysis faster.",
                Decimal::from(10u32),
                dec!(1.15),
                Decimal::from(1u32),
                UpgradeKind::Manual,
                None,
            ),
            upgrade(
                "code_completion",
                "Code Completion",
                "Suggestions multiply every manual analysis.",
                Decimal::from(250u32),
                dec!(1.2),
                Decimal::from(5u32),
                UpgradeKind::Manual,
                Some(Decimal::from(200u32)),
            ),
            upgrade(
                "lexer_daemon",
                "Lexer Daemon",
                "A background process that tokenizes open files.",
                Decimal::from(15u32),
                dec!(1.15),
                Decimal::from(1u32),
                UpgradeKind::Generator { produces: Tokens },
                None,
            ),
            upgrade(
                "regex_engine",
                "Regex Engine",
                "Compiled patterns scan source in bulk.",
                Decimal::from(100u32),
                dec!(1.15),
                Decimal::from(5u32),
                UpgradeKind::Generator { produces: Tokens },
                Some(Decimal::from(50u32)),
            ),
            upgrade(
                "parallel_scanner",
                "Parallel Scanner",
                "Splits input across cores.",
                Decimal::from(1100u32),
                dec!(1.15),
                Decimal::from(40u32),
                UpgradeKind::Generator { produces: Tokens },
                Some(Decimal::from(1000u32)),
            ),
            upgrade(
                "recursive_descent",
                "Recursive Descent Parser",
                "Turns token stock into AST nodes.",
                Decimal::from(50u32),
                dec!(1.15),
                Decimal::new(1, 3),
                UpgradeKind::Converter {
                    consumes: Tokens,
                    produces: AstNodes,
                },
                Some(Decimal::from(25u32)),
            ),
            upgrade(
                "lr_parser",
                "LR Parser",
                "Table-driven parsing with higher throughput.",
                Decimal::from(1000u32),
                dec!(1.2),
                Decimal::new(5, 3),
                UpgradeKind::Converter {
                    consumes: Tokens,
                    produces: AstNodes,
                },
                Some(Decimal::from(500u32)),
            ),
            ast_cache,
        ],
        prestige_upgrades: vec![
            PrestigeUpgradeDefinition {
                id: UpgradeId::new("optimizing_backend"),
                name: "Optimizing Backend".to_string(),
                description: "Permanently multiplies all production.".to_string(),
                base_cost: Decimal::from(1u32),
                growth_rate: dec!(2),
                multiplier_per_level: dec!(1.5),
            },
            PrestigeUpgradeDefinition {
                id: UpgradeId::new("incremental_builds"),
                name: "Incremental Builds".to_string(),
                description: "Only rebuild what changed.".to_string(),
                base_cost: Decimal::from(5u32),
                growth_rate: dec!(2.5),
                multiplier_per_level: dec!(1.5),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_is_valid() {
        let c = default_catalog();
        c.validate().unwrap();
        assert!(c.get(&UpgradeId::new("lexer_daemon")).is_some());
        assert!(c.get_prestige(&UpgradeId::new("optimizing_backend")).is_some());
    }

    #[test]
    fn reference_resource_follows_kind() {
        let c = default_catalog();
        let conv = c.get(&UpgradeId::new("recursive_descent")).unwrap();
        assert_eq!(conv.reference_resource(), ResourceKind::Tokens);
        let cache = c.get(&UpgradeId::new("ast_cache")).unwrap();
        assert_eq!(cache.reference_resource(), ResourceKind::AstNodes);
        let manual = c.get(&UpgradeId::new("syntax_highlighter")).unwrap();
        assert_eq!(manual.reference_resource(), ResourceKind::Tokens);
        assert_eq!(manual.produced_resource(), None);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut c = default_catalog();
        let dup = c.upgrades[0].clone();
        c.upgrades.push(dup);
        assert!(matches!(c.validate(), Err(ValidationError::DuplicateId(_))));
    }

    #[test]
    fn growth_rate_must_exceed_one() {
        let mut c = default_catalog();
        c.upgrades[0].growth_rate = dec!(1);
        assert!(matches!(
            c.validate(),
            Err(ValidationError::GrowthRateTooLow(_))
        ));
    }

    #[test]
    fn self_converter_is_rejected() {
        let mut c = default_catalog();
        c.upgrades[5].kind = UpgradeKind::Converter {
            consumes: ResourceKind::Tokens,
            produces: ResourceKind::Tokens,
        };
        assert!(matches!(c.validate(), Err(ValidationError::SelfConverter(_))));
    }

    #[test]
    fn loads_yaml_catalog() {
        let yaml = r#"
upgrades:
  - id: keyboard
    name: Mechanical Keyboard
    base_cost: 5
    growth_rate: "1.1"
    base_output_per_level: "2"
    type: manual
  - id: bytecode_vm
    name: Bytecode VM
    base_cost: "1e3"
    growth_rate: "1.3"
    base_output_per_level: "0.01"
    type: converter
    consumes: tokens
    produces: astNodes
    unlock_threshold: 500
prestige_upgrades:
  - id: cloud_ci
    name: Cloud CI
    base_cost: 2
    growth_rate: "3"
"#;
        let c = Catalog::from_yaml_str(yaml).unwrap();
        assert_eq!(c.upgrades.len(), 2);
        let vm = c.get(&UpgradeId::new("bytecode_vm")).unwrap();
        assert_eq!(vm.base_cost, Decimal::from(1000u32));
        assert_eq!(vm.cost_resource, ResourceKind::Tokens);
        assert_eq!(
            vm.kind,
            UpgradeKind::Converter {
                consumes: ResourceKind::Tokens,
                produces: ResourceKind::AstNodes
            }
        );
        assert_eq!(c.prestige_upgrades[0].multiplier_per_level, dec!(1.5));
    }

    #[test]
    fn malformed_yaml_is_reported() {
        assert!(matches!(
            Catalog::from_yaml_str("upgrades: 12"),
            Err(ValidationError::Malformed(_))
        ));
    }

    #[test]
    fn upgrade_state_levels() {
        let mut s = UpgradeState::new();
        let id = UpgradeId::new("lexer_daemon");
        assert_eq!(s.level(&id), 0);
        s.increment(&id, 10);
        s.increment(&id, 1);
        assert_eq!(s.level(&id), 11);
        s.reset();
        assert_eq!(s.level(&id), 0);
    }
}
