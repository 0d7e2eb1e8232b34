#![deny(warnings)]

//! Runtime for Compiler Idle: the [`Engine`] aggregate a host drives.
//!
//! The host calls [`Engine::tick`] at its own cadence and forwards player
//! actions (purchases, prestige, manual analysis, Stage-3 controls). Every
//! call is synchronous; failures are returned as [`EngineError`] and leave
//! state untouched. [`Engine::snapshot`] gives a read-only view for
//! rendering.

pub mod config;
pub mod engine;
pub mod snapshot;

pub use config::{EngineConfig, DEFAULT_OFFLINE_CAP_SECONDS, DEFAULT_OFFLINE_STEP_SECONDS};
pub use engine::{Engine, TickReport};
pub use snapshot::{AnalysisResult, OfflineReport, Snapshot, Stage3View, UpgradeView};

use idle_core::{Decimal, InvalidBulkQuantity, LedgerError, ValidationError};
use idle_econ::EconError;
use idle_pipeline::PipelineError;
use persistence::SaveError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Econ(#[from] EconError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    InvalidBulkQuantity(#[from] InvalidBulkQuantity),
    #[error(transparent)]
    InvalidConfig(#[from] ValidationError),
    /// Ticks need a strictly positive elapsed time.
    #[error("tick delta must be positive, got {0}")]
    InvalidDelta(Decimal),
    #[error("developer mode is disabled")]
    DeveloperModeDisabled,
}

impl EngineError {
    /// True for the "not enough of a resource" failures of any subsystem.
    pub fn is_insufficient_resources(&self) -> bool {
        matches!(
            self,
            EngineError::Econ(EconError::InsufficientResources { .. })
                | EngineError::Pipeline(PipelineError::InsufficientResources { .. })
                | EngineError::Ledger(LedgerError::InsufficientResources { .. })
        )
    }
}
