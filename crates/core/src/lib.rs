//! Core domain models and contracts for SkillMesh
//!
//! This crate contains the types every other crate speaks:
//! - Domain: SkillDescriptor, Route, OrchestrationContext, ExecutionResult, Intent
//! - Contracts: Skill, SimpleSkill, DualAgentSkill, ContextStore, LogSink
//! - Errors: the orchestration error taxonomy

pub mod contracts;
pub mod domain;
pub mod errors;

pub use contracts::*;
pub use domain::*;
pub use errors::*;

/// Re-export common types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use tokio_util::sync::CancellationToken;
