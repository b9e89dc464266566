//! Skill orchestration core
//!
//! # Architecture
//!
//! - **SkillExecutor**: runs skills under a deadline, alone, in parallel or in sequence
//! - **ComplexityAnalyzer**: scores an invocation and splits it when it is too heavy
//! - **DualAgentRunner**: enrich → decide → act → phrase → log for dual-agent skills
//! - **SkillOrchestrator**: routes a request and ties the pieces together
//!
//! # Usage
//!
//! ```no_run
//! use orchestrator::SkillOrchestrator;
//! use skill_core::OrchestrationContext;
//!
//! #[tokio::main]
//! async fn main() {
//!     let orchestrator = SkillOrchestrator::builder().build();
//!     let result = orchestrator
//!         .route("What's the price of the pro plan?".into(), &OrchestrationContext::new())
//!         .await;
//!     println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
//! }
//! ```

pub mod complexity;
pub mod dual_agent;
pub mod executor;
pub mod orchestrator;
mod sink;

pub use complexity::{
    ComplexityAnalyzer, ComplexityMetrics, ComplexityWarning, Recommendation, WarningReason,
};
pub use dual_agent::{DualAgentRunner, DualAgentStage, EnrichmentOutcome};
pub use executor::{ExecuteOptions, SequenceOptions, SkillExecutor};
pub use orchestrator::{SkillOrchestrator, SkillOrchestratorBuilder};

pub use router::{IntentRouter, RouteRequest};
pub use skill_core::TracingLogSink;
