//! Runs a dual-agent skill: enrich context, decide, act, phrase, log.

use crate::sink::spawn_record;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use skill_core::{
    ContextStore, DualAgentSkill, ErrorKind, ExecutionResult, ExecutionScope, Intent, LogKind,
    LogSink, OrchestrationContext, Params, SkillError,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DualAgentStage {
    Idle,
    ContextEnriched,
    StrategyAnalyzed,
    ActionPerformed,
    ResponseGenerated,
    Logged { success: bool },
}

impl DualAgentStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DualAgentStage::Idle => "idle",
            DualAgentStage::ContextEnriched => "context_enriched",
            DualAgentStage::StrategyAnalyzed => "strategy_analyzed",
            DualAgentStage::ActionPerformed => "action_performed",
            DualAgentStage::ResponseGenerated => "response_generated",
            DualAgentStage::Logged { success: true } => "logged_success",
            DualAgentStage::Logged { success: false } => "logged_error",
        }
    }
}

impl fmt::Display for DualAgentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the enrichment step, recorded in `metadata.enrichment`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnrichmentOutcome {
    Applied,
    /// No tenant key on the context, or no store configured
    Skipped,
    NotFound,
    Failed { error_kind: String, error: String },
}

#[derive(Clone, Default)]
pub struct DualAgentRunner {
    context_store: Option<Arc<dyn ContextStore>>,
    log_sink: Option<Arc<dyn LogSink>>,
}

impl fmt::Debug for DualAgentRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DualAgentRunner")
            .field("context_store", &self.context_store.is_some())
            .field("log_sink", &self.log_sink.is_some())
            .finish()
    }
}

struct Stages(Vec<DualAgentStage>);

impl Stages {
    fn reach(&mut self, stage: DualAgentStage) {
        debug!(stage = stage.as_str(), "Dual-agent stage reached");
        self.0.push(stage);
    }

    fn last(&self) -> DualAgentStage {
        self.0.last().copied().unwrap_or(DualAgentStage::Idle)
    }

    fn to_value(&self) -> Value {
        Value::Array(self.0.iter().map(|s| json!(s.as_str())).collect())
    }
}

impl DualAgentRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context_store(mut self, store: Arc<dyn ContextStore>) -> Self {
        self.context_store = Some(store);
        self
    }

    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = Some(sink);
        self
    }

    /// Resolve the tenant profile into a new context. Never fails.
    pub async fn enrich(
        &self,
        context: &OrchestrationContext,
    ) -> (OrchestrationContext, EnrichmentOutcome) {
        let (Some(store), Some(key)) = (&self.context_store, context.tenant_key.as_deref()) else {
            return (context.clone(), EnrichmentOutcome::Skipped);
        };

        match store.resolve_tenant(key).await {
            Ok(Some(profile)) => (context.enriched_with(&profile), EnrichmentOutcome::Applied),
            Ok(None) => {
                debug!(tenant = key, "No tenant profile found");
                (context.clone(), EnrichmentOutcome::NotFound)
            }
            Err(e) => {
                let err = SkillError::from(e);
                warn!(
                    tenant = key,
                    error = %err,
                    "Context enrichment failed, continuing without it"
                );
                (
                    context.clone(),
                    EnrichmentOutcome::Failed {
                        error_kind: err.kind().to_string(),
                        error: err.to_string(),
                    },
                )
            }
        }
    }

    pub async fn run(
        &self,
        skill: Arc<dyn DualAgentSkill>,
        params: Params,
        scope: ExecutionScope,
    ) -> ExecutionResult {
        let skill_id = skill.descriptor().id.clone();
        let mut stages = Stages(vec![DualAgentStage::Idle]);

        let (context, enrichment) = self.enrich(&scope.context).await;
        stages.reach(DualAgentStage::ContextEnriched);
        let scope = ExecutionScope { context, ..scope };

        spawn_record(
            self.log_sink.as_ref(),
            LogKind::Request,
            json!({ "skill_id": skill_id, "params": params }),
            &scope.context,
        );

        // Cancelled once the executor's deadline passes
        let pipeline = Self::pipeline(skill.as_ref(), &params, &scope, &mut stages);
        let outcome = tokio::select! {
            biased;
            _ = scope.cancellation.cancelled() => None,
            outcome = pipeline => Some(outcome),
        };

        let result = match outcome {
            Some(Ok((intent, action, message))) => {
                stages.reach(DualAgentStage::Logged { success: true });
                spawn_record(
                    self.log_sink.as_ref(),
                    LogKind::Response,
                    json!({ "skill_id": skill_id, "message": message, "intent": intent.label }),
                    &scope.context,
                );
                ExecutionResult::success(
                    &skill_id,
                    json!({ "message": message, "intent": intent, "action": action }),
                )
            }
            Some(Err(err)) => {
                let failed_after =
                    self.log_failure(&skill_id, &err.to_string(), &mut stages, &scope);
                SkillError::ExecutionFault {
                    skill_id: skill_id.clone(),
                    message: err.to_string(),
                    stack: Some(format!("{err:?}")),
                }
                .into_result(&skill_id)
                .with_meta("failed_after", failed_after.as_str())
            }
            None => {
                let message = "cancelled after the execution deadline";
                let failed_after = self.log_failure(&skill_id, message, &mut stages, &scope);
                warn!(
                    skill_id = %skill_id,
                    failed_after = failed_after.as_str(),
                    "Dual-agent run cancelled"
                );
                ExecutionResult::failure(&skill_id, ErrorKind::Timeout, message)
                    .with_meta("failed_after", failed_after.as_str())
            }
        };

        result
            .with_skill_name(skill.descriptor().display_name.clone())
            .with_meta("stages", stages.to_value())
            .with_meta(
                "enrichment",
                serde_json::to_value(&enrichment).unwrap_or(Value::Null),
            )
    }

    /// Reach the error terminal stage and record it; returns the last stage
    /// completed before the failure
    fn log_failure(
        &self,
        skill_id: &str,
        error: &str,
        stages: &mut Stages,
        scope: &ExecutionScope,
    ) -> DualAgentStage {
        let failed_after = stages.last();
        stages.reach(DualAgentStage::Logged { success: false });
        spawn_record(
            self.log_sink.as_ref(),
            LogKind::Error,
            json!({
                "skill_id": skill_id,
                "error": error,
                "failed_after": failed_after.as_str(),
            }),
            &scope.context,
        );
        failed_after
    }

    async fn pipeline(
        skill: &dyn DualAgentSkill,
        params: &Params,
        scope: &ExecutionScope,
        stages: &mut Stages,
    ) -> anyhow::Result<(Intent, Value, String)> {
        let intent = skill.analyze_strategy(params, &scope.context)?;
        stages.reach(DualAgentStage::StrategyAnalyzed);

        let action = skill.perform_action(&intent, params, scope).await?;
        stages.reach(DualAgentStage::ActionPerformed);

        let message = skill.generate_response(&intent, &action, &scope.context)?;
        stages.reach(DualAgentStage::ResponseGenerated);

        Ok((intent, action, message))
    }
}
