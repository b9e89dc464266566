//! Contracts between the orchestration core and its plug-ins

use crate::domain::{
    ExecutionResult, ExecutionScope, Intent, OrchestrationContext, Params, SkillDescriptor,
    TenantProfile,
};
use crate::errors::{EnrichmentError, LogError, ValidationError};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Capabilities shared by every skill
pub trait Skill: Send + Sync {
    /// Static metadata
    fn descriptor(&self) -> &SkillDescriptor;

    /// Check params before anything runs. Must not have side effects.
    fn validate(&self, params: &Params) -> Result<(), ValidationError> {
        let _ = params;
        Ok(())
    }
}

/// A skill that does its work in a single `execute` call.
///
/// Returning `Err` signals an unexpected fault; the executor turns it into an
/// `ExecutionFault` result. Expected failures should be returned as
/// `ExecutionResult` values with `success: false`.
#[async_trait]
pub trait SimpleSkill: Skill {
    async fn execute(&self, params: Params, scope: ExecutionScope)
        -> anyhow::Result<ExecutionResult>;
}

/// A skill that separates deciding, acting and phrasing.
///
/// `analyze_strategy` and `generate_response` are synchronous and must be
/// deterministic for the same inputs; only `perform_action` may have side
/// effects.
#[async_trait]
pub trait DualAgentSkill: Skill {
    /// Agent 1: map params and enriched context to an intent
    fn analyze_strategy(
        &self,
        params: &Params,
        context: &OrchestrationContext,
    ) -> anyhow::Result<Intent>;

    /// The side-effecting step, parameterized by the computed intent
    async fn perform_action(
        &self,
        intent: &Intent,
        params: &Params,
        scope: &ExecutionScope,
    ) -> anyhow::Result<Value>;

    /// Agent 2: phrase the outcome for the user
    fn generate_response(
        &self,
        intent: &Intent,
        action_output: &Value,
        context: &OrchestrationContext,
    ) -> anyhow::Result<String>;
}

/// Tagged handle stored by the registry; dispatch is by variant
#[derive(Clone)]
pub enum SkillHandle {
    Simple(Arc<dyn SimpleSkill>),
    DualAgent(Arc<dyn DualAgentSkill>),
}

impl SkillHandle {
    pub fn simple<S: SimpleSkill + 'static>(skill: S) -> Self {
        SkillHandle::Simple(Arc::new(skill))
    }

    pub fn dual_agent<S: DualAgentSkill + 'static>(skill: S) -> Self {
        SkillHandle::DualAgent(Arc::new(skill))
    }

    pub fn descriptor(&self) -> &SkillDescriptor {
        match self {
            SkillHandle::Simple(skill) => skill.descriptor(),
            SkillHandle::DualAgent(skill) => skill.descriptor(),
        }
    }

    pub fn id(&self) -> &str {
        &self.descriptor().id
    }

    pub fn validate(&self, params: &Params) -> Result<(), ValidationError> {
        match self {
            SkillHandle::Simple(skill) => skill.validate(params),
            SkillHandle::DualAgent(skill) => skill.validate(params),
        }
    }

    pub fn is_dual_agent(&self) -> bool {
        matches!(self, SkillHandle::DualAgent(_))
    }
}

impl fmt::Debug for SkillHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_dual_agent() {
            "DualAgent"
        } else {
            "Simple"
        };
        f.debug_struct("SkillHandle")
            .field("kind", &kind)
            .field("id", &self.id())
            .finish()
    }
}

/// External store used to resolve a tenant/product key
#[async_trait]
pub trait ContextStore: Send + Sync {
    async fn resolve_tenant(
        &self,
        product_key: &str,
    ) -> Result<Option<TenantProfile>, EnrichmentError>;
}

/// What is being recorded to the logging sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Request,
    Response,
    Error,
    Execution,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Request => "request",
            LogKind::Response => "response",
            LogKind::Error => "error",
            LogKind::Execution => "execution",
        }
    }
}

/// Best-effort logging collaborator. Callers may ignore the result.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn record(
        &self,
        kind: LogKind,
        payload: Value,
        context: &OrchestrationContext,
    ) -> Result<(), LogError>;
}

/// Sink that forwards records to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

#[async_trait]
impl LogSink for TracingLogSink {
    async fn record(
        &self,
        kind: LogKind,
        payload: Value,
        context: &OrchestrationContext,
    ) -> Result<(), LogError> {
        tracing::info!(
            target: "skillmesh::log_sink",
            kind = kind.as_str(),
            session_id = context.session_id.as_deref().unwrap_or("-"),
            tenant = context.tenant_key.as_deref().unwrap_or("-"),
            payload = %payload,
            "Recorded orchestration event"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SkillCategory;
    use crate::errors::ErrorKind;

    struct Echo {
        descriptor: SkillDescriptor,
    }

    impl Skill for Echo {
        fn descriptor(&self) -> &SkillDescriptor {
            &self.descriptor
        }

        fn validate(&self, params: &Params) -> Result<(), ValidationError> {
            if params.contains_key("text") {
                Ok(())
            } else {
                Err(ValidationError::MissingField("text".to_string()))
            }
        }
    }

    #[async_trait]
    impl SimpleSkill for Echo {
        async fn execute(
            &self,
            params: Params,
            _scope: ExecutionScope,
        ) -> anyhow::Result<ExecutionResult> {
            Ok(ExecutionResult::success(
                &self.descriptor.id,
                Value::Object(params),
            ))
        }
    }

    fn echo() -> Echo {
        Echo {
            descriptor: SkillDescriptor::new("echo", "Echo", SkillCategory::Support)
                .expect("valid id"),
        }
    }

    #[test]
    fn test_handle_delegates_validation() {
        let handle = SkillHandle::simple(echo());
        assert_eq!(handle.id(), "echo");
        assert!(!handle.is_dual_agent());

        let err = handle.validate(&Params::new()).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("text".to_string()));
    }

    #[tokio::test]
    async fn test_tracing_sink_never_fails() {
        let sink = TracingLogSink;
        let result = sink
            .record(
                LogKind::Error,
                serde_json::json!({"kind": ErrorKind::Timeout}),
                &OrchestrationContext::default(),
            )
            .await;
        assert!(result.is_ok());
    }
}
