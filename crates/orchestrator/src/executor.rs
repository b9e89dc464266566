//! Runs skills under a deadline and keeps per-skill invocation counts

use crate::dual_agent::DualAgentRunner;
use crate::sink::spawn_record;
use common::ExecutorConfig;
use dashmap::DashMap;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use skill_core::{
    ContextStore, ErrorKind, ExecutionResult, ExecutionScope, Invocation, LogKind, LogSink,
    OrchestrationContext, Params, SkillError, SkillHandle,
};
use skills::SkillRegistry;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinError;
use tracing::{info, warn};

/// Per-call options
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Overrides the configured default
    pub timeout: Option<Duration>,
    pub context: OrchestrationContext,
    /// Overrides the configured batch concurrency cap
    pub max_concurrency: Option<usize>,
}

impl ExecuteOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_context(mut self, context: OrchestrationContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct SequenceOptions {
    pub execute: ExecuteOptions,
    /// Stop after the first failed result
    pub stop_on_error: bool,
}

impl SequenceOptions {
    pub fn stop_on_error(mut self) -> Self {
        self.stop_on_error = true;
        self
    }
}

pub struct SkillExecutor {
    registry: Arc<SkillRegistry>,
    config: ExecutorConfig,
    stats: DashMap<String, u64>,
    dual_agent: DualAgentRunner,
    log_sink: Option<Arc<dyn LogSink>>,
}

impl SkillExecutor {
    pub fn new(registry: Arc<SkillRegistry>, config: ExecutorConfig) -> Self {
        Self {
            registry,
            config,
            stats: DashMap::new(),
            dual_agent: DualAgentRunner::new(),
            log_sink: None,
        }
    }

    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.dual_agent = self.dual_agent.with_log_sink(Arc::clone(&sink));
        self.log_sink = Some(sink);
        self
    }

    pub fn with_context_store(mut self, store: Arc<dyn ContextStore>) -> Self {
        self.dual_agent = self.dual_agent.with_context_store(store);
        self
    }

    pub fn registry(&self) -> &Arc<SkillRegistry> {
        &self.registry
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.config.default_timeout_ms)
    }

    /// Run one skill. Every outcome, including unknown ids, bad params,
    /// timeouts and panics, comes back as a result value.
    pub async fn execute(
        &self,
        skill_id: &str,
        params: Params,
        options: &ExecuteOptions,
    ) -> ExecutionResult {
        let started = Instant::now();

        let Some(handle) = self.registry.get(skill_id) else {
            warn!(skill_id, "Skill not found");
            return SkillError::NotFound {
                skill_id: skill_id.to_string(),
            }
            .into_result(skill_id)
            .with_elapsed(started.elapsed());
        };
        let skill_name = handle.descriptor().display_name.clone();

        if let Err(source) = handle.validate(&params) {
            warn!(skill_id, error = %source, "Skill validation failed");
            return SkillError::ValidationFailed {
                skill_id: skill_id.to_string(),
                source,
            }
            .into_result(skill_id)
            .with_skill_name(skill_name)
            .with_meta("params", Value::Object(params))
            .with_elapsed(started.elapsed());
        }

        let timeout = options.timeout.unwrap_or_else(|| self.default_timeout());
        let mut result = self
            .run_with_deadline(skill_id, handle, params, &options.context, timeout)
            .await;

        result.metadata.skill_id = skill_id.to_string();
        if result.metadata.skill_name.is_none() {
            result.metadata.skill_name = Some(skill_name);
        }
        if !result.success && result.metadata.error_kind.is_none() {
            result.metadata.error_kind = Some(ErrorKind::Reported);
        }
        let result = result.with_elapsed(started.elapsed());

        *self.stats.entry(skill_id.to_string()).or_insert(0) += 1;

        info!(
            skill_id,
            success = result.success,
            duration_ms = result.execution_time_ms,
            error_kind = result.error_kind().map(ErrorKind::as_str).unwrap_or("-"),
            "Skill execution completed"
        );
        spawn_record(
            self.log_sink.as_ref(),
            LogKind::Execution,
            json!({
                "skill_id": skill_id,
                "success": result.success,
                "execution_time_ms": result.execution_time_ms,
                "error": result.error,
            }),
            &options.context,
        );

        result
    }

    /// Spawn the skill body and race it against the deadline. On timeout the
    /// scope is cancelled and the task is left to finish on its own.
    async fn run_with_deadline(
        &self,
        skill_id: &str,
        handle: SkillHandle,
        params: Params,
        context: &OrchestrationContext,
        timeout: Duration,
    ) -> ExecutionResult {
        let scope = ExecutionScope::new(context.clone(), timeout);
        let cancellation = scope.cancellation.clone();

        let task = match handle {
            SkillHandle::Simple(skill) => {
                tokio::spawn(async move { skill.execute(params, scope).await })
            }
            SkillHandle::DualAgent(skill) => {
                let runner = self.dual_agent.clone();
                tokio::spawn(async move {
                    Ok::<_, anyhow::Error>(runner.run(skill, params, scope).await)
                })
            }
        };

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(Ok(result))) => result,
            Ok(Ok(Err(err))) => SkillError::ExecutionFault {
                skill_id: skill_id.to_string(),
                message: err.to_string(),
                stack: Some(format!("{err:?}")),
            }
            .into_result(skill_id),
            Ok(Err(join_err)) => {
                let (message, stack) = describe_join_error(join_err);
                SkillError::ExecutionFault {
                    skill_id: skill_id.to_string(),
                    message,
                    stack: Some(stack),
                }
                .into_result(skill_id)
            }
            Err(_) => {
                cancellation.cancel();
                warn!(
                    skill_id,
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "Skill timed out, detaching task"
                );
                SkillError::Timeout {
                    skill_id: skill_id.to_string(),
                    timeout,
                }
                .into_result(skill_id)
            }
        }
    }

    pub async fn execute_invocation(
        &self,
        invocation: Invocation,
        options: &ExecuteOptions,
    ) -> ExecutionResult {
        self.execute(&invocation.skill_id, invocation.params, options)
            .await
    }

    /// Run all invocations concurrently. Results line up with the input.
    pub async fn execute_multiple(
        &self,
        invocations: Vec<Invocation>,
        options: &ExecuteOptions,
    ) -> Vec<ExecutionResult> {
        let runs = invocations
            .into_iter()
            .map(|invocation| self.execute_invocation(invocation, options));

        match options.max_concurrency.or(self.config.max_concurrency) {
            Some(limit) => stream::iter(runs).buffered(limit.max(1)).collect().await,
            None => join_all(runs).await,
        }
    }

    /// Run invocations one after another
    pub async fn execute_sequence(
        &self,
        invocations: Vec<Invocation>,
        options: &SequenceOptions,
    ) -> Vec<ExecutionResult> {
        let mut results = Vec::with_capacity(invocations.len());
        for invocation in invocations {
            let result = self.execute_invocation(invocation, &options.execute).await;
            let failed = !result.success;
            results.push(result);
            if failed && options.stop_on_error {
                info!(completed = results.len(), "Sequence stopped after failure");
                break;
            }
        }
        results
    }

    pub fn execution_stats(&self) -> BTreeMap<String, u64> {
        self.stats
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    pub fn invocation_count(&self, skill_id: &str) -> u64 {
        self.stats.get(skill_id).map(|count| *count).unwrap_or(0)
    }

    pub fn reset_stats(&self) {
        self.stats.clear();
    }
}

fn describe_join_error(err: JoinError) -> (String, String) {
    if !err.is_panic() {
        return (err.to_string(), format!("{err:?}"));
    }
    let payload = err.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "skill panicked".to_string());
    let stack = format!("panic in skill task: {message}");
    (format!("skill panicked: {message}"), stack)
}
