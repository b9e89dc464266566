use crate::complexity::{ComplexityAnalyzer, ComplexityMetrics, Recommendation};
use crate::executor::{ExecuteOptions, SequenceOptions, SkillExecutor};
use common::{CoreConfig, OperationTimer};
use router::{IntentRouter, RouteRequest};
use serde_json::{json, Value};
use skill_core::{
    ContextStore, ExecutionResult, Invocation, LogSink, OrchestrationContext, Params,
    SkillDescriptor, SkillError,
};
use skills::SkillRegistry;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Caller-facing entry point: route, analyze, decompose, execute, compose.
pub struct SkillOrchestrator {
    registry: Arc<SkillRegistry>,
    router: IntentRouter,
    analyzer: ComplexityAnalyzer,
    executor: SkillExecutor,
}

#[derive(Default)]
pub struct SkillOrchestratorBuilder {
    config: CoreConfig,
    registry: Option<Arc<SkillRegistry>>,
    router: Option<IntentRouter>,
    context_store: Option<Arc<dyn ContextStore>>,
    log_sink: Option<Arc<dyn LogSink>>,
}

impl SkillOrchestratorBuilder {
    pub fn config(mut self, config: CoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(mut self, registry: Arc<SkillRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn router(mut self, router: IntentRouter) -> Self {
        self.router = Some(router);
        self
    }

    pub fn context_store(mut self, store: Arc<dyn ContextStore>) -> Self {
        self.context_store = Some(store);
        self
    }

    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = Some(sink);
        self
    }

    /// Uses the reference skills when no registry was given
    pub fn build(self) -> SkillOrchestrator {
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(SkillRegistry::with_defaults()));
        let router = self
            .router
            .unwrap_or_else(|| IntentRouter::new(self.config.router.clone()));

        let mut executor = SkillExecutor::new(Arc::clone(&registry), self.config.executor.clone());
        if let Some(store) = self.context_store {
            executor = executor.with_context_store(store);
        }
        if let Some(sink) = self.log_sink {
            executor = executor.with_log_sink(sink);
        }

        SkillOrchestrator {
            registry,
            router,
            analyzer: ComplexityAnalyzer::new(self.config.complexity),
            executor,
        }
    }
}

impl SkillOrchestrator {
    pub fn builder() -> SkillOrchestratorBuilder {
        SkillOrchestratorBuilder::default()
    }

    pub fn registry(&self) -> &Arc<SkillRegistry> {
        &self.registry
    }

    pub fn router(&self) -> &IntentRouter {
        &self.router
    }

    pub async fn route(
        &self,
        request: RouteRequest,
        context: &OrchestrationContext,
    ) -> ExecutionResult {
        let mut timer = OperationTimer::new("route");
        let route = self.router.route(&request, context);
        let route_meta = serde_json::to_value(&route).unwrap_or(Value::Null);
        timer.add_field("routed_to", &route.skill_id);

        let handle = match self.router.resolve(&route, &self.registry) {
            Ok(handle) => handle,
            Err(err) => {
                let result = err.into_result(&route.skill_id).with_meta("route", route_meta);
                timer.finish_with_result::<(), _>(&Err(result.error.clone().unwrap_or_default()));
                return result;
            }
        };
        let skill_id = handle.id().to_string();
        timer.add_field("skill_id", &skill_id);

        let mut params = request.params;
        if let Some(text) = request.text.filter(|t| !t.trim().is_empty()) {
            params.entry("message").or_insert(Value::String(text));
        }
        let invocation = Invocation::new(skill_id.clone(), params);
        let metrics = self.analyzer.analyze(handle.descriptor(), &invocation.params);
        let options = ExecuteOptions::default().with_context(context.clone());

        let subtasks = if metrics.recommendation == Recommendation::Refactor {
            self.analyzer.decompose(&invocation, &metrics)
        } else {
            vec![invocation]
        };

        let result = if subtasks.len() > 1 {
            info!(
                skill_id = %skill_id,
                items_count = subtasks.len() as u64,
                "Executing decomposed request"
            );
            let started = Instant::now();
            let results = self.executor.execute_multiple(subtasks, &options).await;
            compose(&skill_id, results, started.elapsed())
        } else {
            match subtasks.into_iter().next() {
                Some(single) => self.executor.execute_invocation(single, &options).await,
                None => SkillError::NotFound { skill_id: skill_id.clone() }.into_result(&skill_id),
            }
        };

        let result = self
            .monitored(result)
            .with_meta("route", route_meta)
            .with_meta("complexity", metrics.recommendation.as_str());

        timer.add_field("success", result.success);
        timer.finish();
        result
    }

    pub async fn execute(
        &self,
        skill_id: &str,
        params: Params,
        options: &ExecuteOptions,
    ) -> ExecutionResult {
        let result = self.executor.execute(skill_id, params, options).await;
        self.monitored(result)
    }

    pub async fn execute_multiple(
        &self,
        invocations: Vec<Invocation>,
        options: &ExecuteOptions,
    ) -> Vec<ExecutionResult> {
        let results = self.executor.execute_multiple(invocations, options).await;
        results.into_iter().map(|r| self.monitored(r)).collect()
    }

    pub async fn execute_sequence(
        &self,
        invocations: Vec<Invocation>,
        options: &SequenceOptions,
    ) -> Vec<ExecutionResult> {
        let results = self.executor.execute_sequence(invocations, options).await;
        results.into_iter().map(|r| self.monitored(r)).collect()
    }

    /// Attach `complexity_warning` when the run looks overloaded
    fn monitored(&self, result: ExecutionResult) -> ExecutionResult {
        match self.analyzer.monitor(&result) {
            Some(warning) => result.with_meta(
                "complexity_warning",
                serde_json::to_value(&warning).unwrap_or(Value::Null),
            ),
            None => result,
        }
    }

    /// Metrics only; nothing runs
    pub fn analyze(
        &self,
        skill_id: &str,
        params: &Params,
    ) -> Result<ComplexityMetrics, SkillError> {
        let handle = self.registry.get(skill_id).ok_or_else(|| SkillError::NotFound {
            skill_id: skill_id.to_string(),
        })?;
        Ok(self.analyzer.analyze(handle.descriptor(), params))
    }

    /// Preview of how an invocation would be split
    pub fn plan(&self, invocation: &Invocation) -> Result<Vec<Invocation>, SkillError> {
        let metrics = self.analyze(&invocation.skill_id, &invocation.params)?;
        Ok(self.analyzer.decompose(invocation, &metrics))
    }

    pub fn available_skills(&self) -> Vec<SkillDescriptor> {
        self.registry.descriptors()
    }

    pub fn execution_stats(&self) -> BTreeMap<String, u64> {
        self.executor.execution_stats()
    }

    pub fn reset_stats(&self) {
        self.executor.reset_stats();
    }
}

/// Fold sub-task results into one result; success only if all succeeded
fn compose(skill_id: &str, results: Vec<ExecutionResult>, elapsed: Duration) -> ExecutionResult {
    let total = results.len();
    let first_failure = results.iter().find(|r| !r.success);
    let failed = results.iter().filter(|r| !r.success).count();
    let error_kind = first_failure.and_then(|r| r.error_kind().copied());

    let data = json!({
        "results": results,
        "total": total,
        "succeeded": total - failed,
    });

    let mut composed = ExecutionResult::success(skill_id, data)
        .with_elapsed(elapsed)
        .with_meta("subtasks", total);
    if failed > 0 {
        composed.success = false;
        composed.error = Some(format!("{failed} of {total} sub-tasks failed"));
        composed.metadata.error_kind = error_kind;
    }
    composed
}
