#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use skill_core::{
    DualAgentSkill, ExecutionResult, ExecutionScope, Intent, LogError, LogKind, LogSink,
    OrchestrationContext, Params, SimpleSkill, Skill, SkillCategory, SkillDescriptor,
    SkillHandle, ValidationError,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// `(skill_id, started, finished)` per run
pub type Spans = Arc<Mutex<Vec<(String, Instant, Instant)>>>;

pub fn descriptor(id: &str, category: SkillCategory) -> SkillDescriptor {
    SkillDescriptor::new(id, format!("Test {id}"), category).expect("valid id")
}

pub fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        other => panic!("params must be an object, got {other}"),
    }
}

/// How a test skill behaves when executed
#[derive(Clone)]
pub enum Behavior {
    /// Echo params back after an optional delay
    Echo(Duration),
    /// Never settle
    Hang,
    /// Sleep, but stop early if cancelled and record it
    SleepUntilCancelled(Duration, Arc<AtomicBool>),
    Fail(&'static str),
    Panic(&'static str),
    /// Return `success: false` itself
    Report(&'static str),
    /// Sleep, then push the run's start and end instants
    Record(Duration, Spans),
}

pub struct TestSkill {
    descriptor: SkillDescriptor,
    behavior: Behavior,
    required: Option<&'static str>,
    pub calls: Arc<AtomicUsize>,
}

impl TestSkill {
    pub fn new(id: &str, behavior: Behavior) -> Self {
        Self {
            descriptor: descriptor(id, SkillCategory::Operations),
            behavior,
            required: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_category(mut self, category: SkillCategory) -> Self {
        self.descriptor.category = category;
        self
    }

    pub fn requiring(mut self, field: &'static str) -> Self {
        self.required = Some(field);
        self
    }

    pub fn handle(self) -> SkillHandle {
        SkillHandle::simple(self)
    }
}

impl Skill for TestSkill {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }

    fn validate(&self, params: &Params) -> Result<(), ValidationError> {
        match self.required {
            Some(field) if !params.contains_key(field) => {
                Err(ValidationError::MissingField(field.to_string()))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl SimpleSkill for TestSkill {
    async fn execute(
        &self,
        params: Params,
        scope: ExecutionScope,
    ) -> anyhow::Result<ExecutionResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let id = self.descriptor.id.clone();
        match &self.behavior {
            Behavior::Echo(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(ExecutionResult::success(id, Value::Object(params)))
            }
            Behavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            Behavior::SleepUntilCancelled(delay, cancelled) => {
                tokio::select! {
                    _ = tokio::time::sleep(*delay) => {}
                    _ = scope.cancellation.cancelled() => cancelled.store(true, Ordering::SeqCst),
                }
                Ok(ExecutionResult::success(id, json!({})))
            }
            Behavior::Fail(message) => Err(anyhow::anyhow!("{}", message)),
            Behavior::Panic(message) => panic!("{}", message),
            Behavior::Report(message) => Ok(ExecutionResult {
                success: false,
                error: Some(message.to_string()),
                ..ExecutionResult::success(id, Value::Null)
            }),
            Behavior::Record(delay, spans) => {
                let started = Instant::now();
                tokio::time::sleep(*delay).await;
                spans
                    .lock()
                    .expect("spans lock")
                    .push((id.clone(), started, Instant::now()));
                Ok(ExecutionResult::success(id, json!({})))
            }
        }
    }
}

/// Dual-agent skill whose action step can be made to fail or stall
pub struct ConciergeSkill {
    descriptor: SkillDescriptor,
    fail_action: bool,
    action_delay: Duration,
}

impl ConciergeSkill {
    pub fn new() -> Self {
        Self {
            descriptor: descriptor("concierge", SkillCategory::Support),
            fail_action: false,
            action_delay: Duration::ZERO,
        }
    }

    pub fn failing_action() -> Self {
        Self {
            fail_action: true,
            ..Self::new()
        }
    }

    pub fn slow_action(delay: Duration) -> Self {
        Self {
            action_delay: delay,
            ..Self::new()
        }
    }

    pub fn handle(self) -> SkillHandle {
        SkillHandle::dual_agent(self)
    }
}

impl Skill for ConciergeSkill {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }
}

#[async_trait]
impl DualAgentSkill for ConciergeSkill {
    fn analyze_strategy(
        &self,
        params: &Params,
        _context: &OrchestrationContext,
    ) -> anyhow::Result<Intent> {
        let topic = params
            .get("topic")
            .and_then(Value::as_str)
            .unwrap_or("general");
        Ok(Intent::new(topic, 0.8))
    }

    async fn perform_action(
        &self,
        intent: &Intent,
        _params: &Params,
        _scope: &ExecutionScope,
    ) -> anyhow::Result<Value> {
        tokio::time::sleep(self.action_delay).await;
        if self.fail_action {
            anyhow::bail!("booking backend unavailable");
        }
        Ok(json!({ "handled": intent.label }))
    }

    fn generate_response(
        &self,
        intent: &Intent,
        _action_output: &Value,
        context: &OrchestrationContext,
    ) -> anyhow::Result<String> {
        Ok(format!(
            "{} can help with {}",
            context.company_name.as_deref().unwrap_or("We"),
            intent.label
        ))
    }
}

/// Sink that keeps what it was given
#[derive(Default)]
pub struct RecordingSink {
    pub records: Mutex<Vec<(LogKind, Value)>>,
}

impl RecordingSink {
    pub fn kinds(&self) -> Vec<LogKind> {
        self.records
            .lock()
            .expect("sink lock")
            .iter()
            .map(|(kind, _)| *kind)
            .collect()
    }
}

#[async_trait]
impl LogSink for RecordingSink {
    async fn record(
        &self,
        kind: LogKind,
        payload: Value,
        _context: &OrchestrationContext,
    ) -> Result<(), LogError> {
        self.records.lock().expect("sink lock").push((kind, payload));
        Ok(())
    }
}

/// Give fire-and-forget tasks a chance to run
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
