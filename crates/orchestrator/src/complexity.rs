//! Structural complexity scoring and decomposition of skill invocations
//!
//! Only the literal shape of the params is inspected: key count, nested
//! values, batch payloads and a few name heuristics. Nothing is executed.

use common::ComplexityConfig;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use skill_core::{ExecutionResult, Invocation, Params, SkillCategory, SkillDescriptor};
use std::fmt;
use tracing::{debug, warn};

const BASE_EXECUTION_TIME_MS: u64 = 100;
const PER_ITEM_TIME_MS: u64 = 100;

const MESSAGING_TERMS: [&str; 4] = ["email", "sms", "message", "notification"];
const DATA_TERMS: [&str; 4] = ["database", "query", "api", "data"];
const AI_TERMS: [&str; 4] = ["ai", "ml", "insight", "predict"];

/// Keys that carry the items of a flagged batch
const BATCH_DATA_KEYS: [&str; 3] = ["data", "items", "records"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Simple,
    Moderate,
    Complex,
    Refactor,
}

impl Recommendation {
    fn from_points(points: u32) -> Self {
        match points {
            6.. => Recommendation::Refactor,
            4..=5 => Recommendation::Complex,
            2..=3 => Recommendation::Moderate,
            _ => Recommendation::Simple,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Simple => "simple",
            Recommendation::Moderate => "moderate",
            Recommendation::Complex => "complex",
            Recommendation::Refactor => "refactor",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityMetrics {
    pub cyclomatic_complexity: u32,
    pub cognitive_complexity: u32,
    pub dependency_count: u32,
    pub async_op_count: u32,
    pub external_call_count: u32,
    pub estimated_execution_time_ms: u64,
    pub recommendation: Recommendation,
    pub suggestions: Vec<String>,
}

impl Default for ComplexityMetrics {
    fn default() -> Self {
        Self {
            cyclomatic_complexity: 1,
            cognitive_complexity: 0,
            dependency_count: 0,
            async_op_count: 0,
            external_call_count: 0,
            estimated_execution_time_ms: BASE_EXECUTION_TIME_MS,
            recommendation: Recommendation::Simple,
            suggestions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningReason {
    SlowExecution,
    RateLimited,
    TimedOut,
}

/// Emitted after an execution that looked too heavy. Never changes the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityWarning {
    pub skill_id: String,
    pub reasons: Vec<WarningReason>,
    pub execution_time_ms: u64,
    pub message: String,
}

/// Where the items of a batch live in the params
struct BatchPayload<'a> {
    key: &'a str,
    items: &'a [Value],
}

fn is_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

fn batch_payload(params: &Params) -> Option<BatchPayload<'_>> {
    if let Some(Value::Array(items)) = params.get("batch") {
        return Some(BatchPayload { key: "batch", items });
    }
    if let Some(Value::Array(items)) = params.get("bulk") {
        return Some(BatchPayload { key: "bulk", items });
    }
    if is_flag(params.get("batch")) || is_flag(params.get("bulk")) {
        for key in BATCH_DATA_KEYS {
            if let Some(Value::Array(items)) = params.get(key) {
                return Some(BatchPayload { key, items });
            }
        }
    }
    None
}

/// Lower-cased words of the skill id and display name
fn name_tokens(descriptor: &SkillDescriptor) -> Vec<String> {
    format!("{} {}", descriptor.id, descriptor.display_name)
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn mentions(tokens: &[String], terms: &[&str]) -> bool {
    tokens.iter().any(|token| {
        terms
            .iter()
            .any(|term| token == term || token.strip_suffix('s') == Some(*term))
    })
}

#[derive(Debug, Clone, Default)]
pub struct ComplexityAnalyzer {
    config: ComplexityConfig,
}

impl ComplexityAnalyzer {
    pub fn new(config: ComplexityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ComplexityConfig {
        &self.config
    }

    pub fn analyze(&self, descriptor: &SkillDescriptor, params: &Params) -> ComplexityMetrics {
        let mut m = ComplexityMetrics {
            cognitive_complexity: params.len() as u32,
            ..ComplexityMetrics::default()
        };

        if params.contains_key("_context") {
            m.cognitive_complexity += 2;
        }
        if params.contains_key("action") {
            m.cyclomatic_complexity += 3;
        }
        if params.contains_key("conditions") || params.contains_key("filters") {
            m.cyclomatic_complexity += 2;
        }
        if is_flag(params.get("batch")) || is_flag(params.get("bulk")) {
            m.cyclomatic_complexity += 4;
            m.cognitive_complexity += 3;
        }

        m.dependency_count = params
            .values()
            .filter(|v| v.is_object() || v.is_array())
            .count() as u32;

        let tokens = name_tokens(descriptor);
        let classes = [
            (
                mentions(&tokens, &MESSAGING_TERMS)
                    || descriptor.category == SkillCategory::Communication,
                2_000,
            ),
            (
                mentions(&tokens, &DATA_TERMS) || descriptor.category == SkillCategory::Data,
                1_000,
            ),
            (
                mentions(&tokens, &AI_TERMS) || descriptor.category == SkillCategory::Analytics,
                3_000,
            ),
        ];
        for (applies, time_ms) in classes {
            if applies {
                m.estimated_execution_time_ms += time_ms;
                m.external_call_count += 1;
                m.async_op_count += 1;
            }
        }

        if let Some(payload) = batch_payload(params) {
            let items = payload.items.len();
            let chunks = items.div_ceil(self.config.batch_chunk_size.max(1)) as u32;
            m.cyclomatic_complexity += 2 * chunks;
            m.cognitive_complexity += 3 * chunks;
            m.async_op_count += chunks;
            m.external_call_count += chunks;
            m.estimated_execution_time_ms += PER_ITEM_TIME_MS * items as u64;
        }

        self.score(&mut m);
        debug!(
            skill_id = %descriptor.id,
            recommendation = %m.recommendation,
            cyclomatic = m.cyclomatic_complexity,
            cognitive = m.cognitive_complexity,
            "Complexity analyzed"
        );
        m
    }

    fn score(&self, m: &mut ComplexityMetrics) {
        let c = &self.config;
        let mut points = 0;

        if m.cyclomatic_complexity > c.cyclomatic_threshold {
            points += 2;
            m.suggestions.push(format!(
                "Split conditional work into separate invocations (cyclomatic complexity {} > {})",
                m.cyclomatic_complexity, c.cyclomatic_threshold
            ));
        }
        if m.cognitive_complexity > c.cognitive_threshold {
            points += 2;
            m.suggestions.push(format!(
                "Reduce the number of inputs handled in one call (cognitive complexity {} > {})",
                m.cognitive_complexity, c.cognitive_threshold
            ));
        }
        if m.dependency_count > c.dependency_threshold {
            points += 1;
            m.suggestions.push(format!(
                "Flatten nested params ({} structured values > {})",
                m.dependency_count, c.dependency_threshold
            ));
        }
        if m.async_op_count > c.async_op_threshold {
            points += 1;
            m.suggestions.push(format!(
                "Limit concurrent async operations ({} > {})",
                m.async_op_count, c.async_op_threshold
            ));
        }
        if m.external_call_count > c.external_call_threshold {
            points += 1;
            m.suggestions.push(format!(
                "Batch or cache external calls ({} > {})",
                m.external_call_count, c.external_call_threshold
            ));
        }
        if m.estimated_execution_time_ms > c.execution_time_threshold_ms {
            points += 1;
            m.suggestions.push(format!(
                "Estimated {}ms exceeds {}ms; process the payload in chunks",
                m.estimated_execution_time_ms, c.execution_time_threshold_ms
            ));
        }

        m.recommendation = Recommendation::from_points(points);
    }

    /// Split an invocation that scored `Refactor` into smaller invocations of
    /// the same skill. Anything else comes back unchanged.
    pub fn decompose(
        &self,
        invocation: &Invocation,
        metrics: &ComplexityMetrics,
    ) -> Vec<Invocation> {
        if metrics.recommendation != Recommendation::Refactor {
            return vec![invocation.clone()];
        }
        let params = &invocation.params;

        if let Some(payload) = batch_payload(params) {
            return self.chunk(invocation, payload.key, payload.items);
        }

        if let Some(subtasks) = split_actions(invocation) {
            return subtasks;
        }

        let largest = params
            .iter()
            .filter_map(|(key, value)| value.as_array().map(|items| (key, items)))
            .filter(|(_, items)| items.len() > self.config.batch_chunk_size)
            .max_by_key(|(_, items)| items.len());
        if let Some((key, items)) = largest {
            return self.chunk(invocation, key, items);
        }

        warn!(
            skill_id = %invocation.skill_id,
            "Invocation scored refactor but has no axis to split on"
        );
        vec![invocation.clone()]
    }

    fn chunk(&self, invocation: &Invocation, key: &str, items: &[Value]) -> Vec<Invocation> {
        let size = self.config.batch_chunk_size.max(1);
        let total = items.len().div_ceil(size);

        let subtasks: Vec<Invocation> = items
            .chunks(size)
            .enumerate()
            .map(|(index, chunk)| {
                let mut params = invocation.params.clone();
                params.insert(key.to_string(), Value::Array(chunk.to_vec()));
                params.insert("_batchIndex".to_string(), json!(index));
                params.insert("_totalBatches".to_string(), json!(total));
                Invocation::new(invocation.skill_id.clone(), params)
            })
            .collect();

        debug!(
            skill_id = %invocation.skill_id,
            key,
            items_count = items.len() as u64,
            batches = total,
            "Batch decomposed"
        );
        if subtasks.is_empty() {
            vec![invocation.clone()]
        } else {
            subtasks
        }
    }

    /// Check a finished execution for signs of overload
    pub fn monitor(&self, result: &ExecutionResult) -> Option<ComplexityWarning> {
        let mut reasons = Vec::new();
        if result.execution_time_ms > self.config.slow_execution_ms {
            reasons.push(WarningReason::SlowExecution);
        }
        if let Some(error) = result.error.as_deref() {
            let error = error.to_lowercase();
            if ["rate limit", "rate-limit", "too many requests"]
                .iter()
                .any(|p| error.contains(p))
            {
                reasons.push(WarningReason::RateLimited);
            }
            if error.contains("timeout") || error.contains("timed out") {
                reasons.push(WarningReason::TimedOut);
            }
        }

        if reasons.is_empty() {
            return None;
        }

        let warning = ComplexityWarning {
            skill_id: result.metadata.skill_id.clone(),
            message: format!(
                "Skill {} may need decomposition: {:?}",
                result.metadata.skill_id, reasons
            ),
            reasons,
            execution_time_ms: result.execution_time_ms,
        };
        warn!(
            skill_id = %warning.skill_id,
            duration_ms = warning.execution_time_ms,
            reasons = ?warning.reasons,
            "Complexity warning"
        );
        Some(warning)
    }
}

/// One invocation per comma-separated action, if there are at least two
fn split_actions(invocation: &Invocation) -> Option<Vec<Invocation>> {
    let action = invocation.params.get("action")?.as_str()?;
    let actions: Vec<&str> = action
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .collect();
    if actions.len() < 2 {
        return None;
    }

    Some(
        actions
            .into_iter()
            .enumerate()
            .map(|(index, action)| {
                let mut params = invocation.params.clone();
                params.insert("action".to_string(), json!(action));
                params.insert("_isSubtask".to_string(), json!(true));
                params.insert("_subtaskIndex".to_string(), json!(index));
                Invocation::new(invocation.skill_id.clone(), params)
            })
            .collect(),
    )
}
