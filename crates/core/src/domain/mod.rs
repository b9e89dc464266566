//! Domain models shared by the registry, router and executor

use crate::errors::ErrorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Invocation parameters: always a JSON object
pub type Params = Map<String, Value>;

/// Functional area a skill belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Communication,
    Sales,
    Support,
    Scheduling,
    Information,
    Analytics,
    Data,
    Marketing,
    Finance,
    Operations,
    Custom(String),
}

impl SkillCategory {
    pub fn as_str(&self) -> &str {
        match self {
            SkillCategory::Communication => "communication",
            SkillCategory::Sales => "sales",
            SkillCategory::Support => "support",
            SkillCategory::Scheduling => "scheduling",
            SkillCategory::Information => "information",
            SkillCategory::Analytics => "analytics",
            SkillCategory::Data => "data",
            SkillCategory::Marketing => "marketing",
            SkillCategory::Finance => "finance",
            SkillCategory::Operations => "operations",
            SkillCategory::Custom(name) => name,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "communication" => SkillCategory::Communication,
            "sales" => SkillCategory::Sales,
            "support" => SkillCategory::Support,
            "scheduling" => SkillCategory::Scheduling,
            "information" => SkillCategory::Information,
            "analytics" => SkillCategory::Analytics,
            "data" => SkillCategory::Data,
            "marketing" => SkillCategory::Marketing,
            "finance" => SkillCategory::Finance,
            "operations" => SkillCategory::Operations,
            other => SkillCategory::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a skill. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDescriptor {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub category: SkillCategory,
    pub version: String,
    pub tags: BTreeSet<String>,
}

impl SkillDescriptor {
    /// Build a descriptor; rejects ids that are not lowercase-with-separators.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        category: SkillCategory,
    ) -> Result<Self, InvalidSkillId> {
        let id = id.into();
        if !is_valid_skill_id(&id) {
            return Err(InvalidSkillId(id));
        }
        Ok(Self {
            id,
            display_name: display_name.into(),
            description: String::new(),
            category,
            version: "1.0.0".to_string(),
            tags: BTreeSet::new(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }
}

/// Returned when a skill id is not lowercase-with-separators
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid skill id '{0}': expected lowercase letters, digits, '_' or '-'")]
pub struct InvalidSkillId(pub String);

pub fn is_valid_skill_id(id: &str) -> bool {
    !id.is_empty()
        && id.starts_with(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit())
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

/// The router's decision for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub skill_id: String,
    pub confidence: f64,
    pub reason: String,
    #[serde(default)]
    pub fallbacks: Vec<String>,
}

impl Route {
    pub fn new(skill_id: impl Into<String>, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            skill_id: skill_id.into(),
            confidence: confidence.clamp(0.0, 1.0),
            reason: reason.into(),
            fallbacks: Vec::new(),
        }
    }

    pub fn with_fallbacks<I, S>(mut self, fallbacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallbacks = fallbacks.into_iter().map(Into::into).collect();
        self
    }

    /// Primary id followed by the fallbacks, in trial order
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.skill_id.as_str()).chain(self.fallbacks.iter().map(String::as_str))
    }
}

/// One prior turn of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub route: Route,
    pub success: bool,
}

/// Caller-supplied context. The core never mutates it in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationContext {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub tenant_key: Option<String>,
    pub domain: Option<String>,
    pub company_name: Option<String>,
    pub custom_knowledge: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl OrchestrationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(mut self, tenant_key: impl Into<String>) -> Self {
        self.tenant_key = Some(tenant_key.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_history_entry(mut self, route: Route, success: bool) -> Self {
        self.history.push(HistoryEntry { route, success });
        self
    }

    pub fn last_route(&self) -> Option<&Route> {
        self.history.last().map(|entry| &entry.route)
    }

    /// Return a new context with the tenant profile merged in.
    /// Values already supplied by the caller win.
    pub fn enriched_with(&self, profile: &TenantProfile) -> Self {
        let mut enriched = self.clone();
        if enriched.domain.is_none() {
            enriched.domain = profile.domain.clone();
        }
        if enriched.company_name.is_none() {
            enriched.company_name = profile.company_name.clone();
        }
        if enriched.custom_knowledge.is_none() {
            enriched.custom_knowledge = profile.custom_knowledge.clone();
        }
        enriched
    }
}

/// What the context-enrichment store knows about a tenant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantProfile {
    pub domain: Option<String>,
    pub company_name: Option<String>,
    pub custom_knowledge: Option<String>,
}

/// A single skill call: the unit of batch execution and decomposition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub skill_id: String,
    #[serde(default)]
    pub params: Params,
}

impl Invocation {
    pub fn new(skill_id: impl Into<String>, params: Params) -> Self {
        Self {
            skill_id: skill_id.into(),
            params,
        }
    }
}

/// Handed to a skill body: caller context, deadline and a cooperative
/// cancellation token. The token is cancelled when the executor stops
/// waiting; the body is never aborted.
#[derive(Debug, Clone)]
pub struct ExecutionScope {
    pub context: OrchestrationContext,
    pub deadline: Instant,
    pub cancellation: CancellationToken,
}

impl ExecutionScope {
    pub fn new(context: OrchestrationContext, timeout: Duration) -> Self {
        Self {
            context,
            deadline: Instant::now() + timeout,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// Metadata attached to every result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    pub skill_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The single return shape of every skill and every executor call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub execution_time_ms: u64,
    pub metadata: ExecutionMetadata,
}

impl ExecutionResult {
    pub fn success(skill_id: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            execution_time_ms: 0,
            metadata: ExecutionMetadata {
                skill_id: skill_id.into(),
                skill_name: None,
                timestamp: Utc::now(),
                error_kind: None,
                extra: Map::new(),
            },
        }
    }

    pub fn failure(skill_id: impl Into<String>, kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            execution_time_ms: 0,
            metadata: ExecutionMetadata {
                skill_id: skill_id.into(),
                skill_name: None,
                timestamp: Utc::now(),
                error_kind: Some(kind),
                extra: Map::new(),
            },
        }
    }

    pub fn with_skill_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.skill_name = Some(name.into());
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.execution_time_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.extra.insert(key.into(), value.into());
        self
    }

    pub fn error_kind(&self) -> Option<&ErrorKind> {
        self.metadata.error_kind.as_ref()
    }

    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.metadata.extra.get(key)
    }
}

/// Outcome of the strategy step of a dual-agent skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub label: String,
    pub confidence: f64,
    #[serde(default)]
    pub entities: Map<String, Value>,
    #[serde(default)]
    pub next_actions: Vec<String>,
}

impl Intent {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.clamp(0.0, 1.0),
            entities: Map::new(),
            next_actions: Vec::new(),
        }
    }

    pub fn with_entity(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entities.insert(key.into(), value.into());
        self
    }

    pub fn with_next_action(mut self, action: impl Into<String>) -> Self {
        self.next_actions.push(action.into());
        self
    }
}
