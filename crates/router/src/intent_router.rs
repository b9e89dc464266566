use crate::table::{default_overrides, default_table, scan, DomainOverride, KeywordRule};
use common::RouterConfig;
use serde::{Deserialize, Serialize};
use skill_core::{OrchestrationContext, Params, Route, SkillError, SkillHandle};
use skills::SkillRegistry;
use tracing::{debug, info};

const BASE_CONFIDENCE: f64 = 0.6;
const REPEAT_BONUS: f64 = 0.1;
const MAX_REPEAT_BONUS: f64 = 0.3;
const STANDALONE_FACTOR: f64 = 1.1;
const STANDALONE_CAP: f64 = 0.98;
const LONG_TEXT_FACTOR: f64 = 0.9;
const CONTINUITY_FACTOR: f64 = 1.2;

pub const EXPLICIT_REASON: &str = "explicit";
pub const DEFAULT_REASON: &str = "default fallback";
pub const CONTINUITY_SUFFIX: &str = " (continuity boost)";

/// A request to route: free text, an explicit skill id, or both
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    #[serde(default, alias = "message")]
    pub text: Option<String>,
    #[serde(default, alias = "skillId")]
    pub skill_id: Option<String>,
    #[serde(default)]
    pub params: Params,
}

impl RouteRequest {
    pub fn explicit(skill_id: impl Into<String>) -> Self {
        Self {
            skill_id: Some(skill_id.into()),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}

impl From<&str> for RouteRequest {
    fn from(text: &str) -> Self {
        Self::default().with_text(text)
    }
}

impl From<String> for RouteRequest {
    fn from(text: String) -> Self {
        Self::default().with_text(text)
    }
}

/// Picks a skill for a request using a keyword table, vertical overrides and
/// conversation continuity.
#[derive(Debug, Clone)]
pub struct IntentRouter {
    config: RouterConfig,
    table: Vec<KeywordRule>,
    overrides: Vec<DomainOverride>,
}

impl Default for IntentRouter {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

impl IntentRouter {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            table: default_table(),
            overrides: default_overrides(),
        }
    }

    pub fn with_table(mut self, table: Vec<KeywordRule>) -> Self {
        self.table = table;
        self
    }

    pub fn with_overrides(mut self, overrides: Vec<DomainOverride>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn route(&self, request: &RouteRequest, context: &OrchestrationContext) -> Route {
        if let Some(skill_id) = request.skill_id.as_deref().filter(|id| !id.trim().is_empty()) {
            debug!(skill_id, "Explicit route");
            return Route::new(skill_id, 1.0, EXPLICIT_REASON);
        }

        let text = request.text.as_deref().unwrap_or("").to_lowercase();

        let mut best = self.keyword_scan(&text);

        for detector in &self.overrides {
            if detector.matches(&text) {
                best = Some(
                    Route::new(
                        &detector.skill_id,
                        detector.confidence,
                        format!("{} override", detector.name),
                    )
                    .with_fallbacks(detector.fallbacks.iter().cloned()),
                );
            }
        }

        let route = best.unwrap_or_else(|| {
            Route::new(
                &self.config.default_skill,
                self.config.default_confidence,
                DEFAULT_REASON,
            )
        });

        let route = apply_continuity(route, context);
        info!(
            skill_id = %route.skill_id,
            confidence = route.confidence,
            reason = %route.reason,
            "Request routed"
        );
        route
    }

    /// Highest-scoring table match; earlier rows win ties
    fn keyword_scan(&self, text: &str) -> Option<Route> {
        let long_text = text.split_whitespace().count() > self.config.long_text_words;
        let mut best: Option<(f64, &KeywordRule)> = None;

        for rule in &self.table {
            let found = scan(text, &rule.keyword);
            if found.count == 0 {
                continue;
            }

            let repeats = (found.count - 1) as f64;
            let mut score = BASE_CONFIDENCE + (REPEAT_BONUS * repeats).min(MAX_REPEAT_BONUS);
            if found.standalone {
                score = (score * STANDALONE_FACTOR).min(STANDALONE_CAP);
            }
            if long_text {
                score *= LONG_TEXT_FACTOR;
            }

            if best.map_or(true, |(top, _)| score > top) {
                best = Some((score, rule));
            }
        }

        best.map(|(score, rule)| {
            Route::new(&rule.skill_id, score, format!("keyword '{}'", rule.keyword))
                .with_fallbacks(rule.fallbacks.iter().cloned())
        })
    }

    /// First of `[primary, fallbacks...]` present in the registry.
    /// Fallbacks are only consulted because the primary is missing.
    pub fn resolve(
        &self,
        route: &Route,
        registry: &SkillRegistry,
    ) -> Result<SkillHandle, SkillError> {
        for candidate in route.candidates() {
            if let Some(handle) = registry.get(candidate) {
                if candidate != route.skill_id {
                    info!(
                        primary = %route.skill_id,
                        fallback = candidate,
                        "Primary skill not registered, using fallback"
                    );
                }
                return Ok(handle);
            }
        }
        Err(SkillError::NotFound {
            skill_id: route.skill_id.clone(),
        })
    }
}

/// Reward sticking with the skill used on the previous turn
pub fn apply_continuity(mut route: Route, context: &OrchestrationContext) -> Route {
    let same_skill = context
        .last_route()
        .is_some_and(|previous| previous.skill_id == route.skill_id);

    if same_skill {
        route.confidence = (route.confidence * CONTINUITY_FACTOR).min(1.0);
        if !route.reason.ends_with(CONTINUITY_SUFFIX) {
            route.reason.push_str(CONTINUITY_SUFFIX);
        }
    }
    route
}
