mod analyze;
mod exec;
mod route;
mod skills;

pub use analyze::AnalyzeCommand;
pub use exec::ExecCommand;
pub use route::RouteCommand;
pub use skills::SkillsCommand;

use crate::tenants::FileTenantStore;
use anyhow::{bail, Context, Result};
use common::CoreConfig;
use orchestrator::{SkillOrchestrator, TracingLogSink};
use serde_json::Value;
use skill_core::Params;
use std::path::Path;
use std::sync::Arc;

/// Parse a `--params` argument; it must be a JSON object
pub(crate) fn parse_params(raw: Option<&str>) -> Result<Params> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(Params::new());
    };
    match serde_json::from_str(raw).context("--params is not valid JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("--params must be a JSON object, got {other}"),
    }
}

pub(crate) async fn build_orchestrator(
    config: CoreConfig,
    tenants: Option<&Path>,
) -> Result<SkillOrchestrator> {
    let mut builder = SkillOrchestrator::builder()
        .config(config)
        .log_sink(Arc::new(TracingLogSink));
    if let Some(path) = tenants {
        builder = builder.context_store(Arc::new(FileTenantStore::load(path).await?));
    }
    Ok(builder.build())
}
