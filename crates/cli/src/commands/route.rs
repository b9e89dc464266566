use super::{build_orchestrator, parse_params};
use crate::output::Output;
use anyhow::Result;
use clap::Args;
use common::CoreConfig;
use orchestrator::RouteRequest;
use skill_core::OrchestrationContext;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct RouteCommand {
    /// Free-text request
    text: Option<String>,

    /// Skip keyword routing and use this skill
    #[arg(long)]
    skill: Option<String>,

    /// Skill parameters as a JSON object
    #[arg(long)]
    params: Option<String>,

    /// Tenant/product key used for context enrichment
    #[arg(long)]
    tenant: Option<String>,

    /// JSON file of tenant profiles keyed by product key
    #[arg(long)]
    tenants: Option<PathBuf>,

    #[arg(long)]
    session: Option<String>,
}

impl RouteCommand {
    pub async fn execute(self, config: CoreConfig, out: &Output) -> Result<bool> {
        if self.text.is_none() && self.skill.is_none() {
            anyhow::bail!("Provide request text or --skill");
        }

        let orchestrator = build_orchestrator(config, self.tenants.as_deref()).await?;
        let request = RouteRequest {
            text: self.text,
            skill_id: self.skill,
            params: parse_params(self.params.as_deref())?,
        };

        let mut context = OrchestrationContext::new();
        if let Some(tenant) = self.tenant {
            context = context.with_tenant(tenant);
        }
        if let Some(session) = self.session {
            context = context.with_session(session);
        }

        let result = orchestrator.route(request, &context).await;
        out.result(&result)?;
        Ok(result.success)
    }
}
