use super::{build_orchestrator, parse_params};
use crate::output::Output;
use anyhow::Result;
use clap::Args;
use common::CoreConfig;
use skill_core::Invocation;

#[derive(Debug, Args)]
pub struct AnalyzeCommand {
    skill_id: String,

    /// Skill parameters as a JSON object
    #[arg(long)]
    params: Option<String>,

    /// Also show how the call would be split
    #[arg(long, default_value_t = false)]
    plan: bool,
}

impl AnalyzeCommand {
    pub async fn execute(self, config: CoreConfig, out: &Output) -> Result<()> {
        let params = parse_params(self.params.as_deref())?;
        let orchestrator = build_orchestrator(config, None).await?;

        let metrics = orchestrator.analyze(&self.skill_id, &params)?;
        let plan = if self.plan {
            Some(orchestrator.plan(&Invocation::new(self.skill_id, params))?)
        } else {
            None
        };

        out.analysis(&metrics, plan.as_deref())
    }
}
