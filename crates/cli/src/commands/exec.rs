use super::{build_orchestrator, parse_params};
use crate::output::Output;
use anyhow::Result;
use clap::Args;
use common::CoreConfig;
use orchestrator::ExecuteOptions;
use std::time::Duration;

#[derive(Debug, Args)]
pub struct ExecCommand {
    skill_id: String,

    /// Skill parameters as a JSON object
    #[arg(long)]
    params: Option<String>,

    /// Overrides the configured default timeout
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl ExecCommand {
    pub async fn execute(self, config: CoreConfig, out: &Output) -> Result<bool> {
        let params = parse_params(self.params.as_deref())?;
        let orchestrator = build_orchestrator(config, None).await?;

        let mut options = ExecuteOptions::default();
        if let Some(ms) = self.timeout_ms {
            options = options.with_timeout(Duration::from_millis(ms));
        }

        let result = orchestrator.execute(&self.skill_id, params, &options).await;
        out.result(&result)?;
        Ok(result.success)
    }
}
