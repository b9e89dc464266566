use anyhow::Result;
use console::style;
use orchestrator::ComplexityMetrics;
use serde::Serialize;
use serde_json::Value;
use skill_core::{ExecutionResult, Invocation, SkillDescriptor};

/// Renders command results either as JSON or for a terminal
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn result(&self, result: &ExecutionResult) -> Result<()> {
        if self.json {
            return self.print_json(result);
        }

        let skill = result
            .metadata
            .skill_name
            .as_deref()
            .unwrap_or(&result.metadata.skill_id);
        if result.success {
            println!(
                "{} {} {}",
                style("[ok]").green().bold(),
                style(skill).bold(),
                style(format!("({} ms)", result.execution_time_ms)).dim()
            );
        } else {
            let kind = result.error_kind().map(|k| k.as_str()).unwrap_or("unknown");
            println!(
                "{} {} {}",
                style("[failed]").red().bold(),
                style(skill).bold(),
                style(format!("[{kind}]")).dim()
            );
            if let Some(error) = &result.error {
                println!("  {error}");
            }
        }

        if let Some(route) = result.meta("route") {
            println!(
                "  route: {} ({:.2}, {})",
                route["skill_id"].as_str().unwrap_or("-"),
                route["confidence"].as_f64().unwrap_or_default(),
                route["reason"].as_str().unwrap_or("-")
            );
        }

        if let Some(data) = &result.data {
            match data.get("message").and_then(Value::as_str) {
                Some(message) => println!("  {message}"),
                None => println!("{}", serde_json::to_string_pretty(data)?),
            }
        }
        Ok(())
    }

    pub fn skills(&self, descriptors: &[SkillDescriptor]) -> Result<()> {
        if self.json {
            return self.print_json(&descriptors);
        }
        if descriptors.is_empty() {
            println!("{}", style("No skills matched").yellow());
            return Ok(());
        }

        let width = descriptors.iter().map(|d| d.id.len()).max().unwrap_or(0);
        for descriptor in descriptors {
            println!(
                "{}  {:<14} {}",
                style(format!("{:<width$}", descriptor.id)).cyan(),
                descriptor.category.as_str(),
                descriptor.description
            );
        }
        Ok(())
    }

    pub fn analysis(&self, metrics: &ComplexityMetrics, plan: Option<&[Invocation]>) -> Result<()> {
        if self.json {
            let mut value = serde_json::to_value(metrics)?;
            if let (Some(plan), Value::Object(map)) = (plan, &mut value) {
                map.insert("plan".to_string(), serde_json::to_value(plan)?);
            }
            return self.print_json(&value);
        }

        println!(
            "{} {}",
            style("recommendation:").bold(),
            style(metrics.recommendation).cyan()
        );
        println!("  cyclomatic:  {}", metrics.cyclomatic_complexity);
        println!("  cognitive:   {}", metrics.cognitive_complexity);
        println!("  dependencies: {}", metrics.dependency_count);
        println!("  async ops:   {}", metrics.async_op_count);
        println!("  external:    {}", metrics.external_call_count);
        println!("  est. time:   {} ms", metrics.estimated_execution_time_ms);
        for suggestion in &metrics.suggestions {
            println!("  - {suggestion}");
        }

        if let Some(plan) = plan {
            println!("{} {} sub-task(s)", style("plan:").bold(), plan.len());
            for (index, invocation) in plan.iter().enumerate() {
                println!(
                    "  {index}: {} {}",
                    invocation.skill_id,
                    style(Value::Object(invocation.params.clone())).dim()
                );
            }
        }
        Ok(())
    }
}
