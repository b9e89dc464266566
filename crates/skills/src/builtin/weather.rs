use super::{builtin_descriptor, required_str};
use async_trait::async_trait;
use serde_json::json;
use skill_core::{
    ExecutionResult, ExecutionScope, Params, SimpleSkill, Skill, SkillCategory, SkillDescriptor,
    ValidationError,
};

const CONDITIONS: [&str; 5] = ["sunny", "partly cloudy", "overcast", "light rain", "windy"];

/// Deterministic forecast stub keyed on the location name
pub struct WeatherSkill {
    descriptor: SkillDescriptor,
}

impl WeatherSkill {
    pub fn new() -> Self {
        Self {
            descriptor: builtin_descriptor(
                "weather",
                "Weather Forecast",
                "Current conditions and temperature for a location",
                SkillCategory::Information,
                &["weather", "forecast", "temperature"],
            ),
        }
    }
}

impl Default for WeatherSkill {
    fn default() -> Self {
        Self::new()
    }
}

impl Skill for WeatherSkill {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }

    fn validate(&self, params: &Params) -> Result<(), ValidationError> {
        required_str(params, "location").map(|_| ())
    }
}

#[async_trait]
impl SimpleSkill for WeatherSkill {
    async fn execute(
        &self,
        params: Params,
        _scope: ExecutionScope,
    ) -> anyhow::Result<ExecutionResult> {
        let location = required_str(&params, "location")?;
        let seed: u32 = location.to_lowercase().bytes().map(u32::from).sum();
        let condition = CONDITIONS[(seed as usize) % CONDITIONS.len()];
        let temperature_c = 5 + (seed % 25) as i64;

        Ok(ExecutionResult::success(
            &self.descriptor.id,
            json!({
                "location": location,
                "condition": condition,
                "temperature_c": temperature_c,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skill_core::OrchestrationContext;
    use std::time::Duration;

    #[test]
    fn test_location_is_required() {
        let skill = WeatherSkill::new();
        assert_eq!(
            skill.validate(&Params::new()),
            Err(ValidationError::MissingField("location".to_string()))
        );

        let mut params = Params::new();
        params.insert("location".to_string(), json!("  "));
        assert!(matches!(
            skill.validate(&params),
            Err(ValidationError::InvalidField { .. })
        ));
    }

    #[tokio::test]
    async fn test_forecast_is_deterministic() {
        let skill = WeatherSkill::new();
        let mut params = Params::new();
        params.insert("location".to_string(), json!("Lisbon"));

        let scope = || ExecutionScope::new(OrchestrationContext::new(), Duration::from_secs(1));
        let first = skill.execute(params.clone(), scope()).await.expect("forecast");
        let second = skill.execute(params, scope()).await.expect("forecast");

        assert!(first.success);
        assert_eq!(first.data, second.data);
        assert_eq!(first.data.as_ref().map(|d| d["location"].clone()), Some(json!("Lisbon")));
    }
}
