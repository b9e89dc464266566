use super::{builtin_descriptor, required_str};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use skill_core::{
    ExecutionResult, ExecutionScope, Params, SimpleSkill, Skill, SkillCategory, SkillDescriptor,
    ValidationError,
};

const DEFAULT_TIME: &str = "09:00";

/// Books a slot and echoes a confirmation. Nothing is persisted.
pub struct AppointmentBookingSkill {
    descriptor: SkillDescriptor,
}

impl AppointmentBookingSkill {
    pub fn new() -> Self {
        Self {
            descriptor: builtin_descriptor(
                "appointment_booking",
                "Appointment Booking",
                "Schedule an appointment for a given date and time",
                SkillCategory::Scheduling,
                &["appointment", "booking", "calendar", "schedule"],
            ),
        }
    }

    fn parse_slot(params: &Params) -> Result<(NaiveDate, NaiveTime), ValidationError> {
        let date = required_str(params, "date")?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| ValidationError::invalid("date", "expected YYYY-MM-DD"))?;

        let time = match params.get("time") {
            Some(_) => required_str(params, "time")?,
            None => DEFAULT_TIME,
        };
        let time = NaiveTime::parse_from_str(time, "%H:%M")
            .map_err(|_| ValidationError::invalid("time", "expected HH:MM"))?;

        Ok((date, time))
    }
}

impl Default for AppointmentBookingSkill {
    fn default() -> Self {
        Self::new()
    }
}

impl Skill for AppointmentBookingSkill {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }

    fn validate(&self, params: &Params) -> Result<(), ValidationError> {
        Self::parse_slot(params).map(|_| ())
    }
}

#[async_trait]
impl SimpleSkill for AppointmentBookingSkill {
    async fn execute(
        &self,
        params: Params,
        scope: ExecutionScope,
    ) -> anyhow::Result<ExecutionResult> {
        let (date, time) = Self::parse_slot(&params)?;
        let confirmation_id = format!("APT-{}-{}", date.format("%Y%m%d"), time.format("%H%M"));

        Ok(ExecutionResult::success(
            &self.descriptor.id,
            json!({
                "confirmation_id": confirmation_id,
                "date": date.to_string(),
                "time": time.format("%H:%M").to_string(),
                "status": "confirmed",
                "user_id": scope.context.user_id,
            }),
        ))
    }
}
