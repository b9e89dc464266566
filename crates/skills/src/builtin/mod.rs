//! Reference skills shipped with the registry

mod appointment_booking;
mod general_inquiry;
mod product_pricing;
mod weather;

pub use appointment_booking::AppointmentBookingSkill;
pub use general_inquiry::GeneralInquirySkill;
pub use product_pricing::ProductPricingSkill;
pub use weather::WeatherSkill;

use crate::registry::SkillRegistry;
use skill_core::{Params, SkillCategory, SkillDescriptor, SkillHandle, ValidationError};
use std::collections::BTreeSet;

/// Install every reference skill
pub fn register_defaults(registry: &SkillRegistry) {
    registry.register(SkillHandle::dual_agent(GeneralInquirySkill::new()));
    registry.register(SkillHandle::dual_agent(ProductPricingSkill::new()));
    registry.register(SkillHandle::simple(WeatherSkill::new()));
    registry.register(SkillHandle::simple(AppointmentBookingSkill::new()));
}

/// Descriptor for a built-in id, known to be well formed
fn builtin_descriptor(
    id: &str,
    display_name: &str,
    description: &str,
    category: SkillCategory,
    tags: &[&str],
) -> SkillDescriptor {
    debug_assert!(skill_core::is_valid_skill_id(id));
    SkillDescriptor {
        id: id.to_string(),
        display_name: display_name.to_string(),
        description: description.to_string(),
        category,
        version: "1.0.0".to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
    }
}

/// Non-empty string param
fn required_str<'a>(params: &'a Params, field: &str) -> Result<&'a str, ValidationError> {
    match params.get(field) {
        None => Err(ValidationError::MissingField(field.to_string())),
        Some(value) => match value.as_str().map(str::trim) {
            Some(s) if !s.is_empty() => Ok(s),
            Some(_) => Err(ValidationError::invalid(field, "must not be empty")),
            None => Err(ValidationError::invalid(field, "must be a string")),
        },
    }
}

/// Free-text message, if the caller supplied one
fn message_text(params: &Params) -> &str {
    params
        .get("message")
        .or_else(|| params.get("query"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}
