use super::{builtin_descriptor, message_text};
use async_trait::async_trait;
use serde_json::{json, Value};
use skill_core::{
    DualAgentSkill, ExecutionScope, Intent, OrchestrationContext, Params, Skill, SkillCategory,
    SkillDescriptor,
};

/// Default route. Answers greetings and simple questions about the business.
pub struct GeneralInquirySkill {
    descriptor: SkillDescriptor,
}

impl GeneralInquirySkill {
    pub fn new() -> Self {
        Self {
            descriptor: builtin_descriptor(
                "general_inquiry",
                "General Inquiry",
                "Greetings, opening hours, contact details and other general questions",
                SkillCategory::Support,
                &["faq", "help", "greeting", "support"],
            ),
        }
    }

    fn classify(message: &str) -> (&'static str, f64) {
        let text = message.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| text.contains(w));

        if has(&["hour", "open", "close"]) {
            ("opening_hours", 0.8)
        } else if has(&["contact", "phone", "call you", "reach"]) {
            ("contact", 0.8)
        } else if has(&["hello", "hi ", "hey", "good morning", "good evening"]) || text == "hi" {
            ("greeting", 0.9)
        } else {
            ("general", 0.5)
        }
    }
}

impl Default for GeneralInquirySkill {
    fn default() -> Self {
        Self::new()
    }
}

impl Skill for GeneralInquirySkill {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }
}

#[async_trait]
impl DualAgentSkill for GeneralInquirySkill {
    fn analyze_strategy(
        &self,
        params: &Params,
        context: &OrchestrationContext,
    ) -> anyhow::Result<Intent> {
        let message = message_text(params);
        let (label, confidence) = Self::classify(message);

        let mut intent = Intent::new(label, confidence).with_entity("message", message);
        if let Some(domain) = &context.domain {
            intent = intent.with_entity("domain", domain.as_str());
        }
        if label == "general" {
            intent = intent.with_next_action("offer_human_handoff");
        }
        Ok(intent)
    }

    async fn perform_action(
        &self,
        intent: &Intent,
        _params: &Params,
        scope: &ExecutionScope,
    ) -> anyhow::Result<Value> {
        Ok(json!({
            "topic": intent.label,
            "knowledge": scope.context.custom_knowledge,
            "handoff": intent.next_actions.iter().any(|a| a == "offer_human_handoff"),
        }))
    }

    fn generate_response(
        &self,
        intent: &Intent,
        action_output: &Value,
        context: &OrchestrationContext,
    ) -> anyhow::Result<String> {
        let company = context.company_name.as_deref().unwrap_or("our team");

        let response = match intent.label.as_str() {
            "greeting" => format!("Hello! Welcome to {company}. How can I help you today?"),
            "opening_hours" => match action_output["knowledge"].as_str() {
                Some(knowledge) => format!("Here is what {company} shared about that: {knowledge}"),
                None => format!("{company} will confirm the opening hours shortly."),
            },
            "contact" => format!(
                "You can reach {company} by replying here and we will get back to you."
            ),
            _ => format!(
                "Thanks for your message. Someone from {company} will follow up \
                 if I can't answer it."
            ),
        };
        Ok(response)
    }
}
