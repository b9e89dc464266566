use super::{builtin_descriptor, message_text};
use async_trait::async_trait;
use serde_json::{json, Value};
use skill_core::{
    DualAgentSkill, ExecutionScope, Intent, OrchestrationContext, Params, Skill, SkillCategory,
    SkillDescriptor, ValidationError,
};

/// (name, monthly price in cents)
const CATALOG: [(&str, u64); 3] = [("basic", 2_900), ("pro", 7_900), ("enterprise", 19_900)];
const CURRENCY: &str = "USD";

/// Quotes prices from a fixed catalog
pub struct ProductPricingSkill {
    descriptor: SkillDescriptor,
}

impl ProductPricingSkill {
    pub fn new() -> Self {
        Self {
            descriptor: builtin_descriptor(
                "product_pricing",
                "Product Pricing",
                "Price list and quotes for the product catalog",
                SkillCategory::Sales,
                &["price", "pricing", "quote", "plans"],
            ),
        }
    }

    fn lookup(product: &str) -> Option<(&'static str, u64)> {
        let product = product.trim().to_lowercase();
        CATALOG.iter().copied().find(|(name, _)| *name == product)
    }

    /// Product named in params, or mentioned in the message
    fn requested_product(params: &Params) -> Option<String> {
        if let Some(product) = params.get("product").and_then(Value::as_str) {
            return Some(product.trim().to_lowercase());
        }
        let message = message_text(params).to_lowercase();
        CATALOG
            .iter()
            .find(|(name, _)| message.split(|c: char| !c.is_alphanumeric()).any(|w| w == *name))
            .map(|(name, _)| name.to_string())
    }

    fn quantity(params: &Params) -> u64 {
        params.get("quantity").and_then(Value::as_u64).unwrap_or(1)
    }
}

impl Default for ProductPricingSkill {
    fn default() -> Self {
        Self::new()
    }
}

fn format_cents(cents: u64) -> String {
    format!("{}.{:02} {CURRENCY}", cents / 100, cents % 100)
}

impl Skill for ProductPricingSkill {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }

    fn validate(&self, params: &Params) -> Result<(), ValidationError> {
        if let Some(quantity) = params.get("quantity") {
            match quantity.as_u64() {
                Some(q) if q > 0 => {}
                _ => return Err(ValidationError::invalid("quantity", "must be a positive integer")),
            }
        }
        if let Some(product) = params.get("product") {
            let known = product.as_str().and_then(Self::lookup).is_some();
            if !known {
                return Err(ValidationError::invalid("product", "unknown product"));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DualAgentSkill for ProductPricingSkill {
    fn analyze_strategy(
        &self,
        params: &Params,
        _context: &OrchestrationContext,
    ) -> anyhow::Result<Intent> {
        let intent = match Self::requested_product(params) {
            Some(product) => Intent::new("price_quote", 0.9)
                .with_entity("product", product)
                .with_entity("quantity", Self::quantity(params)),
            None => Intent::new("price_list", 0.7).with_next_action("ask_for_product"),
        };
        Ok(intent)
    }

    async fn perform_action(
        &self,
        intent: &Intent,
        _params: &Params,
        _scope: &ExecutionScope,
    ) -> anyhow::Result<Value> {
        if intent.label == "price_quote" {
            let product = intent
                .entities
                .get("product")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let (name, unit) = Self::lookup(product)
                .ok_or_else(|| anyhow::anyhow!("product '{product}' is not in the catalog"))?;
            let quantity = intent
                .entities
                .get("quantity")
                .and_then(Value::as_u64)
                .unwrap_or(1);
            return Ok(json!({
                "product": name,
                "unit_price_cents": unit,
                "quantity": quantity,
                "total_cents": unit.saturating_mul(quantity),
                "currency": CURRENCY,
            }));
        }

        let plans: Vec<Value> = CATALOG
            .iter()
            .map(|(name, price)| json!({"product": name, "unit_price_cents": price}))
            .collect();
        Ok(json!({ "plans": plans, "currency": CURRENCY }))
    }

    fn generate_response(
        &self,
        _intent: &Intent,
        action_output: &Value,
        _context: &OrchestrationContext,
    ) -> anyhow::Result<String> {
        if let Some(product) = action_output["product"].as_str() {
            let total = action_output["total_cents"].as_u64().unwrap_or_default();
            let quantity = action_output["quantity"].as_u64().unwrap_or(1);
            return Ok(format!(
                "The {product} plan comes to {} per month for {quantity} seat(s).",
                format_cents(total)
            ));
        }

        let plans: Vec<String> = action_output["plans"]
            .as_array()
            .map(|plans| {
                plans
                    .iter()
                    .map(|p| {
                        format!(
                            "{} at {}",
                            p["product"].as_str().unwrap_or_default(),
                            format_cents(p["unit_price_cents"].as_u64().unwrap_or_default())
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(format!("Our plans: {}. Which one interests you?", plans.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_validation() {
        let skill = ProductPricingSkill::new();
        let mut params = Params::new();
        assert!(skill.validate(&params).is_ok());

        params.insert("quantity".to_string(), json!(0));
        assert!(skill.validate(&params).is_err());

        params.insert("quantity".to_string(), json!(3));
        params.insert("product".to_string(), json!("platinum"));
        assert!(skill.validate(&params).is_err());
    }

    #[tokio::test]
    async fn test_quote_from_message() {
        let skill = ProductPricingSkill::new();
        let ctx = OrchestrationContext::new();
        let mut params = Params::new();
        params.insert("message".to_string(), json!("How much is the Pro plan?"));
        params.insert("quantity".to_string(), json!(2));

        let intent = skill.analyze_strategy(&params, &ctx).expect("intent");
        assert_eq!(intent.label, "price_quote");

        let scope = ExecutionScope::new(ctx.clone(), Duration::from_secs(1));
        let output = skill
            .perform_action(&intent, &params, &scope)
            .await
            .expect("action");
        assert_eq!(output["total_cents"], 15_800);

        let response = skill.generate_response(&intent, &output, &ctx).expect("response");
        assert!(response.contains("158.00 USD"));
    }
}
