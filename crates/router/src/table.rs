//! Keyword table and vertical override detectors

use serde::{Deserialize, Serialize};

/// One row of the keyword table. Table order breaks confidence ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub keyword: String,
    pub skill_id: String,
    #[serde(default)]
    pub fallbacks: Vec<String>,
}

impl KeywordRule {
    pub fn new(keyword: &str, skill_id: &str, fallbacks: &[&str]) -> Self {
        Self {
            keyword: keyword.to_lowercase(),
            skill_id: skill_id.to_string(),
            fallbacks: fallbacks.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// A high-value vertical that replaces the keyword result when any trigger
/// phrase appears as a standalone token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainOverride {
    pub name: String,
    pub triggers: Vec<String>,
    pub skill_id: String,
    pub fallbacks: Vec<String>,
    pub confidence: f64,
}

impl DomainOverride {
    pub fn new(name: &str, triggers: &[&str], skill_id: &str, fallbacks: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            triggers: triggers.iter().map(|t| t.to_lowercase()).collect(),
            skill_id: skill_id.to_string(),
            fallbacks: fallbacks.iter().map(|f| f.to_string()).collect(),
            confidence: 0.9,
        }
    }

    /// `text` must already be lower-cased
    pub fn matches(&self, text: &str) -> bool {
        self.triggers
            .iter()
            .any(|trigger| scan(text, trigger).standalone)
    }
}

pub fn default_table() -> Vec<KeywordRule> {
    vec![
        KeywordRule::new("price", "product_pricing", &["general_inquiry"]),
        KeywordRule::new("pricing", "product_pricing", &["general_inquiry"]),
        KeywordRule::new("cost", "product_pricing", &["general_inquiry"]),
        KeywordRule::new("quote", "product_pricing", &["general_inquiry"]),
        KeywordRule::new("how much", "product_pricing", &["general_inquiry"]),
        KeywordRule::new("weather", "weather", &["general_inquiry"]),
        KeywordRule::new("forecast", "weather", &["general_inquiry"]),
        KeywordRule::new("temperature", "weather", &["general_inquiry"]),
        KeywordRule::new("appointment", "appointment_booking", &["general_inquiry"]),
        KeywordRule::new("book", "appointment_booking", &["general_inquiry"]),
        KeywordRule::new("schedule", "appointment_booking", &["general_inquiry"]),
        KeywordRule::new("reservation", "appointment_booking", &["general_inquiry"]),
        KeywordRule::new("email", "email_sender", &["general_inquiry"]),
        KeywordRule::new("invoice", "invoice_generator", &["general_inquiry"]),
        KeywordRule::new("refund", "refund_processor", &["general_inquiry"]),
        KeywordRule::new("lead", "lead_qualification", &["general_inquiry"]),
        KeywordRule::new("hours", "general_inquiry", &[]),
        KeywordRule::new("contact", "general_inquiry", &[]),
    ]
}

/// Applied in order; a later match replaces an earlier one
pub fn default_overrides() -> Vec<DomainOverride> {
    vec![
        DomainOverride::new(
            "recruitment",
            &[
                "recruit",
                "recruitment",
                "recruiting",
                "hiring",
                "job opening",
                "vacancy",
                "candidate",
            ],
            "recruitment_assistant",
            &["hr_faq", "general_inquiry"],
        ),
        DomainOverride::new(
            "ecommerce",
            &["e-commerce", "ecommerce", "shop", "online store", "cart", "checkout"],
            "ecommerce_assistant",
            &["product_pricing", "general_inquiry"],
        ),
    ]
}

/// Occurrences of a keyword in lower-cased text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Occurrences {
    pub count: usize,
    /// At least one occurrence is bounded by non-alphanumerics on both sides
    pub standalone: bool,
}

pub fn scan(text: &str, keyword: &str) -> Occurrences {
    let mut found = Occurrences::default();
    if keyword.is_empty() {
        return found;
    }

    for (start, _) in text.match_indices(keyword) {
        found.count += 1;
        let end = start + keyword.len();
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();
        let bounded = |c: Option<char>| c.map_or(true, |c| !c.is_alphanumeric());
        if bounded(before) && bounded(after) {
            found.standalone = true;
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_counts_and_boundaries() {
        assert_eq!(
            scan("the price, the price", "price"),
            Occurrences {
                count: 2,
                standalone: true
            }
        );
        assert_eq!(
            scan("workshop tools", "shop"),
            Occurrences {
                count: 1,
                standalone: false
            }
        );
        assert_eq!(scan("anything", ""), Occurrences::default());
    }

    #[test]
    fn test_override_needs_standalone_trigger() {
        let ecommerce = &default_overrides()[1];
        assert!(ecommerce.matches("i run a small shop"));
        assert!(ecommerce.matches("our e-commerce site"));
        assert!(!ecommerce.matches("join our workshop"));
    }
}
