use async_trait::async_trait;
use serde_json::json;
use skill_core::{
    ExecutionResult, ExecutionScope, Params, SimpleSkill, Skill, SkillCategory, SkillDescriptor,
    SkillHandle,
};
use skills::SkillRegistry;
use std::sync::Arc;

struct MockSkill {
    descriptor: SkillDescriptor,
}

impl MockSkill {
    fn new(id: &str, category: SkillCategory) -> Self {
        Self::versioned(id, category, "1.0.0")
    }

    fn versioned(id: &str, category: SkillCategory, version: &str) -> Self {
        Self {
            descriptor: SkillDescriptor::new(id, format!("Mock {id}"), category)
                .expect("valid id")
                .with_description(format!("Mock skill {id}"))
                .with_version(version)
                .with_tags(["mock"]),
        }
    }
}

impl Skill for MockSkill {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }
}

#[async_trait]
impl SimpleSkill for MockSkill {
    async fn execute(
        &self,
        _params: Params,
        _scope: ExecutionScope,
    ) -> anyhow::Result<ExecutionResult> {
        Ok(ExecutionResult::success(&self.descriptor.id, json!({"mock": true})))
    }
}

fn handle(id: &str, category: SkillCategory) -> SkillHandle {
    SkillHandle::simple(MockSkill::new(id, category))
}

#[test]
fn test_registry_with_defaults() {
    let registry = SkillRegistry::with_defaults();
    let ids: Vec<String> = registry.descriptors().into_iter().map(|d| d.id).collect();

    assert_eq!(
        ids,
        vec!["appointment_booking", "general_inquiry", "product_pricing", "weather"]
    );
    assert!(registry.get("general_inquiry").is_some_and(|h| h.is_dual_agent()));
    assert!(registry.get("weather").is_some_and(|h| !h.is_dual_agent()));
    assert!(registry.is_consistent());
}

#[test]
fn test_register_unregister_get() {
    let registry = SkillRegistry::new();
    registry.register(handle("email_sender", SkillCategory::Communication));

    assert!(registry.unregister("email_sender"));
    assert!(registry.get("email_sender").is_none());
    assert!(registry.is_empty());
}

#[test]
fn test_double_register_keeps_second() {
    let registry = SkillRegistry::new();
    registry.register(SkillHandle::simple(MockSkill::versioned(
        "lead_scoring",
        SkillCategory::Sales,
        "1.0.0",
    )));
    registry.register(SkillHandle::simple(MockSkill::versioned(
        "lead_scoring",
        SkillCategory::Sales,
        "2.0.0",
    )));

    assert_eq!(registry.len(), 1);
    let stored = registry.get("lead_scoring").expect("registered");
    assert_eq!(stored.descriptor().version, "2.0.0");
    assert_eq!(registry.by_category(&SkillCategory::Sales).len(), 1);
}

#[test]
fn test_reregister_moves_category() {
    let registry = SkillRegistry::new();
    registry.register(handle("report", SkillCategory::Analytics));
    registry.register(handle("report", SkillCategory::Data));

    assert!(registry.by_category(&SkillCategory::Analytics).is_empty());
    assert_eq!(registry.by_category(&SkillCategory::Data).len(), 1);
    assert!(!registry.stats().per_category.contains_key("analytics"));
    assert!(registry.is_consistent());
}

#[test]
fn test_by_category_sorted() {
    let registry = SkillRegistry::new();
    registry.register(handle("sms_sender", SkillCategory::Communication));
    registry.register(handle("email_sender", SkillCategory::Communication));
    registry.register(handle("invoice", SkillCategory::Finance));

    let ids: Vec<String> = registry
        .by_category(&SkillCategory::Communication)
        .iter()
        .map(|h| h.id().to_string())
        .collect();
    assert_eq!(ids, vec!["email_sender", "sms_sender"]);

    let stats = registry.stats();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.per_category.get("communication"), Some(&2));
    assert_eq!(stats.per_category.get("finance"), Some(&1));
}

#[test]
fn test_search_is_case_insensitive() {
    let registry = SkillRegistry::with_defaults();

    let by_name: Vec<String> = registry.search("WEATHER").into_iter().map(|d| d.id).collect();
    assert_eq!(by_name, vec!["weather"]);

    let by_tag: Vec<String> = registry.search("Quote").into_iter().map(|d| d.id).collect();
    assert_eq!(by_tag, vec!["product_pricing"]);

    let by_description = registry.search("opening hours");
    assert_eq!(by_description.len(), 1);
    assert_eq!(by_description[0].id, "general_inquiry");

    assert!(registry.search("nonexistent-capability").is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_register_and_lookup() {
    let registry = Arc::new(SkillRegistry::new());
    let categories = [
        SkillCategory::Communication,
        SkillCategory::Sales,
        SkillCategory::Data,
    ];

    let mut tasks = Vec::new();
    for worker in 0..8 {
        let registry = Arc::clone(&registry);
        let categories = categories.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..50 {
                let id = format!("skill_{}", i % 10);
                let category = categories[(worker + i) % categories.len()].clone();
                registry.register(handle(&id, category));
                let _ = registry.get(&id);
                let _ = registry.by_category(&SkillCategory::Sales);
                if i % 7 == 0 {
                    registry.unregister(&id);
                }
            }
        }));
    }

    for task in tasks {
        task.await.expect("worker finished");
    }

    assert!(registry.is_consistent());
    assert_eq!(registry.stats().total, registry.len());
}
