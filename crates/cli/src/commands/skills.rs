use crate::output::Output;
use anyhow::Result;
use clap::Args;
use common::CoreConfig;
use skill_core::{SkillCategory, SkillDescriptor};
use skills::SkillRegistry;

#[derive(Debug, Args)]
pub struct SkillsCommand {
    /// Case-insensitive match on id, name, description and tags
    #[arg(long)]
    search: Option<String>,

    #[arg(long)]
    category: Option<String>,
}

impl SkillsCommand {
    pub fn execute(self, _config: CoreConfig, out: &Output) -> Result<()> {
        let registry = SkillRegistry::with_defaults();

        let category = self.category.as_deref().map(SkillCategory::parse);
        let mut descriptors: Vec<SkillDescriptor> = match (&self.search, &category) {
            (Some(query), _) => registry.search(query),
            (None, Some(category)) => registry
                .by_category(category)
                .iter()
                .map(|handle| handle.descriptor().clone())
                .collect(),
            (None, None) => registry.descriptors(),
        };
        if let Some(category) = &category {
            descriptors.retain(|d| &d.category == category);
        }

        out.skills(&descriptors)
    }
}
