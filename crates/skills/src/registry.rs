use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use skill_core::{SkillCategory, SkillDescriptor, SkillHandle};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

/// Count of registered skills, overall and per category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total: usize,
    pub per_category: BTreeMap<String, usize>,
}

#[derive(Default)]
struct Inner {
    skills: HashMap<String, SkillHandle>,
    by_category: HashMap<SkillCategory, BTreeSet<String>>,
}

impl Inner {
    fn detach(&mut self, id: &str, category: &SkillCategory) {
        if let Some(bucket) = self.by_category.get_mut(category) {
            bucket.remove(id);
            if bucket.is_empty() {
                self.by_category.remove(category);
            }
        }
    }
}

/// In-memory catalog of skills, indexed by id and by category.
///
/// Both indexes sit behind one lock so that a reader never sees an id in a
/// category bucket without the matching primary entry.
#[derive(Default)]
pub struct SkillRegistry {
    inner: RwLock<Inner>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the reference skills
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        crate::builtin::register_defaults(&registry);
        registry
    }

    /// Add or replace a skill. Replacing logs a warning.
    pub fn register(&self, handle: SkillHandle) {
        let descriptor = handle.descriptor().clone();
        let mut inner = self.inner.write();

        if let Some(previous) = inner.skills.insert(descriptor.id.clone(), handle) {
            warn!(
                skill_id = %descriptor.id,
                previous_version = %previous.descriptor().version,
                version = %descriptor.version,
                "Overwriting registered skill"
            );
            let old_category = previous.descriptor().category.clone();
            if old_category != descriptor.category {
                inner.detach(&descriptor.id, &old_category);
            }
        }

        inner
            .by_category
            .entry(descriptor.category.clone())
            .or_default()
            .insert(descriptor.id.clone());

        debug!(skill_id = %descriptor.id, category = %descriptor.category, "Skill registered");
    }

    pub fn unregister(&self, skill_id: &str) -> bool {
        let mut inner = self.inner.write();
        match inner.skills.remove(skill_id) {
            Some(handle) => {
                let category = handle.descriptor().category.clone();
                inner.detach(skill_id, &category);
                debug!(skill_id, "Skill unregistered");
                true
            }
            None => false,
        }
    }

    pub fn get(&self, skill_id: &str) -> Option<SkillHandle> {
        self.inner.read().skills.get(skill_id).cloned()
    }

    pub fn contains(&self, skill_id: &str) -> bool {
        self.inner.read().skills.contains_key(skill_id)
    }

    /// Skills in a category, ordered by id
    pub fn by_category(&self, category: &SkillCategory) -> Vec<SkillHandle> {
        let inner = self.inner.read();
        inner
            .by_category
            .get(category)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.skills.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Case-insensitive substring match on id, name, description or any tag
    pub fn search(&self, query: &str) -> Vec<SkillDescriptor> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<SkillDescriptor> = self
            .inner
            .read()
            .skills
            .values()
            .map(SkillHandle::descriptor)
            .filter(|d| {
                d.id.to_lowercase().contains(&needle)
                    || d.display_name.to_lowercase().contains(&needle)
                    || d.description.to_lowercase().contains(&needle)
                    || d.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        matches
    }

    pub fn descriptors(&self) -> Vec<SkillDescriptor> {
        let mut all: Vec<SkillDescriptor> = self
            .inner
            .read()
            .skills
            .values()
            .map(|h| h.descriptor().clone())
            .collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn stats(&self) -> RegistryStats {
        let inner = self.inner.read();
        RegistryStats {
            total: inner.skills.len(),
            per_category: inner
                .by_category
                .iter()
                .map(|(category, ids)| (category.to_string(), ids.len()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().skills.is_empty()
    }

    /// Check that both indexes agree. Used by tests.
    #[doc(hidden)]
    pub fn is_consistent(&self) -> bool {
        let inner = self.inner.read();
        let indexed: usize = inner.by_category.values().map(BTreeSet::len).sum();
        indexed == inner.skills.len()
            && inner.by_category.iter().all(|(category, ids)| {
                ids.iter().all(|id| {
                    inner
                        .skills
                        .get(id)
                        .is_some_and(|h| &h.descriptor().category == category)
                })
            })
    }
}

impl std::fmt::Debug for SkillRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillRegistry")
            .field("skills", &self.len())
            .finish()
    }
}
