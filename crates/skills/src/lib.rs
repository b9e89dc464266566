//! Skill catalog: the registry and the reference skills

pub mod builtin;
pub mod registry;

pub use builtin::register_defaults;
pub use registry::{RegistryStats, SkillRegistry};
