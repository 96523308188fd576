//! Skills
//!
//! Skills are Markdown documents with a YAML header that teach the model how
//! to carry out a class of task. The model first sees only the catalog (name,
//! description, tags) and fetches a skill's full body on demand.

pub mod document;
pub mod registry;
pub mod store;

pub use document::parse_skill_document;
pub use registry::SkillRegistry;
pub use store::{sanitize_skill_name, SkillStore, SKILL_FILE_NAME};
