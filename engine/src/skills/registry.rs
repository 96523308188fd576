//! Skill Registry
//!
//! In-memory mapping from skill name to metadata, shared by every
//! orchestration run. The map lives behind an `RwLock<Arc<..>>`: readers take
//! a cheap snapshot of the current `Arc` and never observe a partially built
//! map, while writers either swap in a completely new map (`rebuild`) or
//! copy-on-write a single entry (`upsert`, `remove`).
//!
//! A point update that races with a forced rebuild may be overwritten by the
//! rebuild's swap; the store on disk remains the source of truth.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use sdk::errors::EngineError;
use sdk::types::{CatalogEntry, SkillMetadata};

use super::store::SkillStore;

type SkillMap = HashMap<String, SkillMetadata>;

/// Handle to the shared skill registry. Clones share the same map.
#[derive(Debug, Clone)]
pub struct SkillRegistry {
    store: SkillStore,
    entries: Arc<RwLock<Arc<SkillMap>>>,
}

impl SkillRegistry {
    /// Create an empty registry backed by the given store
    pub fn new(store: SkillStore) -> Self {
        Self {
            store,
            entries: Arc::new(RwLock::new(Arc::new(HashMap::new()))),
        }
    }

    /// Open the store and load every skill in it
    pub async fn load(store: SkillStore) -> Result<Self, EngineError> {
        let registry = Self::new(store);
        registry.rebuild(true).await?;
        Ok(registry)
    }

    /// Rebuild the map from the document store.
    ///
    /// Without `force`, a registry that already holds entries is left as is.
    /// The new map is built off-lock and swapped in whole. Returns the number
    /// of registered skills.
    pub async fn rebuild(&self, force: bool) -> Result<usize, EngineError> {
        if !force && !self.is_empty() {
            debug!("Skill registry already populated, skipping rebuild");
            return Ok(self.len());
        }

        let scanned = self.store.scan().await?;
        let mut map: SkillMap = HashMap::with_capacity(scanned.len());
        for skill in scanned {
            if skill.name.is_empty() {
                debug!("Dropping unnamed skill from {}", skill.source_location);
                continue;
            }
            if let Some(previous) = map.get(&skill.name) {
                warn!(
                    "Skill '{}' in {} overrides {}",
                    skill.name, skill.source_location, previous.source_location
                );
            }
            map.insert(skill.name.clone(), skill);
        }

        let count = map.len();
        *self.entries.write().expect("SkillRegistry lock poisoned") = Arc::new(map);
        info!(
            "Loaded {} skill(s) from {}",
            count,
            self.store.root().display()
        );
        Ok(count)
    }

    /// Insert or overwrite an entry keyed by its name.
    ///
    /// Returns false (and changes nothing) when the name is empty.
    pub fn upsert(&self, skill: SkillMetadata) -> bool {
        if skill.name.is_empty() {
            return false;
        }
        let mut guard = self.entries.write().expect("SkillRegistry lock poisoned");
        Arc::make_mut(&mut *guard).insert(skill.name.clone(), skill);
        true
    }

    /// Remove an entry, returning it if it was present
    pub fn remove(&self, name: &str) -> Option<SkillMetadata> {
        let mut guard = self.entries.write().expect("SkillRegistry lock poisoned");
        if !guard.contains_key(name) {
            return None;
        }
        Arc::make_mut(&mut *guard).remove(name)
    }

    /// Consistent view of the whole map at this instant
    pub fn snapshot(&self) -> Arc<SkillMap> {
        Arc::clone(&self.entries.read().expect("SkillRegistry lock poisoned"))
    }

    /// Name, description and tags of every skill, ordered by name
    pub fn catalog(&self) -> Vec<CatalogEntry> {
        let mut catalog: Vec<CatalogEntry> = self
            .snapshot()
            .values()
            .map(SkillMetadata::catalog_entry)
            .collect();
        catalog.sort_by(|a, b| a.name.cmp(&b.name));
        catalog
    }

    /// Full body of one skill
    pub fn full_content(&self, name: &str) -> Option<String> {
        self.snapshot().get(name).map(|skill| skill.content.clone())
    }

    pub fn get(&self, name: &str) -> Option<SkillMetadata> {
        self.snapshot().get(name).cloned()
    }

    /// Every full record, ordered by name
    pub fn get_all(&self) -> Vec<SkillMetadata> {
        let mut all: Vec<SkillMetadata> = self.snapshot().values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Validate and save a document to the store, then register it
    pub async fn install(
        &self,
        requested_name: &str,
        document: &str,
    ) -> Result<SkillMetadata, EngineError> {
        let skill = self.store.write(requested_name, document).await?;
        info!("Installed skill '{}' at {}", skill.name, skill.source_location);
        self.upsert(skill.clone());
        Ok(skill)
    }

    /// Delete a skill's directory from the store and drop its entry
    pub async fn uninstall(&self, name: &str) -> Result<(), EngineError> {
        let source = self.get(name).map(|skill| skill.source_location);
        let dir = self
            .store
            .skill_dir(name, source.as_deref())
            .filter(|dir| dir.is_dir())
            .ok_or_else(|| EngineError::SkillNotFound(name.to_string()))?;

        self.store.delete_dir(&dir).await?;
        self.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached() -> SkillRegistry {
        SkillRegistry::new(SkillStore::new("unused-skills-dir"))
    }

    #[test]
    fn test_upsert_and_full_content() {
        let registry = detached();
        assert!(registry.upsert(SkillMetadata::new("pptx", "decks", "Use the template.")));
        assert_eq!(
            registry.full_content("pptx").as_deref(),
            Some("Use the template.")
        );
        assert_eq!(registry.full_content("missing"), None);
    }

    #[test]
    fn test_upsert_empty_name_is_noop() {
        let registry = detached();
        assert!(!registry.upsert(SkillMetadata::new("", "d", "c")));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_upsert_overwrites() {
        let registry = detached();
        registry.upsert(SkillMetadata::new("pdf", "v1", "old"));
        registry.upsert(SkillMetadata::new("pdf", "v2", "new"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("pdf").unwrap().description, "v2");
    }

    #[test]
    fn test_remove_absent_is_fine() {
        let registry = detached();
        assert!(registry.remove("ghost").is_none());
        registry.upsert(SkillMetadata::new("pdf", "d", "c"));
        assert!(registry.remove("pdf").is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_unaffected_by_later_writes() {
        let registry = detached();
        registry.upsert(SkillMetadata::new("a", "d", "c"));
        let before = registry.snapshot();
        registry.upsert(SkillMetadata::new("b", "d", "c"));
        assert_eq!(before.len(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_catalog_sorted_and_clones_share_state() {
        let registry = detached();
        let handle = registry.clone();
        handle.upsert(SkillMetadata::new("pptx", "decks", "c").with_tags(["office"]));
        handle.upsert(SkillMetadata::new("docx", "documents", "c"));

        let catalog = registry.catalog();
        let names: Vec<&str> = catalog.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["docx", "pptx"]);
        assert_eq!(catalog[1].tags, vec!["office"]);
    }
}
