use proptest::prelude::*;
use std::path::Path;

use sdk::types::SkillMetadata;
use skillforge_engine::skills::{
    parse_skill_document, sanitize_skill_name, SkillRegistry, SkillStore,
};

fn detached() -> SkillRegistry {
    SkillRegistry::new(SkillStore::new("unused-skills-dir"))
}

// Property: full_content returns exactly what the latest upsert stored
proptest! {
    #[test]
    fn test_upsert_then_full_content(
        name in "[a-z][a-z0-9-]{0,15}",
        first in ".{0,64}",
        second in ".{0,64}",
    ) {
        let registry = detached();
        registry.upsert(SkillMetadata::new(name.clone(), "d", first));
        registry.upsert(SkillMetadata::new(name.clone(), "d", second.clone()));

        prop_assert_eq!(registry.len(), 1);
        prop_assert_eq!(registry.full_content(&name), Some(second));
    }
}

// Property: the catalog lists each name once, sorted, and matches get_all
proptest! {
    #[test]
    fn test_catalog_matches_entries(
        names in prop::collection::vec("[a-z]{1,8}", 0..12),
    ) {
        let registry = detached();
        for name in &names {
            registry.upsert(SkillMetadata::new(name.clone(), "d", "c"));
        }

        let mut expected = names.clone();
        expected.sort();
        expected.dedup();

        let catalog: Vec<String> = registry.catalog().into_iter().map(|e| e.name).collect();
        let all: Vec<String> = registry.get_all().into_iter().map(|s| s.name).collect();
        prop_assert_eq!(&catalog, &expected);
        prop_assert_eq!(&all, &expected);
    }
}

// Property: sanitized names never contain path or reserved characters
proptest! {
    #[test]
    fn test_sanitized_names_are_safe(raw in ".{0,40}") {
        if let Some(clean) = sanitize_skill_name(&raw) {
            prop_assert!(!clean.is_empty());
            prop_assert!(clean != "." && clean != "..");
            prop_assert!(!clean.chars().any(|c| "<>:\"/\\|?*".contains(c)));
        }
    }
}

// Property: header fields and body survive parsing
proptest! {
    #[test]
    fn test_document_fields_survive_parsing(
        name in "x[a-z0-9_]{0,12}",
        description in "Build [A-Za-z ]{0,30}[a-z]",
        body in "[A-Za-z0-9][A-Za-z0-9 .,\n]{0,80}[a-z]",
    ) {
        let document = format!(
            "---\nname: {}\ndescription: {}\ntags: [alpha, beta]\n---\n{}\n",
            name, description, body
        );

        let skill = parse_skill_document(&document, Path::new("mem/SKILL.md")).unwrap();
        prop_assert_eq!(skill.name, name);
        prop_assert_eq!(skill.description, description);
        prop_assert_eq!(skill.tags, vec!["alpha".to_string(), "beta".to_string()]);
        prop_assert_eq!(skill.content, body);
    }
}
