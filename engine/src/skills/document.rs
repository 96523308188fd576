//! Skill document parsing
//!
//! A skill document is a Markdown file that opens with a `---` delimited
//! YAML header followed by free-form body text:
//!
//! ```text
//! ---
//! name: pptx
//! description: Build slide decks
//! tags: [office, slides]
//! ---
//! Instructions for the model...
//! ```

use serde::{Deserialize, Deserializer};
use std::path::Path;

use sdk::errors::EngineError;
use sdk::types::SkillMetadata;

const DELIMITER: &str = "---";

#[derive(Debug, Default, Deserialize)]
struct SkillHeader {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient_tags")]
    tags: Vec<String>,
    #[serde(default)]
    steering: Option<String>,
}

/// Accepts a list, a single string, or null for `tags`
fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        Many(Vec<String>),
        One(String),
    }

    Ok(match Option::<Tags>::deserialize(deserializer)? {
        Some(Tags::Many(tags)) => tags,
        Some(Tags::One(tag)) => vec![tag],
        None => Vec::new(),
    })
}

/// Parse a skill document into metadata.
///
/// The body is trimmed and kept verbatim as `content`. A header without a
/// `name` still parses; the registry drops such entries.
pub fn parse_skill_document(text: &str, source: &Path) -> Result<SkillMetadata, EngineError> {
    if !text.starts_with(DELIMITER) {
        return Err(EngineError::SkillParse(format!(
            "{}: missing YAML header",
            source.display()
        )));
    }

    let parts: Vec<&str> = text.splitn(3, DELIMITER).collect();
    if parts.len() < 3 {
        return Err(EngineError::SkillParse(format!(
            "{}: header is not closed by ---",
            source.display()
        )));
    }

    let header_str = parts[1];
    let header: SkillHeader = if header_str.trim().is_empty() {
        SkillHeader::default()
    } else {
        serde_yaml::from_str(header_str).map_err(|e| {
            EngineError::SkillParse(format!("{}: invalid header: {}", source.display(), e))
        })?
    };

    Ok(SkillMetadata {
        name: header.name.unwrap_or_default(),
        description: header.description.unwrap_or_default(),
        tags: header.tags,
        content: parts[2].trim().to_string(),
        source_location: source.display().to_string(),
        steering: header.steering.filter(|s| !s.trim().is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<SkillMetadata, EngineError> {
        parse_skill_document(text, Path::new("skills/test/SKILL.md"))
    }

    #[test]
    fn test_parse_full_header() {
        let skill = parse(
            "---\nname: pptx\ndescription: build slide decks\ntags:\n  - office\n  - slides\n---\n\n# PPTX\nUse the template.\n",
        )
        .unwrap();

        assert_eq!(skill.name, "pptx");
        assert_eq!(skill.description, "build slide decks");
        assert_eq!(skill.tags, vec!["office", "slides"]);
        assert_eq!(skill.content, "# PPTX\nUse the template.");
        assert_eq!(skill.source_location, "skills/test/SKILL.md");
        assert!(skill.steering.is_none());
    }

    #[test]
    fn test_body_may_contain_delimiter() {
        let skill = parse("---\nname: md\ndescription: d\n---\nabove\n---\nbelow").unwrap();
        assert_eq!(skill.content, "above\n---\nbelow");
    }

    #[test]
    fn test_missing_header_rejected() {
        let err = parse("# Just markdown\n").unwrap_err();
        assert!(matches!(err, EngineError::SkillParse(_)));
    }

    #[test]
    fn test_unclosed_header_rejected() {
        let err = parse("---\nname: broken\n").unwrap_err();
        assert!(matches!(err, EngineError::SkillParse(_)));
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        let err = parse("---\nname: [unterminated\n---\nbody").unwrap_err();
        assert!(matches!(err, EngineError::SkillParse(_)));
    }

    #[test]
    fn test_missing_name_parses_empty() {
        let skill = parse("---\ndescription: nameless\n---\nbody").unwrap();
        assert!(skill.name.is_empty());
        assert_eq!(skill.description, "nameless");
    }

    #[test]
    fn test_tags_accept_null_and_scalar() {
        let skill = parse("---\nname: a\ndescription: d\ntags: null\n---\nbody").unwrap();
        assert!(skill.tags.is_empty());

        let skill = parse("---\nname: b\ndescription: d\ntags:\n---\nbody").unwrap();
        assert!(skill.tags.is_empty());

        let skill = parse("---\nname: c\ndescription: d\ntags: office\n---\nbody").unwrap();
        assert_eq!(skill.tags, vec!["office"]);

        let skill = parse("---\nname: d\ndescription: d\n---\nbody").unwrap();
        assert!(skill.tags.is_empty());
    }

    #[test]
    fn test_steering_field() {
        let skill = parse(
            "---\nname: pptx\ndescription: decks\nsteering: Fill in the template and run it.\n---\nbody",
        )
        .unwrap();
        assert_eq!(
            skill.steering.as_deref(),
            Some("Fill in the template and run it.")
        );
    }
}
