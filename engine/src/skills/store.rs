//! Skill document store
//!
//! Skills live on disk as `<root>/<directory>/SKILL.md`. The store scans the
//! tree for those files, writes newly installed documents, and deletes skill
//! directories. It holds no in-memory state; the registry does.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::fs;
use tracing::{debug, info, warn};

use sdk::errors::EngineError;
use sdk::types::SkillMetadata;

use super::document::parse_skill_document;

/// File name every skill document must have
pub const SKILL_FILE_NAME: &str = "SKILL.md";

static UNSAFE_NAME_CHARS: OnceLock<Regex> = OnceLock::new();

/// Replace characters that are unsafe in directory names with `_`.
///
/// Returns `None` when nothing usable remains.
pub fn sanitize_skill_name(raw: &str) -> Option<String> {
    let pattern = UNSAFE_NAME_CHARS
        .get_or_init(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("Invalid skill name pattern"));
    let cleaned = pattern.replace_all(raw, "_").trim().to_string();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        None
    } else {
        Some(cleaned)
    }
}

/// Directory-backed store of skill documents
#[derive(Debug, Clone)]
pub struct SkillStore {
    root: PathBuf,
}

impl SkillStore {
    /// Refer to a store without touching the filesystem
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open the store, creating the root directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let root = root.into();
        if !root.exists() {
            info!("Skills directory {} does not exist yet, creating it", root.display());
            fs::create_dir_all(&root).await?;
        }
        Ok(Self { root })
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan the whole tree for skill documents.
    ///
    /// Documents that fail to read or parse are logged and skipped, as are
    /// subdirectories that cannot be listed. Only an unreadable root fails.
    pub async fn scan(&self) -> Result<Vec<SkillMetadata>, EngineError> {
        let mut documents = Vec::new();
        let mut pending = vec![self.root.clone()];
        let mut is_root = true;

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if is_root => return Err(e.into()),
                Err(e) => {
                    warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                    continue;
                }
            };
            is_root = false;

            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Stopped listing {}: {}", dir.display(), e);
                        break;
                    }
                };
                let path = entry.path();
                let file_type = match entry.file_type().await {
                    Ok(file_type) => file_type,
                    Err(e) => {
                        warn!("Skipping {}: {}", path.display(), e);
                        continue;
                    }
                };

                if file_type.is_dir() {
                    pending.push(path);
                } else if path.file_name().and_then(|n| n.to_str()) == Some(SKILL_FILE_NAME) {
                    documents.push(path);
                }
            }
        }

        documents.sort();

        let mut skills = Vec::with_capacity(documents.len());
        for path in documents {
            match self.load(&path).await {
                Ok(skill) => {
                    debug!("Parsed skill '{}' from {}", skill.name, path.display());
                    skills.push(skill);
                }
                Err(e) => warn!("Failed to parse skill {}: {}", path.display(), e),
            }
        }

        Ok(skills)
    }

    /// Read and parse a single document
    pub async fn load(&self, path: &Path) -> Result<SkillMetadata, EngineError> {
        let text = fs::read_to_string(path).await?;
        parse_skill_document(&text, path)
    }

    /// Validate a document, then save it as `<root>/<sanitized name>/SKILL.md`.
    ///
    /// Nothing on disk changes unless the document parses and its header
    /// names the skill. The file is written beside the target and renamed
    /// into place, so an existing document is replaced whole or not at all.
    pub async fn write(
        &self,
        requested_name: &str,
        document: &str,
    ) -> Result<SkillMetadata, EngineError> {
        let dir_name = sanitize_skill_name(requested_name)
            .ok_or_else(|| EngineError::InvalidSkillName(requested_name.to_string()))?;

        let skill_dir = self.root.join(&dir_name);
        let file_path = skill_dir.join(SKILL_FILE_NAME);

        let skill = parse_skill_document(document, &file_path)?;
        if skill.name.is_empty() {
            return Err(EngineError::SkillParse(format!(
                "{}: header has no name",
                file_path.display()
            )));
        }

        fs::create_dir_all(&skill_dir).await?;
        let staging = skill_dir.join(format!(".{}.tmp", SKILL_FILE_NAME));
        fs::write(&staging, document).await?;
        if let Err(e) = fs::rename(&staging, &file_path).await {
            if let Err(cleanup) = fs::remove_file(&staging).await {
                warn!("Failed to remove {}: {}", staging.display(), cleanup);
            }
            return Err(e.into());
        }

        Ok(skill)
    }

    /// Directory holding a skill.
    ///
    /// Uses the parent of the document's location when it lies inside the
    /// store, otherwise `<root>/<sanitized name>`.
    pub fn skill_dir(&self, name: &str, source_location: Option<&str>) -> Option<PathBuf> {
        let from_source = source_location
            .map(Path::new)
            .and_then(Path::parent)
            .filter(|dir| dir.starts_with(&self.root) && *dir != self.root.as_path());

        match from_source {
            Some(dir) => Some(dir.to_path_buf()),
            None => sanitize_skill_name(name).map(|dir_name| self.root.join(dir_name)),
        }
    }

    /// Recursively delete a skill directory
    pub async fn delete_dir(&self, dir: &Path) -> Result<(), EngineError> {
        if !dir.is_dir() {
            return Err(EngineError::SkillNotFound(dir.display().to_string()));
        }
        fs::remove_dir_all(dir).await?;
        info!("Deleted skill directory {}", dir.display());
        Ok(())
    }
}
