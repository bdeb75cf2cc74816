use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::Story;
use super::schema::{self, is_valid_story_id};
use crate::errors::StoryError;

/// Story document extensions, in lookup preference order.
pub const STORY_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Locates story documents under a root directory.
///
/// A story is addressed by its id: `<root>/<id>.<ext>` is checked first,
/// then the tree below the root is searched for a file named `<id>.<ext>`.
#[derive(Debug, Clone)]
pub struct StoryRepository {
    root: PathBuf,
    strict_lookup: bool,
}

impl StoryRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            strict_lookup: false,
        }
    }

    /// Treat more than one matching document as an error instead of
    /// taking the first match.
    pub fn with_strict_lookup(mut self, strict: bool) -> Self {
        self.strict_lookup = strict;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find, parse and validate the story `story_id`.
    pub fn load(&self, story_id: &str) -> Result<Story, StoryError> {
        let path = self.find(story_id)?;
        let story = load_from_path(&path)?;
        if story.id != story_id {
            return Err(StoryError::Validation {
                path,
                violations: vec![format!(
                    "id: document declares '{}' but was addressed as '{}'",
                    story.id, story_id
                )],
            });
        }
        debug!(story_id, path = %path.display(), "Loaded story");
        Ok(story)
    }

    /// Resolve the document path for `story_id`.
    pub fn find(&self, story_id: &str) -> Result<PathBuf, StoryError> {
        if !is_valid_story_id(story_id) {
            return Err(StoryError::Validation {
                path: self.root.clone(),
                violations: vec![format!("id: '{}' is not a valid story identifier", story_id)],
            });
        }

        let mut candidates = self.candidates(story_id);
        if candidates.is_empty() {
            return Err(StoryError::NotFound {
                story_id: story_id.to_string(),
                root: self.root.clone(),
            });
        }
        if candidates.len() > 1 {
            if self.strict_lookup {
                return Err(StoryError::Ambiguous {
                    story_id: story_id.to_string(),
                    candidates,
                });
            }
            warn!(
                story_id,
                matches = candidates.len(),
                chosen = %candidates[0].display(),
                "Multiple story documents match; using the first"
            );
        }
        Ok(candidates.swap_remove(0))
    }

    /// All matching documents: direct addresses first, then the nested
    /// search in file-name order.
    fn candidates(&self, story_id: &str) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = STORY_EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{}.{}", story_id, ext)))
            .filter(|p| p.is_file())
            .collect();

        if !self.root.is_dir() {
            return found;
        }

        let nested = WalkDir::new(&self.root)
            .min_depth(2)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable path in story search");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| matches_story(path, story_id));
        found.extend(nested);
        found
    }
}

fn matches_story(path: &Path, story_id: &str) -> bool {
    let stem_matches = path.file_stem().and_then(|s| s.to_str()) == Some(story_id);
    let ext_matches = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| STORY_EXTENSIONS.contains(&e.to_lowercase().as_str()));
    stem_matches && ext_matches
}

/// Parse and validate a story document at an explicit path.
pub fn load_from_path(path: &Path) -> Result<Story, StoryError> {
    let content = std::fs::read_to_string(path).map_err(|source| StoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let doc: Value = if is_json {
        serde_json::from_str(&content).map_err(|e| StoryError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    } else {
        serde_yaml::from_str(&content).map_err(|e| StoryError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    };

    schema::validate(&doc).map_err(|violations| StoryError::Validation {
        path: path.to_path_buf(),
        violations,
    })
}
