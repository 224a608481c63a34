//! Prompt templates with hot reload.
//!
//! Templates live in a YAML file keyed `scenario -> name -> template`:
//!
//! ```yaml
//! llm_chat:
//!   default: "{{ input }}"
//! knowledge_base_chat:
//!   default: |
//!     <known>{{ context }}</known>
//!     <question>{{ question }}</question>
//!   empty: "{{ question }}"
//! ```
//!
//! [`PromptStore`] keeps the parsed set behind a `parking_lot::RwLock` as an
//! `Arc` snapshot. Every lookup compares the file's modification stamp with
//! the loaded one and re-reads it when it changed, so edits take effect
//! without a restart. [`PromptStore::reload`] forces a re-read and bumps the
//! version.

pub mod render;

pub use render::{render, RenderVars};

use crate::error::{KnowledgeError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Scenario for plain chat templates.
pub const LLM_CHAT: &str = "llm_chat";

/// Scenario for knowledge-grounded chat templates.
pub const KNOWLEDGE_BASE_CHAT: &str = "knowledge_base_chat";

/// Template selected when retrieval finds no documents.
pub const EMPTY_TEMPLATE: &str = "empty";

/// Template used when a request names none.
pub const DEFAULT_TEMPLATE: &str = "default";

/// `scenario -> name -> template`.
pub type PromptTemplates = HashMap<String, HashMap<String, String>>;

/// Modification time and length of the template file when it was read.
type FileStamp = (Option<SystemTime>, u64);

struct Snapshot {
    templates: Arc<PromptTemplates>,
    stamp: Option<FileStamp>,
}

/// Process-wide template set.
pub struct PromptStore {
    path: Option<PathBuf>,
    snapshot: RwLock<Snapshot>,
    version: AtomicU64,
}

impl PromptStore {
    /// Load templates from `path` and watch it for changes.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let (templates, stamp) = read_templates(&path)?;
        info!(
            path = %path.display(),
            scenarios = templates.len(),
            "Prompt templates loaded"
        );

        Ok(Self {
            path: Some(path),
            snapshot: RwLock::new(Snapshot {
                templates: Arc::new(templates),
                stamp: Some(stamp),
            }),
            version: AtomicU64::new(1),
        })
    }

    /// A fixed template set with no backing file.
    pub fn from_templates(templates: PromptTemplates) -> Self {
        Self {
            path: None,
            snapshot: RwLock::new(Snapshot {
                templates: Arc::new(templates),
                stamp: None,
            }),
            version: AtomicU64::new(1),
        }
    }

    /// Current version. Starts at 1 and increases with every reload.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Re-read the backing file and return the new version.
    ///
    /// On failure the previous template set stays in place.
    pub fn reload(&self) -> Result<u64> {
        let Some(path) = &self.path else {
            return Ok(self.version());
        };

        let (templates, stamp) = read_templates(path)?;
        let mut snapshot = self.snapshot.write();
        snapshot.templates = Arc::new(templates);
        snapshot.stamp = Some(stamp);
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;

        info!(path = %path.display(), version, "Prompt templates reloaded");
        Ok(version)
    }

    /// The template set as of now, picking up file changes first.
    pub fn snapshot(&self) -> Arc<PromptTemplates> {
        self.refresh_if_changed();
        self.snapshot.read().templates.clone()
    }

    /// Look up `scenario/name`.
    pub fn get(&self, scenario: &str, name: &str) -> Result<String> {
        self.snapshot()
            .get(scenario)
            .and_then(|templates| templates.get(name))
            .cloned()
            .ok_or_else(|| KnowledgeError::TemplateNotFound {
                scenario: scenario.to_string(),
                name: name.to_string(),
            })
    }

    fn refresh_if_changed(&self) {
        let Some(path) = &self.path else {
            return;
        };

        let current = match file_stamp(path) {
            Ok(stamp) => stamp,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot stat prompt file, keeping loaded templates");
                return;
            }
        };
        if self.snapshot.read().stamp == Some(current) {
            return;
        }

        debug!(path = %path.display(), "Prompt file changed on disk");
        if let Err(e) = self.reload() {
            warn!(path = %path.display(), error = %e, "Prompt reload failed, keeping loaded templates");
        }
    }
}

impl std::fmt::Debug for PromptStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptStore")
            .field("path", &self.path)
            .field("version", &self.version())
            .finish()
    }
}

fn file_stamp(path: &Path) -> std::io::Result<FileStamp> {
    let meta = std::fs::metadata(path)?;
    Ok((meta.modified().ok(), meta.len()))
}

fn read_templates(path: &Path) -> Result<(PromptTemplates, FileStamp)> {
    let stamp = file_stamp(path).map_err(|e| {
        KnowledgeError::Config(format!("cannot read prompt file {}: {}", path.display(), e))
    })?;
    let templates: PromptTemplates = utils::load_yaml_config(path)?;
    Ok((templates, stamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PROMPTS: &str = r#"
llm_chat:
  default: "{{ input }}"
knowledge_base_chat:
  default: "<known>{{ context }}</known><question>{{ question }}</question>"
  empty: "{{ question }}"
"#;

    fn store_in(dir: &TempDir, content: &str) -> (PathBuf, PromptStore) {
        let path = dir.path().join("prompts.yaml");
        fs::write(&path, content).unwrap();
        let store = PromptStore::from_file(&path).unwrap();
        (path, store)
    }

    #[test]
    fn test_lookup() {
        let dir = TempDir::new().unwrap();
        let (_, store) = store_in(&dir, PROMPTS);

        assert_eq!(store.get(LLM_CHAT, DEFAULT_TEMPLATE).unwrap(), "{{ input }}");
        assert_eq!(store.get(KNOWLEDGE_BASE_CHAT, EMPTY_TEMPLATE).unwrap(), "{{ question }}");
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_missing_template_names_scenario_and_name() {
        let dir = TempDir::new().unwrap();
        let (_, store) = store_in(&dir, PROMPTS);

        match store.get(KNOWLEDGE_BASE_CHAT, "tlbb4") {
            Err(KnowledgeError::TemplateNotFound { scenario, name }) => {
                assert_eq!(scenario, KNOWLEDGE_BASE_CHAT);
                assert_eq!(name, "tlbb4");
            }
            other => panic!("expected TemplateNotFound, got {:?}", other),
        }
        assert!(store.get("search_engine_chat", DEFAULT_TEMPLATE).is_err());
    }

    #[test]
    fn test_lookup_sees_edits_without_reload() {
        let dir = TempDir::new().unwrap();
        let (path, store) = store_in(&dir, PROMPTS);

        fs::write(&path, "llm_chat:\n  default: \"edited {{ input }}\"\n  py: \"code: {{ input }}\"\n").unwrap();

        assert_eq!(store.get(LLM_CHAT, DEFAULT_TEMPLATE).unwrap(), "edited {{ input }}");
        assert_eq!(store.get(LLM_CHAT, "py").unwrap(), "code: {{ input }}");
        assert!(store.version() > 1);
    }

    #[test]
    fn test_explicit_reload_bumps_version() {
        let dir = TempDir::new().unwrap();
        let (_, store) = store_in(&dir, PROMPTS);

        assert_eq!(store.reload().unwrap(), 2);
        assert_eq!(store.reload().unwrap(), 3);
        assert_eq!(store.version(), 3);
    }

    #[test]
    fn test_broken_file_keeps_previous_templates() {
        let dir = TempDir::new().unwrap();
        let (path, store) = store_in(&dir, PROMPTS);

        fs::write(&path, "llm_chat: [not, a, mapping").unwrap();

        assert!(store.reload().is_err());
        assert_eq!(store.get(LLM_CHAT, DEFAULT_TEMPLATE).unwrap(), "{{ input }}");
    }

    #[test]
    fn test_static_store() {
        let mut scenario = HashMap::new();
        scenario.insert(DEFAULT_TEMPLATE.to_string(), "{{ input }}".to_string());
        let mut templates = PromptTemplates::new();
        templates.insert(LLM_CHAT.to_string(), scenario);

        let store = PromptStore::from_templates(templates);
        assert_eq!(store.get(LLM_CHAT, DEFAULT_TEMPLATE).unwrap(), "{{ input }}");
        assert_eq!(store.reload().unwrap(), 1);
    }
}
