//! Tool registry: typed bundle descriptors loaded once from the registry document.
//!
//! The document is parsed into strongly-typed descriptors at the boundary; a
//! missing required field, a blank value or a duplicate `id` rejects the whole
//! document. Lookups go by `id` only: display names may collide and are for
//! humans.

use crate::types::{Config, Error, Result, ToolId};
use crate::validation::validate_non_empty;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Version reported when the document does not carry `launcher_version`.
pub const DEFAULT_LAUNCHER_VERSION: &str = "1.0.0";

// =============================================================================
// Document shape
// =============================================================================

#[derive(Debug, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    launcher_version: Option<String>,
    #[serde(default)]
    tools: Vec<ToolEntryDocument>,
    #[serde(flatten)]
    config: Config,
}

#[derive(Debug, Deserialize)]
struct ToolEntryDocument {
    id: String,
    display_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default = "default_enabled")]
    enabled: bool,
    path: String,
    entry_point: String,
    #[serde(default)]
    runtime: Option<String>,
    #[serde(default)]
    status_file: Option<String>,
}

fn default_enabled() -> bool {
    true
}

// =============================================================================
// Descriptor
// =============================================================================

/// Identity and launch contract for one registered tool bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub id: ToolId,
    pub display_name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub enabled: bool,
    /// Bundle root; the child's working directory.
    pub root_path: PathBuf,
    /// Script or executable, relative to `root_path`.
    pub entry_point: PathBuf,
    /// The bundle's private interpreter/runtime binary.
    pub runtime_path: PathBuf,
    /// Where the bundle's engine writes its status records.
    pub status_path: PathBuf,
}

impl ToolDescriptor {
    /// Absolute location of the entry point inside the bundle.
    pub fn entry_path(&self) -> PathBuf {
        self.root_path.join(&self.entry_point)
    }

    pub fn description_or_default(&self) -> &str {
        self.description.as_deref().unwrap_or("No description")
    }

    pub fn category_or_default(&self) -> &str {
        self.category.as_deref().unwrap_or("Uncategorized")
    }

    /// Human-readable info block for the selected tool.
    pub fn summary(&self) -> String {
        format!(
            "{}\n{}\nCategory: {}\nPath: {}",
            self.display_name,
            self.description_or_default(),
            self.category_or_default(),
            self.root_path.display()
        )
    }
}

/// Runtime location used by bundles that ship their own virtual environment.
pub fn conventional_runtime_path(root: &Path) -> PathBuf {
    if cfg!(windows) {
        root.join(".venv").join("Scripts").join("python.exe")
    } else {
        root.join(".venv").join("bin").join("python")
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Ordered, immutable set of tool descriptors.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    launcher_version: Option<String>,
    config: Config,
    tools: Vec<ToolDescriptor>,
    by_id: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Load and validate the registry document at `path`.
    ///
    /// Relative bundle paths resolve against the document's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => {
                return Err(Error::config_malformed(format!(
                    "{}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let registry = Self::parse(&raw, &base_dir).map_err(|e| match e {
            Error::ConfigMalformed(msg) => {
                Error::config_malformed(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        tracing::info!(
            path = %path.display(),
            tools = registry.len(),
            enabled = registry.list_enabled().len(),
            "registry_loaded"
        );
        Ok(registry)
    }

    /// Parse a registry document held in memory.
    pub fn parse(document: &str, base_dir: &Path) -> Result<Self> {
        let doc: RegistryDocument =
            serde_json::from_str(document).map_err(|e| Error::config_malformed(e.to_string()))?;

        let mut registry = ToolRegistry {
            launcher_version: doc.launcher_version,
            config: doc.config,
            tools: Vec::with_capacity(doc.tools.len()),
            by_id: HashMap::with_capacity(doc.tools.len()),
        };

        for (index, entry) in doc.tools.into_iter().enumerate() {
            let descriptor = registry.build_descriptor(index, entry, base_dir)?;
            if registry.by_id.contains_key(descriptor.id.as_str()) {
                return Err(Error::config_malformed(format!(
                    "duplicate tool id '{}' at tools[{}]",
                    descriptor.id, index
                )));
            }
            registry
                .by_id
                .insert(descriptor.id.to_string(), registry.tools.len());
            registry.tools.push(descriptor);
        }

        Ok(registry)
    }

    fn build_descriptor(
        &self,
        index: usize,
        entry: ToolEntryDocument,
        base_dir: &Path,
    ) -> Result<ToolDescriptor> {
        let field = |name: &str| format!("tools[{}].{}", index, name);
        validate_non_empty(&entry.display_name, &field("display_name"))?;
        validate_non_empty(&entry.path, &field("path"))?;
        validate_non_empty(&entry.entry_point, &field("entry_point"))?;
        let id = ToolId::from_string(entry.id)
            .map_err(|e| Error::config_malformed(format!("{}: {}", field("id"), e)))?;

        let root_path = base_dir.join(&entry.path);
        let runtime_path = match entry.runtime.as_deref() {
            Some(runtime) => {
                validate_non_empty(runtime, &field("runtime"))?;
                root_path.join(runtime)
            }
            None => conventional_runtime_path(&root_path),
        };
        let status_path = match entry.status_file.as_deref() {
            Some(status_file) => {
                validate_non_empty(status_file, &field("status_file"))?;
                root_path.join(status_file)
            }
            None => root_path
                .join(&self.config.controller.logs_dir)
                .join(format!("{}_status.json", id)),
        };

        Ok(ToolDescriptor {
            display_name: entry.display_name,
            description: entry.description,
            category: entry.category,
            enabled: entry.enabled,
            entry_point: PathBuf::from(entry.entry_point),
            root_path,
            runtime_path,
            status_path,
            id,
        })
    }

    /// Descriptor for `id`, matched on the identifier only.
    pub fn lookup(&self, id: &str) -> Option<&ToolDescriptor> {
        self.by_id.get(id).and_then(|&idx| self.tools.get(idx))
    }

    /// Enabled descriptors, in document order.
    pub fn list_enabled(&self) -> Vec<&ToolDescriptor> {
        self.tools.iter().filter(|t| t.enabled).collect()
    }

    /// All descriptors, in document order.
    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    pub fn launcher_version(&self) -> &str {
        self.launcher_version
            .as_deref()
            .unwrap_or(DEFAULT_LAUNCHER_VERSION)
    }

    /// Controller title line.
    pub fn title(&self) -> String {
        format!("Studio Controller v{}", self.launcher_version())
    }

    /// Settings carried by the document (defaults when absent).
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn sample_document() -> String {
        serde_json::json!({
            "launcher_version": "2.1.0",
            "tools": [
                {
                    "id": "fake_tool",
                    "display_name": "Fake Tool",
                    "description": "Image folder scanner",
                    "category": "Testing",
                    "path": "tools/FakeTool",
                    "entry_point": "launch.py"
                },
                {
                    "id": "md_converter",
                    "display_name": "Markdown Converter",
                    "enabled": false,
                    "path": "tools/md_converter",
                    "entry_point": "main_gui.py"
                },
                {
                    "id": "vision_tester",
                    "display_name": "Vision Tester",
                    "path": "/opt/tools/Vision_Tester",
                    "entry_point": "main_gui.py",
                    "runtime": "/usr/bin/python3",
                    "status_file": "logs/vision_tester_status.json"
                }
            ]
        })
        .to_string()
    }

    #[test]
    fn test_parse_preserves_order_and_fields() {
        let registry = ToolRegistry::parse(&sample_document(), Path::new("/studio")).unwrap();
        assert_eq!(registry.len(), 3);
        let ids: Vec<&str> = registry.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["fake_tool", "md_converter", "vision_tester"]);

        let fake = registry.lookup("fake_tool").unwrap();
        assert_eq!(fake.root_path, PathBuf::from("/studio/tools/FakeTool"));
        assert_eq!(fake.entry_path(), PathBuf::from("/studio/tools/FakeTool/launch.py"));
        assert_eq!(
            fake.runtime_path,
            conventional_runtime_path(Path::new("/studio/tools/FakeTool"))
        );
        assert_eq!(
            fake.status_path,
            PathBuf::from("/studio/tools/FakeTool/logs/fake_tool_status.json")
        );
        assert!(fake.enabled);
    }

    #[test]
    fn test_explicit_runtime_and_status_file() {
        let registry = ToolRegistry::parse(&sample_document(), Path::new("/studio")).unwrap();
        let vision = registry.lookup("vision_tester").unwrap();
        assert_eq!(vision.root_path, PathBuf::from("/opt/tools/Vision_Tester"));
        assert_eq!(vision.runtime_path, PathBuf::from("/usr/bin/python3"));
        assert_eq!(
            vision.status_path,
            PathBuf::from("/opt/tools/Vision_Tester/logs/vision_tester_status.json")
        );
    }

    #[test]
    fn test_list_enabled_skips_disabled() {
        let registry = ToolRegistry::parse(&sample_document(), Path::new("/studio")).unwrap();
        let enabled: Vec<&str> = registry
            .list_enabled()
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(enabled, vec!["fake_tool", "vision_tester"]);
    }

    #[test]
    fn test_lookup_never_matches_display_name() {
        let doc = serde_json::json!({
            "tools": [
                {"id": "a", "display_name": "Same", "path": "a", "entry_point": "main.py"},
                {"id": "b", "display_name": "Same", "path": "b", "entry_point": "main.py"}
            ]
        })
        .to_string();
        let registry = ToolRegistry::parse(&doc, Path::new("/")).unwrap();
        assert!(registry.lookup("Same").is_none());
        assert_eq!(registry.lookup("b").unwrap().root_path, PathBuf::from("/b"));
    }

    #[test]
    fn test_duplicate_id_is_malformed() {
        let doc = serde_json::json!({
            "tools": [
                {"id": "a", "display_name": "A", "path": "a", "entry_point": "main.py"},
                {"id": "a", "display_name": "A again", "path": "a2", "entry_point": "main.py"}
            ]
        })
        .to_string();
        let err = ToolRegistry::parse(&doc, Path::new("/")).unwrap_err();
        assert!(matches!(err, Error::ConfigMalformed(ref m) if m.contains("duplicate tool id 'a'")));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_missing_required_field_is_malformed() {
        let doc = serde_json::json!({
            "tools": [{"id": "a", "display_name": "A", "entry_point": "main.py"}]
        })
        .to_string();
        let err = ToolRegistry::parse(&doc, Path::new("/")).unwrap_err();
        assert!(matches!(err, Error::ConfigMalformed(ref m) if m.contains("path")));
    }

    #[test]
    fn test_blank_id_is_malformed() {
        let doc = serde_json::json!({
            "tools": [{"id": "", "display_name": "A", "path": "a", "entry_point": "main.py"}]
        })
        .to_string();
        let err = ToolRegistry::parse(&doc, Path::new("/")).unwrap_err();
        assert!(matches!(err, Error::ConfigMalformed(ref m) if m.contains("tools[0].id")));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = ToolRegistry::parse("{ not json", Path::new("/")).unwrap_err();
        assert!(matches!(err, Error::ConfigMalformed(_)));
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = ToolRegistry::load(dir.path().join("studio_config.json")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_load_resolves_relative_paths_against_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studio_config.json");
        std::fs::write(&path, sample_document()).unwrap();

        let registry = ToolRegistry::load(&path).unwrap();
        assert_eq!(
            registry.lookup("fake_tool").unwrap().root_path,
            dir.path().join("tools/FakeTool")
        );
        assert_eq!(registry.launcher_version(), "2.1.0");
        assert_eq!(registry.title(), "Studio Controller v2.1.0");
    }

    #[test]
    fn test_defaults_for_empty_document() {
        let registry = ToolRegistry::parse("{}", Path::new("/")).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.launcher_version(), DEFAULT_LAUNCHER_VERSION);
        assert_eq!(
            registry.config().controller.poll_interval,
            std::time::Duration::from_millis(500)
        );
    }

    #[test]
    fn test_controller_settings_from_document() {
        let doc = serde_json::json!({
            "controller": {"poll_interval": "1s", "logs_dir": "state"},
            "tools": [{"id": "a", "display_name": "A", "path": "a", "entry_point": "main.py"}]
        })
        .to_string();
        let registry = ToolRegistry::parse(&doc, Path::new("/")).unwrap();
        assert_eq!(
            registry.config().controller.poll_interval,
            std::time::Duration::from_secs(1)
        );
        assert_eq!(
            registry.lookup("a").unwrap().status_path,
            PathBuf::from("/a/state/a_status.json")
        );
    }

    #[test]
    fn test_summary_uses_defaults() {
        let doc = serde_json::json!({
            "tools": [{"id": "a", "display_name": "Alpha", "path": "/x/a", "entry_point": "main.py"}]
        })
        .to_string();
        let registry = ToolRegistry::parse(&doc, Path::new("/")).unwrap();
        let summary = registry.lookup("a").unwrap().summary();
        assert_eq!(
            summary,
            "Alpha\nNo description\nCategory: Uncategorized\nPath: /x/a"
        );
    }

    proptest! {
        #[test]
        fn prop_list_enabled_never_returns_disabled(flags in proptest::collection::vec(any::<bool>(), 0..12)) {
            let tools: Vec<serde_json::Value> = flags
                .iter()
                .enumerate()
                .map(|(i, enabled)| serde_json::json!({
                    "id": format!("tool_{}", i),
                    "display_name": "Tool",
                    "enabled": enabled,
                    "path": format!("t{}", i),
                    "entry_point": "main.py"
                }))
                .collect();
            let doc = serde_json::json!({ "tools": tools }).to_string();
            let registry = ToolRegistry::parse(&doc, Path::new("/")).unwrap();

            let listed = registry.list_enabled();
            prop_assert!(listed.iter().all(|t| t.enabled));
            prop_assert_eq!(listed.len(), flags.iter().filter(|f| **f).count());
            let mut previous = None;
            for t in listed {
                let idx: usize = t.id.as_str().trim_start_matches("tool_").parse().unwrap();
                prop_assert!(previous.map_or(true, |p| idx > p));
                previous = Some(idx);
            }
        }
    }
}
