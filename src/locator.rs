//! Template source back ends.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Supplies raw template text for an identifier.
///
/// Locators with a higher priority are queried first; the first
/// non-absent text wins. `all_identifiers` is used only for optional
/// eager precompilation and may legitimately return an empty listing.
pub trait TemplateLocator: Send + Sync {
    fn priority(&self) -> i32;

    fn locate(&self, name: &str) -> Result<Option<String>>;

    fn all_identifiers(&self) -> Vec<String> {
        Vec::new()
    }
}

/// In-memory locator backed by a map of named sources.
pub struct MapTemplateLocator {
    priority: i32,
    templates: HashMap<String, String>,
}

impl MapTemplateLocator {
    pub fn new(priority: i32) -> Self {
        Self {
            priority,
            templates: HashMap::new(),
        }
    }

    pub fn with_template(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.templates.insert(name.into(), source.into());
        self
    }
}

impl Default for MapTemplateLocator {
    fn default() -> Self {
        Self::new(0)
    }
}

impl TemplateLocator for MapTemplateLocator {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn locate(&self, name: &str) -> Result<Option<String>> {
        Ok(self.templates.get(name).cloned())
    }

    fn all_identifiers(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }
}

/// Filesystem locator rooted at a directory, with an optional file
/// suffix appended to identifiers (e.g. `html`). Sources are read as
/// UTF-8.
pub struct FileTemplateLocator {
    priority: i32,
    root: PathBuf,
    suffix: Option<String>,
}

impl FileTemplateLocator {
    pub fn new(priority: i32, root: impl Into<PathBuf>) -> Self {
        Self {
            priority,
            root: root.into(),
            suffix: None,
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    fn template_path(&self, name: &str) -> PathBuf {
        let mut path = self.root.clone();
        match &self.suffix {
            Some(suffix) => path.push(format!("{name}.{suffix}")),
            None => path.push(name),
        }
        path
    }

    fn collect_identifiers(&self, dir: &Path, prefix: &str, found: &mut Vec<String>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if path.is_dir() {
                let nested = if prefix.is_empty() {
                    file_name.to_string()
                } else {
                    format!("{prefix}/{file_name}")
                };
                self.collect_identifiers(&path, &nested, found);
                continue;
            }
            let id = match &self.suffix {
                Some(suffix) => match file_name.strip_suffix(&format!(".{suffix}")) {
                    Some(stem) => stem,
                    None => continue,
                },
                None => file_name,
            };
            let id = if prefix.is_empty() {
                id.to_string()
            } else {
                format!("{prefix}/{id}")
            };
            log::debug!("template available: {id}");
            found.push(id);
        }
    }
}

impl TemplateLocator for FileTemplateLocator {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn locate(&self, name: &str) -> Result<Option<String>> {
        let path = self.template_path(name);
        match std::fs::read_to_string(&path) {
            Ok(source) => {
                log::debug!("template located: {name} ({})", path.display());
                Ok(Some(source))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::loading(format!(
                "failed to read '{}': {err}",
                path.display()
            ))),
        }
    }

    fn all_identifiers(&self) -> Vec<String> {
        let mut found = Vec::new();
        self.collect_identifiers(&self.root, "", &mut found);
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_map_locator() {
        let locator = MapTemplateLocator::default().with_template("greet", "Hello {{name}}");
        assert_eq!(
            locator.locate("greet").unwrap(),
            Some("Hello {{name}}".to_string())
        );
        assert_eq!(locator.locate("other").unwrap(), None);
        assert_eq!(locator.all_identifiers(), vec!["greet".to_string()]);
    }

    #[test]
    fn test_file_locator_reads_with_suffix() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("page.html"), "<h1>{{title}}</h1>").unwrap();

        let locator = FileTemplateLocator::new(0, dir.path()).with_suffix("html");
        assert_eq!(
            locator.locate("page").unwrap(),
            Some("<h1>{{title}}</h1>".to_string())
        );
        assert_eq!(locator.locate("missing").unwrap(), None);
    }

    #[test]
    fn test_file_locator_lists_nested_identifiers() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("partials")).unwrap();
        fs::write(dir.path().join("index.html"), "a").unwrap();
        fs::write(dir.path().join("partials/header.html"), "b").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let locator = FileTemplateLocator::new(0, dir.path()).with_suffix("html");
        let mut ids = locator.all_identifiers();
        ids.sort();
        assert_eq!(ids, vec!["index".to_string(), "partials/header".to_string()]);
    }

    #[test]
    fn test_file_locator_empty_root_lists_nothing() {
        let dir = TempDir::new().unwrap();
        let locator = FileTemplateLocator::new(0, dir.path());
        assert!(locator.all_identifiers().is_empty());
    }
}
