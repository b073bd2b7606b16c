//! Comparison of the set of libraries two builds provide.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

use crate::abi::DumpLayout;
use crate::changes::Change;
use crate::error::{Error, Result};
use crate::ports::{FileHandling, PackageDescribing};

const PACKAGE_MANIFEST: &str = "Package.swift";
const FRAMEWORK_EXTENSIONS: &[&str] = &[".xcframework", ".framework"];

/// Compares library names between two built projects.
pub trait LibraryAnalyzing: Send + Sync {
    fn analyze(&self, old_project_dir: &Path, new_project_dir: &Path) -> Result<Vec<Change>>;
}

#[derive(Debug, Deserialize)]
struct PackageDescription {
    #[serde(default)]
    products: Vec<PackageProduct>,
}

#[derive(Debug, Deserialize)]
struct PackageProduct {
    name: String,
    #[serde(rename = "type", default)]
    product_type: serde_json::Value,
}

impl PackageProduct {
    fn is_library(&self) -> bool {
        self.product_type.get("library").is_some()
    }
}

/// Library names declared by a package description document.
///
/// Tool output may be preceded by log lines, so parsing starts at the
/// first `{`.
pub fn library_names_from_description(description: &str) -> Result<BTreeSet<String>> {
    let json = description
        .find('{')
        .map(|start| &description[start..])
        .ok_or_else(|| Error::LibraryAnalysis {
            message: "package description contains no JSON object".to_string(),
        })?;

    let package: PackageDescription =
        serde_json::from_str(json).map_err(|e| Error::LibraryAnalysis {
            message: format!("invalid package description: {}", e),
        })?;

    Ok(package
        .products
        .into_iter()
        .filter(PackageProduct::is_library)
        .map(|p| p.name)
        .collect())
}

/// [`LibraryAnalyzing`] for package and framework builds.
#[derive(Debug, Clone)]
pub struct LibraryAnalyzer<F, D> {
    files: F,
    describer: D,
    layout: DumpLayout,
}

impl<F: FileHandling, D: PackageDescribing> LibraryAnalyzer<F, D> {
    pub fn new(files: F, describer: D) -> Self {
        Self::with_layout(files, describer, DumpLayout::default())
    }

    pub fn with_layout(files: F, describer: D, layout: DumpLayout) -> Self {
        Self {
            files,
            describer,
            layout,
        }
    }

    fn libraries(&self, project_dir: &Path) -> Result<BTreeSet<String>> {
        if self.files.exists(&project_dir.join(PACKAGE_MANIFEST)) {
            let description =
                self.describer
                    .describe(project_dir)
                    .map_err(|e| Error::LibraryAnalysis {
                        message: format!(
                            "could not describe package at {}: {}",
                            project_dir.display(),
                            e
                        ),
                    })?;
            return library_names_from_description(&description);
        }

        let products_dir = project_dir.join(&self.layout.products_dir);
        let entries = self
            .files
            .list_dir(&products_dir)
            .map_err(|e| Error::LibraryAnalysis {
                message: format!("could not list {}: {}", products_dir.display(), e),
            })?;

        Ok(entries
            .iter()
            .filter_map(|entry| {
                FRAMEWORK_EXTENSIONS
                    .iter()
                    .find_map(|ext| entry.strip_suffix(ext))
            })
            .map(str::to_string)
            .collect())
    }
}

impl<F: FileHandling, D: PackageDescribing> LibraryAnalyzing for LibraryAnalyzer<F, D> {
    fn analyze(&self, old_project_dir: &Path, new_project_dir: &Path) -> Result<Vec<Change>> {
        info!("📚 Analyzing libraries");

        let old = self.libraries(old_project_dir)?;
        let new = self.libraries(new_project_dir)?;
        debug!("Libraries: {} old, {} new", old.len(), new.len());

        let removed = old
            .difference(&new)
            .map(|name| Change::removal("", format!("Library `{}` was removed", name)));
        let added = new
            .difference(&old)
            .map(|name| Change::addition("", format!("Library `{}` was added", name)));

        let mut changes: Vec<Change> = removed.chain(added).collect();
        crate::changes::sort_changes(&mut changes);
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::ChangeType;
    use crate::ports::LocalFileHandler;
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct FakeDescriber {
        descriptions: HashMap<PathBuf, String>,
    }

    impl PackageDescribing for FakeDescriber {
        fn describe(&self, project_dir: &Path) -> Result<String> {
            self.descriptions
                .get(project_dir)
                .cloned()
                .ok_or_else(|| Error::Build {
                    source_description: project_dir.display().to_string(),
                    message: "describe failed".to_string(),
                })
        }
    }

    fn package(dir: &Path, products: &[(&str, &str)]) -> String {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(PACKAGE_MANIFEST), "// swift-tools-version:5.9").unwrap();
        let products: Vec<_> = products
            .iter()
            .map(|(name, ty)| {
                let mut product_type = serde_json::Map::new();
                product_type.insert(ty.to_string(), serde_json::json!(["automatic"]));
                serde_json::json!({"name": name, "type": product_type})
            })
            .collect();
        serde_json::json!({"name": "Pkg", "products": products}).to_string()
    }

    #[test]
    fn test_package_library_changes() {
        let root = TempDir::new().unwrap();
        let old_dir = root.path().join("old");
        let new_dir = root.path().join("new");

        let mut descriptions = HashMap::new();
        descriptions.insert(
            old_dir.clone(),
            package(&old_dir, &[("Kept", "library"), ("Gone", "library"), ("tool", "executable")]),
        );
        descriptions.insert(
            new_dir.clone(),
            package(&new_dir, &[("Kept", "library"), ("Fresh", "library")]),
        );

        let analyzer = LibraryAnalyzer::new(LocalFileHandler::new(), FakeDescriber { descriptions });
        let changes = analyzer.analyze(&old_dir, &new_dir).unwrap();

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].change_type, ChangeType::Addition);
        assert_eq!(changes[0].change_description, "Library `Fresh` was added");
        assert_eq!(changes[1].change_type, ChangeType::Removal);
        assert_eq!(changes[1].change_description, "Library `Gone` was removed");
        assert!(changes.iter().all(|c| c.parent_name.is_empty()));
    }

    #[test]
    fn test_project_framework_changes() {
        let root = TempDir::new().unwrap();
        let layout = DumpLayout::default();
        let sides = [
            ("old", vec!["A.framework", "B.xcframework"]),
            ("new", vec!["A.framework", "notes.txt"]),
        ];
        for (side, frameworks) in sides {
            let products = root.path().join(side).join(&layout.products_dir);
            fs::create_dir_all(&products).unwrap();
            for name in frameworks {
                fs::create_dir_all(products.join(name)).unwrap();
            }
        }

        let analyzer = LibraryAnalyzer::new(
            LocalFileHandler::new(),
            FakeDescriber {
                descriptions: HashMap::new(),
            },
        );
        let changes = analyzer
            .analyze(&root.path().join("old"), &root.path().join("new"))
            .unwrap();

        assert_eq!(changes, vec![Change::removal("", "Library `B` was removed")]);
    }

    #[test]
    fn test_describer_failure_is_fatal() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("pkg");
        package(&dir, &[]);

        let analyzer = LibraryAnalyzer::new(
            LocalFileHandler::new(),
            FakeDescriber {
                descriptions: HashMap::new(),
            },
        );
        let err = analyzer.analyze(&dir, &dir).unwrap_err();
        assert!(matches!(err, Error::LibraryAnalysis { .. }));
    }

    #[test]
    fn test_description_with_leading_noise() {
        let names = library_names_from_description(
            "warning: something\n{\"products\": [{\"name\": \"Lib\", \"type\": {\"library\": [\"automatic\"]}}]}",
        )
        .unwrap();
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["Lib"]);

        assert!(library_names_from_description("no json here").is_err());
    }
}
