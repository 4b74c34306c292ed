use std::collections::BTreeSet;

use go_ast::SourceFile;
use go_ty::{Qualifier, TypeName};
use smol_str::SmolStr;

/// A package the generated code refers to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImportRequest {
    pub path: SmolStr,
}

impl ImportRequest {
    pub fn new(path: impl Into<SmolStr>) -> Self {
        Self { path: path.into() }
    }
}

/// Receives imports that have to be added to the file for the edits to
/// compile. Only called after a fill succeeded.
pub trait ImportAugmenter {
    fn add_import(&mut self, request: ImportRequest);
}

impl ImportAugmenter for Vec<ImportRequest> {
    fn add_import(&mut self, request: ImportRequest) {
        self.push(request);
    }
}

/// Spells type names the way the edited file can refer to them: through the
/// file's own import alias when it has one, bare for the current package and
/// dot imports, and by package name otherwise.
pub struct FileQualifier<'a> {
    file: &'a SourceFile,
    package_path: &'a str,
}

impl<'a> FileQualifier<'a> {
    pub fn new(file: &'a SourceFile, package_path: &'a str) -> Self {
        Self { file, package_path }
    }
}

impl Qualifier for FileQualifier<'_> {
    fn qualify(&self, name: &TypeName) -> Option<SmolStr> {
        if name.is_universe() || name.path == self.package_path {
            return None;
        }
        let imports = self.file.imports.iter().filter(|spec| spec.path == name.path);
        let mut fallback = None;
        for spec in imports {
            if spec.is_dot() {
                return None;
            }
            // Without an alias the file uses the name from the package
            // clause, whatever the path says.
            let local = match spec.name {
                Some(_) => spec.local_name(),
                None => Some(name.package.clone()),
            };
            if let Some(local) = local {
                fallback.get_or_insert(local);
            }
        }
        Some(fallback.unwrap_or_else(|| name.package.clone()))
    }
}

/// The subset of `paths` the file cannot name yet.
pub fn missing_imports<'p>(
    file: &SourceFile,
    package_path: &str,
    paths: impl IntoIterator<Item = &'p SmolStr>,
) -> Vec<ImportRequest> {
    let usable = |path: &str| {
        file.imports
            .iter()
            .any(|spec| spec.path == path && (spec.is_dot() || spec.local_name().is_some()))
    };
    paths
        .into_iter()
        .filter(|path| path.as_str() != package_path && !usable(path))
        .map(|path| ImportRequest::new(path.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    fn file() -> SourceFile {
        SourceFile::parse(indoc! {r#"
            package app

            import (
                t "time"
                . "strings"
                _ "embed"
                "example.com/app/models"
            )
        "#})
    }

    #[test]
    fn qualifies_through_aliases_and_dot_imports() {
        let file = file();
        let q = FileQualifier::new(&file, "example.com/app");
        let spell = |path: &str, package: &str| q.qualify(&TypeName::new(path, package, "X"));

        assert_eq!(spell("time", "time").as_deref(), Some("t"));
        assert_eq!(spell("strings", "strings"), None);
        assert_eq!(spell("example.com/app", "app"), None);
        assert_eq!(spell("example.com/app/models", "models").as_deref(), Some("models"));
        assert_eq!(spell("example.com/app/models", "model").as_deref(), Some("model"));
        assert_eq!(spell("embed", "embed").as_deref(), Some("embed"));
        assert_eq!(spell("sync", "sync").as_deref(), Some("sync"));
        assert_eq!(q.qualify(&TypeName::universe("error")), None);
    }

    #[test]
    fn blank_imports_still_need_a_real_import() {
        let file = file();
        let paths: Vec<SmolStr> = ["time", "embed", "sync", "sync", "example.com/app"]
            .map(SmolStr::from)
            .to_vec();
        let missing = missing_imports(&file, "example.com/app", &paths);
        assert_eq!(
            missing,
            vec![ImportRequest::new("embed"), ImportRequest::new("sync")]
        );
    }
}
