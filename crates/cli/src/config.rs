// ==============================================================================
// fillstruct.toml Configuration
// ==============================================================================
//
// Discovers and loads `fillstruct.toml` project configuration files. Provides:
// - Extra source roots and explicit module mappings for package lookup
// - Output formatting (indentation, alignment, nested expansion)
// - The list of well-known types that always render as `T{}`
//
// Example fillstruct.toml:
//
// ```toml
// roots = ["./third_party/src"]
// indent = 4
// align = true
// recurse = false
// max_array_elems = 64
// well_known = ["time.Time", "example.com/lib/money.Amount"]
//
// [modules]
// "example.com/shared" = "../shared"
// ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use go_fill::{FillOptions, IndentStyle, PackageDb, WellKnown};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "fillstruct.toml";

/// Top-level `fillstruct.toml` configuration.
#[derive(Debug, Deserialize)]
pub struct FillConfig {
    /// Extra directories laid out like `$GOPATH/src` (relative to the config).
    #[serde(default)]
    pub roots: Vec<String>,

    pub goroot: Option<PathBuf>,
    pub gopath: Option<PathBuf>,

    /// Replaces the built-in well-known list when present.
    pub well_known: Option<Vec<String>>,

    #[serde(default)]
    pub indent: Indent,

    #[serde(default = "default_align")]
    pub align: bool,

    #[serde(default)]
    pub recurse: bool,

    /// Arrays longer than this render as `[N]T{}`; unbounded when unset.
    pub max_array_elems: Option<u64>,

    /// Module path -> directory (relative to the config).
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
}

fn default_align() -> bool {
    true
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            goroot: None,
            gopath: None,
            well_known: None,
            indent: Indent::default(),
            align: default_align(),
            recurse: false,
            max_array_elems: None,
            modules: BTreeMap::new(),
        }
    }
}

/// `indent = "tab"` or `indent = <number of spaces>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Indent {
    Spaces(usize),
    Keyword(IndentKeyword),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndentKeyword {
    Tab,
}

impl Default for Indent {
    fn default() -> Self {
        Indent::Keyword(IndentKeyword::Tab)
    }
}

impl Indent {
    pub fn style(&self) -> IndentStyle {
        match self {
            Indent::Spaces(n) => IndentStyle::Spaces(*n),
            Indent::Keyword(IndentKeyword::Tab) => IndentStyle::Tab,
        }
    }
}

impl FillConfig {
    /// `recurse` on the command line wins over a `false` in the file.
    pub fn fill_options(&self, recurse: bool) -> FillOptions {
        FillOptions {
            indent: self.indent.style(),
            align: self.align,
            recurse: recurse || self.recurse,
            well_known: match &self.well_known {
                Some(names) => WellKnown::new(names.iter().cloned()),
                None => WellKnown::default(),
            },
            max_array_elems: self.max_array_elems,
        }
    }

    /// A package database over the Go environment plus the configured roots
    /// and modules. Relative entries resolve against `config_dir`.
    pub fn package_db(&self, config_dir: Option<&Path>) -> PackageDb {
        let relative = |entry: &str| match config_dir {
            Some(dir) => dir.join(entry),
            None => PathBuf::from(entry),
        };
        let mut db = PackageDb::with_go_env(self.goroot.clone(), self.gopath.clone());
        for root in &self.roots {
            db.add_root(relative(root));
        }
        for (module, dir) in &self.modules {
            db.add_module(module.as_str(), relative(dir));
        }
        db
    }
}

/// Walk up from `start_dir` looking for `fillstruct.toml`. Returns the first match.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir;
    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}

/// Read and parse a `fillstruct.toml` file.
pub fn load_config(path: &Path) -> Result<FillConfig, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let config: FillConfig = toml::from_str(&contents)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let config: FillConfig = toml::from_str("").expect("parse error");
        assert!(config.roots.is_empty());
        assert!(config.modules.is_empty());
        assert_eq!(config.indent, Indent::default());
        assert!(config.align);
        assert!(!config.recurse);
        assert_eq!(config.fill_options(false), FillOptions::default());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
            roots = ["./vendor/src"]
            gopath = "/home/gopher/go"
            indent = 2
            align = false
            recurse = true
            max_array_elems = 16
            well_known = ["example.com/money.Amount"]

            [modules]
            "example.com/shared" = "../shared"
        "#;
        let config: FillConfig = toml::from_str(toml_str).expect("parse error");
        assert_eq!(config.roots, vec!["./vendor/src"]);
        assert_eq!(config.gopath, Some(PathBuf::from("/home/gopher/go")));
        assert_eq!(config.modules["example.com/shared"], "../shared");

        let options = config.fill_options(false);
        assert_eq!(options.indent, IndentStyle::Spaces(2));
        assert!(!options.align);
        assert!(options.recurse);
        assert_eq!(options.max_array_elems, Some(16));
        assert_eq!(options.well_known, WellKnown::new(["example.com/money.Amount"]));
    }

    #[test]
    fn parse_tab_indent() {
        let config: FillConfig = toml::from_str(r#"indent = "tab""#).expect("parse error");
        assert_eq!(config.indent.style(), IndentStyle::Tab);
        assert!(toml::from_str::<FillConfig>(r#"indent = "spaces""#).is_err());
    }

    #[test]
    fn command_line_recurse_wins() {
        let config = FillConfig::default();
        assert!(config.fill_options(true).recurse);
        assert!(!config.fill_options(false).recurse);
    }

    #[test]
    fn finds_config_in_parent_dir() {
        let tmp = tempfile::tempdir().expect("failed to create temp dir");
        let nested = tmp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), "recurse = true\n").unwrap();

        let found = find_config(&nested).expect("config not found");
        assert_eq!(found, tmp.path().join(CONFIG_FILE));
        assert!(load_config(&found).unwrap().recurse);
    }

    #[test]
    fn relative_roots_resolve_against_config_dir() {
        let tmp = tempfile::tempdir().expect("failed to create temp dir");
        std::fs::create_dir_all(tmp.path().join("mod/sub")).unwrap();
        let config: FillConfig = toml::from_str(
            r#"
                roots = ["src"]
                [modules]
                "example.com/m" = "mod"
            "#,
        )
        .expect("parse error");
        let db = config.package_db(Some(tmp.path()));
        assert!(db.roots().contains(&tmp.path().join("src")));
        assert_eq!(db.dir_for("example.com/m/sub"), Some(tmp.path().join("mod/sub")));
    }
}
