// ==============================================================================
// Package Database
// ==============================================================================
//
// Maps import paths to parsed packages. Directories are found through module
// mappings first (longest module prefix wins), then the GOPATH-style search
// roots; a handful of standard packages fall back to compiled-in stubs when
// no GOROOT is available. Every lookup, hits and misses alike, is cached, so
// a db can be shared by concurrent requests.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use go_ast::{default_package_name, SourceFile, TypeDeclId};
use smol_str::SmolStr;

const TIME_STUBS: &str = include_str!("../stubs/time.go");
const SYNC_STUBS: &str = include_str!("../stubs/sync.go");
const STRINGS_STUBS: &str = include_str!("../stubs/strings.go");
const BYTES_STUBS: &str = include_str!("../stubs/bytes.go");
const BIG_STUBS: &str = include_str!("../stubs/big.go");

#[derive(Debug)]
pub struct PackageFile {
    /// `None` for compiled-in stubs.
    pub path: Option<PathBuf>,
    pub source: SourceFile,
}

#[derive(Debug)]
pub struct Package {
    pub path: SmolStr,
    pub name: SmolStr,
    pub dir: Option<PathBuf>,
    pub files: Vec<PackageFile>,
}

impl Package {
    /// Package-level declaration of `name`, as (file index, decl). Files
    /// whose path equals `skip` are ignored.
    pub fn find_type(&self, name: &str, skip: Option<&Path>) -> Option<(usize, TypeDeclId)> {
        self.files
            .iter()
            .enumerate()
            .filter(|(_, file)| skip.is_none() || file.path.as_deref() != skip)
            .find_map(|(i, file)| file.source.package_type(name).map(|decl| (i, decl)))
    }

    pub fn find_const(&self, name: &str) -> Option<u64> {
        self.files
            .iter()
            .find_map(|file| file.source.package_const(name))
    }

    fn new(path: SmolStr, dir: Option<PathBuf>, files: Vec<PackageFile>) -> Self {
        let name = files
            .iter()
            .find_map(|file| file.source.package.clone())
            .unwrap_or_else(|| default_package_name(&path));
        Self {
            path,
            name,
            dir,
            files,
        }
    }
}

#[derive(Debug, Default)]
pub struct PackageDb {
    roots: Vec<PathBuf>,
    modules: Vec<(SmolStr, PathBuf)>,
    by_path: DashMap<SmolStr, Option<Arc<Package>>>,
    by_dir: DashMap<PathBuf, Option<Arc<Package>>>,
}

impl PackageDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// A db searching `$GOROOT/src` and every `$GOPATH` entry's `src`.
    /// Explicit arguments take precedence over the environment; GOPATH
    /// defaults to `$HOME/go` like the go tool does.
    pub fn with_go_env(goroot: Option<PathBuf>, gopath: Option<PathBuf>) -> Self {
        let mut db = Self::new();
        if let Some(goroot) = goroot.or_else(|| env::var_os("GOROOT").map(PathBuf::from)) {
            db.add_root(goroot.join("src"));
        }
        let gopaths: Vec<PathBuf> = match gopath {
            Some(gopath) => vec![gopath],
            None => match env::var_os("GOPATH") {
                Some(var) => env::split_paths(&var).collect(),
                None => env::var_os("HOME")
                    .map(|home| PathBuf::from(home).join("go"))
                    .into_iter()
                    .collect(),
            },
        };
        for gopath in gopaths {
            db.add_root(gopath.join("src"));
        }
        db
    }

    pub fn add_root(&mut self, root: impl Into<PathBuf>) {
        let root = root.into();
        if !self.roots.contains(&root) {
            self.roots.push(root);
        }
    }

    pub fn add_module(&mut self, path: impl Into<SmolStr>, dir: impl Into<PathBuf>) {
        let path = path.into();
        self.modules.retain(|(existing, _)| *existing != path);
        self.modules.push((path, dir.into()));
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Walks up from `start` to the nearest `go.mod` and registers its
    /// module. Returns the module path.
    pub fn discover_module(&mut self, start: &Path) -> Option<SmolStr> {
        for dir in start.ancestors() {
            let go_mod = dir.join("go.mod");
            if !go_mod.is_file() {
                continue;
            }
            let text = match fs::read_to_string(&go_mod) {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("Failed to read {}: {e}", go_mod.display());
                    return None;
                }
            };
            let module = parse_module_line(&text)?;
            log::debug!("module {module} at {}", dir.display());
            self.add_module(module.clone(), dir);
            return Some(module);
        }
        None
    }

    /// Directory holding the package `path`, if any search location has it.
    pub fn dir_for(&self, path: &str) -> Option<PathBuf> {
        let module = self
            .modules
            .iter()
            .filter_map(|(module, dir)| {
                let rest = path.strip_prefix(module.as_str())?;
                match rest.strip_prefix('/') {
                    Some(rest) => Some((module.len(), dir.join(rest))),
                    None if rest.is_empty() => Some((module.len(), dir.clone())),
                    None => None,
                }
            })
            .max_by_key(|(len, _)| *len)
            .map(|(_, dir)| dir)
            .filter(|dir| dir.is_dir());
        module.or_else(|| {
            self.roots
                .iter()
                .map(|root| root.join(path))
                .find(|dir| dir.is_dir())
        })
    }

    /// Inverse of `dir_for`.
    pub fn import_path_for_dir(&self, dir: &Path) -> Option<SmolStr> {
        let from_module = self
            .modules
            .iter()
            .filter_map(|(module, mod_dir)| {
                let rel = dir.strip_prefix(mod_dir).ok()?;
                Some((mod_dir.as_os_str().len(), join_import_path(module, rel)))
            })
            .max_by_key(|(len, _)| *len)
            .map(|(_, path)| path);
        from_module.or_else(|| {
            self.roots.iter().find_map(|root| {
                let rel = dir.strip_prefix(root).ok()?;
                let path = join_import_path("", rel);
                (!path.is_empty()).then_some(path)
            })
        })
    }

    pub fn load(&self, path: &str) -> Option<Arc<Package>> {
        if let Some(hit) = self.by_path.get(path) {
            return hit.clone();
        }
        let package = match self.dir_for(path) {
            Some(dir) => self
                .by_dir
                .entry(dir.clone())
                .or_insert_with(|| read_package(path.into(), &dir).map(Arc::new))
                .value()
                .clone(),
            None => None,
        };
        let package = package.or_else(|| stub_package(path));
        self.by_path.insert(path.into(), package.clone());
        package
    }

    /// The package in `dir`, named by whatever import path maps there.
    pub fn load_dir(&self, dir: &Path) -> Option<Arc<Package>> {
        if let Some(hit) = self.by_dir.get(dir) {
            return hit.clone();
        }
        let path = self.import_path_for_dir(dir).unwrap_or_default();
        let package = read_package(path, dir).map(Arc::new);
        self.by_dir.insert(dir.to_path_buf(), package.clone());
        package
    }
}

fn parse_module_line(go_mod: &str) -> Option<SmolStr> {
    go_mod.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let name = rest.trim().trim_matches(|c| c == '"' || c == '`');
        (!name.is_empty()).then(|| SmolStr::from(name))
    })
}

fn join_import_path(prefix: &str, rel: &Path) -> SmolStr {
    let mut path = prefix.to_string();
    for component in rel.components() {
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(&component.as_os_str().to_string_lossy());
    }
    path.into()
}

fn read_package(path: SmolStr, dir: &Path) -> Option<Package> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Failed to read {}: {e}", dir.display());
            return None;
        }
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| is_package_source(p))
        .collect();
    paths.sort();

    let files: Vec<PackageFile> = paths
        .into_iter()
        .filter_map(|file_path| match fs::read_to_string(&file_path) {
            Ok(text) => {
                let source = SourceFile::parse(text);
                for diag in &source.diags {
                    log::debug!("{}: {:?}: {}", file_path.display(), diag.span, diag.message);
                }
                Some(PackageFile {
                    path: Some(file_path),
                    source,
                })
            }
            Err(e) => {
                log::warn!("Failed to read {}: {e}", file_path.display());
                None
            }
        })
        .collect();

    if files.is_empty() {
        return None;
    }
    log::info!("Loaded package {path:?} from {} ({} files)", dir.display(), files.len());
    Some(Package::new(path, Some(dir.to_path_buf()), files))
}

fn is_package_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".go") && !name.ends_with("_test.go") && path.is_file()
}

fn stub_package(path: &str) -> Option<Arc<Package>> {
    let text = match path {
        "time" => TIME_STUBS,
        "sync" => SYNC_STUBS,
        "strings" => STRINGS_STUBS,
        "bytes" => BYTES_STUBS,
        "math/big" => BIG_STUBS,
        _ => return None,
    };
    let source = SourceFile::parse(text);
    if let Some(diag) = source.diags.first() {
        log::warn!("Failed to parse builtin stubs for {path}: {}", diag.message);
    }
    log::info!("Using builtin stubs for {path:?}");
    Some(Arc::new(Package::new(
        path.into(),
        None,
        vec![PackageFile { path: None, source }],
    )))
}
