mod archive;
mod config;

use std::error::Error;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Parser;
use go_ast::SourceFile;
use go_fill::{apply_edits, fill_struct, FillOutput, FillRequest, SourceResolver, Target};
use miette::{NamedSource, Report};
use serde::Serialize;
use smol_str::SmolStr;

use crate::config::{find_config, load_config, FillConfig};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Fill a Go composite literal with the zero values of its missing fields"
)]
struct Cli {
    /// Go source file containing the literal
    #[arg(long)]
    file: PathBuf,

    /// Byte offset inside the literal to fill
    #[arg(long, conflicts_with = "line", required_unless_present = "line")]
    offset: Option<usize>,

    /// Fill every struct literal starting on this 1-based line
    #[arg(long)]
    line: Option<usize>,

    /// Read unsaved buffers from stdin (name, size, contents per entry)
    #[arg(long)]
    modified: bool,

    /// Path to fillstruct.toml (default: searched upward from the file)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Expand nested struct values field by field
    #[arg(long)]
    recurse: bool,

    /// Rewrite the file in place instead of only printing the edits
    #[arg(long)]
    write: bool,
}

/// One replaced `{...}` range, in the shape editor integrations consume.
#[derive(Debug, Serialize)]
struct JsonEdit<'a> {
    start: usize,
    end: usize,
    code: &'a str,
    imports: Vec<&'a str>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Cli::parse();

    let path = absolute(&args.file)?;
    let dir = path.parent().unwrap_or(Path::new("/")).to_path_buf();
    let text = read_source(&path, args.modified)?;

    let (config, config_dir) = find_and_load_config(args.config.clone(), &dir)?;
    let mut db = config.package_db(config_dir.as_deref());
    db.discover_module(&dir);

    let file = SourceFile::parse(text);
    for diag in &file.diags {
        log::debug!("{}: {:?} {}", path.display(), diag.span, diag.message);
    }
    let package_path = package_path_for(db.import_path_for_dir(&dir), &file);

    let target = match (args.offset, args.line) {
        (Some(offset), _) => Target::Offset(offset),
        (None, Some(line)) => Target::Line(line),
        (None, None) => return Err("either --offset or --line is required".into()),
    };
    let request = FillRequest {
        file: &file,
        path: Some(&path),
        package_path: &package_path,
        target: &target,
    };
    let options = config.fill_options(args.recurse);
    let resolver = SourceResolver::new(&db);

    let mut imports = Vec::new();
    let output = match fill_struct(&request, &resolver, &options, &mut imports, None) {
        Ok(Some(output)) => output,
        Ok(None) => FillOutput::default(),
        Err(err) => {
            let source = NamedSource::new(path.display().to_string(), file.text.clone());
            eprintln!("{:?}", Report::new(err).with_source_code(source));
            std::process::exit(1);
        }
    };

    if args.write && !output.edits.is_empty() {
        std::fs::write(&path, apply_edits(&file.text, &output.edits))?;
    }
    println!("{}", serde_json::to_string(&json_edits(&output))?);
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf, Box<dyn Error>> {
    if let Ok(path) = path.canonicalize() {
        return Ok(path);
    }
    Ok(std::env::current_dir()?.join(path))
}

/// The unsaved buffer for `path` when `--modified` supplies one, else the
/// file on disk.
fn read_source(path: &Path, modified: bool) -> Result<String, Box<dyn Error>> {
    if modified {
        let mut data = Vec::new();
        std::io::stdin().read_to_end(&mut data)?;
        let entries = archive::parse_archive(&data)?;
        if let Some(contents) = archive::find_entry(&entries, path) {
            return Ok(contents.to_string());
        }
        log::debug!("{} not in the modified archive, reading from disk", path.display());
    }
    std::fs::read_to_string(path)
        .map_err(|e| format!("could not read {}: {e}", path.display()).into())
}

fn find_and_load_config(
    explicit: Option<PathBuf>,
    dir: &Path,
) -> Result<(FillConfig, Option<PathBuf>), Box<dyn Error>> {
    let Some(config_path) = explicit.or_else(|| find_config(dir)) else {
        return Ok((FillConfig::default(), None));
    };
    let config = load_config(&config_path)
        .map_err(|e| format!("failed to load {}: {e}", config_path.display()))?;
    log::info!("using config {}", config_path.display());
    Ok((config, config_path.parent().map(Path::to_path_buf)))
}

/// Outside any module or search root the package clause is all there is to
/// go on.
fn package_path_for(from_dir: Option<SmolStr>, file: &SourceFile) -> SmolStr {
    match (from_dir, &file.package) {
        (Some(path), _) => path,
        (None, Some(name)) => {
            log::warn!("package directory is outside every module and root, using `{name}`");
            name.clone()
        }
        (None, None) => SmolStr::default(),
    }
}

/// Missing imports are per file; every edit carries the full list.
fn json_edits(output: &FillOutput) -> Vec<JsonEdit<'_>> {
    let imports: Vec<&str> = output.imports.iter().map(|i| i.path.as_str()).collect();
    output
        .edits
        .iter()
        .map(|edit| JsonEdit {
            start: edit.span.start,
            end: edit.span.end,
            code: &edit.text,
            imports: imports.clone(),
        })
        .collect()
}
