//! Command-line interface for stubtree.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::config::Config;
use crate::loader::StubTreeLoader;
use crate::parser;
use crate::report::{self, IndexSummary};
use crate::search::{SearchPlan, SearchRequest, SearchStrategy, StubSearch};
use crate::stub::{StubKind, StubTree};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Persistable declaration stub trees for source files.
///
/// Builds a compact tree of the declarations in each file, caches it on
/// disk keyed by content, and answers structural queries from the cached
/// trees without re-parsing unchanged files.
#[derive(Parser)]
#[command(name = "stubtree")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config YAML file (default: auto-discover in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build or refresh stub trees for every supported file under a path
    Index(IndexArgs),
    /// Print the stub tree of one file
    Show(ShowArgs),
    /// Find declarations by name
    Find(FindArgs),
    /// Drop cached state for a file
    Invalidate(InvalidateArgs),
}

/// Arguments for the index command.
#[derive(Parser)]
pub struct IndexArgs {
    /// Path to index (file or directory)
    pub path: PathBuf,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

/// Arguments for the show command.
#[derive(Parser)]
pub struct ShowArgs {
    pub file: PathBuf,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

/// Arguments for the find command.
#[derive(Parser)]
pub struct FindArgs {
    /// Path to search (file or directory)
    pub path: PathBuf,

    /// Names to look for; repeated identical queries run once
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Only match stubs of this kind (e.g., class, method, type_alias)
    #[arg(short, long)]
    pub kind: Option<String>,

    /// Match strategy: exact, prefix, or text
    #[arg(short, long, default_value = "exact")]
    pub strategy: String,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

/// Arguments for the invalidate command.
#[derive(Parser)]
pub struct InvalidateArgs {
    pub file: PathBuf,
}

fn validate_format(format: &str) -> bool {
    if format != "pretty" && format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            format
        );
        return false;
    }
    true
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let cwd = std::env::current_dir()?;
    Config::load(explicit, &cwd)
}

/// Collect stub-capable files under `root`.
fn collect_files(root: &Path, loader: &StubTreeLoader) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            // Skip hidden, vendored and build directories
            !(e.depth() > 0
                && e.file_type().is_dir()
                && (name.starts_with('.')
                    || name == "vendor"
                    || name == "node_modules"
                    || name == "target"))
        })
    {
        let entry = entry?;
        if entry.file_type().is_file() && loader.can_have_stub(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Resolve `path` to the files it names.
fn resolve_files(path: &Path, loader: &StubTreeLoader) -> anyhow::Result<(PathBuf, Vec<PathBuf>)> {
    let abs_path = path
        .canonicalize()
        .map_err(|e| anyhow::anyhow!("cannot access path {:?}: {}", path, e))?;
    let files = if abs_path.is_dir() {
        collect_files(&abs_path, loader)?
    } else {
        vec![abs_path.clone()]
    };
    Ok((abs_path, files))
}

type Loaded = Vec<(PathBuf, crate::error::Result<Arc<StubTree>>)>;

/// Load every file, in parallel when configured, ticking `progress`.
fn load_files(
    loader: &StubTreeLoader,
    files: &[PathBuf],
    parallel: bool,
    progress: &ProgressBar,
) -> Loaded {
    let load = |file: &PathBuf| {
        let result = loader.load(file);
        progress.inc(1);
        (file.clone(), result)
    };
    let loaded = if parallel {
        files.par_iter().map(load).collect()
    } else {
        files.iter().map(load).collect()
    };
    progress.finish_and_clear();
    loaded
}

fn progress_bar(len: usize, visible: bool) -> anyhow::Result<ProgressBar> {
    if !visible {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new(len as u64);
    bar.set_style(ProgressStyle::with_template(
        "  {spinner} indexing [{bar:30}] {pos}/{len} {wide_msg}",
    )?);
    Ok(bar)
}

/// Run the index command.
pub fn run_index(args: &IndexArgs, config_path: Option<&Path>) -> anyhow::Result<i32> {
    parser::init();

    if !validate_format(&args.format) {
        return Ok(EXIT_ERROR);
    }

    let config = load_config(config_path)?;
    let loader = StubTreeLoader::from_config(&config)?;
    let (abs_path, files) = resolve_files(&args.path, &loader)?;

    if files.is_empty() {
        eprintln!("Warning: no files to index");
        return Ok(EXIT_SUCCESS);
    }

    let progress = progress_bar(files.len(), args.format == "pretty")?;
    let loaded = load_files(&loader, &files, config.run_parallel(), &progress);

    let mut summary = IndexSummary::new(&abs_path);
    for (file, result) in &loaded {
        match result {
            Ok(tree) => summary.add_tree(tree),
            Err(e) => summary.add_failure(file, e),
        }
    }

    match args.format.as_str() {
        "json" => report::write_index_json(&summary)?,
        _ => report::write_index_pretty(&summary),
    }

    if summary.failures.is_empty() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Run the show command.
pub fn run_show(args: &ShowArgs, config_path: Option<&Path>) -> anyhow::Result<i32> {
    parser::init();

    if !validate_format(&args.format) {
        return Ok(EXIT_ERROR);
    }

    let config = load_config(config_path)?;
    let loader = StubTreeLoader::from_config(&config)?;
    let tree = match loader.load(&args.file) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    match args.format.as_str() {
        "json" => report::write_tree_json(&args.file, &tree)?,
        _ => report::write_tree_pretty(&tree),
    }
    Ok(EXIT_SUCCESS)
}

/// Run the find command.
pub fn run_find(args: &FindArgs, config_path: Option<&Path>) -> anyhow::Result<i32> {
    parser::init();

    if !validate_format(&args.format) {
        return Ok(EXIT_ERROR);
    }

    let strategy: SearchStrategy = match args.strategy.parse() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    let kind = match args.kind.as_deref().map(str::parse::<StubKind>).transpose() {
        Ok(k) => k,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let config = load_config(config_path)?;
    let loader = StubTreeLoader::from_config(&config)?;
    let (abs_path, files) = resolve_files(&args.path, &loader)?;

    let plan = SearchPlan::new(args.names.iter().map(|name| {
        let request = SearchRequest::new(name.as_str(), strategy);
        match kind {
            Some(kind) => request.with_kind(kind),
            None => request,
        }
    }));

    let mut skipped = 0usize;
    let loaded = load_files(&loader, &files, config.run_parallel(), &ProgressBar::hidden());
    let search: StubSearch = loaded
        .into_iter()
        .filter_map(|(file, result)| match result {
            Ok(tree) => Some((file, tree)),
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "skipping file");
                skipped += 1;
                None
            }
        })
        .collect();
    tracing::debug!(
        shards = search.len(),
        skipped,
        "searching"
    );

    let results = search.run(&plan);
    let root = if abs_path.is_dir() {
        abs_path.as_path()
    } else {
        abs_path.parent().unwrap_or(&abs_path)
    };

    match args.format.as_str() {
        "json" => report::write_search_json(&plan, &results)?,
        _ => report::write_search_pretty(&plan, &results, root),
    }

    if results.is_empty() {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the invalidate command.
pub fn run_invalidate(args: &InvalidateArgs, config_path: Option<&Path>) -> anyhow::Result<i32> {
    let config = load_config(config_path)?;
    let loader = StubTreeLoader::from_config(&config)?;
    loader.invalidate(&args.file)?;
    println!("Invalidated {}", args.file.display());
    Ok(EXIT_SUCCESS)
}
