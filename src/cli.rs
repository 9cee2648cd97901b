//! Command-line interface for codenarrator.

use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{self, Config, OutputFormat};
use crate::language::Language;
use crate::report::{self, DocsEntry, EntityCounts, SuggestEntry};
use crate::service::Narrator;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &["node_modules", "vendor", "target", "build", "dist", "__pycache__"];

/// Documentation generator and refactoring advisor.
///
/// Codenarrator documents Python, Java and JavaScript sources as markdown
/// and suggests line-attributed refactorings for them.
#[derive(Parser)]
#[command(name = "codenarrator")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging on stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate markdown documentation for source files
    #[command(visible_alias = "doc")]
    Docs(DocsArgs),
    /// Print refactoring suggestions for source files
    #[command(visible_alias = "check")]
    Suggest(SuggestArgs),
    /// Create a codenarrator configuration file
    Init(InitArgs),
}

/// Arguments for the docs command.
#[derive(Parser)]
pub struct DocsArgs {
    /// Path to document (file or directory)
    pub path: PathBuf,

    /// Directory to write `<stem>_docs.md` files into (default: print to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format: pretty or json (default: from configuration)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Show entity counts
    #[arg(long)]
    pub stats: bool,

    /// Path to configuration YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the suggest command.
#[derive(Parser)]
pub struct SuggestArgs {
    /// Path to analyze (file or directory)
    pub path: PathBuf,

    /// Output format: pretty or json (default: from configuration)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Exit non-zero when any suggestion is found
    #[arg(long)]
    pub strict: bool,

    /// Show a per-category breakdown
    #[arg(long)]
    pub stats: bool,

    /// Path to configuration YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "codenarrator.yaml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Files selected for one run, with the names they are reported under.
struct Selection {
    root: PathBuf,
    files: Vec<(PathBuf, String)>,
}

/// Collect supported source files under `root`, sorted by path.
pub fn collect_files(root: &Path, config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            // Skip hidden and dependency directories
            !name.starts_with('.') && !SKIPPED_DIRS.contains(&name.as_ref())
        })
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if Language::from_filename(name).is_none() {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        if config.is_path_excluded(relative) {
            tracing::debug!(path = %relative.display(), "excluded by configuration");
            continue;
        }
        files.push(path.to_path_buf());
    }

    Ok(files)
}

/// Resolve the format flag against the configured default.
fn resolve_format(flag: Option<&str>, config: &Config) -> Option<OutputFormat> {
    match flag {
        Some(f) => OutputFormat::parse(f),
        None => Some(config.output.format),
    }
}

/// Load configuration, printing the error on failure.
fn load_config(explicit: Option<&Path>) -> Option<Config> {
    match Config::load(explicit, Path::new(".")) {
        Ok(c) => Some(c),
        Err(e) => {
            eprintln!("Error parsing configuration: {}", e);
            None
        }
    }
}

/// Resolve `path` to the list of files to process.
///
/// A single file must have a supported extension; a directory yields
/// every supported file below it.
fn select(path: &Path, config: &Config) -> Result<Selection, String> {
    let metadata = std::fs::metadata(path).map_err(|e| format!("cannot access path {:?}: {}", path, e))?;

    if metadata.is_dir() {
        let files = collect_files(path, config)
            .map_err(|e| e.to_string())?
            .into_iter()
            .map(|file| {
                let name = file
                    .strip_prefix(path)
                    .unwrap_or(&file)
                    .to_string_lossy()
                    .replace('\\', "/");
                (file, name)
            })
            .collect();
        return Ok(Selection {
            root: path.to_path_buf(),
            files,
        });
    }

    let name = path.to_string_lossy().to_string();
    if Language::from_filename(&name).is_none() {
        return Err(format!(
            "unsupported file type: {} (supported: {})",
            name,
            Language::supported_types().join(", ")
        ));
    }
    Ok(Selection {
        root: path.to_path_buf(),
        files: vec![(path.to_path_buf(), name)],
    })
}

/// Read and process every selected file in parallel, keeping input order.
/// Files that cannot be read or processed are reported and skipped.
fn process<T, F>(selection: &Selection, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&str, &str) -> crate::error::Result<T> + Sync,
{
    let results: Vec<Option<T>> = selection
        .files
        .par_iter()
        .map(|(path, name)| {
            let content = match std::fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Warning: skipping {}: {}", name, e);
                    return None;
                }
            };
            match f(name.as_str(), content.as_str()) {
                Ok(v) => Some(v),
                Err(e) => {
                    eprintln!("Warning: skipping {}: {}", name, e);
                    None
                }
            }
        })
        .collect();
    results.into_iter().flatten().collect()
}

/// Run the docs command.
pub fn run_docs(args: &DocsArgs) -> anyhow::Result<i32> {
    let Some(config) = load_config(args.config.as_deref()) else {
        return Ok(EXIT_ERROR);
    };

    let Some(format) = resolve_format(args.format.as_deref(), &config) else {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format.as_deref().unwrap_or_default()
        );
        return Ok(EXIT_ERROR);
    };

    let selection = match select(&args.path, &config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if selection.files.is_empty() {
        eprintln!("Warning: no supported files found");
        return Ok(EXIT_SUCCESS);
    }

    if let Some(ref dir) = args.output {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Error: failed to create directory: {}", e);
            return Ok(EXIT_ERROR);
        }
    }

    let cache = config.build_cache();
    let narrator = Narrator::new(&cache);
    let outcomes = process(&selection, |name, content| narrator.document(name, content));

    let mut entries = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        let output = match args.output {
            Some(ref dir) => {
                let target = dir.join(&outcome.generated_filename);
                std::fs::write(&target, &outcome.markdown)?;
                Some(target.to_string_lossy().to_string())
            }
            None => None,
        };
        entries.push(DocsEntry {
            file: outcome.filename,
            language: outcome.language,
            syntax_error: outcome.extraction.is_syntax_error(),
            output,
            counts: EntityCounts::of(&outcome.extraction),
            markdown: outcome.markdown,
        });
    }
    tracing::debug!(cached = cache.len(), "docs run finished");

    let path_str = selection.root.to_string_lossy().to_string();
    let docs = report::docs_report(&path_str, &entries, args.stats);
    match format {
        OutputFormat::Json => report::write_json(&docs)?,
        OutputFormat::Pretty => report::write_docs_pretty(&docs),
    }

    if entries.len() < selection.files.len() {
        Ok(EXIT_ERROR)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the suggest command.
pub fn run_suggest(args: &SuggestArgs) -> anyhow::Result<i32> {
    let Some(config) = load_config(args.config.as_deref()) else {
        return Ok(EXIT_ERROR);
    };

    let Some(format) = resolve_format(args.format.as_deref(), &config) else {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format.as_deref().unwrap_or_default()
        );
        return Ok(EXIT_ERROR);
    };

    let selection = match select(&args.path, &config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if selection.files.is_empty() {
        eprintln!("Warning: no supported files found");
        return Ok(EXIT_SUCCESS);
    }

    let cache = config.build_cache();
    let narrator = Narrator::new(&cache);
    let entries: Vec<SuggestEntry> = process(&selection, |name, content| narrator.suggest(name, content))
        .into_iter()
        .map(|outcome| SuggestEntry {
            file: outcome.filename,
            language: outcome.language,
            diagnostics: outcome.diagnostics,
        })
        .collect();

    let path_str = selection.root.to_string_lossy().to_string();
    let suggestions = report::suggest_report(&path_str, &entries, args.stats);
    match format {
        OutputFormat::Json => report::write_json(&suggestions)?,
        OutputFormat::Pretty => report::write_suggest_pretty(&suggestions),
    }

    if entries.len() < selection.files.len() {
        Ok(EXIT_ERROR)
    } else if args.strict && suggestions.total > 0 {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // Check if output already exists
    if args.output.exists() && !args.force {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --force to overwrite");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, config::DEFAULT_CONFIG) {
        eprintln!("Error: failed to write configuration: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to customize cache and output settings", args.output.display());
    println!("  2. Run: codenarrator docs . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::create_dir_all(root.join("node_modules/lib")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("b.py"), "x = 1\n").unwrap();
        fs::write(root.join("pkg/A.java"), "class A {}\n").unwrap();
        fs::write(root.join("pkg/app.jsx"), "const a = 1;\n").unwrap();
        fs::write(root.join("pkg/notes.txt"), "hello\n").unwrap();
        fs::write(root.join("node_modules/lib/index.js"), "var a;\n").unwrap();
        fs::write(root.join(".git/hook.py"), "x = 1\n").unwrap();
        dir
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_collect_files_skips_hidden_and_dependencies() {
        let dir = tree();
        let files = collect_files(dir.path(), &Config::default()).unwrap();
        assert_eq!(names(dir.path(), &files), vec!["b.py", "pkg/A.java", "pkg/app.jsx"]);
    }

    #[test]
    fn test_collect_files_honors_excluded_paths() {
        let dir = tree();
        let config = Config {
            excluded_paths: vec!["pkg/*.java".to_string()],
            ..Default::default()
        };
        let files = collect_files(dir.path(), &config).unwrap();
        assert_eq!(names(dir.path(), &files), vec!["b.py", "pkg/app.jsx"]);
    }

    #[test]
    fn test_select_rejects_unsupported_file() {
        let dir = tree();
        let err = select(&dir.path().join("pkg/notes.txt"), &Config::default())
            .err()
            .unwrap();
        assert!(err.contains("unsupported file type"));
    }

    #[test]
    fn test_process_keeps_input_order() {
        let dir = tree();
        let selection = select(dir.path(), &Config::default()).unwrap();
        let seen = process(&selection, |name, _| Ok(name.to_string()));
        assert_eq!(seen, vec!["b.py", "pkg/A.java", "pkg/app.jsx"]);
    }

    #[test]
    fn test_resolve_format() {
        let config = Config::default();
        assert_eq!(resolve_format(None, &config), Some(OutputFormat::Pretty));
        assert_eq!(resolve_format(Some("json"), &config), Some(OutputFormat::Json));
        assert_eq!(resolve_format(Some("xml"), &config), None);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("codenarrator.yaml");
        let args = InitArgs {
            output: output.clone(),
            force: false,
        };
        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);

        let forced = InitArgs { output, force: true };
        assert_eq!(run_init(&forced).unwrap(), EXIT_SUCCESS);
    }
}
