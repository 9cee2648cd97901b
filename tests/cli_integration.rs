//! Integration tests for the command-line workflow and configuration.

use std::fs;
use std::path::PathBuf;

use codenarrator::cli::{self, DocsArgs, SuggestArgs, EXIT_ERROR, EXIT_FAILED, EXIT_SUCCESS};
use codenarrator::config::{Config, OutputFormat};
use codenarrator::{FileCache, FileKind, Narrator};
use tempfile::TempDir;

fn project_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata").join("project")
}

fn docs_args(path: PathBuf, output: Option<PathBuf>) -> DocsArgs {
    DocsArgs {
        path,
        output,
        format: Some("json".to_string()),
        stats: true,
        config: None,
    }
}

fn suggest_args(path: PathBuf, strict: bool) -> SuggestArgs {
    SuggestArgs {
        path,
        format: Some("json".to_string()),
        strict,
        stats: false,
        config: None,
    }
}

#[test]
fn test_docs_writes_one_file_per_source() {
    let out = TempDir::new().unwrap();
    let args = docs_args(project_path(), Some(out.path().to_path_buf()));

    assert_eq!(cli::run_docs(&args).unwrap(), EXIT_SUCCESS);

    let app = fs::read_to_string(out.path().join("app_docs.md")).unwrap();
    assert!(app.contains("### Function: `greet`"));
    let main = fs::read_to_string(out.path().join("main_docs.md")).unwrap();
    assert!(main.starts_with("# JavaScript Code Documentation"));
    assert!(!out.path().join("README_docs.md").exists());
}

#[test]
fn test_docs_rejects_unsupported_file() {
    let args = docs_args(project_path().join("README.txt"), None);
    assert_eq!(cli::run_docs(&args).unwrap(), EXIT_ERROR);
}

#[test]
fn test_docs_rejects_unknown_format() {
    let mut args = docs_args(project_path(), None);
    args.format = Some("sarif".to_string());
    assert_eq!(cli::run_docs(&args).unwrap(), EXIT_ERROR);
}

#[test]
fn test_suggest_strict_exit_codes() {
    let js = project_path().join("web").join("main.js");
    assert_eq!(cli::run_suggest(&suggest_args(js.clone(), false)).unwrap(), EXIT_SUCCESS);
    assert_eq!(cli::run_suggest(&suggest_args(js, true)).unwrap(), EXIT_FAILED);
}

#[test]
fn test_suggest_with_excluding_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("codenarrator.yaml");
    fs::write(&config_path, "excluded_paths:\n  - \"web/**\"\n").unwrap();

    // main.js would fail a strict run; app.py is clean.
    let mut args = suggest_args(project_path(), true);
    args.config = Some(config_path);
    assert_eq!(cli::run_suggest(&args).unwrap(), EXIT_SUCCESS);

    let config = Config::parse_file(dir.path().join("codenarrator.yaml")).unwrap();
    let files = cli::collect_files(&project_path(), &config).unwrap();
    let names: Vec<String> = files
        .iter()
        .map(|f| f.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["app.py"]);
}

#[test]
fn test_invalid_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("bad.yaml");
    fs::write(&config_path, "cache:\n  ttl_hours: 0\n").unwrap();

    let mut args = suggest_args(project_path(), false);
    args.config = Some(config_path);
    assert_eq!(cli::run_suggest(&args).unwrap(), EXIT_ERROR);
}

#[test]
fn test_init_writes_loadable_config() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("nested").join("codenarrator.yaml");
    let args = cli::InitArgs {
        output: output.clone(),
        force: false,
    };
    assert_eq!(cli::run_init(&args).unwrap(), EXIT_SUCCESS);

    let config = Config::load(Some(&output), dir.path()).unwrap();
    assert_eq!(config.output.format, OutputFormat::Pretty);
    assert_eq!(config.cache.max_files, 100);
}

#[test]
fn test_config_discovery() {
    let dir = TempDir::new().unwrap();
    assert_eq!(Config::load(None, dir.path()).unwrap(), Config::default());

    fs::write(dir.path().join(".codenarrator.yaml"), "output:\n  format: json\n").unwrap();
    let config = Config::load(None, dir.path()).unwrap();
    assert_eq!(config.output.format, OutputFormat::Json);
}

#[test]
fn test_configured_cache_bounds_the_narrator() {
    let config = Config::parse_str("cache:\n  max_files: 3\n").unwrap();
    let cache: FileCache = config.build_cache();
    let narrator = Narrator::new(&cache);

    for i in 0..3 {
        narrator
            .document(&format!("m{}.py", i), "def f():\n    pass\n")
            .unwrap();
    }

    let stats = cache.stats();
    assert_eq!(stats.total_files, 3);
    assert_eq!(stats.max_files, 3);
    let recent = cache.list_recent(10);
    assert_eq!(recent[0].filename, "m2_docs.md");
    assert_eq!(recent[0].kind, FileKind::Generated);
}
