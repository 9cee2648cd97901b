//! YAML configuration for the codenarrator CLI.
//!
//! Every key is optional; a missing file section falls back to its
//! defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::{FileCache, DEFAULT_MAX_FILES, DEFAULT_TTL_HOURS};
use crate::error::{Error, Result};

/// Configuration file names searched in the working directory.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["codenarrator.yaml", ".codenarrator.yaml"];

/// Configuration written by `codenarrator init`.
pub const DEFAULT_CONFIG: &str = "\
# codenarrator configuration

cache:
  # Maximum number of uploaded and generated files kept in memory.
  max_files: 100
  # Hours before a cached file expires.
  ttl_hours: 24

# Glob patterns skipped when a directory is scanned.
excluded_paths:
  - \"**/node_modules/**\"
  - \"**/vendor/**\"

output:
  # pretty or json
  format: pretty
";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    /// Glob patterns for paths to exclude from directory scans (e.g. "**/build/**").
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CacheConfig {
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            ttl_hours: DEFAULT_TTL_HOURS,
        }
    }
}

fn default_max_files() -> usize {
    DEFAULT_MAX_FILES
}

fn default_ttl_hours() -> u64 {
    DEFAULT_TTL_HOURS
}

/// How results are printed.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pretty" => Some(OutputFormat::Pretty),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    /// Parse a configuration from YAML text. Empty text yields the defaults.
    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        validate(&config)?;
        Ok(config)
    }

    /// Load `explicit` if given, else the first discovered file in `dir`,
    /// else the defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::parse_file(path);
        }
        match discover(dir) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using discovered configuration");
                Self::parse_file(path)
            }
            None => Ok(Config::default()),
        }
    }

    /// Check if a path should be excluded based on `excluded_paths` patterns.
    /// Uses globset, so `**` matches across directories.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }

        let path_str = path.to_string_lossy();

        for pattern in &self.excluded_paths {
            if let Ok(glob) = globset::Glob::new(pattern) {
                let matcher = glob.compile_matcher();
                if matcher.is_match(&*path_str) {
                    return true;
                }
            }
        }
        false
    }

    /// A cache sized by this configuration.
    pub fn build_cache(&self) -> FileCache {
        FileCache::new(self.cache.max_files, self.cache.ttl_hours)
    }
}

/// Find a configuration file in `dir`.
pub fn discover(dir: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Validate a configuration for semantic errors.
pub fn validate(config: &Config) -> Result<()> {
    if config.cache.max_files == 0 {
        return Err(Error::Config("cache.max_files must be at least 1".to_string()));
    }
    if config.cache.ttl_hours == 0 {
        return Err(Error::Config("cache.ttl_hours must be at least 1".to_string()));
    }
    for pattern in &config.excluded_paths {
        if let Err(e) = globset::Glob::new(pattern) {
            return Err(Error::Config(format!(
                "invalid excluded_paths pattern {:?}: {}",
                pattern, e
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_str("").unwrap();
        assert_eq!(config.cache.max_files, 100);
        assert_eq!(config.cache.ttl_hours, 24);
        assert_eq!(config.output.format, OutputFormat::Pretty);
        assert!(config.excluded_paths.is_empty());
    }

    #[test]
    fn test_default_template_parses() {
        let config = Config::parse_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.cache, CacheConfig::default());
        assert_eq!(config.excluded_paths.len(), 2);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse_str("cache:\n  ttl_hours: 2\noutput:\n  format: json\n").unwrap();
        assert_eq!(config.cache.max_files, 100);
        assert_eq!(config.cache.ttl_hours, 2);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let err = Config::parse_str("cache:\n  max_files: 0\n").unwrap_err();
        assert!(err.to_string().contains("max_files"));
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Config::parse_str("output:\n  format: sarif\n").is_err());
    }

    #[test]
    fn test_is_path_excluded() {
        let config = Config {
            excluded_paths: vec!["**/node_modules/**".to_string(), "**/*.min.js".to_string()],
            ..Default::default()
        };
        assert!(config.is_path_excluded(Path::new("web/node_modules/lib/index.js")));
        assert!(config.is_path_excluded(Path::new("static/app.min.js")));
        assert!(!config.is_path_excluded(Path::new("src/app.js")));
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("sarif"), None);
    }
}
