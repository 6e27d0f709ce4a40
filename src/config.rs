//! Configuration schema for stubtree.
//!
//! Read from `stubtree.yaml` (or `.stubtree.yaml`) at the project root.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::storage::FileStorage;

/// File names probed by [`Config::discover`], in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["stubtree.yaml", ".stubtree.yaml"];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Glob patterns for paths never indexed (e.g., "**/target/**", "**/node_modules/**")
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Language ids to index; empty means every registered language.
    #[serde(default)]
    pub languages: Vec<String>,
    /// Index directories on the rayon pool (default: true)
    #[serde(default)]
    pub parallel: Option<bool>,
}

/// Persisted stub cache settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Whether trees are persisted between runs (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cache directory (default: the per-user cache dir + `stubs/`)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Find a config file directly inside `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Load `explicit` if given, else a discovered file in `dir`, else defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::parse_file(path),
            None => match Self::discover(dir) {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "using discovered config");
                    Self::parse_file(path)
                }
                None => Ok(Self::default()),
            },
        }
    }

    /// Returns whether directory indexing runs in parallel (defaults to true).
    pub fn run_parallel(&self) -> bool {
        self.parallel.unwrap_or(true)
    }

    /// Effective cache directory, or `None` when caching is disabled or the
    /// platform has no cache dir.
    pub fn cache_dir(&self) -> Option<PathBuf> {
        if !self.cache.enabled {
            return None;
        }
        self.cache.dir.clone().or_else(FileStorage::default_dir)
    }

    /// Compile the path and language filters.
    pub fn file_filter(&self) -> anyhow::Result<FileFilter> {
        FileFilter::new(&self.excluded_paths, &self.languages)
    }
}

/// Compiled form of `excluded_paths` and `languages`.
#[derive(Debug, Clone)]
pub struct FileFilter {
    excluded: GlobSet,
    languages: Option<HashSet<String>>,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            excluded: GlobSet::empty(),
            languages: None,
        }
    }
}

impl FileFilter {
    pub fn new<S: AsRef<str>>(excluded: &[S], languages: &[S]) -> anyhow::Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in excluded {
            builder.add(Glob::new(pattern.as_ref())?);
        }
        let languages = (!languages.is_empty())
            .then(|| languages.iter().map(|l| l.as_ref().to_string()).collect());
        Ok(Self {
            excluded: builder.build()?,
            languages,
        })
    }

    /// Check if a path matches an excluded_paths pattern.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        self.excluded.is_match(path)
    }

    pub fn allows_language(&self, language: &str) -> bool {
        self.languages
            .as_ref()
            .map_or(true, |allowed| allowed.contains(language))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config: Config = serde_yaml::from_str("version: \"1\"\n").unwrap();
        assert!(config.cache.enabled);
        assert!(config.run_parallel());
        assert!(config.excluded_paths.is_empty());
    }

    #[test]
    fn test_cache_disabled_has_no_dir() {
        let yaml = r#"
cache:
  enabled: false
  dir: /tmp/should-not-matter
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.cache_dir(), None);
    }

    #[test]
    fn test_explicit_cache_dir() {
        let yaml = "cache:\n  dir: /var/cache/stubs\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.cache_dir(), Some(PathBuf::from("/var/cache/stubs")));
    }

    #[test]
    fn test_file_filter() {
        let yaml = r#"
excluded_paths:
  - "**/vendor/**"
  - "**/*.generated.go"
languages:
  - go
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let filter = config.file_filter().unwrap();

        assert!(filter.is_path_excluded(Path::new("src/vendor/lib/a.go")));
        assert!(filter.is_path_excluded(Path::new("api/types.generated.go")));
        assert!(!filter.is_path_excluded(Path::new("src/main.go")));

        assert!(filter.allows_language("go"));
        assert!(!filter.allows_language("python"));
        assert!(FileFilter::default().allows_language("python"));
    }

    #[test]
    fn test_fixture_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata/stubtree.yaml");
        let config = Config::parse_file(path).unwrap();
        assert_eq!(config.name, "fixtures");
        assert!(config.cache.enabled);
        assert_eq!(config.languages, vec!["rust", "python", "java", "go"]);

        let filter = config.file_filter().unwrap();
        assert!(filter.is_path_excluded(Path::new("pkg/generated/api.go")));
        assert!(!filter.allows_language("typescript"));
    }

    #[test]
    fn test_invalid_glob_is_an_error() {
        let config = Config {
            excluded_paths: vec!["a[".to_string()],
            ..Default::default()
        };
        assert!(config.file_filter().is_err());
    }

    #[test]
    fn test_discover_and_load() {
        let temp = TempDir::new().unwrap();
        assert!(Config::discover(temp.path()).is_none());
        let config = Config::load(None, temp.path()).unwrap();
        assert_eq!(config.name, "");

        fs::write(temp.path().join(".stubtree.yaml"), "name: demo\n").unwrap();
        let found = Config::discover(temp.path()).unwrap();
        assert!(found.ends_with(".stubtree.yaml"));
        assert_eq!(Config::load(None, temp.path()).unwrap().name, "demo");
    }
}
