//! Configuration loader and validator for the content index.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::cache::CacheTtl;
use crate::ordering::LessonOrder;

pub const DEFAULT_PATH: &str = "course-index.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub content: Content,
    #[serde(default)]
    pub pinning: Pinning,
    #[serde(default)]
    pub ordering: Ordering,
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Where the content collections live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Content {
    pub dir: String,
}

/// Pinned course promoted to the top of the main feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pinning {
    #[serde(default)]
    pub enable_pinning: bool,
    #[serde(default)]
    pub pinned_course_slug: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ordering {
    #[serde(default)]
    pub lesson_order: LessonOrder,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheSettings {
    /// Fixed lifetime in seconds. Unset means the lifetime follows the build mode.
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

impl CacheSettings {
    pub fn ttl(&self) -> CacheTtl {
        match self.ttl_seconds {
            Some(secs) => CacheTtl::After(Duration::from_secs(secs)),
            None => CacheTtl::FromMode,
        }
    }
}

impl Config {
    /// Content directory, resolved against `base` when relative.
    pub fn content_dir(&self, base: &Path) -> PathBuf {
        let dir = Path::new(&self.content.dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            base.join(dir)
        }
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `course-index.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_PATH));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.content.dir.trim().is_empty() {
        return Err(ConfigError::Invalid("content.dir must be non-empty"));
    }
    if cfg.pinning.enable_pinning && cfg.pinning.pinned_course_slug.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "pinning.pinned_course_slug must be non-empty when pinning is enabled",
        ));
    }
    if cfg.cache.ttl_seconds == Some(0) {
        return Err(ConfigError::Invalid("cache.ttl_seconds must be > 0"));
    }
    Ok(())
}

/// Returns a documented example configuration.
pub fn example() -> &'static str {
    r#"content:
  dir: "./content"

# Promote one course above the posts in the main feed.
pinning:
  enable_pinning: true
  pinned_course_slug: "flutter-ship"

ordering:
  # section_path: group lessons by section directory name
  # section_order: group lessons by the section's `order` field
  lesson_order: section_path

cache:
  # Leave empty to cache forever in production and never in development.
  ttl_seconds: ~
"#
}
