//! Settings loaded from `$HOME/.codepraise/settings.json`.
//!
//! Every scalar can be overridden by an environment variable, either from
//! the process environment or from the file's own `env` map.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::contributions::{LanguageConfig, LanguageRegistry};

/// Default ceiling for cloning, in KB.
pub const DEFAULT_MAX_CLONE_SIZE_KB: u64 = 50_000;

const REPOSTORE_VAR: &str = "CODEPRAISE_REPOSTORE";
const CACHE_DIR_VAR: &str = "CODEPRAISE_CACHE_DIR";
const CATALOG_VAR: &str = "CODEPRAISE_CATALOG";
const MAX_CLONE_SIZE_VAR: &str = "CODEPRAISE_MAX_CLONE_SIZE_KB";

/// Contents of the settings file.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Where projects are cloned.
    #[serde(default)]
    pub repostore: Option<PathBuf>,

    /// Where rendered results are cached.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// YAML project catalog.
    #[serde(default)]
    pub catalog: Option<PathBuf>,

    /// Projects larger than this are refused.
    #[serde(default)]
    pub max_clone_size_kb: Option<u64>,

    /// Glob patterns for files never appraised.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Languages added to (or replacing) the built-ins.
    #[serde(default)]
    pub languages: Vec<LanguageConfig>,

    /// Environment variable fallbacks.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Settings {
    /// Loads settings from the default location.
    pub fn load() -> Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Self::load_from_path(&settings_path)
    }

    /// Loads settings from a specific path; a missing file means defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        // No settings file yet: run on defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        serde_json::from_str::<Self>(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Returns the default settings path.
    pub fn get_settings_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("settings.json"))
    }

    /// Returns an environment variable with fallback to the `env` map.
    pub fn get_env_var(&self, key: &str) -> Option<String> {
        // Process environment first, then the settings file's env map
        env::var(key).ok().or_else(|| self.env.get(key).cloned())
    }

    /// Clone directory.
    pub fn repostore(&self) -> Result<PathBuf> {
        self.path_setting(REPOSTORE_VAR, self.repostore.as_ref(), || {
            Ok(Self::data_dir()?.join("repostore"))
        })
    }

    /// Result cache directory.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        self.path_setting(CACHE_DIR_VAR, self.cache_dir.as_ref(), || {
            Ok(Self::data_dir()?.join("cache"))
        })
    }

    /// Project catalog file.
    pub fn catalog(&self) -> Result<PathBuf> {
        self.path_setting(CATALOG_VAR, self.catalog.as_ref(), || {
            Ok(Self::home_dir()?.join("projects.yml"))
        })
    }

    /// Clone size ceiling in KB.
    pub fn max_clone_size_kb(&self) -> Result<u64> {
        // An override that does not parse is an error, not a silent default
        match self.get_env_var(MAX_CLONE_SIZE_VAR) {
            Some(value) => value
                .trim()
                .parse()
                .with_context(|| format!("{MAX_CLONE_SIZE_VAR} is not a number: {value}")),
            None => Ok(self.max_clone_size_kb.unwrap_or(DEFAULT_MAX_CLONE_SIZE_KB)),
        }
    }

    /// Built-in languages plus the configured ones.
    pub fn language_registry(&self) -> Result<LanguageRegistry> {
        let mut registry =
            LanguageRegistry::with_defaults().context("Built-in language patterns are invalid")?;
        // Configured entries replace built-ins with the same extension
        registry
            .register_configs(&self.languages)
            .context("Invalid comment pattern in configured languages")?;
        Ok(registry)
    }

    fn path_setting(
        &self,
        var: &str,
        configured: Option<&PathBuf>,
        default: impl FnOnce() -> Result<PathBuf>,
    ) -> Result<PathBuf> {
        // Environment beats the file, the file beats the default
        if let Some(value) = self.get_env_var(var) {
            return Ok(PathBuf::from(value));
        }
        match configured {
            Some(path) => Ok(path.clone()),
            None => default(),
        }
    }

    fn home_dir() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home_dir.join(".codepraise"))
    }

    fn data_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir().context("Failed to determine cache directory")?;
        Ok(cache_dir.join("codepraise"))
    }
}
