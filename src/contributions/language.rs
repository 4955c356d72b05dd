//! Language registry and line classification.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Name reported for files whose extension is not registered.
pub const UNKNOWN_LANGUAGE: &str = "not recognized";

/// Shared sentinel for unregistered extensions.
static UNKNOWN: LazyLock<Arc<LanguageDescriptor>> =
    LazyLock::new(|| Arc::new(LanguageDescriptor::unknown()));

/// Whether a line counts toward attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Substantive code that earns credit.
    Wanted,
    /// Blank, comment-only, or in an unwanted language.
    Useless,
}

/// Describes one language: its extension and what a non-substantive line
/// looks like.
#[derive(Debug, Clone)]
pub struct LanguageDescriptor {
    name: String,
    extension: String,
    wanted: bool,
    comment: Option<String>,
    comment_line: Option<Regex>,
}

impl LanguageDescriptor {
    /// Creates a wanted language whose only useless lines are blank ones.
    pub fn new(name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extension: extension.into(),
            wanted: true,
            comment: None,
            comment_line: None,
        }
    }

    /// Adds a single-line comment pattern (a regex matched after leading
    /// spaces or tabs).
    pub fn with_comment(mut self, comment: &str) -> Result<Self, regex::Error> {
        let comment_line = Regex::new(&format!(r"^[ \t]*(?:{comment})"))?;
        self.comment = Some(comment.to_string());
        self.comment_line = Some(comment_line);
        Ok(self)
    }

    /// The sentinel for extensions nobody registered.
    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN_LANGUAGE.to_string(),
            extension: String::new(),
            wanted: false,
            comment: None,
            comment_line: None,
        }
    }

    /// Human-readable language name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File extension without the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Whether lines in this language can earn credit at all.
    pub fn is_wanted(&self) -> bool {
        self.wanted
    }

    /// Source of the comment pattern, if any.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Classifies a single line of a file written in this language.
    pub fn classify_line(&self, text: &str) -> LineKind {
        // Blank lines never count, in any language
        if !self.wanted || text.trim().is_empty() {
            return LineKind::Useless;
        }
        match &self.comment_line {
            Some(pattern) if pattern.is_match(text) => LineKind::Useless,
            _ => LineKind::Wanted,
        }
    }
}

/// Language entry as written in settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Language name.
    pub name: String,
    /// Extension without the dot.
    pub extension: String,
    /// Optional single-line comment regex.
    #[serde(default)]
    pub comment: Option<String>,
}

impl TryFrom<&LanguageConfig> for LanguageDescriptor {
    type Error = regex::Error;

    fn try_from(config: &LanguageConfig) -> Result<Self, Self::Error> {
        let descriptor = Self::new(&config.name, &config.extension);
        match &config.comment {
            Some(comment) => descriptor.with_comment(comment),
            None => Ok(descriptor),
        }
    }
}

/// Extension → language lookup, built once at startup and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    languages: HashMap<String, Arc<LanguageDescriptor>>,
}

impl LanguageRegistry {
    /// Creates a registry with nothing registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in languages.
    pub fn with_defaults() -> Result<Self, regex::Error> {
        let mut registry = Self::empty();
        for descriptor in [
            LanguageDescriptor::new("Ruby", "rb").with_comment("[#/]")?,
            LanguageDescriptor::new("Python", "py").with_comment("[#/]")?,
            LanguageDescriptor::new("JavaScript", "js").with_comment("//")?,
            LanguageDescriptor::new("HTML", "html"),
            LanguageDescriptor::new("ERB", "erb"),
            LanguageDescriptor::new("Slim", "slim"),
            LanguageDescriptor::new("CSS", "css"),
            LanguageDescriptor::new("Markdown", "md"),
        ] {
            registry.register(descriptor.extension().to_string(), descriptor);
        }
        Ok(registry)
    }

    /// Adds or replaces the language for `extension`.
    pub fn register(&mut self, extension: impl Into<String>, descriptor: LanguageDescriptor) {
        self.languages.insert(extension.into(), Arc::new(descriptor));
    }

    /// Registers every language from settings, replacing built-ins on clash.
    pub fn register_configs(&mut self, configs: &[LanguageConfig]) -> Result<(), regex::Error> {
        for config in configs {
            let descriptor = LanguageDescriptor::try_from(config)?;
            self.register(config.extension.clone(), descriptor);
        }
        Ok(())
    }

    /// Looks up an extension, falling back to the unknown language.
    pub fn resolve(&self, extension: &str) -> Arc<LanguageDescriptor> {
        self.languages
            .get(extension)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&UNKNOWN))
    }

    /// Looks up the language of a file path by its extension.
    pub fn resolve_path(&self, path: &Path) -> Arc<LanguageDescriptor> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or_else(|| Arc::clone(&UNKNOWN), |ext| self.resolve(ext))
    }

    /// All registered extensions, sorted.
    pub fn wanted_extensions(&self) -> BTreeSet<&str> {
        self.languages.keys().map(String::as_str).collect()
    }

    /// Classifies a line under the given language.
    pub fn classify_line(descriptor: &LanguageDescriptor, text: &str) -> LineKind {
        descriptor.classify_line(text)
    }
}
