//! Project lookup.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// A project known to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectReference {
    /// Owner (user or organization) name.
    pub owner: String,
    /// Project name.
    pub name: String,
    /// URL (or local path) the project is cloned from.
    pub origin_url: String,
    /// Reported size in KB.
    #[serde(default)]
    pub size: u64,
}

impl ProjectReference {
    /// Returns `owner/name`.
    pub fn fullname(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Failures reaching the project store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing file could not be read.
    #[error("Failed to read project catalog {path}: {source}")]
    Io {
        /// Catalog path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The backing file is not a valid catalog.
    #[error("Malformed project catalog: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Looks projects up by owner and name.
pub trait ProjectStore: Send + Sync {
    /// Finds a project; `Ok(None)` when it is not known.
    fn find_full_name(&self, owner: &str, name: &str)
        -> Result<Option<ProjectReference>, StoreError>;
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    projects: Vec<ProjectReference>,
}

/// Project store backed by a YAML file:
///
/// ```yaml
/// projects:
///   - owner: octo
///     name: hello
///     origin_url: https://github.com/octo/hello.git
///     size: 120
/// ```
///
/// The file is re-read on every lookup so edits apply without a restart.
/// A missing file is an empty catalog.
#[derive(Debug, Clone)]
pub struct ProjectCatalog {
    path: PathBuf,
}

impl ProjectCatalog {
    /// Creates a catalog reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the catalog path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<CatalogFile, StoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "Project catalog missing; treating as empty");
            return Ok(CatalogFile::default());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(CatalogFile::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }
}

impl ProjectStore for ProjectCatalog {
    fn find_full_name(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Option<ProjectReference>, StoreError> {
        // Reloaded per lookup so catalog edits apply without a restart
        let catalog = self.load()?;
        Ok(catalog
            .projects
            .into_iter()
            .find(|project| project.owner == owner && project.name == name))
    }
}
