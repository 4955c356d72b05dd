//! The appraisal pipeline: project lookup, local copy, attribution.

use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use tokio::task;
use tracing::{error, info, warn};

use super::result::{ApiResult, ProjectFolderContributions, Status};
use crate::contributions::{ContributionsMapper, LanguageRegistry};
use crate::git::{BlameReader, CancelFlag, FetchError, FolderWalker, SourceFetcher, WorkingCopy};
use crate::store::{ProjectReference, ProjectStore};

const NO_PROJ_ERR: &str = "Project not found";
const DB_ERR: &str = "Having trouble accessing the database";
const CLONE_ERR: &str = "Could not clone this project";
const TOO_LARGE_ERR: &str = "Project is too large to clone";
const NO_FOLDER_ERR: &str = "Could not find that folder";

/// What to appraise: a folder of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppraisalRequest {
    /// Project owner.
    pub owner_name: String,
    /// Project name.
    pub project_name: String,
    /// Folder relative to the project root; empty or `/` for the root.
    pub folder_name: String,
}

impl AppraisalRequest {
    /// Creates a request.
    pub fn new(
        owner_name: impl Into<String>,
        project_name: impl Into<String>,
        folder_name: impl Into<String>,
    ) -> Self {
        Self {
            owner_name: owner_name.into(),
            project_name: project_name.into(),
            folder_name: folder_name.into(),
        }
    }

    /// Parses `owner/project[/folder...]`.
    pub fn parse(path: &str) -> Result<Self> {
        let mut parts = path.trim_matches('/').splitn(3, '/');
        let owner = parts.next().unwrap_or_default();
        let project = parts.next().unwrap_or_default();
        if owner.is_empty() || project.is_empty() {
            bail!("Expected owner/project[/folder], got '{path}'");
        }
        let folder = parts.next().unwrap_or_default().trim_matches('/');
        // Names end up in clone and cache paths.
        if [owner, project, folder]
            .iter()
            .flat_map(|part| part.split('/'))
            .any(|segment| segment == "." || segment == "..")
        {
            bail!("Relative segments are not allowed in '{path}'");
        }

        Ok(Self::new(owner, project, folder))
    }

    /// Returns `owner/project/folder`.
    pub fn full_request_path(&self) -> String {
        [
            self.owner_name.as_str(),
            self.project_name.as_str(),
            self.folder_name.as_str(),
        ]
        .join("/")
    }
}

/// Turns an [`AppraisalRequest`] into an [`ApiResult`].
///
/// Every failure is mapped to a status and message; nothing is retried.
pub struct AppraiseProject {
    store: Arc<dyn ProjectStore>,
    fetcher: Arc<dyn SourceFetcher>,
    walker: Arc<dyn FolderWalker>,
    blame: Arc<dyn BlameReader>,
    registry: Arc<LanguageRegistry>,
}

impl AppraiseProject {
    /// Wires the pipeline to its collaborators.
    pub fn new(
        store: Arc<dyn ProjectStore>,
        fetcher: Arc<dyn SourceFetcher>,
        walker: Arc<dyn FolderWalker>,
        blame: Arc<dyn BlameReader>,
        registry: Arc<LanguageRegistry>,
    ) -> Self {
        Self {
            store,
            fetcher,
            walker,
            blame,
            registry,
        }
    }

    /// Runs the pipeline.
    ///
    /// Dropping the returned future while a clone is running cancels it.
    pub async fn appraise(&self, request: &AppraisalRequest) -> ApiResult {
        match self.run(request).await {
            Ok(result) | Err(result) => result,
        }
    }

    async fn run(&self, request: &AppraisalRequest) -> Result<ApiResult, ApiResult> {
        // Each step returns its own failure result, which ends the run
        let project = self.retrieve_remote_project(request).await?;
        let copy = self.clone_remote(&project).await?;
        self.appraise_contributions(request, project, copy).await
    }

    async fn retrieve_remote_project(
        &self,
        request: &AppraisalRequest,
    ) -> Result<ProjectReference, ApiResult> {
        let store = Arc::clone(&self.store);
        let owner = request.owner_name.clone();
        let name = request.project_name.clone();
        let found = task::spawn_blocking(move || store.find_full_name(&owner, &name))
            .await
            .map_err(|e| anyhow!(e))
            .and_then(|found| found.map_err(anyhow::Error::from));

        match found {
            Ok(Some(project)) => Ok(project),
            Ok(None) => Err(ApiResult::text(Status::NotFound, NO_PROJ_ERR)),
            Err(e) => {
                error!(error = %format!("{e:#}"), "Project store lookup failed");
                Err(ApiResult::text(Status::InternalError, DB_ERR))
            }
        }
    }

    async fn clone_remote(&self, project: &ProjectReference) -> Result<WorkingCopy, ApiResult> {
        let cancel = CancelFlag::new();
        // Trips when this future is dropped mid-fetch.
        let _cancel_guard = cancel.cancel_on_drop();

        let fetcher = Arc::clone(&self.fetcher);
        let target = project.clone();
        let fetched = task::spawn_blocking(move || fetcher.ensure_local(&target, &cancel)).await;

        match fetched {
            Ok(Ok(copy)) => Ok(copy),
            Ok(Err(FetchError::TooLarge { size_kb, .. })) => {
                warn!(project = %project.fullname(), size_kb, "Project too large");
                Err(ApiResult::text(Status::Forbidden, TOO_LARGE_ERR))
            }
            Ok(Err(e)) => {
                error!(project = %project.fullname(), error = %format!("{:#}", anyhow!(e)), "Clone failed");
                Err(ApiResult::text(Status::InternalError, CLONE_ERR))
            }
            Err(e) => {
                error!(project = %project.fullname(), error = %e, "Clone task failed");
                Err(ApiResult::text(Status::InternalError, CLONE_ERR))
            }
        }
    }

    async fn appraise_contributions(
        &self,
        request: &AppraisalRequest,
        project: ProjectReference,
        copy: WorkingCopy,
    ) -> Result<ApiResult, ApiResult> {
        let walker = Arc::clone(&self.walker);
        let blame = Arc::clone(&self.blame);
        let registry = Arc::clone(&self.registry);
        let folder_name = request.folder_name.clone();

        let appraised = task::spawn_blocking(move || -> Result<ProjectFolderContributions> {
            let mapper = ContributionsMapper::new(&copy, &*walker, &*blame, &registry);
            let folder = mapper.for_folder(&folder_name)?;
            Ok(ProjectFolderContributions::new(project, &folder))
        })
        .await
        .map_err(|e| anyhow!(e))
        .and_then(|appraised| appraised);

        match appraised {
            Ok(contributions) => Ok(ApiResult::appraisal(contributions)),
            // A folder that cannot be walked or blamed is reported as missing
            Err(e) => {
                info!(
                    request = %request.full_request_path(),
                    error = %format!("{e:#}"),
                    "Could not find folder"
                );
                Err(ApiResult::text(Status::NotFound, NO_FOLDER_ERR))
            }
        }
    }
}
