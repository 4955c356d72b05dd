//! `codepraise appraise`.

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{debug, warn};

use crate::cache::LocalCache;
use crate::config::Settings;
use crate::data::{from_yaml, to_yaml};
use crate::git::{GitBlameReader, GitFetcher};
use crate::service::{ApiResult, AppraisalRequest, AppraiseProject};
use crate::store::ProjectCatalog;

/// Appraise command options.
#[derive(Parser)]
pub struct AppraiseCommand {
    /// Project and optional folder: owner/project[/folder].
    pub path: String,

    /// Recompute even when a cached result exists.
    #[arg(long)]
    pub refresh: bool,
}

impl AppraiseCommand {
    /// Executes the appraise command.
    pub async fn execute(self) -> Result<()> {
        let settings = Settings::load()?;
        let request = AppraisalRequest::parse(&self.path)?;
        let cache = LocalCache::new(settings.cache_dir()?)?;
        let key = cache_key(&request);

        if !self.refresh {
            if let Some(body) = cache.read(&key)? {
                // A body that no longer parses is recomputed and overwritten.
                match from_yaml::<ApiResult>(&body) {
                    Ok(_) => {
                        debug!(key = %key, "Serving cached appraisal");
                        print!("{body}");
                        return Ok(());
                    }
                    Err(e) => warn!(key = %key, error = %e, "Discarding unreadable cache entry"),
                }
            }
        }

        let service = build_service(&settings)?;
        let result = service.appraise(&request).await;
        let body = to_yaml(&result)?;
        print!("{body}");

        if !result.is_ok() {
            bail!(
                "Appraisal of {} failed ({}, HTTP {}): {}",
                request.full_request_path(),
                result.status,
                result.status.http_code(),
                result.text_message().unwrap_or_default()
            );
        }
        cache.write(&key, &body)?;
        Ok(())
    }
}

/// Wires the pipeline to the catalog, clone store, and git readers that
/// `settings` describe.
pub fn build_service(settings: &Settings) -> Result<AppraiseProject> {
    let registry = Arc::new(settings.language_registry()?);
    let reader = Arc::new(GitBlameReader::with_ignore(&settings.ignore)?);
    let fetcher = Arc::new(GitFetcher::new(
        settings.repostore()?,
        settings.max_clone_size_kb()?,
    ));
    let store = Arc::new(ProjectCatalog::new(settings.catalog()?));

    Ok(AppraiseProject::new(
        store,
        fetcher,
        reader.clone(),
        reader,
        registry,
    ))
}

/// Cache location of a rendered appraisal.
fn cache_key(request: &AppraisalRequest) -> String {
    let folder = request.folder_name.trim_matches('/');
    if folder.is_empty() {
        format!("body/{}/{}.yaml", request.owner_name, request.project_name)
    } else {
        format!(
            "body/{}/{}/{folder}.yaml",
            request.owner_name, request.project_name
        )
    }
}
