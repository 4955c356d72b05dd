//! Cloning remote projects into the local repository store.

use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use git2::build::RepoBuilder;
use git2::{FetchOptions, RemoteCallbacks};
use tracing::{debug, info};

use super::repository::GitRepository;
use super::{CancelFlag, FetchError, SourceFetcher, WorkingCopy};
use crate::store::ProjectReference;

/// Clones projects under `repostore/<owner>/<name>` with a size ceiling.
///
/// Fetches of the same project through one fetcher are serialized. Each
/// clone is staged in its own hidden sibling directory and only becomes
/// visible once it has completed, so fetchers in separate processes can
/// share a store.
#[derive(Debug)]
pub struct GitFetcher {
    repostore: PathBuf,
    max_size_kb: u64,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl GitFetcher {
    /// Creates a fetcher storing clones under `repostore`.
    pub fn new(repostore: impl Into<PathBuf>, max_size_kb: u64) -> Self {
        Self {
            repostore: repostore.into(),
            max_size_kb,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Where the project's working copy lives.
    pub fn local_path(&self, project: &ProjectReference) -> PathBuf {
        self.repostore.join(&project.owner).join(&project.name)
    }

    /// Whether the project has already been cloned.
    pub fn exists_locally(&self, project: &ProjectReference) -> bool {
        GitRepository::exists_at(self.local_path(project))
    }

    fn lock_for(&self, fullname: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(fullname.to_string()).or_default())
    }

    fn clone_into(
        &self,
        project: &ProjectReference,
        target: &Path,
        cancel: &CancelFlag,
    ) -> Result<(), FetchError> {
        let parent = target.parent().unwrap_or(&self.repostore);
        fs::create_dir_all(parent)?;
        // Unique per attempt, so fetchers in other processes never share it;
        // dropping it removes whatever a failed clone left behind.
        let staging = tempfile::Builder::new()
            .prefix(&format!(".{}.", project.name))
            .tempdir_in(parent)?;

        let limit_bytes = self.max_size_kb.saturating_mul(1024);
        let received = Cell::new(0_u64);

        let mut callbacks = RemoteCallbacks::new();
        callbacks.transfer_progress(|progress| {
            received.set(progress.received_bytes() as u64);
            !cancel.is_cancelled() && received.get() <= limit_bytes
        });
        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);

        let result = RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(&project.origin_url, staging.path());

        match result {
            Ok(_) => match fs::rename(staging.path(), target) {
                Ok(()) => Ok(()),
                // Another process finished the same clone first.
                Err(_) if GitRepository::exists_at(target) => {
                    debug!(path = %target.display(), "Clone already moved into place");
                    Ok(())
                }
                Err(error) => Err(error.into()),
            },
            Err(error) => {
                if cancel.is_cancelled() {
                    Err(FetchError::Cancelled)
                } else if received.get() > limit_bytes {
                    Err(FetchError::TooLarge {
                        size_kb: received.get() / 1024,
                        limit_kb: self.max_size_kb,
                    })
                } else {
                    Err(FetchError::Git(error))
                }
            }
        }
    }
}

impl SourceFetcher for GitFetcher {
    fn ensure_local(
        &self,
        project: &ProjectReference,
        cancel: &CancelFlag,
    ) -> Result<WorkingCopy, FetchError> {
        let fullname = project.fullname();
        let target = self.local_path(project);

        let lock = self.lock_for(&fullname);
        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if GitRepository::exists_at(&target) {
            debug!(project = %fullname, path = %target.display(), "Working copy already present");
            return Ok(WorkingCopy::new(fullname, target));
        }

        if project.size > self.max_size_kb {
            return Err(FetchError::TooLarge {
                size_kb: project.size,
                limit_kb: self.max_size_kb,
            });
        }
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        info!(project = %fullname, origin = %project.origin_url, "Cloning project");
        self.clone_into(project, &target, cancel)?;

        Ok(WorkingCopy::new(fullname, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(size: u64) -> ProjectReference {
        ProjectReference {
            owner: "octo".to_string(),
            name: "hello".to_string(),
            origin_url: "/nonexistent/origin".to_string(),
            size,
        }
    }

    #[test]
    fn refuses_oversized_projects_before_cloning() {
        let store = TempDir::new().unwrap();
        let fetcher = GitFetcher::new(store.path(), 100);

        let result = fetcher.ensure_local(&project(101), &CancelFlag::new());

        assert!(matches!(
            result,
            Err(FetchError::TooLarge { size_kb: 101, limit_kb: 100 })
        ));
        assert!(!fetcher.exists_locally(&project(101)));
    }

    #[test]
    fn skips_clone_when_present() {
        let store = TempDir::new().unwrap();
        let fetcher = GitFetcher::new(store.path(), 100);
        let path = fetcher.local_path(&project(1));
        std::fs::create_dir_all(&path).unwrap();
        git2::Repository::init(&path).unwrap();

        // Oversized and unreachable, yet fine because nothing is fetched.
        let copy = fetcher.ensure_local(&project(10_000), &CancelFlag::new()).unwrap();

        assert_eq!(copy.path, path);
        assert_eq!(copy.fullname, "octo/hello");
    }

    #[test]
    fn cancelled_before_start_does_not_clone() {
        let store = TempDir::new().unwrap();
        let fetcher = GitFetcher::new(store.path(), 100);
        let cancel = CancelFlag::new();
        cancel.cancel();

        let result = fetcher.ensure_local(&project(1), &cancel);

        assert!(matches!(result, Err(FetchError::Cancelled)));
    }

    #[test]
    fn unreachable_origin_is_a_git_error() {
        let store = TempDir::new().unwrap();
        let fetcher = GitFetcher::new(store.path(), 100);

        let result = fetcher.ensure_local(&project(1), &CancelFlag::new());

        assert!(matches!(result, Err(FetchError::Git(_))));
        assert_eq!(leftovers(&store.path().join("octo")), Vec::<String>::new());
    }

    fn leftovers(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn origin_with_commit(dir: &Path) -> String {
        let repo = git2::Repository::init(dir).unwrap();
        fs::write(dir.join("main.rb"), "puts 1\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("main.rb")).unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let signature = git2::Signature::now("Alice", "alice@example.com").unwrap();
        repo.commit(Some("HEAD"), &signature, &signature, "init", &tree, &[])
            .unwrap();
        dir.display().to_string()
    }

    #[test]
    fn fetchers_sharing_a_store_clone_once() {
        let origin = TempDir::new().unwrap();
        let store = TempDir::new().unwrap();
        let reference = ProjectReference {
            origin_url: origin_with_commit(origin.path()),
            ..project(1)
        };
        // Separate fetchers share no locks, like two processes would.
        let first = GitFetcher::new(store.path(), 1_000);
        let second = GitFetcher::new(store.path(), 1_000);

        let (a, b) = std::thread::scope(|scope| {
            let a = scope.spawn(|| first.ensure_local(&reference, &CancelFlag::new()));
            let b = scope.spawn(|| second.ensure_local(&reference, &CancelFlag::new()));
            (a.join().unwrap(), b.join().unwrap())
        });

        assert_eq!(a.unwrap().path, first.local_path(&reference));
        assert_eq!(b.unwrap().path, second.local_path(&reference));
        assert!(first.local_path(&reference).join("main.rb").is_file());
        assert_eq!(leftovers(&store.path().join("octo")), ["hello"]);
    }

    #[test]
    fn staging_directory_sits_beside_dotted_targets() {
        let origin = TempDir::new().unwrap();
        let store = TempDir::new().unwrap();
        let reference = ProjectReference {
            name: "hello.js".to_string(),
            origin_url: origin_with_commit(origin.path()),
            ..project(1)
        };
        let fetcher = GitFetcher::new(store.path(), 1_000);

        let copy = fetcher.ensure_local(&reference, &CancelFlag::new()).unwrap();

        assert_eq!(copy.path, store.path().join("octo/hello.js"));
        assert_eq!(leftovers(&store.path().join("octo")), ["hello.js"]);
    }
}
