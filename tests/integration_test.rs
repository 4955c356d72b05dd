use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use codepraise::cli::appraise::build_service;
use codepraise::config::Settings;
use codepraise::contributions::LanguageRegistry;
use codepraise::git::{GitBlameReader, GitFetcher};
use codepraise::service::{ApiResult, AppraisalRequest, AppraiseProject, Status};
use codepraise::store::ProjectCatalog;
use git2::{Repository, Signature};
use tempfile::TempDir;

/// A throwaway origin repository plus a catalog and clone store beside it.
struct TestRepo {
    temp_dir: TempDir,
    origin_path: PathBuf,
    repo: Repository,
}

impl TestRepo {
    fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let origin_path = temp_dir.path().join("origin");
        fs::create_dir_all(&origin_path)?;
        let repo = Repository::init(&origin_path)?;

        Ok(TestRepo {
            temp_dir,
            origin_path,
            repo,
        })
    }

    /// Writes `files` and commits them with `name <email>` as author.
    fn commit_as(&self, name: &str, email: &str, files: &[(&str, &str)]) -> Result<git2::Oid> {
        let mut index = self.repo.index()?;
        for (path, content) in files {
            let full_path = self.origin_path.join(path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&full_path, content)?;
            index.add_path(Path::new(path))?;
        }
        index.write()?;

        let signature = Signature::now(name, email)?;
        let tree = self.repo.find_tree(index.write_tree()?)?;
        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        Ok(self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            "update",
            &tree,
            &parents,
        )?)
    }

    /// Commits `files` under an author line written byte for byte, for
    /// names `Signature` cannot express.
    fn commit_raw_author(&self, author: &[u8], files: &[(&str, &str)]) -> Result<git2::Oid> {
        let mut index = self.repo.index()?;
        for (path, content) in files {
            let full_path = self.origin_path.join(path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&full_path, content)?;
            index.add_path(Path::new(path))?;
        }
        index.write()?;
        let tree = index.write_tree()?;

        let mut raw = format!("tree {tree}\n").into_bytes();
        if let Ok(head) = self.repo.head() {
            raw.extend(format!("parent {}\n", head.peel_to_commit()?.id()).bytes());
        }
        for role in ["author", "committer"] {
            raw.extend(format!("{role} ").bytes());
            raw.extend(author);
            raw.extend(b" 1700000000 +0000\n");
        }
        raw.extend(b"\nupdate\n");

        let oid = self.repo.odb()?.write(git2::ObjectType::Commit, &raw)?;
        match self.repo.head() {
            Ok(mut head) => {
                head.set_target(oid, "raw commit")?;
            }
            Err(_) => {
                self.repo.reference("refs/heads/main", oid, true, "raw commit")?;
                self.repo.set_head("refs/heads/main")?;
            }
        }
        Ok(oid)
    }

    /// Two authors, one of them committing under two names.
    fn with_history() -> Result<Self> {
        let repo = Self::new()?;
        repo.commit_as(
            "Alice",
            "alice@example.com",
            &[
                ("app/main.rb", "def hello\n  # greet\n  puts 'hi'\nend\n"),
                ("README.md", "# Demo\n\nA demo project\n"),
                ("notes.txt", "not counted\n"),
            ],
        )?;
        repo.commit_as(
            "Bob",
            "bob@example.com",
            &[
                ("app/main.rb", "def hello\n  # greet\n  puts 'hello'\nend\n"),
                ("lib/util.rb", "def util\n  42\nend\n"),
            ],
        )?;
        repo.commit_as("Alice W", "alice@example.com", &[("lib/extra.rb", "x = 1\n")])?;
        Ok(repo)
    }

    fn catalog_path(&self) -> PathBuf {
        self.temp_dir.path().join("projects.yml")
    }

    fn repostore(&self) -> PathBuf {
        self.temp_dir.path().join("repostore")
    }

    fn write_catalog(&self, size_kb: u64) -> Result<()> {
        let catalog = format!(
            "projects:\n  - owner: octo\n    name: demo\n    origin_url: {}\n    size: {size_kb}\n",
            self.origin_path.display()
        );
        fs::write(self.catalog_path(), catalog)?;
        Ok(())
    }

    fn service(&self, max_size_kb: u64, ignore: &[String]) -> Result<AppraiseProject> {
        let reader = Arc::new(GitBlameReader::with_ignore(ignore)?);
        Ok(AppraiseProject::new(
            Arc::new(ProjectCatalog::new(self.catalog_path())),
            Arc::new(GitFetcher::new(self.repostore(), max_size_kb)),
            reader.clone(),
            reader,
            Arc::new(LanguageRegistry::with_defaults()?),
        ))
    }
}

fn credits_of(result: &ApiResult) -> Vec<(String, u64)> {
    result
        .contributions()
        .expect("appraisal")
        .credits
        .iter()
        .map(|c| (c.username.clone(), c.credits))
        .collect()
}

#[tokio::test]
async fn appraises_whole_project() -> Result<()> {
    let repo = TestRepo::with_history()?;
    repo.write_catalog(10)?;
    let service = repo.service(1_000, &[])?;

    let result = service.appraise(&AppraisalRequest::new("octo", "demo", "")).await;

    assert_eq!(result.status, Status::Ok);
    let appraisal = result.contributions().expect("appraisal");
    assert_eq!(appraisal.total_credits, 9);
    assert_eq!(
        credits_of(&result),
        [("Alice".to_string(), 5), ("Bob".to_string(), 4)]
    );
    assert!(repo.repostore().join("octo/demo/.git").is_dir());
    Ok(())
}

#[tokio::test]
async fn appraises_subfolder() -> Result<()> {
    let repo = TestRepo::with_history()?;
    repo.write_catalog(10)?;
    let service = repo.service(1_000, &[])?;

    let result = service
        .appraise(&AppraisalRequest::new("octo", "demo", "lib"))
        .await;

    let appraisal = result.contributions().expect("appraisal");
    assert_eq!(appraisal.folder, "lib");
    assert_eq!(appraisal.total_credits, 4);
    assert_eq!(
        credits_of(&result),
        [("Bob".to_string(), 3), ("Alice W".to_string(), 1)]
    );
    Ok(())
}

#[tokio::test]
async fn second_appraisal_reuses_the_clone() -> Result<()> {
    let repo = TestRepo::with_history()?;
    repo.write_catalog(10)?;
    let service = repo.service(1_000, &[])?;
    let request = AppraisalRequest::new("octo", "demo", "app");

    let first = service.appraise(&request).await;
    // Remove the origin: a second clone attempt would now fail.
    fs::remove_dir_all(&repo.origin_path)?;
    let second = service.appraise(&request).await;

    assert_eq!(first, second);
    assert_eq!(credits_of(&second), [("Alice".to_string(), 2), ("Bob".to_string(), 1)]);
    Ok(())
}

#[tokio::test]
async fn ignore_patterns_drop_files() -> Result<()> {
    let repo = TestRepo::with_history()?;
    repo.write_catalog(10)?;
    let service = repo.service(1_000, &["**/extra.rb".to_string()])?;

    let result = service.appraise(&AppraisalRequest::new("octo", "demo", "/")).await;

    assert_eq!(result.contributions().expect("appraisal").total_credits, 8);
    Ok(())
}

#[tokio::test]
async fn missing_folder_is_not_found() -> Result<()> {
    let repo = TestRepo::with_history()?;
    repo.write_catalog(10)?;
    let service = repo.service(1_000, &[])?;

    let result = service
        .appraise(&AppraisalRequest::new("octo", "demo", "docs"))
        .await;

    assert_eq!(
        result,
        ApiResult::text(Status::NotFound, "Could not find that folder")
    );
    Ok(())
}

#[tokio::test]
async fn oversized_project_is_forbidden_and_not_cloned() -> Result<()> {
    let repo = TestRepo::with_history()?;
    repo.write_catalog(5_000)?;
    let service = repo.service(1_000, &[])?;

    let result = service.appraise(&AppraisalRequest::new("octo", "demo", "")).await;

    assert_eq!(result.status, Status::Forbidden);
    assert!(!repo.repostore().join("octo/demo").exists());
    Ok(())
}

#[tokio::test]
async fn uncatalogued_project_is_not_found() -> Result<()> {
    let repo = TestRepo::with_history()?;
    repo.write_catalog(10)?;
    let service = repo.service(1_000, &[])?;

    let result = service
        .appraise(&AppraisalRequest::new("octo", "other", ""))
        .await;

    assert_eq!(result, ApiResult::text(Status::NotFound, "Project not found"));
    Ok(())
}

#[tokio::test]
async fn service_built_from_settings() -> Result<()> {
    let repo = TestRepo::with_history()?;
    repo.write_catalog(10)?;
    let settings = Settings {
        repostore: Some(repo.repostore()),
        catalog: Some(repo.catalog_path()),
        max_clone_size_kb: Some(1_000),
        ..Settings::default()
    };

    let service = build_service(&settings)?;
    let result = service.appraise(&AppraisalRequest::parse("octo/demo/app")?).await;

    assert_eq!(result.contributions().expect("appraisal").total_credits, 3);
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn symlinks_are_not_blamed() -> Result<()> {
    let repo = TestRepo::with_history()?;
    fs::create_dir_all(repo.origin_path.join("docs"))?;
    std::os::unix::fs::symlink("../README.md", repo.origin_path.join("docs/README.md"))?;
    repo.commit_as("Carol", "carol@example.com", &[("docs/intro.md", "Intro\n")])?;
    let mut index = repo.repo.index()?;
    index.add_path(Path::new("docs/README.md"))?;
    index.write()?;
    repo.commit_as("Carol", "carol@example.com", &[])?;
    repo.write_catalog(10)?;
    let service = repo.service(1_000, &[])?;

    let root = service.appraise(&AppraisalRequest::new("octo", "demo", "")).await;
    let docs = service
        .appraise(&AppraisalRequest::new("octo", "demo", "docs"))
        .await;

    assert_eq!(root.status, Status::Ok);
    assert_eq!(root.contributions().expect("appraisal").total_credits, 10);
    assert_eq!(credits_of(&docs), [("Carol".to_string(), 1)]);
    Ok(())
}

#[tokio::test]
async fn non_utf8_author_names_are_kept() -> Result<()> {
    let repo = TestRepo::new()?;
    repo.commit_raw_author(
        b"Ren\xe9 <rene@example.com>",
        &[("lib/latin.rb", "a = 1\nb = 2\n")],
    )?;
    repo.commit_as("Bob", "bob@example.com", &[("lib/other.rb", "c = 3\n")])?;
    repo.write_catalog(10)?;
    let service = repo.service(1_000, &[])?;

    let result = service.appraise(&AppraisalRequest::new("octo", "demo", "lib")).await;

    assert_eq!(
        credits_of(&result),
        [("Ren\u{FFFD}".to_string(), 2), ("Bob".to_string(), 1)]
    );
    let appraisal = result.contributions().expect("appraisal");
    assert_eq!(appraisal.credits[0].email, "rene@example.com");
    Ok(())
}

#[tokio::test]
async fn concurrent_services_share_one_clone() -> Result<()> {
    let repo = TestRepo::with_history()?;
    repo.write_catalog(10)?;
    // Separate services hold separate fetchers, as two processes would.
    let first = repo.service(1_000, &[])?;
    let second = repo.service(1_000, &[])?;
    let request = AppraisalRequest::new("octo", "demo", "");

    let (a, b) = tokio::join!(first.appraise(&request), second.appraise(&request));

    assert_eq!(a.status, Status::Ok);
    assert_eq!(a, b);
    let mut entries: Vec<String> = fs::read_dir(repo.repostore().join("octo"))?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    entries.sort();
    assert_eq!(entries, ["demo"]);
    Ok(())
}
