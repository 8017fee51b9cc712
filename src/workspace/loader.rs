//! Bulk upload of a workspace's source tree to the indexing endpoint.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use super::references::{FILE_SCHEME, is_eligible, read_text};
use crate::api::RemoteService;
use crate::api::public::UploadFileRequest;
use crate::chat::ChatResponseStream;
use crate::core::AppConfig;

/// Which files in a workspace are eligible for bulk loading.
#[derive(Clone, Debug)]
pub struct FileMatcher {
    include: GlobSet,
    exclude: GlobSet,
    exclude_dirs: Vec<String>,
    extensions: Vec<String>,
}

impl FileMatcher {
    pub fn new(include_extensions: &[String], exclude_dirs: &[String]) -> Result<Self> {
        let extensions: Vec<String> = include_extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_string())
            .filter(|e| !e.is_empty())
            .collect();

        let mut include = GlobSetBuilder::new();
        if !extensions.is_empty() {
            include.add(Glob::new(&format!("**/*.{{{}}}", extensions.join(",")))?);
        }

        let mut exclude = GlobSetBuilder::new();
        for dir in exclude_dirs {
            exclude.add(Glob::new(&format!("**/{}/**", dir))?);
        }

        Ok(Self {
            include: include.build()?,
            exclude: exclude.build()?,
            exclude_dirs: exclude_dirs.to_vec(),
            extensions,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.include_extensions, &config.exclude_dirs)
    }

    /// `relative_path` is relative to the workspace root.
    pub fn is_match(&self, relative_path: &str) -> bool {
        let name = relative_path.rsplit('/').next().unwrap_or(relative_path);
        self.include.is_match(relative_path)
            && !self.exclude.is_match(relative_path)
            && is_eligible(FILE_SCHEME, name)
    }

    fn is_excluded_dir(&self, name: &str) -> bool {
        self.exclude_dirs.iter().any(|d| d == name)
    }

    /// Human readable list of the extensions being loaded e.g. `.py or .md`
    pub fn describe(&self) -> String {
        self.extensions
            .iter()
            .map(|e| format!(".{}", e))
            .collect::<Vec<_>>()
            .join(" or ")
    }

    /// Walk `root` and return every matching file, sorted by path.
    /// Excluded directories are never descended into.
    pub fn find_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !self.is_excluded_dir(&entry.file_name().to_string_lossy())
            })
            .filter_map(|entry| {
                entry
                    .inspect_err(|e| tracing::warn!("Skipping unreadable entry: {}", e))
                    .ok()
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.is_match(&relative_path(root, path)))
            .collect();
        files.sort();
        files
    }
}

/// Path of `path` relative to `root` using `/` separators.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Clone, Debug, PartialEq)]
pub enum UploadOutcome {
    Succeeded,
    /// The service rejected the upload or couldn't be reached
    FailedRemote(String),
    /// The file couldn't be read
    FailedLocal(String),
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Succeeded)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FileOutcome {
    pub path: String,
    pub outcome: UploadOutcome,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded_count: usize,
    pub failed_count: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[FileOutcome]) -> Self {
        let succeeded_count = outcomes.iter().filter(|o| o.outcome.is_success()).count();
        Self {
            total: outcomes.len(),
            succeeded_count,
            failed_count: outcomes.len() - succeeded_count,
        }
    }
}

/// Result of one bulk load. `skipped` counts files that never started
/// uploading because the batch was cancelled.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
    pub outcomes: Vec<FileOutcome>,
    pub summary: BatchSummary,
    pub skipped: usize,
}

impl LoadReport {
    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "**Summary:**\n- ✅ Successfully loaded: {}\n- ⚠️ Failed to load: {}\n- 📊 Total files loaded: {}",
            self.summary.succeeded_count, self.summary.failed_count, self.summary.total
        );
        if self.skipped > 0 {
            out.push_str(&format!("\n- ⏹️ Skipped after cancellation: {}", self.skipped));
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LoadStatus {
    NoWorkspace,
    NoFilesFound,
    Completed(LoadReport),
}

/// Uploads eligible workspace files through a bounded pool of
/// workers. A failing file never affects the others.
pub struct BulkLoader {
    service: Arc<dyn RemoteService>,
    matcher: FileMatcher,
    max_concurrency: usize,
}

impl BulkLoader {
    pub fn new(service: Arc<dyn RemoteService>, matcher: FileMatcher, max_concurrency: usize) -> Self {
        Self {
            service,
            matcher,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn from_config(service: Arc<dyn RemoteService>, config: &AppConfig) -> Result<Self> {
        let matcher = FileMatcher::from_config(config)?;
        Ok(Self::new(service, matcher, config.max_concurrency))
    }

    /// Load every eligible file under `workspace_root` into the
    /// codebase named `codebase_name`, reporting progress and a final
    /// summary on `stream`.
    pub async fn load_workspace(
        &self,
        workspace_root: Option<&Path>,
        codebase_name: &str,
        stream: &ChatResponseStream,
        token: &CancellationToken,
    ) -> Result<LoadStatus> {
        let Some(root) = workspace_root else {
            stream.markdown("❌ No workspace folder open.");
            return Ok(LoadStatus::NoWorkspace);
        };

        stream.progress(format!("📂 Loading files for codebase: **{}**", codebase_name));

        let matcher = self.matcher.clone();
        let walk_root = root.to_path_buf();
        let files = tokio::task::spawn_blocking(move || matcher.find_files(&walk_root))
            .await
            .map_err(|e| anyhow!("Listing workspace files failed: {}", e))?;

        if files.is_empty() {
            stream.markdown(format!(
                "⚠️ No {} files found in the workspace.",
                self.matcher.describe()
            ));
            return Ok(LoadStatus::NoFilesFound);
        }

        tracing::info!(
            "Loading {} files from {} into {}",
            files.len(),
            root.display(),
            codebase_name
        );

        let report = self
            .upload_files(root, codebase_name, files, stream, token)
            .await;
        stream.markdown(report.to_markdown());

        Ok(LoadStatus::Completed(report))
    }

    /// Upload `files` concurrently and wait for every started upload
    /// to settle. Cancellation is checked before each upload starts,
    /// uploads already in flight always run to completion.
    pub async fn upload_files(
        &self,
        root: &Path,
        codebase_name: &str,
        files: Vec<PathBuf>,
        stream: &ChatResponseStream,
        token: &CancellationToken,
    ) -> LoadReport {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for path in files {
            let rel_path = relative_path(root, &path);
            let service = self.service.clone();
            let semaphore = semaphore.clone();
            let token = token.clone();
            let codebase_name = codebase_name.to_string();

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (rel_path, None);
                };
                if token.is_cancelled() {
                    return (rel_path, None);
                }
                // A panicking upload still reports against its own file
                let name = rel_path.clone();
                let upload = tokio::spawn(async move {
                    upload_one(service.as_ref(), &codebase_name, &path, &name).await
                });
                let outcome = match upload.await {
                    Ok(outcome) => outcome,
                    Err(e) => UploadOutcome::FailedLocal(format!("upload task failed: {}", e)),
                };
                (rel_path, Some(outcome))
            });
        }

        // Outcomes are only ever recorded here, one per finished task
        let mut outcomes = Vec::new();
        let mut skipped = 0;
        while let Some(res) = tasks.join_next().await {
            match res {
                Ok((path, Some(outcome))) => {
                    match &outcome {
                        UploadOutcome::Succeeded => {
                            tracing::info!("Loaded {}", path);
                            stream.progress(format!("✅ Successfully loaded *{}*", path));
                        }
                        UploadOutcome::FailedRemote(msg) => {
                            tracing::warn!("Failed to load {}: {}", path, msg);
                            stream.progress(format!("⚠️ Failed to load *{}*: {}", path, msg));
                        }
                        UploadOutcome::FailedLocal(msg) => {
                            tracing::warn!("Error loading {}: {}", path, msg);
                            stream.progress(format!("⚠️ Error loading *{}*: {}", path, msg));
                        }
                    }
                    outcomes.push(FileOutcome { path, outcome });
                }
                Ok((path, None)) => {
                    tracing::debug!("Skipped {} after cancellation", path);
                    skipped += 1;
                }
                Err(e) => {
                    tracing::error!("Upload task failed: {}", e);
                    outcomes.push(FileOutcome {
                        path: String::from("<unknown>"),
                        outcome: UploadOutcome::FailedLocal(e.to_string()),
                    });
                }
            }
        }

        if skipped > 0 {
            tracing::info!("Bulk load cancelled, {} files not started", skipped);
        }

        let summary = BatchSummary::from_outcomes(&outcomes);
        LoadReport {
            outcomes,
            summary,
            skipped,
        }
    }
}

async fn upload_one(
    service: &dyn RemoteService,
    codebase_name: &str,
    path: &Path,
    rel_path: &str,
) -> UploadOutcome {
    let file_content = match read_text(path).await {
        Ok(content) => content,
        Err(e) => return UploadOutcome::FailedLocal(format!("{:#}", e)),
    };

    let req = UploadFileRequest {
        codebase_name: codebase_name.to_string(),
        file_path: rel_path.to_string(),
        file_content,
    };
    match service.upload_file(&req).await {
        Ok(()) => UploadOutcome::Succeeded,
        Err(e) => UploadOutcome::FailedRemote(e.message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::api::ApiClientError;
    use crate::api::public::{ChatRequestPayload, ChatResponsePayload};
    use crate::chat::{StreamPart, collect_parts};

    /// Records uploads and fails any file whose path contains "bad".
    /// Panics on any file whose path contains "boom".
    /// Optionally cancels the token once the first upload arrives.
    #[derive(Default)]
    struct FakeService {
        calls: AtomicUsize,
        uploaded: Mutex<Vec<String>>,
        cancel_on_first: Option<CancellationToken>,
    }

    #[async_trait]
    impl RemoteService for FakeService {
        async fn send_chat(
            &self,
            _payload: &ChatRequestPayload,
        ) -> Result<ChatResponsePayload, ApiClientError> {
            unreachable!("bulk loading never chats")
        }

        async fn upload_file(&self, req: &UploadFileRequest) -> Result<(), ApiClientError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0
                && let Some(token) = &self.cancel_on_first
            {
                token.cancel();
            }
            // Later files finish first to shake up completion order
            let delay = 20u64.saturating_sub(5 * n as u64);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if req.file_path.contains("boom") {
                panic!("upload of {} blew up", req.file_path);
            }
            self.uploaded.lock().unwrap().push(req.file_path.clone());
            if req.file_path.contains("bad") {
                return Err(ApiClientError::Api {
                    status: 500,
                    message: Some(String::from("disk full")),
                });
            }
            Ok(())
        }
    }

    fn default_matcher() -> FileMatcher {
        FileMatcher::new(
            &[String::from("py"), String::from("md")],
            &[String::from("node_modules"), String::from(".venv")],
        )
        .unwrap()
    }

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_matcher_includes_and_excludes() {
        let matcher = default_matcher();
        assert!(matcher.is_match("main.py"));
        assert!(matcher.is_match("docs/README.md"));
        assert!(!matcher.is_match("main.rs"));
        assert!(!matcher.is_match("node_modules/pkg/index.md"));
        assert!(!matcher.is_match("app/.venv/lib/site.py"));
        assert!(!matcher.is_match(".github/copilot-instructions.md"));
        assert_eq!(matcher.describe(), ".py or .md");
    }

    #[test]
    fn test_matcher_without_extensions_matches_nothing() {
        let matcher = FileMatcher::new(&[], &[]).unwrap();
        assert!(!matcher.is_match("main.py"));
    }

    #[test]
    fn test_find_files_prunes_excluded_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "a.py", "");
        write(root, "pkg/b.md", "");
        write(root, "pkg/c.txt", "");
        write(root, "node_modules/d.py", "");
        write(root, ".venv/lib/e.py", "");

        let files: Vec<String> = default_matcher()
            .find_files(root)
            .iter()
            .map(|p| relative_path(root, p))
            .collect();
        assert_eq!(files, vec!["a.py", "pkg/b.md"]);
    }

    #[tokio::test]
    async fn test_upload_files_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let files = vec![
            write(root, "one.py", "1"),
            write(root, "bad.py", "2"),
            write(root, "three.md", "3"),
        ];
        let vanished = root.join("vanished.py");

        let service = Arc::new(FakeService::default());
        let loader = BulkLoader::new(service.clone(), default_matcher(), 4);
        let (stream, _rx) = ChatResponseStream::channel();
        let token = CancellationToken::new();

        let mut all = files.clone();
        all.push(vanished);
        let report = loader
            .upload_files(root, "demo", all, &stream, &token)
            .await;

        assert_eq!(
            report.summary,
            BatchSummary {
                total: 4,
                succeeded_count: 2,
                failed_count: 2
            }
        );
        assert_eq!(report.skipped, 0);

        let mut paths: Vec<&str> = report.outcomes.iter().map(|o| o.path.as_str()).collect();
        paths.sort();
        assert_eq!(paths, vec!["bad.py", "one.py", "three.md", "vanished.py"]);

        let bad = report.outcomes.iter().find(|o| o.path == "bad.py").unwrap();
        assert_eq!(bad.outcome, UploadOutcome::FailedRemote(String::from("disk full")));
        let vanished = report
            .outcomes
            .iter()
            .find(|o| o.path == "vanished.py")
            .unwrap();
        assert!(matches!(vanished.outcome, UploadOutcome::FailedLocal(_)));

        // The unreadable file never reached the service
        assert_eq!(service.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_panicking_upload_keeps_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let files = vec![write(root, "ok.py", "1"), write(root, "pkg/boom.py", "2")];

        let service = Arc::new(FakeService::default());
        let loader = BulkLoader::new(service.clone(), default_matcher(), 2);
        let (stream, mut rx) = ChatResponseStream::channel();
        let token = CancellationToken::new();

        let report = loader
            .upload_files(root, "demo", files, &stream, &token)
            .await;

        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.succeeded_count, 1);
        assert_eq!(report.summary.failed_count, 1);

        let boom = report
            .outcomes
            .iter()
            .find(|o| o.path == "pkg/boom.py")
            .unwrap();
        assert!(matches!(&boom.outcome, UploadOutcome::FailedLocal(msg) if msg.contains("upload task failed")));
        assert!(report.outcomes.iter().all(|o| o.path != "<unknown>"));

        let progress = collect_parts(&mut rx);
        assert!(progress.iter().any(|p| matches!(
            p,
            StreamPart::Progress(msg) if msg.starts_with("⚠️ Error loading *pkg/boom.py*")
        )));
    }

    #[tokio::test]
    async fn test_cancellation_stops_new_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let files: Vec<PathBuf> = (0..5)
            .map(|i| write(root, &format!("f{}.py", i), "x"))
            .collect();

        let token = CancellationToken::new();
        let service = Arc::new(FakeService {
            cancel_on_first: Some(token.clone()),
            ..Default::default()
        });
        let loader = BulkLoader::new(service.clone(), default_matcher(), 1);
        let (stream, _rx) = ChatResponseStream::channel();

        let report = loader
            .upload_files(root, "demo", files, &stream, &token)
            .await;

        // The upload that was in flight when cancelled still completes
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.uploaded.lock().unwrap().len(), 1);
        assert_eq!(report.summary.total, 1);
        assert_eq!(report.summary.succeeded_count, 1);
        assert_eq!(report.skipped, 4);
        assert!(report.to_markdown().contains("Skipped after cancellation: 4"));
    }

    #[tokio::test]
    async fn test_load_workspace_without_workspace() {
        let service = Arc::new(FakeService::default());
        let loader = BulkLoader::new(service.clone(), default_matcher(), 2);
        let (stream, mut rx) = ChatResponseStream::channel();

        let status = loader
            .load_workspace(None, "demo", &stream, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(status, LoadStatus::NoWorkspace);
        assert_eq!(
            collect_parts(&mut rx),
            vec![StreamPart::Markdown(String::from("❌ No workspace folder open."))]
        );
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_load_workspace_with_no_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.rs", "fn main() {}");

        let service = Arc::new(FakeService::default());
        let loader = BulkLoader::new(service.clone(), default_matcher(), 2);
        let (stream, mut rx) = ChatResponseStream::channel();

        let status = loader
            .load_workspace(Some(dir.path()), "demo", &stream, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(status, LoadStatus::NoFilesFound);
        let parts = collect_parts(&mut rx);
        assert_eq!(
            parts.last(),
            Some(&StreamPart::Markdown(String::from(
                "⚠️ No .py or .md files found in the workspace."
            )))
        );
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_load_workspace_reports_summary() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.py", "a");
        write(dir.path(), "docs/bad.md", "b");

        let service = Arc::new(FakeService::default());
        let loader = BulkLoader::new(service.clone(), default_matcher(), 2);
        let (stream, mut rx) = ChatResponseStream::channel();

        let status = loader
            .load_workspace(Some(dir.path()), "demo", &stream, &CancellationToken::new())
            .await
            .unwrap();

        let LoadStatus::Completed(report) = status else {
            panic!("Expected a completed load");
        };
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.failed_count, 1);

        let parts = collect_parts(&mut rx);
        assert_eq!(
            parts.first(),
            Some(&StreamPart::Progress(String::from(
                "📂 Loading files for codebase: **demo**"
            )))
        );
        assert!(parts.contains(&StreamPart::Progress(String::from(
            "⚠️ Failed to load *docs/bad.md*: disk full"
        ))));
        assert_eq!(
            parts.last(),
            Some(&StreamPart::Markdown(String::from(
                "**Summary:**\n- ✅ Successfully loaded: 1\n- ⚠️ Failed to load: 1\n- 📊 Total files loaded: 2"
            )))
        );
    }
}
