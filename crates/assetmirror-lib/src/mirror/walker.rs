use super::cancel::CancellationHandle;
use super::remap::download_task;
use super::types::{MirrorFailure, MirrorReport, MirrorRequest};
use crate::config::DEFAULT_PARALLELISM;
use crate::fetch::{AssetFetcher, DownloadTask, FetchReport};
use crate::listing::{ListingError, ListingSource, RemoteEntry};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

enum Job {
    List { subdir: String },
    Fetch(DownloadTask),
}

enum JobOutcome {
    Listed {
        subdir: String,
        entries: Vec<RemoteEntry>,
    },
    Fetched(FetchReport),
    Skipped,
    Failed(MirrorFailure),
}

/// Mirrors a remote directory tree into a local directory.
///
/// Listings and downloads run as independent jobs, at most `parallelism` at a time. A
/// directory's children are only scheduled once its listing has returned. A failed listing
/// or download is recorded and only affects its own branch or file.
pub struct RemoteTreeWalker<L> {
    listing: L,
    fetcher: AssetFetcher,
    parallelism: usize,
    cancellation: CancellationHandle,
}

impl<L: ListingSource> RemoteTreeWalker<L> {
    pub fn new(listing: L, fetcher: AssetFetcher) -> Self {
        Self {
            listing,
            fetcher,
            parallelism: DEFAULT_PARALLELISM,
            cancellation: CancellationHandle::new(),
        }
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationHandle) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn fetcher(&self) -> &AssetFetcher {
        &self.fetcher
    }

    pub fn cancellation(&self) -> &CancellationHandle {
        &self.cancellation
    }

    pub async fn mirror(&self, request: &MirrorRequest) -> MirrorReport {
        info!(
            repository = %request.repository,
            remote = %request.remote_subdir,
            local = %request.local_root.display(),
            "Mirroring"
        );

        let permits = Semaphore::new(self.parallelism);
        let mut report = MirrorReport::default();
        let mut jobs = FuturesUnordered::new();

        jobs.push(self.run_job(
            request,
            Job::List {
                subdir: request.remote_subdir.clone(),
            },
            &permits,
        ));

        while let Some(outcome) = jobs.next().await {
            match outcome {
                JobOutcome::Listed { subdir, entries } => {
                    debug!(subdir = %subdir, entries = entries.len(), "Scheduling children");
                    report.directories_listed += 1;

                    for entry in entries {
                        let job = match &entry.download_url {
                            // A directory listing itself would recurse forever.
                            None if entry.path.trim_matches('/') == subdir => {
                                let failure = MirrorFailure::Listing {
                                    subdir: subdir.clone(),
                                    source: ListingError::NotADirectory { path: entry.path },
                                };
                                warn!("{}", failure);
                                report.failures.push(failure);
                                continue;
                            }
                            None => Job::List { subdir: entry.path },
                            Some(url) => match download_task(&entry.path, url, request) {
                                Ok(task) => Job::Fetch(task),
                                Err(source) => {
                                    warn!(path = %entry.path, "Skipping entry: {}", source);
                                    report.failures.push(MirrorFailure::Remap {
                                        path: entry.path,
                                        source,
                                    });
                                    continue;
                                }
                            },
                        };
                        jobs.push(self.run_job(request, job, &permits));
                    }
                }
                JobOutcome::Fetched(fetched) => report.record_fetch(fetched),
                JobOutcome::Skipped => report.skipped += 1,
                JobOutcome::Failed(failure) => {
                    warn!("{}", failure);
                    report.failures.push(failure);
                }
            }
        }

        info!(
            repository = %request.repository,
            files = report.files.len(),
            bytes = report.bytes,
            failures = report.failures.len(),
            skipped = report.skipped,
            "Mirror finished"
        );
        report
    }

    async fn run_job(&self, request: &MirrorRequest, job: Job, permits: &Semaphore) -> JobOutcome {
        let Ok(_permit) = permits.acquire().await else {
            return JobOutcome::Skipped;
        };
        // In-flight jobs are never interrupted; only those not yet started are dropped.
        if self.cancellation.is_cancelled() {
            return JobOutcome::Skipped;
        }

        match job {
            Job::List { subdir } => {
                match self
                    .listing
                    .list(&request.repository, request.git_ref.as_deref(), &subdir)
                    .await
                {
                    Ok(entries) => JobOutcome::Listed { subdir, entries },
                    Err(source) => JobOutcome::Failed(MirrorFailure::Listing { subdir, source }),
                }
            }
            Job::Fetch(task) => match self.fetcher.run(&task).await {
                Ok(fetched) => JobOutcome::Fetched(fetched),
                Err(source) => JobOutcome::Failed(MirrorFailure::Fetch {
                    url: task.source_url,
                    source,
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchOptions;
    use crate::listing::RepositoryId;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves a fixed tree of directories; unknown paths fail like a 404 would.
    struct StaticListing {
        dirs: HashMap<String, Vec<RemoteEntry>>,
        calls: Mutex<Vec<String>>,
    }

    impl StaticListing {
        fn new(dirs: &[(&str, Vec<RemoteEntry>)]) -> Self {
            Self {
                dirs: dirs
                    .iter()
                    .map(|(path, entries)| (path.to_string(), entries.clone()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl ListingSource for StaticListing {
        async fn list(
            &self,
            _repository: &RepositoryId,
            _git_ref: Option<&str>,
            path: &str,
        ) -> Result<Vec<RemoteEntry>, ListingError> {
            self.calls.lock().unwrap().push(path.to_string());
            self.dirs
                .get(path)
                .cloned()
                .ok_or_else(|| ListingError::Malformed {
                    url: reqwest::Url::parse("http://listing.invalid/").unwrap(),
                    reason: format!("no such directory {path}"),
                })
        }
    }

    fn walker(listing: StaticListing) -> RemoteTreeWalker<StaticListing> {
        RemoteTreeWalker::new(listing, AssetFetcher::new(FetchOptions::default()).unwrap())
    }

    fn request() -> MirrorRequest {
        MirrorRequest::new("org/repo".parse().unwrap(), "2.0/Sample", "unused")
    }

    #[tokio::test]
    async fn test_empty_listing_writes_nothing() {
        let walker = walker(StaticListing::new(&[("2.0/Sample", vec![])]));

        let report = walker.mirror(&request()).await;

        assert!(report.is_complete());
        assert!(report.files.is_empty());
        assert_eq!(report.directories_listed, 1);
    }

    #[tokio::test]
    async fn test_listing_failure_only_fails_its_branch() {
        let walker = walker(StaticListing::new(&[
            (
                "2.0/Sample",
                vec![
                    RemoteEntry::directory("2.0/Sample/broken"),
                    RemoteEntry::directory("2.0/Sample/textures"),
                ],
            ),
            (
                "2.0/Sample/textures",
                vec![RemoteEntry::directory("2.0/Sample/textures/empty")],
            ),
            ("2.0/Sample/textures/empty", vec![]),
        ]));

        let report = walker.mirror(&request()).await;

        assert_eq!(report.directories_listed, 3);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            &report.failures[0],
            MirrorFailure::Listing { subdir, .. } if subdir == "2.0/Sample/broken"
        ));
    }

    #[tokio::test]
    async fn test_children_listed_after_parent() {
        let walker = walker(StaticListing::new(&[
            ("2.0/Sample", vec![RemoteEntry::directory("2.0/Sample/a")]),
            ("2.0/Sample/a", vec![RemoteEntry::directory("2.0/Sample/a/b")]),
            ("2.0/Sample/a/b", vec![]),
        ]))
        .with_parallelism(4);

        walker.mirror(&request()).await;

        let calls = walker.listing.calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["2.0/Sample", "2.0/Sample/a", "2.0/Sample/a/b"]);
    }

    #[tokio::test]
    async fn test_entry_outside_root_is_reported() {
        let url = reqwest::Url::parse("http://raw.invalid/other/model.gltf").unwrap();
        let walker = walker(StaticListing::new(&[(
            "2.0/Sample",
            vec![RemoteEntry::file("other/model.gltf", url)],
        )]));

        let report = walker.mirror(&request()).await;

        assert!(report.files.is_empty());
        assert!(matches!(
            &report.failures[0],
            MirrorFailure::Remap { path, .. } if path == "other/model.gltf"
        ));
    }

    #[tokio::test]
    async fn test_self_referencing_entry_is_not_relisted() {
        let walker = walker(StaticListing::new(&[
            (
                "2.0/Sample",
                vec![
                    RemoteEntry::directory("2.0/Sample/vendored"),
                    RemoteEntry::directory("2.0/Sample/textures"),
                ],
            ),
            (
                "2.0/Sample/vendored",
                vec![RemoteEntry::directory("2.0/Sample/vendored")],
            ),
            ("2.0/Sample/textures", vec![]),
        ]));

        let report = walker.mirror(&request()).await;

        let mut calls = walker.listing.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(
            calls,
            vec!["2.0/Sample", "2.0/Sample/textures", "2.0/Sample/vendored"]
        );
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            &report.failures[0],
            MirrorFailure::Listing {
                subdir,
                source: ListingError::NotADirectory { .. },
            } if subdir == "2.0/Sample/vendored"
        ));
    }

    #[tokio::test]
    async fn test_cancelled_walk_skips_everything() {
        let walker = walker(StaticListing::new(&[("2.0/Sample", vec![])]));
        walker.cancellation().cancel();

        let report = walker.mirror(&request()).await;

        assert_eq!(report.skipped, 1);
        assert_eq!(report.directories_listed, 0);
        assert!(!report.is_complete());
        assert!(walker.listing.calls.lock().unwrap().is_empty());
    }
}
