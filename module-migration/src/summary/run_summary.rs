//! Run summary types.

use super::result::ProcessingResult;
use crate::reconcile::{ChangeRequestStatus, Outcome};
use serde::Serialize;

/// Summary of a complete run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Number of repositories discovered.
    pub repositories_discovered: usize,

    /// Number of repositories processed successfully.
    pub succeeded: usize,

    /// Number of repositories skipped.
    pub skipped: usize,

    /// Number of repositories that failed.
    pub failed: usize,

    /// Number of files rewritten across all repositories.
    pub files_touched: usize,

    /// Number of branches pushed.
    pub pushed: usize,

    /// Number of repositories with nothing to commit.
    pub nothing_to_commit: usize,

    /// Number of change requests opened.
    pub change_requests_opened: usize,

    /// Number of change requests that failed to open.
    pub change_requests_failed: usize,

    /// Number of release tags created.
    pub releases_created: usize,

    /// Whether this was a dry run.
    pub dry_run: bool,

    /// Per-repository results, sorted by repository path.
    pub results: Vec<ProcessingResult>,
}

impl RunSummary {
    /// Creates a new empty summary.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Updates the summary with a processing result.
    pub fn record_result(&mut self, result: ProcessingResult) {
        match &result {
            ProcessingResult::Success { report, .. } => {
                self.succeeded += 1;
                self.files_touched += report.touched_files.len();
                if report.release.is_some() {
                    self.releases_created += 1;
                }
                match &report.outcome {
                    Some(Outcome::Pushed { change_request, .. }) => {
                        self.pushed += 1;
                        match change_request {
                            ChangeRequestStatus::Opened { .. } => self.change_requests_opened += 1,
                            ChangeRequestStatus::Failed { .. } => self.change_requests_failed += 1,
                            ChangeRequestStatus::Unavailable { .. } => {}
                        }
                    }
                    Some(Outcome::NothingToCommit { .. }) => self.nothing_to_commit += 1,
                    Some(Outcome::UrlOnly { .. }) | None => {}
                }
            }
            ProcessingResult::Skipped { .. } => self.skipped += 1,
            ProcessingResult::Failed { .. } => self.failed += 1,
        }

        let at = self
            .results
            .partition_point(|existing| existing.repository() < result.repository());
        self.results.insert(at, result);
    }

    /// Returns true if any repository failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Returns true if every repository was processed successfully.
    #[must_use]
    pub fn all_success(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }

    /// Returns the failed results.
    pub fn failures(&self) -> impl Iterator<Item = &ProcessingResult> {
        self.results
            .iter()
            .filter(|r| matches!(r, ProcessingResult::Failed { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{BranchDisposition, RemoteDisposition};
    use crate::summary::RepositoryReport;

    #[test]
    fn can_record_result() {
        let mut summary = RunSummary::new(false);

        summary.record_result(ProcessingResult::Success {
            repository: "/src/b".to_string(),
            report: RepositoryReport {
                outcome: Some(Outcome::Pushed {
                    remote: RemoteDisposition::AlreadyTarget,
                    branch: BranchDisposition::AlreadyCurrent,
                    change_request: ChangeRequestStatus::Opened {
                        url: Some("https://example.com/pull/1".to_string()),
                    },
                }),
                ..RepositoryReport::default()
            },
        });
        summary.record_result(ProcessingResult::Failed {
            repository: "/src/a".to_string(),
            error: "unknown remote url".to_string(),
        });

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.pushed, 1);
        assert_eq!(summary.change_requests_opened, 1);
        assert!(summary.has_failures());
        assert!(!summary.all_success());
        assert_eq!(summary.results[0].repository(), "/src/a");
        assert_eq!(summary.failures().count(), 1);
    }

    #[test]
    fn serializes_with_status_tag() {
        let mut summary = RunSummary::new(true);
        summary.record_result(ProcessingResult::Skipped {
            repository: "/src/a".to_string(),
            reason: "dry run".to_string(),
        });

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["results"][0]["status"], "skipped");
        assert_eq!(json["dry_run"], true);
    }
}
