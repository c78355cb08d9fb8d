//! Reconciliation states and outcomes.

use serde::Serialize;

/// How the remote URL relates to the mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemoteDisposition {
    /// The remote pointed at an old URL and was repointed.
    Mapped { from: String, to: String },
    /// The remote already points at a new URL.
    AlreadyTarget,
}

/// Where the remote of a repository stands before anything is changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteState {
    /// Remote name, e.g. `origin`.
    pub remote: String,
    /// Current URL, normalized.
    pub current_url: String,
    /// URL the remote must point at, normalized.
    pub target_url: String,
    /// Whether the URL has to change.
    pub disposition: RemoteDisposition,
}

/// How the target branch was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BranchDisposition {
    /// The target branch was already checked out.
    AlreadyCurrent,
    /// The target branch was created from `previous`.
    Created { previous: String },
}

/// Result of opening a change request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeRequestStatus {
    /// The change request was created.
    Opened { url: Option<String> },
    /// The change request tool is not installed. The push output may carry
    /// a link for creating one by hand.
    Unavailable { suggested_url: Option<String> },
    /// Creating the change request failed; the push itself succeeded.
    Failed { message: String },
}

/// Final state of a reconciled repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Only the remote URL was reconciled, no branch was configured.
    UrlOnly { remote: RemoteDisposition },
    /// There was nothing to commit.
    NothingToCommit { remote: RemoteDisposition },
    /// Changes were committed and pushed.
    Pushed {
        remote: RemoteDisposition,
        branch: BranchDisposition,
        change_request: ChangeRequestStatus,
    },
}

impl Outcome {
    /// Returns a short human readable description.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::UrlOnly { .. } => "remote url reconciled".to_string(),
            Self::NothingToCommit { .. } => "nothing to commit".to_string(),
            Self::Pushed { change_request, .. } => match change_request {
                ChangeRequestStatus::Opened { url: Some(url) } => format!("pushed, change request {url}"),
                ChangeRequestStatus::Opened { url: None } => "pushed, change request opened".to_string(),
                ChangeRequestStatus::Unavailable {
                    suggested_url: Some(url),
                } => format!("pushed, open a change request at {url}"),
                ChangeRequestStatus::Unavailable { suggested_url: None } => "pushed".to_string(),
                ChangeRequestStatus::Failed { .. } => "pushed, change request failed".to_string(),
            },
        }
    }
}
