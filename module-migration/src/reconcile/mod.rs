//! Remote and branch reconciliation of a single repository.
//!
//! The remote URL is moved from its old to its new location, the new
//! location is checked for reachability and, if a target branch is
//! configured, pending changes are committed on that branch and pushed. A
//! failure after the branch was created by this run rolls the branch back.

mod change_request;
mod error;
mod state;

pub use change_request::{find_request_url, open_change_request, CHANGE_REQUEST_TOOL};
pub use error::ReconcileError;
pub use state::{BranchDisposition, ChangeRequestStatus, Outcome, RemoteDisposition, RemoteState};

use crate::exec::{CommandRunner, Session};
use crate::git::{Git, GitError};
use crate::mapping::{url, MappingTables, RemoteLookup};
use tracing::{debug, info, warn};

/// Default commit message and change request title.
pub const DEFAULT_COMMIT_MESSAGE: &str = "chore: Go module migration";

/// What to reconcile a repository towards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileSettings {
    /// Remote name.
    pub remote: String,
    /// Branch to commit on. `None` only reconciles the remote URL.
    pub branch: Option<String>,
    /// Commit message, also used as change request title.
    pub commit_message: String,
    /// Whether the change request tool was found at startup.
    pub change_requests: bool,
}

/// Reads the remote URL of a repository and locates it in the mapping.
///
/// # Errors
///
/// Returns [`ReconcileError::UnrecognizedRemote`] if the URL is not part of
/// the mapping, or [`ReconcileError::Git`] if it cannot be read.
pub async fn resolve_remote<R: CommandRunner>(
    session: &Session<'_, R>,
    tables: &MappingTables,
    remote: &str,
) -> Result<RemoteState, ReconcileError> {
    let git = Git::new(session);
    let raw = git.remote_url(remote).await?;
    let unrecognized = || ReconcileError::UnrecognizedRemote {
        repo: session.dir().display().to_string(),
        url: raw.clone(),
    };
    let current_url = url::normalize_remote_url(&raw).map_err(|_| unrecognized())?;

    let (target_url, disposition) = match tables.lookup_remote(&current_url) {
        RemoteLookup::Mapped { target } => (
            target.clone(),
            RemoteDisposition::Mapped {
                from: current_url.clone(),
                to: target,
            },
        ),
        RemoteLookup::AlreadyTarget => (current_url.clone(), RemoteDisposition::AlreadyTarget),
        RemoteLookup::Unrecognized => return Err(unrecognized()),
    };

    Ok(RemoteState {
        remote: remote.to_string(),
        current_url,
        target_url,
        disposition,
    })
}

/// Reconciles the remote URL and, if configured, commits and pushes.
///
/// # Errors
///
/// Returns [`ReconcileError`] for the first failing step. A failure during
/// commit or push after this run created the branch is returned as
/// [`ReconcileError::RolledBack`].
pub async fn reconcile<R: CommandRunner>(
    session: &Session<'_, R>,
    tables: &MappingTables,
    settings: &ReconcileSettings,
) -> Result<Outcome, ReconcileError> {
    let git = Git::new(session);
    let state = resolve_remote(session, tables, &settings.remote).await?;

    if let RemoteDisposition::Mapped { from, to } = &state.disposition {
        info!(remote = %state.remote, from = %from, to = %to, "Changing remote url");
        git.set_remote_url(&state.remote, to).await?;
    } else {
        debug!(remote = %state.remote, url = %state.current_url, "Remote already points at target");
    }

    git.check_remote(&state.target_url)
        .await
        .map_err(|source| ReconcileError::Unreachable {
            repo: session.dir().display().to_string(),
            url: state.target_url.clone(),
            source,
        })?;

    git.refresh_index().await?;
    let has_changes = git.has_changes().await?;

    let Some(target_branch) = settings.branch.as_deref() else {
        return Ok(Outcome::UrlOnly {
            remote: state.disposition,
        });
    };

    if !has_changes {
        info!(repo = %session.dir().display(), "Nothing to commit");
        return Ok(Outcome::NothingToCommit {
            remote: state.disposition,
        });
    }

    let current_branch = git.current_branch().await?;
    let branch = if current_branch == target_branch {
        BranchDisposition::AlreadyCurrent
    } else {
        git.checkout_new_branch(target_branch).await?;
        BranchDisposition::Created {
            previous: current_branch,
        }
    };

    let rollback = Rollback::new(&git, &settings.remote, target_branch, &branch);
    let push_output = match publish(&git, settings, target_branch).await {
        Ok(output) => output,
        Err(e) => return Err(rollback.run(e).await),
    };

    let change_request = open_change_request(
        session,
        settings.change_requests,
        &settings.commit_message,
        &push_output,
    )
    .await;

    Ok(Outcome::Pushed {
        remote: state.disposition,
        branch,
        change_request,
    })
}

async fn publish<R: CommandRunner>(
    git: &Git<'_, '_, R>,
    settings: &ReconcileSettings,
    branch: &str,
) -> Result<Vec<String>, GitError> {
    git.add_all().await?;
    git.commit(&settings.commit_message).await?;
    git.push_upstream(&settings.remote, branch).await
}

/// Compensation for a branch created by this run.
///
/// Only armed when the branch was created; an already checked out branch
/// is never deleted.
struct Rollback<'g, 's, 'a, R> {
    git: &'g Git<'s, 'a, R>,
    remote: &'g str,
    branch: &'g str,
    previous: Option<&'g str>,
}

impl<'g, 's, 'a, R: CommandRunner> Rollback<'g, 's, 'a, R> {
    fn new(
        git: &'g Git<'s, 'a, R>,
        remote: &'g str,
        branch: &'g str,
        disposition: &'g BranchDisposition,
    ) -> Self {
        let previous = match disposition {
            BranchDisposition::Created { previous } => Some(previous.as_str()),
            BranchDisposition::AlreadyCurrent => None,
        };
        Self {
            git,
            remote,
            branch,
            previous,
        }
    }

    /// Undoes the branch creation and returns the combined error.
    async fn run(self, error: GitError) -> ReconcileError {
        let Some(previous) = self.previous else {
            return ReconcileError::Git(error);
        };

        warn!(branch = self.branch, previous, error = %error, "Rolling back branch");

        let mut compensation = Vec::new();
        if let Err(e) = self.git.restore_branch(previous).await {
            compensation.push(e);
        }
        if let Err(e) = self.git.discard_branch(self.branch).await {
            compensation.push(e);
        }
        if let Err(e) = self.git.discard_remote_branch(self.remote, self.branch).await {
            compensation.push(e);
        }

        ReconcileError::RolledBack {
            source: error,
            compensation,
        }
    }
}
