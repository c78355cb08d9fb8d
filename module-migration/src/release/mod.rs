//! Version tag bumps on each repository's default branch.

mod error;
mod version;

pub use error::ReleaseError;
pub use version::{Bump, TagVersion};

use crate::exec::{CommandRunner, Session};
use crate::git::Git;
use serde::Serialize;
use tracing::{info, warn};

/// How to tag a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSettings {
    /// Remote name.
    pub remote: String,
    /// Version component to increment.
    pub bump: Bump,
    /// Push tags after creating the new one.
    pub push: bool,
}

/// A created release tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Release {
    /// Default branch the tag was created on.
    pub branch: String,
    /// Highest version tag before the release.
    pub previous: String,
    /// New tag.
    pub tag: String,
    /// Whether tags were pushed.
    pub pushed: bool,
}

/// Creates the next version tag on the default branch of a repository.
///
/// The repository is left on the default branch on success. If a step fails
/// after switching branches, the original branch is checked out again.
///
/// # Errors
///
/// Returns [`ReleaseError`] for the first failing step.
pub async fn release<R: CommandRunner>(
    session: &Session<'_, R>,
    settings: &ReleaseSettings,
) -> Result<Release, ReleaseError> {
    let git = Git::new(session);
    let current_branch = git.current_branch().await?;
    let default_branch = git.default_branch(&settings.remote).await?;
    git.checkout(&default_branch).await?;

    let result = async {
        git.fetch_prune().await?;
        git.pull_prune().await?;

        let tags = git.tags().await?;
        let repo = session.dir().display().to_string();
        if tags.is_empty() {
            return Err(ReleaseError::NoTags { repo });
        }
        let Some(latest) = TagVersion::latest(&tags) else {
            return Err(ReleaseError::NoVersionTags { repo, tags });
        };

        let next = latest.bump(settings.bump);
        git.create_tag(&next.to_string()).await?;
        info!(from = %latest, to = %next, branch = %default_branch, "Created release tag");
        Ok::<_, ReleaseError>((latest, next))
    }
    .await;

    let (latest, next) = match result {
        Ok(versions) => versions,
        Err(e) => {
            if current_branch == default_branch {
                return Err(e);
            }
            warn!(branch = %current_branch, error = %e, "Release failed, switching back");
            return match git.restore_branch(&current_branch).await {
                Ok(()) => Err(e),
                Err(restore) => Err(ReleaseError::RestoreFailed {
                    source: Box::new(e),
                    branch: current_branch,
                    restore,
                }),
            };
        }
    };

    if settings.push {
        git.push_tags(&settings.remote).await?;
    }

    Ok(Release {
        branch: default_branch,
        previous: latest.to_string(),
        tag: next.to_string(),
        pushed: settings.push,
    })
}
