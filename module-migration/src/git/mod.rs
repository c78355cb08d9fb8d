//! Typed wrappers around the git subcommands used by the migration.

mod error;

pub use error::GitError;

use crate::exec::{CommandRunner, ExecError, Session};
use tracing::debug;

const GIT: &str = "git";

/// Maximum length of a commit subject line.
pub const MAX_SUBJECT_LEN: usize = 50;

/// Git commands for one working copy.
pub struct Git<'s, 'a, R> {
    session: &'s Session<'a, R>,
}

impl<'s, 'a, R: CommandRunner> Git<'s, 'a, R> {
    /// Creates a git wrapper for the session's directory.
    pub fn new(session: &'s Session<'a, R>) -> Self {
        Self { session }
    }

    fn repo(&self) -> String {
        self.session.dir().display().to_string()
    }

    fn wrap(&self, action: impl Into<String>) -> impl FnOnce(ExecError) -> GitError {
        let action = action.into();
        let repo = self.repo();
        move |source| GitError::Command {
            action,
            repo,
            source,
        }
    }

    async fn single_line(&self, args: &[&str], action: &str) -> Result<String, GitError> {
        let mut lines = self.session.run(GIT, args).await.map_err(self.wrap(action))?;
        if lines.len() != 1 {
            return Err(GitError::UnexpectedOutput {
                command: format!("git {}", args.join(" ")),
                repo: self.repo(),
                lines,
            });
        }
        Ok(lines.remove(0))
    }

    /// Returns the single URL configured for `remote`.
    pub async fn remote_url(&self, remote: &str) -> Result<String, GitError> {
        self.single_line(
            &["remote", "get-url", "--all", remote],
            &format!("get url of remote {remote}"),
        )
        .await
    }

    /// Points `remote` at `url` by removing and re-adding it.
    pub async fn set_remote_url(&self, remote: &str, url: &str) -> Result<(), GitError> {
        if let Err(e) = self.session.run(GIT, &["remote", "remove", remote]).await {
            if e.is_cancelled() {
                return Err(self.wrap(format!("remove remote {remote}"))(e));
            }
            debug!(remote, error = %e, "Removing remote failed, adding anyway");
        }
        self.session
            .run(GIT, &["remote", "add", remote, url])
            .await
            .map_err(self.wrap(format!("change remote url to {url} ({remote})")))?;
        Ok(())
    }

    /// Checks that `url` can be listed.
    pub async fn check_remote(&self, url: &str) -> Result<(), GitError> {
        self.session
            .run(GIT, &["ls-remote", url])
            .await
            .map_err(self.wrap(format!("check remote url {url}")))?;
        Ok(())
    }

    /// Refreshes the index stat information. Failures are ignored since
    /// `update-index --refresh` exits non-zero whenever files are modified.
    pub async fn refresh_index(&self) -> Result<(), GitError> {
        match self.session.run(GIT, &["update-index", "--refresh"]).await {
            Err(e) if e.is_cancelled() => Err(self.wrap("refresh index")(e)),
            _ => Ok(()),
        }
    }

    /// Returns true if tracked files differ from HEAD or untracked files exist.
    pub async fn has_changes(&self) -> Result<bool, GitError> {
        match self
            .session
            .run(GIT, &["diff-index", "--quiet", "HEAD", "--"])
            .await
        {
            Ok(_) => {}
            Err(ExecError::Failed { exit_code: 1, .. }) => return Ok(true),
            Err(e) => return Err(self.wrap("check for modified files")(e)),
        }

        let untracked = self
            .session
            .run(GIT, &["ls-files", "--others", "--exclude-standard"])
            .await
            .map_err(self.wrap("check for untracked files"))?;
        Ok(!untracked.is_empty())
    }

    /// Returns the name of the checked out branch.
    pub async fn current_branch(&self) -> Result<String, GitError> {
        self.single_line(&["rev-parse", "--abbrev-ref", "HEAD"], "get current branch name")
            .await
    }

    /// Returns true if a local branch named `branch` exists. Tags and
    /// revisions of the same name do not count.
    pub async fn branch_exists(&self, branch: &str) -> Result<bool, GitError> {
        let reference = format!("refs/heads/{branch}");
        match self.session.run(GIT, &["rev-parse", "--verify", &reference]).await {
            Ok(_) => Ok(true),
            Err(ExecError::Failed { .. }) => Ok(false),
            Err(e) => Err(self.wrap(format!("verify branch {branch}"))(e)),
        }
    }

    /// Creates and switches to `branch`, deleting a stale local branch of the
    /// same name first.
    pub async fn checkout_new_branch(&self, branch: &str) -> Result<(), GitError> {
        if self.branch_exists(branch).await? {
            debug!(branch, "Deleting existing branch before recreating it");
            self.delete_branch(branch).await?;
        }
        self.session
            .run(GIT, &["checkout", "-b", branch])
            .await
            .map_err(self.wrap(format!("checkout new branch {branch}")))?;
        Ok(())
    }

    /// Switches to an existing branch.
    pub async fn checkout(&self, branch: &str) -> Result<(), GitError> {
        self.session
            .run(GIT, &["checkout", branch])
            .await
            .map_err(self.wrap(format!("checkout branch {branch}")))?;
        Ok(())
    }

    /// Force-deletes a local branch.
    pub async fn delete_branch(&self, branch: &str) -> Result<(), GitError> {
        self.session
            .run(GIT, &["branch", "-D", branch])
            .await
            .map_err(self.wrap(format!("delete branch {branch}")))?;
        Ok(())
    }

    /// Stages every change, including untracked and deleted files.
    pub async fn add_all(&self) -> Result<(), GitError> {
        self.session
            .run(GIT, &["add", "--all"])
            .await
            .map_err(self.wrap("stage changed files"))?;
        Ok(())
    }

    /// Commits the index. The message is cut to [`MAX_SUBJECT_LEN`] characters.
    pub async fn commit(&self, message: &str) -> Result<(), GitError> {
        let subject = truncate_subject(message);
        self.session
            .run(GIT, &["commit", "-m", &subject])
            .await
            .map_err(self.wrap("commit changes"))?;
        Ok(())
    }

    /// Pushes `branch` and sets it as upstream. Returns the push output.
    pub async fn push_upstream(&self, remote: &str, branch: &str) -> Result<Vec<String>, GitError> {
        self.session
            .run(GIT, &["push", "--set-upstream", remote, branch])
            .await
            .map_err(self.wrap(format!("push to upstream ({remote}) branch {branch}")))
    }

    /// Pulls all remotes and tags.
    pub async fn pull(&self) -> Result<(), GitError> {
        self.session
            .run(GIT, &["pull", "--all", "--tags"])
            .await
            .map_err(self.wrap("pull"))?;
        Ok(())
    }

    /// Fetches all remotes, pruning branches and tags that no longer exist.
    pub async fn fetch_prune(&self) -> Result<(), GitError> {
        self.session
            .run(
                GIT,
                &["fetch", "--all", "--tags", "--prune", "--prune-tags", "--force"],
            )
            .await
            .map_err(self.wrap("fetch"))?;
        Ok(())
    }

    /// Pulls all remotes, pruning what no longer exists remotely.
    pub async fn pull_prune(&self) -> Result<(), GitError> {
        self.session
            .run(GIT, &["pull", "--all", "--tags", "--prune", "--force"])
            .await
            .map_err(self.wrap("pull"))?;
        Ok(())
    }

    /// Returns the default branch of `remote`, e.g. `main`.
    pub async fn default_branch(&self, remote: &str) -> Result<String, GitError> {
        let head = format!("{remote}/HEAD");
        let branch = self
            .single_line(&["rev-parse", "--abbrev-ref", &head], "get default branch")
            .await?;
        let prefix = format!("{remote}/");
        Ok(branch
            .strip_prefix(&prefix)
            .map(str::to_string)
            .unwrap_or(branch))
    }

    /// Lists all tags.
    pub async fn tags(&self) -> Result<Vec<String>, GitError> {
        self.session
            .run(GIT, &["tag"])
            .await
            .map_err(self.wrap("list tags"))
    }

    /// Creates a lightweight tag on HEAD.
    pub async fn create_tag(&self, tag: &str) -> Result<(), GitError> {
        self.session
            .run(GIT, &["tag", tag])
            .await
            .map_err(self.wrap(format!("create tag {tag:?}")))?;
        Ok(())
    }

    /// Pushes all tags to `remote`.
    pub async fn push_tags(&self, remote: &str) -> Result<(), GitError> {
        self.session
            .run(GIT, &["push", remote, "--tags"])
            .await
            .map_err(self.wrap(format!("push tags to {remote}")))?;
        Ok(())
    }

    /// Switches back to `branch`, even after an interrupt.
    pub async fn restore_branch(&self, branch: &str) -> Result<(), GitError> {
        self.session
            .run_uninterruptible(GIT, &["checkout", branch])
            .await
            .map_err(self.wrap(format!("checkout branch {branch}")))?;
        Ok(())
    }

    /// Force-deletes a local branch, even after an interrupt.
    pub async fn discard_branch(&self, branch: &str) -> Result<(), GitError> {
        self.session
            .run_uninterruptible(GIT, &["branch", "-D", branch])
            .await
            .map_err(self.wrap(format!("delete branch {branch}")))?;
        Ok(())
    }

    /// Deletes a remote branch, even after an interrupt.
    pub async fn discard_remote_branch(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.session
            .run_uninterruptible(GIT, &["push", remote, "--delete", branch])
            .await
            .map_err(self.wrap(format!("delete remote branch {branch} ({remote})")))?;
        Ok(())
    }
}

/// Cuts a commit message to [`MAX_SUBJECT_LEN`] characters.
#[must_use]
pub fn truncate_subject(message: &str) -> String {
    message.chars().take(MAX_SUBJECT_LEN).collect()
}
