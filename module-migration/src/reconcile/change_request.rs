//! Best-effort change request creation through the `gh` CLI.

use super::ChangeRequestStatus;
use crate::exec::{CommandRunner, Session};
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Program used to open change requests.
pub const CHANGE_REQUEST_TOOL: &str = "gh";

static REQUEST_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://\S+/(?:pull|pulls|merge_requests|pull-requests)/\S*")
        .expect("change request url pattern is valid")
});

/// Opens a change request titled `title` for the current branch.
///
/// Never fails: a missing tool or a failing command is reported in the
/// returned status.
pub async fn open_change_request<R: CommandRunner>(
    session: &Session<'_, R>,
    available: bool,
    title: &str,
    push_output: &[String],
) -> ChangeRequestStatus {
    if !available {
        return ChangeRequestStatus::Unavailable {
            suggested_url: find_request_url(push_output),
        };
    }

    match session
        .run(
            CHANGE_REQUEST_TOOL,
            &["pr", "create", "--title", title, "--body", title],
        )
        .await
    {
        Ok(lines) => ChangeRequestStatus::Opened {
            url: find_request_url(&lines),
        },
        Err(e) => {
            warn!(
                repo = %session.dir().display(),
                error = %e,
                "Failed to create change request"
            );
            ChangeRequestStatus::Failed {
                message: e.to_string(),
            }
        }
    }
}

/// Finds the first change request link in command output.
#[must_use]
pub fn find_request_url(lines: &[String]) -> Option<String> {
    lines
        .iter()
        .find_map(|line| REQUEST_URL.find(line))
        .map(|m| m.as_str().to_string())
}
