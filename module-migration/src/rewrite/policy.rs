//! Include/exclude filtering of repository paths.

use super::RewriteError;
use regex::Regex;
use std::path::Path;

/// File patterns rewritten by default.
pub const DEFAULT_INCLUDE: &[&str] = &[
    r"\.go$",
    r"Dockerfile$",
    r"Jenkinsfile$",
    r"\.yaml$",
    r"\.yml$",
    r"\.md$",
    r"\.MD$",
    r"go.mod$",
];

/// Paths never rewritten by default. Rewriting `go.sum` breaks its checksums.
pub const DEFAULT_EXCLUDE: &[&str] = &[r"\.git$", r"go\.sum$"];

/// Paths additionally excluded by the migrate flow, which owns the manifest.
pub const MANIFEST_EXCLUDE: &[&str] = &[r"go\.mod$", r"go\.sum$"];

/// Decides which paths of a repository take part in a rewrite.
///
/// Patterns are matched against the full path. Exclusion wins over inclusion
/// and an excluded directory is never descended into. Inclusion is an
/// allow-list: a file that matches no include pattern is left alone.
#[derive(Debug, Clone)]
pub struct InclusionPolicy {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl InclusionPolicy {
    /// Compiles a policy from pattern strings. Empty strings are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Pattern`] for the first invalid pattern.
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self, RewriteError> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// Returns a copy of this policy with additional exclude patterns.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Pattern`] for the first invalid pattern.
    pub fn with_excludes<S: AsRef<str>>(&self, patterns: &[S]) -> Result<Self, RewriteError> {
        let mut policy = self.clone();
        for pattern in compile(patterns)? {
            if !policy
                .exclude
                .iter()
                .any(|existing| existing.as_str() == pattern.as_str())
            {
                policy.exclude.push(pattern);
            }
        }
        Ok(policy)
    }

    /// Returns true if `path` matches any exclude pattern.
    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.exclude.iter().any(|re| re.is_match(&path))
    }

    /// Returns true if `path` matches any include pattern.
    #[must_use]
    pub fn is_included(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.include.iter().any(|re| re.is_match(&path))
    }

    /// Returns true if a file at `path` should be rewritten.
    #[must_use]
    pub fn accepts(&self, path: &Path) -> bool {
        !self.is_excluded(path) && self.is_included(path)
    }
}

impl Default for InclusionPolicy {
    fn default() -> Self {
        Self {
            include: DEFAULT_INCLUDE
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect(),
            exclude: DEFAULT_EXCLUDE
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect(),
        }
    }
}

fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>, RewriteError> {
    patterns
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| !p.trim().is_empty())
        .map(|p| {
            Regex::new(p).map_err(|source| RewriteError::Pattern {
                pattern: p.to_string(),
                source,
            })
        })
        .collect()
}
