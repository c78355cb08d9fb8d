//! Version tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which version component to increment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bump {
    Major,
    Minor,
    #[default]
    Patch,
}

/// A semantic version tag, remembering whether it was written with a `v`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagVersion {
    prefixed: bool,
    version: semver::Version,
}

impl TagVersion {
    /// Parses a tag such as `v1.2.3` or `1.2.3-rc.1`.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        let (prefixed, raw) = match tag.strip_prefix('v') {
            Some(rest) => (true, rest),
            None => (false, tag),
        };
        semver::Version::parse(raw)
            .ok()
            .map(|version| Self { prefixed, version })
    }

    /// Returns the highest version among `tags`, ignoring non-version tags.
    pub fn latest<'t>(tags: impl IntoIterator<Item = &'t String>) -> Option<Self> {
        tags.into_iter()
            .filter_map(|tag| Self::parse(tag))
            .max_by(|a, b| a.version.cmp(&b.version))
    }

    /// Returns the parsed version.
    #[must_use]
    pub fn version(&self) -> &semver::Version {
        &self.version
    }

    /// Returns the next version. A pre-release is released by a patch bump
    /// without incrementing the patch number. Build metadata is dropped.
    #[must_use]
    pub fn bump(&self, bump: Bump) -> Self {
        let current = &self.version;
        let mut next = semver::Version::new(current.major, current.minor, current.patch);
        match bump {
            Bump::Major => {
                if current.pre.is_empty() || current.minor != 0 || current.patch != 0 {
                    next.major += 1;
                }
                next.minor = 0;
                next.patch = 0;
            }
            Bump::Minor => {
                if current.pre.is_empty() || current.patch != 0 {
                    next.minor += 1;
                }
                next.patch = 0;
            }
            Bump::Patch => {
                if current.pre.is_empty() {
                    next.patch += 1;
                }
            }
        }
        Self {
            prefixed: self.prefixed,
            version: next,
        }
    }
}

impl fmt::Display for TagVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefixed {
            write!(f, "v{}", self.version)
        } else {
            write!(f, "{}", self.version)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn picks_highest_version_and_ignores_others() {
        let latest = TagVersion::latest(&tags(&["v1.2.3", "release-x", "v1.10.0", "v1.9.9"])).unwrap();
        assert_eq!(latest.to_string(), "v1.10.0");
    }

    #[test]
    fn keeps_missing_prefix() {
        let latest = TagVersion::latest(&tags(&["0.4.1"])).unwrap();
        assert_eq!(latest.bump(Bump::Patch).to_string(), "0.4.2");
    }

    #[test]
    fn bumps_each_component() {
        let v = TagVersion::parse("v1.2.3").unwrap();
        assert_eq!(v.bump(Bump::Patch).to_string(), "v1.2.4");
        assert_eq!(v.bump(Bump::Minor).to_string(), "v1.3.0");
        assert_eq!(v.bump(Bump::Major).to_string(), "v2.0.0");
    }

    #[test]
    fn patch_bump_releases_prerelease() {
        let v = TagVersion::parse("v1.2.3-rc.1").unwrap();
        assert_eq!(v.bump(Bump::Patch).to_string(), "v1.2.3");
    }

    #[test]
    fn no_version_tags() {
        assert!(TagVersion::latest(&tags(&["latest", "stable"])).is_none());
    }
}
