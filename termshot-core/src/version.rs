//! Semantic version triple, its plain-text file, and JSON metadata mirrors.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde_json::Value;

use crate::errors::TermshotError;

/// Which component a release bumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpKind {
    Patch,
    Minor,
    Major,
}

/// `MAJOR.MINOR.PATCH`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Next version.  Lower components reset to zero.
    pub fn bump(self, kind: BumpKind) -> Self {
        match kind {
            BumpKind::Patch => Self::new(self.major, self.minor, self.patch + 1),
            BumpKind::Minor => Self::new(self.major, self.minor + 1, 0),
            BumpKind::Major => Self::new(self.major + 1, 0, 0),
        }
    }

    /// Git tag name, e.g. `v1.4.0`.
    pub fn tag(&self) -> String {
        format!("v{self}")
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = TermshotError;

    /// Accepts surrounding whitespace and an optional leading `v`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let invalid = || TermshotError::ReleaseError(format!("invalid version `{trimmed}`"));

        let mut parts = bare.split('.');
        let mut next = || -> Result<u64, TermshotError> {
            let part = parts.next().ok_or_else(invalid)?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse::<u64>().map_err(|_| invalid())
        };
        let version = Version::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}

/// Read the version file (first non-empty line).
pub fn read_version_file(path: &Path) -> Result<Version, TermshotError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        TermshotError::ReleaseError(format!("cannot read {}: {e}", path.display()))
    })?;
    raw.lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| TermshotError::ReleaseError(format!("{} is empty", path.display())))?
        .parse()
}

pub fn write_version_file(path: &Path, version: &Version) -> Result<(), TermshotError> {
    fs::write(path, format!("{version}\n"))?;
    Ok(())
}

/// Set the top-level `"version"` of a JSON object file, keeping key order.
/// Returns `false` when the file already carried `version`.
pub fn mirror_json(path: &Path, version: &Version) -> Result<bool, TermshotError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        TermshotError::ReleaseError(format!("cannot read {}: {e}", path.display()))
    })?;
    let mut doc: Value = serde_json::from_str(&raw)?;
    let Some(obj) = doc.as_object_mut() else {
        return Err(TermshotError::ReleaseError(format!(
            "{} is not a JSON object",
            path.display()
        )));
    };

    let next = Value::String(version.to_string());
    if obj.get("version") == Some(&next) {
        return Ok(false);
    }
    obj.insert("version".to_owned(), next);

    fs::write(path, format!("{}\n", serde_json::to_string_pretty(&doc)?))?;
    log::debug!("mirrored {version} into {}", path.display());
    Ok(true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
