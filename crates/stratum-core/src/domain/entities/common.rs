use super::DomainError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A corpus- or output-relative path.
///
/// Invariant: Never absolute, and made only of plain names (no `.` or `..`),
/// so joining it onto a root never leaves that root. Enforced at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath(PathBuf);

impl RelativePath {
    pub fn try_new(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();
        check_relative(&path)?;
        Ok(Self(path))
    }

    /// Join a segment, maintaining relative invariant.
    pub fn join(&self, segment: impl AsRef<Path>) -> Result<Self, DomainError> {
        let segment = segment.as_ref();
        check_relative(segment)?;
        Ok(Self(self.0.join(segment)))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// File name without its extension.
    pub fn file_stem(&self) -> Option<&str> {
        self.0.file_stem().and_then(|s| s.to_str())
    }

    pub fn file_name(&self) -> Option<&str> {
        self.0.file_name().and_then(|s| s.to_str())
    }

    /// Directory components leading to the file.
    pub fn parent_segments(&self) -> Vec<String> {
        self.0
            .parent()
            .map(|parent| {
                parent
                    .components()
                    .filter_map(|c| match c {
                        Component::Normal(s) => s.to_str().map(str::to_string),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `/`-separated form, independent of the host separator.
    pub fn to_slash_string(&self) -> String {
        self.0
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for RelativePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_slash_string())
    }
}

impl Serialize for RelativePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_slash_string())
    }
}

fn check_relative(path: &Path) -> Result<(), DomainError> {
    if path.is_absolute() || path.has_root() {
        return Err(DomainError::AbsolutePathNotAllowed {
            path: path.display().to_string(),
        });
    }
    if path
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(DomainError::PathEscapesRoot {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_absolute_paths() {
        assert!(RelativePath::try_new("/etc/passwd").is_err());
        assert!(RelativePath::try_new("engineer/python.md").is_ok());
    }

    #[test]
    fn rejects_parent_and_current_dir_components() {
        assert_eq!(
            RelativePath::try_new("engineer/../../agents/x.md"),
            Err(DomainError::PathEscapesRoot {
                path: "engineer/../../agents/x.md".into()
            })
        );
        assert!(RelativePath::try_new("./x.md").is_err());
        assert!(RelativePath::try_new("out").unwrap().join("../x.md").is_err());
    }

    #[test]
    fn splits_parent_segments_and_stem() {
        let path = RelativePath::try_new("engineer/backend/python.md").unwrap();
        assert_eq!(path.parent_segments(), vec!["engineer", "backend"]);
        assert_eq!(path.file_stem(), Some("python"));
        assert_eq!(path.to_string(), "engineer/backend/python.md");
    }

    #[test]
    fn top_level_file_has_no_parent_segments() {
        let path = RelativePath::try_new("BASE-AGENT.md").unwrap();
        assert!(path.parent_segments().is_empty());
    }

    #[test]
    fn join_refuses_absolute_segment() {
        let base = RelativePath::try_new("out").unwrap();
        assert!(base.join("/tmp").is_err());
        assert_eq!(base.join("a.md").unwrap().to_string(), "out/a.md");
    }
}
