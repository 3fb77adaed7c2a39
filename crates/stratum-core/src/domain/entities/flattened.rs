use serde::Serialize;

use super::common::RelativePath;
use super::compose::ComposedBody;
use super::document::Metadata;
use crate::domain::error::DomainError;
use crate::domain::value_objects::CategoryPath;

/// A fully resolved leaf: merged metadata plus composed body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlattenedDocument {
    pub source: RelativePath,
    pub path: CategoryPath,
    /// Identity value taken from the leaf, if it declares one.
    pub identity: Option<String>,
    pub metadata: Metadata,
    pub body: ComposedBody,
}

impl FlattenedDocument {
    /// `a/b/name.md` for a leaf at `[a, b, name]`.
    pub fn output_path(&self) -> Result<RelativePath, DomainError> {
        RelativePath::try_new(format!("{}.md", self.path.as_slash_path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_mirrors_category_path() {
        let doc = FlattenedDocument {
            source: RelativePath::try_new("engineer/python.md").unwrap(),
            path: CategoryPath::new(["engineer", "backend", "python"]),
            identity: None,
            metadata: Metadata::new(),
            body: ComposedBody::default(),
        };
        assert_eq!(
            doc.output_path().unwrap().to_string(),
            "engineer/backend/python.md"
        );
    }
}
