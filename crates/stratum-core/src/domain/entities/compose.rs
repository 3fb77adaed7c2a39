//! Body composition along an ancestor chain.

use serde::Serialize;

use super::chain::AncestorChain;
use super::common::RelativePath;
use super::document::{BodyBlock, Document, PARENT_MARKER};

/// How a segment joins the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Spacing {
    /// Single newline: the segment continues the surrounding text.
    Line,
    /// Blank line: the segment starts a new body.
    Paragraph,
}

/// A run of text attributed to the document it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub source: RelativePath,
    pub text: String,
    pub spacing: Spacing,
}

/// Composed body of a leaf: ordered, attributed segments.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ComposedBody {
    segments: Vec<Segment>,
}

/// Prefix of the provenance comment emitted before each segment.
pub const PROVENANCE_PREFIX: &str = "<!-- stratum:source ";

impl ComposedBody {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Rendered text, with a provenance comment before each segment when
    /// `provenance` is set.
    pub fn render(&self, provenance: bool) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('\n');
                if segment.spacing == Spacing::Paragraph {
                    out.push('\n');
                }
            }
            if provenance {
                out.push_str(PROVENANCE_PREFIX);
                out.push_str(&segment.source.to_string());
                out.push_str(" -->\n");
            }
            out.push_str(&segment.text);
        }
        out
    }

    /// Rendered text without annotations.
    pub fn plain(&self) -> String {
        self.render(false)
    }

    /// Characters of visible text, ignoring surrounding whitespace.
    pub fn text_len(&self) -> usize {
        self.segments.iter().map(|s| s.text.trim().chars().count()).sum()
    }

    fn push(&mut self, source: &RelativePath, text: &str, spacing: Spacing) {
        if text.trim().is_empty() {
            return;
        }
        self.segments.push(Segment {
            source: source.clone(),
            text: text.to_string(),
            spacing,
        });
    }

    fn splice(&mut self, parent: ComposedBody) {
        for (i, mut segment) in parent.segments.into_iter().enumerate() {
            if i == 0 {
                segment.spacing = Spacing::Line;
            }
            self.segments.push(segment);
        }
    }
}

impl AncestorChain<'_> {
    /// Compose the leaf's body.
    ///
    /// Bodies append oldest first. A member whose body carries the parent
    /// marker instead receives its parent's composed body at the marker.
    pub fn compose_body(&self) -> ComposedBody {
        compose(self.members())
    }
}

fn compose(members: &[&Document]) -> ComposedBody {
    let Some((doc, upstream)) = members.split_last() else {
        return ComposedBody::default();
    };

    if !doc.body.has_marker(PARENT_MARKER) {
        let mut body = compose(upstream);
        for block in doc.body.blocks() {
            if let BodyBlock::Text(text) = block {
                body.push(&doc.source, text, Spacing::Paragraph);
            }
        }
        return body;
    }

    let mut parent = Some(compose(upstream));
    let mut body = ComposedBody::default();
    for block in doc.body.blocks() {
        match block {
            BodyBlock::Text(text) => body.push(&doc.source, text, Spacing::Line),
            BodyBlock::Marker(name) if name == PARENT_MARKER => {
                if let Some(parent) = parent.take() {
                    body.splice(parent);
                }
            }
            BodyBlock::Marker(_) => {}
        }
    }
    body
}
