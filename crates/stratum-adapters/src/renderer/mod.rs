//! Renderer adapters.

mod markdown;

pub use markdown::MarkdownRenderer;
