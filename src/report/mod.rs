//! Message composition and scan summaries.

pub mod composer;
pub mod summary;

pub use composer::Composer;
pub use summary::{render_json, render_text};
