//! Output document generation.

mod markdown;
mod markup;

pub use markdown::{output_path, render_document, write_document, FrontMatter};
pub use markup::html_to_markdown;
