//! Markdown source documents for mdbake.
//!
//! Finds source documents under a content root, maps each one to its sibling
//! output path, and reads the optional YAML front matter and title.

pub mod frontmatter;
pub mod parser;
pub mod source;

pub use frontmatter::{Frontmatter, FrontmatterError};
pub use parser::{parse_document, ParseError, ParsedDoc};
pub use source::{
    discover, find_outputs, output_path_for, DiscoverError, DiscoverOptions, Discovery, SourceDoc,
    UnreadableEntry,
};
