//! Front matter extraction and parsing.

use serde::Deserialize;

/// Metadata from a leading YAML block in a Markdown document.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Frontmatter {
    /// Document title
    #[serde(default)]
    pub title: Option<String>,

    /// Short description, emitted as a meta tag
    #[serde(default)]
    pub description: Option<String>,

    /// Document language (`lang` attribute of the html element)
    #[serde(default)]
    pub lang: Option<String>,
}

/// Extract front matter from Markdown content.
///
/// A block opens with a first line of exactly `---` followed by a non-blank
/// line, and closes at the next line that is exactly `---` or `...`.
/// Anything else (a thematic break, a `----` rule) is left as content.
///
/// Returns the parsed front matter and the remaining content after the block.
pub fn extract_frontmatter(source: &str) -> Result<(Option<Frontmatter>, &str), FrontmatterError> {
    let mut lines = source.split_inclusive('\n');

    let Some(first) = lines.next() else {
        return Ok((None, source));
    };
    if first.trim_end() != "---" {
        return Ok((None, source));
    }
    match lines.clone().next() {
        Some(next) if !next.trim().is_empty() => {}
        _ => return Ok((None, source)),
    }

    let body_start = first.len();
    let mut offset = body_start;
    let mut close = None;
    for line in lines {
        let marker = line.trim_end();
        if marker == "---" || marker == "..." {
            close = Some((offset, offset + line.len()));
            break;
        }
        offset += line.len();
    }

    let Some((yaml_end, remaining_start)) = close else {
        return Err(FrontmatterError::Unclosed);
    };

    let yaml_content = source[body_start..yaml_end].trim();
    let remaining = &source[remaining_start..];

    let frontmatter = if yaml_content.is_empty() {
        Frontmatter::default()
    } else {
        serde_yaml::from_str(yaml_content)
            .map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?
    };

    Ok((Some(frontmatter), remaining.trim_start()))
}

/// Errors that can occur when parsing front matter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Unclosed front matter block - missing closing ---")]
    Unclosed,

    #[error("Invalid YAML in front matter: {0}")]
    InvalidYaml(String),
}
