//! Stylesheet loading and minification.

use std::fs;
use std::path::Path;

use crate::renderer::RenderError;

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// The bundled document stylesheet.
    pub fn default_css() -> &'static str {
        DEFAULT_CSS
    }

    /// Load the stylesheet to inline, optionally minified.
    ///
    /// `None` selects the bundled stylesheet. A configured path that does not
    /// exist is an error. Minification failures fall back to the source CSS.
    pub fn load_css(stylesheet: Option<&Path>, minify: bool) -> Result<String, RenderError> {
        let css = match stylesheet {
            Some(path) => {
                if !path.is_file() {
                    return Err(RenderError::MissingStylesheet(path.to_path_buf()));
                }
                fs::read_to_string(path).map_err(|e| RenderError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })?
            }
            None => DEFAULT_CSS.to_string(),
        };

        if !minify {
            return Ok(css);
        }

        match Self::minify_css(&css) {
            Ok(minified) => Ok(minified),
            Err(e) => {
                tracing::warn!("Keeping stylesheet unminified: {}", e);
                Ok(css)
            }
        }
    }

    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, String> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| format!("CSS parse error: {}", e))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| format!("CSS minify error: {}", e))?;

        Ok(minified.code)
    }
}

const DEFAULT_CSS: &str = r#"/* mdbake default document theme */

:root {
  --text: #1f2328;
  --muted: #59636e;
  --border: #d1d9e0;
  --code-bg: #f6f8fa;
  --accent: #336791;
  --content-max-width: 46rem;
}

* {
  box-sizing: border-box;
}

html {
  font-size: 16px;
}

body {
  margin: 0;
  font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
  color: var(--text);
  background: #fff;
  line-height: 1.6;
}

.content {
  max-width: var(--content-max-width);
  margin: 0 auto;
  padding: 2rem 1rem 4rem;
}

h1, h2, h3, h4 {
  line-height: 1.25;
  margin: 2rem 0 1rem;
}

h1 {
  font-size: 2.25rem;
  margin-top: 0;
}

h2 {
  font-size: 1.5rem;
  padding-bottom: 0.3rem;
  border-bottom: 1px solid var(--border);
}

a {
  color: var(--accent);
  text-underline-offset: 3px;
}

code, pre {
  font-family: ui-monospace, "SFMono-Regular", Menlo, Consolas, monospace;
  font-size: 0.875em;
}

code {
  background: var(--code-bg);
  padding: 0.125rem 0.375rem;
  border-radius: 0.25rem;
}

pre {
  background: var(--code-bg);
  border: 1px solid var(--border);
  border-radius: 0.375rem;
  padding: 1rem;
  overflow-x: auto;
}

pre code {
  background: none;
  padding: 0;
}

table {
  border-collapse: collapse;
  margin: 1rem 0;
  width: 100%;
}

th, td {
  border: 1px solid var(--border);
  padding: 0.4rem 0.75rem;
  text-align: left;
}

th {
  background: var(--code-bg);
}

blockquote {
  margin: 1rem 0;
  padding: 0 1rem;
  color: var(--muted);
  border-left: 0.25rem solid var(--border);
}

@media print {
  .content {
    max-width: none;
    padding: 0;
  }

  pre {
    white-space: pre-wrap;
  }
}
"#;
