//! In-process renderer built on pulldown-cmark.

use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use pulldown_cmark::{html, CowStr, Event, Parser, Tag};

use mdbake_docs::parse_document;
use mdbake_docs::parser::{markdown_options, ParsedDoc};

use crate::assets::AssetPipeline;
use crate::renderer::{RenderError, RenderJob, Renderer};
use crate::templates::{Context, TemplateEngine};

/// Renders standalone HTML without an external binary.
///
/// The stylesheet is inlined into a `<style>` element, so the output has no
/// `<link>` or `<script>` references. The stylesheet is read and minified
/// once, on the first document that loads it successfully.
pub struct BuiltinRenderer {
    stylesheet: Option<PathBuf>,
    minify: bool,
    css: OnceLock<String>,
    templates: TemplateEngine,
}

impl BuiltinRenderer {
    /// Create a renderer inlining `stylesheet`, or the bundled one if `None`.
    pub fn new(stylesheet: Option<PathBuf>, minify: bool) -> Self {
        Self {
            stylesheet,
            minify,
            css: OnceLock::new(),
            templates: TemplateEngine::new(),
        }
    }

    fn css(&self) -> Result<&str, RenderError> {
        if let Some(css) = self.css.get() {
            return Ok(css.as_str());
        }
        let css = AssetPipeline::load_css(self.stylesheet.as_deref(), self.minify)?;
        Ok(self.css.get_or_init(|| css).as_str())
    }

    /// Render a Markdown source string to a standalone HTML document.
    pub fn render_string(&self, source: &str, fallback_title: &str) -> Result<String, RenderError> {
        let doc = parse_document(source).map_err(|e| RenderError::InvalidDocument(e.to_string()))?;

        let frontmatter = doc.frontmatter.as_ref();
        let context = Context {
            title: doc.title().unwrap_or(fallback_title).to_string(),
            description: frontmatter.and_then(|f| f.description.clone()),
            lang: frontmatter
                .and_then(|f| f.lang.clone())
                .unwrap_or_else(|| "en".to_string()),
            content: render_markdown(&doc),
            css: self.css()?.to_string(),
        };

        self.templates
            .render_page("standalone.html", &context)
            .map_err(|e| RenderError::Template(e.to_string()))
    }
}

impl Renderer for BuiltinRenderer {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn render(&self, job: &RenderJob) -> Result<(), RenderError> {
        let source = fs::read_to_string(&job.source).map_err(|e| RenderError::Io {
            path: job.source.clone(),
            source: e,
        })?;

        let fallback_title = job
            .source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Untitled");

        let html = self.render_string(&source, fallback_title)?;

        fs::write(&job.output, html).map_err(|e| RenderError::Io {
            path: job.output.clone(),
            source: e,
        })
    }
}

/// Render the document body, giving every heading its anchor ID.
fn render_markdown(doc: &ParsedDoc) -> String {
    let mut headings = doc.headings.iter();

    let parser = Parser::new_ext(&doc.content, markdown_options()).map(|event| match event {
        Event::Start(Tag::Heading {
            level,
            id: None,
            classes,
            attrs,
        }) => Event::Start(Tag::Heading {
            level,
            id: headings.next().map(|h| CowStr::from(h.id.clone())),
            classes,
            attrs,
        }),
        other => other,
    });

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    html_output
}
