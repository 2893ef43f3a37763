//! Template engine for standalone documents.

use minijinja::{context, Environment};

/// Context for rendering a standalone document.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Context {
    /// Document title
    pub title: String,
    /// Optional description meta tag
    pub description: Option<String>,
    /// Language of the html element
    pub lang: String,
    /// Rendered body HTML
    pub content: String,
    /// Stylesheet inlined into a style element
    pub css: String,
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with the standalone template.
    pub fn new() -> Self {
        let mut env = Environment::new();

        env.add_template_owned("standalone.html".to_string(), STANDALONE_TEMPLATE.to_string())
            .expect("Failed to add standalone template");

        Self { env }
    }

    /// Render a document using the specified template.
    pub fn render_page(
        &self,
        template: &str,
        context: &Context,
    ) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template(template)?;

        tmpl.render(context! {
            title => &context.title,
            description => &context.description,
            lang => &context.lang,
            content => &context.content,
            css => &context.css,
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

const STANDALONE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="{{ lang }}">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ title }}</title>
  {% if description %}<meta name="description" content="{{ description }}">
  {% endif %}<style>
{{ css | safe }}
  </style>
</head>
<body>
  <main class="content">
{{ content | safe }}
  </main>
</body>
</html>
"##;
