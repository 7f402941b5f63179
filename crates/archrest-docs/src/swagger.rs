//! Swagger UI page.
//!
//! The page is mounted at the configured docs path and loads the synthesized
//! document from `{path}/openapi.json`. Swagger UI itself comes from a CDN.

use crate::error::{DocsError, DocsResult};

/// Document expansion level for Swagger UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocExpansion {
    /// Show all operations collapsed.
    None,
    /// Show only the list of operations.
    #[default]
    List,
    /// Expand all operations fully.
    Full,
}

impl DocExpansion {
    const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::List => "list",
            Self::Full => "full",
        }
    }
}

/// Swagger UI mount point and page renderer.
#[derive(Debug, Clone)]
pub struct SwaggerUi {
    path: String,
    title: String,
    doc_expansion: DocExpansion,
    swagger_version: String,
}

impl SwaggerUi {
    /// Creates the page for the docs mount `path`.
    ///
    /// A trailing slash is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DocsError::InvalidPath`] if `path` does not start with `/`
    /// or names the root.
    pub fn new(path: &str) -> DocsResult<Self> {
        if !path.starts_with('/') {
            return Err(DocsError::InvalidPath {
                path: path.to_string(),
                reason: "must start with '/'".to_string(),
            });
        }
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(DocsError::InvalidPath {
                path: path.to_string(),
                reason: "the root path is reserved for routes".to_string(),
            });
        }

        Ok(Self {
            path: trimmed.to_string(),
            title: "Swagger UI".to_string(),
            doc_expansion: DocExpansion::List,
            swagger_version: "5.18.2".to_string(),
        })
    }

    /// Sets the page title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the document expansion level.
    #[must_use]
    pub fn doc_expansion(mut self, expansion: DocExpansion) -> Self {
        self.doc_expansion = expansion;
        self
    }

    /// The path the page is served at.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path the JSON document is served at.
    #[must_use]
    pub fn spec_path(&self) -> String {
        format!("{}/openapi.json", self.path)
    }

    /// Renders the page.
    #[must_use]
    pub fn html(&self) -> String {
        format!(
            r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@{version}/swagger-ui.css" />
    <style>
        body {{
            margin: 0;
            background: #fafafa;
        }}
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@{version}/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {{
            window.ui = SwaggerUIBundle({{
                url: '{spec_path}',
                dom_id: '#swagger-ui',
                deepLinking: true,
                docExpansion: '{doc_expansion}',
                presets: [SwaggerUIBundle.presets.apis],
            }});
        }};
    </script>
</body>
</html>"##,
            title = html_escape(&self.title),
            version = self.swagger_version,
            spec_path = html_escape(&self.spec_path()),
            doc_expansion = self.doc_expansion.as_str(),
        )
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
