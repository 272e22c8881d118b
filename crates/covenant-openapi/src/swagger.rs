/*!
Swagger UI page for interactive API documentation.

The page loads the Swagger UI bundle from a CDN and points it at the JSON
document served next to it.
*/

/// Swagger UI release loaded from the CDN
pub const SWAGGER_UI_VERSION: &str = "5.11.0";

/// Configuration for the Swagger UI page
#[derive(Debug, Clone)]
pub struct SwaggerUiConfig {
    /// Page title
    pub title: String,
    /// URL of the JSON document, relative to the page
    pub spec_url: String,
    /// CDN base serving the `swagger-ui-dist` assets
    pub cdn_base: String,
    /// Custom CSS
    pub custom_css: Option<String>,
    pub deep_linking: bool,
}

impl Default for SwaggerUiConfig {
    fn default() -> Self {
        Self {
            title: "API Documentation".to_string(),
            spec_url: "swagger.json".to_string(),
            cdn_base: format!("https://unpkg.com/swagger-ui-dist@{}", SWAGGER_UI_VERSION),
            custom_css: None,
            deep_linking: true,
        }
    }
}

impl SwaggerUiConfig {
    pub fn new(spec_url: impl Into<String>) -> Self {
        Self {
            spec_url: spec_url.into(),
            ..Self::default()
        }
    }

    /// Set the page title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set custom CSS appended to the page styles
    pub fn custom_css(mut self, css: impl Into<String>) -> Self {
        self.custom_css = Some(css.into());
        self
    }

    /// Render the HTML page
    pub fn index_html(&self) -> String {
        let custom_css = self.custom_css.as_deref().unwrap_or("");

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="{cdn}/swagger-ui.css" />
    <style>
        html {{
            box-sizing: border-box;
            overflow-y: scroll;
        }}

        body {{
            margin: 0;
            background: #fafafa;
        }}

        {custom_css}
    </style>
</head>
<body>
    <div id="swagger-ui"></div>

    <script src="{cdn}/swagger-ui-bundle.js"></script>
    <script src="{cdn}/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {{
            window.ui = SwaggerUIBundle({{
                url: '{spec_url}',
                dom_id: '#swagger-ui',
                deepLinking: {deep_linking},
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout",
                validatorUrl: null
            }});
        }};
    </script>
</body>
</html>"#,
            title = self.title,
            cdn = self.cdn_base,
            custom_css = custom_css,
            spec_url = self.spec_url,
            deep_linking = self.deep_linking,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_points_at_document() {
        let html = SwaggerUiConfig::new("/docs/swagger.json")
            .title("Orders API")
            .index_html();
        assert!(html.contains("<title>Orders API - Swagger UI</title>"));
        assert!(html.contains("url: '/docs/swagger.json'"));
        assert!(html.contains("swagger-ui-dist@5.11.0/swagger-ui-bundle.js"));
    }
}
