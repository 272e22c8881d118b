/*!
Export functionality for compiled documents.

Documents can be rendered as JSON or YAML, or written straight to disk with
the format picked from the file extension.
*/

use crate::{
    error::{OpenApiError, OpenApiResult},
    specification::OpenApiDocument,
};
use std::path::Path;

/// Render the document as JSON
pub fn to_json(document: &OpenApiDocument, pretty: bool) -> OpenApiResult<String> {
    if pretty {
        serde_json::to_string_pretty(document).map_err(OpenApiError::from)
    } else {
        serde_json::to_string(document).map_err(OpenApiError::from)
    }
}

/// Render the document as YAML
pub fn to_yaml(document: &OpenApiDocument) -> OpenApiResult<String> {
    serde_yaml::to_string(document).map_err(OpenApiError::from)
}

/// Write the document to `path` (`.yaml`/`.yml` as YAML, anything else as JSON)
pub fn write_to_file(document: &OpenApiDocument, path: impl AsRef<Path>) -> OpenApiResult<()> {
    let path = path.as_ref();
    let contents = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => to_yaml(document)?,
        _ => to_json(document, true)?,
    };
    std::fs::write(path, contents)?;
    tracing::info!("Wrote OpenAPI document to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::compile;
    use crate::routes::RouteDefinitions;
    use crate::specification::BaseProperties;

    fn document() -> OpenApiDocument {
        compile(&RouteDefinitions::new(), &BaseProperties::new("Export", "2.0.0"))
    }

    #[test]
    fn test_json_round_trip() {
        let document = document();
        let json = to_json(&document, false).unwrap();
        let parsed: OpenApiDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, document);
    }

    #[test]
    fn test_write_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openapi.yaml");
        write_to_file(&document(), &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("openapi:"));
        assert!(contents.contains("3.0.3"));
        assert!(contents.contains("title: Export"));
    }
}
