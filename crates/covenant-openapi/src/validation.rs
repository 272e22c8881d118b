//! Structural checks for compiled documents

use crate::specification::{OpenApiDocument, ParameterLocation, OPENAPI_VERSION};
use covenant_schema::DEFINITIONS_PREFIX;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

static TEMPLATE_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^}/]*)\}").expect("template parameter regex"));

/// A problem found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentIssue {
    /// JSON-pointer-like location of the problem
    pub location: String,
    pub message: String,
}

impl DocumentIssue {
    fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DocumentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Check a document for the problems the compiler can introduce
pub fn validate(document: &OpenApiDocument) -> Vec<DocumentIssue> {
    let mut issues = Vec::new();

    if document.openapi != OPENAPI_VERSION {
        issues.push(DocumentIssue::new(
            "/openapi",
            format!("expected version {}, found {}", OPENAPI_VERSION, document.openapi),
        ));
    }

    match &document.info {
        None => issues.push(DocumentIssue::new("/info", "info is required")),
        Some(info) => {
            if info.title.is_empty() {
                issues.push(DocumentIssue::new("/info/title", "title must not be empty"));
            }
            if info.version.is_empty() {
                issues.push(DocumentIssue::new("/info/version", "version must not be empty"));
            }
        }
    }

    let mut operation_ids = HashSet::new();
    for (path, item) in &document.paths {
        let declared: Vec<&str> = TEMPLATE_PARAM
            .captures_iter(path)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();

        for (method, operation) in item {
            let location = format!("/paths/{}/{}", path, method);

            if !operation_ids.insert(operation.operation_id.as_str()) {
                issues.push(DocumentIssue::new(
                    &location,
                    format!("duplicate operationId {}", operation.operation_id),
                ));
            }

            for name in &declared {
                let found = operation
                    .parameters
                    .iter()
                    .any(|p| p.location == ParameterLocation::Path && p.name == *name);
                if !found {
                    issues.push(DocumentIssue::new(
                        &location,
                        format!("path parameter {} is not declared", name),
                    ));
                }
            }
        }
    }

    match serde_json::to_value(document) {
        Ok(value) => check_references(&value, "", document, &mut issues),
        Err(e) => issues.push(DocumentIssue::new("", format!("not serializable: {}", e))),
    }

    issues
}

fn check_references(
    value: &Value,
    location: &str,
    document: &OpenApiDocument,
    issues: &mut Vec<DocumentIssue>,
) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                let resolved = reference
                    .strip_prefix(DEFINITIONS_PREFIX)
                    .map_or(false, |name| document.components.schemas.contains_key(name));
                if !resolved {
                    issues.push(DocumentIssue::new(
                        location,
                        format!("unresolved reference {}", reference),
                    ));
                }
            }
            for (key, child) in map {
                check_references(child, &format!("{}/{}", location, key), document, issues);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                check_references(child, &format!("{}/{}", location, index), document, issues);
            }
        }
        _ => {}
    }
}
