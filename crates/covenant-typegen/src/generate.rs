//! Writes the contract artifact: the emitted type module and its index.

use crate::emitter::TypeEmitter;
use crate::error::{TypegenError, TypegenResult};
use covenant_http::{Router, RouterError};
use covenant_openapi::OpenApiDocument;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the module re-exporting the generated types
pub const INDEX_FILE: &str = "index.ts";

pub static INDEX_TEMPLATE: &str = r#"import type { components, operations, paths } from './server'

export type { components, operations, paths }

export type Schemas = components['schemas']
export type Schema<Name extends keyof Schemas> = Schemas[Name]

type JsonContent<T> = T extends { content: { 'application/json': infer Body } } ? Body : never

export type OperationParameters<Id extends keyof operations> =
  operations[Id] extends { parameters: infer Parameters } ? Parameters : never

export type RequestBody<Id extends keyof operations> =
  operations[Id] extends { requestBody: infer Body } ? JsonContent<Body> : never

export type ResponseBody<
  Id extends keyof operations,
  Status extends keyof operations[Id]['responses']
> = JsonContent<operations[Id]['responses'][Status]>
"#;

/// Outcome of a generation run
#[derive(Debug, Clone)]
pub struct GeneratedTypes {
    pub document: OpenApiDocument,
    /// Files whose content changed on disk
    pub written: Vec<PathBuf>,
}

/// Mount the router, compile its document and write the type module plus
/// `index.ts` into `out_dir`.
///
/// With `DEBUG` set in the environment the document and the emitted module
/// are logged at debug level.
pub fn generate_types<M>(
    mount: M,
    out_dir: &Path,
    emitter: &dyn TypeEmitter,
) -> TypegenResult<GeneratedTypes>
where
    M: FnOnce() -> Result<Router, RouterError>,
{
    let router = mount()?;
    let document = router.to_openapi();
    let debug = std::env::var_os("DEBUG").is_some();

    if debug {
        tracing::debug!("{}", serde_json::to_string_pretty(&document)?);
    }
    let types = emitter.emit(&document)?;
    if debug {
        tracing::debug!("{}", types);
    }

    let mut written = Vec::new();
    for (file, content) in [(emitter.file_name(), types.as_str()), (INDEX_FILE, INDEX_TEMPLATE)] {
        let path = out_dir.join(file);
        if write_if_changed(&path, content)? {
            written.push(path);
        }
    }

    tracing::info!(
        "Generated contract types in {} ({} paths, {} schemas)",
        out_dir.display(),
        document.paths.len(),
        document.components.schemas.len()
    );

    Ok(GeneratedTypes { document, written })
}

/// Write `content` unless the file already holds it. Returns whether the
/// file was written.
pub fn write_if_changed(path: &Path, content: &str) -> TypegenResult<bool> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TypegenError::io(parent, e))?;
    }

    if path.exists() {
        let existing = fs::read_to_string(path).map_err(|e| TypegenError::io(path, e))?;
        if existing == content {
            return Ok(false);
        }
    }

    fs::write(path, content).map_err(|e| TypegenError::io(path, e))?;
    Ok(true)
}
