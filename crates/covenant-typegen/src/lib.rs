/*!
# covenant-typegen

Static type generation for covenant contracts. The routes of an application
are mounted, compiled into an OpenAPI document and emitted as a TypeScript
module that client packages import.

```rust
use covenant_openapi::{compile, BaseProperties, RouteDefinitions};
use covenant_typegen::{TypeEmitter, TypeScriptEmitter};

let document = compile(&RouteDefinitions::new(), &BaseProperties::new("Empty", "1.0.0"));
let module = TypeScriptEmitter::new().emit(&document).unwrap();
assert!(module.contains("export interface operations {}"));
```
*/

pub use crate::{
    emitter::{CommandEmitter, TypeEmitter, SERVER_TYPES_FILE},
    error::{TypegenError, TypegenResult},
    generate::{generate_types, GeneratedTypes, INDEX_FILE},
    git::contract_diff,
    manifest::{bump_patch_version, VersionBump},
    typescript::TypeScriptEmitter,
};

pub mod cli;
pub mod emitter;
pub mod error;
pub mod generate;
pub mod git;
pub mod manifest;
pub mod typescript;
