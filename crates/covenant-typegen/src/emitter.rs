//! Type emitters turn a compiled document into the text of a type module.

use crate::error::{TypegenError, TypegenResult};
use covenant_openapi::OpenApiDocument;
use std::io::Write;
use std::process::{Command, Stdio};

/// Default name of the generated type module
pub const SERVER_TYPES_FILE: &str = "server.ts";

/// Compiles an OpenAPI document into static type definitions
pub trait TypeEmitter {
    fn emit(&self, document: &OpenApiDocument) -> TypegenResult<String>;

    /// File the emitted text is written to
    fn file_name(&self) -> &str {
        SERVER_TYPES_FILE
    }
}

/// Delegates emission to an external program.
///
/// The document is written as JSON to the program's stdin and its stdout is
/// taken as the generated module, e.g. `npx openapi-typescript /dev/stdin`.
#[derive(Debug, Clone)]
pub struct CommandEmitter {
    program: String,
    args: Vec<String>,
}

impl CommandEmitter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Split a whitespace separated command line into program and arguments
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next()?;
        Some(parts.fold(Self::new(program), |emitter, arg| emitter.arg(arg)))
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl TypeEmitter for CommandEmitter {
    fn emit(&self, document: &OpenApiDocument) -> TypegenResult<String> {
        let input = serde_json::to_vec(document)?;
        tracing::debug!("Running type emitter `{}`", self.command_line());

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TypegenError::command(self.command_line(), e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&input)
                .map_err(|e| TypegenError::command(self.command_line(), e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| TypegenError::command(self.command_line(), e.to_string()))?;
        if !output.status.success() {
            return Err(TypegenError::command(
                self.command_line(),
                format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
