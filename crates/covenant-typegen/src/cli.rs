//! `generate-types` command line runner
//!
//! Applications call [`run`] from a small binary, passing the function that
//! mounts their routes:
//!
//! ```no_run
//! use covenant_http::{Router, RouterConfig, RouterError};
//!
//! fn mount() -> Result<Router, RouterError> {
//!     Ok(Router::new(RouterConfig::new()))
//! }
//!
//! fn main() -> std::process::ExitCode {
//!     covenant_typegen::cli::run(mount)
//! }
//! ```

use crate::emitter::{CommandEmitter, TypeEmitter};
use crate::error::{TypegenError, TypegenResult};
use crate::generate::generate_types;
use crate::git::contract_diff;
use crate::manifest::{bump_patch_version, default_package_dir, read_version, VersionBump};
use crate::typescript::TypeScriptEmitter;
use clap::Parser;
use covenant_http::{Router, RouterError};
use inquire::Confirm;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Parser)]
#[command(name = "generate-types")]
#[command(about = "Generate TypeScript contract types from the mounted routes")]
pub struct Args {
    /// Directory receiving server.ts and index.ts
    pub contract_path: PathBuf,

    /// Directory holding the contract package.json (defaults to the parent of the contract path)
    pub contract_dir: Option<PathBuf>,

    /// Fail when the generated contract differs from the committed one
    #[arg(long)]
    pub ci: bool,

    /// Increment the contract version without asking
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// External emitter receiving the OpenAPI document on stdin
    #[arg(long, value_name = "COMMAND")]
    pub emitter: Option<String>,
}

/// Result of a generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Unchanged,
    Changed { bump: Option<VersionBump> },
}

impl Outcome {
    /// Whether the run should exit with a failure status
    pub fn fails(&self, ci: bool) -> bool {
        ci && matches!(self, Outcome::Changed { .. })
    }
}

/// Parse the process arguments, generate the contract and report the exit status
pub fn run<M>(mount: M) -> ExitCode
where
    M: FnOnce() -> Result<Router, RouterError>,
{
    let args = Args::parse();
    match execute(&args, mount) {
        Ok(outcome) if outcome.fails(args.ci) => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {}", error);
            ExitCode::FAILURE
        }
    }
}

/// Generate the contract, diff it against the index and optionally bump the
/// contract package version
pub fn execute<M>(args: &Args, mount: M) -> TypegenResult<Outcome>
where
    M: FnOnce() -> Result<Router, RouterError>,
{
    let emitter: Box<dyn TypeEmitter> = match &args.emitter {
        Some(command) => Box::new(
            CommandEmitter::parse(command)
                .ok_or_else(|| TypegenError::command(command, "empty command"))?,
        ),
        None => Box::new(TypeScriptEmitter::new()),
    };
    generate_types(mount, &args.contract_path, emitter.as_ref())?;

    let Some(patch) = contract_diff(&args.contract_path)? else {
        println!("No changes.");
        return Ok(Outcome::Unchanged);
    };

    println!("Types have changed since the last commit.");
    println!("{}", patch);
    if args.ci {
        return Ok(Outcome::Changed { bump: None });
    }

    let package_dir = match &args.contract_dir {
        Some(dir) => dir.clone(),
        None => {
            let dir = default_package_dir(&args.contract_path);
            println!(
                "contract-dir not set, resolving to parent folder of contract: {}",
                dir.display()
            );
            dir
        }
    };

    let version = read_version(&package_dir)?;
    let confirmed = args.yes
        || Confirm::new(&format!(
            "Current contract version is {} - Do you want to increment the version?",
            version
        ))
        .with_default(true)
        .prompt()?;

    if !confirmed {
        return Ok(Outcome::Changed { bump: None });
    }

    println!("Attempting to increment package version.");
    let bump = bump_patch_version(&package_dir)?;
    println!("Package version incremented to {}", bump.current);
    Ok(Outcome::Changed { bump: Some(bump) })
}
