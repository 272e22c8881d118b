//! Regenerate the TypeScript contract of the todo API
//!
//! `cargo run --bin generate-types -- contract/src [contract] [--ci] [--yes]`

use covenant::http::{init_logging, LoggingConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let logging = if std::env::var_os("DEBUG").is_some() {
        LoggingConfig::development()
    } else {
        LoggingConfig::default().with_env_filter("warn")
    };
    if let Err(error) = init_logging(logging) {
        eprintln!("Could not initialize logging: {}", error);
    }

    covenant::typegen::cli::run(covenant_demo::mount)
}
