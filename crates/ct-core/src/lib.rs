//! Census Taker agent core: CLI, logging, and run orchestration.

pub mod cli;
pub mod exit_codes;
pub mod logging;
pub mod run;

pub use cli::Cli;
pub use exit_codes::ExitCode;
pub use run::{run, RunReport};
