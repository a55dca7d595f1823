//! Device census agent entry point.

use clap::Parser;
use ct_core::cli::Cli;
use ct_core::logging::init_logging;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, &cli.effective_log_level());

    let code = ct_core::run(&cli);
    std::process::exit(code.code());
}
