use clap::Parser;
use std::process::ExitCode;
use tidyup::cli::{Cli, run_cli};
use tidyup::logging;
use tidyup::output::OutputFormatter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(logging::level_for(cli.verbose), cli.log_file.as_deref()) {
        OutputFormatter::warning(&format!("Could not open log file: {e}"));
    }

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::debug!("{e:?}");
            OutputFormatter::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
