//! Logger setup for the binary. Library code only uses the `log` macros.

use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::fs::File;
use std::io;
use std::path::Path;

/// Maps the number of `-v` flags to a level: warn, info, debug, trace.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Logs to stderr at `level`, and everything from debug up to `log_file`
/// when one is given.
///
/// # Errors
///
/// The error from opening `log_file`. The stderr logger is installed either
/// way.
pub fn init(level: LevelFilter, log_file: Option<&Path>) -> io::Result<()> {
    let term_config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        term_config,
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    let mut result = Ok(());
    if let Some(path) = log_file {
        match File::options().create(true).append(true).open(path) {
            Ok(file) => loggers.push(WriteLogger::new(
                level.max(LevelFilter::Debug),
                ConfigBuilder::new().build(),
                file,
            )),
            Err(e) => result = Err(e),
        }
    }

    // A second init (e.g. from tests) keeps the first logger.
    let _ = CombinedLogger::init(loggers);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(1), LevelFilter::Info);
        assert_eq!(level_for(2), LevelFilter::Debug);
        assert_eq!(level_for(9), LevelFilter::Trace);
    }

    #[test]
    fn test_unopenable_log_file_keeps_terminal_logging() {
        let dir = tempfile::TempDir::new().unwrap();
        let bad = dir.path().join("missing").join("tidyup.log");

        assert!(init(LevelFilter::Info, Some(&bad)).is_err());
        assert_ne!(log::max_level(), LevelFilter::Off);
    }
}
