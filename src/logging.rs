//! Console logging for the command-line driver.
//!
//! The library only talks to the `log` facade; binaries decide where records go.

use log::LevelFilter;

/// Installs a stderr logger. Noisy driver-level crates are capped at `warn`.
pub fn init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .level_for("keyring", LevelFilter::Warn)
        .level_for("oracle", LevelFilter::Warn)
        .chain(std::io::stderr())
        .apply()
}

/// Maps a `-v` count to a level: 0 → info, 1 → debug, more → trace.
pub fn level_from_verbosity(verbosity: usize) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
