//! Logger setup.

use log::LevelFilter;

/// Installs a timestamped stdout logger. Fails if a logger is already installed.
pub fn init(level: LevelFilter) -> crate::Result<()> {
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
        .level(LevelFilter::Warn)
        .level_for(env!("CARGO_CRATE_NAME"), level)
        .chain(std::io::stdout())
        .apply()?;

    log::debug!("logging initialized at {level}");
    Ok(())
}
