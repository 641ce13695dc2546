use super::*;
use std::io::{stderr, stdout};
use tracing_subscriber::{fmt::writer::MakeWriterExt, prelude::*};

fn default_level() -> Level {
    if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Install the global subscriber. `FOLIO_LOG` (`error`..`trace`) overrides
/// the build-dependent default level.
#[inline]
pub fn init_logger() {
    let level = std::env::var("FOLIO_LOG")
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or_else(default_level);

    init_logger_with_level(level);
}

pub fn init_logger_with_level(level: Level) {
    let writer = stderr
        .with_max_level(Level::WARN)
        .or_else(stdout.with_max_level(level));

    let installed = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .map_writer(move |_| writer)
                .map_event_format(|e| FolioFormatter {
                    default: e.with_timer(LogTime),
                })
                .with_filter(GeneralFilter { max_level: level }),
        )
        .try_init();

    if installed.is_err() {
        debug!("global logger already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installing_twice_is_harmless() {
        init_logger_with_level(Level::TRACE);
        init_logger_with_level(Level::INFO);
        info!("logger installed");
        warn!("warnings go to stderr");
        assert!(tracing::dispatcher::has_been_set());
    }
}
