//! Process logger.
//!
//! Prints `[elapsed LEVEL target] message` to stderr. Console output meant for
//! the user (marker lists, instructions) goes to stdout, so the two streams
//! never interleave inside one line. Records from other crates are capped at
//! `Warn` so `debug` shows only this workspace's pipeline.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, fmt::format::FmtSpan, util::SubscriberInitExt, EnvFilter};

/// Targets of the workspace crates all start with this.
const OWN_TARGET_PREFIX: &str = "aruco_nav";

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

impl StderrLogger {
    fn allows(&self, level: Level, target: &str) -> bool {
        let cap = if target.starts_with(OWN_TARGET_PREFIX) {
            self.level
        } else {
            self.level.min(LevelFilter::Warn)
        };
        level <= cap
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.allows(metadata.level(), metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{:7.3}s {:>5} {}] {}",
            self.started.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger at `level`. Later calls keep the first logger.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| StderrLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Install a `tracing` subscriber on stderr, filtered by `RUST_LOG`.
///
/// Without `RUST_LOG` the filter is `aruco_nav=info,warn`. `log` records are
/// bridged into the subscriber.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{OWN_TARGET_PREFIX}=info,warn")));
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);

    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}
