//! Logging setup for binaries embedding the poller
//!
//! The library only emits `tracing` events. Binaries call [`init_logging`] once
//! to install a subscriber that prints `timestamp [LEVEL] target: message`.

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::error::{Wr3223Error, Wr3223Result};

fn format_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    }
}

/// Event format: `2026-01-05T10:00:00.000000Z [INFO] wr3223::controller: message`
struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(writer, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        let metadata = event.metadata();
        write!(
            writer,
            "{} {}: ",
            format_level(metadata.level()),
            metadata.target()
        )?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Build the filter: `RUST_LOG` when set, `default_directive` otherwise.
pub fn env_filter(default_directive: &str) -> Wr3223Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .map_err(|e| Wr3223Error::configuration(format!("Invalid log directive: {}", e)))
}

/// Install the global subscriber.
///
/// Fails when the directive is invalid or a subscriber is already installed.
pub fn init_logging(default_directive: &str) -> Wr3223Result<()> {
    let filter = env_filter(default_directive)?;
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().event_format(BracketedLevelFormat))
        .try_init()
        .map_err(|e| Wr3223Error::configuration(format!("Failed to initialise logging: {}", e)))
}
