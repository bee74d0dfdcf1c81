use std::io::{self, IsTerminal};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Builds the filter from `RUST_LOG`, falling back to `default`.
///
/// `default` is a full directive string, e.g. `"info,rag_store=debug"`.
pub fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber for the binary.
///
/// - RFC3339 UTC timestamps
/// - compact single-line format with target
/// - span close events (duration of `#[instrument]`ed provider calls)
/// - ANSI colors only when stderr is a terminal
///
/// Returns `false` if a global subscriber was already set (e.g. in tests).
pub fn init(default: &str) -> bool {
    let use_ansi = io::stderr().is_terminal();

    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(ChronoRfc3339Utc)
        .with_target(true)
        .with_ansi(use_ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter(default))
        .with(layer)
        .try_init()
        .is_ok()
}
