//! Log output for the sampler binary.

use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
    util::TryInitError,
    EnvFilter,
};

/// Level used when `RUST_LOG` is unset: `info`, `debug` from one `-v` and
/// `trace` from two or more.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Installs the global subscriber on stderr, keeping stdout for `inspect`
/// reports. `RUST_LOG` takes precedence over `verbosity`.
///
/// Batch timings (`batch` span closes) are only printed when debug output is
/// enabled.
pub fn init(verbosity: u8) -> Result<(), TryInitError> {
    let filter = EnvFilter::builder()
        .with_default_directive(level_for(verbosity).into())
        .from_env_lossy();
    let span_events = match filter.max_level_hint() {
        Some(level) if level >= LevelFilter::DEBUG => FmtSpan::CLOSE,
        _ => FmtSpan::NONE,
    };

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity > 1)
        .with_timer(fmt::time::uptime())
        .with_span_events(span_events);

    tracing_subscriber::registry().with(filter).with(layer).try_init()
}
