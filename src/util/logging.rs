use tracing_subscriber::EnvFilter;

use crate::util::env::env_opt;

/// Output style for the fmt subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStyle {
    /// Single-line events with file/line, for interactive runs.
    Compact,
    /// Multi-field default formatter with targets, for log files.
    Full,
}

impl LogStyle {
    /// `TIKI_LOG_STYLE=full` selects [`LogStyle::Full`]; anything else is compact.
    pub fn from_env() -> Self {
        match env_opt("TIKI_LOG_STYLE").as_deref() {
            Some(s) if s.eq_ignore_ascii_case("full") => LogStyle::Full,
            _ => LogStyle::Compact,
        }
    }
}

/// Install the global tracing subscriber.
///
/// `default_filter` applies when `RUST_LOG` is unset. A second call returns an
/// error instead of panicking so tests and the binary can both call it.
pub fn init_tracing(default_filter: &str, style: LogStyle) -> Result<(), anyhow::Error> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_line_number(true)
        .with_file(true);

    let res = match style {
        LogStyle::Compact => builder.with_target(false).compact().try_init(),
        LogStyle::Full => builder.with_target(true).try_init(),
    };
    res.map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))
}
