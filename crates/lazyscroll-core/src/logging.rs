#![forbid(unsafe_code)]

//! Subscriber installation for binaries and harnesses.
//!
//! The library itself only emits `tracing` events. Hosts that do not bring
//! their own subscriber can call [`init`] (feature `subscriber`). The filter
//! comes from `LAZYSCROLL_LOG`, then `RUST_LOG`, then defaults to `info`.

use std::fmt;

/// Filter variable checked before `RUST_LOG`.
pub const ENV_LOG: &str = "LAZYSCROLL_LOG";

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LogFormat {
    /// Human-readable, multi-field lines.
    #[default]
    Full,
    /// Terse single lines.
    Compact,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parse `full`, `compact` or `json`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "full" | "text" => Some(Self::Full),
            "compact" => Some(Self::Compact),
            "json" | "jsonl" => Some(Self::Json),
            _ => None,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Full => "full",
            Self::Compact => "compact",
            Self::Json => "json",
        })
    }
}

/// Install a global subscriber writing to stderr.
///
/// Fails if a global subscriber is already set.
#[cfg(feature = "subscriber")]
pub fn init(format: LogFormat) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(ENV_LOG)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
}
