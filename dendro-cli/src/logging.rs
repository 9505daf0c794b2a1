//! Logging initialisation for the dendro CLI.
//!
//! Installs a global `tracing` subscriber writing to stderr, formatted for
//! humans or as JSON lines, and bridges the `log` facade so crates using
//! either API emit structured events.

use std::{env, ffi::OsString, sync::OnceLock};

use thiserror::Error;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, Layer, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Environment variable selecting the log format.
pub const LOG_FORMAT_ENV: &str = "DENDRO_LOG_FORMAT";

const DEFAULT_DIRECTIVE: &str = "info";

static INITIALISED: OnceLock<LogFormat> = OnceLock::new();

/// Output format for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line human-readable output.
    #[default]
    Human,
    /// One JSON object per line, with span context.
    Json,
}

/// Errors raised while initialising structured logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Environment variable contained invalid UTF-8 data.
    #[error("environment variable `{name}` contained invalid UTF-8: {raw:?}")]
    InvalidUnicode {
        /// Name of the offending environment variable.
        name: &'static str,
        /// Raw value as read from the environment.
        raw: OsString,
    },
    /// Unsupported log format requested via `DENDRO_LOG_FORMAT`.
    #[error("unsupported log format `{provided}`; expected `human` or `json`")]
    UnsupportedFormat {
        /// Raw value supplied by the user.
        provided: String,
    },
}

/// Install global structured logging if it has not already been configured,
/// returning the format in effect.
///
/// `DENDRO_LOG_FORMAT=json` switches to JSON lines; unset or `human` keeps
/// the default. `RUST_LOG` filters events and defaults to `info`. Output goes
/// to stderr so command results on stdout stay parseable. When another
/// subscriber already owns the global slot it is left in place.
///
/// # Errors
/// Returns [`LoggingError`] if `DENDRO_LOG_FORMAT` is not valid Unicode or
/// names an unsupported format.
pub fn init_logging() -> Result<LogFormat, LoggingError> {
    if let Some(format) = INITIALISED.get() {
        return Ok(*format);
    }

    let format = format_from_env(env::var_os(LOG_FORMAT_ENV))?;
    if let Err(source) = install_subscriber(format) {
        eprintln!("structured logging already configured elsewhere: {source}");
    }
    Ok(*INITIALISED.get_or_init(|| format))
}

fn install_subscriber(format: LogFormat) -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);

    let fmt_layer = match format {
        LogFormat::Json => fmt_layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
        LogFormat::Human => fmt_layer.boxed(),
    };

    // Best-effort: another logger may already own the `log` slot.
    let _ = LogTracer::init();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
}

fn format_from_env(raw: Option<OsString>) -> Result<LogFormat, LoggingError> {
    let Some(raw) = raw else {
        return Ok(LogFormat::default());
    };
    match raw.into_string() {
        Ok(text) => parse_log_format(&text),
        Err(raw) => Err(LoggingError::InvalidUnicode {
            name: LOG_FORMAT_ENV,
            raw,
        }),
    }
}

fn parse_log_format(raw: &str) -> Result<LogFormat, LoggingError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "human" => Ok(LogFormat::Human),
        "json" => Ok(LogFormat::Json),
        other => Err(LoggingError::UnsupportedFormat {
            provided: other.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case("human", LogFormat::Human)]
    #[case("HUMAN", LogFormat::Human)]
    #[case(" json ", LogFormat::Json)]
    fn parse_log_format_accepts_supported_values(#[case] raw: &str, #[case] expected: LogFormat) {
        let format = parse_log_format(raw).expect("format must parse");
        assert_eq!(format, expected);
    }

    #[test]
    fn parse_log_format_rejects_unknown_values() {
        let err = parse_log_format("xml").expect_err("xml is not supported");
        match err {
            LoggingError::UnsupportedFormat { provided } => assert_eq!(provided, "xml"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unset_format_defaults_to_human() {
        assert_eq!(format_from_env(None).expect("unset is valid"), LogFormat::Human);
    }

    #[cfg(unix)]
    #[test]
    fn non_unicode_format_is_rejected() {
        use std::os::unix::ffi::OsStringExt;

        let raw = OsString::from_vec(vec![0x6a, 0xff, 0x73]);
        let err = format_from_env(Some(raw)).expect_err("invalid UTF-8 must fail");
        assert!(matches!(
            err,
            LoggingError::InvalidUnicode { name: LOG_FORMAT_ENV, .. }
        ));
    }

    #[test]
    fn init_logging_is_idempotent() {
        let first = init_logging().expect("logging must initialise");
        let second = init_logging().expect("subsequent calls must be no-ops");
        assert_eq!(first, second);
    }
}
