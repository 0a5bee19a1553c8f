//! Logging setup and helpers for logging ledger API traffic.

use std::{fs::OpenOptions, path::Path, sync::Arc};

use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

/// Response bodies longer than this many bytes are truncated at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Install the global tracing subscriber.
///
/// Logs go to stderr so that they do not mix with the output of the terminal
/// front end. The level defaults to `warn` and can be changed with `RUST_LOG`.
/// If `debug_log_path` is given, everything at `debug` and above is also
/// appended to that file.
pub fn setup_logging(debug_log_path: Option<&Path>) {
    let stderr_log = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")));

    let debug_log = debug_log_path.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(log_file) => Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(log_file))
                    .with_filter(filter::LevelFilter::DEBUG),
            ),
            Err(error) => {
                eprintln!("Could not open log file {}: {error}", path.display());
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(stderr_log)
        .with(debug_log)
        .init();
}

/// Log a response from the ledger API.
///
/// Bodies longer than [LOG_BODY_LENGTH_LIMIT] bytes are truncated at the
/// `info` level and logged in full at the `debug` level.
pub(crate) fn log_response(method: &str, url: &str, status: u16, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "{method} {url} -> {status}\nbody: {}...",
            truncate(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("{method} {url} -> {status}\nbody: {body:?}");
    }
}

/// The longest prefix of `text` that is at most `limit` bytes and ends on a
/// character boundary.
fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }

    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}
