//! Logging for the `deckhouse-status` binary.
//!
//! The report is the only thing written to stdout; every log line goes to
//! stderr so `deckhouse-status -s | …` stays parseable. The CLI runs quiet
//! (WARN) unless `--verbose` asks for DEBUG, and `RUST_LOG` overrides both.
//! Request traces log at DEBUG, so by default only failures show up, such
//! as a registry check or a build poll that errored.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Verbosity used when `RUST_LOG` is unset.
pub fn default_level(verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        Level::WARN
    }
}

fn filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the process-wide subscriber: plain text, or one JSON object per
/// line when `json` is set.
///
/// Returns `false` when a subscriber was already installed; the earlier one
/// stays in effect.
pub fn init_tracing(json: bool, level: Level) -> bool {
    let text_layer =
        (!json).then(|| fmt::layer().with_target(false).with_writer(std::io::stderr));
    let json_layer = json.then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
    });

    tracing_subscriber::registry()
        .with(filter(level))
        .with(text_layer)
        .with(json_layer)
        .try_init()
        .is_ok()
}
