//! Conversions from HTTP client failures into [`SourceError`].

use dhstatus_core::SourceError;

pub(crate) fn transport(err: reqwest::Error) -> SourceError {
    SourceError::Transport(err.without_url().to_string())
}

pub(crate) fn auth(message: impl Into<String>) -> SourceError {
    SourceError::Auth(message.into())
}

pub(crate) fn http_status(status: reqwest::StatusCode) -> SourceError {
    SourceError::Protocol(format!("HTTP {}", status.as_u16()))
}
