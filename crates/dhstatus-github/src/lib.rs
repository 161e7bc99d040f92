//! GitHub REST client for deckhouse-status
//!
//! Fetches pull-request metadata and the edition build check-run, and polls
//! check-runs with `If-None-Match` so unchanged answers cost no rate limit.

pub mod client;
pub mod config;
pub mod http;
pub mod types;

pub use client::GitHubClient;
pub use config::GitHubConfig;
pub use http::{rate_limit_wait, Conditional};
