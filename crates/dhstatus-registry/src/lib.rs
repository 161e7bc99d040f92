//! Docker Registry v2 probe for deckhouse-status
//!
//! Answers "does the deployed tag still exist, and what digest does it point
//! to?" for any registry speaking the v2 API with bearer-token auth.

pub mod auth;
pub mod client;
pub mod config;
mod error;

pub use auth::{fetch_token, parse_challenge};
pub use client::RegistryClient;
pub use config::RegistryConfig;
