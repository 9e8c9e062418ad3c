use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub enum ClientKind {
    Standard,
    /// Skips certificate verification. Corporate TLS-interception proxies
    /// make the public portal unreachable otherwise; opt-in only.
    InsecureTls,
}

impl ClientKind {
    /// Pick the client kind from `ALLOW_INSECURE_SSL`.
    pub fn from_env() -> Self {
        match std::env::var("ALLOW_INSECURE_SSL") {
            Ok(v) if crate::config::parse_flag(&v) => ClientKind::InsecureTls,
            _ => ClientKind::Standard,
        }
    }
}

/// Factory for the HTTP client shared by the schema resolver and executor.
pub fn create_client(kind: ClientKind) -> Result<Client> {
    let builder = Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent("boampscan/0.1");

    match kind {
        ClientKind::InsecureTls => builder
            .danger_accept_invalid_certs(true)
            .build()
            .context("Failed to build insecure-TLS client"),
        ClientKind::Standard => builder.build().context("Failed to build standard client"),
    }
}
