//! Backend endpoint resolution.
//!
//! The configured base may be a bare host (`localhost:3000`) or carry a
//! scheme. HTTP calls and the event socket derive their URLs from it.

use std::fmt;

use anyhow::{Context, Result};
use url::Url;

use crate::transport::ConnectParams;

/// Path of the Socket.IO endpoint on the backend.
pub const SOCKET_PATH: &str = "/socket.io/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: Url,
}

impl Endpoint {
    /// Parses a base URL. Bare hosts default to plain `http`.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim().trim_end_matches('/');
        let with_scheme = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("http://{raw}")
        };
        let base = Url::parse(&with_scheme)
            .with_context(|| format!("Invalid backend URL: {raw}"))?;
        match base.scheme() {
            "http" | "https" | "ws" | "wss" => {}
            other => anyhow::bail!("Unsupported backend scheme: {other}"),
        }
        if base.host_str().is_none() {
            anyhow::bail!("Backend URL has no host: {raw}");
        }
        Ok(Self { base })
    }

    fn is_secure(&self) -> bool {
        matches!(self.base.scheme(), "https" | "wss")
    }

    fn authority(&self) -> String {
        let host = self.base.host_str().unwrap_or("localhost");
        match self.base.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    /// Returns the HTTP(S) URL for a path such as `/api/options/config`.
    pub fn http_url(&self, path: &str) -> String {
        let scheme = if self.is_secure() { "https" } else { "http" };
        format!(
            "{scheme}://{}/{}",
            self.authority(),
            path.trim_start_matches('/')
        )
    }

    /// Returns the WebSocket URL of the event stream for the given params.
    pub fn socket_url(&self, params: &ConnectParams) -> String {
        let scheme = if self.is_secure() { "wss" } else { "ws" };
        let mut url = format!("{scheme}://{}{SOCKET_PATH}", self.authority());
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("EIO", "4")
            .append_pair("transport", "websocket")
            .append_pair("latest_event_id", &params.latest_event_id.to_string())
            .append_pair("conversation_id", &params.conversation_id)
            .finish();
        url.push('?');
        url.push_str(&query);
        url
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.base.scheme(), self.authority())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(latest: i64) -> ConnectParams {
        ConnectParams {
            latest_event_id: latest,
            conversation_id: "abc 1".to_string(),
        }
    }

    #[test]
    fn test_bare_host_uses_plain_schemes() {
        let endpoint = Endpoint::parse("localhost:3000").unwrap();
        assert_eq!(
            endpoint.http_url("/api/options/config"),
            "http://localhost:3000/api/options/config"
        );
        assert_eq!(
            endpoint.socket_url(&params(-1)),
            "ws://localhost:3000/socket.io/?EIO=4&transport=websocket&latest_event_id=-1&conversation_id=abc+1"
        );
    }

    #[test]
    fn test_https_maps_to_wss() {
        let endpoint = Endpoint::parse("https://oh.example.com/").unwrap();
        assert_eq!(
            endpoint.http_url("api/github/callback"),
            "https://oh.example.com/api/github/callback"
        );
        assert!(endpoint.socket_url(&params(7)).starts_with("wss://oh.example.com/socket.io/?"));
        assert!(endpoint.socket_url(&params(7)).contains("latest_event_id=7"));
    }

    #[test]
    fn test_display_shows_scheme_and_authority() {
        let endpoint = Endpoint::parse("127.0.0.1:3000").unwrap();
        assert_eq!(endpoint.to_string(), "http://127.0.0.1:3000");
    }

    #[test]
    fn test_rejects_unknown_scheme() {
        assert!(Endpoint::parse("ftp://example.com").is_err());
    }
}
