//! GitHub OAuth login against the backend.
//!
//! The backend exchanges the authorization code for a token. The client only
//! records that a token is set (and the token itself when the backend hands
//! it back) in `<OH_HOME>/auth.json` with restricted permissions (0600).
//! Tokens are never logged.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::config::paths;
use crate::endpoint::Endpoint;

/// Path the local callback listener serves.
pub const CALLBACK_PATH: &str = "/oauth/github/callback";

/// How long `wait_for_local_code` waits for the browser.
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const SCOPES: &str = "repo,user,workflow";

/// Stored login state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCredentials {
    pub github_token_is_set: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl AuthCredentials {
    /// Loads credentials from the default path. Missing file = logged out.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::auth_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse credentials from {}", path.display()))
    }

    /// Saves the credentials with restricted permissions (0600).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize credentials")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(path)
                .with_context(|| format!("Failed to open {} for writing", path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(path, contents)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        Ok(())
    }

    /// Removes stored credentials. Returns true if a file was deleted.
    pub fn clear_at(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
        Ok(true)
    }
}

/// Where the app goes after a successful login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    Root,
}

/// Completes an OAuth redirect by exchanging its code with the backend.
#[derive(Debug, Clone)]
pub struct RedirectHandler {
    client: reqwest::Client,
    endpoint: Endpoint,
    auth_path: PathBuf,
}

impl RedirectHandler {
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_auth_path(endpoint, paths::auth_path())
    }

    pub fn with_auth_path(endpoint: Endpoint, auth_path: PathBuf) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            auth_path,
        }
    }

    /// Reads `code` from the redirect URL, exchanges it and records the
    /// token. Errors carry the backend's message verbatim and are not retried.
    pub async fn handle(&self, redirect_url: &str) -> Result<Redirect> {
        let url = url::Url::parse(redirect_url)
            .with_context(|| format!("Invalid redirect URL: {redirect_url}"))?;
        let code = url
            .query_pairs()
            .find(|(k, _)| k == "code")
            .map(|(_, v)| v.to_string())
            .filter(|c| !c.is_empty())
            .context("No authorization code in redirect URL")?;

        let mut redirect_uri = url.clone();
        redirect_uri.set_query(None);
        redirect_uri.set_fragment(None);

        self.exchange(&code, redirect_uri.as_str()).await
    }

    /// Exchanges a code for the given registered redirect URI.
    pub async fn exchange(&self, code: &str, redirect_url: &str) -> Result<Redirect> {
        let response = self
            .client
            .post(self.endpoint.http_url("/api/github/callback"))
            .json(&json!({ "code": code, "redirect_url": redirect_url }))
            .send()
            .await
            .context("Failed to reach the backend")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read the token exchange response")?;
        if !status.is_success() {
            anyhow::bail!("{}", error_message(&body).unwrap_or(body));
        }

        let access_token = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("access_token")?.as_str().map(str::to_string));
        let credentials = AuthCredentials {
            github_token_is_set: true,
            access_token,
        };
        credentials.save_to(&self.auth_path)?;
        info!("GitHub token stored");
        Ok(Redirect::Root)
    }
}

fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "message", "detail"]
        .iter()
        .find_map(|key| value.get(*key)?.as_str().map(str::to_string))
}

/// Fetches the GitHub OAuth client id from the backend's public config.
pub async fn fetch_github_client_id(endpoint: &Endpoint) -> Result<String> {
    let config: Value = reqwest::get(endpoint.http_url("/api/options/config"))
        .await
        .context("Failed to fetch backend config")?
        .error_for_status()
        .context("Backend config request failed")?
        .json()
        .await
        .context("Failed to parse backend config")?;
    config
        .get("GITHUB_CLIENT_ID")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .context("Backend has no GITHUB_CLIENT_ID configured")
}

/// Builds the GitHub authorize URL.
pub fn build_authorize_url(client_id: &str, redirect_uri: &str, state: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("scope", SCOPES)
        .append_pair("state", state)
        .finish();
    format!("{AUTHORIZE_URL}?{query}")
}

/// Random state value for CSRF protection.
pub fn new_state() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Binds the local callback listener on a port chosen by the OS.
pub async fn bind_callback_listener() -> Result<(TcpListener, u16)> {
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .await
        .context("Failed to listen for the OAuth callback")?;
    let port = listener
        .local_addr()
        .context("Failed to read the callback listener address")?
        .port();
    Ok((listener, port))
}

pub fn local_redirect_uri(port: u16) -> String {
    format!("http://127.0.0.1:{port}{CALLBACK_PATH}")
}

/// What the user pasted after authorizing on GitHub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationInput {
    pub code: String,
    pub state: Option<String>,
    /// The callback URL the code was issued for, when a full URL was pasted.
    pub redirect_uri: Option<String>,
}

/// Reads a pasted GitHub callback URL, its `code=..&state=..` query, or a
/// bare code. Returns `None` when no code is present.
pub fn parse_authorization_input(input: &str) -> Option<AuthorizationInput> {
    let value = input.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(mut url) = url::Url::parse(value)
        && matches!(url.scheme(), "http" | "https")
    {
        let (code, state) = code_and_state(url.query().unwrap_or_default())?;
        url.set_query(None);
        url.set_fragment(None);
        return Some(AuthorizationInput {
            code,
            state,
            redirect_uri: Some(url.to_string()),
        });
    }

    let query = value.trim_start_matches('?');
    if query.contains('=') {
        let (code, state) = code_and_state(query)?;
        return Some(AuthorizationInput {
            code,
            state,
            redirect_uri: None,
        });
    }

    Some(AuthorizationInput {
        code: value.to_string(),
        state: None,
        redirect_uri: None,
    })
}

fn code_and_state(query: &str) -> Option<(String, Option<String>)> {
    let mut code = None;
    let mut state = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "code" if !value.is_empty() => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }
    Some((code?, state))
}

/// Waits for the browser to hit the local callback and returns the code.
///
/// Returns `None` on timeout, state mismatch or a request without a code.
pub async fn wait_for_local_code(
    listener: TcpListener,
    expected_state: &str,
    timeout: Duration,
) -> Option<String> {
    let accepted = tokio::time::timeout(timeout, listener.accept()).await;
    let Ok(Ok((mut stream, peer))) = accepted else {
        debug!("no OAuth callback received");
        return None;
    };
    debug!(%peer, "OAuth callback connection");

    let mut buffer = [0u8; 4096];
    let read = stream.read(&mut buffer).await.ok()?;
    let request = String::from_utf8_lossy(&buffer[..read]);
    let code = extract_code_from_request(&request, expected_state);
    let response = if code.is_some() {
        oauth_success_response()
    } else {
        oauth_error_response()
    };
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
    code
}

fn extract_code_from_request(request: &str, expected_state: &str) -> Option<String> {
    let request_line = request.lines().next()?;
    let mut parts = request_line.split_whitespace();
    let _method = parts.next()?;
    let path = parts.next()?;

    let url = url::Url::parse(&format!("http://localhost{path}")).ok()?;
    if url.path() != CALLBACK_PATH {
        return None;
    }
    let state = url
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.to_string())?;
    if state != expected_state {
        return None;
    }
    url.query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.to_string())
        .filter(|c| !c.is_empty())
}

fn oauth_success_response() -> String {
    let body = "<html><body><h3>Login complete</h3><p>You can close this window.</p></body></html>";
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

fn oauth_error_response() -> String {
    let body = "<html><body><h3>Login failed</h3><p>Please return to the terminal and paste the URL.</p></body></html>";
    format!(
        "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn can_bind_localhost() -> bool {
        std::net::TcpListener::bind("127.0.0.1:0").is_ok()
    }

    #[test]
    fn test_credentials_roundtrip_and_clear() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("auth.json");

        assert_eq!(AuthCredentials::load_from(&path).unwrap(), AuthCredentials::default());

        let creds = AuthCredentials {
            github_token_is_set: true,
            access_token: Some("gho_secret".into()),
        };
        creds.save_to(&path).unwrap();
        assert_eq!(AuthCredentials::load_from(&path).unwrap(), creds);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        assert!(AuthCredentials::clear_at(&path).unwrap());
        assert!(!AuthCredentials::clear_at(&path).unwrap());
    }

    #[test]
    fn test_parse_authorization_input_variants() {
        assert_eq!(parse_authorization_input("  "), None);
        assert_eq!(
            parse_authorization_input(
                "http://127.0.0.1:5000/oauth/github/callback?code=abc&state=xyz#top"
            ),
            Some(AuthorizationInput {
                code: "abc".into(),
                state: Some("xyz".into()),
                redirect_uri: Some("http://127.0.0.1:5000/oauth/github/callback".into()),
            })
        );
        assert_eq!(
            parse_authorization_input("?code=abc&state=xyz"),
            Some(AuthorizationInput {
                code: "abc".into(),
                state: Some("xyz".into()),
                redirect_uri: None,
            })
        );
        assert_eq!(
            parse_authorization_input("abc"),
            Some(AuthorizationInput {
                code: "abc".into(),
                state: None,
                redirect_uri: None,
            })
        );
    }

    #[test]
    fn test_parse_authorization_input_requires_code() {
        // GitHub redirects with `error=...` when the user denies access.
        assert_eq!(
            parse_authorization_input(
                "http://127.0.0.1:5000/oauth/github/callback?error=access_denied&state=xyz"
            ),
            None
        );
        assert_eq!(parse_authorization_input("code=&state=xyz"), None);
    }

    #[test]
    fn test_extract_code_checks_path_and_state() {
        let ok = "GET /oauth/github/callback?code=c1&state=s1 HTTP/1.1\r\nHost: x\r\n\r\n";
        assert_eq!(extract_code_from_request(ok, "s1"), Some("c1".into()));
        assert_eq!(extract_code_from_request(ok, "other"), None);

        let wrong_path = "GET /favicon.ico?code=c1&state=s1 HTTP/1.1\r\n\r\n";
        assert_eq!(extract_code_from_request(wrong_path, "s1"), None);
        assert_eq!(extract_code_from_request("", "s1"), None);
    }

    #[test]
    fn test_authorize_url_contains_params() {
        let url = build_authorize_url("cid", &local_redirect_uri(50000), "st");
        let parsed = url::Url::parse(&url).unwrap();
        let pairs: Vec<_> = parsed.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".into(), "cid".into())));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "http://127.0.0.1:50000/oauth/github/callback".into()
        )));
        assert!(pairs.contains(&("state".into(), "st".into())));
    }

    #[tokio::test]
    async fn test_callback_listener_reports_its_port() {
        if !can_bind_localhost() {
            eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
            return;
        }
        let (listener, port) = bind_callback_listener().await.unwrap();
        assert_ne!(port, 0);
        assert_eq!(listener.local_addr().unwrap().port(), port);
    }

    #[tokio::test]
    async fn test_redirect_handler_exchanges_code_and_stores_flag() {
        if !can_bind_localhost() {
            eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/github/callback"))
            .and(body_json(json!({
                "code": "the-code",
                "redirect_url": "http://127.0.0.1:5000/oauth/github/callback"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "gho_x"})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let auth_path = dir.path().join("auth.json");
        let handler = RedirectHandler::with_auth_path(
            Endpoint::parse(&server.uri()).unwrap(),
            auth_path.clone(),
        );

        let redirect = handler
            .handle("http://127.0.0.1:5000/oauth/github/callback?code=the-code&state=s")
            .await
            .unwrap();
        assert_eq!(redirect, Redirect::Root);

        let creds = AuthCredentials::load_from(&auth_path).unwrap();
        assert!(creds.github_token_is_set);
        assert_eq!(creds.access_token.as_deref(), Some("gho_x"));
    }

    #[tokio::test]
    async fn test_redirect_handler_surfaces_raw_error() {
        if !can_bind_localhost() {
            eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/github/callback"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "bad_verification_code"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let auth_path = dir.path().join("auth.json");
        let handler = RedirectHandler::with_auth_path(
            Endpoint::parse(&server.uri()).unwrap(),
            auth_path.clone(),
        );

        let err = handler
            .handle("http://127.0.0.1:5000/oauth/github/callback?code=stale")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "bad_verification_code");
        assert!(!auth_path.exists());
    }

    #[tokio::test]
    async fn test_redirect_without_code_fails_before_request() {
        let handler = RedirectHandler::with_auth_path(
            Endpoint::parse("localhost:1").unwrap(),
            PathBuf::from("/nonexistent/auth.json"),
        );
        let err = handler
            .handle("http://127.0.0.1:5000/oauth/github/callback?state=s")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No authorization code"));
    }

    #[tokio::test]
    async fn test_fetch_github_client_id() {
        if !can_bind_localhost() {
            eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/options/config"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"GITHUB_CLIENT_ID": "Iv1.abc"})),
            )
            .mount(&server)
            .await;

        let endpoint = Endpoint::parse(&server.uri()).unwrap();
        assert_eq!(fetch_github_client_id(&endpoint).await.unwrap(), "Iv1.abc");
    }

    #[tokio::test]
    async fn test_wait_for_local_code_receives_callback() {
        if !can_bind_localhost() {
            eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
            return;
        }
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let waiter = tokio::spawn(async move {
            wait_for_local_code(listener, "s1", Duration::from_secs(5)).await
        });

        let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        stream
            .write_all(b"GET /oauth/github/callback?code=c9&state=s1 HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert_eq!(waiter.await.unwrap(), Some("c9".into()));
    }

    #[tokio::test]
    async fn test_wait_for_local_code_times_out() {
        if !can_bind_localhost() {
            eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
            return;
        }
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let code = wait_for_local_code(listener, "s1", Duration::from_millis(20)).await;
        assert_eq!(code, None);
    }
}
