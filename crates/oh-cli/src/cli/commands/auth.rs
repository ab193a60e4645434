//! Login/logout command handlers.

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use oh_core::auth::{self, AuthCredentials, AuthorizationInput, RedirectHandler};
use oh_core::config::paths;
use oh_core::endpoint::Endpoint;

/// Set to skip opening a browser during login.
const NO_BROWSER_ENV: &str = "OH_NO_BROWSER";

pub async fn login(endpoint: Endpoint, code: Option<&str>) -> Result<()> {
    let auth_path = paths::auth_path();
    let handler = RedirectHandler::with_auth_path(endpoint.clone(), auth_path.clone());

    // A pasted redirect URL or code skips the browser round trip.
    if let Some(input) = code {
        let input =
            auth::parse_authorization_input(input).context("Authorization code cannot be empty")?;
        let redirect_uri = redirect_uri_for(&input, &endpoint);
        println!("Exchanging code with the backend...");
        handler.exchange(&input.code, &redirect_uri).await?;
        print_logged_in(&auth_path);
        return Ok(());
    }

    let existing = AuthCredentials::load_from(&auth_path)?;
    if existing.github_token_is_set {
        print!("Already logged in to GitHub. Log in again? [y/N] ");
        io::stdout().flush()?;

        let mut response = String::new();
        io::stdin().lock().read_line(&mut response)?;
        if !response.trim().eq_ignore_ascii_case("y") {
            println!("Login cancelled.");
            return Ok(());
        }
    }

    let client_id = auth::fetch_github_client_id(&endpoint).await?;
    let state = auth::new_state();
    let (listener, port) = auth::bind_callback_listener().await?;
    let redirect_uri = auth::local_redirect_uri(port);
    let authorize_url = auth::build_authorize_url(&client_id, &redirect_uri, &state);

    println!("To log in with GitHub:");
    println!();
    println!("  1. A browser window will open (or visit the URL below)");
    println!("  2. Authorize the OH app on GitHub");
    println!("  3. Return here once the browser says you can close it");
    println!();
    println!("Authorization URL:");
    println!("  {authorize_url}");
    println!();

    if std::env::var(NO_BROWSER_ENV).is_err() {
        let _ = open::that(&authorize_url);
    }

    let code = match auth::wait_for_local_code(listener, &state, auth::CALLBACK_TIMEOUT).await {
        Some(code) => code,
        None => {
            print!("Paste authorization code (or full redirect URL): ");
            io::stdout().flush()?;
            let mut input = String::new();
            io::stdin().lock().read_line(&mut input)?;
            let input = auth::parse_authorization_input(&input)
                .context("Authorization code cannot be empty")?;
            if let Some(provided) = &input.state
                && *provided != state
            {
                anyhow::bail!("State mismatch");
            }
            input.code
        }
    };

    println!("Exchanging code with the backend...");
    handler.exchange(&code, &redirect_uri).await?;
    print_logged_in(&auth_path);
    Ok(())
}

pub fn logout() -> Result<()> {
    let auth_path = paths::auth_path();
    if AuthCredentials::clear_at(&auth_path)? {
        println!("✓ Logged out");
        println!("  Credentials removed from: {}", auth_path.display());
    } else {
        println!("Not logged in (no credentials found).");
    }
    Ok(())
}

fn print_logged_in(auth_path: &Path) {
    println!();
    println!("✓ Logged in with GitHub");
    println!("  Credentials saved to: {}", auth_path.display());
}

/// The redirect URI the code was issued for: the pasted callback URL, or the
/// backend's own callback when only a code was given.
fn redirect_uri_for(input: &AuthorizationInput, endpoint: &Endpoint) -> String {
    input
        .redirect_uri
        .clone()
        .unwrap_or_else(|| endpoint.http_url(auth::CALLBACK_PATH))
}
