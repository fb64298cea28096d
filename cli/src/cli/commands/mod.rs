pub mod categories;
pub mod chat;
pub mod download;
pub mod login;
pub mod serve;
pub mod status;

use std::sync::Arc;

use ragchat_core::auth::{DeviceCode, EntraIdentityClient, SessionStore, TokenProvider};
use ragchat_core::config::Config;

/// Token provider backed by the session file, or `None` when no identity provider is configured
pub fn token_provider(config: &Config) -> anyhow::Result<Option<TokenProvider<EntraIdentityClient>>> {
    if !config.identity.is_configured() {
        return Ok(None);
    }

    let client = EntraIdentityClient::new(&config.identity)?.with_prompt(Arc::new(|code: &DeviceCode| {
        match &code.message {
            Some(message) => println!("{}", message),
            None => println!(
                "To sign in, open {} and enter the code {}",
                code.verification_uri, code.user_code
            ),
        }
    }));

    Ok(Some(TokenProvider::with_store(client, SessionStore::default_location()?)))
}

/// Gateway root URL: explicit flag, else the configured listen address
pub fn gateway_url(config: &Config, explicit: Option<String>) -> String {
    if let Some(url) = explicit {
        return url;
    }
    let host = match config.server.host.as_str() {
        "0.0.0.0" | "::" => "127.0.0.1",
        other => other,
    };
    format!("http://{}:{}", host, config.server.port)
}
