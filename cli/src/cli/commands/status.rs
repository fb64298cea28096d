use std::path::PathBuf;

use ragchat_core::config::{default_config_path, load_config};

pub async fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let shown_path = config_path.clone().unwrap_or_else(default_config_path);
    let config = load_config(config_path)?;

    println!("RAG Chat Gateway Status");
    println!("=======================");
    println!();
    println!("Configuration:");
    println!("  Config file: {:?}", shown_path);
    println!("  Agent URL: {}", config.backend.agent_url());
    println!();
    println!("Server settings:");
    println!("  Host: {}", config.server.host);
    println!("  Port: {}", config.server.port);
    println!();

    println!("Identity:");
    match super::token_provider(&config)? {
        Some(provider) => {
            println!("  Tenant: {}", config.identity.tenant_id.as_deref().unwrap_or("-"));
            match provider.active_account().await {
                Some(account) => println!("  Signed in: {} ({})", account.display_name(), account.username),
                None => println!("  Signed in: no"),
            }
        }
        None => println!("  Not configured (requests are relayed without credentials)"),
    }

    println!();
    let url = format!("{}/healthz", super::gateway_url(&config, None));
    match reqwest::get(&url).await {
        Ok(resp) if resp.status().is_success() => {
            println!("Gateway: RUNNING ✓");
        }
        _ => {
            println!("Gateway: NOT RUNNING");
        }
    }

    Ok(())
}
