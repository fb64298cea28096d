use std::path::PathBuf;

use ragchat_core::config::load_config;

pub async fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let Some(provider) = super::token_provider(&config)? else {
        anyhow::bail!("Identity provider not configured. Set AZURE_CLIENT_ID and AZURE_TENANT_ID or [identity] in config.toml");
    };

    let account = provider.login().await?;
    println!("Signed in as {} ({})", account.display_name(), account.username);
    Ok(())
}

pub async fn logout(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    match super::token_provider(&config)? {
        Some(provider) => {
            let account = provider.active_account().await;
            provider.logout().await;
            match account {
                Some(account) => println!("Signed out {}", account.username),
                None => println!("Not signed in."),
            }
        }
        None => println!("Identity provider not configured; nothing to sign out of."),
    }
    Ok(())
}
