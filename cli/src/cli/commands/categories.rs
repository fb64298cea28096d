use std::path::PathBuf;

use ragchat_core::category;
use ragchat_core::config::load_config;

pub fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let resolved = category::from_settings(&config.categories);

    println!("{:<24} {:<32}", "VALUE", "LABEL");
    println!("{}", "-".repeat(56));
    for entry in &resolved.categories {
        let marker = if entry.value == resolved.default_category { " (default)" } else { "" };
        println!("{:<24} {}{}", entry.value, entry.label, marker);
    }

    Ok(())
}
