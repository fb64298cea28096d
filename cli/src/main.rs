use clap::Parser;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ragchat_gateway=info".parse()?)
                .add_directive("ragchat_core=info".parse()?)
                .add_directive("tower_http=debug".parse()?)
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            cli::commands::serve::run(cli.config, port).await?;
        }
        Commands::Login => {
            cli::commands::login::run(cli.config).await?;
        }
        Commands::Logout => {
            cli::commands::login::logout(cli.config).await?;
        }
        Commands::Chat { gateway, category, message } => {
            cli::commands::chat::run(cli.config, gateway, category, message).await?;
        }
        Commands::Download { path, output, gateway } => {
            cli::commands::download::run(cli.config, gateway, path, output).await?;
        }
        Commands::Categories => {
            cli::commands::categories::run(cli.config)?;
        }
        Commands::Status => {
            cli::commands::status::run(cli.config).await?;
        }
    }

    Ok(())
}
