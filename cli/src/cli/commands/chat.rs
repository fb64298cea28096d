use std::io::Write;
use std::path::PathBuf;

use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};

use ragchat_core::category;
use ragchat_core::chat::{AgentEvent, ChatClient, Conversation};
use ragchat_core::config::load_config;
use ragchat_core::thread::ThreadContext;

pub async fn run(
    config_path: Option<PathBuf>,
    gateway: Option<String>,
    category: Option<String>,
    message: Option<String>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let mut context = ThreadContext::new(category::from_settings(&config.categories));
    if let Some(value) = category {
        context.select(&value)?;
    }

    let provider = super::token_provider(&config)?;
    let client = ChatClient::new(super::gateway_url(&config, gateway))?;
    let mut conversation = Conversation::new();

    if let Some(text) = message {
        let Some(token) = acquire_token(&provider).await else {
            return Ok(());
        };
        return send(&client, &mut conversation, &context, &text, token.as_deref()).await;
    }

    println!("Chatting in '{}'. Commands: /category <value>, /categories, /quit", context.selected());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            let mut parts = command.splitn(2, ' ');
            match (parts.next(), parts.next().map(str::trim)) {
                (Some("quit"), _) | (Some("exit"), _) => break,
                (Some("categories"), _) => {
                    for entry in &context.config().categories {
                        let marker = if entry.value == context.selected() { "*" } else { " " };
                        println!("{} {:<20} {}", marker, entry.value, entry.label);
                    }
                }
                (Some("category"), Some(value)) if !value.is_empty() => match context.select(value) {
                    Ok(()) => println!("Category: {}", context.selected()),
                    Err(e) => println!("{}", e),
                },
                _ => println!("Unknown command: /{}", command),
            }
            continue;
        }

        // token may have expired since the last turn
        let Some(token) = acquire_token(&provider).await else {
            break;
        };
        if let Err(e) = send(&client, &mut conversation, &context, line, token.as_deref()).await {
            println!("Error: {}", e);
        }
    }

    Ok(())
}

/// Outer `None`: signed out, a prompt was printed. Inner `None`: no identity provider configured.
async fn acquire_token<C>(provider: &Option<ragchat_core::auth::TokenProvider<C>>) -> Option<Option<String>>
where
    C: ragchat_core::auth::IdentityClient,
{
    let Some(provider) = provider else {
        return Some(None);
    };
    match provider.get_access_token().await {
        Some(token) => Some(Some(token)),
        None => {
            println!("Not signed in. Run `ragchat-gateway login` first.");
            None
        }
    }
}

async fn send(
    client: &ChatClient,
    conversation: &mut Conversation,
    context: &ThreadContext,
    text: &str,
    token: Option<&str>,
) -> anyhow::Result<()> {
    let input = conversation.user_turn(text, context);
    let mut events = client.run(&input, token).await?;

    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("{}", e);
                continue;
            }
        };

        match &event {
            AgentEvent::TextMessageContent { delta, .. } => {
                print!("{}", delta);
                std::io::stdout().flush()?;
            }
            AgentEvent::TextMessageEnd { .. } => println!(),
            AgentEvent::ToolCallStart { tool_call_name, .. } => println!("[{}] ...", tool_call_name),
            AgentEvent::RunError { message, .. } => println!("\nAgent error: {}", message),
            _ => {}
        }

        if let Some(tool) = conversation.record(&event) {
            println!("[{}] {}", tool.name, tool.summary);
        }
    }

    Ok(())
}
