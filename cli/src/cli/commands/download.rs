use std::path::PathBuf;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use ragchat_core::chat::{ChatClient, ChatError};
use ragchat_core::config::load_config;

pub async fn run(
    config_path: Option<PathBuf>,
    gateway: Option<String>,
    path: String,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let client = ChatClient::new(super::gateway_url(&config, gateway))?;

    let token = match super::token_provider(&config)? {
        Some(provider) => match provider.get_access_token().await {
            Some(token) => Some(token),
            None => {
                println!("Not signed in. Run `ragchat-gateway login` first.");
                return Ok(());
            }
        },
        None => None,
    };

    // accept either a bare blob path or the full gateway route
    let path = path.trim_start_matches('/');
    let path = path.strip_prefix("api/download/").unwrap_or(path);
    let output = output.unwrap_or_else(|| PathBuf::from(file_name(path)));

    let response = match client.download(path, token.as_deref()).await {
        Ok(response) => response,
        Err(ChatError::Status { status, body }) => {
            println!("Download failed (HTTP {}): {}", status, body.trim());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let mut file = tokio::fs::File::create(&output).await?;
    let mut written = 0usize;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        written += chunk.len();
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    println!("Saved {} bytes to {:?}", written, output);
    Ok(())
}

/// Last path segment, decoded, with any `#page=` fragment dropped
fn file_name(path: &str) -> String {
    let path = path.split(['#', '?']).next().unwrap_or(path);
    let last = path.rsplit('/').find(|s| !s.is_empty()).unwrap_or("download");
    match urlencoding::decode(last) {
        Ok(name) if name != ".." && name != "." && !name.contains(['/', '\\']) => name.into_owned(),
        _ => "download".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_from_path() {
        assert_eq!(file_name("container/manuals/guide.pdf"), "guide.pdf");
        assert_eq!(file_name("container/manuals/guide%20v2.pdf#page=4"), "guide v2.pdf");
        assert_eq!(file_name("container/"), "container");
        assert_eq!(file_name(""), "download");
        assert_eq!(file_name("container/..%2f..%2fetc"), "download");
    }
}
