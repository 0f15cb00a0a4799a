pub mod cli;
pub mod llm;
pub mod models;
pub mod server;
pub mod structured;

use cli::Args;
use llm::chat::new_client;
use log::{ info, warn };
use server::Server;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = args.llm_config()?;

    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Client Type: {}", config.client_kind);
    info!("Gateway URL: {}", config.base_url);
    info!("API Key loaded: {}", args.api_key_hint());
    info!("Chat Model: {}", config.chat_model.as_deref().unwrap_or("client default"));
    info!(
        "Structured Model: {}",
        config.structured_model.as_deref().unwrap_or("client default")
    );
    match config.request_timeout {
        Some(timeout) => info!("Request Timeout: {}s", timeout.as_secs()),
        None => info!("Request Timeout: none"),
    }
    info!("Static Dir: {} (index: {})", args.static_dir, args.index_file);
    info!("-------------------------");

    if !config.has_api_key() {
        warn!("LITELLM_API_KEY is not set; gateway calls will fail until it is provided.");
    }

    let client = new_client(&config)?;
    info!(
        "Chat client configured: Type={}, Model={}, BaseURL={}",
        client.kind(),
        client.get_model(),
        client.get_base_url()
    );

    let server = Server::new(args.server_addr.clone(), client, args);
    server.run().await?;

    Ok(())
}
