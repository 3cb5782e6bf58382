pub mod models;
pub mod server;
pub mod config;
pub mod llm;
pub mod cli;
pub mod relay;

use cli::Args;
use config::prompt::{ load_prompts, PromptConfig };
use llm::chat::{ new_client as new_chat_client, ChatClient };
use log::info;
use relay::ChatRelay;
use server::Server;
use std::error::Error;
use std::sync::Arc;

/// Builds the relay from the parsed arguments. The provider client is created
/// once here and shared by every request.
pub fn build_relay(args: &Args) -> Result<ChatRelay, Box<dyn Error + Send + Sync>> {
    let chat_client = new_chat_client(&args.llm_config())?;
    info!("Chat client configured: BaseURL={}", chat_client.get_base_url());

    let prompt_config = match &args.prompts_path {
        Some(path) if !path.trim().is_empty() => load_prompts(path)?,
        _ => Arc::new(PromptConfig::default()),
    };

    Ok(ChatRelay::new(chat_client, prompt_config, args.relay_settings()))
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr());
    info!("Anthropic Base URL: {}", args.anthropic_base_url);
    info!("Anthropic API Key Set: {}", !args.anthropic_api_key.is_empty());
    info!("Default Model: {}", args.default_model);
    info!("Vision Model: {}", args.vision_model);
    info!("Max Tokens (text/vision): {}/{}", args.text_max_tokens, args.vision_max_tokens);
    info!("Request Timeout: {}s", args.request_timeout_secs);
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let relay = Arc::new(build_relay(&args)?);
    let addr = args.server_addr();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, relay, args.clone());
    server.run().await?;

    Ok(())
}
