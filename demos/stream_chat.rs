//! Stream a reply from the chat backend to stdout.
//!
//! Run with:
//! ```bash
//! export CHATMEM_API_BASE_URL="http://localhost:8080/api"
//! RUST_LOG=chatmem=debug cargo run --example stream_chat -- my-conversation "Tell me a joke"
//! ```
//!
//! Press Ctrl-C to cancel the stream.

use std::io::Write;

use chatmem::model::ChatMessage;
use chatmem::{CancellationToken, ChatClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let conversation_id = args.next().unwrap_or_else(|| "demo".to_string());
    let message = args.next().unwrap_or_else(|| "Hello!".to_string());

    let client = ChatClient::from_env()?;

    if !client.health_check().await {
        eprintln!("Backend at {} is not healthy", client.options().base_url);
    }

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    println!("> {}", message);

    let mut reply = ChatMessage::assistant_placeholder(1);
    let mut deltas = client
        .stream_message_with_token(&conversation_id, &message, token)
        .await?;

    while let Some(delta) = deltas.next_delta().await {
        match delta {
            Ok(delta) => {
                print!("{}", delta);
                std::io::stdout().flush()?;
                reply.push_delta(&delta);
            }
            Err(e) => {
                reply.fail(&e.to_string());
                eprintln!("\nError: {}", e);
                return Err(e.into());
            }
        }
    }
    reply.finish_streaming();

    println!("\n\n({} characters)", reply.text.chars().count());
    Ok(())
}
