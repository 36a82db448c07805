//! # chatmem - client for a chat-with-memory backend
//!
//! A small async client for a chat backend that keeps conversation memory
//! and a knowledge base of uploaded files.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Streaming replies decoded incrementally from Server-Sent Events
//! - Cancellation of in-flight streams through a `CancellationToken`
//! - Conversation and knowledge file endpoints
//! - Shared data types and a light/dark theme manager for UIs built on top
//!
//! ## Streaming
//!
//! The backend answers `POST /chat/chatMemory` with blank-line separated
//! `data:` frames terminated by `data: [DONE]`. [`sse`] turns raw chunks into
//! deltas; [`stream::DeltaStream`] owns the transfer and hands the deltas out
//! in order, either one at a time or through a callback.
//!
//! ## Example
//! ```no_run
//! use chatmem::{ChatClient, ClientOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ChatClient::new(ClientOptions::new("http://localhost:8080/api"))?;
//!
//!     let mut reply = String::new();
//!     client
//!         .stream_message_with("conversation-1", "Hello!", |delta| reply.push_str(delta))
//!         .await?;
//!
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod client;
pub mod files;
pub mod http;
pub mod model;
pub mod options;
pub mod sse;
pub mod stream;
pub mod theme;

// Re-exports for convenience
pub use client::{ChatClient, ClientError};
pub use model::{ChatMessage, ChatRequest, Conversation, KnowledgeFile, Role};
pub use options::ClientOptions;
pub use stream::{DeltaStream, StreamState};
pub use tokio_util::sync::CancellationToken;
