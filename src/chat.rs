//! Chat endpoints.
//!
//! Plain request/response calls plus the streaming reply, which returns a
//! [`DeltaStream`] or drives a callback.

use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::{ChatClient, ClientError};
use crate::http::error_for_status;
use crate::model::{BackendMessage, ChatRequest, ConversationRecord};
use crate::stream::{DeltaStream, SSEResponseExt};

const EVENT_STREAM: &str = "text/event-stream";
const CHAT_MEMORY_PATH: &str = "/chat/chatMemory";

impl ChatClient {
    /// Send a single message without conversation memory.
    pub async fn send_message(&self, message: &str) -> Result<String, ClientError> {
        let req = self
            .request(Method::GET, "/chat/ask2")
            .query(&[("msg", message)]);
        self.send_text(req).await
    }

    /// Send a message within a conversation and wait for the whole reply.
    pub async fn send_message_with_conversation(
        &self,
        conversation_id: &str,
        message: &str,
    ) -> Result<String, ClientError> {
        let req = self
            .request(Method::GET, CHAT_MEMORY_PATH)
            .query(&[("conversationId", conversation_id), ("inputMsg", message)]);
        self.send_text(req).await
    }

    /// Send a message within a conversation and stream the reply.
    ///
    /// Fails before any delta is produced if the server answers with a
    /// non-success status or without a body.
    pub async fn stream_message(
        &self,
        conversation_id: &str,
        message: &str,
    ) -> Result<DeltaStream, ClientError> {
        self.stream_message_with_token(conversation_id, message, CancellationToken::new())
            .await
    }

    /// Like [`ChatClient::stream_message`], bound to a caller-owned token.
    ///
    /// Cancelling the token aborts the call whether it is still connecting
    /// or already streaming. The token is cancelled when the call ends.
    pub async fn stream_message_with_token(
        &self,
        conversation_id: &str,
        message: &str,
        token: CancellationToken,
    ) -> Result<DeltaStream, ClientError> {
        let body = ChatRequest {
            conversation_id: conversation_id.to_string(),
            input_msg: message.to_string(),
        };
        let req = self
            .request_untimed(Method::POST, CHAT_MEMORY_PATH)
            .header(ACCEPT, EVENT_STREAM)
            .json(&body);

        let opened = tokio::select! {
            biased;
            _ = token.cancelled() => Err(ClientError::StreamCancelled),
            // Reading the error body stays cancellable.
            response = async {
                match req.send().await {
                    Ok(response) => error_for_status(response).await,
                    Err(e) => Err(ClientError::from(e)),
                }
            } => response,
        };

        let response = match opened {
            Ok(response) if response.status() == StatusCode::NO_CONTENT => {
                Err(ClientError::MissingBody)
            }
            other => other,
        }
        .inspect_err(|e| {
            debug!(error = %e, conversation_id, "stream could not be opened");
            token.cancel();
        })?;

        debug!(conversation_id, status = %response.status(), "stream opened");
        Ok(response.deltas(token))
    }

    /// Stream a reply, calling `on_delta` for every delta in order.
    ///
    /// Resolves once the stream has ended, or with the first error.
    pub async fn stream_message_with<F>(
        &self,
        conversation_id: &str,
        message: &str,
        on_delta: F,
    ) -> Result<(), ClientError>
    where
        F: FnMut(&str),
    {
        self.stream_message(conversation_id, message)
            .await?
            .for_each_delta(on_delta)
            .await
    }

    /// All conversations with their stored user messages.
    pub async fn conversations(&self) -> Result<Vec<ConversationRecord>, ClientError> {
        let req = self.request(Method::GET, "/chat/conversations");
        self.send_json(req).await
    }

    /// Message history of one conversation.
    pub async fn conversation_messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<BackendMessage>, ClientError> {
        let path = format!("/chat/conversations/{}/messages", conversation_id);
        let req = self.request(Method::GET, &path);
        self.send_json(req).await
    }

    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<(), ClientError> {
        let path = format!("/chat/conversations/{}", conversation_id);
        let req = self.request(Method::DELETE, &path);
        self.send(req).await?;
        Ok(())
    }

    /// Ask for the filmography of an actor.
    pub async fn actor_films(&self, actor: &str) -> Result<String, ClientError> {
        let req = self
            .request(Method::GET, "/chat/films")
            .query(&[("actor", actor)]);
        self.send_text(req).await
    }

    /// Generate an image and return its URL.
    pub async fn generate_image(&self, prompt: &str) -> Result<String, ClientError> {
        let req = self
            .request(Method::GET, "/chat/image")
            .query(&[("prompt", prompt)]);
        self.send_text(req).await
    }

    /// Whether the backend is reachable and healthy. Never fails.
    pub async fn health_check(&self) -> bool {
        let req = self.request(Method::GET, "/chat/health");
        match self.send(req).await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "health check failed");
                false
            }
        }
    }
}
