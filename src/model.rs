//! Data types shared between the client and its callers.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::client::ClientError;

/// Envelope code the backend uses for success.
pub const SUCCESS_CODE: i32 = 200;

/// Maximum number of characters of the first message used as a title.
const TITLE_MAX_CHARS: usize = 30;

/// Role of the message sender.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A message as shown in the chat view.
///
/// Assistant replies start out as a streaming placeholder and grow one delta
/// at a time until the stream completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: u64,
    pub text: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub is_streaming: bool,
}

impl ChatMessage {
    /// A message typed by the user.
    pub fn user(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            role: Role::User,
            timestamp: Utc::now(),
            is_error: false,
            is_streaming: false,
        }
    }

    /// An empty assistant message that deltas will be appended to.
    pub fn assistant_placeholder(id: u64) -> Self {
        Self {
            id,
            text: String::new(),
            role: Role::Assistant,
            timestamp: Utc::now(),
            is_error: false,
            is_streaming: true,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    /// Append a streamed delta.
    pub fn push_delta(&mut self, delta: &str) {
        self.text.push_str(delta);
    }

    /// Mark the reply as complete.
    pub fn finish_streaming(&mut self) {
        self.is_streaming = false;
    }

    /// Mark the reply as failed and show `error` in its place if nothing
    /// arrived yet.
    pub fn fail(&mut self, error: &str) {
        self.is_streaming = false;
        self.is_error = true;
        if self.text.is_empty() {
            self.text = error.to_string();
        }
    }
}

/// A suggested prompt shown on an empty chat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatSuggestion {
    pub icon: String,
    pub text: String,
    pub message: String,
}

/// A conversation entry for the sidebar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_count: Option<usize>,
}

/// A stored message row as returned inside the conversation list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    #[serde(default)]
    pub id: Option<i64>,
    pub conversation_id: String,
    pub message_type: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One entry of `GET /chat/conversations`: a conversation id with the user
/// messages stored for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub conversation_id: String,
    #[serde(default)]
    pub messages: Vec<StoredMessage>,
}

impl From<ConversationRecord> for Conversation {
    fn from(record: ConversationRecord) -> Self {
        let title = record
            .messages
            .first()
            .map(|m| truncate_title(&m.content))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| record.conversation_id.clone());

        let last = record.messages.last();

        Conversation {
            title,
            last_message: last.map(|m| m.content.clone()),
            last_message_time: last
                .and_then(|m| m.created_at.as_deref())
                .and_then(parse_backend_time),
            message_count: Some(record.messages.len()),
            id: record.conversation_id,
        }
    }
}

fn truncate_title(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= TITLE_MAX_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", head.trim_end())
    }
}

/// Parse a backend timestamp, either RFC 3339 or a zone-less local time
/// (taken as UTC).
pub fn parse_backend_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|t| t.and_utc())
        })
}

/// Message format of the conversation history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackendMessage {
    pub message_type: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl BackendMessage {
    pub fn role(&self) -> Role {
        if self.message_type.eq_ignore_ascii_case("user") {
            Role::User
        } else {
            Role::Assistant
        }
    }

    /// Convert into a chat view message with the given id.
    pub fn into_chat_message(self, id: u64) -> ChatMessage {
        ChatMessage {
            id,
            role: self.role(),
            text: self.text,
            timestamp: Utc::now(),
            is_error: false,
            is_streaming: false,
        }
    }
}

/// Summary information about a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub title: String,
    pub last_message: String,
    pub last_message_time: String,
    pub message_count: usize,
}

/// Body of the streaming chat request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub conversation_id: String,
    pub input_msg: String,
}

/// Processing status of a knowledge file. The backend reports a numeric
/// code; older responses carry a label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FileStatus {
    Code(i32),
    Label(String),
}

/// A knowledge file known to the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeFile {
    pub id: i64,
    pub file_name: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<i64>,
    #[serde(default)]
    pub file_suffix: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<FileStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vectorization_status: Option<i32>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Set by the upload endpoint when a file with the same hash exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_duplicate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A document chunk returned by similarity search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Generic response envelope of the file endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Fail with [`ClientError::Api`] unless the envelope reports success.
    pub fn check(self) -> Result<Self, ClientError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::Api {
                code: self.code,
                message: self.message.unwrap_or_default(),
            })
        }
    }

    /// The payload of a successful envelope.
    pub fn into_data(self) -> Result<T, ClientError> {
        self.check()?.data.ok_or(ClientError::MissingBody)
    }

    /// The server's message of a successful envelope.
    pub fn into_message(self) -> Result<String, ClientError> {
        Ok(self.check()?.message.unwrap_or_default())
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub current: u64,
    #[serde(default)]
    pub pages: u64,
}

/// Filters and paging for the file listing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileQuery {
    pub current: u32,
    pub size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

impl Default for FileQuery {
    fn default() -> Self {
        Self {
            current: 1,
            size: 10,
            file_name: None,
            file_type: None,
        }
    }
}

impl FileQuery {
    pub fn page(current: u32, size: u32) -> Self {
        Self {
            current,
            size,
            ..Self::default()
        }
    }

    pub fn with_file_name(mut self, file_name: String) -> Self {
        self.file_name = Some(file_name);
        self
    }

    pub fn with_file_type(mut self, file_type: String) -> Self {
        self.file_type = Some(file_type);
        self
    }
}

/// A file to upload to the knowledge base.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content: Vec<u8>,
    pub mime_type: Option<String>,
    pub description: Option<String>,
    pub enable_vectorization: bool,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
            mime_type: None,
            description: None,
            enable_vectorization: true,
        }
    }

    pub fn with_mime_type(mut self, mime_type: String) -> Self {
        self.mime_type = Some(mime_type);
        self
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_vectorization(mut self, enable: bool) -> Self {
        self.enable_vectorization = enable;
        self
    }
}
