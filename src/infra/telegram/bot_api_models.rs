// Wire types of the Telegram Bot API.
//
// Only the fields the relay reads are modelled; serde ignores the rest.

use serde::{Deserialize, Serialize};

/// Envelope every Bot API method responds with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub error_code: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub reply_to_message: Option<Box<Message>>,
    // Media payloads are only inspected for presence.
    pub sticker: Option<serde_json::Value>,
    pub photo: Option<Vec<serde_json::Value>>,
    pub animation: Option<serde_json::Value>,
    pub video: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMember {
    pub user: User,
}

/// Result of `copyMessage`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageIdResult {
    pub message_id: i64,
}

// ============================================================================
// REQUEST BODIES
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct CopyMessageRequest {
    pub chat_id: i64,
    pub from_chat_id: i64,
    pub message_id: i64,
}

#[derive(Debug, Serialize)]
pub struct GetChatMemberRequest<'a> {
    pub chat_id: i64,
    pub user_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct GetUpdatesRequest<'a> {
    pub offset: i64,
    pub timeout: u64,
    pub allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
pub struct EmptyRequest {}
