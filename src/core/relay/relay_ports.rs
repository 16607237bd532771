// Ports of the relay: what the core needs from the outside world.
//
// The core defines WHAT it needs; `infra` provides the Telegram client and
// the in-memory stores.

use super::relay_models::{
    BotIdentity, ChatId, MessageId, PendingQuestion, SentMessage, TextFormat, UserId,
};
use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The platform rejected the call (unknown chat, bot blocked by user, ...).
    #[error("API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

// ============================================================================
// CHAT GATEWAY
// ============================================================================

/// Outbound operations on the chat platform.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Post a text message into a chat.
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
    ) -> Result<SentMessage, GatewayError>;

    /// Duplicate an existing message into another chat without a "forwarded" header.
    async fn copy_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> Result<SentMessage, GatewayError>;

    /// Look up a member of `chat_id` by `@handle`.
    async fn resolve_member(&self, chat_id: ChatId, handle: &str) -> Result<UserId, GatewayError>;

    /// Fetch the bot's own identity. Used as the liveness probe.
    async fn get_me(&self) -> Result<BotIdentity, GatewayError>;
}

// ============================================================================
// STORES
// ============================================================================

/// Set of users whose messages are no longer relayed.
pub trait BlockList: Send + Sync {
    /// Idempotent insert.
    fn block(&self, user: UserId);

    /// Remove a user. Returns whether the user was blocked before.
    fn unblock(&self, user: UserId) -> bool;

    fn is_blocked(&self, user: UserId) -> bool;
}

/// Maps a forwarded message to the user who asked the question.
pub trait QuestionStore: Send + Sync {
    /// Insert or overwrite the entry for `forwarded`.
    fn record(&self, forwarded: MessageId, question: PendingQuestion);

    /// Look up an entry. Lookups do not consume it.
    fn lookup(&self, forwarded: MessageId) -> Option<PendingQuestion>;

    /// Number of stored entries.
    fn len(&self) -> usize;
}
