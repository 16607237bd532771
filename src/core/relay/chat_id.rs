// Moderation group identifier normalization.
//
// Supergroup ids carry a `-100` prefix in the Bot API. Operators often paste
// the bare number shown by clients, so the configured value is canonicalized
// once at startup.

use super::relay_models::ChatId;
use std::fmt::Display;
use thiserror::Error;

const SUPERGROUP_PREFIX: &str = "-100";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatIdError {
    #[error("Chat id is empty")]
    Empty,

    #[error("Chat id `{0}` is not a number")]
    NotNumeric(String),
}

/// Canonicalize a raw chat identifier into the signed supergroup form.
///
/// - already `-100…`: unchanged
/// - other negative values: unchanged, no prefix added
/// - non-negative values: prefixed with `-100`
///
/// Idempotent: normalizing an already-normalized id is a no-op.
pub fn normalize_chat_id(raw: impl Display) -> String {
    let id = raw.to_string();
    let id = id.trim();

    if id.starts_with(SUPERGROUP_PREFIX) || id.starts_with('-') {
        return id.to_string();
    }

    format!("{}{}", SUPERGROUP_PREFIX, id)
}

/// Normalize and parse the configured moderation group id.
pub fn parse_chat_id(raw: impl Display) -> Result<ChatId, ChatIdError> {
    let raw = raw.to_string();
    if raw.trim().is_empty() {
        return Err(ChatIdError::Empty);
    }

    let normalized = normalize_chat_id(&raw);
    normalized
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| ChatIdError::NotNumeric(raw.trim().to_string()))
}
