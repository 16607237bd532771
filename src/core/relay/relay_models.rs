// Relay domain models - data structures for the question/answer relay.
//
// These are pure domain types with no Telegram dependencies.
// The telegram layer converts Bot API updates into these before calling the core.

use std::fmt;

/// Identifier of a chat (private chat, group or supergroup).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Identifier of a user account.
///
/// The block list and the question store key users by this value; its
/// `Display` form is the string identifier shown to moderators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Identifier of a message inside a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Media kinds that are copied into the moderation group verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Sticker,
    Photo,
    Animation,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Sticker => write!(f, "sticker"),
            MediaKind::Photo => write!(f, "photo"),
            MediaKind::Animation => write!(f, "animation"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// The author of an inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct Sender {
    pub id: UserId,
    /// Public handle without the leading `@`, if the account has one.
    pub username: Option<String>,
}

impl Sender {
    /// Name shown to moderators: `@handle`, or a placeholder for accounts
    /// without a public handle.
    pub fn display_name(&self) -> String {
        match &self.username {
            Some(name) => format!("@{}", name),
            None => "(без username)".to_string(),
        }
    }
}

/// One inbound chat event, already stripped of platform details.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    /// `None` for anonymous posts (e.g. channel posts).
    pub sender: Option<Sender>,
    pub text: Option<String>,
    /// The message this one replies to, if any.
    pub reply_to: Option<MessageId>,
    pub media: Option<MediaKind>,
}

/// Correlation entry: who asked the question behind a forwarded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuestion {
    pub requester_id: UserId,
    pub requester_name: String,
}

/// A message the gateway successfully posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub message_id: MessageId,
}

/// Identity of the bot account, returned by the liveness probe.
#[derive(Debug, Clone, PartialEq)]
pub struct BotIdentity {
    pub id: UserId,
    pub username: Option<String>,
}

/// How outgoing text should be interpreted by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    /// Legacy Markdown (`*bold*`, `_italic_`).
    Markdown,
}

/// Why a moderator command was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandRejection {
    /// The command had no argument.
    MissingArgument,
    /// The `@handle` could not be resolved to an account.
    UnknownHandle,
    /// The argument was neither a handle nor a numeric id.
    InvalidId,
}

/// What the relay did with an inbound message.
///
/// Returned for logging and tests; every failure has already been reported
/// to the relevant chat by the time the caller sees this.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    /// `/start` answered with the welcome text.
    Welcomed,
    /// A moderator reply was delivered to the requester.
    AnswerDelivered { requester: UserId },
    /// A moderator reply could not be delivered.
    AnswerFailed { requester: UserId },
    /// Moderation group message that does not reply to a known question.
    ReplyUnresolved,
    /// Message from a blocked user, dropped silently.
    Suppressed { sender: UserId },
    /// A new question was posted into the moderation group.
    QuestionForwarded { forwarded: MessageId },
    /// A new question could not be posted.
    QuestionFailed,
    /// Media was duplicated into the moderation group.
    MediaCopied { kind: MediaKind },
    /// Media duplication failed; logged only.
    MediaFailed { kind: MediaKind },
    Banned { user: UserId },
    Unbanned { user: UserId, was_blocked: bool },
    CommandRejected(CommandRejection),
    /// Nothing to do (foreign command, unsupported content, no sender).
    Ignored,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_uses_handle_when_present() {
        let sender = Sender {
            id: UserId(1),
            username: Some("alice".to_string()),
        };
        assert_eq!(sender.display_name(), "@alice");
    }

    #[test]
    fn display_name_placeholder_without_handle() {
        let sender = Sender {
            id: UserId(111),
            username: None,
        };
        assert_eq!(sender.display_name(), "(без username)");
    }

    #[test]
    fn ids_display_as_plain_numbers() {
        assert_eq!(UserId(111).to_string(), "111");
        assert_eq!(ChatId(-1002485675560).to_string(), "-1002485675560");
        assert_eq!(MessageId(7).to_string(), "7");
    }
}
