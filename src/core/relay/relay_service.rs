// Relay service - core business logic for relaying questions and answers.
//
// This service handles:
// - Forwarding user questions into the moderation group
// - Routing moderator replies back to the user who asked
// - The /ban and /unban block list
// - Copying media into the moderation group
//
// NO Telegram dependencies here - just pure domain logic over the ports.

use super::commands::{RelayCommand, ResolveError, UserTarget};
use super::relay_models::{
    ChatId, CommandRejection, InboundMessage, PendingQuestion, RelayOutcome, TextFormat, UserId,
};
use super::relay_ports::{BlockList, ChatGateway, QuestionStore};
use super::relay_texts as texts;

/// Relay between end-users and the moderation group.
///
/// Every inbound message is classified on its own; the only state is the
/// block list and the question store.
pub struct RelayService<G: ChatGateway, B: BlockList, Q: QuestionStore> {
    gateway: G,
    blocked: B,
    questions: Q,
    moderation_chat: ChatId,
    /// Own username, used to tell `/ban@ThisBot` from `/ban@OtherBot`.
    bot_username: Option<String>,
}

impl<G: ChatGateway, B: BlockList, Q: QuestionStore> RelayService<G, B, Q> {
    pub fn new(gateway: G, blocked: B, questions: Q, moderation_chat: ChatId) -> Self {
        Self {
            gateway,
            blocked,
            questions,
            moderation_chat,
            bot_username: None,
        }
    }

    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn moderation_chat(&self) -> ChatId {
        self.moderation_chat
    }

    pub fn questions(&self) -> &Q {
        &self.questions
    }

    /// Classify an inbound message and perform the matching action.
    pub async fn handle(&self, message: &InboundMessage) -> RelayOutcome {
        let command = message
            .text
            .as_deref()
            .and_then(|text| RelayCommand::parse(text, self.bot_username.as_deref()));
        if let Some(command) = command {
            return self.handle_command(message, command).await;
        }

        if message.chat_id == self.moderation_chat {
            return self.route_moderator_reply(message).await;
        }

        let Some(sender) = &message.sender else {
            tracing::debug!(chat_id = %message.chat_id, "Ignoring message without sender");
            return RelayOutcome::Ignored;
        };

        if self.blocked.is_blocked(sender.id) {
            tracing::debug!(user_id = %sender.id, "Dropping message from blocked user");
            return RelayOutcome::Suppressed { sender: sender.id };
        }

        if let Some(kind) = message.media {
            return match self
                .gateway
                .copy_message(self.moderation_chat, message.chat_id, message.message_id)
                .await
            {
                Ok(_) => {
                    tracing::info!(user_id = %sender.id, %kind, "Copied media to moderators");
                    RelayOutcome::MediaCopied { kind }
                }
                Err(e) => {
                    tracing::error!(user_id = %sender.id, %kind, "Failed to copy media: {}", e);
                    RelayOutcome::MediaFailed { kind }
                }
            };
        }

        let Some(text) = message.text.as_deref() else {
            tracing::debug!(user_id = %sender.id, "Ignoring unsupported message content");
            return RelayOutcome::Ignored;
        };

        let display_name = sender.display_name();
        let question = texts::question(sender.id, &display_name, text);

        match self
            .gateway
            .send_text(self.moderation_chat, &question, TextFormat::Markdown)
            .await
        {
            Ok(sent) => {
                self.questions.record(
                    sent.message_id,
                    PendingQuestion {
                        requester_id: sender.id,
                        requester_name: display_name,
                    },
                );
                tracing::info!(
                    user_id = %sender.id,
                    message_id = %sent.message_id,
                    pending = self.questions.len(),
                    "Forwarded question to moderators"
                );
                self.reply(message.chat_id, texts::QUESTION_ACCEPTED).await;
                RelayOutcome::QuestionForwarded {
                    forwarded: sent.message_id,
                }
            }
            Err(e) => {
                tracing::error!(user_id = %sender.id, "Failed to forward question: {}", e);
                self.reply(message.chat_id, texts::QUESTION_FAILED).await;
                RelayOutcome::QuestionFailed
            }
        }
    }

    /// A message in the moderation group: must reply to a forwarded question.
    async fn route_moderator_reply(&self, message: &InboundMessage) -> RelayOutcome {
        let Some(question) = message
            .reply_to
            .and_then(|forwarded| self.questions.lookup(forwarded))
        else {
            self.reply(message.chat_id, texts::REPLY_INSTRUCTION).await;
            return RelayOutcome::ReplyUnresolved;
        };

        let requester = question.requester_id;
        tracing::info!(
            user_id = %requester,
            username = %question.requester_name,
            "Sending moderator answer"
        );

        let requester_chat = ChatId(requester.0);
        let delivery = match message.text.as_deref() {
            Some(text) => self
                .gateway
                .send_text(requester_chat, &texts::answer(text), TextFormat::Markdown)
                .await
                .map(|_| ()),
            None => self
                .gateway
                .copy_message(requester_chat, message.chat_id, message.message_id)
                .await
                .map(|_| ()),
        };

        match delivery {
            Ok(()) => {
                let confirmation = texts::answer_delivered(requester, &question.requester_name);
                self.reply(message.chat_id, &confirmation).await;
                RelayOutcome::AnswerDelivered { requester }
            }
            Err(e) => {
                tracing::warn!(user_id = %requester, "Failed to deliver answer: {}", e);
                self.reply(message.chat_id, texts::ANSWER_FAILED).await;
                RelayOutcome::AnswerFailed { requester }
            }
        }
    }

    async fn handle_command(
        &self,
        message: &InboundMessage,
        command: RelayCommand,
    ) -> RelayOutcome {
        match command {
            RelayCommand::Start => {
                self.send(message.chat_id, texts::WELCOME, TextFormat::Markdown)
                    .await;
                RelayOutcome::Welcomed
            }
            // Moderation commands only count inside the moderation group.
            RelayCommand::Ban(_) | RelayCommand::Unban(_)
                if message.chat_id != self.moderation_chat =>
            {
                RelayOutcome::Ignored
            }
            RelayCommand::Ban(argument) => {
                self.apply_block(message.chat_id, "ban", argument, true)
                    .await
            }
            RelayCommand::Unban(argument) => {
                self.apply_block(message.chat_id, "unban", argument, false)
                    .await
            }
        }
    }

    async fn apply_block(
        &self,
        chat_id: ChatId,
        command: &str,
        argument: Option<String>,
        block: bool,
    ) -> RelayOutcome {
        let Some(argument) = argument else {
            self.reply(chat_id, &texts::usage(command)).await;
            return RelayOutcome::CommandRejected(CommandRejection::MissingArgument);
        };

        let user = match self.resolve_target(&argument).await {
            Ok(user) => user,
            Err(ResolveError::NotFound(handle)) => {
                tracing::info!(%handle, "Could not resolve handle");
                self.reply(chat_id, texts::HANDLE_NOT_FOUND).await;
                return RelayOutcome::CommandRejected(CommandRejection::UnknownHandle);
            }
            Err(ResolveError::InvalidId(_)) => {
                self.reply(chat_id, texts::INVALID_USER_ID).await;
                return RelayOutcome::CommandRejected(CommandRejection::InvalidId);
            }
        };

        if block {
            self.blocked.block(user);
            tracing::info!(user_id = %user, "User blocked");
            self.reply(chat_id, &texts::banned(&argument)).await;
            return RelayOutcome::Banned { user };
        }

        let was_blocked = self.blocked.unblock(user);
        if was_blocked {
            tracing::info!(user_id = %user, "User unblocked");
            self.reply(chat_id, &texts::unbanned(&argument)).await;
        } else {
            self.reply(chat_id, texts::NOT_BLOCKED).await;
        }
        RelayOutcome::Unbanned { user, was_blocked }
    }

    /// Turn a command argument into a user id.
    pub async fn resolve_target(&self, argument: &str) -> Result<UserId, ResolveError> {
        match UserTarget::parse(argument)? {
            UserTarget::Id(user) => Ok(user),
            UserTarget::Handle(handle) => self
                .gateway
                .resolve_member(self.moderation_chat, &handle)
                .await
                .map_err(|e| {
                    tracing::debug!(%handle, "Member lookup failed: {}", e);
                    ResolveError::NotFound(handle)
                }),
        }
    }

    async fn reply(&self, chat_id: ChatId, text: &str) {
        self.send(chat_id, text, TextFormat::Plain).await;
    }

    async fn send(&self, chat_id: ChatId, text: &str, format: TextFormat) {
        if let Err(e) = self.gateway.send_text(chat_id, text, format).await {
            tracing::warn!(chat_id = %chat_id, "Failed to send reply: {}", e);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
