use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use super::bot_api_models::{
    ApiResponse, ChatMember, CopyMessageRequest, EmptyRequest, GetChatMemberRequest,
    GetUpdatesRequest, Message, MessageIdResult, SendMessageRequest, Update, User,
};
use crate::core::relay::{
    BotIdentity, ChatGateway, ChatId, GatewayError, MessageId, SentMessage, TextFormat, UserId,
};

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";
/// Slack on top of the long-poll timeout before the HTTP request gives up.
const REQUEST_GRACE_SECS: u64 = 15;

/// Minimal Telegram Bot API client. It exposes only the calls the relay needs.
///
/// Cheap to clone: the underlying `reqwest::Client` is reference counted.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(token: String, poll_timeout_secs: u64) -> Result<Self, GatewayError> {
        Self::with_base_url(token, DEFAULT_BASE_URL, poll_timeout_secs)
    }

    /// Point the client at another Bot API server (local server or a test mock).
    pub fn with_base_url(
        token: String,
        base_url: impl Into<String>,
        poll_timeout_secs: u64,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs + REQUEST_GRACE_SECS))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// Call a Bot API method and unwrap the `{ok, result}` envelope.
    async fn call<P, R>(&self, method: &str, payload: &P) -> Result<R, GatewayError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.api_url(method))
            .json(payload)
            .send()
            .await
            // Strip the URL: it embeds the bot token.
            .map_err(|e| GatewayError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.without_url().to_string()))?;

        let envelope: ApiResponse<R> = serde_json::from_str(&body).map_err(|e| {
            GatewayError::Malformed(format!("{} ({}): {}", method, status, e))
        })?;

        if !envelope.ok {
            return Err(GatewayError::Api {
                code: envelope.error_code.unwrap_or_else(|| i64::from(status.as_u16())),
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }

        envelope
            .result
            .ok_or_else(|| GatewayError::Malformed(format!("{}: missing result", method)))
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
    ) -> Result<Message, GatewayError> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode,
        };
        self.call("sendMessage", &request).await
    }

    pub async fn copy_message(
        &self,
        chat_id: i64,
        from_chat_id: i64,
        message_id: i64,
    ) -> Result<MessageIdResult, GatewayError> {
        let request = CopyMessageRequest {
            chat_id,
            from_chat_id,
            message_id,
        };
        self.call("copyMessage", &request).await
    }

    /// `user` is passed through as-is, so an `@handle` only resolves where the
    /// Bot API accepts it.
    pub async fn get_chat_member(
        &self,
        chat_id: i64,
        user: &str,
    ) -> Result<ChatMember, GatewayError> {
        let request = GetChatMemberRequest {
            chat_id,
            user_id: user,
        };
        self.call("getChatMember", &request).await
    }

    pub async fn get_me(&self) -> Result<User, GatewayError> {
        self.call("getMe", &EmptyRequest {}).await
    }

    /// Long-poll for new message updates starting at `offset`.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, GatewayError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: &["message"],
        };
        self.call("getUpdates", &request).await
    }
}

#[async_trait]
impl ChatGateway for TelegramClient {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
    ) -> Result<SentMessage, GatewayError> {
        let parse_mode = match format {
            TextFormat::Plain => None,
            TextFormat::Markdown => Some("Markdown"),
        };
        let sent = self.send_message(chat_id.0, text, parse_mode).await?;
        Ok(SentMessage {
            message_id: MessageId(sent.message_id),
        })
    }

    async fn copy_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> Result<SentMessage, GatewayError> {
        let copied = TelegramClient::copy_message(self, to.0, from.0, message_id.0).await?;
        Ok(SentMessage {
            message_id: MessageId(copied.message_id),
        })
    }

    async fn resolve_member(&self, chat_id: ChatId, handle: &str) -> Result<UserId, GatewayError> {
        let member = self.get_chat_member(chat_id.0, handle).await?;
        Ok(UserId(member.user.id))
    }

    async fn get_me(&self) -> Result<BotIdentity, GatewayError> {
        let me = TelegramClient::get_me(self).await?;
        Ok(BotIdentity {
            id: UserId(me.id),
            username: me.username,
        })
    }
}
