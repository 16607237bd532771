// Long-polling update loop.
//
// Pulls message updates from the Bot API, converts them into core inbound
// messages and hands them to the relay one at a time. The offset lives
// outside the loop so a relaunched loop resumes where the last one stopped.
// A stop request is honoured between updates, never in the middle of one.

use crate::core::relay::{
    BlockList, ChatGateway, ChatId, GatewayError, InboundMessage, MediaKind, MessageId,
    QuestionStore, RelayService, Sender, UserId,
};
use crate::infra::telegram::bot_api_models::Message;
use crate::infra::telegram::TelegramClient;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::watch;

pub struct UpdatePoller {
    client: TelegramClient,
    offset: AtomicI64,
    timeout_secs: u64,
}

impl UpdatePoller {
    pub fn new(client: TelegramClient, timeout_secs: u64) -> Self {
        Self {
            client,
            offset: AtomicI64::new(0),
            timeout_secs,
        }
    }

    /// Id of the next update to fetch.
    pub fn offset(&self) -> i64 {
        self.offset.load(Ordering::SeqCst)
    }

    /// Poll until the transport fails or `stop` turns true. Each update is
    /// fully handled before the next one is looked at.
    ///
    /// A pending long poll is dropped on stop; nothing was consumed yet, so
    /// its updates are fetched again by the next run. Updates of a batch that
    /// were not reached are left for the next run as well.
    pub async fn run<G, B, Q>(
        &self,
        relay: &RelayService<G, B, Q>,
        mut stop: watch::Receiver<bool>,
    ) -> Result<(), GatewayError>
    where
        G: ChatGateway,
        B: BlockList,
        Q: QuestionStore,
    {
        tracing::info!(offset = self.offset(), "Listening for updates...");

        loop {
            let updates = tokio::select! {
                updates = self.client.get_updates(self.offset(), self.timeout_secs) => updates?,
                _ = stop_requested(&mut stop) => {
                    tracing::info!(offset = self.offset(), "Update loop stopped");
                    return Ok(());
                }
            };

            for update in updates {
                if *stop.borrow() {
                    tracing::info!(offset = self.offset(), "Update loop stopped");
                    return Ok(());
                }

                // Advance first: an update that keeps crashing the handler is
                // not fetched again after a relaunch.
                self.offset.store(update.update_id + 1, Ordering::SeqCst);

                let Some(message) = update.message else {
                    continue;
                };

                let inbound = to_inbound(&message);
                let outcome = relay.handle(&inbound).await;
                tracing::debug!(
                    update_id = update.update_id,
                    chat_id = %inbound.chat_id,
                    ?outcome,
                    "Handled update"
                );
            }
        }
    }
}

/// Resolves once `stop` is set. A dropped sender counts as a stop.
async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    while !*stop.borrow_and_update() {
        if stop.changed().await.is_err() {
            return;
        }
    }
}

/// Convert a Bot API message into the relay's view of it.
pub fn to_inbound(message: &Message) -> InboundMessage {
    InboundMessage {
        chat_id: ChatId(message.chat.id),
        message_id: MessageId(message.message_id),
        sender: message.from.as_ref().map(|user| Sender {
            id: UserId(user.id),
            username: user.username.clone(),
        }),
        text: message.text.clone(),
        reply_to: message
            .reply_to_message
            .as_ref()
            .map(|reply| MessageId(reply.message_id)),
        media: media_kind(message),
    }
}

fn media_kind(message: &Message) -> Option<MediaKind> {
    // Animations also carry a `document`; check them before anything else.
    if message.animation.is_some() {
        Some(MediaKind::Animation)
    } else if message.sticker.is_some() {
        Some(MediaKind::Sticker)
    } else if message.photo.is_some() {
        Some(MediaKind::Photo)
    } else if message.video.is_some() {
        Some(MediaKind::Video)
    } else {
        None
    }
}
