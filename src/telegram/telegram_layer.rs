// Telegram layer - update loop, liveness supervision and the keepalive endpoint.

use crate::core::relay::RelayService;
use crate::infra::relay::{InMemoryBlockList, InMemoryQuestionStore};
use crate::infra::telegram::TelegramClient;

pub mod liveness;
pub mod supervisor;
pub mod update_poller;

/// The relay as wired for production.
pub type Relay = RelayService<TelegramClient, InMemoryBlockList, InMemoryQuestionStore>;
