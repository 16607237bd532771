// Core relay module - question forwarding, answer routing and the block list.

pub mod chat_id;
pub mod commands;
pub mod relay_models;
pub mod relay_ports;
pub mod relay_service;
pub mod relay_texts;

pub use chat_id::{normalize_chat_id, parse_chat_id, ChatIdError};
pub use relay_models::*;
pub use relay_ports::{BlockList, ChatGateway, GatewayError, QuestionStore};
pub use relay_service::RelayService;
