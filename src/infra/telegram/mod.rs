pub mod bot_api_client;
pub mod bot_api_models;

pub use bot_api_client::TelegramClient;
