// Text command parsing for the relay.
//
// Commands arrive as ordinary message text. Only the first token decides the
// command. `/ban@SomeBot` counts only when `SomeBot` is this bot.

use super::relay_models::UserId;
use thiserror::Error;

/// A command the relay understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayCommand {
    /// Greeting shown when a user opens the bot.
    Start,
    /// Block a user. The raw argument is kept for the reply text.
    Ban(Option<String>),
    /// Lift a block.
    Unban(Option<String>),
}

impl RelayCommand {
    /// Parse message text into a command, if it is one the relay handles.
    ///
    /// A command addressed to another bot (`/ban@OtherBot`) is not ours.
    /// When `bot_username` is unknown any addressed command is accepted.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let rest = text.trim_start().strip_prefix('/')?;
        let mut tokens = rest.split_whitespace();
        let head = tokens.next()?;
        let (name, addressee) = match head.split_once('@') {
            Some((name, addressee)) => (name, Some(addressee)),
            None => (head, None),
        };

        if let (Some(addressee), Some(own)) = (addressee, bot_username) {
            if !addressee.eq_ignore_ascii_case(own.trim_start_matches('@')) {
                return None;
            }
        }

        let argument = tokens.next().map(str::to_string);

        match name {
            "start" => Some(RelayCommand::Start),
            "ban" => Some(RelayCommand::Ban(argument)),
            "unban" => Some(RelayCommand::Unban(argument)),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No member found for {0}")]
    NotFound(String),

    #[error("Invalid user id: {0}")]
    InvalidId(String),
}

/// Who a moderator command refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserTarget {
    /// `@handle`, resolved through the chat gateway. Keeps the `@`.
    Handle(String),
    /// A literal numeric user id.
    Id(UserId),
}

impl UserTarget {
    pub fn parse(argument: &str) -> Result<Self, ResolveError> {
        if argument.starts_with('@') {
            return Ok(UserTarget::Handle(argument.to_string()));
        }

        argument
            .parse::<i64>()
            .map(|id| UserTarget::Id(UserId(id)))
            .map_err(|_| ResolveError::InvalidId(argument.to_string()))
    }
}
