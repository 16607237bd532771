// Environment-driven configuration.
//
// Everything comes from environment variables (optionally via a `.env` file
// loaded in `main`). Only the bot token is required.

use crate::core::relay::{parse_chat_id, ChatId, ChatIdError};
use crate::core::supervision::RestartPolicy;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Moderation group used when `MODERATION_CHAT_ID` is not set.
pub const DEFAULT_MODERATION_CHAT_ID: &str = "-1002485675560";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("BOT_TOKEN not set. Create a .env file or set BOT_TOKEN env var.")]
    MissingToken,

    #[error("Invalid value for {key}: `{value}`")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid MODERATION_CHAT_ID: {0}")]
    InvalidChatId(#[from] ChatIdError),
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub moderation_chat_id: ChatId,
    /// `None` picks a random port at startup.
    pub keepalive_port: Option<u16>,
    pub health_check_interval: Duration,
    pub poll_timeout_secs: u64,
    pub restart_policy: RestartPolicy,
    pub question_capacity: usize,
    /// `None` disables expiry.
    pub question_ttl: Option<chrono::Duration>,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("BOT_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let raw_chat_id =
            lookup("MODERATION_CHAT_ID").unwrap_or_else(|| DEFAULT_MODERATION_CHAT_ID.to_string());
        let moderation_chat_id = parse_chat_id(&raw_chat_id)?;

        let keepalive_port = parse_optional::<u16>(&lookup, "KEEPALIVE_PORT")?;
        let health_check_secs = parse_or::<u64>(&lookup, "HEALTH_CHECK_INTERVAL_SECS", 60)?;
        let poll_timeout_secs = parse_or::<u64>(&lookup, "POLL_TIMEOUT_SECS", 30)?;
        let initial_backoff = parse_or::<u64>(&lookup, "RESTART_INITIAL_BACKOFF_SECS", 1)?;
        let max_backoff = parse_or::<u64>(&lookup, "RESTART_MAX_BACKOFF_SECS", 60)?;
        let max_restarts = parse_or::<u32>(&lookup, "RESTART_MAX_ATTEMPTS", 0)?;
        let question_capacity = parse_or::<usize>(&lookup, "QUESTION_CACHE_CAPACITY", 10_000)?;
        let question_ttl_hours = parse_or::<u32>(&lookup, "QUESTION_TTL_HOURS", 168)?;

        if health_check_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "HEALTH_CHECK_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            bot_token,
            moderation_chat_id,
            keepalive_port,
            health_check_interval: Duration::from_secs(health_check_secs),
            poll_timeout_secs,
            restart_policy: RestartPolicy {
                initial_backoff: Duration::from_secs(initial_backoff),
                max_backoff: Duration::from_secs(max_backoff),
                max_restarts,
            },
            question_capacity,
            question_ttl: (question_ttl_hours > 0)
                .then(|| chrono::Duration::hours(i64::from(question_ttl_hours))),
        })
    }
}

fn parse_optional<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    Ok(parse_optional(lookup, key)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<BotConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_missing_token_is_fatal() {
        assert_eq!(config(&[]).unwrap_err(), ConfigError::MissingToken);
        assert_eq!(
            config(&[("BOT_TOKEN", "   ")]).unwrap_err(),
            ConfigError::MissingToken
        );
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[("BOT_TOKEN", "123:ABC")]).unwrap();

        assert_eq!(cfg.bot_token, "123:ABC");
        assert_eq!(cfg.moderation_chat_id, ChatId(-1002485675560));
        assert_eq!(cfg.keepalive_port, None);
        assert_eq!(cfg.health_check_interval, Duration::from_secs(60));
        assert_eq!(cfg.poll_timeout_secs, 30);
        assert_eq!(cfg.restart_policy, RestartPolicy::default());
        assert_eq!(cfg.question_capacity, 10_000);
        assert_eq!(cfg.question_ttl, Some(chrono::Duration::hours(168)));
    }

    #[test]
    fn test_bare_moderation_chat_id_is_normalized() {
        let cfg = config(&[("BOT_TOKEN", "t"), ("MODERATION_CHAT_ID", "2485675560")]).unwrap();
        assert_eq!(cfg.moderation_chat_id, ChatId(-1002485675560));
    }

    #[test]
    fn test_invalid_moderation_chat_id() {
        let err = config(&[("BOT_TOKEN", "t"), ("MODERATION_CHAT_ID", "mods")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidChatId(_)));
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("BOT_TOKEN", "t"),
            ("KEEPALIVE_PORT", "8080"),
            ("HEALTH_CHECK_INTERVAL_SECS", "15"),
            ("RESTART_MAX_ATTEMPTS", "5"),
            ("QUESTION_TTL_HOURS", "0"),
        ])
        .unwrap();

        assert_eq!(cfg.keepalive_port, Some(8080));
        assert_eq!(cfg.health_check_interval, Duration::from_secs(15));
        assert_eq!(cfg.restart_policy.max_restarts, 5);
        assert_eq!(cfg.question_ttl, None);
    }

    #[test]
    fn test_unparsable_number_is_rejected() {
        let err = config(&[("BOT_TOKEN", "t"), ("KEEPALIVE_PORT", "70000")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "KEEPALIVE_PORT",
                value: "70000".to_string()
            }
        );
    }

    #[test]
    fn test_zero_health_interval_is_rejected() {
        let err = config(&[("BOT_TOKEN", "t"), ("HEALTH_CHECK_INTERVAL_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
