// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "relay/mod.rs"]
pub mod relay;

#[path = "telegram/mod.rs"]
pub mod telegram;
