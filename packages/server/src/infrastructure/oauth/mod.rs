//! 外部 OAuth 連携

mod discord;

pub use discord::{DiscordOAuthConfig, DiscordTokenClient, TokenExchangeError};
