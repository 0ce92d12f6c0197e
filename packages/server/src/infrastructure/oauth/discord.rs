//! Discord OAuth コード交換クライアント
//!
//! Activity クライアントが受け取った authorization code をアクセス
//! トークンに交換します。リレー本体はトークンの中身を一切解釈せず、
//! Discord のレスポンスをそのまま呼び出し元へ返します。
//!
//! これはコーディネータ全体で唯一、呼び出し元に構造化エラーを見せる
//! 経路です（上流依存の失敗はユーザーに通知する価値がある）。秘密情報は
//! 環境変数からのみ読み、リクエスト到達時に検査します（起動時には
//! 落とさない）。

use thiserror::Error;

/// DISCORD_CLIENT_ID 未設定時に使う Activity のクライアント ID
pub const DEFAULT_CLIENT_ID: &str = "1455487225490837526";

const TOKEN_URL: &str = "https://discord.com/api/oauth2/token";

/// コード交換の失敗
#[derive(Debug, Error)]
pub enum TokenExchangeError {
    #[error("authorization code is required")]
    MissingCode,
    #[error("DISCORD_CLIENT_SECRET is not configured")]
    MissingSecret,
    #[error("failed to contact Discord: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("Discord rejected the code exchange ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("invalid response from Discord: {0}")]
    InvalidResponse(String),
}

/// OAuth クライアントの設定
#[derive(Debug, Clone)]
pub struct DiscordOAuthConfig {
    pub client_id: String,
    /// 未設定なら交換リクエストが `MissingSecret` で失敗する
    pub client_secret: Option<String>,
}

impl DiscordOAuthConfig {
    /// 環境変数から設定を読む
    ///
    /// `DISCORD_CLIENT_ID` が無ければ既定の Activity ID を使う。
    /// `DISCORD_CLIENT_SECRET` の有無はここでは検査しない。
    pub fn from_env() -> Self {
        Self {
            client_id: std::env::var("DISCORD_CLIENT_ID")
                .unwrap_or_else(|_| DEFAULT_CLIENT_ID.to_string()),
            client_secret: std::env::var("DISCORD_CLIENT_SECRET").ok(),
        }
    }
}

/// Discord のトークンエンドポイントへの交換クライアント
pub struct DiscordTokenClient {
    http: reqwest::Client,
    config: DiscordOAuthConfig,
    token_url: String,
}

impl DiscordTokenClient {
    pub fn new(config: DiscordOAuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            token_url: TOKEN_URL.to_string(),
        }
    }

    /// authorization code をトークンペイロードに交換する
    ///
    /// 成功時は Discord のレスポンス JSON をそのまま返す。上流が
    /// 2xx 以外を返した場合はステータスとボディを `Rejected` に載せて
    /// 返す（呼び出し元がユーザーに見せられるように）。
    pub async fn exchange(&self, code: &str) -> Result<serde_json::Value, TokenExchangeError> {
        if code.trim().is_empty() {
            return Err(TokenExchangeError::MissingCode);
        }
        let Some(client_secret) = &self.config.client_secret else {
            return Err(TokenExchangeError::MissingSecret);
        };

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
        ];

        let response = self.http.post(&self.token_url).form(&params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!("Discord OAuth rejected code exchange: {} {}", status, body);
            return Err(TokenExchangeError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| TokenExchangeError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_secret() -> DiscordOAuthConfig {
        DiscordOAuthConfig {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            client_secret: Some("test-secret".to_string()),
        }
    }

    #[tokio::test]
    async fn test_exchange_rejects_empty_code() {
        // テスト項目: 空の authorization code が上流に到達する前に拒否される
        // given (前提条件):
        let client = DiscordTokenClient::new(config_with_secret());

        // when (操作):
        let result = client.exchange("   ").await;

        // then (期待する結果):
        assert!(matches!(result, Err(TokenExchangeError::MissingCode)));
    }

    #[tokio::test]
    async fn test_exchange_requires_client_secret() {
        // テスト項目: クライアントシークレット未設定時に設定エラーが返される
        // given (前提条件):
        let client = DiscordTokenClient::new(DiscordOAuthConfig {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            client_secret: None,
        });

        // when (操作):
        let result = client.exchange("some-code").await;

        // then (期待する結果):
        assert!(matches!(result, Err(TokenExchangeError::MissingSecret)));
    }

    #[test]
    fn test_error_messages_are_machine_readable() {
        // テスト項目: 交換失敗の理由がエラーメッセージから判別できる
        // given (前提条件):
        let rejected = TokenExchangeError::Rejected {
            status: 400,
            body: r#"{"error":"invalid_grant"}"#.to_string(),
        };

        // when (操作):
        let message = rejected.to_string();

        // then (期待する結果):
        assert!(message.contains("400"));
        assert!(message.contains("invalid_grant"));
    }
}
