//! 接続に関する Value Object
//!
//! `ConnectionId` は物理的な WebSocket 接続ごとに一意な ID です。
//! サーバー側で生成されるため衝突しませんが、クライアントから
//! 送り返される値（admit-player の対象など）も同じ型で受けるため、
//! 検証付きコンストラクタを持ちます。

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// 表示名の最大文字数
pub const MAX_PLAYER_NAME_CHARS: usize = 64;

/// Value Object の検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("connection id must not be empty")]
    EmptyConnectionId,
    #[error("player name must not be empty")]
    EmptyPlayerName,
    #[error("player name too long: {0} characters (max {MAX_PLAYER_NAME_CHARS})")]
    PlayerNameTooLong(usize),
    #[error("room id must not be empty")]
    EmptyRoomId,
    #[error("object id must not be empty")]
    EmptyObjectId,
}

/// 接続 ID（物理接続ごとに一意）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// 新しい接続 ID を生成（UUID v4）
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// クライアントから受け取った文字列を検証して ConnectionId を作成
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyConnectionId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 表示名（クライアント申告、信頼しない）
///
/// 空文字と過剰な長さのみ弾きます。内容のサニタイズは行いません
/// （描画側の責務）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerName(String);

impl PlayerName {
    /// 表示名を検証して PlayerName を作成
    pub fn new(value: String) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyPlayerName);
        }
        let chars = trimmed.chars().count();
        if chars > MAX_PLAYER_NAME_CHARS {
            return Err(ValidationError::PlayerNameTooLong(chars));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
