//! MessagePusher trait 定義
//!
//! 接続 ID からトランスポートハンドル（送信チャンネル）を引くための
//! インターフェース。Room はハンドルを所有せず接続 ID だけを持ち、
//! 実際の送信はこの trait を通して行います。トランスポートの寿命と
//! 部屋の寿命を独立に扱うための分離です。
//!
//! `broadcast` は fire-and-forget：一部の宛先への送信失敗はログに
//! 残すだけで、他の宛先への配送も呼び出し元の状態変更も妨げません。

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;
use tokio::sync::mpsc;

use super::connection::ConnectionId;

/// 接続ごとの送信チャンネル（シリアライズ済み JSON を送る）
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// メッセージ送信エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("connection '{0}' is not registered")]
    ConnectionNotFound(String),
    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// Message Pusher trait（接続レジストリ）
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続とその送信チャンネルを登録
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続を登録解除
    async fn unregister_connection(&self, connection_id: &ConnectionId);

    /// 特定の接続にメッセージを送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続にメッセージをブロードキャスト（部分失敗を許容）
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError>;
}
