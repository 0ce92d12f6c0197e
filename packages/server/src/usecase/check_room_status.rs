//! UseCase: 部屋の状態確認
//!
//! 入室を検討しているクライアントが、即時入室（ホストになる）か
//! 承認待ちになるかを事前に知るための読み取り操作。メンバーシップは
//! 一切変更しない。仕様上、部屋は最初の参照（状態確認または入室要求）
//! で作られるため、未知の部屋 ID はここで空の部屋になる。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, RoomDirectory, RoomId};

/// 部屋の状態確認のユースケース
pub struct CheckRoomStatusUseCase {
    /// RoomDirectory（部屋レジストリの抽象化）
    directory: Arc<dyn RoomDirectory>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl CheckRoomStatusUseCase {
    /// 新しい CheckRoomStatusUseCase を作成
    pub fn new(directory: Arc<dyn RoomDirectory>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            directory,
            message_pusher,
        }
    }

    /// 部屋にホストがいるかを返す
    ///
    /// 初出の部屋 ID に対しては空の部屋を作る（ホスト不在として報告）。
    pub async fn execute(&self, room_id: &RoomId) -> bool {
        let shared = self.directory.get_or_create(room_id).await;
        let room = shared.lock().await;
        room.has_host()
    }

    /// 問い合わせ元へ room-status 応答を送る
    pub async fn reply_status(&self, requester: &ConnectionId, json: &str) {
        if let Err(e) = self.message_pusher.push_to(requester, json).await {
            tracing::warn!("Failed to reply room-status to '{}': {}", requester, e);
        }
    }
}
