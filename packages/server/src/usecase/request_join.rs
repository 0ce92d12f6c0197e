//! UseCase: 入室要求
//!
//! ホスト不在の部屋なら要求者を即時入室させてホストにし、ホストが
//! いれば承認待ちに積む。どちらの通知を誰に送るかは Outcome が示し、
//! フレームの組み立ては UI 層が行う。

use std::sync::Arc;

use irori_shared::time::get_unix_timestamp;

use crate::domain::{ConnectionId, JoinOutcome, MessagePusher, PlayerName, RoomDirectory, RoomId};

/// 入室要求のユースケース
pub struct RequestJoinUseCase {
    /// RoomDirectory（部屋レジストリの抽象化）
    directory: Arc<dyn RoomDirectory>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl RequestJoinUseCase {
    /// 新しい RequestJoinUseCase を作成
    pub fn new(directory: Arc<dyn RoomDirectory>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            directory,
            message_pusher,
        }
    }

    /// 入室要求を実行
    ///
    /// 部屋は最初の参照で作られるため、この操作は失敗しない。
    pub async fn execute(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        name: PlayerName,
    ) -> JoinOutcome {
        let shared = self.directory.get_or_create(room_id).await;
        let mut room = shared.lock().await;
        room.request_join(connection_id, name, get_unix_timestamp())
    }

    /// 接続がこの部屋にまだ在籍しているか（admitted または pending）
    ///
    /// ハンドラが二重参加（別の部屋にいるままの入室要求）を弾くために
    /// 使う。deny された接続は在籍していないため再要求が通る。
    pub async fn is_active_in(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool {
        match self.directory.get(room_id).await {
            Some(shared) => {
                let room = shared.lock().await;
                room.is_member(connection_id) || room.is_pending(connection_id)
            }
            None => false,
        }
    }

    /// 即時入室した要求者へ admitted 応答を送る
    pub async fn reply_admitted(&self, requester: &ConnectionId, json: &str) {
        if let Err(e) = self.message_pusher.push_to(requester, json).await {
            tracing::warn!("Failed to reply admitted to '{}': {}", requester, e);
        }
    }

    /// ホストへ join-request を通知する
    pub async fn notify_host(&self, host: &ConnectionId, json: &str) {
        if let Err(e) = self.message_pusher.push_to(host, json).await {
            tracing::warn!("Failed to notify host '{}' of a join request: {}", host, e);
        }
    }
}
