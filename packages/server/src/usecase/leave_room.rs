//! UseCase: 切断による退室
//!
//! 明示的な退室メッセージは存在しない。トランスポートの切断だけが
//! この操作を起動する。admitted メンバーの退室は残りのメンバーへの
//! player-left、ホストの退室はさらにホスト継承（you-are-host と
//! host-changed）を引き起こす。最後のメンバーが抜けた部屋はレジストリ
//! から消える。

use std::sync::Arc;

use crate::domain::{ConnectionId, LeaveOutcome, MessagePusher, RoomDirectory, RoomId};

/// 退室のユースケース
pub struct LeaveRoomUseCase {
    /// RoomDirectory（部屋レジストリの抽象化）
    directory: Arc<dyn RoomDirectory>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl LeaveRoomUseCase {
    /// 新しい LeaveRoomUseCase を作成
    pub fn new(directory: Arc<dyn RoomDirectory>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            directory,
            message_pusher,
        }
    }

    /// 退室を実行
    ///
    /// 部屋が存在しない場合は no-op。admitted が空になった部屋の削除も
    /// ここで行う（pending が残っていれば部屋は残る）。
    pub async fn execute(&self, room_id: &RoomId, connection_id: &ConnectionId) -> LeaveOutcome {
        let Some(shared) = self.directory.get(room_id).await else {
            return LeaveOutcome {
                removed: false,
                was_pending: false,
                remaining: Vec::new(),
                new_host: None,
                now_empty: false,
            };
        };

        // 部屋のロックを手放してから Directory の削除を呼ぶ（ロック順序:
        // マップ → 部屋）
        let outcome = {
            let mut room = shared.lock().await;
            room.leave(connection_id)
        };

        if outcome.now_empty {
            self.directory.remove_if_empty(room_id).await;
        }

        outcome
    }

    /// 残りのメンバーへ player-left を配る
    pub async fn broadcast_player_left(&self, targets: Vec<ConnectionId>, json: &str) {
        if let Err(e) = self.message_pusher.broadcast(targets, json).await {
            tracing::warn!("Failed to broadcast player-left: {}", e);
        }
    }

    /// 新ホストへ you-are-host を送る
    pub async fn notify_new_host(&self, new_host: &ConnectionId, json: &str) {
        if let Err(e) = self.message_pusher.push_to(new_host, json).await {
            tracing::warn!("Failed to notify new host '{}': {}", new_host, e);
        }
    }

    /// 残りのメンバー全員へ host-changed を配る
    pub async fn broadcast_host_changed(&self, targets: Vec<ConnectionId>, json: &str) {
        if let Err(e) = self.message_pusher.broadcast(targets, json).await {
            tracing::warn!("Failed to broadcast host-changed: {}", e);
        }
    }
}
