//! UseCase: 状態更新イベントのリレー
//!
//! 入室承認以外の全イベント（ダイスロール、オブジェクトの追加・移動・
//! 属性変更など）の通り道。共有オブジェクトストアへのミューテーションを
//! 適用してから、宛先ポリシーに従って部屋のメンバーへフレームを配る。
//!
//! 部屋に入っていない送信者・admitted でない送信者のイベントは
//! プロトコル違反として黙って捨てる（エラーは返さない。送信者に
//! 構造化エラーを届ける確実な経路がなく、ピアの整合性は結果整合で
//! 吸収されるため）。

use std::sync::Arc;

use irori_shared::time::get_unix_timestamp;

use crate::domain::{
    ConnectionId, MessagePusher, RecipientPolicy, RoomDirectory, RoomId, SceneUpdate,
};

/// イベントリレーのユースケース
pub struct RelayEventUseCase {
    /// RoomDirectory（部屋レジストリの抽象化）
    directory: Arc<dyn RoomDirectory>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl RelayEventUseCase {
    /// 新しい RelayEventUseCase を作成
    pub fn new(directory: Arc<dyn RoomDirectory>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            directory,
            message_pusher,
        }
    }

    /// ストアのミューテーション適用とフレームのファンアウトを実行
    ///
    /// ミューテーションと宛先の確定は部屋のロックの中で原子的に行い、
    /// 送信自体はロックの外で fire-and-forget する。一部の宛先への
    /// 送信失敗は適用済みのミューテーションに影響しない。
    ///
    /// 返り値はリレーしたかどうか（捨てた場合 false）。
    pub async fn execute(
        &self,
        room_id: &RoomId,
        sender: &ConnectionId,
        update: SceneUpdate,
        policy: RecipientPolicy,
        frame: String,
    ) -> bool {
        let Some(shared) = self.directory.get(room_id).await else {
            tracing::debug!(
                "Dropping relay event from '{}': room '{}' not found",
                sender,
                room_id
            );
            return false;
        };

        let targets = {
            let mut room = shared.lock().await;
            if !room.is_member(sender) {
                tracing::debug!(
                    "Dropping relay event from '{}': not an admitted member of '{}'",
                    sender,
                    room_id
                );
                return false;
            }
            room.touch(get_unix_timestamp());
            room.scene_mut().apply(update);
            match policy {
                RecipientPolicy::Others => room
                    .member_ids()
                    .into_iter()
                    .filter(|id| id != sender)
                    .collect(),
                RecipientPolicy::All => room.member_ids(),
            }
        };

        if let Err(e) = self.message_pusher.broadcast(targets, &frame).await {
            tracing::warn!("Failed to broadcast relayed event: {}", e);
        }
        true
    }
}
