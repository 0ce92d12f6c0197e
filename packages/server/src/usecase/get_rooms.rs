//! UseCase: 部屋一覧の取得（検査 API 用）

use std::sync::Arc;

use crate::domain::{RoomDirectory, RoomId};

/// 部屋 1 つ分のサマリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub id: RoomId,
    pub member_count: usize,
    pub pending_count: usize,
    pub has_host: bool,
}

/// 部屋一覧取得のユースケース
pub struct GetRoomsUseCase {
    /// RoomDirectory（部屋レジストリの抽象化）
    directory: Arc<dyn RoomDirectory>,
}

impl GetRoomsUseCase {
    /// 新しい GetRoomsUseCase を作成
    pub fn new(directory: Arc<dyn RoomDirectory>) -> Self {
        Self { directory }
    }

    /// 登録されている全部屋のサマリを ID 順で返す
    pub async fn execute(&self) -> Vec<RoomSummary> {
        let mut summaries = Vec::new();
        for room_id in self.directory.room_ids().await {
            // 列挙とスナップショットの間に消えた部屋は黙って飛ばす
            let Some(shared) = self.directory.get(&room_id).await else {
                continue;
            };
            let room = shared.lock().await;
            summaries.push(RoomSummary {
                id: room_id,
                member_count: room.member_count(),
                pending_count: room.pending_count(),
                has_host: room.has_host(),
            });
        }
        summaries
    }
}
