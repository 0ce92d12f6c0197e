//! UseCase: 部屋詳細の取得（検査 API 用）

use std::sync::Arc;

use thiserror::Error;

use crate::domain::{ConnectionId, Member, RoomDirectory, RoomId};

/// 部屋詳細取得の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("room not found")]
    RoomNotFound,
}

/// 部屋 1 つ分の読み取り専用ビュー
#[derive(Debug, Clone, PartialEq)]
pub struct RoomDetail {
    pub id: RoomId,
    pub host: Option<ConnectionId>,
    pub members: Vec<Member>,
    pub pending_count: usize,
    pub object_count: usize,
    /// 作成時刻（Unix ミリ秒）
    pub created_at: i64,
}

/// 部屋詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    /// RoomDirectory（部屋レジストリの抽象化）
    directory: Arc<dyn RoomDirectory>,
}

impl GetRoomDetailUseCase {
    /// 新しい GetRoomDetailUseCase を作成
    pub fn new(directory: Arc<dyn RoomDirectory>) -> Self {
        Self { directory }
    }

    /// 部屋詳細を取得
    pub async fn execute(&self, room_id: &RoomId) -> Result<RoomDetail, GetRoomDetailError> {
        let shared = self
            .directory
            .get(room_id)
            .await
            .ok_or(GetRoomDetailError::RoomNotFound)?;
        let room = shared.lock().await;
        Ok(RoomDetail {
            id: room.id().clone(),
            host: room.host().cloned(),
            members: room.members().to_vec(),
            pending_count: room.pending_count(),
            object_count: room.scene().len(),
            created_at: room.created_at(),
        })
    }
}
