//! InMemory RoomDirectory 実装
//!
//! ドメイン層が定義する RoomDirectory trait の具体的な実装。
//! `HashMap<RoomId, Arc<Mutex<Room>>>` をインメモリレジストリとして
//! 使用します。外側の Mutex はマップ操作（作成・削除・列挙）だけを
//! 守り、部屋の状態変更は部屋ごとの内側の Mutex で直列化されます。
//!
//! ## ロック順序
//!
//! マップ → 部屋 の順でのみ取得します。UseCase 層は部屋のロックを
//! 保持したまま Directory のメソッドを呼ばないこと。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use irori_shared::time::get_unix_timestamp;

use crate::domain::{Room, RoomDirectory, RoomId, SharedRoom};

/// インメモリ RoomDirectory 実装
pub struct InMemoryRoomDirectory {
    /// Room ID と部屋ごとの共有ハンドルのマップ
    rooms: Mutex<HashMap<RoomId, SharedRoom>>,
}

impl InMemoryRoomDirectory {
    /// 新しい InMemoryRoomDirectory を作成
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomDirectory for InMemoryRoomDirectory {
    async fn get_or_create(&self, room_id: &RoomId) -> SharedRoom {
        let mut rooms = self.rooms.lock().await;
        rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                tracing::info!("Room '{}' created", room_id);
                Arc::new(Mutex::new(Room::new(room_id.clone(), get_unix_timestamp())))
            })
            .clone()
    }

    async fn get(&self, room_id: &RoomId) -> Option<SharedRoom> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).cloned()
    }

    async fn remove_if_empty(&self, room_id: &RoomId) {
        let mut rooms = self.rooms.lock().await;
        let Some(shared) = rooms.get(room_id).cloned() else {
            return;
        };
        let room = shared.lock().await;
        if room.is_empty() {
            rooms.remove(room_id);
            tracing::info!("Room '{}' destroyed (empty)", room_id);
        }
    }

    async fn sweep_stale_pending(&self, max_idle_millis: i64, now_millis: i64) -> usize {
        let mut rooms = self.rooms.lock().await;
        let mut stale: Vec<RoomId> = Vec::new();
        for (room_id, shared) in rooms.iter() {
            let room = shared.lock().await;
            if room.is_stale(now_millis, max_idle_millis) {
                stale.push(room_id.clone());
            }
        }
        for room_id in &stale {
            rooms.remove(room_id);
            tracing::info!("Room '{}' swept (no admitted members)", room_id);
        }
        stale.len()
    }

    async fn room_ids(&self) -> Vec<RoomId> {
        let rooms = self.rooms.lock().await;
        let mut ids: Vec<RoomId> = rooms.keys().cloned().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }

    async fn count_rooms(&self) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, PlayerName};

    fn rid(s: &str) -> RoomId {
        RoomId::new(s.to_string()).unwrap()
    }

    fn name(s: &str) -> PlayerName {
        PlayerName::new(s.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_get_or_create_creates_empty_room() {
        // テスト項目: 未知の Room ID に対して空の部屋が作られる
        // given (前提条件):
        let directory = InMemoryRoomDirectory::new();

        // when (操作):
        let shared = directory.get_or_create(&rid("r1")).await;

        // then (期待する結果):
        let room = shared.lock().await;
        assert!(!room.has_host());
        assert_eq!(room.member_count(), 0);
        assert_eq!(room.pending_count(), 0);
        assert!(room.scene().is_empty());
        assert_eq!(directory.count_rooms().await, 1);
    }

    #[tokio::test]
    async fn test_get_or_create_returns_same_room() {
        // テスト項目: 同じ Room ID に対して同じ部屋が返される
        // given (前提条件):
        let directory = InMemoryRoomDirectory::new();
        let first = directory.get_or_create(&rid("r1")).await;

        // when (操作):
        let second = directory.get_or_create(&rid("r1")).await;

        // then (期待する結果):
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(directory.count_rooms().await, 1);
    }

    #[tokio::test]
    async fn test_get_unknown_room_returns_none() {
        // テスト項目: 存在しない Room ID の get が None を返す
        // given (前提条件):
        let directory = InMemoryRoomDirectory::new();

        // when (操作):
        let result = directory.get(&rid("nonexistent")).await;

        // then (期待する結果):
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_remove_if_empty_removes_empty_room() {
        // テスト項目: 空の部屋が remove_if_empty で削除され、get で引けなくなる
        // given (前提条件):
        let directory = InMemoryRoomDirectory::new();
        directory.get_or_create(&rid("r1")).await;

        // when (操作):
        directory.remove_if_empty(&rid("r1")).await;

        // then (期待する結果):
        assert!(directory.get(&rid("r1")).await.is_none());
        assert_eq!(directory.count_rooms().await, 0);
    }

    #[tokio::test]
    async fn test_remove_if_empty_keeps_room_with_member() {
        // テスト項目: メンバーのいる部屋への remove_if_empty が no-op になる
        // given (前提条件):
        let directory = InMemoryRoomDirectory::new();
        let shared = directory.get_or_create(&rid("r1")).await;
        {
            let mut room = shared.lock().await;
            room.request_join(ConnectionId::generate(), name("Alice"), 1000);
        }

        // when (操作):
        directory.remove_if_empty(&rid("r1")).await;

        // then (期待する結果):
        assert!(directory.get(&rid("r1")).await.is_some());
    }

    #[tokio::test]
    async fn test_remove_if_empty_keeps_pending_only_room() {
        // テスト項目: pending のみの部屋が remove_if_empty では削除されない
        // given (前提条件):
        let directory = InMemoryRoomDirectory::new();
        let shared = directory.get_or_create(&rid("r1")).await;
        {
            let mut room = shared.lock().await;
            // ホストを作ってから退室させ、pending だけを残す
            let host = ConnectionId::generate();
            room.request_join(host.clone(), name("Alice"), 1000);
            room.request_join(ConnectionId::generate(), name("Bob"), 2000);
            room.leave(&host);
        }

        // when (操作):
        directory.remove_if_empty(&rid("r1")).await;

        // then (期待する結果): 最初の admitted メンバーを待って部屋は残る
        assert!(directory.get(&rid("r1")).await.is_some());
    }

    #[tokio::test]
    async fn test_remove_if_empty_is_idempotent() {
        // テスト項目: 存在しない部屋への remove_if_empty が no-op になる
        // given (前提条件):
        let directory = InMemoryRoomDirectory::new();

        // when (操作):
        directory.remove_if_empty(&rid("nonexistent")).await;

        // then (期待する結果): パニックせず何も起きない
        assert_eq!(directory.count_rooms().await, 0);
    }

    #[tokio::test]
    async fn test_sweep_removes_stale_pending_only_rooms() {
        // テスト項目: 放置された pending のみの部屋がスイープで回収される
        // given (前提条件):
        let directory = InMemoryRoomDirectory::new();
        let stale = directory.get_or_create(&rid("stale")).await;
        let active = directory.get_or_create(&rid("active")).await;
        let now = {
            let mut room = stale.lock().await;
            // ホストを作ってから退室させ、pending だけを残す
            let host = ConnectionId::generate();
            room.request_join(host.clone(), name("Alice"), 1000);
            room.request_join(ConnectionId::generate(), name("Bob"), 1000);
            room.leave(&host);
            assert_eq!(room.member_count(), 0);
            assert_eq!(room.pending_count(), 1);
            1000
        };
        {
            let mut room = active.lock().await;
            room.request_join(ConnectionId::generate(), name("Alice"), now);
        }

        // when (操作): 15 分後にスイープ
        let removed = directory
            .sweep_stale_pending(15 * 60 * 1000, now + 16 * 60 * 1000)
            .await;

        // then (期待する結果): admitted メンバーのいる部屋は残る
        assert_eq!(removed, 1);
        assert!(directory.get(&rid("stale")).await.is_none());
        assert!(directory.get(&rid("active")).await.is_some());
    }

    #[tokio::test]
    async fn test_room_ids_are_sorted() {
        // テスト項目: room_ids が ID 順に並ぶ
        // given (前提条件):
        let directory = InMemoryRoomDirectory::new();
        directory.get_or_create(&rid("charlie")).await;
        directory.get_or_create(&rid("alpha")).await;
        directory.get_or_create(&rid("bravo")).await;

        // when (操作):
        let ids = directory.room_ids().await;

        // then (期待する結果):
        let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "bravo", "charlie"]);
    }
}
