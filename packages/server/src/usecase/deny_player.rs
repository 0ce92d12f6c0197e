//! UseCase: 承認待ちの接続の入室拒否
//!
//! 認可ルールは承認と同じ（現ホストのみ）。拒否は対象にだけ通知され、
//! 部屋の他のメンバーは何も観測しない。

use std::sync::Arc;

use crate::domain::{ConnectionId, DenyOutcome, MessagePusher, RoomDirectory, RoomId};

/// 入室拒否のユースケース
pub struct DenyPlayerUseCase {
    /// RoomDirectory（部屋レジストリの抽象化）
    directory: Arc<dyn RoomDirectory>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl DenyPlayerUseCase {
    /// 新しい DenyPlayerUseCase を作成
    pub fn new(directory: Arc<dyn RoomDirectory>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            directory,
            message_pusher,
        }
    }

    /// 入室拒否を実行
    ///
    /// 部屋不在・非ホスト・対象不在はすべて no-op。二重 deny も冪等に
    /// no-op になる。
    pub async fn execute(
        &self,
        room_id: &RoomId,
        host: &ConnectionId,
        target: &ConnectionId,
    ) -> DenyOutcome {
        let Some(shared) = self.directory.get(room_id).await else {
            return DenyOutcome::Ignored;
        };
        let mut room = shared.lock().await;
        room.deny(host, target)
    }

    /// 拒否された接続へ denied 通知を送る
    pub async fn notify_denied(&self, target: &ConnectionId, json: &str) {
        if let Err(e) = self.message_pusher.push_to(target, json).await {
            tracing::warn!("Failed to notify denied to '{}': {}", target, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MockMessagePusher, PlayerName},
        infrastructure::directory::InMemoryRoomDirectory,
    };

    fn rid(s: &str) -> RoomId {
        RoomId::new(s.to_string()).unwrap()
    }

    fn name(s: &str) -> PlayerName {
        PlayerName::new(s.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_deny_removes_pending_and_names_target() {
        // テスト項目: 拒否が pending を除外し、通知対象として返す
        // given (前提条件):
        let directory = Arc::new(InMemoryRoomDirectory::new());
        let alice = ConnectionId::generate();
        let bob = ConnectionId::generate();
        {
            let shared = directory.get_or_create(&rid("r1")).await;
            let mut room = shared.lock().await;
            room.request_join(alice.clone(), name("Alice"), 1000);
            room.request_join(bob.clone(), name("Bob"), 2000);
        }
        let usecase = DenyPlayerUseCase::new(directory.clone(), Arc::new(MockMessagePusher::new()));

        // when (操作):
        let outcome = usecase.execute(&rid("r1"), &alice, &bob).await;

        // then (期待する結果): admitted は変わらず pending だけ減る
        assert_eq!(
            outcome,
            DenyOutcome::Denied {
                target: bob.clone()
            }
        );
        let shared = directory.get(&rid("r1")).await.unwrap();
        let room = shared.lock().await;
        assert_eq!(room.pending_count(), 0);
        assert_eq!(room.member_count(), 1);
    }

    #[tokio::test]
    async fn test_repeated_deny_is_noop() {
        // テスト項目: すでに除外済みの対象への deny が冪等に no-op になる
        // given (前提条件):
        let directory = Arc::new(InMemoryRoomDirectory::new());
        let alice = ConnectionId::generate();
        let bob = ConnectionId::generate();
        {
            let shared = directory.get_or_create(&rid("r1")).await;
            let mut room = shared.lock().await;
            room.request_join(alice.clone(), name("Alice"), 1000);
            room.request_join(bob.clone(), name("Bob"), 2000);
        }
        let usecase = DenyPlayerUseCase::new(directory.clone(), Arc::new(MockMessagePusher::new()));
        usecase.execute(&rid("r1"), &alice, &bob).await;

        // when (操作):
        let outcome = usecase.execute(&rid("r1"), &alice, &bob).await;

        // then (期待する結果):
        assert_eq!(outcome, DenyOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_deny_in_unknown_room_is_noop() {
        // テスト項目: 存在しない部屋での deny が no-op になる
        // given (前提条件):
        let usecase = DenyPlayerUseCase::new(
            Arc::new(InMemoryRoomDirectory::new()),
            Arc::new(MockMessagePusher::new()),
        );

        // when (操作):
        let outcome = usecase
            .execute(
                &rid("nonexistent"),
                &ConnectionId::generate(),
                &ConnectionId::generate(),
            )
            .await;

        // then (期待する結果):
        assert_eq!(outcome, DenyOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_notify_denied_pushes_single_target() {
        // テスト項目: denied 通知が対象の 1 接続にだけ送られる
        // given (前提条件):
        let target = ConnectionId::generate();
        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_push_to()
            .withf({
                let target = target.clone();
                move |id, json| id == &target && json.contains("denied")
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let usecase =
            DenyPlayerUseCase::new(Arc::new(InMemoryRoomDirectory::new()), Arc::new(pusher));

        // when (操作) / then (期待する結果): モックの期待で検証
        usecase.notify_denied(&target, r#"{"type":"denied"}"#).await;
    }
}
