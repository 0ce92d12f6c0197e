//! UseCase: 承認待ちの接続の入室承認
//!
//! ホストだけが実行できる。成功時は対象への admitted 応答に加えて、
//! 共有オブジェクトの全量リプレイ（スナップショット）と、部屋全体への
//! player-joined 通知が続く。権限のない呼び出しと対象不在は黙って
//! no-op（部屋の内部状態を非ホストに漏らさない）。

use std::sync::Arc;

use irori_shared::time::get_unix_timestamp;

use crate::domain::{AdmitOutcome, ConnectionId, MessagePusher, RoomDirectory, RoomId, SceneObject};

/// admit 実行の結果
///
/// Outcome に加え、承認された接続へリプレイするスナップショットを
/// 同じ部屋ロックの中で採って返す（承認とリプレイの間に割り込んだ
/// 更新で二重配信にならないように）。
#[derive(Debug)]
pub struct AdmitResult {
    pub outcome: AdmitOutcome,
    /// 承認時点の全共有オブジェクト（承認成功時のみ非空になり得る）
    pub snapshot: Vec<SceneObject>,
    /// ホストアバターのシングルトンスロット
    pub host_avatar: Option<String>,
}

/// 入室承認のユースケース
pub struct AdmitPlayerUseCase {
    /// RoomDirectory（部屋レジストリの抽象化）
    directory: Arc<dyn RoomDirectory>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl AdmitPlayerUseCase {
    /// 新しい AdmitPlayerUseCase を作成
    pub fn new(directory: Arc<dyn RoomDirectory>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            directory,
            message_pusher,
        }
    }

    /// 入室承認を実行
    ///
    /// 部屋が存在しない場合も no-op（切断間際のホストからの遅延
    /// メッセージで落ちない）。
    pub async fn execute(
        &self,
        room_id: &RoomId,
        host: &ConnectionId,
        target: &ConnectionId,
    ) -> AdmitResult {
        let Some(shared) = self.directory.get(room_id).await else {
            return AdmitResult {
                outcome: AdmitOutcome::Ignored,
                snapshot: Vec::new(),
                host_avatar: None,
            };
        };

        let mut room = shared.lock().await;
        let outcome = room.admit(host, target, get_unix_timestamp());
        match outcome {
            AdmitOutcome::Admitted { .. } => AdmitResult {
                snapshot: room.scene().snapshot(),
                host_avatar: room.scene().host_avatar().map(str::to_string),
                outcome,
            },
            AdmitOutcome::Ignored => AdmitResult {
                outcome,
                snapshot: Vec::new(),
                host_avatar: None,
            },
        }
    }

    /// 承認された接続へ admitted 応答を送る
    pub async fn reply_admitted(&self, target: &ConnectionId, json: &str) {
        if let Err(e) = self.message_pusher.push_to(target, json).await {
            tracing::warn!("Failed to reply admitted to '{}': {}", target, e);
        }
    }

    /// 承認された接続へスナップショットをフレーム列でリプレイする
    pub async fn replay_snapshot(&self, target: &ConnectionId, frames: Vec<String>) {
        for frame in frames {
            if let Err(e) = self.message_pusher.push_to(target, &frame).await {
                tracing::warn!("Failed to replay snapshot frame to '{}': {}", target, e);
            }
        }
    }

    /// 部屋の全メンバー（ホスト・新規入室者を含む）へ player-joined を配る
    pub async fn broadcast_player_joined(&self, targets: Vec<ConnectionId>, json: &str) {
        if let Err(e) = self.message_pusher.broadcast(targets, json).await {
            tracing::warn!("Failed to broadcast player-joined: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MockMessagePusher, ObjectId, ObjectKind, PlayerName},
        infrastructure::directory::InMemoryRoomDirectory,
    };

    fn rid(s: &str) -> RoomId {
        RoomId::new(s.to_string()).unwrap()
    }

    fn name(s: &str) -> PlayerName {
        PlayerName::new(s.to_string()).unwrap()
    }

    async fn directory_with_host_and_pending(
        directory: &InMemoryRoomDirectory,
    ) -> (ConnectionId, ConnectionId) {
        let alice = ConnectionId::generate();
        let bob = ConnectionId::generate();
        let shared = directory.get_or_create(&rid("r1")).await;
        let mut room = shared.lock().await;
        room.request_join(alice.clone(), name("Alice"), 1000);
        room.request_join(bob.clone(), name("Bob"), 2000);
        (alice, bob)
    }

    #[tokio::test]
    async fn test_admit_returns_members_and_snapshot() {
        // テスト項目: 承認成功時に全メンバーリストとスナップショットが返される
        // given (前提条件):
        let directory = Arc::new(InMemoryRoomDirectory::new());
        let (alice, bob) = directory_with_host_and_pending(&directory).await;
        {
            let shared = directory.get(&rid("r1")).await.unwrap();
            let mut room = shared.lock().await;
            room.scene_mut().put(SceneObject::at(
                ObjectId::new("img1".to_string()).unwrap(),
                ObjectKind::Image,
                99.0,
                5.0,
            ));
            room.scene_mut().set_host_avatar("gm.png".to_string());
        }
        let usecase =
            AdmitPlayerUseCase::new(directory.clone(), Arc::new(MockMessagePusher::new()));

        // when (操作):
        let result = usecase.execute(&rid("r1"), &alice, &bob).await;

        // then (期待する結果):
        match result.outcome {
            AdmitOutcome::Admitted { target, members, .. } => {
                assert_eq!(target, bob);
                assert_eq!(members.len(), 2);
            }
            other => panic!("expected Admitted, got {:?}", other),
        }
        assert_eq!(result.snapshot.len(), 1);
        assert_eq!(result.snapshot[0].x, 99.0);
        assert_eq!(result.host_avatar.as_deref(), Some("gm.png"));
    }

    #[tokio::test]
    async fn test_admit_by_non_host_is_ignored() {
        // テスト項目: 非ホストによる承認が no-op になりスナップショットも返さない
        // given (前提条件):
        let directory = Arc::new(InMemoryRoomDirectory::new());
        let (_alice, bob) = directory_with_host_and_pending(&directory).await;
        let usecase =
            AdmitPlayerUseCase::new(directory.clone(), Arc::new(MockMessagePusher::new()));

        // when (操作):
        let result = usecase
            .execute(&rid("r1"), &ConnectionId::generate(), &bob)
            .await;

        // then (期待する結果):
        assert!(matches!(result.outcome, AdmitOutcome::Ignored));
        assert!(result.snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_admit_in_unknown_room_is_ignored() {
        // テスト項目: 存在しない部屋での承認が no-op になる
        // given (前提条件):
        let usecase = AdmitPlayerUseCase::new(
            Arc::new(InMemoryRoomDirectory::new()),
            Arc::new(MockMessagePusher::new()),
        );

        // when (操作):
        let result = usecase
            .execute(
                &rid("nonexistent"),
                &ConnectionId::generate(),
                &ConnectionId::generate(),
            )
            .await;

        // then (期待する結果):
        assert!(matches!(result.outcome, AdmitOutcome::Ignored));
    }

    #[tokio::test]
    async fn test_replay_snapshot_pushes_each_frame() {
        // テスト項目: スナップショットの各フレームが対象にだけ順に送られる
        // given (前提条件):
        let target = ConnectionId::generate();
        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_push_to()
            .withf({
                let target = target.clone();
                move |id, _| id == &target
            })
            .times(2)
            .returning(|_, _| Ok(()));
        let usecase =
            AdmitPlayerUseCase::new(Arc::new(InMemoryRoomDirectory::new()), Arc::new(pusher));

        // when (操作) / then (期待する結果): モックの期待で検証
        usecase
            .replay_snapshot(
                &target,
                vec![
                    r#"{"type":"add-image","id":"a"}"#.to_string(),
                    r#"{"type":"token-added","id":"b"}"#.to_string(),
                ],
            )
            .await;
    }

    #[tokio::test]
    async fn test_broadcast_player_joined_targets_all_members() {
        // テスト項目: player-joined がメンバー全員（ホスト含む）へ配られる
        // given (前提条件):
        let alice = ConnectionId::generate();
        let bob = ConnectionId::generate();
        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_broadcast()
            .withf(move |targets, json| targets.len() == 2 && json.contains("player-joined"))
            .times(1)
            .returning(|_, _| Ok(()));
        let usecase =
            AdmitPlayerUseCase::new(Arc::new(InMemoryRoomDirectory::new()), Arc::new(pusher));

        // when (操作) / then (期待する結果): モックの期待で検証
        usecase
            .broadcast_player_joined(vec![alice, bob], r#"{"type":"player-joined"}"#)
            .await;
    }
}
