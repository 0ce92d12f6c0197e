//! Room エンティティと入室承認のステートマシン
//!
//! 接続ごとの状態遷移は unknown → pending → admitted → left の一方向で、
//! admitted から pending に戻ることはありません。ホストは常に admitted
//! メンバーの中の 1 人で、admitted が空でない限り必ず存在します。
//!
//! 各操作は結果を Outcome として返すだけで、通知の送信は行いません。
//! 誰に何を送るかは UseCase 層が Outcome から組み立てます。また、
//! 存在しない接続や権限のない操作はエラーではなく no-op に縮退します
//! （切断間際のクライアントからの遅延メッセージでコーディネータが
//! 落ちてはならないため）。

use serde::{Deserialize, Serialize};

use super::connection::{ConnectionId, PlayerName, ValidationError};
use super::scene::SceneStore;

/// Room ID（クライアント申告の文字列、シャーディングキー）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyRoomId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 入室済みメンバー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: ConnectionId,
    pub name: PlayerName,
    /// 入室時刻（Unix ミリ秒）。members の並び順が入室順なので
    /// ホスト継承の決定には使わないが、検査 API で返す。
    pub joined_at: i64,
}

/// 承認待ちの接続
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingMember {
    id: ConnectionId,
    name: PlayerName,
}

/// `Room::request_join` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// ホスト不在の部屋に参加し、そのままホストになった。
    /// `members` は参加前のメンバーリスト（常に空）。
    AdmittedAsHost { members: Vec<Member> },
    /// ホストの承認待ちになった。`host` に join-request を通知する。
    PendingApproval { host: ConnectionId },
    /// すでに admitted か pending（プロトコル違反、無視）。
    AlreadyKnown,
}

/// `Room::admit` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmitOutcome {
    /// pending から admitted へ昇格した。
    /// `members` は対象を含む入室順の全メンバーリスト。
    Admitted {
        target: ConnectionId,
        target_name: PlayerName,
        members: Vec<Member>,
    },
    /// 権限なし・対象不在などで何も起きなかった。
    Ignored,
}

/// `Room::deny` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyOutcome {
    /// pending から除外した。`target` にのみ denied を通知する。
    Denied { target: ConnectionId },
    Ignored,
}

/// `Room::leave` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// admitted メンバーとして除外された
    pub removed: bool,
    /// pending から静かに除外された
    pub was_pending: bool,
    /// 残りの admitted メンバー（player-left / host-changed の宛先）
    pub remaining: Vec<ConnectionId>,
    /// ホスト継承が発生した場合の新ホスト
    pub new_host: Option<ConnectionId>,
    /// admitted が空になった（呼び出し側が remove_if_empty を呼ぶ）
    pub now_empty: bool,
}

impl LeaveOutcome {
    fn noop() -> Self {
        Self {
            removed: false,
            was_pending: false,
            remaining: Vec::new(),
            new_host: None,
            now_empty: false,
        }
    }
}

/// Room エンティティ
///
/// メンバーシップ（admitted + pending）、ホスト、共有オブジェクトの
/// SceneStore を所有します。`members` は入室順を保持し、ホスト切断時は
/// 先頭（最古参）のメンバーが新ホストになります。
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    host: Option<ConnectionId>,
    members: Vec<Member>,
    pending: Vec<PendingMember>,
    scene: SceneStore,
    created_at: i64,
    last_activity: i64,
}

impl Room {
    pub fn new(id: RoomId, now_millis: i64) -> Self {
        Self {
            id,
            host: None,
            members: Vec::new(),
            pending: Vec::new(),
            scene: SceneStore::new(),
            created_at: now_millis,
            last_activity: now_millis,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn host(&self) -> Option<&ConnectionId> {
        self.host.as_ref()
    }

    pub fn has_host(&self) -> bool {
        self.host.is_some()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member_ids(&self) -> Vec<ConnectionId> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_member(&self, connection_id: &ConnectionId) -> bool {
        self.members.iter().any(|m| &m.id == connection_id)
    }

    pub fn is_pending(&self, connection_id: &ConnectionId) -> bool {
        self.pending.iter().any(|p| &p.id == connection_id)
    }

    /// admitted と pending の両方が空
    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.pending.is_empty()
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn scene(&self) -> &SceneStore {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneStore {
        &mut self.scene
    }

    /// 最終活動時刻を更新（受信メッセージごとに呼ぶ）
    pub fn touch(&mut self, now_millis: i64) {
        self.last_activity = now_millis;
    }

    /// admitted メンバーが 1 人もいないまま放置されている部屋か
    ///
    /// pending のみの部屋は remove_if_empty では消えないため、
    /// 定期スイープがこの判定で回収する。
    pub fn is_stale(&self, now_millis: i64, max_idle_millis: i64) -> bool {
        self.members.is_empty() && now_millis - self.last_activity > max_idle_millis
    }

    /// 入室要求
    ///
    /// ホスト不在なら即時入室してホストになる。ホストがいれば pending に
    /// 積み、ホストへの通知対象を返す。すでにこの部屋に admitted か
    /// pending の接続は no-op。
    pub fn request_join(
        &mut self,
        connection_id: ConnectionId,
        name: PlayerName,
        now_millis: i64,
    ) -> JoinOutcome {
        self.touch(now_millis);

        if self.is_member(&connection_id) || self.is_pending(&connection_id) {
            return JoinOutcome::AlreadyKnown;
        }

        match &self.host {
            None => {
                let members_before = self.members.clone();
                self.members.push(Member {
                    id: connection_id.clone(),
                    name,
                    joined_at: now_millis,
                });
                self.host = Some(connection_id);
                JoinOutcome::AdmittedAsHost {
                    members: members_before,
                }
            }
            Some(host) => {
                let host = host.clone();
                self.pending.push(PendingMember {
                    id: connection_id,
                    name,
                });
                JoinOutcome::PendingApproval { host }
            }
        }
    }

    /// pending の接続を admitted へ昇格
    ///
    /// `host_connection` が現ホストでない、または対象が pending に
    /// いない場合は黙って no-op（部屋の内部状態を非ホストに漏らさない）。
    pub fn admit(
        &mut self,
        host_connection: &ConnectionId,
        target: &ConnectionId,
        now_millis: i64,
    ) -> AdmitOutcome {
        if self.host.as_ref() != Some(host_connection) {
            return AdmitOutcome::Ignored;
        }
        let Some(pos) = self.pending.iter().position(|p| &p.id == target) else {
            return AdmitOutcome::Ignored;
        };

        self.touch(now_millis);
        let pending = self.pending.remove(pos);
        self.members.push(Member {
            id: pending.id.clone(),
            name: pending.name.clone(),
            joined_at: now_millis,
        });
        AdmitOutcome::Admitted {
            target: pending.id,
            target_name: pending.name,
            members: self.members.clone(),
        }
    }

    /// pending の接続を拒否
    ///
    /// 認可ルールは `admit` と同じ。対象が pending にいなければ no-op
    /// （冪等：二重 deny は何もしない）。
    pub fn deny(&mut self, host_connection: &ConnectionId, target: &ConnectionId) -> DenyOutcome {
        if self.host.as_ref() != Some(host_connection) {
            return DenyOutcome::Ignored;
        }
        let Some(pos) = self.pending.iter().position(|p| &p.id == target) else {
            return DenyOutcome::Ignored;
        };

        let pending = self.pending.remove(pos);
        DenyOutcome::Denied { target: pending.id }
    }

    /// 切断による退室
    ///
    /// pending にいれば静かに除外。admitted にいれば除外し、残りの
    /// メンバーへの通知対象と、ホスト継承が起きた場合の新ホスト
    /// （入室順で最古参のメンバー）を返す。
    pub fn leave(&mut self, connection_id: &ConnectionId) -> LeaveOutcome {
        if let Some(pos) = self.pending.iter().position(|p| &p.id == connection_id) {
            self.pending.remove(pos);
            return LeaveOutcome {
                was_pending: true,
                ..LeaveOutcome::noop()
            };
        }

        let Some(pos) = self.members.iter().position(|m| &m.id == connection_id) else {
            return LeaveOutcome::noop();
        };

        self.members.remove(pos);
        let remaining = self.member_ids();

        let mut new_host = None;
        if self.host.as_ref() == Some(connection_id) {
            // 入室順で最古参のメンバーが新ホスト
            self.host = self.members.first().map(|m| m.id.clone());
            new_host = self.host.clone();
        }

        LeaveOutcome {
            removed: true,
            was_pending: false,
            remaining,
            new_host,
            now_empty: self.members.is_empty(),
        }
    }
}
