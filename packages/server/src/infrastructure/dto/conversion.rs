//! DTO と Domain Model の変換
//!
//! リレー対象のメッセージ種別ごとに「ストアへのミューテーション」
//! 「宛先ポリシー」「転送するサーバーイベント」を 1 つの RelayPlan に
//! まとめます。どのイベントがどう振る舞うかの対応表はこのモジュールに
//! だけ存在し、UseCase 層はプランを機械的に適用します。

use crate::domain::{
    AttributePatch, ConnectionId, Member, ObjectId, ObjectKind, RecipientPolicy, SceneObject,
    SceneUpdate, ValidationError,
};

use super::websocket::{ClientEvent, PlayerInfo, SceneObjectDto, ServerEvent};

/// リレー 1 件分の実行計画
#[derive(Debug, Clone, PartialEq)]
pub struct RelayPlan {
    /// SceneStore へのミューテーション
    pub update: SceneUpdate,
    /// ブロードキャストの宛先ポリシー
    pub policy: RecipientPolicy,
    /// 転送するイベント（送信者 ID 付与済み）
    pub outbound: ServerEvent,
}

/// ワイヤ表現から Domain Model のレコードへ変換
///
/// 種別はイベント名が運ぶため引数で受け取る。
pub fn scene_object_from_dto(
    dto: SceneObjectDto,
    kind: ObjectKind,
) -> Result<SceneObject, ValidationError> {
    Ok(SceneObject {
        id: ObjectId::new(dto.id)?,
        kind,
        src: dto.src,
        x: dto.x,
        y: dto.y,
        name: dto.name,
        flipped: dto.flipped,
        locked: dto.locked,
        size: dto.size,
        hit_points: dto.hit_points,
        max_hit_points: dto.max_hit_points,
        conditions: dto.conditions,
    })
}

/// Domain Model のレコードからワイヤ表現へ変換
pub fn scene_object_to_dto(object: &SceneObject) -> SceneObjectDto {
    SceneObjectDto {
        id: object.id.as_str().to_string(),
        src: object.src.clone(),
        x: object.x,
        y: object.y,
        name: object.name.clone(),
        flipped: object.flipped,
        locked: object.locked,
        size: object.size,
        hit_points: object.hit_points,
        max_hit_points: object.max_hit_points,
        conditions: object.conditions.clone(),
    }
}

/// メンバーからワイヤ表現へ変換
pub fn member_to_player_info(member: &Member) -> PlayerInfo {
    PlayerInfo {
        player_id: member.id.as_str().to_string(),
        player_name: member.name.as_str().to_string(),
    }
}

/// 受信イベントからリレーの実行計画を導出する
///
/// 入室承認まわりのイベント（check-room-status / request-join /
/// admit-player / deny-player）はリレー対象ではないため `None` を返す。
/// オブジェクト ID が空など検証に失敗したメッセージは Err（呼び出し側で
/// プロトコル違反として捨てる）。
pub fn relay_plan(
    event: ClientEvent,
    sender: &ConnectionId,
) -> Result<Option<RelayPlan>, ValidationError> {
    let sender_id = sender.as_str().to_string();

    let plan = match event {
        ClientEvent::CheckRoomStatus { .. }
        | ClientEvent::RequestJoin { .. }
        | ClientEvent::AdmitPlayer { .. }
        | ClientEvent::DenyPlayer { .. } => return Ok(None),

        ClientEvent::AddImage { object } => {
            let record = scene_object_from_dto(object.clone(), ObjectKind::Image)?;
            RelayPlan {
                update: SceneUpdate::Put(record),
                policy: RecipientPolicy::Others,
                outbound: ServerEvent::AddImage {
                    player_id: Some(sender_id),
                    object,
                },
            }
        }
        ClientEvent::AddAvatar { object } => {
            let record = scene_object_from_dto(object.clone(), ObjectKind::Avatar)?;
            RelayPlan {
                update: SceneUpdate::Put(record),
                policy: RecipientPolicy::Others,
                outbound: ServerEvent::AddAvatar {
                    player_id: Some(sender_id),
                    object,
                },
            }
        }
        ClientEvent::AddHostAvatar { src } => RelayPlan {
            update: SceneUpdate::SetHostAvatar { src: src.clone() },
            policy: RecipientPolicy::Others,
            outbound: ServerEvent::AddHostAvatar {
                player_id: Some(sender_id),
                src,
            },
        },
        ClientEvent::TokenAdded { object } => {
            let record = scene_object_from_dto(object.clone(), ObjectKind::Token)?;
            RelayPlan {
                update: SceneUpdate::Put(record),
                policy: RecipientPolicy::Others,
                outbound: ServerEvent::TokenAdded {
                    player_id: Some(sender_id),
                    object,
                },
            }
        }

        ClientEvent::MoveImage { id, x, y } => RelayPlan {
            update: SceneUpdate::PatchPosition {
                id: ObjectId::new(id.clone())?,
                x,
                y,
            },
            policy: RecipientPolicy::Others,
            outbound: ServerEvent::MoveImage {
                player_id: sender_id,
                id,
                x,
                y,
            },
        },
        ClientEvent::MoveAvatar { id, x, y } => RelayPlan {
            update: SceneUpdate::PatchPosition {
                id: ObjectId::new(id.clone())?,
                x,
                y,
            },
            policy: RecipientPolicy::Others,
            outbound: ServerEvent::MoveAvatar {
                player_id: sender_id,
                id,
                x,
                y,
            },
        },
        ClientEvent::TokenMoved { id, x, y } => RelayPlan {
            update: SceneUpdate::PatchPosition {
                id: ObjectId::new(id.clone())?,
                x,
                y,
            },
            policy: RecipientPolicy::Others,
            outbound: ServerEvent::TokenMoved {
                player_id: sender_id,
                id,
                x,
                y,
            },
        },
        ClientEvent::TokenMoving { id, x, y } => RelayPlan {
            update: SceneUpdate::PatchPosition {
                id: ObjectId::new(id.clone())?,
                x,
                y,
            },
            policy: RecipientPolicy::Others,
            outbound: ServerEvent::TokenMoving {
                player_id: sender_id,
                id,
                x,
                y,
            },
        },

        ClientEvent::TokenRemoved { id } => RelayPlan {
            update: SceneUpdate::Remove {
                id: ObjectId::new(id.clone())?,
            },
            policy: RecipientPolicy::Others,
            outbound: ServerEvent::TokenRemoved {
                player_id: sender_id,
                id,
            },
        },
        ClientEvent::AvatarRemoved { id } => RelayPlan {
            update: SceneUpdate::Remove {
                id: ObjectId::new(id.clone())?,
            },
            policy: RecipientPolicy::Others,
            outbound: ServerEvent::AvatarRemoved {
                player_id: sender_id,
                id,
            },
        },

        ClientEvent::TokenLockSet { id, locked } => RelayPlan {
            update: SceneUpdate::PatchAttributes {
                id: ObjectId::new(id.clone())?,
                patch: AttributePatch {
                    locked: Some(locked),
                    ..AttributePatch::default()
                },
            },
            policy: RecipientPolicy::Others,
            outbound: ServerEvent::TokenLockSet {
                player_id: sender_id,
                id,
                locked,
            },
        },
        ClientEvent::TokenFlipSet { id, flipped } => RelayPlan {
            update: SceneUpdate::PatchAttributes {
                id: ObjectId::new(id.clone())?,
                patch: AttributePatch {
                    flipped: Some(flipped),
                    ..AttributePatch::default()
                },
            },
            policy: RecipientPolicy::Others,
            outbound: ServerEvent::TokenFlipSet {
                player_id: sender_id,
                id,
                flipped,
            },
        },
        ClientEvent::TokenNameSet { id, name } => RelayPlan {
            update: SceneUpdate::PatchAttributes {
                id: ObjectId::new(id.clone())?,
                patch: AttributePatch {
                    name: Some(name.clone()),
                    ..AttributePatch::default()
                },
            },
            policy: RecipientPolicy::Others,
            outbound: ServerEvent::TokenNameSet {
                player_id: sender_id,
                id,
                name,
            },
        },
        ClientEvent::TokenConditionSet { id, conditions } => RelayPlan {
            update: SceneUpdate::PatchAttributes {
                id: ObjectId::new(id.clone())?,
                patch: AttributePatch {
                    conditions: Some(conditions.clone()),
                    ..AttributePatch::default()
                },
            },
            policy: RecipientPolicy::Others,
            outbound: ServerEvent::TokenConditionSet {
                player_id: sender_id,
                id,
                conditions,
            },
        },
        ClientEvent::TokenSizeSet { id, size } => RelayPlan {
            update: SceneUpdate::PatchAttributes {
                id: ObjectId::new(id.clone())?,
                patch: AttributePatch {
                    size: Some(size),
                    ..AttributePatch::default()
                },
            },
            policy: RecipientPolicy::Others,
            outbound: ServerEvent::TokenSizeSet {
                player_id: sender_id,
                id,
                size,
            },
        },

        // ダイスロールだけは送信者を含めて全員に配る：全クライアントが
        // 同一の出目を描画する必要がある
        ClientEvent::DiceRoll { sides, result } => RelayPlan {
            update: SceneUpdate::None,
            policy: RecipientPolicy::All,
            outbound: ServerEvent::DiceRoll {
                player_id: sender_id,
                sides,
                result,
            },
        },
        ClientEvent::AvatarAssigned { avatar_id, user_id } => RelayPlan {
            update: SceneUpdate::None,
            policy: RecipientPolicy::Others,
            outbound: ServerEvent::AvatarAssigned {
                player_id: sender_id,
                avatar_id,
                user_id,
            },
        },
        ClientEvent::AvatarVoiceToggle { avatar_id, enabled } => RelayPlan {
            update: SceneUpdate::None,
            policy: RecipientPolicy::Others,
            outbound: ServerEvent::AvatarVoiceToggle {
                player_id: sender_id,
                avatar_id,
                enabled,
            },
        },
        ClientEvent::HotkeyAssigned { object_id, slot } => RelayPlan {
            update: SceneUpdate::None,
            policy: RecipientPolicy::Others,
            outbound: ServerEvent::HotkeyAssigned {
                player_id: sender_id,
                object_id,
                slot,
            },
        },
        ClientEvent::TacticalModeToggle { enabled } => RelayPlan {
            update: SceneUpdate::None,
            policy: RecipientPolicy::Others,
            outbound: ServerEvent::TacticalModeToggle {
                player_id: sender_id,
                enabled,
            },
        },
    };

    Ok(Some(plan))
}

/// スナップショットをリプレイ用のフレーム列へ変換
///
/// 新規入室者に送る全量の状態。オブジェクトは ID 順、ホストアバターは
/// 末尾に付く。フレームに送信者 ID は付かない。
pub fn snapshot_frames(
    objects: Vec<SceneObject>,
    host_avatar: Option<String>,
) -> Vec<ServerEvent> {
    let mut frames: Vec<ServerEvent> = objects
        .iter()
        .map(|object| {
            let dto = scene_object_to_dto(object);
            match object.kind {
                ObjectKind::Image => ServerEvent::AddImage {
                    player_id: None,
                    object: dto,
                },
                ObjectKind::Avatar => ServerEvent::AddAvatar {
                    player_id: None,
                    object: dto,
                },
                ObjectKind::Token => ServerEvent::TokenAdded {
                    player_id: None,
                    object: dto,
                },
                ObjectKind::HostAvatar => ServerEvent::AddHostAvatar {
                    player_id: None,
                    src: object.src.clone().unwrap_or_default(),
                },
            }
        })
        .collect();

    if let Some(src) = host_avatar {
        frames.push(ServerEvent::AddHostAvatar {
            player_id: None,
            src,
        });
    }

    frames
}
