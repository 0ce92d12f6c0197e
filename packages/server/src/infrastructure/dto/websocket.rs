//! WebSocket メッセージの DTO
//!
//! ワイヤ上のメッセージは `type` フィールドで内部タグ付けされた JSON です。
//! イベント名は kebab-case、ペイロードのフィールドは camelCase
//! （ブラウザ側クライアントの流儀に合わせる）。
//!
//! `ClientEvent` が受信の全種別、`ServerEvent` が送信の全種別を表します。
//! 未知の `type` や壊れた JSON はデシリアライズ失敗としてハンドラ側で
//! 警告ログとともに捨てられます（プロトコル違反は黙殺する方針）。

use serde::{Deserialize, Serialize};

/// 共有オブジェクトのワイヤ表現
///
/// 種別（image / avatar / token）はイベント名が運ぶため、レコード自体は
/// kind を持ちません。位置以外のフィールドは省略可能です。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneObjectDto {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flipped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hit_points: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_hit_points: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<String>>,
}

/// 入室済みメンバーのワイヤ表現
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub player_id: String,
    pub player_name: String,
}

/// クライアント → サーバーのメッセージ
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    // --- 入室承認まわり ---
    CheckRoomStatus {
        room_id: String,
    },
    RequestJoin {
        room_id: String,
        player_name: String,
    },
    AdmitPlayer {
        player_id: String,
    },
    DenyPlayer {
        player_id: String,
    },

    // --- 共有オブジェクトのミューテーション ---
    AddImage {
        #[serde(flatten)]
        object: SceneObjectDto,
    },
    AddAvatar {
        #[serde(flatten)]
        object: SceneObjectDto,
    },
    AddHostAvatar {
        src: String,
    },
    TokenAdded {
        #[serde(flatten)]
        object: SceneObjectDto,
    },
    MoveImage {
        id: String,
        x: f64,
        y: f64,
    },
    MoveAvatar {
        id: String,
        x: f64,
        y: f64,
    },
    TokenMoved {
        id: String,
        x: f64,
        y: f64,
    },
    /// ドラッグ中の逐次更新（token-moved と同じ扱いで座標だけ更新）
    TokenMoving {
        id: String,
        x: f64,
        y: f64,
    },
    TokenRemoved {
        id: String,
    },
    AvatarRemoved {
        id: String,
    },

    // --- 属性変更 ---
    TokenLockSet {
        id: String,
        locked: bool,
    },
    TokenFlipSet {
        id: String,
        flipped: bool,
    },
    TokenNameSet {
        id: String,
        name: String,
    },
    TokenConditionSet {
        id: String,
        conditions: Vec<String>,
    },
    TokenSizeSet {
        id: String,
        size: f64,
    },

    // --- ブロードキャストのみ（ストアに触れない） ---
    DiceRoll {
        sides: u32,
        result: u32,
    },
    AvatarAssigned {
        avatar_id: String,
        user_id: String,
    },
    AvatarVoiceToggle {
        avatar_id: String,
        enabled: bool,
    },
    HotkeyAssigned {
        object_id: String,
        slot: u8,
    },
    TacticalModeToggle {
        enabled: bool,
    },
}

/// サーバー → クライアントのメッセージ
///
/// リレーされるイベントには送信者の `player_id` が付与されます。
/// スナップショットのリプレイでは送信者が存在しないため省略されます。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    // --- 入室承認まわり ---
    RoomStatus {
        has_host: bool,
    },
    JoinRequest {
        player_id: String,
        player_name: String,
    },
    Admitted {
        is_host: bool,
        players: Vec<PlayerInfo>,
    },
    Denied,
    YouAreHost,
    HostChanged {
        new_host: String,
    },
    PlayerJoined {
        player_id: String,
        player_name: String,
    },
    PlayerLeft {
        player_id: String,
    },

    // --- リレーされるイベント（イベント名は受信時のまま転送する） ---
    AddImage {
        #[serde(skip_serializing_if = "Option::is_none")]
        player_id: Option<String>,
        #[serde(flatten)]
        object: SceneObjectDto,
    },
    AddAvatar {
        #[serde(skip_serializing_if = "Option::is_none")]
        player_id: Option<String>,
        #[serde(flatten)]
        object: SceneObjectDto,
    },
    AddHostAvatar {
        #[serde(skip_serializing_if = "Option::is_none")]
        player_id: Option<String>,
        src: String,
    },
    TokenAdded {
        #[serde(skip_serializing_if = "Option::is_none")]
        player_id: Option<String>,
        #[serde(flatten)]
        object: SceneObjectDto,
    },
    MoveImage {
        player_id: String,
        id: String,
        x: f64,
        y: f64,
    },
    MoveAvatar {
        player_id: String,
        id: String,
        x: f64,
        y: f64,
    },
    TokenMoved {
        player_id: String,
        id: String,
        x: f64,
        y: f64,
    },
    TokenMoving {
        player_id: String,
        id: String,
        x: f64,
        y: f64,
    },
    TokenRemoved {
        player_id: String,
        id: String,
    },
    AvatarRemoved {
        player_id: String,
        id: String,
    },
    TokenLockSet {
        player_id: String,
        id: String,
        locked: bool,
    },
    TokenFlipSet {
        player_id: String,
        id: String,
        flipped: bool,
    },
    TokenNameSet {
        player_id: String,
        id: String,
        name: String,
    },
    TokenConditionSet {
        player_id: String,
        id: String,
        conditions: Vec<String>,
    },
    TokenSizeSet {
        player_id: String,
        id: String,
        size: f64,
    },
    DiceRoll {
        player_id: String,
        sides: u32,
        result: u32,
    },
    AvatarAssigned {
        player_id: String,
        avatar_id: String,
        user_id: String,
    },
    AvatarVoiceToggle {
        player_id: String,
        avatar_id: String,
        enabled: bool,
    },
    HotkeyAssigned {
        player_id: String,
        object_id: String,
        slot: u8,
    },
    TacticalModeToggle {
        player_id: String,
        enabled: bool,
    },
}
