//! 共有オブジェクトの SceneStore
//!
//! 部屋ごとの「最後に観測した状態」の複製です。キャンバス画像・
//! アバター・トークンをオブジェクト ID で引けるように保持し、
//! あとから入室した接続への全量リプレイ（snapshot）に使います。
//! すべてのミューテーションは last-write-wins で、バージョン管理や
//! 競合検出はありません。
//!
//! 存在しないオブジェクトへの位置更新・属性更新は黙って捨てます。
//! 生のメッセージ自体は他のメンバーにブロードキャストされるため、
//! サーバーの複製とピアの状態が一時的にずれることは許容されます。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::connection::ValidationError;

/// オブジェクト ID（クライアント申告の文字列）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyObjectId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// オブジェクトの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectKind {
    Image,
    Avatar,
    HostAvatar,
    Token,
}

/// 共有オブジェクトのレコード
///
/// 種別ごとに使うフィールドが異なるため、位置以外は Option。
/// トークンだけがヒットポイントと状態異常を持つ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    /// 表示リソースへの参照（エンコード済み。中身は検査しない）
    pub src: Option<String>,
    pub x: f64,
    pub y: f64,
    pub name: Option<String>,
    pub flipped: Option<bool>,
    pub locked: Option<bool>,
    pub size: Option<f64>,
    pub hit_points: Option<i32>,
    pub max_hit_points: Option<i32>,
    pub conditions: Option<Vec<String>>,
}

impl SceneObject {
    /// 位置だけを持つ最小のレコードを作成（テスト・リプレイ用）
    pub fn at(id: ObjectId, kind: ObjectKind, x: f64, y: f64) -> Self {
        Self {
            id,
            kind,
            src: None,
            x,
            y,
            name: None,
            flipped: None,
            locked: None,
            size: None,
            hit_points: None,
            max_hit_points: None,
            conditions: None,
        }
    }
}

/// 属性更新のパッチ（Some のフィールドだけ上書き）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributePatch {
    pub locked: Option<bool>,
    pub flipped: Option<bool>,
    pub name: Option<String>,
    pub conditions: Option<Vec<String>>,
    pub size: Option<f64>,
}

/// ブロードキャストの宛先ポリシー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientPolicy {
    /// 送信者以外の全メンバー（位置・見た目の更新の既定値）
    Others,
    /// 送信者を含む全メンバー（ダイスロールなど、全員が同じ結果を
    /// 描画する必要があるもの）
    All,
}

/// メッセージ種別から導出されるストアへのミューテーション
#[derive(Debug, Clone, PartialEq)]
pub enum SceneUpdate {
    /// レコード全体の挿入または置換
    Put(SceneObject),
    /// ホストアバター（部屋ごとに高々 1 つのシングルトン）
    SetHostAvatar { src: String },
    /// 位置フィールドのみの更新
    PatchPosition { id: ObjectId, x: f64, y: f64 },
    /// 表示属性の更新
    PatchAttributes { id: ObjectId, patch: AttributePatch },
    Remove { id: ObjectId },
    /// ストアには触れない（ブロードキャストのみ）
    None,
}

/// 部屋ごとの共有オブジェクトストア
#[derive(Debug, Default)]
pub struct SceneStore {
    objects: HashMap<ObjectId, SceneObject>,
    host_avatar: Option<String>,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// レコード全体を挿入または置換
    pub fn put(&mut self, object: SceneObject) {
        self.objects.insert(object.id.clone(), object);
    }

    /// 位置フィールドのみ更新。オブジェクトが存在しなければ no-op。
    pub fn patch_position(&mut self, id: &ObjectId, x: f64, y: f64) -> bool {
        match self.objects.get_mut(id) {
            Some(object) => {
                object.x = x;
                object.y = y;
                true
            }
            None => false,
        }
    }

    /// 表示属性を更新。オブジェクトが存在しなければ no-op。
    pub fn patch_attributes(&mut self, id: &ObjectId, patch: AttributePatch) -> bool {
        let Some(object) = self.objects.get_mut(id) else {
            return false;
        };
        if let Some(locked) = patch.locked {
            object.locked = Some(locked);
        }
        if let Some(flipped) = patch.flipped {
            object.flipped = Some(flipped);
        }
        if let Some(name) = patch.name {
            object.name = Some(name);
        }
        if let Some(conditions) = patch.conditions {
            object.conditions = Some(conditions);
        }
        if let Some(size) = patch.size {
            object.size = Some(size);
        }
        true
    }

    pub fn remove(&mut self, id: &ObjectId) -> bool {
        self.objects.remove(id).is_some()
    }

    pub fn get(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn set_host_avatar(&mut self, src: String) {
        self.host_avatar = Some(src);
    }

    pub fn host_avatar(&self) -> Option<&str> {
        self.host_avatar.as_deref()
    }

    /// 全オブジェクトのスナップショットを返す
    ///
    /// 新規入室者へのリプレイに使う。ID でソートして順序を安定させる。
    pub fn snapshot(&self) -> Vec<SceneObject> {
        let mut objects: Vec<SceneObject> = self.objects.values().cloned().collect();
        objects.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        objects
    }

    /// ミューテーションを適用する。対象不在の更新は黙って捨てる。
    pub fn apply(&mut self, update: SceneUpdate) {
        match update {
            SceneUpdate::Put(object) => self.put(object),
            SceneUpdate::SetHostAvatar { src } => self.set_host_avatar(src),
            SceneUpdate::PatchPosition { id, x, y } => {
                self.patch_position(&id, x, y);
            }
            SceneUpdate::PatchAttributes { id, patch } => {
                self.patch_attributes(&id, patch);
            }
            SceneUpdate::Remove { id } => {
                self.remove(&id);
            }
            SceneUpdate::None => {}
        }
    }
}
