//! RoomDirectory trait 定義
//!
//! プロセス全体の Room レジストリへのインターフェース。Room は部屋ごとに
//! `Arc<Mutex<Room>>` で共有され、同じ部屋への操作は直列化、異なる部屋への
//! 操作は並行に進みます。具体的な実装は Infrastructure 層が提供します
//! （依存性の逆転）。
//!
//! どの操作も失敗しません。`get_or_create` は未知の ID に対して空の部屋を
//! 作り、`remove_if_empty` は条件を満たさなければ何もしない冪等な副作用
//! です。グローバルな可変状態を持たないため、テストでは複数のレジストリ
//! インスタンスを並べられます。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::room::{Room, RoomId};

/// 部屋ごとのロック付き共有ハンドル
pub type SharedRoom = Arc<Mutex<Room>>;

/// Room Directory trait
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// Room を取得。存在しなければ空の部屋（ホストなし・メンバーなし・
    /// 空のストア）を作って返す。
    async fn get_or_create(&self, room_id: &RoomId) -> SharedRoom;

    /// Room を取得。存在しなければ None。
    async fn get(&self, room_id: &RoomId) -> Option<SharedRoom>;

    /// admitted と pending の両方が空なら Room を削除する。冪等。
    ///
    /// pending だけが残っている部屋は、最初の admitted メンバーが来て
    /// ホストになれるよう残す（回収は `sweep_stale_pending`）。
    async fn remove_if_empty(&self, room_id: &RoomId);

    /// admitted メンバー不在のまま放置された部屋を回収する
    ///
    /// 削除した部屋数を返す。admitted メンバーのいる部屋は対象外。
    async fn sweep_stale_pending(&self, max_idle_millis: i64, now_millis: i64) -> usize;

    /// 登録されている全 Room の ID を返す（検査 API 用）
    async fn room_ids(&self) -> Vec<RoomId>;

    /// 登録されている Room の数
    async fn count_rooms(&self) -> usize;
}
