//! ドメイン層
//!
//! セッションリレーの中核となる Domain Model を定義します。
//! この層は他の層に依存しません（依存性の逆転）。

mod connection;
mod directory;
mod pusher;
mod room;
mod scene;

pub use connection::{ConnectionId, PlayerName, ValidationError};
pub use directory::{RoomDirectory, SharedRoom};
#[cfg(test)]
pub use pusher::MockMessagePusher;
pub use pusher::{MessagePushError, MessagePusher, PusherChannel};
pub use room::{AdmitOutcome, DenyOutcome, JoinOutcome, LeaveOutcome, Member, Room, RoomId};
pub use scene::{
    AttributePatch, ObjectId, ObjectKind, RecipientPolicy, SceneObject, SceneStore, SceneUpdate,
};
