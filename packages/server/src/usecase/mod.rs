//! UseCase 層
//!
//! コーディネータの操作 1 つにつき 1 つの UseCase を定義します。
//! `execute` がドメインの状態遷移を行って Outcome を返し、通知系の
//! ヘルパーがシリアライズ済みのフレームを宛先へ送ります。フレームの
//! 組み立て（DTO への変換とシリアライズ）は UI 層の責務です。

mod admit_player;
mod check_room_status;
mod deny_player;
mod get_room_detail;
mod get_rooms;
mod leave_room;
mod relay_event;
mod request_join;

pub use admit_player::{AdmitPlayerUseCase, AdmitResult};
pub use check_room_status::CheckRoomStatusUseCase;
pub use deny_player::DenyPlayerUseCase;
pub use get_room_detail::{GetRoomDetailError, GetRoomDetailUseCase, RoomDetail};
pub use get_rooms::{GetRoomsUseCase, RoomSummary};
pub use leave_room::LeaveRoomUseCase;
pub use relay_event::RelayEventUseCase;
pub use request_join::RequestJoinUseCase;
