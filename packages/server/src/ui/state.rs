//! Server state and connection management.

use std::sync::Arc;

use crate::domain::MessagePusher;
use crate::infrastructure::oauth::DiscordTokenClient;
use crate::usecase::{
    AdmitPlayerUseCase, CheckRoomStatusUseCase, DenyPlayerUseCase, GetRoomDetailUseCase,
    GetRoomsUseCase, LeaveRoomUseCase, RelayEventUseCase, RequestJoinUseCase,
};

/// Shared application state
pub struct AppState {
    /// CheckRoomStatusUseCase（部屋の状態確認のユースケース）
    pub check_room_status_usecase: Arc<CheckRoomStatusUseCase>,
    /// RequestJoinUseCase（入室要求のユースケース）
    pub request_join_usecase: Arc<RequestJoinUseCase>,
    /// AdmitPlayerUseCase（入室承認のユースケース）
    pub admit_player_usecase: Arc<AdmitPlayerUseCase>,
    /// DenyPlayerUseCase（入室拒否のユースケース）
    pub deny_player_usecase: Arc<DenyPlayerUseCase>,
    /// LeaveRoomUseCase（切断による退室のユースケース）
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// RelayEventUseCase（状態更新イベントのリレーのユースケース）
    pub relay_event_usecase: Arc<RelayEventUseCase>,
    /// GetRoomsUseCase（部屋一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（部屋詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// MessagePusher（接続レジストリ。ハンドラが接続の登録・解除に使う）
    pub message_pusher: Arc<dyn MessagePusher>,
    /// Discord OAuth のコード交換クライアント
    pub token_client: Arc<DiscordTokenClient>,
}
