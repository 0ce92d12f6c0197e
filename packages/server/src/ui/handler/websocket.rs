//! WebSocket connection handlers.
//!
//! 物理接続 1 本につき受信ループと送信ループを 1 つずつ張ります。
//! 受信したテキストフレームはここで型付きイベントに解釈され、
//! 入室承認まわりは各 UseCase へ、それ以外はリレーへ振り分けられます。
//!
//! 壊れた JSON・未知のイベント・部屋に入る前のリレーはすべて
//! プロトコル違反として警告ログだけ残して捨てます。どちらのループが
//! 先に終わっても、切断処理（レジストリからの解除と退室）は必ず
//! 実行されるため、受信処理が途中で落ちても部屋に幽霊メンバーは
//! 残りません。

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::{Mutex, mpsc};

use crate::{
    domain::{AdmitOutcome, ConnectionId, DenyOutcome, JoinOutcome, PlayerName, RoomId},
    infrastructure::dto::{
        conversion::{member_to_player_info, relay_plan, snapshot_frames},
        websocket::{ClientEvent, ServerEvent},
    },
    ui::state::AppState,
};

/// この接続が現在属している部屋（admitted または pending）
///
/// 受信ループと切断処理の両方から触るため共有する。部屋そのものの
/// 状態は部屋ごとのロックが守っており、これは接続 1 本のローカルな
/// 「どの部屋宛てか」の記録にすぎない。
type SessionRoom = Arc<Mutex<Option<RoomId>>>;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives messages from the rx channel and pushes them
/// to the WebSocket sender.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // 接続 ID はサーバー側で採番する（クライアント申告値は信頼しない）
    let connection_id = ConnectionId::generate();
    let (tx, rx) = mpsc::unbounded_channel();
    state
        .message_pusher
        .register_connection(connection_id.clone(), tx)
        .await;
    tracing::info!("Connection '{}' established", connection_id);

    let (sender, mut receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);

    let session_room: SessionRoom = Arc::new(Mutex::new(None));
    let recv_state = state.clone();
    let recv_connection_id = connection_id.clone();
    let recv_session_room = session_room.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", recv_connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    handle_event(
                        &recv_state,
                        &recv_connection_id,
                        &recv_session_room,
                        text.as_str(),
                    )
                    .await;
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", recv_connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // 切断処理。受信タスクがどう終わってもここは必ず通る。
    state
        .message_pusher
        .unregister_connection(&connection_id)
        .await;
    let left_room = session_room.lock().await.take();
    if let Some(room_id) = left_room {
        handle_leave(&state, &connection_id, &room_id).await;
    }
    tracing::info!("Connection '{}' closed", connection_id);
}

/// 受信した 1 フレームを解釈して各 UseCase へ振り分ける
async fn handle_event(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    session_room: &SessionRoom,
    text: &str,
) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(
                "Dropping malformed message from '{}': {}",
                connection_id,
                e
            );
            return;
        }
    };

    match event {
        ClientEvent::CheckRoomStatus { room_id } => {
            check_room_status(state, connection_id, room_id).await;
        }
        ClientEvent::RequestJoin {
            room_id,
            player_name,
        } => {
            request_join(state, connection_id, session_room, room_id, player_name).await;
        }
        ClientEvent::AdmitPlayer { player_id } => {
            admit_player(state, connection_id, session_room, player_id).await;
        }
        ClientEvent::DenyPlayer { player_id } => {
            deny_player(state, connection_id, session_room, player_id).await;
        }
        relayed => {
            relay(state, connection_id, session_room, relayed).await;
        }
    }
}

/// ServerEvent をワイヤ上の JSON へ
///
/// この enum の形ではシリアライズは失敗しないはずだが、万一失敗しても
/// 落とすのはそのフレーム 1 件にとどめる。
fn encode(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!("Failed to encode server event: {}", e);
            None
        }
    }
}

async fn check_room_status(state: &Arc<AppState>, connection_id: &ConnectionId, room_id: String) {
    let room_id = match RoomId::new(room_id) {
        Ok(room_id) => room_id,
        Err(e) => {
            tracing::warn!(
                "Dropping check-room-status from '{}': {}",
                connection_id,
                e
            );
            return;
        }
    };

    let has_host = state.check_room_status_usecase.execute(&room_id).await;
    if let Some(json) = encode(&ServerEvent::RoomStatus { has_host }) {
        state
            .check_room_status_usecase
            .reply_status(connection_id, &json)
            .await;
    }
}

async fn request_join(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    session_room: &SessionRoom,
    room_id: String,
    player_name: String,
) {
    let room_id = match RoomId::new(room_id) {
        Ok(room_id) => room_id,
        Err(e) => {
            tracing::warn!("Dropping request-join from '{}': {}", connection_id, e);
            return;
        }
    };
    let name = match PlayerName::new(player_name) {
        Ok(name) => name,
        Err(e) => {
            tracing::warn!("Dropping request-join from '{}': {}", connection_id, e);
            return;
        }
    };

    // 二重参加はプロトコル違反。ただし deny された接続は部屋に在籍して
    // いないため、記録だけ残っている場合はクリアして再要求を通す。
    {
        let mut current = session_room.lock().await;
        if let Some(prior) = current.as_ref() {
            if state
                .request_join_usecase
                .is_active_in(prior, connection_id)
                .await
            {
                tracing::warn!(
                    "Connection '{}' already belongs to room '{}', dropping request-join",
                    connection_id,
                    prior
                );
                return;
            }
            *current = None;
        }
    }

    let outcome = state
        .request_join_usecase
        .execute(&room_id, connection_id.clone(), name.clone())
        .await;

    match outcome {
        JoinOutcome::AdmittedAsHost { members } => {
            *session_room.lock().await = Some(room_id);
            let players = members.iter().map(member_to_player_info).collect();
            if let Some(json) = encode(&ServerEvent::Admitted {
                is_host: true,
                players,
            }) {
                state
                    .request_join_usecase
                    .reply_admitted(connection_id, &json)
                    .await;
            }
        }
        JoinOutcome::PendingApproval { host } => {
            *session_room.lock().await = Some(room_id);
            if let Some(json) = encode(&ServerEvent::JoinRequest {
                player_id: connection_id.as_str().to_string(),
                player_name: name.as_str().to_string(),
            }) {
                state.request_join_usecase.notify_host(&host, &json).await;
            }
        }
        JoinOutcome::AlreadyKnown => {
            tracing::debug!(
                "Connection '{}' repeated request-join for '{}', ignoring",
                connection_id,
                room_id
            );
        }
    }
}

async fn admit_player(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    session_room: &SessionRoom,
    player_id: String,
) {
    let Some(room_id) = session_room.lock().await.clone() else {
        tracing::warn!(
            "Dropping admit-player from '{}' outside a room",
            connection_id
        );
        return;
    };
    let target = match ConnectionId::new(player_id) {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!("Dropping admit-player from '{}': {}", connection_id, e);
            return;
        }
    };

    let result = state
        .admit_player_usecase
        .execute(&room_id, connection_id, &target)
        .await;
    let AdmitOutcome::Admitted {
        target,
        target_name,
        members,
    } = result.outcome
    else {
        tracing::debug!("admit-player by '{}' ignored", connection_id);
        return;
    };

    // 1. 対象への admitted 応答（入室順の全メンバーリスト付き）
    let players = members.iter().map(member_to_player_info).collect();
    if let Some(json) = encode(&ServerEvent::Admitted {
        is_host: false,
        players,
    }) {
        state
            .admit_player_usecase
            .reply_admitted(&target, &json)
            .await;
    }

    // 2. 共有オブジェクトの全量リプレイ
    let frames: Vec<String> = snapshot_frames(result.snapshot, result.host_avatar)
        .iter()
        .filter_map(encode)
        .collect();
    state
        .admit_player_usecase
        .replay_snapshot(&target, frames)
        .await;

    // 3. ホストと新規入室者を含む全メンバーへ player-joined
    if let Some(json) = encode(&ServerEvent::PlayerJoined {
        player_id: target.as_str().to_string(),
        player_name: target_name.as_str().to_string(),
    }) {
        let targets = members.iter().map(|member| member.id.clone()).collect();
        state
            .admit_player_usecase
            .broadcast_player_joined(targets, &json)
            .await;
    }
}

async fn deny_player(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    session_room: &SessionRoom,
    player_id: String,
) {
    let Some(room_id) = session_room.lock().await.clone() else {
        tracing::warn!(
            "Dropping deny-player from '{}' outside a room",
            connection_id
        );
        return;
    };
    let target = match ConnectionId::new(player_id) {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!("Dropping deny-player from '{}': {}", connection_id, e);
            return;
        }
    };

    let outcome = state
        .deny_player_usecase
        .execute(&room_id, connection_id, &target)
        .await;
    let DenyOutcome::Denied { target } = outcome else {
        tracing::debug!("deny-player by '{}' ignored", connection_id);
        return;
    };

    // 拒否は対象にだけ伝える。部屋の他のメンバーは何も観測しない。
    if let Some(json) = encode(&ServerEvent::Denied) {
        state.deny_player_usecase.notify_denied(&target, &json).await;
    }
}

async fn relay(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    session_room: &SessionRoom,
    event: ClientEvent,
) {
    let Some(room_id) = session_room.lock().await.clone() else {
        tracing::debug!(
            "Dropping relay event from '{}' before joining a room",
            connection_id
        );
        return;
    };

    let plan = match relay_plan(event, connection_id) {
        Ok(Some(plan)) => plan,
        // 入室承認まわりは handle_event で処理済みのため、ここには来ない
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(
                "Dropping invalid relay event from '{}': {}",
                connection_id,
                e
            );
            return;
        }
    };

    let Some(frame) = encode(&plan.outbound) else {
        return;
    };
    state
        .relay_event_usecase
        .execute(&room_id, connection_id, plan.update, plan.policy, frame)
        .await;
}

/// 切断した接続を部屋から退室させ、必要な通知を配る
async fn handle_leave(state: &Arc<AppState>, connection_id: &ConnectionId, room_id: &RoomId) {
    let outcome = state
        .leave_room_usecase
        .execute(room_id, connection_id)
        .await;

    // pending からの退室と部屋外の接続は通知なし
    if !outcome.removed || outcome.remaining.is_empty() {
        return;
    }

    if let Some(json) = encode(&ServerEvent::PlayerLeft {
        player_id: connection_id.as_str().to_string(),
    }) {
        state
            .leave_room_usecase
            .broadcast_player_left(outcome.remaining.clone(), &json)
            .await;
    }

    // ホスト継承：新ホストへの私信のあとに部屋全体へ周知する
    if let Some(new_host) = outcome.new_host {
        if let Some(json) = encode(&ServerEvent::YouAreHost) {
            state
                .leave_room_usecase
                .notify_new_host(&new_host, &json)
                .await;
        }
        if let Some(json) = encode(&ServerEvent::HostChanged {
            new_host: new_host.as_str().to_string(),
        }) {
            state
                .leave_room_usecase
                .broadcast_host_changed(outcome.remaining, &json)
                .await;
        }
    }
}
