//! irori session relay server.
//!
//! Clients join a named room over WebSocket, the room's host gates
//! admission, and state-update events fan out to the other room members.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin irori-server
//! cargo run --bin irori-server -- --host 0.0.0.0 --port 3000 --static-dir ./public
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;

use irori_server::{
    infrastructure::{
        directory::InMemoryRoomDirectory,
        message_pusher::WebSocketMessagePusher,
        oauth::{DiscordOAuthConfig, DiscordTokenClient},
    },
    ui::{Server, state::AppState},
    usecase::{
        AdmitPlayerUseCase, CheckRoomStatusUseCase, DenyPlayerUseCase, GetRoomDetailUseCase,
        GetRoomsUseCase, LeaveRoomUseCase, RelayEventUseCase, RequestJoinUseCase,
    },
};
use irori_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "irori-server")]
#[command(about = "Session relay server: rooms, host-gated admission, shared-state fan-out", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Directory of static client assets to serve (omit to disable)
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Seconds a room may sit without admitted members before it is reclaimed
    #[arg(long, default_value = "900")]
    pending_room_ttl_secs: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. RoomDirectory / MessagePusher
    // 2. UseCases
    // 3. OAuth client
    // 4. AppState / Server

    // 1. Directory (in-memory room registry) and MessagePusher (connection registry)
    let directory = Arc::new(InMemoryRoomDirectory::new());
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 2. Create UseCases
    let check_room_status_usecase = Arc::new(CheckRoomStatusUseCase::new(
        directory.clone(),
        message_pusher.clone(),
    ));
    let request_join_usecase = Arc::new(RequestJoinUseCase::new(
        directory.clone(),
        message_pusher.clone(),
    ));
    let admit_player_usecase = Arc::new(AdmitPlayerUseCase::new(
        directory.clone(),
        message_pusher.clone(),
    ));
    let deny_player_usecase = Arc::new(DenyPlayerUseCase::new(
        directory.clone(),
        message_pusher.clone(),
    ));
    let leave_room_usecase = Arc::new(LeaveRoomUseCase::new(
        directory.clone(),
        message_pusher.clone(),
    ));
    let relay_event_usecase = Arc::new(RelayEventUseCase::new(
        directory.clone(),
        message_pusher.clone(),
    ));
    let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(directory.clone()));
    let get_room_detail_usecase = Arc::new(GetRoomDetailUseCase::new(directory.clone()));

    // 3. OAuth client (secrets come from the environment)
    let token_client = Arc::new(DiscordTokenClient::new(DiscordOAuthConfig::from_env()));

    // 4. Create and run the server
    let state = AppState {
        check_room_status_usecase,
        request_join_usecase,
        admit_player_usecase,
        deny_player_usecase,
        leave_room_usecase,
        relay_event_usecase,
        get_rooms_usecase,
        get_room_detail_usecase,
        message_pusher,
        token_client,
    };
    let server = Server::new(
        state,
        directory,
        args.static_dir,
        Duration::from_secs(args.pending_room_ttl_secs),
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
