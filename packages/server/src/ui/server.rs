//! Server execution logic.

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use irori_shared::time::get_unix_timestamp;

use crate::domain::RoomDirectory;

use super::{
    handler::{exchange_token, get_room_detail, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// admitted メンバーが一度も現れない部屋を回収するまでの猶予（15 分）
pub const DEFAULT_PENDING_ROOM_TTL: Duration = Duration::from_secs(15 * 60);

/// pending のみの部屋の回収スイープの周期
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Session relay server
///
/// This struct encapsulates the server configuration and provides methods
/// to run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(state, directory, None, DEFAULT_PENDING_ROOM_TTL);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// ハンドラ間で共有するアプリケーション状態
    state: AppState,
    /// RoomDirectory（pending のみの部屋の回収スイープに使う）
    directory: Arc<dyn RoomDirectory>,
    /// 静的アセットの配信ディレクトリ（None なら配信しない）
    static_dir: Option<PathBuf>,
    /// pending のみの部屋を回収するまでの放置時間
    pending_room_ttl: Duration,
}

impl Server {
    /// Create a new Server instance
    pub fn new(
        state: AppState,
        directory: Arc<dyn RoomDirectory>,
        static_dir: Option<PathBuf>,
        pending_room_ttl: Duration,
    ) -> Self {
        Self {
            state,
            directory,
            static_dir,
            pending_room_ttl,
        }
    }

    /// Run the session relay server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address
    /// or if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
        self.serve(listener).await
    }

    /// バインド済みのリスナーで起動する
    ///
    /// テストがエフェメラルポート（port 0）を使えるように分離してある。
    pub async fn serve(
        self,
        listener: tokio::net::TcpListener,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let app_state = Arc::new(self.state);

        // Define handlers
        let router = Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/token", post(exchange_token))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .with_state(app_state);

        // 静的アセット（クライアント一式）はフォールバックで配る
        let router = match &self.static_dir {
            Some(static_dir) => router.fallback_service(ServeDir::new(static_dir)),
            None => router,
        };
        let app = router.layer(TraceLayer::new_for_http());

        // pending のみの部屋の定期回収
        let sweep_task = tokio::spawn(sweep_loop(self.directory.clone(), self.pending_room_ttl));

        let local_addr = listener.local_addr()?;
        tracing::info!("Session relay listening on {}", local_addr);
        tracing::info!("Connect to: ws://{}/ws", local_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;
        sweep_task.abort();
        result?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

/// admitted メンバー不在のまま放置された部屋を周期的に回収する
async fn sweep_loop(directory: Arc<dyn RoomDirectory>, pending_room_ttl: Duration) {
    let max_idle_millis = pending_room_ttl.as_millis() as i64;
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        let removed = directory
            .sweep_stale_pending(max_idle_millis, get_unix_timestamp())
            .await;
        if removed > 0 {
            tracing::info!("Swept {} stale pending-only room(s)", removed);
        }
    }
}
