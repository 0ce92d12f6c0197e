//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use irori_shared::time::timestamp_to_rfc3339;

use crate::{
    domain::RoomId,
    infrastructure::dto::http::{
        ErrorResponse, MemberDetailDto, RoomDetailDto, RoomSummaryDto, TokenExchangeRequest,
    },
    infrastructure::oauth::TokenExchangeError,
    ui::state::AppState,
    usecase::GetRoomDetailError,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Discord OAuth のコード交換エンドポイント
///
/// コーディネータで唯一、呼び出し元に構造化エラーを返す経路。
/// 上流が拒否した場合はステータスとレスポンスボディをそのまま透過する
/// （クライアントが Discord のエラー内容をユーザーに見せられるように）。
pub async fn exchange_token(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TokenExchangeRequest>,
) -> Response {
    match state.token_client.exchange(&request.code).await {
        Ok(payload) => Json(payload).into_response(),
        Err(e @ TokenExchangeError::MissingCode) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
        Err(e @ TokenExchangeError::MissingSecret) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
        Err(TokenExchangeError::Rejected { status, body }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            match serde_json::from_str::<serde_json::Value>(&body) {
                Ok(upstream) => (status, Json(upstream)).into_response(),
                Err(_) => (status, Json(ErrorResponse { error: body })).into_response(),
            }
        }
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// Get list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let summaries = state.get_rooms_usecase.execute().await;

    // Domain Model から DTO への変換
    let summaries: Vec<RoomSummaryDto> = summaries
        .into_iter()
        .map(|summary| RoomSummaryDto {
            id: summary.id.as_str().to_string(),
            member_count: summary.member_count,
            pending_count: summary.pending_count,
            has_host: summary.has_host,
        })
        .collect();

    Json(summaries)
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    let Ok(room_id) = RoomId::new(room_id) else {
        return Err(StatusCode::NOT_FOUND);
    };

    match state.get_room_detail_usecase.execute(&room_id).await {
        Ok(detail) => {
            // Domain Model から DTO への変換
            Ok(Json(RoomDetailDto {
                id: detail.id.as_str().to_string(),
                has_host: detail.host.is_some(),
                host: detail.host.map(|host| host.as_str().to_string()),
                members: detail
                    .members
                    .iter()
                    .map(|member| MemberDetailDto {
                        player_id: member.id.as_str().to_string(),
                        player_name: member.name.as_str().to_string(),
                        joined_at: timestamp_to_rfc3339(member.joined_at),
                    })
                    .collect(),
                pending_count: detail.pending_count,
                object_count: detail.object_count,
                created_at: timestamp_to_rfc3339(detail.created_at),
            }))
        }
        Err(GetRoomDetailError::RoomNotFound) => Err(StatusCode::NOT_FOUND),
    }
}
