//! HTTP API の DTO

use serde::{Deserialize, Serialize};

/// POST /api/token のリクエストボディ
#[derive(Debug, Deserialize)]
pub struct TokenExchangeRequest {
    pub code: String,
}

/// HTTP API のエラーレスポンスボディ
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// 部屋一覧のサマリ
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub id: String,
    pub member_count: usize,
    pub pending_count: usize,
    pub has_host: bool,
}

/// 部屋詳細のメンバー表現
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDetailDto {
    pub player_id: String,
    pub player_name: String,
    /// 入室時刻（RFC 3339, UTC）
    pub joined_at: String,
}

/// 部屋詳細
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub id: String,
    pub has_host: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub members: Vec<MemberDetailDto>,
    pub pending_count: usize,
    pub object_count: usize,
    /// 作成時刻（RFC 3339, UTC）
    pub created_at: String,
}
