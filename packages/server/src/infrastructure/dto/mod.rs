//! Data Transfer Objects (DTOs) for the session relay.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket message DTOs (the relay's wire contract)
//! - `http`: HTTP API request/response DTOs
//! - `conversion`: DTO ⇄ Domain Model conversions and per-message relay plans

pub mod conversion;
pub mod http;
pub mod websocket;
