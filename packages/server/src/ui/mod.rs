//! Session relay server implementation.

mod handler;
mod server;
mod signal;
pub mod state; // bin とテストハーネスが AppState を組み立てるため public

pub use server::{DEFAULT_PENDING_ROOM_TTL, Server};
