//! irori session relay server library.
//!
//! Clients join a named room over WebSocket, the room's host gates
//! admission, and state-update events fan out to the other room members.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
