//! RoomDirectory の実装

mod inmemory;

pub use inmemory::InMemoryRoomDirectory;
