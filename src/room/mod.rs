//! Room side: transport seam, event normalization and media links.

pub mod adapter;
pub mod intent;
pub mod media;

pub use adapter::{MessageContent, RawRoomEvent, RoomEvent, RoomEventAdapter};
pub use intent::RoomIntent;
pub use media::{download_url, MediaError};
