//! Identity handling: room user ids and the puppet codec.

pub mod codec;
pub mod user_id;

pub use codec::{IdentityCodec, RelayRule};
pub use user_id::{UserId, UserIdError};
