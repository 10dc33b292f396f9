//! Bridge engine: bindings, routing, membership sync and the service loop.
//!
//! ## Module Structure
//!
//! - `channels`: Internal channel bundle and shutdown helper
//! - `context`: Shared context and the operations both directions reuse
//! - `filter`: Regex message filters
//! - `registry`: Channel/room bindings
//! - `router`: Event translation (`Router`)
//! - `service`: The dispatch loop (`BridgeService`)
//! - `state`: Membership tracker and per-pass user info cache
//! - `sync`: Startup / reconnect membership reconciliation
//! - `text`: Splitting bodies into lobby lines

pub mod channels;
pub mod context;
pub mod filter;
pub mod registry;
pub mod router;
pub mod service;
pub mod state;
pub mod sync;
pub mod text;

pub use channels::ChannelBundle;
pub use context::BridgeContext;
pub use registry::{ChannelBinding, ChannelRegistry};
pub use router::Router;
pub use service::BridgeService;
pub use state::{MembershipTracker, ParticipantState, PendingUserInfo};
pub use sync::{MembershipSync, SyncReport};
