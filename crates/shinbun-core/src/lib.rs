pub mod channel;
pub mod classify;
pub mod delivery;
pub mod digest;
pub mod errors;
pub mod ids;
pub mod message;
pub mod prompt;
pub mod remote;
pub mod store;
pub mod timestamp;

pub use channel::{CachedChannel, ResolvedChannel, SyncWindow};
pub use classify::classify;
pub use delivery::{Delivery, DeliveryOutcome};
pub use digest::DigestClient;
pub use errors::{DeliveryError, DigestError, SyncError};
pub use ids::{ChannelId, LocalChannelId};
pub use message::{Category, Message, Priority};
pub use prompt::{Focus, PromptBundle, NOTHING_RENDERABLE};
pub use remote::{ChannelInfo, ChannelPage, ChatApi, HistoryPage, HistoryRequest, RawMessage};
pub use store::SyncStore;
pub use timestamp::{format_jst, MessageTs, TimestampError};
