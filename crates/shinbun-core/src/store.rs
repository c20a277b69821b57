use chrono::{DateTime, Utc};

use crate::channel::CachedChannel;
use crate::errors::SyncError;
use crate::ids::{ChannelId, LocalChannelId};
use crate::message::Message;

/// Persistence operations the sync pipeline needs.
///
/// Every write is a single idempotent upsert; implementations must not
/// assume they are the only writer.
pub trait SyncStore: Send + Sync {
    fn lookup_channel(&self, name: &str) -> Result<Option<CachedChannel>, SyncError>;

    /// Insert or rename a channel keyed on its remote id. Returns the local id,
    /// which never changes once assigned.
    fn upsert_channel(&self, remote_id: &ChannelId, name: &str) -> Result<LocalChannelId, SyncError>;

    fn watermark(&self, channel: LocalChannelId) -> Result<Option<DateTime<Utc>>, SyncError>;

    fn set_watermark(&self, channel: LocalChannelId, at: DateTime<Utc>) -> Result<(), SyncError>;

    /// Messages posted at or after `since`, newest first.
    fn recent_messages(
        &self,
        channel: LocalChannelId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Message>, SyncError>;

    fn upsert_message(&self, channel: LocalChannelId, message: &Message) -> Result<(), SyncError>;
}
