use chrono::{DateTime, Utc};

use shinbun_core::{CachedChannel, ChannelId, LocalChannelId, Message, SyncError, SyncStore};

use crate::channels::ChannelRepo;
use crate::database::Database;
use crate::messages::MessageRepo;

/// `SyncStore` backed by the SQLite repositories.
#[derive(Clone)]
pub struct SqliteSyncStore {
    channels: ChannelRepo,
    messages: MessageRepo,
}

impl SqliteSyncStore {
    pub fn new(db: Database) -> Self {
        Self {
            channels: ChannelRepo::new(db.clone()),
            messages: MessageRepo::new(db),
        }
    }

    pub fn channels(&self) -> &ChannelRepo {
        &self.channels
    }

    pub fn messages(&self) -> &MessageRepo {
        &self.messages
    }
}

impl SyncStore for SqliteSyncStore {
    fn lookup_channel(&self, name: &str) -> Result<Option<CachedChannel>, SyncError> {
        Ok(self.channels.lookup_by_name(name)?)
    }

    fn upsert_channel(&self, remote_id: &ChannelId, name: &str) -> Result<LocalChannelId, SyncError> {
        Ok(self.channels.upsert(remote_id, name)?)
    }

    fn watermark(&self, channel: LocalChannelId) -> Result<Option<DateTime<Utc>>, SyncError> {
        Ok(self.channels.watermark(channel)?)
    }

    fn set_watermark(&self, channel: LocalChannelId, at: DateTime<Utc>) -> Result<(), SyncError> {
        Ok(self.channels.set_watermark(channel, at)?)
    }

    fn recent_messages(
        &self,
        channel: LocalChannelId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Message>, SyncError> {
        Ok(self.messages.query_recent(channel, since)?)
    }

    fn upsert_message(&self, channel: LocalChannelId, message: &Message) -> Result<(), SyncError> {
        Ok(self.messages.upsert(channel, message)?)
    }
}
