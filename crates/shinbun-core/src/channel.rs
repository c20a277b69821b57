use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ChannelId, LocalChannelId};
use crate::timestamp::MessageTs;

/// A channel row from the local cache.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedChannel {
    pub local_id: LocalChannelId,
    pub remote_id: ChannelId,
    pub name: String,
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// Outcome of resolving a display name.
///
/// `local_id` is `None` when the remote match could not be written to the
/// cache; the channel is still fetchable but nothing is persisted for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedChannel {
    pub name: String,
    pub remote_id: ChannelId,
    pub local_id: Option<LocalChannelId>,
}

/// Time range covered by one fetch pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncWindow {
    pub channel: ResolvedChannel,
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl SyncWindow {
    pub fn new(channel: ResolvedChannel, since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            channel,
            since,
            until,
        }
    }

    /// `since` in the remote API's floor-timestamp encoding.
    pub fn oldest_ts(&self) -> MessageTs {
        MessageTs::from_datetime(self.since)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn oldest_ts_is_microsecond_encoded() {
        let since = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
        let window = SyncWindow::new(
            ResolvedChannel {
                name: "general".into(),
                remote_id: ChannelId::from_raw("C1"),
                local_id: None,
            },
            since,
            since + chrono::Duration::hours(1),
        );
        assert_eq!(window.oldest_ts().as_str(), "1700000000.000000");
    }
}
