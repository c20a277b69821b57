use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, warn};

use shinbun_core::{LocalChannelId, SyncStore};

/// Per-channel "synced up to" timestamps with a lookback fallback.
pub struct WatermarkStore {
    store: Arc<dyn SyncStore>,
    default_lookback: Duration,
}

impl WatermarkStore {
    pub fn new(store: Arc<dyn SyncStore>, default_lookback: Duration) -> Self {
        Self {
            store,
            default_lookback,
        }
    }

    /// Lower bound for the next fetch. Never fails: a missing id, a missing
    /// value, or a read error all yield `now - default_lookback`.
    pub fn get(&self, channel: Option<LocalChannelId>, now: DateTime<Utc>) -> DateTime<Utc> {
        let fallback = now - self.default_lookback;
        let Some(id) = channel else {
            debug!("no local channel id, using default lookback");
            return fallback;
        };

        match self.store.watermark(id) {
            Ok(Some(at)) => at,
            Ok(None) => {
                debug!(local_id = %id, "no watermark recorded, using default lookback");
                fallback
            }
            Err(e) => {
                warn!(local_id = %id, error = %e, "watermark read failed, using default lookback");
                fallback
            }
        }
    }

    /// Record a watermark. Returns whether it was persisted.
    pub fn set(&self, channel: LocalChannelId, at: DateTime<Utc>) -> bool {
        match self.store.set_watermark(channel, at) {
            Ok(()) => true,
            Err(e) => {
                error!(local_id = %channel, error = %e, "failed to persist watermark");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sqlite_store, FlakyStore};
    use shinbun_core::ChannelId;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_750_000_000, 0).unwrap()
    }

    #[test]
    fn missing_id_uses_lookback() {
        let marks = WatermarkStore::new(sqlite_store(), Duration::days(7));
        assert_eq!(marks.get(None, now()), now() - Duration::days(7));
    }

    #[test]
    fn unset_watermark_uses_lookback() {
        let store = sqlite_store();
        let id = store.upsert_channel(&ChannelId::from_raw("C1"), "eng").unwrap();
        let marks = WatermarkStore::new(store, Duration::hours(12));
        assert_eq!(marks.get(Some(id), now()), now() - Duration::hours(12));
    }

    #[test]
    fn set_then_get() {
        let store = sqlite_store();
        let id = store.upsert_channel(&ChannelId::from_raw("C1"), "eng").unwrap();
        let marks = WatermarkStore::new(store, Duration::days(7));

        let at = now() - Duration::minutes(5);
        assert!(marks.set(id, at));
        assert_eq!(marks.get(Some(id), now()), at);
    }

    #[test]
    fn read_error_falls_back() {
        let inner = sqlite_store();
        let id = inner.upsert_channel(&ChannelId::from_raw("C1"), "eng").unwrap();
        inner.set_watermark(id, now()).unwrap();

        let mut flaky = FlakyStore::new(inner);
        flaky.fail_watermark_read = true;
        let marks = WatermarkStore::new(Arc::new(flaky), Duration::days(7));
        assert_eq!(marks.get(Some(id), now()), now() - Duration::days(7));
    }

    #[test]
    fn write_error_reports_false() {
        let inner = sqlite_store();
        let id = inner.upsert_channel(&ChannelId::from_raw("C1"), "eng").unwrap();
        let mut flaky = FlakyStore::new(inner);
        flaky.fail_watermark_write = true;
        let marks = WatermarkStore::new(Arc::new(flaky), Duration::days(7));
        assert!(!marks.set(id, now()));
    }
}
