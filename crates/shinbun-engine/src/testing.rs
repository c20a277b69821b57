//! Scripted collaborators shared by the engine's unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use shinbun_core::{
    CachedChannel, ChannelId, ChannelInfo, ChannelPage, ChatApi, HistoryPage, HistoryRequest,
    LocalChannelId, Message, MessageTs, RawMessage, SyncError, SyncStore,
};
use shinbun_store::{Database, SqliteSyncStore};

#[derive(Default)]
pub struct ScriptedChatApi {
    directory: Mutex<VecDeque<Result<ChannelPage, SyncError>>>,
    history: Mutex<VecDeque<Result<HistoryPage, SyncError>>>,
    broken_permalinks: Mutex<HashSet<String>>,
    throttled_permalinks: Mutex<HashMap<String, u32>>,
    pub list_calls: AtomicUsize,
    pub history_requests: Mutex<Vec<HistoryRequest>>,
}

impl ScriptedChatApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn directory_page(&self, page: Result<ChannelPage, SyncError>) {
        self.directory.lock().push_back(page);
    }

    pub fn history_page(&self, page: Result<HistoryPage, SyncError>) {
        self.history.lock().push_back(page);
    }

    pub fn break_permalink(&self, ts: &str) {
        self.broken_permalinks.lock().insert(ts.to_string());
    }

    /// Answer the next `times` permalink lookups for `ts` with a rate limit.
    pub fn throttle_permalink(&self, ts: &str, times: u32) {
        self.throttled_permalinks.lock().insert(ts.to_string(), times);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatApi for ScriptedChatApi {
    async fn list_channels(
        &self,
        _cursor: Option<&str>,
        _limit: u32,
    ) -> Result<ChannelPage, SyncError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.directory
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(ChannelPage::default()))
    }

    async fn history(&self, request: &HistoryRequest) -> Result<HistoryPage, SyncError> {
        self.history_requests.lock().push(request.clone());
        self.history
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(HistoryPage::default()))
    }

    async fn permalink(&self, channel: &ChannelId, ts: &MessageTs) -> Result<String, SyncError> {
        if self.broken_permalinks.lock().contains(ts.as_str()) {
            return Err(SyncError::Transport("permalink unavailable".into()));
        }
        if let Some(left) = self.throttled_permalinks.lock().get_mut(ts.as_str()) {
            if *left > 0 {
                *left -= 1;
                return Err(SyncError::RateLimited { retry_after: None });
            }
        }
        Ok(format!(
            "https://acme.slack.com/archives/{channel}/p{}",
            ts.link_token()
        ))
    }
}

pub fn channel(id: &str, name: &str) -> ChannelInfo {
    ChannelInfo {
        id: ChannelId::from_raw(id),
        name: name.to_string(),
        is_private: false,
    }
}

pub fn directory(channels: Vec<ChannelInfo>, next: Option<&str>) -> ChannelPage {
    ChannelPage {
        channels,
        next_cursor: next.map(String::from),
    }
}

pub fn raw(ts: &str, text: &str) -> RawMessage {
    RawMessage {
        kind: Some("message".into()),
        ts: MessageTs::from_raw(ts),
        text: text.to_string(),
        ..Default::default()
    }
}

pub fn history(messages: Vec<RawMessage>, next: Option<&str>) -> HistoryPage {
    HistoryPage {
        messages,
        has_more: next.is_some(),
        next_cursor: next.map(String::from),
    }
}

/// Timestamp `secs_ago` seconds before now, in remote encoding.
pub fn ts_ago(secs_ago: i64) -> String {
    MessageTs::from_datetime(Utc::now() - chrono::Duration::seconds(secs_ago)).to_string()
}

pub fn sqlite_store() -> Arc<SqliteSyncStore> {
    Arc::new(SqliteSyncStore::new(
        Database::in_memory().expect("in-memory database"),
    ))
}

/// Store wrapper whose individual operations can be made to fail.
pub struct FlakyStore {
    pub inner: Arc<SqliteSyncStore>,
    pub fail_upsert_channel: bool,
    pub fail_watermark_read: bool,
    pub fail_watermark_write: bool,
    pub fail_recent: bool,
    pub fail_message_ts: HashSet<String>,
}

impl FlakyStore {
    pub fn new(inner: Arc<SqliteSyncStore>) -> Self {
        Self {
            inner,
            fail_upsert_channel: false,
            fail_watermark_read: false,
            fail_watermark_write: false,
            fail_recent: false,
            fail_message_ts: HashSet::new(),
        }
    }
}

fn injected() -> SyncError {
    SyncError::Persistence("injected failure".into())
}

impl SyncStore for FlakyStore {
    fn lookup_channel(&self, name: &str) -> Result<Option<CachedChannel>, SyncError> {
        self.inner.lookup_channel(name)
    }

    fn upsert_channel(&self, remote_id: &ChannelId, name: &str) -> Result<LocalChannelId, SyncError> {
        if self.fail_upsert_channel {
            return Err(injected());
        }
        self.inner.upsert_channel(remote_id, name)
    }

    fn watermark(&self, channel: LocalChannelId) -> Result<Option<DateTime<Utc>>, SyncError> {
        if self.fail_watermark_read {
            return Err(injected());
        }
        self.inner.watermark(channel)
    }

    fn set_watermark(&self, channel: LocalChannelId, at: DateTime<Utc>) -> Result<(), SyncError> {
        if self.fail_watermark_write {
            return Err(injected());
        }
        self.inner.set_watermark(channel, at)
    }

    fn recent_messages(
        &self,
        channel: LocalChannelId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Message>, SyncError> {
        if self.fail_recent {
            return Err(injected());
        }
        self.inner.recent_messages(channel, since)
    }

    fn upsert_message(&self, channel: LocalChannelId, message: &Message) -> Result<(), SyncError> {
        if self.fail_message_ts.contains(message.ts.as_str()) {
            return Err(injected());
        }
        self.inner.upsert_message(channel, message)
    }
}
