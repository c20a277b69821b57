use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::{Stream, TryStreamExt};
use tracing::{info, instrument, warn};

use shinbun_core::{ChannelId, ChatApi, HistoryRequest, Message, MessageTs, RawMessage, SyncError};

use crate::retry::RateLimitPolicy;

pub type MessageStream = Pin<Box<dyn Stream<Item = Result<Message, SyncError>> + Send>>;

#[derive(Clone, Debug)]
pub struct FetchConfig {
    pub page_size: u32,
    pub page_delay: Duration,
    pub rate_limit: RateLimitPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: 200,
            page_delay: Duration::from_millis(1200),
            rate_limit: RateLimitPolicy::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    Automated,
    Subtype,
    ThreadReply,
}

const THREAD_BROADCAST: &str = "thread_broadcast";

/// Why a raw history entry is left out of the digest, if it is.
pub fn skip_reason(raw: &RawMessage) -> Option<SkipReason> {
    if raw.bot_id.as_deref().is_some_and(|b| !b.is_empty()) {
        return Some(SkipReason::Automated);
    }
    if raw.kind.as_deref().is_some_and(|k| k != "message") {
        return Some(SkipReason::Subtype);
    }

    let broadcast = raw.subtype.as_deref() == Some(THREAD_BROADCAST);
    if raw.subtype.is_some() && !broadcast {
        return Some(SkipReason::Subtype);
    }
    if !broadcast && raw.thread_ts.as_ref().is_some_and(|parent| *parent != raw.ts) {
        return Some(SkipReason::ThreadReply);
    }
    None
}

/// Archive link built without an API call.
pub fn fallback_permalink(channel: &ChannelId, ts: &MessageTs) -> String {
    format!("https://slack.com/archives/{}/p{}", channel, ts.link_token())
}

#[derive(Debug, Default)]
struct FetchStats {
    pages: usize,
    fetched: usize,
    automated: usize,
    subtypes: usize,
    thread_replies: usize,
    fallback_links: usize,
    emitted: usize,
}

impl FetchStats {
    fn skipped(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Automated => self.automated += 1,
            SkipReason::Subtype => self.subtypes += 1,
            SkipReason::ThreadReply => self.thread_replies += 1,
        }
    }
}

/// Pages a channel's history forward from a floor timestamp.
pub struct HistoryFetcher {
    api: Arc<dyn ChatApi>,
    config: FetchConfig,
}

impl HistoryFetcher {
    pub fn new(api: Arc<dyn ChatApi>, config: FetchConfig) -> Self {
        Self { api, config }
    }

    /// Lazy, finite sequence of classified messages in the service's page order.
    ///
    /// The first error ends the sequence. Anything yielded before it belongs
    /// to an incomplete pass and must not be treated as a full sync.
    pub fn fetch(&self, channel_name: &str, channel: &ChannelId, since: DateTime<Utc>) -> MessageStream {
        type Item = Result<Message, SyncError>;

        let api = Arc::clone(&self.api);
        let config = self.config.clone();
        let channel_name = channel_name.to_string();
        let channel = channel.clone();
        let oldest = MessageTs::from_datetime(since);

        Box::pin(async_stream::stream! {
            let mut stats = FetchStats::default();
            let mut cursor: Option<String> = None;

            loop {
                if stats.pages > 0 {
                    tokio::time::sleep(config.page_delay).await;
                }

                let request = HistoryRequest {
                    channel: channel.clone(),
                    oldest: oldest.clone(),
                    cursor: cursor.clone(),
                    limit: config.page_size,
                };
                let api_ref: &dyn ChatApi = &*api;
                let req_ref = &request;
                let page = match config
                    .rate_limit
                    .run("conversations.history", move || api_ref.history(req_ref))
                    .await
                {
                    Ok(page) => page,
                    Err(e) => {
                        warn!(
                            channel = %channel_name,
                            channel_id = %channel,
                            page = stats.pages + 1,
                            error = %e,
                            "history fetch failed"
                        );
                        let v: Item = Err(e);
                        yield v;
                        break;
                    }
                };

                stats.pages += 1;
                stats.fetched += page.messages.len();
                let next = page.continuation().map(String::from);

                for raw in page.messages {
                    if let Some(reason) = skip_reason(&raw) {
                        stats.skipped(reason);
                        continue;
                    }

                    let channel_ref = &channel;
                    let ts_ref = &raw.ts;
                    let permalink = match config
                        .rate_limit
                        .run("chat.getPermalink", move || api_ref.permalink(channel_ref, ts_ref))
                        .await
                    {
                        Ok(link) => link,
                        Err(e) => {
                            warn!(channel_id = %channel, ts = %raw.ts, error = %e, "permalink lookup failed, using fallback");
                            stats.fallback_links += 1;
                            fallback_permalink(&channel, &raw.ts)
                        }
                    };

                    stats.emitted += 1;
                    let v: Item = Ok(Message::classified(channel_name.clone(), raw.ts, raw.text, permalink));
                    yield v;
                }

                match next {
                    Some(c) => cursor = Some(c),
                    None => break,
                }
            }

            info!(
                channel = %channel_name,
                channel_id = %channel,
                pages = stats.pages,
                fetched = stats.fetched,
                skipped_automated = stats.automated,
                skipped_subtype = stats.subtypes,
                skipped_thread_replies = stats.thread_replies,
                fallback_links = stats.fallback_links,
                emitted = stats.emitted,
                "history fetch finished"
            );
        })
    }

    /// Drain [`fetch`](Self::fetch). All or nothing: any error discards the
    /// messages already received.
    #[instrument(skip(self, channel), fields(channel_id = %channel))]
    pub async fn fetch_all(
        &self,
        channel_name: &str,
        channel: &ChannelId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Message>, SyncError> {
        self.fetch(channel_name, channel, since).try_collect().await
    }
}
