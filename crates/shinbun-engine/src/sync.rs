use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, info_span, warn, Instrument};

use shinbun_core::{ChannelId, Message, SyncError, SyncStore, SyncWindow};

use crate::fetcher::HistoryFetcher;
use crate::merge::merge;
use crate::resolver::ChannelResolver;
use crate::watermark::WatermarkStore;

/// Per-channel counters for a completed sync.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelSummary {
    pub name: String,
    pub remote_id: ChannelId,
    pub fetched: usize,
    pub persisted: usize,
    pub merged: usize,
    pub saved: usize,
    pub save_failures: usize,
    pub watermark_advanced: bool,
}

#[derive(Clone, Debug)]
pub struct SkippedChannel {
    pub name: String,
    pub error: SyncError,
}

/// Outcome of one sync run across channels.
#[derive(Clone, Debug, Default)]
pub struct SyncReport {
    pub processed: Vec<ChannelSummary>,
    pub skipped: Vec<SkippedChannel>,
    /// Merged messages from every processed channel.
    pub messages: Vec<Message>,
}

impl SyncReport {
    pub fn saved(&self) -> usize {
        self.processed.iter().map(|c| c.saved).sum()
    }

    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Drives resolve → fetch → merge → save → watermark for each channel.
pub struct SyncPipeline {
    resolver: ChannelResolver,
    fetcher: HistoryFetcher,
    watermarks: WatermarkStore,
    store: Arc<dyn SyncStore>,
    history_window: Duration,
}

impl SyncPipeline {
    pub fn new(
        resolver: ChannelResolver,
        fetcher: HistoryFetcher,
        watermarks: WatermarkStore,
        store: Arc<dyn SyncStore>,
        history_window: Duration,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            watermarks,
            store,
            history_window,
        }
    }

    pub fn resolver(&self) -> &ChannelResolver {
        &self.resolver
    }

    pub async fn sync_channels(
        &self,
        names: &[String],
        since_override: Option<DateTime<Utc>>,
    ) -> SyncReport {
        self.sync_channels_at(names, since_override, Utc::now()).await
    }

    /// Sync each channel in turn. A failing channel is recorded in
    /// `skipped` and the run moves on.
    pub async fn sync_channels_at(
        &self,
        names: &[String],
        since_override: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> SyncReport {
        let mut report = SyncReport::default();

        for raw in names {
            let name = raw.trim();
            if name.is_empty() {
                debug!("skipping blank channel name");
                continue;
            }

            let span = info_span!("sync_channel", channel = name);
            match self
                .sync_one(name, since_override, now)
                .instrument(span)
                .await
            {
                Ok((summary, messages)) => {
                    report.processed.push(summary);
                    report.messages.extend(messages);
                }
                Err(e) => {
                    warn!(channel = name, error_kind = e.error_kind(), error = %e, "channel skipped");
                    report.skipped.push(SkippedChannel {
                        name: name.to_string(),
                        error: e,
                    });
                }
            }
        }

        info!(
            processed = report.processed.len(),
            skipped = report.skipped.len(),
            saved = report.saved(),
            messages = report.messages.len(),
            "sync run finished"
        );
        report
    }

    async fn sync_one(
        &self,
        name: &str,
        since_override: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(ChannelSummary, Vec<Message>), SyncError> {
        let resolved = self.resolver.resolve(name).await?;
        let local_id = resolved.local_id;

        let since = match since_override {
            Some(at) => at,
            None => self.watermarks.get(local_id, now),
        };
        let window = SyncWindow::new(resolved, since, now);
        info!(
            channel_id = %window.channel.remote_id,
            since = %window.since,
            oldest = %window.oldest_ts(),
            until = %window.until,
            "fetching history"
        );

        let fresh = self
            .fetcher
            .fetch_all(&window.channel.name, &window.channel.remote_id, window.since)
            .await?;

        let persisted = match local_id {
            Some(id) => self.store.recent_messages(id, now - self.history_window)?,
            None => Vec::new(),
        };

        let mut summary = ChannelSummary {
            name: window.channel.name.clone(),
            remote_id: window.channel.remote_id.clone(),
            fetched: fresh.len(),
            persisted: persisted.len(),
            merged: 0,
            saved: 0,
            save_failures: 0,
            watermark_advanced: false,
        };

        if let Some(id) = local_id {
            for message in &fresh {
                match self.store.upsert_message(id, message) {
                    Ok(()) => summary.saved += 1,
                    Err(e) => {
                        error!(ts = %message.ts, error = %e, "failed to save message");
                        summary.save_failures += 1;
                    }
                }
            }
        }

        let merged = merge(fresh, persisted);
        summary.merged = merged.len();

        match local_id {
            Some(id) if summary.save_failures == 0 => {
                summary.watermark_advanced = self.watermarks.set(id, window.until);
            }
            Some(_) => warn!(
                failures = summary.save_failures,
                "some messages were not saved, leaving watermark in place"
            ),
            None => warn!("channel has no local id, nothing persisted"),
        }

        info!(
            fetched = summary.fetched,
            persisted = summary.persisted,
            merged = summary.merged,
            saved = summary.saved,
            watermark_advanced = summary.watermark_advanced,
            "channel synced"
        );
        Ok((summary, merged))
    }
}
