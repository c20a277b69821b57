use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tracing::{debug, error, info, instrument, warn};

use shinbun_core::{ChannelInfo, ChannelPage, ChatApi, ResolvedChannel, SyncError, SyncStore};

use crate::retry::RateLimitPolicy;

#[derive(Clone, Debug)]
pub struct ResolverConfig {
    pub page_size: u32,
    pub page_delay: Duration,
    pub rate_limit: RateLimitPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            page_size: 1000,
            page_delay: Duration::from_millis(500),
            rate_limit: RateLimitPolicy::default(),
        }
    }
}

/// Maps channel display names to remote and local ids, caching what it finds.
pub struct ChannelResolver {
    api: Arc<dyn ChatApi>,
    store: Arc<dyn SyncStore>,
    config: ResolverConfig,
}

impl ChannelResolver {
    pub fn new(api: Arc<dyn ChatApi>, store: Arc<dyn SyncStore>, config: ResolverConfig) -> Self {
        Self { api, store, config }
    }

    /// Resolve a display name. Cache hits never touch the remote directory.
    ///
    /// A remote match whose cache write fails still resolves, with
    /// `local_id: None`.
    #[instrument(skip(self))]
    pub async fn resolve(&self, name: &str) -> Result<ResolvedChannel, SyncError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SyncError::NotFound("empty channel name".into()));
        }

        match self.store.lookup_channel(name) {
            Ok(Some(cached)) => {
                debug!(channel_id = %cached.remote_id, "channel cache hit");
                return Ok(ResolvedChannel {
                    name: cached.name,
                    remote_id: cached.remote_id,
                    local_id: Some(cached.local_id),
                });
            }
            Ok(None) => info!("channel not cached, scanning directory"),
            Err(e) => warn!(error = %e, "channel cache lookup failed, scanning directory"),
        }

        let found = self.find_remote(name).await?;
        let Some(info) = found else {
            return Err(SyncError::NotFound(name.to_string()));
        };

        let local_id = match self.store.upsert_channel(&info.id, &info.name) {
            Ok(id) => Some(id),
            Err(e) => {
                error!(channel_id = %info.id, error = %e, "failed to cache channel, continuing without local id");
                None
            }
        };

        Ok(ResolvedChannel {
            name: info.name,
            remote_id: info.id,
            local_id,
        })
    }

    /// Every channel visible to the token, sorted by name.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<ChannelInfo>, SyncError> {
        let mut all = Vec::new();
        let mut pages = std::pin::pin!(self.pages());
        while let Some(page) = pages.next().await {
            all.extend(page?.channels);
        }
        all.sort_by(|a, b| a.name.cmp(&b.name));
        info!(count = all.len(), "listed channels");
        Ok(all)
    }

    async fn find_remote(&self, name: &str) -> Result<Option<ChannelInfo>, SyncError> {
        let mut pages = std::pin::pin!(self.pages());
        let mut scanned = 0usize;
        while let Some(page) = pages.next().await {
            let page = page?;
            scanned += page.channels.len();
            if let Some(hit) = page.channels.into_iter().find(|c| c.name == name) {
                info!(channel_id = %hit.id, scanned, "channel found in directory");
                return Ok(Some(hit));
            }
        }
        warn!(scanned, "channel not found in directory");
        Ok(None)
    }

    /// Lazily walk the directory. Stops after the first error.
    fn pages(&self) -> impl Stream<Item = Result<ChannelPage, SyncError>> + '_ {
        type Item = Result<ChannelPage, SyncError>;

        async_stream::stream! {
            let api: &dyn ChatApi = &*self.api;
            let limit = self.config.page_size;
            let mut cursor: Option<String> = None;
            let mut first = true;

            loop {
                if !first {
                    tokio::time::sleep(self.config.page_delay).await;
                }
                first = false;

                let current = cursor.as_deref();
                let result = self
                    .config
                    .rate_limit
                    .run("conversations.list", move || api.list_channels(current, limit))
                    .await;

                match result {
                    Ok(page) => {
                        let next = page.continuation().map(String::from);
                        let v: Item = Ok(page);
                        yield v;
                        match next {
                            Some(c) => cursor = Some(c),
                            None => break,
                        }
                    }
                    Err(e) => {
                        let e = match e {
                            SyncError::Transport(_) => e,
                            other => SyncError::Transport(format!("channel directory: {other}")),
                        };
                        let v: Item = Err(e);
                        yield v;
                        break;
                    }
                }
            }
        }
    }
}
