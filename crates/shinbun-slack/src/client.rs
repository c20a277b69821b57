use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use shinbun_core::{
    ChannelId, ChannelPage, ChatApi, HistoryPage, HistoryRequest, MessageTs, SyncError,
};

use crate::types::{
    ConversationsHistory, ConversationsList, Envelope, Permalink, ACCESS_ERRORS, RATE_LIMITED,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct SlackConfig {
    pub token: SecretString,
    pub api_base: String,
}

pub struct SlackClient {
    http: Client,
    token: SecretString,
    api_base: String,
}

impl SlackClient {
    pub fn new(config: SlackConfig) -> Result<Self, SyncError> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Transport(format!("build http client: {e}")))?;
        Ok(Self {
            http,
            token: config.token,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, String)],
    ) -> Result<T, SyncError> {
        let url = format!("{}/{}", self.api_base, method);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(self.token.expose_secret())
            .query(query)
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("{method}: {e}")))?;

        let status = resp.status();
        let retry_after = parse_retry_after(resp.headers().get(RETRY_AFTER));

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SyncError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Transport(format!(
                "{method}: status {}: {body}",
                status.as_u16()
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| SyncError::Transport(format!("{method}: read body: {e}")))?;
        let envelope: Envelope = serde_json::from_slice(&bytes)
            .map_err(|e| SyncError::Transport(format!("{method}: decode: {e}")))?;

        if !envelope.ok {
            let code = envelope.error.unwrap_or_else(|| "unknown_error".to_string());
            return Err(classify_api_error(method, &code, retry_after));
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| SyncError::Transport(format!("{method}: decode: {e}")))
    }
}

fn classify_api_error(method: &str, code: &str, retry_after: Option<Duration>) -> SyncError {
    if code == RATE_LIMITED {
        return SyncError::RateLimited { retry_after };
    }
    if ACCESS_ERRORS.contains(&code) {
        return SyncError::PermissionOrMissing(format!("{method}: {code}"));
    }
    SyncError::Transport(format!("{method}: {code}"))
}

fn parse_retry_after(value: Option<&reqwest::header::HeaderValue>) -> Option<Duration> {
    let secs: u64 = value?.to_str().ok()?.trim().parse().ok()?;
    Some(Duration::from_secs(secs))
}

#[async_trait]
impl ChatApi for SlackClient {
    #[instrument(skip(self))]
    async fn list_channels(
        &self,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<ChannelPage, SyncError> {
        let mut query = vec![
            ("exclude_archived", "true".to_string()),
            ("types", "public_channel,private_channel".to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }

        let list: ConversationsList = self.call("conversations.list", &query).await?;
        debug!(count = list.channels.len(), "directory page received");
        Ok(ChannelPage {
            channels: list.channels,
            next_cursor: list.response_metadata.and_then(|m| m.next_cursor),
        })
    }

    #[instrument(skip(self, request), fields(channel = %request.channel, oldest = %request.oldest))]
    async fn history(&self, request: &HistoryRequest) -> Result<HistoryPage, SyncError> {
        let mut query = vec![
            ("channel", request.channel.to_string()),
            ("oldest", request.oldest.to_string()),
            ("limit", request.limit.to_string()),
        ];
        if let Some(cursor) = &request.cursor {
            query.push(("cursor", cursor.clone()));
        }

        let history: ConversationsHistory = self.call("conversations.history", &query).await?;
        Ok(HistoryPage {
            messages: history.messages,
            has_more: history.has_more,
            next_cursor: history.response_metadata.and_then(|m| m.next_cursor),
        })
    }

    #[instrument(skip(self))]
    async fn permalink(&self, channel: &ChannelId, ts: &MessageTs) -> Result<String, SyncError> {
        let query = [
            ("channel", channel.to_string()),
            ("message_ts", ts.to_string()),
        ];
        let link: Permalink = self.call("chat.getPermalink", &query).await?;
        if link.permalink.is_empty() {
            warn!(%channel, %ts, "empty permalink returned");
            return Err(SyncError::Transport("chat.getPermalink: empty permalink".into()));
        }
        Ok(link.permalink)
    }
}
