use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::SyncError;
use crate::ids::ChannelId;
use crate::timestamp::MessageTs;

/// One entry of the remote channel directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelPage {
    pub channels: Vec<ChannelInfo>,
    /// Empty or absent when this was the last page.
    pub next_cursor: Option<String>,
}

impl ChannelPage {
    pub fn continuation(&self) -> Option<&str> {
        self.next_cursor.as_deref().filter(|c| !c.is_empty())
    }
}

/// A history entry exactly as the remote service returned it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    pub ts: MessageTs,
    #[serde(default)]
    pub thread_ts: Option<MessageTs>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRequest {
    pub channel: ChannelId,
    pub oldest: MessageTs,
    pub cursor: Option<String>,
    pub limit: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HistoryPage {
    pub messages: Vec<RawMessage>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

impl HistoryPage {
    /// Cursor for the following page, if the service reported one.
    pub fn continuation(&self) -> Option<&str> {
        if !self.has_more {
            return None;
        }
        self.next_cursor.as_deref().filter(|c| !c.is_empty())
    }
}

/// Remote chat service operations the sync pipeline depends on.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn list_channels(
        &self,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<ChannelPage, SyncError>;

    async fn history(&self, request: &HistoryRequest) -> Result<HistoryPage, SyncError>;

    async fn permalink(&self, channel: &ChannelId, ts: &MessageTs) -> Result<String, SyncError>;
}
