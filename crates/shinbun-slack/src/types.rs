use serde::Deserialize;

use shinbun_core::{ChannelInfo, RawMessage};

/// Fields every Web API response carries.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConversationsList {
    #[serde(default)]
    pub channels: Vec<ChannelInfo>,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct ConversationsHistory {
    #[serde(default)]
    pub messages: Vec<RawMessage>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct Permalink {
    pub permalink: String,
}

/// Error codes meaning the channel is gone or the token cannot read it.
pub const ACCESS_ERRORS: &[&str] = &[
    "channel_not_found",
    "not_in_channel",
    "missing_scope",
    "access_denied",
];

pub const RATE_LIMITED: &str = "ratelimited";
