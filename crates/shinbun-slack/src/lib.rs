//! HTTP client for the Slack Web API methods the sync pipeline uses.

pub mod client;
pub mod types;

pub use client::{SlackClient, SlackConfig};
