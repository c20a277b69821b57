use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::classify::classify;
use crate::timestamp::MessageTs;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Alert,
    Support,
    General,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Support => "support",
            Self::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alert" => Ok(Self::Alert),
            "support" => Ok(Self::Support),
            "general" => Ok(Self::General),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// Urgency rank. Higher is more urgent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(u8);

impl Priority {
    pub const LOW: Self = Self(1);
    pub const MEDIUM: Self = Self(2);
    pub const HIGH: Self = Self(3);

    pub fn new(value: u8) -> Self {
        Self(value)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Never lowers an already higher priority.
    pub fn raise_to(&mut self, floor: Priority) {
        if *self < floor {
            *self = floor;
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::LOW
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// A chat message that passed the fetch filters, classified and ready to
/// be persisted or rendered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub ts: MessageTs,
    pub permalink: String,
    pub channel_name: String,
    pub category: Category,
    pub priority: Priority,
}

impl Message {
    /// Build a message and derive category and priority from its content.
    pub fn classified(
        channel_name: impl Into<String>,
        ts: MessageTs,
        text: impl Into<String>,
        permalink: impl Into<String>,
    ) -> Self {
        let channel_name = channel_name.into();
        let text = text.into();
        let (category, priority) = classify(&channel_name, &text);
        Self {
            text,
            ts,
            permalink: permalink.into(),
            channel_name,
            category,
            priority,
        }
    }
}
