use std::fmt;

use serde::{Deserialize, Serialize};

pub const NOTHING_RENDERABLE: &str = "No processable messages found within token limits.";

/// Digest template variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Focus {
    #[default]
    Default,
    Support,
}

impl Focus {
    /// `None` for names no template exists for.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "default" => Some(Self::Default),
            "support" => Some(Self::Support),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Support => "support",
        }
    }
}

impl fmt::Display for Focus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// System/user message pair ready for the completion model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptBundle {
    pub focus: Focus,
    pub system_message: String,
    pub user_prompt: String,
    pub included_message_count: usize,
    pub truncated: bool,
}

impl PromptBundle {
    pub fn nothing_renderable(focus: Focus, system_message: String, truncated: bool) -> Self {
        Self {
            focus,
            system_message,
            user_prompt: NOTHING_RENDERABLE.to_string(),
            included_message_count: 0,
            truncated,
        }
    }

    pub fn is_renderable(&self) -> bool {
        self.included_message_count > 0
    }
}
