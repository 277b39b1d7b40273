use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Click,
    Fill,
    Submit,
    Navigate,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Click => "click",
            ActionType::Fill => "fill",
            ActionType::Submit => "submit",
            ActionType::Navigate => "navigate",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate interaction on a screen, addressed by the accessible name of
/// its target element rather than by any DOM locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub action_type: ActionType,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ActionDescriptor {
    pub fn click(target: impl Into<String>) -> Self {
        Self {
            action_type: ActionType::Click,
            target: target.into(),
            value: None,
        }
    }

    pub fn fill(target: impl Into<String>, value: Option<String>) -> Self {
        Self {
            action_type: ActionType::Fill,
            target: target.into(),
            value,
        }
    }

    pub fn submit(target: impl Into<String>) -> Self {
        Self {
            action_type: ActionType::Submit,
            target: target.into(),
            value: None,
        }
    }

    pub fn navigate(target: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            action_type: ActionType::Navigate,
            target: target.into(),
            value: Some(href.into()),
        }
    }
}

impl fmt::Display for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.action_type, self.target)
    }
}
