//! Control-channel messages
//!
//! The popup and the on-page toggle button talk to the background engine
//! with JSON objects tagged by `type`. One message is one intent.

use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// Message types understood by the engine.
const MESSAGE_TYPES: &[&str] = &[
    "applyProfile",
    "proxyPower",
    "getTabProxyState",
    "toggleTabProxy",
];

/// A decoded control-channel request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Message {
    /// Apply profile `name` if `enabled`, otherwise clear the policy
    ApplyProfile {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        enabled: bool,
    },
    /// Global power switch
    ProxyPower {
        #[serde(default)]
        enabled: bool,
    },
    /// Query the sender tab's override state
    GetTabProxyState,
    /// Flip the sender tab's override; `url` is the page it is showing
    ToggleTabProxy {
        #[serde(default)]
        url: String,
    },
}

impl Message {
    /// Decode a message from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ChannelError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Decode a message from an already-parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ChannelError> {
        let kind = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or(ChannelError::MissingType)?;

        if !MESSAGE_TYPES.contains(&kind) {
            return Err(ChannelError::UnknownType(kind.to_string()));
        }

        Ok(serde_json::from_value(value)?)
    }

    /// The wire `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ApplyProfile { .. } => "applyProfile",
            Self::ProxyPower { .. } => "proxyPower",
            Self::GetTabProxyState => "getTabProxyState",
            Self::ToggleTabProxy { .. } => "toggleTabProxy",
        }
    }
}

/// Reply to a control-channel message. `None` serializes as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(untagged)]
pub enum Response {
    None,
    TabState { enabled: bool },
    Toggled { enabled: bool, reload: bool },
}

impl Response {
    pub fn to_json(&self) -> String {
        // Plain bools and unit variants always serialize
        serde_json::to_string(self).unwrap_or_else(|_| "null".to_string())
    }
}
