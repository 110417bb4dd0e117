// SPDX-License-Identifier: GPL-3.0-only

//! Control channel between the host (toolbar popup, background page) and
//! the keyboard session.
//!
//! Messages are JSON objects tagged by `action`:
//!
//! - `getStatus` → `{"enabled": bool, "success": true}`
//! - `enableKeyboard` / `disableKeyboard` → `{"success": true}`
//! - `showKeyboard` → `{"success": bool}`, false with no tracked field or
//!   while disabled
//!
//! Requests travel over a bounded `futures` channel; each carries a oneshot
//! sender for its reply.

use futures::SinkExt;
use futures::channel::{mpsc, oneshot};
use serde::{Deserialize, Serialize};

/// Requests accepted by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum HostMessage {
    GetStatus,
    EnableKeyboard,
    DisableKeyboard,
    ShowKeyboard,
}

/// Reply to a [`HostMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HostResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    pub success: bool,
}

impl HostResponse {
    #[must_use]
    pub fn success(success: bool) -> Self {
        Self {
            enabled: None,
            success,
        }
    }

    #[must_use]
    pub fn status(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            success: true,
        }
    }
}

/// A message paired with the channel its reply goes back on.
#[derive(Debug)]
pub struct HostRequest {
    pub message: HostMessage,
    pub reply: oneshot::Sender<HostResponse>,
}

impl HostRequest {
    /// Sends the reply; a dropped requester is only logged.
    pub fn respond(self, response: HostResponse) {
        if self.reply.send(response).is_err() {
            tracing::debug!("Host dropped its {:?} request before the reply", self.message);
        }
    }
}

/// Errors seen by a host talking to the session.
#[derive(Debug)]
pub enum HostError {
    /// The session is gone.
    ChannelClosed,
    /// The session dropped the request without replying.
    NoReply,
    /// The JSON request could not be parsed.
    Malformed(serde_json::Error),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::ChannelClosed => write!(f, "keyboard session is not running"),
            HostError::NoReply => write!(f, "keyboard session dropped the request"),
            HostError::Malformed(e) => write!(f, "malformed host message: {}", e),
        }
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HostError::Malformed(e) => Some(e),
            _ => None,
        }
    }
}

/// Creates a host client and the receiving end for the session.
#[must_use]
pub fn channel(buffer: usize) -> (HostClient, mpsc::Receiver<HostRequest>) {
    let (tx, rx) = mpsc::channel(buffer);
    (HostClient { tx }, rx)
}

/// Sending side of the control channel.
#[derive(Debug, Clone)]
pub struct HostClient {
    tx: mpsc::Sender<HostRequest>,
}

impl HostClient {
    /// Sends a message and waits for the session's reply.
    pub async fn send(&mut self, message: HostMessage) -> Result<HostResponse, HostError> {
        let (reply, response) = oneshot::channel();
        tracing::debug!("Host: {:?}", message);
        self.tx
            .send(HostRequest { message, reply })
            .await
            .map_err(|_| HostError::ChannelClosed)?;
        response.await.map_err(|_| HostError::NoReply)
    }

    /// Sends a JSON-encoded message and returns the JSON reply.
    pub async fn send_json(&mut self, json: &str) -> Result<String, HostError> {
        let message: HostMessage = serde_json::from_str(json).map_err(HostError::Malformed)?;
        let response = self.send(message).await?;
        serde_json::to_string(&response).map_err(HostError::Malformed)
    }

    pub async fn get_status(&mut self) -> Result<bool, HostError> {
        let response = self.send(HostMessage::GetStatus).await?;
        Ok(response.enabled.unwrap_or(true))
    }

    pub async fn set_enabled(&mut self, enabled: bool) -> Result<bool, HostError> {
        let message = if enabled {
            HostMessage::EnableKeyboard
        } else {
            HostMessage::DisableKeyboard
        };
        Ok(self.send(message).await?.success)
    }

    pub async fn show_keyboard(&mut self) -> Result<bool, HostError> {
        Ok(self.send(HostMessage::ShowKeyboard).await?.success)
    }
}
