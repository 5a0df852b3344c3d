//! Normalized inbound events and outbound replies exchanged with the chat
//! front end.

use serde::{Deserialize, Serialize};

/// Reference to a file hosted by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Platform file identifier.
    pub id: String,
    /// Original file name.
    pub name: String,
    /// MIME type reported by the platform.
    pub mimetype: String,
    /// Authenticated download URL.
    pub url: String,
}

/// What the user sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Plain text message.
    Text(String),
    /// Audio clip.
    Voice {
        /// The audio file.
        file: FileRef,
    },
    /// Image.
    Photo {
        /// The image file.
        file: FileRef,
        /// Optional caption.
        caption: Option<String>,
    },
    /// Any other file.
    Document {
        /// The file.
        file: FileRef,
        /// Optional caption.
        caption: Option<String>,
    },
    /// Interactive button press.
    ButtonPress {
        /// Button action identifier.
        action_id: String,
        /// Button payload.
        value: Option<String>,
    },
    /// Slash command, without the leading slash.
    Command {
        /// Command name.
        name: String,
        /// Remaining text.
        args: String,
    },
}

impl EventKind {
    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Voice { .. } => "voice",
            Self::Photo { .. } => "photo",
            Self::Document { .. } => "document",
            Self::ButtonPress { .. } => "button",
            Self::Command { .. } => "command",
        }
    }
}

/// One normalized inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Platform user identifier.
    pub user_id: String,
    /// Conversation the reply goes to.
    pub channel: String,
    /// Payload.
    pub kind: EventKind,
}

impl InboundEvent {
    /// Convenience constructor for a text message.
    #[must_use]
    pub fn text(user_id: &str, channel: &str, text: &str) -> Self {
        Self {
            user_id: user_id.to_owned(),
            channel: channel.to_owned(),
            kind: EventKind::Text(text.to_owned()),
        }
    }
}

/// A clickable button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Visible label.
    pub label: String,
    /// Action identifier routed back as [`EventKind::ButtonPress`].
    pub action_id: String,
    /// Payload echoed back on press.
    pub value: String,
}

impl Button {
    /// Build a button.
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        action_id: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            action_id: action_id.into(),
            value: value.into(),
        }
    }
}

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Message body (mrkdwn).
    pub text: String,
    /// Buttons rendered under the message.
    pub buttons: Vec<Button>,
}

impl Reply {
    /// Plain text reply.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    /// Reply with buttons.
    #[must_use]
    pub fn with_buttons(text: impl Into<String>, buttons: Vec<Button>) -> Self {
        Self {
            text: text.into(),
            buttons,
        }
    }
}
