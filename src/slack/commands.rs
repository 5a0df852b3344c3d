//! Slack slash command router.

use std::sync::Arc;

use slack_morphism::prelude::{
    SlackClient, SlackClientEventsUserState, SlackClientHyperHttpsConnector, SlackCommandEvent,
    SlackCommandEventResponse, SlackMessageContent, SlackMessageResponseType,
};
use tracing::{info, warn};

use crate::models::event::{EventKind, InboundEvent};
use crate::slack::events::{context, dispatch};

/// Normalize a slash command: strip the slash, keep the remaining text.
#[must_use]
pub fn command_event(
    user_id: &str,
    channel: &str,
    command: &str,
    text: Option<&str>,
) -> InboundEvent {
    InboundEvent {
        user_id: user_id.to_owned(),
        channel: channel.to_owned(),
        kind: EventKind::Command {
            name: command.trim().trim_start_matches('/').to_lowercase(),
            args: text.unwrap_or_default().trim().to_owned(),
        },
    }
}

/// Handle incoming slash commands routed via Socket Mode.
///
/// The command runs on its own task; Slack gets an empty ephemeral
/// acknowledgement and the replies arrive as regular messages.
///
/// # Errors
///
/// Returns an error if the command response cannot be constructed.
pub async fn handle_command(
    event: SlackCommandEvent,
    _client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    state: SlackClientEventsUserState,
) -> slack_morphism::AnyStdResult<SlackCommandEventResponse> {
    info!(command = ?event.command, user = ?event.user_id, "received slash command");

    let inbound = command_event(
        &event.user_id.to_string(),
        &event.channel_id.to_string(),
        &event.command.to_string(),
        event.text.as_deref(),
    );
    match context(&state).await {
        Some(context) => dispatch(context, inbound),
        None => warn!("slack context not available; dropping command"),
    }

    let response = SlackCommandEventResponse {
        content: SlackMessageContent {
            markdown_text: None,
            text: None,
            blocks: None,
            attachments: None,
            upload: None,
            files: None,
            reactions: None,
            metadata: None,
        },
        response_type: Some(SlackMessageResponseType::Ephemeral),
    };

    Ok(response)
}
