//! Slack event normalization and dispatch.
//!
//! Push events (direct messages, file shares) and interactive payloads
//! (button presses) are normalized into [`InboundEvent`]s and handed to
//! [`handle_event`] on their own task so the Socket Mode acknowledgement
//! never waits on a model or workspace call. Authorization happens there,
//! once, for every event kind.

use std::sync::Arc;

use slack_morphism::prelude::{
    SlackBasicChannelInfo, SlackClient, SlackClientEventsUserState, SlackClientHyperHttpsConnector,
    SlackEventCallbackBody, SlackFile, SlackHistoryMessage, SlackInteractionEvent,
    SlackMessageEvent, SlackMessageEventType, SlackPushEventCallback,
};
use tracing::{debug, info, warn};

use crate::app::{handle_event, AppState};
use crate::models::event::{EventKind, FileRef, InboundEvent};
use crate::slack::blocks;
use crate::slack::client::SlackService;

/// Shared state installed as the Socket Mode listener's user state.
pub struct SlackContext {
    /// Application state.
    pub app: Arc<AppState>,
    /// Outbound side of the transport.
    pub slack: Arc<SlackService>,
}

/// Read the installed [`SlackContext`].
pub async fn context(state: &SlackClientEventsUserState) -> Option<Arc<SlackContext>> {
    let guard = state.read().await;
    guard.get_user_state::<Arc<SlackContext>>().cloned()
}

/// Route `event` on its own task.
pub fn dispatch(context: Arc<SlackContext>, event: InboundEvent) {
    tokio::spawn(async move {
        let kind = event.kind.label();
        let outcome = handle_event(&context.app, context.slack.as_ref(), event).await;
        debug!(kind, ?outcome, "event handled");
    });
}

/// Classify a shared file by MIME type.
#[must_use]
pub fn file_event(file: FileRef, caption: Option<&str>) -> EventKind {
    let caption = caption.map(str::to_owned);
    let mime = file.mimetype.to_ascii_lowercase();
    if mime.starts_with("audio/") {
        EventKind::Voice { file }
    } else if mime.starts_with("image/") {
        EventKind::Photo { file, caption }
    } else {
        EventKind::Document { file, caption }
    }
}

fn file_ref(file: &SlackFile) -> Option<FileRef> {
    let url = file
        .url_private_download
        .as_ref()
        .or(file.url_private.as_ref())?
        .to_string();
    Some(FileRef {
        id: file.id.to_string(),
        name: file
            .name
            .clone()
            .or_else(|| file.title.clone())
            .unwrap_or_else(|| "file".into()),
        mimetype: file
            .mimetype
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        url,
    })
}

/// Normalize a message event. Bot echoes, edits and other subtypes yield
/// `None`.
#[must_use]
pub fn normalize_message(message: &SlackMessageEvent) -> Option<InboundEvent> {
    if message.sender.bot_id.is_some() {
        return None;
    }
    match &message.subtype {
        None | Some(SlackMessageEventType::FileShare) => {}
        Some(_) => return None,
    }
    let user_id = message.sender.user.as_ref()?.to_string();
    let channel = message.origin.channel.as_ref()?.to_string();
    let content = message.content.as_ref()?;
    let text = content
        .text
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty());

    let kind = match content.files.as_ref().and_then(|files| files.first()) {
        Some(file) => file_event(file_ref(file)?, text),
        None => EventKind::Text(text?.to_owned()),
    };
    Some(InboundEvent {
        user_id,
        channel,
        kind,
    })
}

/// Handle push events delivered via Socket Mode.
///
/// # Errors
///
/// Never fails; problems are logged.
pub async fn handle_push_event(
    event: SlackPushEventCallback,
    _client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    state: SlackClientEventsUserState,
) -> slack_morphism::UserCallbackResult<()> {
    let SlackEventCallbackBody::Message(message) = &event.event else {
        debug!("non-message push event ignored");
        return Ok(());
    };
    let Some(inbound) = normalize_message(message) else {
        return Ok(());
    };
    let Some(context) = context(&state).await else {
        warn!("slack context not available; dropping message");
        return Ok(());
    };
    dispatch(context, inbound);
    Ok(())
}

/// Keep the pressed message's text but drop its buttons.
async fn retire_buttons(
    channel: Option<&SlackBasicChannelInfo>,
    message: Option<&SlackHistoryMessage>,
    slack: &SlackService,
) {
    let Some(message) = message else { return };
    let chan_id = channel.map(|c| c.id.clone());
    let text = message
        .content
        .text
        .as_deref()
        .unwrap_or("\u{23f3} Processing\u{2026}");

    if let Some(ch) = chan_id {
        let processing_blocks = vec![blocks::text_section(text)];
        let ts = message.origin.ts.clone();
        if let Err(err) = slack.update_message(ch, ts, processing_blocks).await {
            warn!(%err, "failed to retire pressed buttons");
        }
    }
}

/// Handle interactive payloads delivered via Socket Mode.
///
/// The pressed message's buttons are replaced before dispatch so a second
/// tap on the same message does nothing.
///
/// # Errors
///
/// Never fails; problems are logged.
pub async fn handle_interaction(
    event: SlackInteractionEvent,
    _client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    state: SlackClientEventsUserState,
) -> slack_morphism::UserCallbackResult<()> {
    let SlackInteractionEvent::BlockActions(block_event) = &event else {
        info!("unhandled interaction event type");
        return Ok(());
    };
    let Some(context) = context(&state).await else {
        warn!("slack context not available; cannot process interaction");
        return Ok(());
    };
    let user_id = block_event
        .user
        .as_ref()
        .map(|u| u.id.to_string())
        .unwrap_or_default();
    let Some(channel) = block_event.channel.as_ref().map(|c| c.id.to_string()) else {
        warn!("block action without channel; ignoring");
        return Ok(());
    };
    if user_id.is_empty() {
        warn!("block action with empty user ID; ignoring");
        return Ok(());
    }
    let Some(actions) = &block_event.actions else {
        return Ok(());
    };

    if context.app.config.ensure_authorized(&user_id).is_ok() {
        retire_buttons(
            block_event.channel.as_ref(),
            block_event.message.as_ref(),
            &context.slack,
        )
        .await;
    }

    for action in actions {
        let action_id = action.action_id.to_string();
        debug!(action_id, user_id, "dispatching block action");
        dispatch(
            Arc::clone(&context),
            InboundEvent {
                user_id: user_id.clone(),
                channel: channel.clone(),
                kind: EventKind::ButtonPress {
                    action_id,
                    value: action.value.clone(),
                },
            },
        );
    }
    Ok(())
}
