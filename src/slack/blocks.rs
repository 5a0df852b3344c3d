//! Slack Block Kit rendering of outbound replies.

use slack_morphism::prelude::{
    SlackActionBlockElement, SlackActionId, SlackActionsBlock, SlackBlock, SlackBlockButtonElement,
    SlackBlockId, SlackBlockPlainTextOnly, SlackBlockText, SlackSectionBlock,
};

use crate::models::event::{Button, Reply};

/// Slack caps section text at 3000 characters.
pub const SECTION_TEXT_MAX_CHARS: usize = 3000;

/// Slack caps an actions block at 25 elements.
pub const MAX_BUTTONS: usize = 25;

/// Build a markdown section block.
#[must_use]
pub fn text_section(text: &str) -> SlackBlock {
    let text = crate::util::truncate_chars(text, SECTION_TEXT_MAX_CHARS);
    SlackBlock::Section(SlackSectionBlock::new().with_text(SlackBlockText::MarkDown(text.into())))
}

/// Build an actions block with the given buttons.
#[must_use]
pub fn action_buttons(block_id: &str, buttons: &[Button]) -> SlackBlock {
    let elements: Vec<SlackActionBlockElement> = buttons
        .iter()
        .take(MAX_BUTTONS)
        .map(|button| {
            SlackActionBlockElement::Button(
                SlackBlockButtonElement::new(SlackBlockPlainTextOnly::from(button.label.as_str()))
                    .with_action_id(SlackActionId(button.action_id.clone()))
                    .with_value(button.value.clone()),
            )
        })
        .collect();
    SlackBlock::Actions(
        SlackActionsBlock::new(elements).with_block_id(SlackBlockId(block_id.to_owned())),
    )
}

/// Blocks for `reply`; `None` when plain text suffices.
#[must_use]
pub fn reply_blocks(reply: &Reply) -> Option<Vec<SlackBlock>> {
    if reply.buttons.is_empty() {
        return None;
    }
    let block_id = reply
        .buttons
        .first()
        .map_or("actions", |button| button.action_id.as_str());
    Some(vec![
        text_section(&reply.text),
        action_buttons(&format!("{block_id}_block"), &reply.buttons),
    ])
}
