//! Prompt templates.

use std::fmt::Write as _;

use super::AttachmentFlags;
use crate::models::item::{Item, Priority};

const CATEGORIZE: &str = r#"You are an assistant helping someone with ADHD organize their life.
Analyze the message below and categorize it.

Categories:
- Health: fitness, nutrition, skincare, sleep, medical
- Study: university courses, exams, assignments, learning materials
- Personal Projects: coding projects, side businesses, entrepreneurship
- Skills: learning new skills (instruments, chess, cooking, drawing)
- Creative: content creation, streaming, video editing, art, music
- Shopping: things to buy, product research
- Ideas: random thoughts, future possibilities, things to explore
- Work: job and career
- Finance: money, bills, budgeting
- Social: friends, family, events
- Personal: anything personal that fits nowhere else

Types:
- Task: something to do
- Goal: something to achieve
- Idea: something to consider or explore
- Resource: useful information, link or reference

Priority (urgency and importance):
- High: deadlines, health issues, critical tasks
- Medium: personal projects, skill development
- Low: ideas, shopping, exploration

Only set "due_date" when the message states a date or time explicitly.
Use ISO 8601 (YYYY-MM-DD or YYYY-MM-DDTHH:MM).

Respond with JSON only:
{
  "category": "category name",
  "type": "type name",
  "priority": "High|Medium|Low",
  "title": "short title (max 50 chars)",
  "summary": "brief summary of the content",
  "suggested_action": "what to do with this (optional)",
  "due_date": null
}

Message:
"#;

const MANAGEMENT: &str = r#"Decide whether the message below is an instruction to manage EXISTING items
rather than new content to save.

Intents:
- delete: remove an item ("delete the gym task", "remove milk")
- complete: mark an item done ("mark gym as done", "finished the report")
- update_priority: change priority ("make the report high priority")
- query: list items ("show my study tasks", "what's on my list")
- none: anything else, including new tasks, ideas and notes

Respond with JSON only:
{
  "intent": "delete|complete|update_priority|query|none",
  "target": "words identifying the item, or empty",
  "category": "category to list for query, or null",
  "new_priority": "High|Medium|Low or null"
}

Message:
"#;

const HABIT: &str = r#"Decide whether the message below is about a recurring HABIT.

Intents:
- create_habit: the user wants to start tracking something recurring
  ("remind me to drink water every day", "new habit: skincare morning and evening")
- complete_habit: the user reports doing an existing habit ("did my skincare")
- none: anything else

Frequencies: Daily, Twice Daily, Weekly, Monthly.
Times: Morning, Afternoon, Evening.

Respond with JSON only:
{
  "intent": "create_habit|complete_habit|none",
  "habit_name": "short habit name",
  "frequency": "Daily",
  "category": "Health",
  "times": [],
  "xp_reward": null
}

Message:
"#;

/// Categorization prompt.
#[must_use]
pub fn categorize(text: &str, flags: AttachmentFlags) -> String {
    let mut prompt = format!("{CATEGORIZE}{text}");
    if flags.has_image {
        prompt.push_str("\n\n[Note: This message includes an image]");
    }
    if flags.has_file {
        prompt.push_str("\n\n[Note: This message includes a file/document]");
    }
    prompt
}

/// Management intent prompt.
#[must_use]
pub fn management_intent(text: &str) -> String {
    format!("{MANAGEMENT}{text}")
}

/// Habit intent prompt.
#[must_use]
pub fn habit_intent(text: &str) -> String {
    format!("{HABIT}{text}")
}

/// Vision prompt.
#[must_use]
pub fn describe_image(caption: Option<&str>) -> String {
    format!(
        r#"Analyze this image and determine what it is about.

Caption (if provided): {}

Respond with JSON only:
{{
  "description": "what is in the image",
  "category": "Health/Study/Personal Projects/Skills/Creative/Shopping/Ideas/Work/Finance/Social/Personal",
  "suggested_title": "short title for this item",
  "priority": "High|Medium|Low",
  "suggested_action": "what to do with this"
}}"#,
        caption.unwrap_or("")
    )
}

/// Numbered-list prompt asking which item `target` refers to.
#[must_use]
pub fn match_task(target: &str, candidates: &[Item]) -> String {
    let mut list = String::new();
    for (i, item) in candidates.iter().enumerate() {
        let priority = item.priority.map_or("None", Priority::label);
        let _ = writeln!(
            list,
            "{}. {} [{}] ({})",
            i + 1,
            item.title,
            priority,
            item.category
        );
    }
    format!(
        r#"The user referred to a task as: "{target}"

Their active tasks:
{list}
Which task do they mean? Consider synonyms, abbreviations and other languages.
If none of them fits, answer with index 0. Do not guess.

Respond with JSON only:
{{"index": 0, "confidence": "high|medium|low"}}"#
    )
}
