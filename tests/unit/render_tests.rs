use chrono::{NaiveDate, TimeZone, Utc};
use life_organizer::clock::utc_offset;
use life_organizer::models::habit::{Frequency, Habit};
use life_organizer::models::item::{Category, Item, ItemStatus, Priority};
use life_organizer::models::xp::XpRecord;
use life_organizer::resolver::render;

fn item(title: &str, category: Category, priority: Option<Priority>) -> Item {
    Item {
        id: format!("id-{title}"),
        title: title.to_owned(),
        category,
        item_type: None,
        status: ItemStatus::Active,
        priority,
        notes: None,
        created_at: None,
        due: None,
        attachment_url: None,
        last_edited_at: None,
    }
}

#[test]
fn item_line_shows_marker_and_category() {
    let line = render::item_line(&item("Write report", Category::Work, Some(Priority::High)));

    assert_eq!(line, "🔴 Write report (Work)");
    assert_eq!(
        render::item_line(&item("Someday", Category::Ideas, None)),
        "⚪ Someday (Ideas)"
    );
}

#[test]
fn grouped_lines_keep_first_seen_category_order() {
    let items = vec![
        item("Gym", Category::Health, Some(Priority::High)),
        item("Report", Category::Work, Some(Priority::Medium)),
        item("Stretch", Category::Health, Some(Priority::Low)),
    ];

    let lines = render::grouped_lines(&items);

    assert_eq!(
        lines,
        vec![
            "*Health:*",
            "  • Gym [High]",
            "  • Stretch [Low]",
            "*Work:*",
            "  • Report [Medium]",
        ]
    );
}

#[test]
fn progress_bar_has_ten_cells() {
    assert_eq!(render::progress_bar(0.0), "░░░░░░░░░░");
    assert_eq!(render::progress_bar(0.55), "█████░░░░░");
    assert_eq!(render::progress_bar(1.7), "██████████");
}

#[test]
fn stats_at_top_level_says_max() {
    let text = render::stats(&XpRecord {
        total_xp: 6000,
        streak_days: 12,
        last_action_date: None,
    });

    assert!(text.contains("*Level 8*: 👑 Legend"), "{text}");
    assert!(text.contains("MAX LEVEL"));
    assert!(text.contains("*Streak*: 12 days 🔥🔥🔥"));
}

#[test]
fn stats_without_streak_sleeps() {
    let text = render::stats(&XpRecord::default());

    assert!(text.contains("0/50 XP"), "{text}");
    assert!(text.contains("0 days 💤"));
}

#[test]
fn weekly_breaks_down_by_category() {
    let items = vec![
        item("a", Category::Work, Some(Priority::High)),
        item("b", Category::Work, Some(Priority::Low)),
        item("c", Category::Finance, Some(Priority::High)),
    ];
    let record = XpRecord {
        total_xp: 160,
        streak_days: 3,
        last_action_date: None,
    };

    let text = render::weekly(&items, &record);

    assert!(text.contains("*Active Tasks:* 3"));
    assert!(text.contains("🔴 High Priority: 2"));
    assert!(text.contains("  • Finance: 1\n  • Work: 2"), "{text}");
    assert!(text.contains("Level 3: Sapling"));
    assert!(text.contains("⭐ 160 XP total"));
}

#[test]
fn habits_list_marks_today() {
    let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
    let habits = vec![
        Habit {
            id: "h1".into(),
            name: "Stretch".into(),
            frequency: Frequency::Daily,
            category: Category::Health,
            xp_reward: 10,
            active: true,
            times: Vec::new(),
            last_completed_at: Some(Utc.with_ymd_and_hms(2026, 3, 10, 7, 0, 0).unwrap()),
        },
        Habit {
            id: "h2".into(),
            name: "Budget".into(),
            frequency: Frequency::Weekly,
            category: Category::Finance,
            xp_reward: 25,
            active: true,
            times: Vec::new(),
            last_completed_at: Some(Utc.with_ymd_and_hms(2026, 3, 9, 7, 0, 0).unwrap()),
        },
    ];

    let text = render::habits(&habits, today, utc_offset());

    assert!(text.starts_with("🔁 *Today's Habits* (1/2)"), "{text}");
    assert!(text.contains("✅ 💪 Stretch (Daily) - 10 XP"));
    assert!(text.contains("⏳ 💰 Budget (Weekly) - 25 XP"));
}

#[test]
fn empty_views_have_friendly_text() {
    let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();

    assert!(render::habits(&[], today, utc_offset()).starts_with("🔁 No habits yet"));
    assert!(render::deadlines(&[]).contains("No upcoming deadlines"));
    assert!(render::completed_today(&[]).starts_with("Nothing finished yet today"));
}

#[test]
fn help_lists_every_command() {
    for command in [
        "/start",
        "/active",
        "/focus",
        "/cancel",
        "/habits",
        "/deadlines",
        "/today",
        "/stats",
        "/weekly",
        "/help",
    ] {
        assert!(render::HELP_TEXT.contains(command), "{command}");
    }
}
