//! Habit store adapter.

use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;
use tracing::{info, warn};

use super::properties::{
    checkbox, date_time, multi_select, number, parse_timestamp, read_checkbox, read_date,
    read_multi_select, read_number, read_select, read_title, select, title,
};
use super::{Page, PageBackend, Properties};
use crate::clock::Clock;
use crate::models::habit::{DayPart, Frequency, Habit, NewHabit};
use crate::models::item::Category;
use crate::util::bounded;

const PROP_NAME: &str = "Name";
const PROP_FREQUENCY: &str = "Frequency";
const PROP_CATEGORY: &str = "Category";
const PROP_XP_REWARD: &str = "XP Reward";
const PROP_ACTIVE: &str = "Active";
const PROP_CREATED: &str = "Created";
const PROP_TIMES: &str = "Times";
const PROP_LAST_COMPLETED: &str = "Last Completed";

/// Habits database adapter.
#[derive(Clone)]
pub struct HabitStore {
    backend: Arc<dyn PageBackend>,
    database_id: String,
    timeout: Duration,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
    default_reward: u64,
}

impl HabitStore {
    /// Create an adapter over `database_id`.
    #[must_use]
    pub fn new(
        backend: Arc<dyn PageBackend>,
        database_id: &str,
        timeout: Duration,
        clock: Arc<dyn Clock>,
        offset: FixedOffset,
        default_reward: u64,
    ) -> Self {
        Self {
            backend,
            database_id: database_id.to_owned(),
            timeout,
            clock,
            offset,
            default_reward,
        }
    }

    /// Reference offset used for "completed today" checks.
    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Persist a new active habit. `None` means the write failed.
    pub async fn create_habit(&self, habit: &NewHabit) -> Option<String> {
        let reward = habit.xp_reward.map_or(self.default_reward, u64::from);
        let mut props = Properties::new();
        props.insert(PROP_NAME.into(), title(&habit.name));
        props.insert(PROP_FREQUENCY.into(), select(habit.frequency.label()));
        props.insert(PROP_CATEGORY.into(), select(habit.category.label()));
        #[allow(clippy::cast_precision_loss)]
        let reward = reward as f64;
        props.insert(PROP_XP_REWARD.into(), number(reward));
        props.insert(PROP_ACTIVE.into(), checkbox(true));
        props.insert(PROP_CREATED.into(), date_time(self.clock.now()));
        if !habit.times.is_empty() {
            props.insert(
                PROP_TIMES.into(),
                multi_select(habit.times.iter().map(|part| part.label())),
            );
        }

        match bounded(
            self.timeout,
            "create habit",
            self.backend.create_page(&self.database_id, props),
        )
        .await
        {
            Ok(id) => {
                info!(habit_id = %id, name = %habit.name, "habit created");
                Some(id)
            }
            Err(err) => {
                warn!(%err, name = %habit.name, "habit create failed");
                None
            }
        }
    }

    /// Habits filtered by activity, cadence and day part. The day-part
    /// filter keeps habits that have no times set.
    pub async fn list_habits(
        &self,
        active_only: bool,
        frequency: Option<Frequency>,
        time_of_day: Option<DayPart>,
    ) -> Vec<Habit> {
        let pages = match bounded(
            self.timeout,
            "query habits",
            self.backend.query_database(&self.database_id),
        )
        .await
        {
            Ok(pages) => pages,
            Err(err) => {
                warn!(%err, "habit query failed");
                return Vec::new();
            }
        };

        pages
            .into_iter()
            .filter_map(|page| self.page_to_habit(page))
            .filter(|habit| !active_only || habit.active)
            .filter(|habit| frequency.is_none_or(|f| habit.frequency == f))
            .filter(|habit| time_of_day.is_none_or(|part| habit.scheduled_for(part)))
            .collect()
    }

    /// Record a completion now. Returns whether the write succeeded.
    pub async fn complete_habit(&self, id: &str) -> bool {
        let mut props = Properties::new();
        props.insert(PROP_LAST_COMPLETED.into(), date_time(self.clock.now()));
        match bounded(
            self.timeout,
            "complete habit",
            self.backend.update_page(id, props),
        )
        .await
        {
            Ok(_) => {
                info!(habit_id = %id, "habit completed");
                true
            }
            Err(err) => {
                warn!(%err, habit_id = %id, "habit completion failed");
                false
            }
        }
    }

    /// First active habit whose name matches `name` as a case-insensitive
    /// substring in either direction.
    pub async fn find_by_name(&self, name: &str) -> Option<Habit> {
        self.list_habits(true, None, None)
            .await
            .into_iter()
            .find(|habit| habit.name_matches(name))
    }

    fn page_to_habit(&self, page: Page) -> Option<Habit> {
        let props = &page.properties;
        let name = read_title(props, PROP_NAME).filter(|n| !n.trim().is_empty())?;
        let reward = read_number(props, PROP_XP_REWARD)
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map_or(self.default_reward, whole_number);
        Some(Habit {
            id: page.id,
            name,
            frequency: read_select(props, PROP_FREQUENCY)
                .as_deref()
                .and_then(Frequency::parse)
                .unwrap_or(Frequency::Daily),
            category: Category::from_store(read_select(props, PROP_CATEGORY).as_deref()),
            xp_reward: u32::try_from(reward).unwrap_or(u32::MAX),
            active: read_checkbox(props, PROP_ACTIVE).unwrap_or(true),
            times: read_multi_select(props, PROP_TIMES)
                .iter()
                .filter_map(|raw| DayPart::parse(raw))
                .collect(),
            last_completed_at: parse_timestamp(read_date(props, PROP_LAST_COMPLETED).as_deref()),
        })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_number(n: f64) -> u64 {
    n.round() as u64
}
