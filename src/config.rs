//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::FixedOffset;
use serde::Deserialize;
use tracing::warn;

use crate::clock::reference_offset;
use crate::models::intent::MatchConfidence;
use crate::{AppError, Result};

/// Keychain service holding every credential.
pub const KEYRING_SERVICE: &str = "life-organizer";

/// Environment variable whose comma-separated user IDs extend the allow-list.
pub const ALLOWED_USERS_ENV: &str = "ORGANIZER_ALLOWED_USER_IDS";

/// Secrets loaded at runtime via OS keychain or environment variables,
/// never from the TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// App-level token used for Socket Mode.
    pub slack_app_token: String,
    /// Bot user token used for posting messages.
    pub slack_bot_token: String,
    /// Workspace integration token; absent means local mode.
    pub workspace_token: Option<String>,
    /// Language-model API key; absent means every classification falls back.
    pub llm_api_key: Option<String>,
    /// Speech-to-text API key; absent means every transcription fails.
    pub transcription_api_key: Option<String>,
}

/// Per-user fixed-window rate limiting.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RateLimitConfig {
    /// Events allowed per window.
    #[serde(default = "default_max_events")]
    pub max_events: u32,
    /// Window length.
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
            window_seconds: default_window_seconds(),
        }
    }
}

fn default_max_events() -> u32 {
    20
}

fn default_window_seconds() -> u64 {
    60
}

/// Time budgets (seconds) for external calls.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TimeoutConfig {
    /// Text classification and intent requests.
    #[serde(default = "default_classification_seconds")]
    pub classification_seconds: u64,
    /// Vision requests.
    #[serde(default = "default_vision_seconds")]
    pub vision_seconds: u64,
    /// Speech-to-text requests.
    #[serde(default = "default_transcription_seconds")]
    pub transcription_seconds: u64,
    /// Workspace reads and writes.
    #[serde(default = "default_store_seconds")]
    pub store_seconds: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            classification_seconds: default_classification_seconds(),
            vision_seconds: default_vision_seconds(),
            transcription_seconds: default_transcription_seconds(),
            store_seconds: default_store_seconds(),
        }
    }
}

impl TimeoutConfig {
    /// Classification budget.
    #[must_use]
    pub fn classification(&self) -> Duration {
        Duration::from_secs(self.classification_seconds)
    }

    /// Vision budget.
    #[must_use]
    pub fn vision(&self) -> Duration {
        Duration::from_secs(self.vision_seconds)
    }

    /// Transcription budget.
    #[must_use]
    pub fn transcription(&self) -> Duration {
        Duration::from_secs(self.transcription_seconds)
    }

    /// Workspace budget.
    #[must_use]
    pub fn store(&self) -> Duration {
        Duration::from_secs(self.store_seconds)
    }
}

fn default_classification_seconds() -> u64 {
    30
}

fn default_vision_seconds() -> u64 {
    60
}

fn default_transcription_seconds() -> u64 {
    90
}

fn default_store_seconds() -> u64 {
    30
}

/// OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct LlmConfig {
    /// API root, e.g. `https://api.groq.com/openai/v1`.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Text model.
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Vision-capable model.
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            vision_model: default_vision_model(),
            temperature: default_temperature(),
        }
    }
}

fn default_llm_base_url() -> String {
    "https://api.groq.com/openai/v1".into()
}

fn default_llm_model() -> String {
    "llama-3.3-70b-versatile".into()
}

fn default_vision_model() -> String {
    "meta-llama/llama-4-scout-17b-16e-instruct".into()
}

fn default_temperature() -> f32 {
    0.3
}

/// Whisper-compatible transcription endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TranscriptionConfig {
    /// API root.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Model name.
    #[serde(default = "default_transcription_model")]
    pub model: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_transcription_model(),
        }
    }
}

fn default_transcription_model() -> String {
    "whisper-large-v3".into()
}

/// Workspace (item store) endpoint and database identifiers.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct WorkspaceConfig {
    /// API root.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Pinned API version header.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Items database.
    #[serde(default)]
    pub items_db_id: String,
    /// Manual-triage (brain dump) database.
    #[serde(default)]
    pub triage_db_id: String,
    /// Progress log database.
    #[serde(default)]
    pub progress_db_id: String,
    /// Habits database; habits are disabled when absent.
    #[serde(default)]
    pub habits_db_id: Option<String>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_version: default_api_version(),
            items_db_id: String::new(),
            triage_db_id: String::new(),
            progress_db_id: String::new(),
            habits_db_id: None,
        }
    }
}

fn default_api_base() -> String {
    "https://api.notion.com/v1".into()
}

fn default_api_version() -> String {
    "2022-06-28".into()
}

/// Semantic match acceptance.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct MatchingConfig {
    /// Lowest confidence label accepted from the semantic matcher.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: MatchConfidence,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
        }
    }
}

fn default_min_confidence() -> MatchConfidence {
    MatchConfidence::Medium
}

/// XP granted per action.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RewardConfig {
    /// New item captured.
    #[serde(default = "default_task_added")]
    pub task_added: u64,
    /// Item completed.
    #[serde(default = "default_task_completed")]
    pub task_completed: u64,
    /// Bonus for capturing by voice.
    #[serde(default = "default_voice_note")]
    pub voice_note: u64,
    /// Focus session finished.
    #[serde(default = "default_focus_completed")]
    pub focus_completed: u64,
    /// Habit completion when the habit carries no explicit reward.
    #[serde(default = "default_habit")]
    pub habit_default: u64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            task_added: default_task_added(),
            task_completed: default_task_completed(),
            voice_note: default_voice_note(),
            focus_completed: default_focus_completed(),
            habit_default: default_habit(),
        }
    }
}

fn default_task_added() -> u64 {
    5
}

fn default_task_completed() -> u64 {
    15
}

fn default_voice_note() -> u64 {
    3
}

fn default_focus_completed() -> u64 {
    25
}

fn default_habit() -> u64 {
    25
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/organizer.db")
}

fn default_list_page_size() -> usize {
    10
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Slack user IDs allowed to talk to the bot.
    pub authorized_user_ids: Vec<String>,
    /// Local `SQLite` file for XP snapshots and the offline triage journal.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Reference timezone, in minutes east of UTC.
    #[serde(default)]
    pub timezone_offset_minutes: i32,
    /// Lines per page in paginated lists.
    #[serde(default = "default_list_page_size")]
    pub list_page_size: usize,
    /// Per-user rate limiting.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// External call budgets.
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    /// Language model endpoint.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Transcription endpoint.
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    /// Workspace endpoint and databases.
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    /// Semantic match acceptance.
    #[serde(default)]
    pub matching: MatchingConfig,
    /// XP rewards.
    #[serde(default)]
    pub rewards: RewardConfig,
    /// Runtime secrets (populated by [`GlobalConfig::load_credentials`]).
    #[serde(skip)]
    pub credentials: Credentials,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string, merge the environment
    /// allow-list, and validate.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.merge_env_allow_list();
        config.validate()?;
        Ok(config)
    }

    /// Load credentials from OS keychain with env-var fallback.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if either Slack token is missing from both
    /// the keychain and the environment.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.credentials = Credentials {
            slack_app_token: load_credential("slack_app_token", "SLACK_APP_TOKEN")
                .await?
                .ok_or_else(|| missing("slack_app_token", "SLACK_APP_TOKEN"))?,
            slack_bot_token: load_credential("slack_bot_token", "SLACK_BOT_TOKEN")
                .await?
                .ok_or_else(|| missing("slack_bot_token", "SLACK_BOT_TOKEN"))?,
            workspace_token: load_credential("workspace_token", "WORKSPACE_TOKEN").await?,
            llm_api_key: load_credential("llm_api_key", "LLM_API_KEY").await?,
            transcription_api_key: load_credential(
                "transcription_api_key",
                "TRANSCRIPTION_API_KEY",
            )
            .await?,
        };
        Ok(())
    }

    /// Validate that a Slack user is on the allow-list.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` if the user is not in the allowed list.
    pub fn ensure_authorized(&self, user_id: &str) -> Result<()> {
        if self.authorized_user_ids.iter().any(|id| id == user_id) {
            Ok(())
        } else {
            Err(AppError::Unauthorized("user is not authorized".into()))
        }
    }

    /// Reference timezone.
    #[must_use]
    pub fn reference_offset(&self) -> FixedOffset {
        reference_offset(self.timezone_offset_minutes)
    }

    /// Whether a habits database is configured.
    #[must_use]
    pub fn habits_enabled(&self) -> bool {
        self.workspace
            .habits_db_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
    }

    fn merge_env_allow_list(&mut self) {
        let Ok(raw) = env::var(ALLOWED_USERS_ENV) else {
            return;
        };
        for id in raw.split(',').map(str::trim).filter(|id| !id.is_empty()) {
            if !self.authorized_user_ids.iter().any(|known| known == id) {
                self.authorized_user_ids.push(id.to_owned());
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.authorized_user_ids.is_empty() {
            return Err(AppError::Config(
                "authorized_user_ids must not be empty".into(),
            ));
        }

        if self.rate_limit.max_events == 0 || self.rate_limit.window_seconds == 0 {
            return Err(AppError::Config(
                "rate_limit values must be greater than zero".into(),
            ));
        }

        let timeouts = &self.timeouts;
        if [
            timeouts.classification_seconds,
            timeouts.vision_seconds,
            timeouts.transcription_seconds,
            timeouts.store_seconds,
        ]
        .contains(&0)
        {
            return Err(AppError::Config(
                "timeouts must be greater than zero".into(),
            ));
        }

        if self.timezone_offset_minutes.abs() >= 1440 {
            return Err(AppError::Config(
                "timezone_offset_minutes must be within one day".into(),
            ));
        }

        if self.list_page_size == 0 {
            return Err(AppError::Config(
                "list_page_size must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

fn missing(keyring_key: &str, env_key: &str) -> AppError {
    AppError::Config(format!(
        "credential {keyring_key} not found in keychain or {env_key} env var"
    ))
}

/// Load a single credential from OS keychain with env-var fallback.
///
/// Returns `Ok(None)` when neither source has a non-empty value.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<Option<String>> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(Some(value)),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(keyring::Error::NoEntry) => {}
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    Ok(env::var(env_key)
        .ok()
        .filter(|value| !value.trim().is_empty()))
}
