//! Runtime configuration structures and loaders.
use std::env;
use std::time::Duration;

use battle_core::BattleConfig;

/// Configuration shared by the scheduler and its command channel.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub battle: BattleConfig,
    /// Capacity of the command channel behind [`crate::StageHandle`].
    pub command_buffer: usize,
    /// How long an interruptible enemy cast allows an out-of-turn tag-in.
    pub parry_window: Duration,
    /// Pause inserted after an automatic substitution.
    pub auto_tag_in_delay: Duration,
    /// Safety stop; a stage that reaches it ends as aborted.
    pub max_turns: u64,
}

impl RuntimeConfig {
    pub const DEFAULT_COMMAND_BUFFER: usize = 32;
    pub const DEFAULT_PARRY_WINDOW: Duration = Duration::from_secs(1);
    pub const DEFAULT_AUTO_TAG_IN_DELAY: Duration = Duration::from_millis(500);
    pub const DEFAULT_MAX_TURNS: u64 = 1000;

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `STAGE_TIMELINE_WINDOW` - Visible timeline length (default: 10, max 15)
    /// - `STAGE_COMMAND_BUFFER` - Command channel capacity (default: 32)
    /// - `STAGE_PARRY_WINDOW_MS` - Parry window in milliseconds (default: 1000)
    /// - `STAGE_AUTO_TAG_DELAY_MS` - Delay after automatic tag-in (default: 500)
    /// - `STAGE_MAX_TURNS` - Turn cap before the stage is aborted (default: 1000)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(window) = read_env::<usize>("STAGE_TIMELINE_WINDOW") {
            config.battle = config.battle.with_timeline_window(window);
        }

        if let Some(capacity) = read_env::<usize>("STAGE_COMMAND_BUFFER") {
            config.command_buffer = capacity.max(1);
        }

        if let Some(ms) = read_env::<u64>("STAGE_PARRY_WINDOW_MS") {
            config.parry_window = Duration::from_millis(ms);
        }

        if let Some(ms) = read_env::<u64>("STAGE_AUTO_TAG_DELAY_MS") {
            config.auto_tag_in_delay = Duration::from_millis(ms);
        }

        if let Some(turns) = read_env::<u64>("STAGE_MAX_TURNS") {
            config.max_turns = turns.max(1);
        }

        config
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            battle: BattleConfig::default(),
            command_buffer: Self::DEFAULT_COMMAND_BUFFER,
            parry_window: Self::DEFAULT_PARRY_WINDOW,
            auto_tag_in_delay: Self::DEFAULT_AUTO_TAG_IN_DELAY,
            max_turns: Self::DEFAULT_MAX_TURNS,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
