//! Shared constants used across the application.

use std::time::Duration;

/// User agent sent with forum and generator requests.
pub const BOT_USER_AGENT: &str = "board-persona-bot/0.1";

/// Delay before regenerating a rejected comment.
pub const COMMENT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Pause between the end of one scheduler run and the start of the next.
pub const RESTART_COOLDOWN: Duration = Duration::from_secs(15);

/// How many recent items a random comment target is drawn from.
pub const RANDOM_ITEM_POOL: usize = 10;

/// How many leading trend titles the article prompt highlights.
pub const HIGHLIGHTED_TRENDS: usize = 3;
