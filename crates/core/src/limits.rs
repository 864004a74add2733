//! Size limits and tracking thresholds.
//!
//! The `#[validate]` derive macro requires literal values in attributes,
//! so field limits are duplicated there. Keep both in sync when modifying.

use std::time::Duration;

// === Request Limits ===

/// Maximum request body accepted by the tracking and chat endpoints (64KB).
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Chat message max length (chars).
pub const MAX_CHAT_MESSAGE_LEN: usize = 2000;

/// User agent string max length.
/// Browser UAs: 100-300 typical, 500+ with extensions.
pub const MAX_USER_AGENT_LEN: usize = 512;

/// Referrer URL max length.
/// Matches HTTP Referer header limit.
pub const MAX_REFERRER_LEN: usize = 2048;

/// Screen size string max length ("1920x1080").
pub const MAX_SCREEN_SIZE_LEN: usize = 32;

/// Section identifier max length.
pub const MAX_SECTION_ID_LEN: usize = 128;

/// Session identifier max length.
pub const MAX_SESSION_ID_LEN: usize = 64;

/// Admin access code max length.
pub const MAX_ADMIN_CODE_LEN: usize = 256;

/// Maximum number of sections accepted in one `sectionTimes` map.
pub const MAX_SECTION_TIMES: usize = 64;

// === Tracking Thresholds ===

/// Idle time after which the sweeper finalizes a session.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// How often the sweeper polls live sessions.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Admin token lifetime.
pub const ADMIN_TOKEN_TTL: Duration = Duration::from_secs(12 * 60 * 60);
