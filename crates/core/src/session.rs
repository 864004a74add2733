//! Visitor session model.
//!
//! A [`Session`] is created when a page registers a visit and is mutated by
//! activity, heartbeat and chat calls until it is finalized. All mutators take
//! the current time explicitly so callers (and tests) control the clock.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Placeholder used when an origin attribute cannot be resolved.
pub const UNKNOWN: &str = "unknown";

/// Geolocation resolved from the visitor's network address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    pub city: String,
    pub region: String,
    pub country: String,
    pub isp: String,
}

impl GeoLocation {
    /// Placeholder location used when lookup fails or is skipped.
    pub fn unknown() -> Self {
        Self {
            city: UNKNOWN.to_string(),
            region: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
            isp: UNKNOWN.to_string(),
        }
    }

    /// Human-readable "City, Region, Country".
    pub fn display(&self) -> String {
        format!("{}, {}, {}", self.city, self.region, self.country)
    }
}

impl Default for GeoLocation {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Device details parsed from the user agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub browser: String,
    pub browser_version: String,
    pub os: String,
    /// desktop, mobile, bot, other or unknown
    pub device_type: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            browser: UNKNOWN.to_string(),
            browser_version: UNKNOWN.to_string(),
            os: UNKNOWN.to_string(),
            device_type: UNKNOWN.to_string(),
        }
    }
}

/// Where a visit came from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Origin {
    pub ip: Option<String>,
    #[serde(default)]
    pub geo: GeoLocation,
    pub user_agent: String,
    pub screen_size: String,
    pub referrer: Option<String>,
    #[serde(default)]
    pub device: DeviceInfo,
}

impl Origin {
    /// Host part of the referrer, if it is an absolute URL.
    pub fn referrer_host(&self) -> Option<String> {
        let referrer = self.referrer.as_deref()?;
        url::Url::parse(referrer)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

/// One question/answer exchange from the chat widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub question: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

/// Direction of a section visibility change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionEvent {
    Enter,
    Exit,
}

/// Incremental engagement update from the tracking beacon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityUpdate {
    /// Scroll depth in percent.
    pub scroll: Option<f64>,
    pub section: Option<String>,
    /// Without an event the section is only marked as viewed.
    pub section_event: Option<SectionEvent>,
}

/// What changed after applying an [`ActivityUpdate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityOutcome {
    /// Set when the update introduced a section not seen before.
    pub first_view: Option<String>,
    pub scroll_increased: bool,
}

/// Why a session was finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    /// The page sent an explicit end (unload).
    Explicit,
    /// The sweeper closed it after the idle timeout.
    Inactivity,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Inactivity => "inactivity",
        }
    }
}

/// A visitor session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub origin: Origin,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Highest scroll depth observed, in percent.
    pub max_scroll: f64,
    /// Distinct sections in first-seen order.
    #[serde(default)]
    pub sections_viewed: Vec<String>,
    /// Dwell time per section in milliseconds: the larger of the measured
    /// and the client-reported total.
    #[serde(default)]
    pub section_times: BTreeMap<String, u64>,
    /// Dwell measured from closed enter/exit intervals.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub measured_times: BTreeMap<String, u64>,
    /// Latest cumulative totals sent by the client.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub reported_times: BTreeMap<String, u64>,
    /// Start of the currently open dwell interval per section.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub open_sections: BTreeMap<String, DateTime<Utc>>,
    #[serde(default)]
    pub chat: Vec<ChatTurn>,
    pub analysis: Option<String>,
    pub end_reason: Option<EndReason>,
    pub active: bool,
}

impl Session {
    /// Generates a time-prefixed unique session identifier.
    pub fn generate_id(now: DateTime<Utc>) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{:x}-{}", now.timestamp_millis(), &suffix[..12])
    }

    /// Creates a new live session.
    pub fn new(id: impl Into<String>, origin: Origin, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            origin,
            started_at: now,
            last_activity_at: now,
            ended_at: None,
            max_scroll: 0.0,
            sections_viewed: Vec::new(),
            section_times: BTreeMap::new(),
            measured_times: BTreeMap::new(),
            reported_times: BTreeMap::new(),
            open_sections: BTreeMap::new(),
            chat: Vec::new(),
            analysis: None,
            end_reason: None,
            active: true,
        }
    }

    /// Refreshes the last-activity timestamp. Never moves it backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_activity_at {
            self.last_activity_at = now;
        }
    }

    /// Records a scroll depth. Returns true if the maximum increased.
    pub fn record_scroll(&mut self, percent: f64) -> bool {
        if !percent.is_finite() {
            return false;
        }
        let percent = percent.clamp(0.0, 100.0);
        if percent > self.max_scroll {
            self.max_scroll = percent;
            true
        } else {
            false
        }
    }

    /// Adds a section to the viewed set. Returns true if it was new.
    pub fn view_section(&mut self, section: &str) -> bool {
        if self.sections_viewed.iter().any(|s| s == section) {
            return false;
        }
        self.sections_viewed.push(section.to_string());
        true
    }

    /// Opens the dwell interval for a section. No-op if already open.
    pub fn enter_section(&mut self, section: &str, now: DateTime<Utc>) {
        self.open_sections.entry(section.to_string()).or_insert(now);
    }

    /// Closes the dwell interval for a section and accumulates its length.
    ///
    /// Returns the elapsed milliseconds, or `None` if no interval was open.
    pub fn exit_section(&mut self, section: &str, now: DateTime<Utc>) -> Option<u64> {
        let entered_at = self.open_sections.remove(section)?;
        let elapsed = (now - entered_at).num_milliseconds().max(0) as u64;
        *self.measured_times.entry(section.to_string()).or_insert(0) += elapsed;
        self.refresh_section_time(section);
        Some(elapsed)
    }

    /// Closes every open dwell interval at `now`.
    pub fn close_open_sections(&mut self, now: DateTime<Utc>) {
        let open: Vec<String> = self.open_sections.keys().cloned().collect();
        for section in open {
            self.exit_section(&section, now);
        }
    }

    /// Merges dwell totals computed by the client.
    ///
    /// Client values are cumulative, so each section keeps the larger
    /// report. Reports and measured intervals cover the same time and are
    /// never added together.
    pub fn merge_section_times(&mut self, times: &BTreeMap<String, u64>) {
        for (section, &ms) in times {
            let reported = self.reported_times.entry(section.clone()).or_insert(0);
            *reported = (*reported).max(ms);
            self.refresh_section_time(section);
        }
    }

    fn refresh_section_time(&mut self, section: &str) {
        let measured = self.measured_times.get(section).copied().unwrap_or(0);
        let reported = self.reported_times.get(section).copied().unwrap_or(0);
        let total = self.section_times.entry(section.to_string()).or_insert(0);
        *total = (*total).max(measured.max(reported));
    }

    /// Applies an engagement update.
    pub fn apply_activity(&mut self, update: &ActivityUpdate, now: DateTime<Utc>) -> ActivityOutcome {
        self.touch(now);

        let mut outcome = ActivityOutcome::default();
        if let Some(scroll) = update.scroll {
            outcome.scroll_increased = self.record_scroll(scroll);
        }

        if let Some(section) = update.section.as_deref() {
            match update.section_event {
                Some(SectionEvent::Exit) => {
                    self.exit_section(section, now);
                }
                event => {
                    if self.view_section(section) {
                        outcome.first_view = Some(section.to_string());
                    }
                    if event == Some(SectionEvent::Enter) {
                        self.enter_section(section, now);
                    }
                }
            }
        }

        outcome
    }

    /// Appends a chat exchange to the transcript.
    pub fn record_chat(&mut self, question: &str, response: &str, now: DateTime<Utc>) {
        self.touch(now);
        self.chat.push(ChatTurn {
            question: question.to_string(),
            response: response.to_string(),
            timestamp: now,
        });
    }

    /// Time since the last activity.
    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_activity_at
    }

    /// True when the session is live and idle for longer than `timeout`.
    pub fn is_idle(&self, now: DateTime<Utc>, timeout: std::time::Duration) -> bool {
        let timeout = Duration::from_std(timeout).unwrap_or(Duration::MAX);
        self.active && self.idle_for(now) > timeout
    }

    /// Marks the session ended. The end time is set at most once.
    ///
    /// Open dwell intervals close at `now` for an explicit end. An idle
    /// visitor left at the last activity, so inactivity closes them there.
    /// Returns false if the session had already ended.
    pub fn finish(&mut self, now: DateTime<Utc>, reason: EndReason) -> bool {
        if self.ended_at.is_some() {
            return false;
        }
        let close_at = match reason {
            EndReason::Explicit => now,
            EndReason::Inactivity => self.last_activity_at.min(now),
        };
        self.close_open_sections(close_at);
        self.ended_at = Some(now);
        self.end_reason = Some(reason);
        self.active = false;
        true
    }

    /// Session length: start to end, or to last activity while live.
    pub fn duration(&self) -> Duration {
        self.ended_at.unwrap_or(self.last_activity_at) - self.started_at
    }

    /// Total dwell time across sections in milliseconds.
    pub fn total_dwell_ms(&self) -> u64 {
        self.section_times.values().sum()
    }
}
