//! Scroll and reveal geometry for the landing page.
//!
//! Pure functions of scroll position and layout. The browser recomputes a
//! [`ScrollFrame`] on a throttled scroll handler and on resize.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Header switches to its compact style past this offset (px).
pub const HEADER_SCROLL_THRESHOLD: f64 = 20.0;

/// Offset added to the scroll position when picking the current section (px).
pub const SECTION_PROBE_OFFSET: f64 = 150.0;

/// Section reported when no section contains the probe position.
pub const DEFAULT_SECTION: &str = "hero";

/// Elements reveal once their top is above this fraction of the viewport.
pub const REVEAL_VIEWPORT_RATIO: f64 = 0.88;

/// Height of the fixed header plus section nav (px).
pub const ANCHOR_HEADER_OFFSET: f64 = 100.0;

/// Scroll handler cap (~60 Hz).
pub const SCROLL_THROTTLE: Duration = Duration::from_millis(16);

/// Resize handler cap.
pub const RESIZE_THROTTLE: Duration = Duration::from_millis(100);

/// Vertical extent of a page section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionBox {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

impl SectionBox {
    pub fn new(id: impl Into<String>, top: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            top,
            height,
        }
    }

    fn contains(&self, y: f64) -> bool {
        y >= self.top && y < self.top + self.height
    }
}

/// Scroll progress in whole percent (0-100).
pub fn scroll_progress(scroll_y: f64, document_height: f64, viewport_height: f64) -> u8 {
    let scrollable = document_height - viewport_height;
    if scrollable <= 0.0 {
        return 0;
    }
    ((scroll_y / scrollable) * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Whether the header shows its scrolled state.
pub fn header_scrolled(scroll_y: f64) -> bool {
    scroll_y > HEADER_SCROLL_THRESHOLD
}

/// The first section containing `scroll_y + SECTION_PROBE_OFFSET`.
pub fn current_section(sections: &[SectionBox], scroll_y: f64) -> &str {
    let probe = scroll_y + SECTION_PROBE_OFFSET;
    sections
        .iter()
        .find(|s| s.contains(probe))
        .map(|s| s.id.as_str())
        .unwrap_or(DEFAULT_SECTION)
}

/// Whether an element whose top sits at `element_top` (viewport-relative)
/// should be revealed.
pub fn should_reveal(element_top: f64, viewport_height: f64) -> bool {
    element_top < viewport_height * REVEAL_VIEWPORT_RATIO
}

/// Horizontal scroll that centers a nav item in the section nav strip.
pub fn nav_scroll_target(item_left: f64, item_width: f64, visible_width: f64) -> f64 {
    (item_left - visible_width / 2.0 + item_width / 2.0).max(0.0)
}

/// Scroll position for an in-page anchor, leaving room for the fixed header.
pub fn anchor_scroll_target(target_top: f64) -> f64 {
    target_top - ANCHOR_HEADER_OFFSET
}

/// Page geometry at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub scroll_y: f64,
    pub viewport_height: f64,
    pub document_height: f64,
    pub sections: Vec<SectionBox>,
}

/// Derived presentation state for one scroll position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollFrame {
    pub progress: u8,
    pub header_scrolled: bool,
    pub current_section: String,
}

impl ScrollFrame {
    pub fn compute(viewport: &Viewport) -> Self {
        Self {
            progress: scroll_progress(
                viewport.scroll_y,
                viewport.document_height,
                viewport.viewport_height,
            ),
            header_scrolled: header_scrolled(viewport.scroll_y),
            current_section: current_section(&viewport.sections, viewport.scroll_y).to_string(),
        }
    }
}

/// Leading-edge throttle: the first call runs, later calls within the
/// interval are dropped.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_run: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    /// Returns true if a call at `now` should run.
    pub fn try_run(&mut self, now: Instant) -> bool {
        match self.last_run {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_run = Some(now);
                true
            }
        }
    }
}
