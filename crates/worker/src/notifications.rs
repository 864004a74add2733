//! Owner alerts for visitor activity.

use providers::{EmailMessage, Mailer};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use telemetry::metrics;
use tracing::{info, warn};
use tracker_core::{EndReason, Session};

/// Alert kinds.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    VisitStarted {
        session_id: String,
        location: String,
        isp: String,
        device: String,
        screen_size: String,
        referrer: Option<String>,
    },
    /// First view of a section within a session
    SectionViewed {
        session_id: String,
        section: String,
        location: String,
    },
    /// A chat question the assistant deferred to the owner
    OutOfScopeQuestion {
        session_id: Option<String>,
        question: String,
        response: String,
    },
    SessionEnded {
        session_id: String,
        reason: EndReason,
        location: String,
        duration_secs: i64,
        max_scroll: f64,
        sections: Vec<String>,
        questions: usize,
        analysis: String,
    },
    SystemAlert { message: String, severity: String },
}

impl Notification {
    pub fn visit_started(session: &Session) -> Self {
        let origin = &session.origin;
        Self::VisitStarted {
            session_id: session.id.clone(),
            location: origin.geo.display(),
            isp: origin.geo.isp.clone(),
            device: format!(
                "{} {} on {} ({})",
                origin.device.browser,
                origin.device.browser_version,
                origin.device.os,
                origin.device.device_type
            ),
            screen_size: origin.screen_size.clone(),
            referrer: origin.referrer.clone(),
        }
    }

    pub fn session_ended(session: &Session) -> Self {
        Self::SessionEnded {
            session_id: session.id.clone(),
            reason: session.end_reason.unwrap_or(EndReason::Explicit),
            location: session.origin.geo.display(),
            duration_secs: session.duration().num_seconds(),
            max_scroll: session.max_scroll,
            sections: session.sections_viewed.clone(),
            questions: session.chat.len(),
            analysis: session.analysis.clone().unwrap_or_default(),
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::VisitStarted { .. } => "visit_started",
            Self::SectionViewed { .. } => "section_viewed",
            Self::OutOfScopeQuestion { .. } => "out_of_scope_question",
            Self::SessionEnded { .. } => "session_ended",
            Self::SystemAlert { .. } => "system_alert",
        }
    }

    pub fn subject(&self) -> String {
        match self {
            Self::VisitStarted { location, .. } => format!("New visitor from {}", location),
            Self::SectionViewed { section, location, .. } => {
                format!("Visitor from {} is reading \"{}\"", location, section)
            }
            Self::OutOfScopeQuestion { question, .. } => {
                format!("Question for the call: {}", truncate(question, 60))
            }
            Self::SessionEnded {
                location, reason, ..
            } => format!("Session ended ({}) - {}", reason.as_str(), location),
            Self::SystemAlert { message, severity } => format!("[{}] {}", severity, message),
        }
    }

    pub fn body(&self) -> String {
        match self {
            Self::VisitStarted {
                session_id,
                location,
                isp,
                device,
                screen_size,
                referrer,
            } => format!(
                "Session: {}\nLocation: {}\nISP: {}\nDevice: {}\nScreen: {}\nReferrer: {}",
                session_id,
                location,
                isp,
                device,
                screen_size,
                referrer.as_deref().unwrap_or("direct")
            ),
            Self::SectionViewed {
                session_id,
                section,
                location,
            } => format!(
                "Session: {}\nSection: {}\nLocation: {}",
                session_id, section, location
            ),
            Self::OutOfScopeQuestion {
                session_id,
                question,
                response,
            } => format!(
                "Session: {}\nQuestion: {}\nAssistant reply: {}",
                session_id.as_deref().unwrap_or("none"),
                question,
                response
            ),
            Self::SessionEnded {
                session_id,
                reason,
                location,
                duration_secs,
                max_scroll,
                sections,
                questions,
                analysis,
            } => format!(
                "Session: {}\nEnded by: {}\nLocation: {}\nDuration: {}s\nMax scroll: {:.0}%\nSections: {}\nChat questions: {}\n\nAnalysis:\n{}",
                session_id,
                reason.as_str(),
                location,
                duration_secs,
                max_scroll,
                if sections.is_empty() {
                    "none".to_string()
                } else {
                    sections.join(", ")
                },
                questions,
                analysis
            ),
            Self::SystemAlert { message, severity } => {
                format!("Severity: {}\n{}", severity, message)
            }
        }
    }

    pub fn to_email(&self) -> EmailMessage {
        EmailMessage::new(self.subject(), self.body())
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Notification channel.
#[derive(Clone)]
pub enum NotificationChannel {
    /// Log only (default)
    Log,
    Email(Arc<dyn Mailer>),
}

/// Fan-out of alerts to the configured channels.
///
/// Delivery failures are logged and never reach the caller.
pub struct Notifier {
    channels: Vec<NotificationChannel>,
    last_ledger_errors: AtomicU64,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self {
            channels: vec![NotificationChannel::Log],
            last_ledger_errors: AtomicU64::new(0),
        }
    }

    pub fn with_channel(mut self, channel: NotificationChannel) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn with_mailer(self, mailer: Arc<dyn Mailer>) -> Self {
        self.with_channel(NotificationChannel::Email(mailer))
    }

    /// Send a notification on every channel.
    pub async fn send(&self, notification: Notification) {
        for channel in &self.channels {
            match channel {
                NotificationChannel::Log => {
                    info!(kind = notification.kind(), subject = %notification.subject(), "Notification");
                }
                NotificationChannel::Email(mailer) => {
                    if let Err(e) = mailer.send(notification.to_email()).await {
                        warn!(kind = notification.kind(), error = %e, "Alert email failed");
                    }
                }
            }
        }
    }

    /// Check metrics and send alerts if thresholds are exceeded.
    pub async fn check_and_alert(&self) {
        let snapshot = metrics().snapshot();

        // Only alert on a meaningful sample
        if snapshot.chat_requests >= 10 {
            let failure_rate = snapshot.chat_failures as f64 / snapshot.chat_requests as f64;
            if failure_rate > 0.5 {
                self.send(Notification::SystemAlert {
                    message: format!("Chat failure rate: {:.0}%", failure_rate * 100.0),
                    severity: "warning".to_string(),
                })
                .await;
            }
        }

        let previous = self
            .last_ledger_errors
            .swap(snapshot.ledger_write_errors, Ordering::Relaxed);
        if snapshot.ledger_write_errors > previous {
            self.send(Notification::SystemAlert {
                message: format!(
                    "{} ledger write(s) failed since last check",
                    snapshot.ledger_write_errors - previous
                ),
                severity: "critical".to_string(),
            })
            .await;
        }
    }
}
