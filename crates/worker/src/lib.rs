//! Session tracking and background workers for the landing engine.
//!
//! - Tracker (visit → activity/heartbeat → end, inactivity sweep)
//! - Chat relay (LLM replies, question log)
//! - Enrichment (device info from the user agent)
//! - Notifications (owner alerts)
//! - Scheduler (sweeper, metrics log, alert checks)

pub mod chat;
pub mod config;
pub mod enrichment;
pub mod notifications;
pub mod prompts;
pub mod scheduler;
pub mod tracker;

pub use chat::{ChatRelay, ChatReply};
pub use config::*;
pub use enrichment::DeviceEnricher;
pub use notifications::{Notification, NotificationChannel, Notifier};
pub use scheduler::*;
pub use tracker::*;
