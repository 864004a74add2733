//! Device enrichment via user agent parsing.
//!
//! Fills the device part of a visit origin before the session is stored.

use tracker_core::{DeviceInfo, Origin, UNKNOWN};
use woothee::parser::Parser;

/// User agent parser producing [`DeviceInfo`].
///
/// Uses the woothee library for fast UA parsing (~6.8us/parse).
pub struct DeviceEnricher {
    parser: Parser,
}

impl DeviceEnricher {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Parses a user agent. Unrecognized parts stay "unknown".
    pub fn device_info(&self, user_agent: &str) -> DeviceInfo {
        let mut device = DeviceInfo::default();
        if user_agent.is_empty() {
            return device;
        }

        let Some(result) = self.parser.parse(user_agent) else {
            return device;
        };

        let known = |v: &str| !v.is_empty() && v != "UNKNOWN";
        if known(result.name) {
            device.browser = result.name.to_string();
        }
        if known(&result.version) {
            device.browser_version = result.version.to_string();
        }
        if known(result.os) {
            device.os = result.os.to_string();
        }

        // woothee categories: pc, smartphone, mobilephone, crawler, appliance, misc
        device.device_type = match result.category {
            "pc" => "desktop",
            "smartphone" | "mobilephone" => "mobile",
            "crawler" => "bot",
            "appliance" => "other",
            _ => UNKNOWN,
        }
        .to_string();

        device
    }

    /// Fills `origin.device` from `origin.user_agent`.
    pub fn enrich(&self, origin: &mut Origin) {
        origin.device = self.device_info(&origin.user_agent);
    }
}

impl Default for DeviceEnricher {
    fn default() -> Self {
        Self::new()
    }
}
