//! Test fixtures and payload generators.

use serde_json::{json, Value};
use tracker_core::GeoLocation;

pub const CHROME_MAC_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Public documentation address used as the visitor's IP.
pub const VISITOR_IP: &str = "203.0.113.25";

/// Address inside the excluded office network.
pub const OFFICE_IP: &str = "192.0.2.40";
pub const OFFICE_NETWORK: &str = "192.0.2.0/24";

pub const ADMIN_CODE: &str = "open-sesame";

pub const IN_SCOPE_REPLY: &str = "BMAD stands for Brief, Map, Architect, Develop, Deploy.";
pub const OUT_OF_SCOPE_REPLY: &str =
    "Great question! I'm noting it so it can be answered in detail during the call. 📝";
pub const ANALYSIS_REPLY: &str = "Focused visitor, spent most time on pricing.";

pub fn toronto() -> GeoLocation {
    GeoLocation {
        city: "Toronto".into(),
        region: "Ontario".into(),
        country: "Canada".into(),
        isp: "Example Telecom".into(),
    }
}

pub fn visit_payload() -> Value {
    json!({
        "userAgent": CHROME_MAC_UA,
        "screenSize": "1440x900",
        "referrer": "https://www.linkedin.com/feed/"
    })
}

pub fn scroll_payload(session_id: &str, scroll: f64) -> Value {
    json!({ "sessionId": session_id, "scroll": scroll })
}

pub fn section_payload(session_id: &str, section: &str, event: Option<&str>) -> Value {
    match event {
        Some(event) => json!({ "sessionId": session_id, "section": section, "sectionEvent": event }),
        None => json!({ "sessionId": session_id, "section": section }),
    }
}

pub fn end_payload(session_id: &str) -> Value {
    json!({ "sessionId": session_id })
}

pub fn chat_payload(message: &str, session_id: Option<&str>) -> Value {
    match session_id {
        Some(id) => json!({ "message": message, "sessionId": id }),
        None => json!({ "message": message }),
    }
}
