//! Request payloads sent by the tracking beacon and chat widget (camelCase).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationError};

use crate::error::{Error, Result, ValidationErrorCode};
use crate::limits::{MAX_SECTION_ID_LEN, MAX_SECTION_TIMES};
use crate::session::{ActivityUpdate, SectionEvent};

/// `POST /api/track/visit`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VisitRequest {
    /// Browser user agent (falls back to the request header when empty)
    #[serde(default)]
    #[validate(length(max = 512))]
    pub user_agent: String,

    /// "WIDTHxHEIGHT"
    #[serde(default)]
    #[validate(length(max = 32))]
    pub screen_size: String,

    #[validate(length(max = 2048))]
    pub referrer: Option<String>,
}

/// `POST /api/track/activity`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRequest {
    #[validate(length(min = 1, max = 64))]
    pub session_id: String,

    /// Scroll depth in percent
    pub scroll: Option<f64>,

    #[validate(length(min = 1, max = 128))]
    pub section: Option<String>,

    pub section_event: Option<SectionEvent>,
}

impl ActivityRequest {
    pub fn to_update(&self) -> ActivityUpdate {
        ActivityUpdate {
            scroll: self.scroll,
            section: self.section.clone(),
            section_event: self.section_event,
        }
    }
}

/// `POST /api/track/heartbeat` and `POST /api/track/end`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SectionTimesRequest {
    #[validate(length(min = 1, max = 64))]
    pub session_id: String,

    /// Client-computed cumulative dwell time per section, in milliseconds
    #[validate(custom(function = "validate_section_times"))]
    pub section_times: Option<BTreeMap<String, f64>>,
}

impl SectionTimesRequest {
    /// Parses a beacon body regardless of its declared content type.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let request: Self = serde_json::from_slice(bytes).map_err(|e| {
            Error::validation_code(ValidationErrorCode::InvalidFormat, format!("invalid JSON: {}", e))
        })?;
        validate_request(&request)?;
        Ok(request)
    }

    /// Dwell times rounded to whole milliseconds. Negative or non-finite
    /// values are dropped.
    pub fn section_times_ms(&self) -> Option<BTreeMap<String, u64>> {
        self.section_times.as_ref().map(|times| {
            times
                .iter()
                .filter(|(_, ms)| ms.is_finite() && **ms >= 0.0)
                .map(|(section, ms)| (section.clone(), ms.round() as u64))
                .collect()
        })
    }
}

fn validate_section_times(times: &BTreeMap<String, f64>) -> std::result::Result<(), ValidationError> {
    if times.len() > MAX_SECTION_TIMES {
        return Err(ValidationError::new("too_many_sections"));
    }
    if times
        .keys()
        .any(|k| k.is_empty() || k.chars().count() > MAX_SECTION_ID_LEN)
    {
        return Err(ValidationError::new("section_id_length"));
    }
    Ok(())
}

/// `POST /api/chat`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 2000))]
    pub message: String,

    #[validate(length(max = 64))]
    pub session_id: Option<String>,
}

/// Runs derive validations, mapping failures to `VALID_002`.
pub fn validate_request<T: Validate>(request: &T) -> Result<()> {
    request
        .validate()
        .map_err(|e| Error::validation_code(ValidationErrorCode::FieldTooLong, e.to_string()))
}
