//! LLM prompts for the chat relay and session analysis.

use tracker_core::Session;

/// Default chat policy preamble. `{marker}` is replaced with the
/// out-of-scope marker.
const CHAT_POLICY: &str = "You are the assistant for the commercial proposal presented on this page.

STRICT RULES:
1. Only answer questions that clarify the content of the proposal.
2. Be concise, professional and warm.
3. If the question is IN-SCOPE (clarifies the document), answer clearly.
4. If the question is OUT-OF-SCOPE (business specifics, precise technical details, anything not in the document), reply:
   \"Great question! I'm noting it so it can be answered in detail during the call. {marker}\"
5. Never invent information that is not in the document.
6. At most 2-3 sentences per answer.";

const ANALYSIS_POLICY: &str = "You analyse visits to a landing page for its owner. \
Given the engagement data of one visit, write 2-3 sentences: how engaged the visitor was, \
which topics held their attention, and what to bring up in a follow-up. \
Be factual and do not speculate beyond the data.";

/// Chat preamble with the marker filled in.
pub fn chat_system_prompt(marker: &str) -> String {
    CHAT_POLICY.replace("{marker}", marker)
}

pub fn analysis_system_prompt() -> &'static str {
    ANALYSIS_POLICY
}

/// Renders the engagement data of a finished session for the analyst.
pub fn analysis_prompt(session: &Session) -> String {
    let origin = &session.origin;
    let mut prompt = format!(
        "Visit {}\nLocation: {} (ISP: {})\nDevice: {} on {} ({}), screen {}\nReferrer: {}\nDuration: {}s\nMax scroll: {:.0}%\n",
        session.id,
        origin.geo.display(),
        origin.geo.isp,
        origin.device.browser,
        origin.device.os,
        origin.device.device_type,
        origin.screen_size,
        origin.referrer.as_deref().unwrap_or("direct"),
        session.duration().num_seconds(),
        session.max_scroll,
    );

    if session.sections_viewed.is_empty() {
        prompt.push_str("Sections viewed: none\n");
    } else {
        prompt.push_str("Sections viewed (in order, with dwell time):\n");
        for section in &session.sections_viewed {
            let ms = session.section_times.get(section).copied().unwrap_or(0);
            prompt.push_str(&format!("- {}: {:.1}s\n", section, ms as f64 / 1000.0));
        }
    }

    if !session.chat.is_empty() {
        prompt.push_str("Chat questions:\n");
        for turn in &session.chat {
            prompt.push_str(&format!("- {}\n", turn.question));
        }
    }

    prompt
}

/// Summary used when the analysis call fails.
pub fn fallback_analysis(session: &Session) -> String {
    format!(
        "Automatic analysis unavailable. {}s on page, max scroll {:.0}%, {} section(s) viewed, {} chat question(s).",
        session.duration().num_seconds(),
        session.max_scroll,
        session.sections_viewed.len(),
        session.chat.len()
    )
}
