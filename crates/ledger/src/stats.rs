//! Aggregate figures for the admin dashboard.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracker_core::{QuestionLogEntry, Session};

/// Number of sections listed in [`AdminStats::top_sections`].
pub const TOP_SECTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionStat {
    pub section: String,
    pub views: u64,
    pub total_dwell_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_visitors: usize,
    pub active_now: usize,
    pub finished_sessions: usize,
    pub total_questions: usize,
    pub out_of_scope_questions: usize,
    pub avg_max_scroll: f64,
    /// Mean length of finished sessions.
    pub avg_duration_secs: f64,
    pub top_sections: Vec<SectionStat>,
}

impl AdminStats {
    pub fn compute(visitors: &[Session], questions: &[QuestionLogEntry], active_now: usize) -> Self {
        let finished: Vec<&Session> = visitors.iter().filter(|v| v.ended_at.is_some()).collect();

        let avg_max_scroll = mean(visitors.iter().map(|v| v.max_scroll));
        let avg_duration_secs = mean(
            finished
                .iter()
                .map(|v| v.duration().num_milliseconds().max(0) as f64 / 1000.0),
        );

        let mut sections: BTreeMap<&str, SectionStat> = BTreeMap::new();
        for visitor in visitors {
            for section in &visitor.sections_viewed {
                let stat = sections.entry(section).or_insert_with(|| SectionStat {
                    section: section.clone(),
                    views: 0,
                    total_dwell_ms: 0,
                });
                stat.views += 1;
            }
            for (section, ms) in &visitor.section_times {
                if let Some(stat) = sections.get_mut(section.as_str()) {
                    stat.total_dwell_ms += ms;
                }
            }
        }

        let mut top_sections: Vec<SectionStat> = sections.into_values().collect();
        top_sections.sort_by(|a, b| {
            b.views
                .cmp(&a.views)
                .then(b.total_dwell_ms.cmp(&a.total_dwell_ms))
        });
        top_sections.truncate(TOP_SECTIONS);

        Self {
            total_visitors: visitors.len(),
            active_now,
            finished_sessions: finished.len(),
            total_questions: questions.len(),
            out_of_scope_questions: questions
                .iter()
                .filter(|q| q.classification.is_out_of_scope())
                .count(),
            avg_max_scroll,
            avg_duration_secs,
            top_sections,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        (sum / count as f64 * 10.0).round() / 10.0
    }
}
