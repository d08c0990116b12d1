//! Dashboard numbers, worked out in memory from rows we already fetched.

use crate::state::db_objects::{DbEvent, DbMember};
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ChartPoint {
    pub label: String,
    pub count: usize,
}

///counts per label, biggest first with ties broken alphabetically
pub fn group_counts<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<ChartPoint> {
    labels
        .into_iter()
        .counts()
        .into_iter()
        .map(|(label, count)| ChartPoint {
            label: label.to_string(),
            count,
        })
        .sorted_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)))
        .collect()
}

pub fn members_per_faculty(members: &[DbMember]) -> Vec<ChartPoint> {
    group_counts(
        members
            .iter()
            .map(|m| m.faculty_name.as_deref().unwrap_or("Unassigned")),
    )
}

pub fn members_per_level(members: &[DbMember]) -> Vec<ChartPoint> {
    group_counts(members.iter().map(|m| m.level_of_study.as_str()))
}

///every event appears, including ones nobody has registered for yet
pub fn per_event(events: &[DbEvent], counts: &HashMap<i32, i64>) -> Vec<ChartPoint> {
    events
        .iter()
        .map(|e| ChartPoint {
            label: e.title.clone(),
            count: counts
                .get(&e.id)
                .copied()
                .and_then(|c| usize::try_from(c).ok())
                .unwrap_or_default(),
        })
        .sorted_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)))
        .collect()
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct DashboardCounts {
    pub members: i64,
    pub alumni: i64,
    pub events: i64,
    pub upcoming_events: i64,
    pub pending_feedback: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_by_count_then_label() {
        let points = group_counts(["300", "100", "300", "200", "100", "400"]);
        let flat: Vec<_> = points
            .iter()
            .map(|p| (p.label.as_str(), p.count))
            .collect();
        assert_eq!(flat, [("100", 2), ("300", 2), ("200", 1), ("400", 1)]);
    }

    #[test]
    fn empty_input_is_empty_series() {
        assert!(group_counts(std::iter::empty()).is_empty());
    }
}
