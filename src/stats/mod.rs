//! Training-plan aggregation.
//!
//! Combines the five leaf collections (tags, members, member-tag
//! assignments, build-tag assignments, completion records) into derived
//! views for dashboard rendering. Aggregation is pure and synchronous: it
//! recomputes from a full snapshot on every input change rather than
//! updating incrementally, so identical snapshots always produce identical
//! output.

mod cache;

pub use cache::OverviewCache;

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    BuildTagAssignment, CompletionRecord, Member, MemberTagAssignment, TagPriority, TrainingTag,
};

/// Window ahead of `now` in which a due date counts as an upcoming deadline.
const UPCOMING_DEADLINE_DAYS: i64 = 7;

/// An immutable snapshot of the five leaf collections for one organization.
#[derive(Debug, Clone, Default)]
pub struct TrainingSnapshot {
    pub tags: Vec<TrainingTag>,
    pub members: Vec<Member>,
    pub member_assignments: Vec<MemberTagAssignment>,
    pub build_assignments: Vec<BuildTagAssignment>,
    pub completions: Vec<CompletionRecord>,
}

/// Per-tag derived statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagStats {
    pub tag: TrainingTag,
    pub member_count: usize,
    pub build_count: usize,
    pub expected_completions: usize,
    pub total_completions: usize,
    pub completion_rate: f64,
    pub is_completed: bool,
    pub is_overdue: bool,
}

/// Per-member derived statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStats {
    pub member: Member,
    pub assigned_tag_ids: Vec<String>,
    pub overdue_tag_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_due_date: Option<DateTime<Utc>>,
    pub has_overdue: bool,
}

/// The combined tag-centric and member-centric derived views.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingOverview {
    pub tags: Vec<TagStats>,
    pub members: Vec<MemberStats>,
}

/// Tag counts grouped by priority.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityBreakdown {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

/// Summary metrics for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub active_plans: usize,
    pub completed_plans: usize,
    pub overdue_plans: usize,
    pub priority_breakdown: PriorityBreakdown,
    pub upcoming_deadlines: usize,
    pub members_with_overdue: usize,
}

/// Compute the derived views from a snapshot.
///
/// Completion counting is exact per (member, build) pair: a member's
/// completion events are collapsed into a set of build names, so duplicate
/// events never inflate any count, and a plan is completed only when every
/// assigned member has completed every assigned build. Events from members
/// not assigned to a tag do not count toward that tag.
pub fn aggregate(snapshot: &TrainingSnapshot, now: DateTime<Utc>) -> TrainingOverview {
    let mut members_by_tag: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut tags_by_member: HashMap<&str, HashSet<&str>> = HashMap::new();
    for assignment in &snapshot.member_assignments {
        members_by_tag
            .entry(assignment.tag_id.as_str())
            .or_default()
            .insert(assignment.member_id.as_str());
        tags_by_member
            .entry(assignment.member_id.as_str())
            .or_default()
            .insert(assignment.tag_id.as_str());
    }

    let mut builds_by_tag: HashMap<&str, HashSet<&str>> = HashMap::new();
    for assignment in &snapshot.build_assignments {
        builds_by_tag
            .entry(assignment.tag_id.as_str())
            .or_default()
            .insert(assignment.build_name.as_str());
    }

    // Deduplicated completion sets: member id -> builds completed at least once.
    let mut completed_builds: HashMap<&str, HashSet<&str>> = HashMap::new();
    for record in snapshot.completions.iter().filter(|c| c.completed) {
        completed_builds
            .entry(record.member_id.as_str())
            .or_default()
            .insert(record.build_name.as_str());
    }

    let empty = HashSet::new();

    let tags = snapshot
        .tags
        .iter()
        .map(|tag| {
            let members = members_by_tag.get(tag.id.as_str()).unwrap_or(&empty);
            let builds = builds_by_tag.get(tag.id.as_str()).unwrap_or(&empty);

            let member_count = members.len();
            let build_count = builds.len();
            let expected_completions = member_count * build_count;

            let total_completions: usize = builds
                .iter()
                .map(|build| {
                    members
                        .iter()
                        .filter(|member| {
                            completed_builds
                                .get(*member)
                                .is_some_and(|set| set.contains(build))
                        })
                        .count()
                })
                .sum();

            let is_completed = member_count > 0
                && build_count > 0
                && total_completions == expected_completions;

            let completion_rate = if expected_completions > 0 {
                total_completions as f64 / expected_completions as f64 * 100.0
            } else {
                0.0
            };

            let is_overdue = tag.due_date.is_some_and(|due| due < now) && !is_completed;

            TagStats {
                tag: tag.clone(),
                member_count,
                build_count,
                expected_completions,
                total_completions,
                completion_rate,
                is_completed,
                is_overdue,
            }
        })
        .collect();

    let members = snapshot
        .members
        .iter()
        .map(|member| {
            // Iterate tags in snapshot order so output is deterministic and
            // assignments pointing at deleted tags are skipped.
            let assigned: Vec<&TrainingTag> = snapshot
                .tags
                .iter()
                .filter(|tag| {
                    tags_by_member
                        .get(member.id.as_str())
                        .is_some_and(|set| set.contains(tag.id.as_str()))
                })
                .collect();

            let assigned_tag_ids: Vec<String> =
                assigned.iter().map(|tag| tag.id.clone()).collect();
            let overdue_tag_ids: Vec<String> = assigned
                .iter()
                .filter(|tag| tag.due_date.is_some_and(|due| due < now))
                .map(|tag| tag.id.clone())
                .collect();
            let next_due_date = assigned
                .iter()
                .filter_map(|tag| tag.due_date)
                .filter(|due| *due >= now)
                .min();

            MemberStats {
                member: member.clone(),
                has_overdue: !overdue_tag_ids.is_empty(),
                assigned_tag_ids,
                overdue_tag_ids,
                next_due_date,
            }
        })
        .collect();

    TrainingOverview { tags, members }
}

/// Reduce the derived views into dashboard summary metrics.
pub fn reduce(overview: &TrainingOverview, now: DateTime<Utc>) -> DashboardMetrics {
    let horizon = now + Duration::days(UPCOMING_DEADLINE_DAYS);

    let mut metrics = DashboardMetrics {
        active_plans: 0,
        completed_plans: 0,
        overdue_plans: 0,
        priority_breakdown: PriorityBreakdown::default(),
        upcoming_deadlines: 0,
        members_with_overdue: 0,
    };

    for stats in &overview.tags {
        let due = stats.tag.due_date;

        if stats.is_completed {
            metrics.completed_plans += 1;
        } else if due.map_or(true, |d| d >= now) {
            metrics.active_plans += 1;
        }
        if stats.is_overdue && !stats.is_completed {
            metrics.overdue_plans += 1;
        }

        match stats.tag.priority {
            TagPriority::Low => metrics.priority_breakdown.low += 1,
            TagPriority::Medium => metrics.priority_breakdown.medium += 1,
            TagPriority::High => metrics.priority_breakdown.high += 1,
        }

        if let Some(d) = due {
            if d > now && d <= horizon {
                metrics.upcoming_deadlines += 1;
            }
        }
    }

    metrics.members_with_overdue = overview
        .members
        .iter()
        .filter(|member| member.has_overdue)
        .count();

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MemberRole;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    fn tag(id: &str, priority: TagPriority, due: Option<&str>) -> TrainingTag {
        TrainingTag {
            id: id.to_string(),
            org_id: "org-1".to_string(),
            name: format!("Plan {}", id),
            color: None,
            priority,
            due_date: due.map(at),
            created_at: "2025-01-01T00:00:00+00:00".to_string(),
            modified_at: "2025-01-01T00:00:00+00:00".to_string(),
            version: 1,
        }
    }

    fn member(id: &str) -> Member {
        Member {
            id: id.to_string(),
            org_id: "org-1".to_string(),
            display_name: format!("Member {}", id),
            email: None,
            role: MemberRole::Member,
            joined_at: "2025-01-01T00:00:00+00:00".to_string(),
            version: 1,
        }
    }

    fn assign_member(member_id: &str, tag_id: &str) -> MemberTagAssignment {
        MemberTagAssignment {
            member_id: member_id.to_string(),
            tag_id: tag_id.to_string(),
            assigned_at: "2025-01-02T00:00:00+00:00".to_string(),
        }
    }

    fn assign_build(build_name: &str, tag_id: &str) -> BuildTagAssignment {
        BuildTagAssignment {
            build_name: build_name.to_string(),
            tag_id: tag_id.to_string(),
            assigned_at: "2025-01-02T00:00:00+00:00".to_string(),
        }
    }

    fn completion(member_id: &str, build_name: &str) -> CompletionRecord {
        CompletionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            member_id: member_id.to_string(),
            build_name: build_name.to_string(),
            completed: true,
            recorded_at: "2025-01-03T00:00:00+00:00".to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        at("2025-06-01T12:00:00+00:00")
    }

    /// Safety-101: 3 members, 2 builds, all 6 completions recorded.
    fn fully_completed_snapshot() -> TrainingSnapshot {
        TrainingSnapshot {
            tags: vec![tag("t1", TagPriority::High, None)],
            members: vec![member("m1"), member("m2"), member("m3")],
            member_assignments: vec![
                assign_member("m1", "t1"),
                assign_member("m2", "t1"),
                assign_member("m3", "t1"),
            ],
            build_assignments: vec![assign_build("fire-safety", "t1"), assign_build("ppe", "t1")],
            completions: vec![
                completion("m1", "fire-safety"),
                completion("m1", "ppe"),
                completion("m2", "fire-safety"),
                completion("m2", "ppe"),
                completion("m3", "fire-safety"),
                completion("m3", "ppe"),
            ],
        }
    }

    #[test]
    fn test_expected_completions_is_members_times_builds() {
        let overview = aggregate(&fully_completed_snapshot(), now());
        let stats = &overview.tags[0];
        assert_eq!(stats.member_count, 3);
        assert_eq!(stats.build_count, 2);
        assert_eq!(stats.expected_completions, 6);
    }

    #[test]
    fn test_fully_completed_plan() {
        let overview = aggregate(&fully_completed_snapshot(), now());
        let stats = &overview.tags[0];
        assert_eq!(stats.total_completions, 6);
        assert!(stats.is_completed);
        assert_eq!(stats.completion_rate, 100.0);
    }

    #[test]
    fn test_partial_completion_rate() {
        let mut snapshot = fully_completed_snapshot();
        snapshot.completions.truncate(4);
        let overview = aggregate(&snapshot, now());
        let stats = &overview.tags[0];
        assert_eq!(stats.total_completions, 4);
        assert!(!stats.is_completed);
        assert!((stats.completion_rate - 400.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_plan_never_completes() {
        let no_members = TrainingSnapshot {
            tags: vec![tag("t1", TagPriority::Medium, None)],
            build_assignments: vec![assign_build("fire-safety", "t1")],
            ..Default::default()
        };
        let overview = aggregate(&no_members, now());
        let stats = &overview.tags[0];
        assert_eq!(stats.member_count, 0);
        assert!(!stats.is_completed);
        assert_eq!(stats.completion_rate, 0.0);

        let no_builds = TrainingSnapshot {
            tags: vec![tag("t1", TagPriority::Medium, None)],
            members: vec![member("m1")],
            member_assignments: vec![assign_member("m1", "t1")],
            ..Default::default()
        };
        let stats = &aggregate(&no_builds, now()).tags[0];
        assert_eq!(stats.build_count, 0);
        assert!(!stats.is_completed);
        assert_eq!(stats.completion_rate, 0.0);
    }

    #[test]
    fn test_overdue_requires_past_due_and_incomplete() {
        let mut snapshot = fully_completed_snapshot();
        snapshot.tags[0].due_date = Some(at("2024-01-01T00:00:00+00:00"));

        // Fully completed: past due date does not make the plan overdue.
        let stats = &aggregate(&snapshot, now()).tags[0];
        assert!(!stats.is_overdue);

        // Incomplete with a past due date is overdue.
        snapshot.completions.truncate(4);
        let stats = &aggregate(&snapshot, now()).tags[0];
        assert!(stats.is_overdue);

        // Future due date is never overdue.
        snapshot.tags[0].due_date = Some(at("2030-01-01T00:00:00+00:00"));
        let stats = &aggregate(&snapshot, now()).tags[0];
        assert!(!stats.is_overdue);
    }

    #[test]
    fn test_completions_from_unassigned_members_are_ignored() {
        let mut snapshot = fully_completed_snapshot();
        // m3 loses the plan but keeps completion history.
        snapshot
            .member_assignments
            .retain(|a| a.member_id != "m3");
        let stats = &aggregate(&snapshot, now()).tags[0];
        assert_eq!(stats.member_count, 2);
        assert_eq!(stats.expected_completions, 4);
        assert_eq!(stats.total_completions, 4);
        assert!(stats.is_completed);
    }

    #[test]
    fn test_duplicate_completions_do_not_inflate_totals() {
        let mut snapshot = fully_completed_snapshot();
        snapshot.completions.truncate(4);
        let before = aggregate(&snapshot, now()).tags[0].total_completions;

        // Re-recording an already counted pair must not change any count.
        snapshot.completions.push(completion("m1", "fire-safety"));
        snapshot.completions.push(completion("m1", "fire-safety"));
        let after = aggregate(&snapshot, now()).tags[0].total_completions;
        assert_eq!(before, after);
    }

    /// Two members × two builds, each member completing a different single
    /// build: two pair-completions is 50% progress, not equivalent to one
    /// member finishing both builds and never a completed plan.
    #[test]
    fn test_uneven_completion_is_not_progress_equivalent() {
        let snapshot = TrainingSnapshot {
            tags: vec![tag("t1", TagPriority::Medium, None)],
            members: vec![member("m1"), member("m2")],
            member_assignments: vec![assign_member("m1", "t1"), assign_member("m2", "t1")],
            build_assignments: vec![assign_build("b1", "t1"), assign_build("b2", "t1")],
            completions: vec![completion("m1", "b1"), completion("m2", "b2")],
        };
        let stats = &aggregate(&snapshot, now()).tags[0];
        assert_eq!(stats.total_completions, 2);
        assert_eq!(stats.expected_completions, 4);
        assert!(!stats.is_completed);
        assert_eq!(stats.completion_rate, 50.0);
    }

    #[test]
    fn test_incomplete_events_do_not_count() {
        let mut snapshot = fully_completed_snapshot();
        for record in &mut snapshot.completions {
            record.completed = false;
        }
        let stats = &aggregate(&snapshot, now()).tags[0];
        assert_eq!(stats.total_completions, 0);
    }

    #[test]
    fn test_member_overdue_flags() {
        let snapshot = TrainingSnapshot {
            tags: vec![
                tag("t1", TagPriority::High, Some("2024-01-01T00:00:00+00:00")),
                tag("t2", TagPriority::Low, Some("2030-01-01T00:00:00+00:00")),
            ],
            members: vec![member("m1"), member("m2")],
            member_assignments: vec![
                assign_member("m1", "t1"),
                assign_member("m1", "t2"),
                assign_member("m2", "t2"),
            ],
            ..Default::default()
        };
        let overview = aggregate(&snapshot, now());

        let m1 = &overview.members[0];
        assert_eq!(m1.assigned_tag_ids, vec!["t1", "t2"]);
        assert_eq!(m1.overdue_tag_ids, vec!["t1"]);
        assert!(m1.has_overdue);
        assert_eq!(m1.next_due_date, Some(at("2030-01-01T00:00:00+00:00")));

        let m2 = &overview.members[1];
        assert!(m2.overdue_tag_ids.is_empty());
        assert!(!m2.has_overdue);
    }

    #[test]
    fn test_next_due_date_is_earliest_future() {
        let snapshot = TrainingSnapshot {
            tags: vec![
                tag("t1", TagPriority::Medium, Some("2024-01-01T00:00:00+00:00")),
                tag("t2", TagPriority::Medium, Some("2025-09-01T00:00:00+00:00")),
                tag("t3", TagPriority::Medium, Some("2025-07-01T00:00:00+00:00")),
            ],
            members: vec![member("m1")],
            member_assignments: vec![
                assign_member("m1", "t1"),
                assign_member("m1", "t2"),
                assign_member("m1", "t3"),
            ],
            ..Default::default()
        };
        let overview = aggregate(&snapshot, now());
        // The past due date is skipped; the nearer of the two future dates wins.
        assert_eq!(
            overview.members[0].next_due_date,
            Some(at("2025-07-01T00:00:00+00:00"))
        );
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let mut snapshot = fully_completed_snapshot();
        snapshot.tags.push(tag(
            "t2",
            TagPriority::Low,
            Some("2024-01-01T00:00:00+00:00"),
        ));
        snapshot.member_assignments.push(assign_member("m2", "t2"));

        let first = aggregate(&snapshot, now());
        let second = aggregate(&snapshot, now());
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn test_dashboard_reduce_counts() {
        let snapshot = TrainingSnapshot {
            tags: vec![
                // Completed, high priority.
                tag("t1", TagPriority::High, None),
                // Overdue, medium priority.
                tag("t2", TagPriority::Medium, Some("2024-01-01T00:00:00+00:00")),
                // Active with a deadline inside the 7-day window.
                tag("t3", TagPriority::Low, Some("2025-06-05T00:00:00+00:00")),
                // Active with a far-off deadline.
                tag("t4", TagPriority::Low, Some("2030-01-01T00:00:00+00:00")),
            ],
            members: vec![member("m1"), member("m2")],
            member_assignments: vec![
                assign_member("m1", "t1"),
                assign_member("m1", "t2"),
                assign_member("m2", "t3"),
            ],
            build_assignments: vec![assign_build("b1", "t1")],
            completions: vec![completion("m1", "b1")],
        };

        let overview = aggregate(&snapshot, now());
        let metrics = reduce(&overview, now());

        assert_eq!(metrics.completed_plans, 1);
        assert_eq!(metrics.overdue_plans, 1);
        assert_eq!(metrics.active_plans, 2);
        assert_eq!(metrics.priority_breakdown.high, 1);
        assert_eq!(metrics.priority_breakdown.medium, 1);
        assert_eq!(metrics.priority_breakdown.low, 2);
        assert_eq!(metrics.upcoming_deadlines, 1);
        assert_eq!(metrics.members_with_overdue, 1);
    }

    #[test]
    fn test_overdue_plan_excluded_from_active() {
        let snapshot = TrainingSnapshot {
            tags: vec![tag("t1", TagPriority::Medium, Some("2024-01-01T00:00:00+00:00"))],
            members: vec![member("m1")],
            member_assignments: vec![assign_member("m1", "t1")],
            build_assignments: vec![
                assign_build("b1", "t1"),
                assign_build("b2", "t1"),
                assign_build("b3", "t1"),
                assign_build("b4", "t1"),
                assign_build("b5", "t1"),
            ],
            completions: vec![
                completion("m1", "b1"),
                completion("m1", "b2"),
                completion("m1", "b3"),
                completion("m1", "b4"),
            ],
        };
        let overview = aggregate(&snapshot, now());
        let stats = &overview.tags[0];
        assert_eq!(stats.completion_rate, 80.0);
        assert!(stats.is_overdue);

        let metrics = reduce(&overview, now());
        assert_eq!(metrics.active_plans, 0);
        assert_eq!(metrics.overdue_plans, 1);
        assert_eq!(metrics.completed_plans, 0);
    }
}
