use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::itinerary::Activity;
use crate::services::day_timing::recalculate_day_timings;

/// A structural edit applied to one day's activity list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ActivityEdit {
    MoveUp { index: usize },
    MoveDown { index: usize },
    Delete { index: usize },
    Reorder { from: usize, to: usize },
}

/// Applies `edit` and recomputes downstream times.
///
/// Edits that leave the order unchanged (moving the first item up, the last
/// item down, or reordering onto itself) return the input as-is, times
/// included.
pub fn apply_edit(activities: &[Activity], edit: ActivityEdit) -> AppResult<Vec<Activity>> {
    let len = activities.len();
    let mut next = activities.to_vec();

    match edit {
        ActivityEdit::MoveUp { index } => {
            ensure_index(index, len)?;
            if index == 0 {
                return Ok(next);
            }
            next.swap(index - 1, index);
        }
        ActivityEdit::MoveDown { index } => {
            ensure_index(index, len)?;
            if index + 1 == len {
                return Ok(next);
            }
            next.swap(index, index + 1);
        }
        ActivityEdit::Delete { index } => {
            ensure_index(index, len)?;
            next.remove(index);
        }
        ActivityEdit::Reorder { from, to } => {
            ensure_index(from, len)?;
            ensure_index(to, len)?;
            if from == to {
                return Ok(next);
            }
            let moved = next.remove(from);
            next.insert(to, moved);
        }
    }

    Ok(recalculate_day_timings(next))
}

fn ensure_index(index: usize, len: usize) -> AppResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(AppError::validation_with_details(
            "activity index out of range",
            json!({ "index": index, "len": len }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(title: &str, time: &str, duration: &str) -> Activity {
        Activity {
            time: time.into(),
            duration: duration.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    fn sample_day() -> Vec<Activity> {
        vec![
            activity("A", "9:00 AM", "1h"),
            activity("B", "10:15 AM", "30m"),
            activity("C", "11:00 AM", "2h"),
        ]
    }

    fn summary(activities: &[Activity]) -> Vec<(String, String)> {
        activities
            .iter()
            .map(|a| (a.title.clone(), a.time.clone()))
            .collect()
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(t, s)| ((*t).to_string(), (*s).to_string()))
            .collect()
    }

    #[test]
    fn reorder_first_to_last_reanchors_on_new_first() {
        let day = vec![
            activity("A", "9:00 AM", "1h"),
            activity("B", "TBD", "30m"),
            activity("C", "TBD", "2h"),
        ];
        let result = apply_edit(&day, ActivityEdit::Reorder { from: 0, to: 2 }).expect("reorder");

        assert_eq!(
            summary(&result),
            pairs(&[("B", "TBD"), ("C", "9:45 AM"), ("A", "11:45 AM")])
        );
    }

    #[test]
    fn reorder_uses_the_new_first_time_when_readable() {
        let result = apply_edit(&sample_day(), ActivityEdit::Reorder { from: 0, to: 2 })
            .expect("reorder");

        assert_eq!(
            summary(&result),
            pairs(&[("B", "10:15 AM"), ("C", "11:00 AM"), ("A", "1:15 PM")])
        );
    }

    #[test]
    fn reorder_last_to_first_keeps_moved_time_as_anchor() {
        let day = vec![
            activity("A", "9:00 AM", "1h"),
            activity("B", "10:15 AM", "30m"),
            activity("C", "9:00 AM", "2h"),
        ];
        let result = apply_edit(&day, ActivityEdit::Reorder { from: 2, to: 0 }).expect("reorder");

        assert_eq!(
            summary(&result),
            pairs(&[("C", "9:00 AM"), ("A", "11:15 AM"), ("B", "12:30 PM")])
        );
    }

    #[test]
    fn move_up_swaps_and_recalculates() {
        let result = apply_edit(&sample_day(), ActivityEdit::MoveUp { index: 1 }).expect("move");

        assert_eq!(
            summary(&result),
            pairs(&[("B", "10:15 AM"), ("A", "11:00 AM"), ("C", "12:15 PM")])
        );
    }

    #[test]
    fn move_down_then_up_restores_order() {
        let original = sample_day();
        let down = apply_edit(&original, ActivityEdit::MoveDown { index: 0 }).expect("down");
        let restored = apply_edit(&down, ActivityEdit::MoveUp { index: 1 }).expect("up");

        let titles: Vec<_> = restored.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["A", "B", "C"]);
    }

    #[test]
    fn delete_first_promotes_next_as_anchor() {
        let result = apply_edit(&sample_day(), ActivityEdit::Delete { index: 0 }).expect("delete");

        assert_eq!(
            summary(&result),
            pairs(&[("B", "10:15 AM"), ("C", "11:00 AM")])
        );
    }

    #[test]
    fn delete_middle_pulls_later_items_forward() {
        let day = vec![
            activity("A", "9:00 AM", "1h"),
            activity("B", "10:15 AM", "30m"),
            activity("C", "11:00 AM", "45m"),
        ];
        let result = apply_edit(&day, ActivityEdit::Delete { index: 1 }).expect("delete");

        assert_eq!(
            summary(&result),
            pairs(&[("A", "9:00 AM"), ("C", "10:15 AM")])
        );
    }

    #[test]
    fn boundary_moves_are_no_ops() {
        let day = vec![
            activity("A", "9:00 AM", "1h"),
            activity("B", "not recalculated", "30m"),
        ];

        assert_eq!(apply_edit(&day, ActivityEdit::MoveUp { index: 0 }).expect("up"), day);
        assert_eq!(
            apply_edit(&day, ActivityEdit::MoveDown { index: 1 }).expect("down"),
            day
        );
        assert_eq!(
            apply_edit(&day, ActivityEdit::Reorder { from: 1, to: 1 }).expect("same"),
            day
        );
    }

    #[test]
    fn delete_only_item_leaves_empty_day() {
        let day = vec![activity("A", "9:00 AM", "1h")];
        assert!(apply_edit(&day, ActivityEdit::Delete { index: 0 })
            .expect("delete")
            .is_empty());
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        let day = sample_day();
        for edit in [
            ActivityEdit::MoveUp { index: 3 },
            ActivityEdit::MoveDown { index: 7 },
            ActivityEdit::Delete { index: 3 },
            ActivityEdit::Reorder { from: 3, to: 0 },
            ActivityEdit::Reorder { from: 0, to: 3 },
        ] {
            match apply_edit(&day, edit) {
                Err(AppError::Validation { details, .. }) => {
                    let details = details.expect("details");
                    assert_eq!(details["len"], 3);
                }
                other => panic!("expected validation error for {edit:?}, got {other:?}"),
            }
        }

        assert!(apply_edit(&[], ActivityEdit::Delete { index: 0 }).is_err());
    }

    #[test]
    fn edits_preserve_the_activity_multiset() {
        let day = sample_day();
        let result = apply_edit(&day, ActivityEdit::Reorder { from: 2, to: 1 }).expect("reorder");

        let mut before: Vec<_> = day.iter().map(|a| a.title.clone()).collect();
        let mut after: Vec<_> = result.iter().map(|a| a.title.clone()).collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }
}
