use tracing::trace;

use crate::models::itinerary::Activity;
use crate::services::time_utils::{format_clock_time, parse_clock_time, parse_duration};

/// Gap inserted between the end of one activity and the start of the next.
pub const TRANSITION_BUFFER_MINUTES: u32 = 15;

/// Re-derives every start time from list position.
///
/// The first activity keeps its time untouched and anchors the day; each
/// following activity starts after the previous one's duration plus
/// [`TRANSITION_BUFFER_MINUTES`]. Unreadable text falls back to the parser
/// defaults, so this never fails.
pub fn recalculate_day_timings(mut activities: Vec<Activity>) -> Vec<Activity> {
    let Some(first) = activities.first() else {
        return activities;
    };

    let mut current_start = parse_clock_time(&first.time);
    let mut previous_duration = parse_duration(&first.duration);

    for activity in activities.iter_mut().skip(1) {
        current_start = current_start
            .saturating_add(previous_duration)
            .saturating_add(TRANSITION_BUFFER_MINUTES);
        activity.time = format_clock_time(current_start);
        previous_duration = parse_duration(&activity.duration);
    }

    trace!(target: "app::timing", count = activities.len(), "recalculated day timings");
    activities
}
