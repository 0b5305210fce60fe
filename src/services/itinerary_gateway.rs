use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::itinerary::{FlightInfo, HotelInfo, Itinerary};
use crate::models::trip::{SavedTrip, TripDetails};
use crate::services::activity_editor::{apply_edit, ActivityEdit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityAction {
    Up,
    Down,
    Delete,
}

impl ActivityAction {
    fn into_edit(self, index: usize) -> ActivityEdit {
        match self {
            ActivityAction::Up => ActivityEdit::MoveUp { index },
            ActivityAction::Down => ActivityEdit::MoveDown { index },
            ActivityAction::Delete => ActivityEdit::Delete { index },
        }
    }
}

/// An edit addressed to a day of the current itinerary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ItineraryEdit {
    Activity {
        day: usize,
        activity: usize,
        action: ActivityAction,
    },
    Reorder {
        day: usize,
        from: usize,
        to: usize,
    },
}

impl ItineraryEdit {
    fn day_index(&self) -> usize {
        match self {
            ItineraryEdit::Activity { day, .. } | ItineraryEdit::Reorder { day, .. } => *day,
        }
    }

    fn activity_edit(&self) -> ActivityEdit {
        match *self {
            ItineraryEdit::Activity {
                activity, action, ..
            } => action.into_edit(activity),
            ItineraryEdit::Reorder { from, to, .. } => ActivityEdit::Reorder { from, to },
        }
    }
}

/// Planner state that every itinerary mutation flows through.
///
/// The itinerary and the saved flag only ever change together: a failed
/// mutation leaves both untouched, a successful one replaces the itinerary
/// and clears the flag.
#[derive(Debug, Default, Clone)]
pub struct PlannerSession {
    itinerary: Option<Arc<Itinerary>>,
    trip_details: Option<TripDetails>,
    is_saved: bool,
}

impl PlannerSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn itinerary(&self) -> Option<&Arc<Itinerary>> {
        self.itinerary.as_ref()
    }

    pub fn trip_details(&self) -> Option<&TripDetails> {
        self.trip_details.as_ref()
    }

    pub fn is_saved(&self) -> bool {
        self.is_saved
    }

    pub fn update_activity(
        &mut self,
        day_index: usize,
        activity_index: usize,
        action: ActivityAction,
    ) -> AppResult<Arc<Itinerary>> {
        self.apply(ItineraryEdit::Activity {
            day: day_index,
            activity: activity_index,
            action,
        })
    }

    pub fn reorder_activity(
        &mut self,
        day_index: usize,
        from: usize,
        to: usize,
    ) -> AppResult<Arc<Itinerary>> {
        self.apply(ItineraryEdit::Reorder {
            day: day_index,
            from,
            to,
        })
    }

    /// Applies an edit to one day; all other days are shared with the
    /// previous itinerary.
    pub fn apply(&mut self, edit: ItineraryEdit) -> AppResult<Arc<Itinerary>> {
        let current = self.current_itinerary()?;
        let day_index = edit.day_index();
        let day = current.day(day_index).ok_or_else(|| {
            AppError::validation_with_details(
                "day index out of range",
                json!({ "index": day_index, "len": current.days.len() }),
            )
        })?;

        let activities = apply_edit(&day.activities, edit.activity_edit())?;
        let next = current.with_day(day_index, day.with_activities(activities));

        debug!(target: "app::planner", ?edit, "itinerary edited");
        Ok(self.commit(next))
    }

    pub fn select_flight(&mut self, flight: FlightInfo) -> AppResult<Arc<Itinerary>> {
        let next = self.current_itinerary()?.with_flight(flight);
        Ok(self.commit(next))
    }

    pub fn select_hotel(&mut self, hotel: HotelInfo) -> AppResult<Arc<Itinerary>> {
        let next = self.current_itinerary()?.with_hotel(hotel);
        Ok(self.commit(next))
    }

    /// Starts a fresh generation for `details`: the previous itinerary is
    /// dropped and the session counts as unsaved.
    pub fn begin_submission(&mut self, details: TripDetails) {
        self.itinerary = None;
        self.trip_details = Some(details);
        self.is_saved = false;
    }

    pub fn install_itinerary(&mut self, itinerary: Itinerary) -> Arc<Itinerary> {
        info!(
            target: "app::planner",
            title = %itinerary.title,
            days = itinerary.days.len(),
            "itinerary installed"
        );
        self.commit(itinerary)
    }

    pub fn mark_saved(&mut self) {
        self.is_saved = true;
    }

    pub fn load_saved_trip(&mut self, trip: &SavedTrip) -> Arc<Itinerary> {
        let itinerary = Arc::new(trip.itinerary.clone());
        self.itinerary = Some(Arc::clone(&itinerary));
        self.trip_details = Some(trip.details.clone());
        self.is_saved = true;
        itinerary
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn current_itinerary(&self) -> AppResult<Arc<Itinerary>> {
        self.itinerary
            .clone()
            .ok_or_else(|| AppError::validation("no itinerary to edit"))
    }

    fn commit(&mut self, itinerary: Itinerary) -> Arc<Itinerary> {
        let itinerary = Arc::new(itinerary);
        self.itinerary = Some(Arc::clone(&itinerary));
        self.is_saved = false;
        itinerary
    }
}
