use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::commands::{AppState, CommandError, CommandResult};
use crate::error::{AppError, AppResult};
use crate::models::itinerary::{FlightInfo, HotelInfo, Itinerary};
use crate::models::search::{BudgetTier, SearchCategory, SearchResult, TripType};
use crate::models::trip::{SavedTrip, TripDetails};
use crate::services::drag_gesture::{DragGesture, DragState};
use crate::services::itinerary_gateway::{ActivityAction, PlannerSession};
use crate::services::option_parser::{
    flight_from_section, flight_search_query, google_flights_url, google_hotels_url,
    hotel_from_section, hotel_search_query,
};
use crate::services::trip_store::TripStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AppScreen {
    #[default]
    Landing,
    Planner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlannerView {
    #[default]
    Itinerary,
    Booking,
}

/// What the booking panel asks the search engine for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchRequest {
    Flights { origin: String, trip_type: TripType },
    Hotels { tier: BudgetTier },
}

impl SearchRequest {
    pub fn category(&self) -> SearchCategory {
        match self {
            SearchRequest::Flights { .. } => SearchCategory::Flights,
            SearchRequest::Hotels { .. } => SearchCategory::Hotels,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualSearchLinks {
    pub flights: String,
    pub hotels: String,
}

/// The application shell: screen, view, the live session and saved trips.
pub struct PlannerController {
    state: AppState,
    session: PlannerSession,
    drag: DragGesture,
    trips: TripStore,
    screen: AppScreen,
    view: PlannerView,
    loading: bool,
    last_error: Option<CommandError>,
    /// Snapshot the current session matches while it counts as saved.
    saved_trip_id: Option<String>,
}

impl PlannerController {
    pub fn new(state: AppState) -> AppResult<Self> {
        let trips = TripStore::open(state.kv_store())?;
        Ok(Self {
            state,
            session: PlannerSession::new(),
            drag: DragGesture::new(),
            trips,
            screen: AppScreen::default(),
            view: PlannerView::default(),
            loading: false,
            last_error: None,
            saved_trip_id: None,
        })
    }

    pub fn screen(&self) -> AppScreen {
        self.screen
    }

    pub fn view(&self) -> PlannerView {
        self.view
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&CommandError> {
        self.last_error.as_ref()
    }

    pub fn session(&self) -> &PlannerSession {
        &self.session
    }

    pub fn itinerary(&self) -> Option<Arc<Itinerary>> {
        self.session.itinerary().cloned()
    }

    pub fn is_saved(&self) -> bool {
        self.session.is_saved()
    }

    pub fn saved_trips(&self) -> &[SavedTrip] {
        self.trips.trips()
    }

    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    pub fn start_new_planner(&mut self) {
        self.session.reset();
        self.drag.cancel();
        self.last_error = None;
        self.saved_trip_id = None;
        self.view = PlannerView::Itinerary;
        self.screen = AppScreen::Planner;
    }

    /// Generates a fresh itinerary for `details` and installs it together
    /// with its hero image. The previous itinerary is gone as soon as the
    /// request starts.
    pub async fn submit_trip(&mut self, details: TripDetails) -> CommandResult<Arc<Itinerary>> {
        details.validate()?;

        self.last_error = None;
        self.drag.cancel();
        self.session.begin_submission(details.clone());
        self.saved_trip_id = None;
        self.view = PlannerView::Itinerary;
        self.screen = AppScreen::Planner;
        self.loading = true;

        let ai = self.state.ai();
        let outcome = ai.generate_itinerary(&details).await;
        let result = match outcome {
            Ok(itinerary) => {
                let hero = ai
                    .generate_destination_image(
                        &details.destination,
                        Some(itinerary.hero_search_term.as_str()).filter(|term| !term.is_empty()),
                    )
                    .await;
                Ok(self.session.install_itinerary(itinerary.with_hero_image(hero)))
            }
            Err(error) => {
                let error = CommandError::from(error);
                warn!(
                    target: "app::planner",
                    code = %error.code,
                    destination = %details.destination,
                    "itinerary generation failed"
                );
                self.last_error = Some(error.clone());
                Err(error)
            }
        };

        self.loading = false;
        result
    }

    /// Resubmits the last trip details unchanged.
    pub async fn retry(&mut self) -> CommandResult<Arc<Itinerary>> {
        let details = self
            .session
            .trip_details()
            .cloned()
            .ok_or_else(|| AppError::validation("no trip to retry"))?;
        self.submit_trip(details).await
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    pub fn set_view(&mut self, view: PlannerView) {
        self.view = view;
    }

    pub fn update_activity(
        &mut self,
        day_index: usize,
        activity_index: usize,
        action: ActivityAction,
    ) -> CommandResult<Arc<Itinerary>> {
        Ok(self
            .session
            .update_activity(day_index, activity_index, action)?)
    }

    pub fn reorder_activity(
        &mut self,
        day_index: usize,
        from: usize,
        to: usize,
    ) -> CommandResult<Arc<Itinerary>> {
        Ok(self.session.reorder_activity(day_index, from, to)?)
    }

    pub fn drag_start(&mut self, day_index: usize, activity_index: usize) {
        self.drag.start(day_index, activity_index);
    }

    pub fn drag_over(&mut self, activity_index: usize) {
        self.drag.hover(activity_index);
    }

    pub fn drag_leave(&mut self) {
        self.drag.leave();
    }

    /// Ends the gesture; returns the new itinerary when the drop reordered.
    pub fn drop_activity(
        &mut self,
        day_index: usize,
        target_index: usize,
    ) -> CommandResult<Option<Arc<Itinerary>>> {
        match self.drag.drop(day_index, target_index) {
            Some(edit) => Ok(Some(self.session.apply(edit)?)),
            None => Ok(None),
        }
    }

    pub fn drag_end(&mut self) {
        self.drag.end();
    }

    pub fn select_flight(&mut self, flight: FlightInfo) -> CommandResult<Arc<Itinerary>> {
        let itinerary = self.session.select_flight(flight)?;
        self.view = PlannerView::Itinerary;
        Ok(itinerary)
    }

    pub fn select_hotel(&mut self, hotel: HotelInfo) -> CommandResult<Arc<Itinerary>> {
        let itinerary = self.session.select_hotel(hotel)?;
        self.view = PlannerView::Itinerary;
        Ok(itinerary)
    }

    /// Selects the option described by one section of a search answer.
    pub fn select_option(
        &mut self,
        category: SearchCategory,
        section: &str,
    ) -> CommandResult<Arc<Itinerary>> {
        match category {
            SearchCategory::Flights => self.select_flight(flight_from_section(section)),
            SearchCategory::Hotels => self.select_hotel(hotel_from_section(section)),
        }
    }

    pub async fn search_options(&self, request: SearchRequest) -> CommandResult<SearchResult> {
        let details = self
            .session
            .trip_details()
            .ok_or_else(|| AppError::validation("plan a trip before searching"))?;

        let query = match &request {
            SearchRequest::Flights { origin, trip_type } => {
                let origin = origin.trim();
                if origin.is_empty() {
                    return Err(AppError::validation("departure city is required").into());
                }
                flight_search_query(*trip_type, origin, &details.destination, details.start_date)
            }
            SearchRequest::Hotels { tier } => {
                hotel_search_query(*tier, &details.destination, details.start_date)
            }
        };

        self.state
            .ai()
            .search_travel_options(&query, request.category())
            .await
            .map_err(CommandError::for_search)
    }

    /// Direct Google Flights and Hotels links for the current trip.
    pub fn manual_search_links(&self, origin: &str) -> Option<ManualSearchLinks> {
        let details = self.session.trip_details()?;
        Some(ManualSearchLinks {
            flights: google_flights_url(origin.trim(), &details.destination, details.start_date),
            hotels: google_hotels_url(&details.destination, details.start_date),
        })
    }

    pub async fn destination_suggestions(&self, partial: &str) -> Vec<String> {
        self.state.ai().destination_suggestions(partial).await
    }

    /// Snapshots the session. Saving again without changes in between
    /// returns the existing snapshot.
    pub fn save_trip(&mut self) -> CommandResult<SavedTrip> {
        if self.session.is_saved() {
            if let Some(existing) = self
                .saved_trip_id
                .as_deref()
                .and_then(|id| self.trips.get(id))
            {
                return Ok(existing.clone());
            }
        }

        let (Some(details), Some(itinerary)) =
            (self.session.trip_details(), self.session.itinerary())
        else {
            return Err(AppError::validation("nothing to save yet").into());
        };

        let trip = self.trips.save(details, itinerary)?;
        self.session.mark_saved();
        self.saved_trip_id = Some(trip.id.clone());
        Ok(trip)
    }

    pub fn delete_saved_trip(&mut self, id: &str) -> CommandResult<()> {
        Ok(self.trips.delete(id)?)
    }

    pub fn load_saved_trip(&mut self, id: &str) -> CommandResult<Arc<Itinerary>> {
        let trip = self.trips.get(id).cloned().ok_or_else(AppError::not_found)?;

        self.drag.cancel();
        self.last_error = None;
        let itinerary = self.session.load_saved_trip(&trip);
        self.saved_trip_id = Some(trip.id);
        self.view = PlannerView::Itinerary;
        self.screen = AppScreen::Planner;

        info!(target: "app::planner", id, "saved trip loaded");
        Ok(itinerary)
    }

    /// Back to the landing screen with nothing planned.
    pub fn reset(&mut self) {
        self.session.reset();
        self.drag.cancel();
        self.last_error = None;
        self.saved_trip_id = None;
        self.loading = false;
        self.view = PlannerView::Itinerary;
        self.screen = AppScreen::Landing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ai_service::{AiServiceConfig, TravelAiService};
    use crate::services::trip_store::MemoryKeyValueStore;

    fn controller() -> PlannerController {
        let mut config = AiServiceConfig::with_base_url("http://127.0.0.1:9", "unused");
        config.api_key = None;
        let state = AppState::with_services(
            TravelAiService::new(&config).expect("service"),
            Arc::new(MemoryKeyValueStore::new()),
        );
        PlannerController::new(state).expect("controller")
    }

    #[test]
    fn starts_on_landing() {
        let controller = controller();
        assert_eq!(controller.screen(), AppScreen::Landing);
        assert_eq!(controller.view(), PlannerView::Itinerary);
        assert!(controller.itinerary().is_none());
        assert!(controller.saved_trips().is_empty());
    }

    #[test]
    fn start_and_reset_move_between_screens() {
        let mut controller = controller();
        controller.start_new_planner();
        controller.set_view(PlannerView::Booking);
        assert_eq!(controller.screen(), AppScreen::Planner);

        controller.reset();
        assert_eq!(controller.screen(), AppScreen::Landing);
        assert_eq!(controller.view(), PlannerView::Itinerary);
    }

    #[test]
    fn saving_without_itinerary_is_rejected() {
        let mut controller = controller();
        let error = controller.save_trip().expect_err("nothing to save");
        assert_eq!(error.code, "VALIDATION_ERROR");
    }

    #[test]
    fn loading_unknown_trip_is_not_found() {
        let mut controller = controller();
        let error = controller.load_saved_trip("missing").expect_err("missing");
        assert_eq!(error.code, "NOT_FOUND");
    }

    #[test]
    fn drop_without_itinerary_reports_error_and_resets_drag() {
        let mut controller = controller();
        controller.drag_start(0, 0);
        controller.drag_over(1);

        assert!(controller.drop_activity(0, 1).is_err());
        assert_eq!(controller.drag_state(), DragState::Idle);
    }
}
