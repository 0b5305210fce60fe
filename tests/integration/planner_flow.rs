use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use tempfile::tempdir;
use tripwise_app_lib::commands::planner::{AppScreen, PlannerController, PlannerView, SearchRequest};
use tripwise_app_lib::commands::{AppState, SEARCH_RATE_LIMIT_MESSAGE};
use tripwise_app_lib::db::DbPool;
use tripwise_app_lib::error::{AiErrorCode, AppError, AppResult};
use tripwise_app_lib::models::itinerary::{Activity, DayPlan, HeroImage, Itinerary};
use tripwise_app_lib::models::search::{BudgetTier, SearchCategory, SearchResult, TripType};
use tripwise_app_lib::models::trip::TripDetails;
use tripwise_app_lib::services::ai_service::{
    TravelAiProvider, TravelAiService, FALLBACK_HERO_IMAGE_URL,
};
use tripwise_app_lib::services::drag_gesture::DragState;
use tripwise_app_lib::services::itinerary_gateway::ActivityAction;
use tripwise_app_lib::services::trip_store::{MemoryKeyValueStore, SqliteKeyValueStore};

const HOTEL_SECTION: &str = "NAME: Casa do Principe\nPRICE: $150 per night\nRATING: 4.7/5\nCONTEXT: Quiet square near Principe Real\nTAG: Boutique\nREASONING: Calm rooms close to the nightlife.";

#[derive(Default)]
struct ScriptedProvider {
    itinerary_failures: Mutex<VecDeque<AiErrorCode>>,
    search_failure: Mutex<Option<AiErrorCode>>,
    image_fails: bool,
    itinerary_calls: AtomicUsize,
    search_queries: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn failing_first(code: AiErrorCode) -> Self {
        Self {
            itinerary_failures: Mutex::new(VecDeque::from([code])),
            ..Default::default()
        }
    }
}

#[async_trait]
impl TravelAiProvider for ScriptedProvider {
    async fn generate_itinerary(&self, details: &TripDetails) -> AppResult<Itinerary> {
        self.itinerary_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(code) = self.itinerary_failures.lock().expect("lock").pop_front() {
            return Err(AppError::ai(code, "scripted failure"));
        }
        Ok(sample_itinerary(&details.destination))
    }

    async fn generate_image(
        &self,
        destination: &str,
        search_term: Option<&str>,
    ) -> AppResult<HeroImage> {
        if self.image_fails {
            return Err(AppError::ai(AiErrorCode::ServiceUnavailable, "no image"));
        }
        Ok(HeroImage {
            url: format!("data:image/png;base64,{destination}"),
            photographer_name: search_term.unwrap_or_default().to_string(),
            photographer_url: "#".into(),
        })
    }

    async fn destination_suggestions(&self, _partial: &str) -> AppResult<Vec<String>> {
        Ok(vec!["Lisbon, Portugal".into(), "Lille, France".into()])
    }

    async fn search_travel(
        &self,
        query: &str,
        _category: SearchCategory,
        grounded: bool,
    ) -> AppResult<SearchResult> {
        self.search_queries.lock().expect("lock").push(query.to_string());
        if let Some(code) = *self.search_failure.lock().expect("lock") {
            return Err(AppError::ai(code, "scripted search failure"));
        }
        Ok(SearchResult {
            text: format!("[OPTION_START]\n{HOTEL_SECTION}\n[OPTION_END]"),
            sources: Vec::new(),
            grounded,
        })
    }
}

fn activity(title: &str, time: &str, duration: &str) -> Activity {
    Activity {
        time: time.into(),
        duration: duration.into(),
        title: title.into(),
        description: format!("{title} description"),
        location: None,
    }
}

fn sample_itinerary(destination: &str) -> Itinerary {
    Itinerary {
        title: format!("{destination} in two days"),
        summary: "Scripted plan".into(),
        hero_search_term: "tiled facades".into(),
        days: vec![
            Arc::new(DayPlan {
                day: 1,
                theme: "Old town".into(),
                activities: vec![
                    activity("A", "9:00 AM", "1h"),
                    activity("B", "10:15 AM", "30m"),
                    activity("C", "11:00 AM", "45m"),
                ],
                weather: None,
            }),
            Arc::new(DayPlan {
                day: 2,
                theme: "Riverside".into(),
                activities: vec![activity("D", "10:00 AM", "2h")],
                weather: None,
            }),
        ],
        ..Default::default()
    }
}

fn lisbon() -> TripDetails {
    TripDetails {
        destination: "Lisbon, Portugal".into(),
        days: 2,
        objective: "Cultural Immersion".into(),
        start_date: NaiveDate::from_ymd_opt(2026, 4, 20).expect("date"),
        source: None,
    }
}

fn controller_with(provider: Arc<ScriptedProvider>) -> PlannerController {
    let state = AppState::with_services(
        TravelAiService::with_provider(provider),
        Arc::new(MemoryKeyValueStore::new()),
    );
    PlannerController::new(state).expect("controller")
}

fn times(itinerary: &Itinerary, day: usize) -> Vec<String> {
    itinerary.days[day]
        .activities
        .iter()
        .map(|activity| activity.time.clone())
        .collect()
}

#[tokio::test]
async fn plan_edit_save_and_reload() {
    let provider = Arc::new(ScriptedProvider::default());
    let mut planner = controller_with(provider);

    planner.start_new_planner();
    assert_eq!(planner.screen(), AppScreen::Planner);

    let generated = planner.submit_trip(lisbon()).await.expect("itinerary");
    assert!(!planner.is_loading());
    assert!(!planner.is_saved());
    let hero = generated.hero_image.as_ref().expect("hero image");
    assert_eq!(hero.photographer_name, "tiled facades");

    let moved = planner
        .update_activity(0, 0, ActivityAction::Down)
        .expect("move down");
    assert_eq!(times(&moved, 0), ["10:15 AM", "11:00 AM", "12:15 PM"]);
    assert!(Arc::ptr_eq(&generated.days[1], &moved.days[1]));

    let saved = planner.save_trip().expect("save");
    assert!(planner.is_saved());
    assert_eq!(planner.saved_trips().len(), 1);
    assert_eq!(saved.itinerary, *moved);

    planner
        .reorder_activity(0, 2, 0)
        .expect("reorder");
    assert!(!planner.is_saved());

    let reloaded = planner.load_saved_trip(&saved.id).expect("load");
    assert!(planner.is_saved());
    assert_eq!(*reloaded, saved.itinerary);
    assert_eq!(planner.session().trip_details(), Some(&lisbon()));

    planner.delete_saved_trip(&saved.id).expect("delete");
    assert!(planner.saved_trips().is_empty());

    planner.reset();
    assert_eq!(planner.screen(), AppScreen::Landing);
    assert!(planner.itinerary().is_none());
}

#[tokio::test]
async fn saving_twice_keeps_one_snapshot() {
    let mut planner = controller_with(Arc::new(ScriptedProvider::default()));
    planner.submit_trip(lisbon()).await.expect("itinerary");

    let first = planner.save_trip().expect("save");
    let again = planner.save_trip().expect("save again");
    assert_eq!(again.id, first.id);
    assert_eq!(planner.saved_trips().len(), 1);

    planner.load_saved_trip(&first.id).expect("load");
    assert_eq!(planner.save_trip().expect("save loaded").id, first.id);
    assert_eq!(planner.saved_trips().len(), 1);

    planner.reorder_activity(0, 2, 0).expect("reorder");
    let edited = planner.save_trip().expect("save edited");
    assert_ne!(edited.id, first.id);
    assert_eq!(planner.saved_trips().len(), 2);
    assert_eq!(planner.save_trip().expect("resave").id, edited.id);
    assert_eq!(planner.saved_trips().len(), 2);
}

#[tokio::test]
async fn drag_and_drop_reorders_within_a_day() {
    let mut planner = controller_with(Arc::new(ScriptedProvider::default()));
    planner.submit_trip(lisbon()).await.expect("itinerary");

    planner.drag_start(0, 0);
    planner.drag_over(2);
    assert_eq!(
        planner.drag_state(),
        DragState::Hovering {
            day: 0,
            source: 0,
            target: 2
        }
    );

    let reordered = planner
        .drop_activity(0, 2)
        .expect("drop")
        .expect("reordered");
    let titles: Vec<_> = reordered.days[0]
        .activities
        .iter()
        .map(|activity| activity.title.as_str())
        .collect();
    assert_eq!(titles, ["B", "C", "A"]);
    assert_eq!(times(&reordered, 0), ["10:15 AM", "11:00 AM", "12:00 PM"]);
    assert_eq!(planner.drag_state(), DragState::Idle);

    planner.drag_start(0, 1);
    assert!(planner.drop_activity(1, 0).expect("cross-day drop").is_none());
    planner.drag_start(0, 1);
    planner.drag_leave();
    planner.drag_end();
    assert_eq!(planner.drag_state(), DragState::Idle);
}

#[tokio::test]
async fn generation_failure_is_reported_and_retry_recovers() {
    let provider = Arc::new(ScriptedProvider::failing_first(AiErrorCode::RateLimit));
    let mut planner = controller_with(Arc::clone(&provider));
    planner.start_new_planner();

    let error = planner.submit_trip(lisbon()).await.expect_err("rate limited");
    assert_eq!(error.code, "RATE_LIMIT");
    assert_eq!(error.message, AiErrorCode::RateLimit.user_message());
    assert_eq!(error.icon(), Some("hourglass"));
    assert_eq!(planner.last_error(), Some(&error));
    assert!(planner.itinerary().is_none());
    assert!(!planner.is_loading());

    let itinerary = planner.retry().await.expect("retry");
    assert_eq!(itinerary.title, "Lisbon, Portugal in two days");
    assert!(planner.last_error().is_none());
    assert_eq!(provider.itinerary_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalid_details_never_reach_the_provider() {
    let provider = Arc::new(ScriptedProvider::default());
    let mut planner = controller_with(Arc::clone(&provider));

    let mut details = lisbon();
    details.days = 15;
    let error = planner.submit_trip(details).await.expect_err("invalid");

    assert_eq!(error.code, "VALIDATION_ERROR");
    assert_eq!(provider.itinerary_calls.load(Ordering::SeqCst), 0);
    assert!(planner.last_error().is_none());
}

#[tokio::test]
async fn image_failure_uses_fallback_hero() {
    let provider = Arc::new(ScriptedProvider {
        image_fails: true,
        ..Default::default()
    });
    let mut planner = controller_with(provider);

    let itinerary = planner.submit_trip(lisbon()).await.expect("itinerary");
    assert_eq!(
        itinerary.hero_image.as_ref().map(|hero| hero.url.as_str()),
        Some(FALLBACK_HERO_IMAGE_URL)
    );
}

#[tokio::test]
async fn booking_search_and_selection() {
    let provider = Arc::new(ScriptedProvider::default());
    let mut planner = controller_with(Arc::clone(&provider));
    planner.submit_trip(lisbon()).await.expect("itinerary");
    planner.set_view(PlannerView::Booking);

    let missing_origin = planner
        .search_options(SearchRequest::Flights {
            origin: "  ".into(),
            trip_type: TripType::Round,
        })
        .await
        .expect_err("origin required");
    assert_eq!(missing_origin.code, "VALIDATION_ERROR");
    assert!(provider.search_queries.lock().expect("lock").is_empty());

    let result = planner
        .search_options(SearchRequest::Hotels {
            tier: BudgetTier::Luxury,
        })
        .await
        .expect("search");
    assert!(result.grounded);
    let queries = provider.search_queries.lock().expect("lock").clone();
    assert_eq!(queries.len(), 1);
    assert!(queries[0].contains("Lisbon, Portugal"));

    let links = planner.manual_search_links("Porto").expect("links");
    assert!(links.flights.starts_with("https://www.google.com/travel/flights"));
    assert!(links.hotels.contains("Lisbon"));

    let itinerary = planner
        .select_option(SearchCategory::Hotels, HOTEL_SECTION)
        .expect("select hotel");
    assert_eq!(planner.view(), PlannerView::Itinerary);
    let hotel = itinerary.selected_hotel.as_ref().expect("hotel");
    assert_eq!(hotel.name, "Casa do Principe");
    assert!(!planner.is_saved());

    *provider.search_failure.lock().expect("lock") = Some(AiErrorCode::RateLimit);
    let limited = planner
        .search_options(SearchRequest::Flights {
            origin: "Porto".into(),
            trip_type: TripType::OneWay,
        })
        .await
        .expect_err("rate limited");
    assert_eq!(limited.message, SEARCH_RATE_LIMIT_MESSAGE);

    let suggestions = planner.destination_suggestions("Li").await;
    assert_eq!(suggestions.len(), 2);
}

#[tokio::test]
async fn saved_trips_load_from_sqlite_on_next_launch() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("tripwise.sqlite");
    let provider = Arc::new(ScriptedProvider::default());

    let saved_id = {
        let pool = DbPool::new(&db_path).expect("pool");
        let state = AppState::with_services(
            TravelAiService::with_provider(Arc::clone(&provider) as Arc<dyn TravelAiProvider>),
            Arc::new(SqliteKeyValueStore::new(pool)),
        );
        let mut planner = PlannerController::new(state).expect("controller");
        planner.submit_trip(lisbon()).await.expect("itinerary");
        planner.save_trip().expect("save").id
    };

    let pool = DbPool::new(&db_path).expect("pool");
    let state = AppState::with_services(
        TravelAiService::with_provider(provider),
        Arc::new(SqliteKeyValueStore::new(pool)),
    );
    let mut planner = PlannerController::new(state).expect("controller");

    assert_eq!(planner.saved_trips().len(), 1);
    let itinerary = planner.load_saved_trip(&saved_id).expect("load");
    assert_eq!(planner.screen(), AppScreen::Planner);
    assert_eq!(itinerary.days.len(), 2);
    assert!(planner.is_saved());
}
