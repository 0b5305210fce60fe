use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::itinerary::Itinerary;

pub const MIN_TRIP_DAYS: u32 = 1;
pub const MAX_TRIP_DAYS: u32 = 14;

pub const TRIP_OBJECTIVES: [&str; 7] = [
    "Sightseeing",
    "Food Exploration",
    "Shopping",
    "Adventure Sports",
    "Relaxation",
    "Cultural Immersion",
    "Nightlife",
];

/// Planning inputs submitted by the traveller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TripDetails {
    pub destination: String,
    pub days: u32,
    pub objective: String,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl TripDetails {
    pub fn validate(&self) -> AppResult<()> {
        if self.destination.trim().is_empty() {
            return Err(AppError::validation("destination must not be empty"));
        }
        if !(MIN_TRIP_DAYS..=MAX_TRIP_DAYS).contains(&self.days) {
            return Err(AppError::validation_with_details(
                "trip length out of range",
                json!({ "days": self.days, "min": MIN_TRIP_DAYS, "max": MAX_TRIP_DAYS }),
            ));
        }
        if self.objective.trim().is_empty() {
            return Err(AppError::validation("objective must not be empty"));
        }
        Ok(())
    }
}

/// A persisted snapshot of a planned trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedTrip {
    pub id: String,
    pub details: TripDetails,
    pub itinerary: Itinerary,
    pub saved_at: DateTime<Utc>,
}
