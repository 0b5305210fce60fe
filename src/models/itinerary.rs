use std::sync::Arc;

use reqwest::Url;
use serde::{Deserialize, Serialize};

const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/";

/// One scheduled event within a day.
///
/// `time` and `duration` stay free-form display text; they are parsed on
/// demand by the timing utilities and never cached as numbers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Activity {
    pub fn maps_url(&self) -> Option<String> {
        let location = self.location.as_deref()?.trim();
        if location.is_empty() {
            return None;
        }
        Url::parse_with_params(MAPS_SEARCH_URL, &[("api", "1"), ("query", location)])
            .ok()
            .map(String::from)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WeatherInfo {
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub temp_high: f64,
    #[serde(default)]
    pub temp_low: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeatherKind {
    Sunny,
    Rainy,
    Stormy,
    Snowy,
    Cloudy,
}

impl WeatherInfo {
    pub fn kind(&self) -> WeatherKind {
        let lower = self.condition.to_lowercase();
        if lower.contains("sun") || lower.contains("clear") {
            WeatherKind::Sunny
        } else if lower.contains("rain") || lower.contains("shower") {
            WeatherKind::Rainy
        } else if lower.contains("storm") || lower.contains("thunder") {
            WeatherKind::Stormy
        } else if lower.contains("snow") {
            WeatherKind::Snowy
        } else {
            WeatherKind::Cloudy
        }
    }
}

/// One day of the itinerary. Activity order is the schedule order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    pub day: u32,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherInfo>,
}

impl DayPlan {
    /// Copy of this day carrying a replacement activity list.
    pub fn with_activities(&self, activities: Vec<Activity>) -> Self {
        Self {
            day: self.day,
            theme: self.theme.clone(),
            activities,
            weather: self.weather.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FlightInfo {
    pub airline: String,
    pub duration: String,
    pub stops: String,
    pub price_range: String,
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layover_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amenities: Option<String>,
}

impl FlightInfo {
    /// Layover text worth displaying; `None` and "None" are both treated as direct.
    pub fn layover_summary(&self) -> Option<&str> {
        self.layover_details
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("none"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HotelInfo {
    pub name: String,
    pub rating: String,
    pub price_range: String,
    pub highlight: String,
    pub details: String,
}

impl HotelInfo {
    /// Reads a `KEY: value` line out of the raw provider block.
    pub fn detail_value(&self, key: &str) -> Option<String> {
        let prefix = format!("{key}:");
        self.details
            .lines()
            .find(|line| line.starts_with(&prefix))
            .map(|line| line[prefix.len()..].trim().replace('*', ""))
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HeroImage {
    pub url: String,
    pub photographer_name: String,
    pub photographer_url: String,
}

/// The full trip plan.
///
/// Never mutated in place once handed to the planner session: every edit
/// builds a new value and untouched days are shared through their `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub hero_search_term: String,
    #[serde(default)]
    pub days: Vec<Arc<DayPlan>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_flight: Option<FlightInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_hotel: Option<HotelInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_image: Option<HeroImage>,
}

impl Itinerary {
    pub fn day(&self, index: usize) -> Option<&DayPlan> {
        self.days.get(index).map(Arc::as_ref)
    }

    /// New itinerary with the day at `index` replaced; other days keep their `Arc`.
    pub fn with_day(&self, index: usize, day: DayPlan) -> Self {
        let mut next = self.clone();
        if let Some(slot) = next.days.get_mut(index) {
            *slot = Arc::new(day);
        }
        next
    }

    pub fn with_flight(&self, flight: FlightInfo) -> Self {
        Self {
            selected_flight: Some(flight),
            ..self.clone()
        }
    }

    pub fn with_hotel(&self, hotel: HotelInfo) -> Self {
        Self {
            selected_hotel: Some(hotel),
            ..self.clone()
        }
    }

    pub fn with_hero_image(&self, hero_image: HeroImage) -> Self {
        Self {
            hero_image: Some(hero_image),
            ..self.clone()
        }
    }
}
