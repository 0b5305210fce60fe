use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use reqwest::Url;
use serde::Serialize;

use crate::models::itinerary::{FlightInfo, HotelInfo};
use crate::models::search::{BudgetTier, SearchCategory, TripType};

pub const SECTION_SEPARATOR: &str = "---";
pub const OPTION_END_MARKER: &str = "[OPTION_END]";
/// Sections at or below this many characters (after trimming) are discarded.
pub const MIN_SECTION_CHARS: usize = 30;

const GOOGLE_FLIGHTS_URL: &str = "https://www.google.com/travel/flights";
const GOOGLE_HOTELS_URL: &str = "https://www.google.com/travel/hotels";

static LABEL_PATTERNS: Lazy<Mutex<HashMap<String, Arc<Vec<Regex>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Splits a search answer into its option blocks.
pub fn split_sections(text: &str) -> Vec<&str> {
    text.split(SECTION_SEPARATOR)
        .filter(|section| section.trim().chars().count() > MIN_SECTION_CHARS)
        .collect()
}

/// Reads the value labeled `key` in one option block, or an empty string.
///
/// Accepts `KEY: value`, `**KEY:** value` and a line starting `KEY - value`,
/// case-insensitively. Markdown emphasis and the trailing end marker are
/// stripped.
pub fn extract_value(section: &str, key: &str) -> String {
    for regex in label_patterns(key).iter() {
        let captured = regex
            .captures(section)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
            .filter(|value| !value.is_empty());

        if let Some(raw) = captured {
            let cleaned = raw.trim().replace('*', "");
            let before_marker = cleaned.split(OPTION_END_MARKER).next().unwrap_or_default();
            return before_marker.trim().to_string();
        }
    }

    String::new()
}

/// The three label patterns for `key`, compiled once per key.
fn label_patterns(key: &str) -> Arc<Vec<Regex>> {
    let cache_key = key.to_ascii_uppercase();
    if let Some(cached) = LABEL_PATTERNS
        .lock()
        .ok()
        .and_then(|cache| cache.get(&cache_key).cloned())
    {
        return cached;
    }

    let escaped = regex::escape(key);
    let compiled: Arc<Vec<Regex>> = Arc::new(
        [
            (format!(r"{escaped}:\s*(.*)"), false),
            (format!(r"\*\*{escaped}:\*\*\s*(.*)"), false),
            (format!(r"^{escaped}\s*-\s*(.*)"), true),
        ]
        .iter()
        .filter_map(|(pattern, multi_line)| build_pattern(pattern, *multi_line))
        .collect(),
    );

    match LABEL_PATTERNS.lock() {
        Ok(mut cache) => Arc::clone(cache.entry(cache_key).or_insert(compiled)),
        Err(_) => compiled,
    }
}

fn build_pattern(pattern: &str, multi_line: bool) -> Option<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(multi_line)
        .build()
        .ok()
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

pub fn flight_from_section(section: &str) -> FlightInfo {
    FlightInfo {
        airline: extract_value(section, "NAME"),
        duration: extract_value(section, "DURATION"),
        stops: extract_value(section, "STOPS"),
        price_range: extract_value(section, "PRICE"),
        times: non_empty(extract_value(section, "TIMES")),
        layover_details: non_empty(extract_value(section, "LAYOVERS")),
        amenities: None,
        details: section.to_string(),
    }
}

pub fn hotel_from_section(section: &str) -> HotelInfo {
    HotelInfo {
        name: extract_value(section, "NAME"),
        rating: extract_value(section, "RATING"),
        price_range: extract_value(section, "PRICE"),
        highlight: extract_value(section, "TAG"),
        details: section.to_string(),
    }
}

/// Display view of one search option with placeholder text for missing fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionCard {
    pub category: SearchCategory,
    pub name: String,
    pub price: String,
    pub rating: String,
    pub duration: String,
    pub stops: String,
    pub tag: String,
    pub times: Option<String>,
    pub layovers: Option<String>,
    pub context: Option<String>,
    pub reasoning: Option<String>,
    pub section: String,
}

impl OptionCard {
    pub fn from_section(section: &str, category: SearchCategory) -> Self {
        let or_default = |key: &str, fallback: &str| {
            non_empty(extract_value(section, key)).unwrap_or_else(|| fallback.to_string())
        };
        let default_tag = match category {
            SearchCategory::Flights => "Top Choice",
            SearchCategory::Hotels => "Curated Stay",
        };

        Self {
            category,
            name: or_default("NAME", "Discovery Option"),
            price: or_default("PRICE", "Check Live Rate"),
            rating: or_default("RATING", "4.5/5"),
            duration: or_default("DURATION", "See Details"),
            stops: or_default("STOPS", "Direct"),
            tag: or_default("TAG", default_tag),
            times: non_empty(extract_value(section, "TIMES")),
            layovers: non_empty(extract_value(section, "LAYOVERS")),
            context: non_empty(extract_value(section, "CONTEXT")),
            reasoning: non_empty(extract_value(section, "REASONING")),
            section: section.to_string(),
        }
    }

    /// Cards for every usable block of a search answer.
    pub fn parse_all(text: &str, category: SearchCategory) -> Vec<Self> {
        split_sections(text)
            .into_iter()
            .map(|section| Self::from_section(section, category))
            .collect()
    }
}

pub fn flight_search_query(
    trip_type: TripType,
    origin: &str,
    destination: &str,
    start_date: NaiveDate,
) -> String {
    format!(
        "{} flight options from {origin} to {destination} departing around {start_date}",
        trip_type.as_str()
    )
}

pub fn hotel_search_query(tier: BudgetTier, destination: &str, start_date: NaiveDate) -> String {
    format!(
        "Top rated {} hotels and stays in {destination} for the period of {start_date}",
        tier.as_str()
    )
}

/// Manual Google Flights link offered next to (or instead of) AI results.
pub fn google_flights_url(origin: &str, destination: &str, start_date: NaiveDate) -> String {
    let origin = match origin.trim() {
        "" => "anywhere",
        trimmed => trimmed,
    };
    manual_link(
        GOOGLE_FLIGHTS_URL,
        format!("Flights from {origin} to {destination} on {start_date}"),
    )
}

pub fn google_hotels_url(destination: &str, start_date: NaiveDate) -> String {
    manual_link(
        GOOGLE_HOTELS_URL,
        format!("Hotels in {destination} on {start_date}"),
    )
}

fn manual_link(base: &str, query: String) -> String {
    Url::parse_with_params(base, &[("q", query.as_str())])
        .map(String::from)
        .unwrap_or_else(|_| base.to_string())
}
