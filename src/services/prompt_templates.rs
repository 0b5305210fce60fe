use serde_json::{json, Value as JsonValue};

use crate::models::search::SearchCategory;
use crate::models::trip::TripDetails;

/// Number of destination suggestions requested and kept.
pub const SUGGESTION_LIMIT: usize = 5;

/// Prompt for a full day-by-day itinerary.
pub fn itinerary_prompt(details: &TripDetails) -> String {
    let mut prompt = format!(
        "Create a bespoke travel itinerary for a {days}-day trip to {destination} starting on {start}.\n\
         Objective: {objective}.\n\
         Detailed Plan: Include title, summary, heroSearchTerm (3 tags), and daily theme with weather and activities.\n\
         Give every activity a clock time such as \"9:00 AM\" and a duration such as \"1h 30m\".",
        days = details.days,
        destination = details.destination,
        start = details.start_date,
        objective = details.objective,
    );
    if let Some(source) = details.source.as_deref().filter(|s| !s.trim().is_empty()) {
        prompt.push_str(&format!("\nThe traveller departs from {source}."));
    }
    prompt
}

/// Response schema the itinerary answer must satisfy.
pub fn itinerary_response_schema() -> JsonValue {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "summary": { "type": "STRING" },
            "heroSearchTerm": { "type": "STRING" },
            "days": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "day": { "type": "NUMBER" },
                        "theme": { "type": "STRING" },
                        "weather": {
                            "type": "OBJECT",
                            "properties": {
                                "condition": { "type": "STRING" },
                                "tempHigh": { "type": "NUMBER" },
                                "tempLow": { "type": "NUMBER" }
                            }
                        },
                        "activities": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "time": { "type": "STRING" },
                                    "duration": { "type": "STRING" },
                                    "title": { "type": "STRING" },
                                    "description": { "type": "STRING" },
                                    "location": { "type": "STRING" }
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

pub fn suggestions_prompt(partial: &str) -> String {
    format!(
        "Task: Provide exactly {SUGGESTION_LIMIT} real-world travel destinations (City, Country) that start with or closely match: \"{partial}\".\n\
         Format: JSON array of strings only."
    )
}

pub fn suggestions_response_schema() -> JsonValue {
    json!({ "type": "ARRAY", "items": { "type": "STRING" } })
}

pub fn hero_image_prompt(destination: &str, search_term: Option<&str>) -> String {
    let context = search_term
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .unwrap_or("scenic vista");
    format!(
        "A professional, ultra-high resolution travel photography image of {destination}.\n\
         Style: Cinematic, professional photography, stunning lighting, wide angle, vibrant colors.\n\
         Context: {context}. No text, no logos, no watermarks."
    )
}

fn structural_rules(category: SearchCategory) -> &'static str {
    match category {
        SearchCategory::Flights => {
            "Provide 3 current flight options. Use this format:
[OPTION_START]
NAME: [Airline]
DURATION: [h/m]
STOPS: [Stops]
TIMES: [Window]
LAYOVERS: [Cities/None]
PRICE: [Cost]
TAG: [Label]
REASONING: [Why]
[OPTION_END]
---"
        }
        SearchCategory::Hotels => {
            "Provide 3 real hotel options. Use this format:
[OPTION_START]
NAME: [Name]
RATING: [Score]
PRICE: [Rate]
TAG: [Label]
REASONING: [Why]
CONTEXT: [Atmosphere]
[OPTION_END]
---"
        }
    }
}

/// Prompt asking for three labeled option blocks.
pub fn search_prompt(query: &str, category: SearchCategory, grounded: bool) -> String {
    let sourcing = if grounded {
        "Use real-time search data."
    } else {
        "Use your internal knowledge if live search is limited."
    };
    format!(
        "Task: {query}.\n\
         Requirement: Return ONLY 3 structured blocks using the format provided.\n\
         {sourcing}\n\n\
         {rules}",
        rules = structural_rules(category)
    )
}
