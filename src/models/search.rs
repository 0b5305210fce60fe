use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchCategory {
    Flights,
    Hotels,
}

impl SearchCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchCategory::Flights => "flights",
            SearchCategory::Hotels => "hotels",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebSource {
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

/// A citation returned when live search grounding was used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GroundingChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub text: String,
    #[serde(default)]
    pub sources: Vec<GroundingChunk>,
    #[serde(default)]
    pub grounded: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TripType {
    #[default]
    Round,
    OneWay,
}

impl TripType {
    pub fn as_str(self) -> &'static str {
        match self {
            TripType::Round => "round",
            TripType::OneWay => "one-way",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BudgetTier {
    Value,
    #[default]
    Standard,
    Premium,
    Luxury,
}

impl BudgetTier {
    pub fn as_str(self) -> &'static str {
        match self {
            BudgetTier::Value => "Value",
            BudgetTier::Standard => "Standard",
            BudgetTier::Premium => "Premium",
            BudgetTier::Luxury => "Luxury",
        }
    }
}
