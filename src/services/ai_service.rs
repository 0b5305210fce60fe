use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use base64::Engine as _;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AiErrorCode, AppError, AppResult};
use crate::models::itinerary::{HeroImage, Itinerary};
use crate::models::search::{GroundingChunk, SearchCategory, SearchResult};
use crate::models::trip::TripDetails;
use crate::services::prompt_templates::{
    hero_image_prompt, itinerary_prompt, itinerary_response_schema, search_prompt,
    suggestions_prompt, suggestions_response_schema, SUGGESTION_LIMIT,
};
use crate::utils::redact::redact_payload;

pub const FALLBACK_HERO_IMAGE_URL: &str = "https://images.unsplash.com/photo-1469854523086-cc02fe5d8800?ixlib=rb-4.0.3&auto=format&fit=crop&w=1600&q=80";
pub const FALLBACK_PHOTOGRAPHER: &str = "Travel Collection";
pub const GENERATED_IMAGE_ARTIST: &str = "TripWise AI Artist";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_ITINERARY_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_SUGGESTION_MODEL: &str = "gemini-flash-lite-latest";
const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

const SEARCH_MAX_OUTPUT_TOKENS: u32 = 2000;
/// Grounded answers shorter than this are treated as unusable.
const MIN_SEARCH_TEXT_CHARS: usize = 50;
const MIN_SUGGESTION_INPUT_CHARS: usize = 2;

const SAFETY_FINISH_REASONS: [&str; 5] = [
    "SAFETY",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
    "IMAGE_SAFETY",
];

/// Generative-AI operations the planner depends on.
#[async_trait::async_trait]
pub trait TravelAiProvider: Send + Sync {
    async fn generate_itinerary(&self, details: &TripDetails) -> AppResult<Itinerary>;

    async fn generate_image(
        &self,
        destination: &str,
        search_term: Option<&str>,
    ) -> AppResult<HeroImage>;

    async fn destination_suggestions(&self, partial: &str) -> AppResult<Vec<String>>;

    async fn search_travel(
        &self,
        query: &str,
        category: SearchCategory,
        grounded: bool,
    ) -> AppResult<SearchResult>;
}

#[derive(Debug, Clone)]
pub struct AiServiceConfig {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub itinerary_model: String,
    pub suggestion_model: String,
    pub image_model: String,
    pub http_timeout: StdDuration,
    pub image_timeout: StdDuration,
}

impl AiServiceConfig {
    pub fn from_env() -> Self {
        let api_key = ["TRIPWISE_GEMINI_API_KEY", "GEMINI_API_KEY", "API_KEY"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty());
        let env_or = |name: &str, default: &str| {
            std::env::var(name)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            api_key,
            api_base_url: env_or("TRIPWISE_GEMINI_BASE_URL", DEFAULT_BASE_URL),
            itinerary_model: env_or("TRIPWISE_ITINERARY_MODEL", DEFAULT_ITINERARY_MODEL),
            suggestion_model: env_or("TRIPWISE_SUGGESTION_MODEL", DEFAULT_SUGGESTION_MODEL),
            image_model: env_or("TRIPWISE_IMAGE_MODEL", DEFAULT_IMAGE_MODEL),
            http_timeout: StdDuration::from_secs(60),
            image_timeout: StdDuration::from_secs(30),
        }
    }

    /// Configuration pointing at `base_url` with the default models.
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            api_base_url: base_url.into(),
            itinerary_model: DEFAULT_ITINERARY_MODEL.to_string(),
            suggestion_model: DEFAULT_SUGGESTION_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            http_timeout: StdDuration::from_secs(60),
            image_timeout: StdDuration::from_secs(30),
        }
    }

    fn build_provider(&self) -> AppResult<Option<Arc<dyn TravelAiProvider>>> {
        match &self.api_key {
            Some(api_key) => {
                let provider = GeminiProvider::try_new(self, api_key.clone())?;
                Ok(Some(Arc::new(provider)))
            }
            None => {
                warn!(target: "app::ai", "Gemini API key is not configured");
                Ok(None)
            }
        }
    }
}

/// Applies the planner's fail-soft policies on top of a provider.
#[derive(Clone)]
pub struct TravelAiService {
    provider: Option<Arc<dyn TravelAiProvider>>,
    image_timeout: StdDuration,
}

impl TravelAiService {
    pub fn new(config: &AiServiceConfig) -> AppResult<Self> {
        Ok(Self {
            provider: config.build_provider()?,
            image_timeout: config.image_timeout,
        })
    }

    pub fn from_env() -> AppResult<Self> {
        Self::new(&AiServiceConfig::from_env())
    }

    pub fn with_provider(provider: Arc<dyn TravelAiProvider>) -> Self {
        Self {
            provider: Some(provider),
            image_timeout: StdDuration::from_secs(30),
        }
    }

    pub fn with_image_timeout(mut self, timeout: StdDuration) -> Self {
        self.image_timeout = timeout;
        self
    }

    pub fn has_configured_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Errors propagate; retrying is left to the caller.
    pub async fn generate_itinerary(&self, details: &TripDetails) -> AppResult<Itinerary> {
        let provider = self.current_provider()?;
        let started = Instant::now();
        let itinerary = provider.generate_itinerary(details).await?;
        info!(
            target: "app::ai",
            destination = %details.destination,
            days = itinerary.days.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "itinerary generated"
        );
        Ok(itinerary)
    }

    /// Always yields an image; any failure or timeout falls back to the
    /// curated stock photo.
    pub async fn generate_destination_image(
        &self,
        destination: &str,
        search_term: Option<&str>,
    ) -> HeroImage {
        let Ok(provider) = self.current_provider() else {
            return fallback_hero_image();
        };

        match tokio::time::timeout(
            self.image_timeout,
            provider.generate_image(destination, search_term),
        )
        .await
        {
            Ok(Ok(image)) => image,
            Ok(Err(error)) => {
                warn!(target: "app::ai", error = %error, "hero image failed; using fallback");
                fallback_hero_image()
            }
            Err(_) => {
                warn!(
                    target: "app::ai",
                    timeout_ms = self.image_timeout.as_millis() as u64,
                    "hero image timed out; using fallback"
                );
                fallback_hero_image()
            }
        }
    }

    /// Up to five destinations; failures read as "no suggestions".
    pub async fn destination_suggestions(&self, partial: &str) -> Vec<String> {
        let trimmed = partial.trim();
        if trimmed.chars().count() < MIN_SUGGESTION_INPUT_CHARS {
            return Vec::new();
        }
        let Ok(provider) = self.current_provider() else {
            return Vec::new();
        };

        match provider.destination_suggestions(trimmed).await {
            Ok(mut suggestions) => {
                suggestions.truncate(SUGGESTION_LIMIT);
                suggestions
            }
            Err(error) => {
                warn!(target: "app::ai", error = %error, "destination suggestions failed");
                Vec::new()
            }
        }
    }

    /// Grounded search first, then a single ungrounded attempt.
    ///
    /// A rate-limit error from the grounded attempt is returned as-is. Any
    /// other grounded failure, or a grounded answer without usable option
    /// blocks, triggers the ungrounded attempt, whose outcome is final.
    pub async fn search_travel_options(
        &self,
        query: &str,
        category: SearchCategory,
    ) -> AppResult<SearchResult> {
        let provider = self.current_provider()?;

        match provider.search_travel(query, category, true).await {
            Ok(result) if passes_format_check(&result.text) => return Ok(result),
            Ok(result) => {
                warn!(
                    target: "app::ai",
                    category = category.as_str(),
                    text_len = result.text.len(),
                    "grounded search failed format check; retrying without grounding"
                );
            }
            Err(error) if error.ai_code() == Some(AiErrorCode::RateLimit) => return Err(error),
            Err(error) => {
                warn!(
                    target: "app::ai",
                    category = category.as_str(),
                    error = %error,
                    "grounded search failed; retrying without grounding"
                );
            }
        }

        provider.search_travel(query, category, false).await
    }

    fn current_provider(&self) -> AppResult<Arc<dyn TravelAiProvider>> {
        self.provider.clone().ok_or_else(|| {
            AppError::ai(
                AiErrorCode::ServiceUnavailable,
                "Gemini API key is not configured",
            )
        })
    }
}

pub fn fallback_hero_image() -> HeroImage {
    HeroImage {
        url: FALLBACK_HERO_IMAGE_URL.to_string(),
        photographer_name: FALLBACK_PHOTOGRAPHER.to_string(),
        photographer_url: "#".to_string(),
    }
}

/// Whether a search answer looks like labeled option blocks.
pub fn passes_format_check(text: &str) -> bool {
    text.chars().count() >= MIN_SEARCH_TEXT_CHARS && text.contains("NAME:")
}

#[derive(Clone, Copy)]
enum GeminiOperation {
    Itinerary,
    Suggestions,
    Image,
    Search,
}

impl GeminiOperation {
    fn as_str(self) -> &'static str {
        match self {
            GeminiOperation::Itinerary => "generateItinerary",
            GeminiOperation::Suggestions => "destinationSuggestions",
            GeminiOperation::Image => "generateImage",
            GeminiOperation::Search => "searchTravel",
        }
    }
}

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    itinerary_model: String,
    suggestion_model: String,
    image_model: String,
}

impl GeminiProvider {
    pub fn try_new(config: &AiServiceConfig, api_key: String) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Some(StdDuration::from_secs(90)))
            .build()
            .map_err(|err| AppError::other(format!("failed to build Gemini HTTP client: {err}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            itinerary_model: config.itinerary_model.clone(),
            suggestion_model: config.suggestion_model.clone(),
            image_model: config.image_model.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    async fn generate_content(
        &self,
        operation: GeminiOperation,
        model: &str,
        body: JsonValue,
    ) -> AppResult<JsonValue> {
        let correlation_id = Uuid::new_v4().to_string();
        let sanitized = serde_json::to_string(&redact_payload(&body))
            .unwrap_or_else(|_| "\"<redacted>\"".to_string());

        debug!(
            target: "app::ai::gemini",
            operation = operation.as_str(),
            model,
            correlation_id = %correlation_id,
            payload = %sanitized,
            "invoking Gemini"
        );

        let started = Instant::now();
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| Self::error_from_reqwest(err, &correlation_id))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| Self::error_from_reqwest(err, &correlation_id))?;
        let latency_ms = started.elapsed().as_millis() as u64;

        if !status.is_success() {
            warn!(
                target: "app::ai::gemini",
                operation = operation.as_str(),
                correlation_id = %correlation_id,
                status = status.as_u16(),
                latency_ms,
                "Gemini returned non-success status"
            );
            return Err(Self::map_http_error(status, &text, &correlation_id));
        }

        debug!(
            target: "app::ai::gemini",
            operation = operation.as_str(),
            correlation_id = %correlation_id,
            latency_ms,
            body_len = text.len(),
            "Gemini responded"
        );

        let value: JsonValue = serde_json::from_str(&text).map_err(|err| {
            AppError::ai_with_details(
                AiErrorCode::ServiceUnavailable,
                format!("Gemini response is not valid JSON: {err}"),
                Some(json!({ "correlationId": correlation_id, "reason": "invalid_body" })),
            )
        })?;

        Self::ensure_not_blocked(&value, &correlation_id)?;
        Ok(value)
    }

    fn map_http_error(status: StatusCode, body: &str, correlation_id: &str) -> AppError {
        let lower = body.to_lowercase();
        let details = Some(json!({ "correlationId": correlation_id, "status": status.as_u16() }));

        if status == StatusCode::TOO_MANY_REQUESTS
            || lower.contains("exhausted")
            || lower.contains("rate limit")
        {
            AppError::ai_with_details(
                AiErrorCode::RateLimit,
                "Gemini quota exhausted or rate limited",
                details,
            )
        } else if status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
            || body.contains("API_KEY_INVALID")
        {
            AppError::ai_with_details(
                AiErrorCode::Auth,
                "Gemini rejected the API key",
                details,
            )
        } else {
            AppError::ai_with_details(
                AiErrorCode::ServiceUnavailable,
                format!("Gemini returned status {}", status.as_u16()),
                details,
            )
        }
    }

    fn error_from_reqwest(err: reqwest::Error, correlation_id: &str) -> AppError {
        let details = Some(json!({ "correlationId": correlation_id }));
        if err.is_timeout() {
            AppError::ai_with_details(AiErrorCode::Network, "Gemini request timed out", details)
        } else if err.is_connect() || err.is_request() || err.is_body() {
            AppError::ai_with_details(
                AiErrorCode::Network,
                format!("Gemini network failure: {err}"),
                details,
            )
        } else if let Some(status) = err.status() {
            Self::map_http_error(status, "", correlation_id)
        } else {
            AppError::ai_with_details(
                AiErrorCode::ServiceUnavailable,
                format!("Gemini request failed: {err}"),
                details,
            )
        }
    }

    fn ensure_not_blocked(response: &JsonValue, correlation_id: &str) -> AppResult<()> {
        let block_reason = response
            .pointer("/promptFeedback/blockReason")
            .and_then(JsonValue::as_str);
        let finish_reason = response
            .pointer("/candidates/0/finishReason")
            .and_then(JsonValue::as_str);

        let blocked_by_finish =
            finish_reason.is_some_and(|reason| SAFETY_FINISH_REASONS.contains(&reason));

        if block_reason.is_some() || blocked_by_finish {
            return Err(AppError::ai_with_details(
                AiErrorCode::Safety,
                "Gemini blocked the request on safety grounds",
                Some(json!({
                    "correlationId": correlation_id,
                    "blockReason": block_reason,
                    "finishReason": finish_reason,
                })),
            ));
        }
        Ok(())
    }

    /// Concatenated non-thought text parts of the first candidate.
    fn response_text(response: &JsonValue) -> String {
        response
            .pointer("/candidates/0/content/parts")
            .and_then(JsonValue::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter(|part| !part.get("thought").and_then(JsonValue::as_bool).unwrap_or(false))
                    .filter_map(|part| part.get("text").and_then(JsonValue::as_str))
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    fn grounding_sources(response: &JsonValue) -> Vec<GroundingChunk> {
        response
            .pointer("/candidates/0/groundingMetadata/groundingChunks")
            .cloned()
            .and_then(|chunks| serde_json::from_value(chunks).ok())
            .unwrap_or_default()
    }

    fn parse_json_text<T: DeserializeOwned>(
        response: &JsonValue,
        operation: GeminiOperation,
    ) -> AppResult<T> {
        let text = Self::response_text(response);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AppError::ai_with_details(
                AiErrorCode::ServiceUnavailable,
                "Gemini returned an empty response",
                Some(json!({ "operation": operation.as_str(), "reason": "empty_text" })),
            ));
        }

        let cleaned = if trimmed.starts_with("```") {
            trimmed
                .trim_start_matches("```json")
                .trim_start_matches("```JSON")
                .trim_start_matches("```")
                .trim_end_matches("```")
                .trim()
        } else {
            trimmed
        };

        serde_json::from_str(cleaned).map_err(|err| {
            AppError::ai_with_details(
                AiErrorCode::ServiceUnavailable,
                format!("Gemini response content is not the expected JSON: {err}"),
                Some(json!({ "operation": operation.as_str(), "reason": "invalid_json" })),
            )
        })
    }

    fn user_contents(prompt: &str) -> JsonValue {
        json!([{ "role": "user", "parts": [{ "text": prompt }] }])
    }
}

#[async_trait::async_trait]
impl TravelAiProvider for GeminiProvider {
    async fn generate_itinerary(&self, details: &TripDetails) -> AppResult<Itinerary> {
        let body = json!({
            "contents": Self::user_contents(&itinerary_prompt(details)),
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": itinerary_response_schema(),
                "thinkingConfig": { "thinkingBudget": 0 }
            }
        });
        let response = self
            .generate_content(GeminiOperation::Itinerary, &self.itinerary_model, body)
            .await?;
        Self::parse_json_text(&response, GeminiOperation::Itinerary)
    }

    async fn generate_image(
        &self,
        destination: &str,
        search_term: Option<&str>,
    ) -> AppResult<HeroImage> {
        let body = json!({
            "contents": Self::user_contents(&hero_image_prompt(destination, search_term)),
            "generationConfig": {
                "imageConfig": { "aspectRatio": "16:9" }
            }
        });
        let response = self
            .generate_content(GeminiOperation::Image, &self.image_model, body)
            .await?;

        let inline = response
            .pointer("/candidates/0/content/parts")
            .and_then(JsonValue::as_array)
            .and_then(|parts| parts.iter().find_map(|part| part.get("inlineData")))
            .ok_or_else(|| {
                AppError::ai_with_details(
                    AiErrorCode::ServiceUnavailable,
                    "Gemini returned no image",
                    Some(json!({ "reason": "missing_inline_data" })),
                )
            })?;

        let data = inline
            .get("data")
            .and_then(JsonValue::as_str)
            .unwrap_or_default();
        if data.is_empty() || base64::engine::general_purpose::STANDARD.decode(data).is_err() {
            return Err(AppError::ai_with_details(
                AiErrorCode::ServiceUnavailable,
                "Gemini returned malformed image data",
                Some(json!({ "reason": "invalid_base64" })),
            ));
        }
        let mime_type = inline
            .get("mimeType")
            .and_then(JsonValue::as_str)
            .unwrap_or("image/png");

        Ok(HeroImage {
            url: format!("data:{mime_type};base64,{data}"),
            photographer_name: GENERATED_IMAGE_ARTIST.to_string(),
            photographer_url: "#".to_string(),
        })
    }

    async fn destination_suggestions(&self, partial: &str) -> AppResult<Vec<String>> {
        let body = json!({
            "contents": Self::user_contents(&suggestions_prompt(partial)),
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": suggestions_response_schema(),
                "thinkingConfig": { "thinkingBudget": 0 }
            }
        });
        let response = self
            .generate_content(GeminiOperation::Suggestions, &self.suggestion_model, body)
            .await?;
        Self::parse_json_text(&response, GeminiOperation::Suggestions)
    }

    async fn search_travel(
        &self,
        query: &str,
        category: SearchCategory,
        grounded: bool,
    ) -> AppResult<SearchResult> {
        let mut body = json!({
            "contents": Self::user_contents(&search_prompt(query, category, grounded)),
            "generationConfig": {
                "maxOutputTokens": SEARCH_MAX_OUTPUT_TOKENS,
                "thinkingConfig": { "thinkingBudget": 0 }
            }
        });
        if grounded {
            body["tools"] = json!([{ "google_search": {} }]);
        }

        let response = self
            .generate_content(GeminiOperation::Search, &self.itinerary_model, body)
            .await?;

        Ok(SearchResult {
            text: Self::response_text(&response),
            sources: Self::grounding_sources(&response),
            grounded,
        })
    }
}

pub mod testing {
    use super::*;

    /// Exposes Gemini status classification to integration tests.
    pub fn map_http_error(status: u16, body: &str) -> AppError {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        GeminiProvider::map_http_error(status, body, "test-correlation-id")
    }
}
