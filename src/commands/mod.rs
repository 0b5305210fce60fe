pub mod planner;

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use tracing::{error, warn};

use crate::db::DbPool;
use crate::error::{AiErrorCode, AppError, AppResult};
use crate::services::ai_service::TravelAiService;
use crate::services::trip_store::{KeyValueStore, SqliteKeyValueStore};

pub const SEARCH_RATE_LIMIT_MESSAGE: &str = "Our AI engine is currently at capacity. Please use the verified search platforms below for real-time results.";
pub const SEARCH_FAILURE_MESSAGE: &str =
    "Something went wrong with the AI search. Please try again or use the manual links.";

/// Shared services behind the planner.
#[derive(Clone)]
pub struct AppState {
    ai_service: Arc<TravelAiService>,
    kv_store: Arc<dyn KeyValueStore>,
}

impl AppState {
    pub fn new(db_pool: DbPool) -> AppResult<Self> {
        let ai_service = Arc::new(TravelAiService::from_env()?);
        let kv_store: Arc<dyn KeyValueStore> = Arc::new(SqliteKeyValueStore::new(db_pool));
        Ok(Self {
            ai_service,
            kv_store,
        })
    }

    pub fn with_services(ai_service: TravelAiService, kv_store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            ai_service: Arc::new(ai_service),
            kv_store,
        }
    }

    pub fn ai(&self) -> Arc<TravelAiService> {
        Arc::clone(&self.ai_service)
    }

    pub fn kv_store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.kv_store)
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Error payload the UI renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl CommandError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details,
        }
    }

    /// Maps a failed travel search to the search panel's wording.
    pub fn for_search(error: AppError) -> Self {
        match error.ai_code() {
            Some(AiErrorCode::RateLimit) => CommandError::new(
                AiErrorCode::RateLimit.as_str(),
                SEARCH_RATE_LIMIT_MESSAGE,
                Some(json!({ "icon": AiErrorCode::RateLimit.icon() })),
            ),
            Some(code) => CommandError::new(
                code.as_str(),
                SEARCH_FAILURE_MESSAGE,
                Some(json!({ "icon": code.icon() })),
            ),
            None => CommandError::from(error),
        }
    }

    pub fn icon(&self) -> Option<&str> {
        self.details
            .as_ref()
            .and_then(|details| details.get("icon"))
            .and_then(JsonValue::as_str)
    }
}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Validation { message, details } => {
                CommandError::new("VALIDATION_ERROR", message, details)
            }
            AppError::NotFound => {
                CommandError::new("NOT_FOUND", "The requested trip no longer exists.", None)
            }
            AppError::Ai {
                code,
                message,
                details,
            } => {
                let mut merged = JsonMap::new();
                if let Some(existing) = details {
                    match existing {
                        JsonValue::Object(map) => merged.extend(map),
                        value => {
                            merged.insert("info".to_string(), value);
                        }
                    }
                }
                merged.insert("icon".to_string(), JsonValue::from(code.icon()));
                merged.insert("reason".to_string(), JsonValue::String(message));
                warn!(target: "app::command", code = %code, "ai error in command");
                CommandError::new(
                    code.as_str(),
                    code.user_message(),
                    Some(JsonValue::Object(merged)),
                )
            }
            AppError::Database { message } => {
                error!(target: "app::command", %message, "database error in command");
                CommandError::new("UNKNOWN", message, None)
            }
            AppError::Serialization(error) => {
                error!(target: "app::command", error = %error, "serialization error in command");
                CommandError::new("UNKNOWN", "Failed to serialize trip data.", None)
            }
            AppError::Io(error) => {
                error!(target: "app::command", error = %error, "io error in command");
                CommandError::new("UNKNOWN", "Failed to read or write local files.", None)
            }
            AppError::Other(message) => {
                error!(target: "app::command", %message, "unexpected error in command");
                CommandError::new("UNKNOWN", message, None)
            }
        }
    }
}
