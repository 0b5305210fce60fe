use std::fmt;

use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

/// Closed set of failure kinds surfaced by the generative-AI collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiErrorCode {
    RateLimit,
    Network,
    Auth,
    Safety,
    ServiceUnavailable,
}

impl AiErrorCode {
    pub const ALL: [AiErrorCode; 5] = [
        AiErrorCode::RateLimit,
        AiErrorCode::Network,
        AiErrorCode::Auth,
        AiErrorCode::Safety,
        AiErrorCode::ServiceUnavailable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AiErrorCode::RateLimit => "RATE_LIMIT",
            AiErrorCode::Network => "NETWORK",
            AiErrorCode::Auth => "AUTH",
            AiErrorCode::Safety => "SAFETY",
            AiErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }

    /// Message shown to the traveller when itinerary generation fails.
    pub fn user_message(self) -> &'static str {
        match self {
            AiErrorCode::RateLimit => {
                "Our AI engine is currently at capacity due to high demand. Please wait a moment and try again."
            }
            AiErrorCode::Network => {
                "We couldn't reach the planning service. Please check your connection and try again."
            }
            AiErrorCode::Auth => {
                "The planning service rejected our credentials. Please verify the API key configuration."
            }
            AiErrorCode::Safety => {
                "This request was blocked by content safety filters. Try adjusting your destination or objective."
            }
            AiErrorCode::ServiceUnavailable => {
                "We encountered an issue while crafting your journey. Please check your connection and try again."
            }
        }
    }

    /// Icon identifier the UI renders next to the message.
    pub fn icon(self) -> &'static str {
        match self {
            AiErrorCode::RateLimit => "hourglass",
            AiErrorCode::Network => "wifi-off",
            AiErrorCode::Auth => "key-round",
            AiErrorCode::Safety => "shield-alert",
            AiErrorCode::ServiceUnavailable => "alert-triangle",
        }
    }
}

impl fmt::Display for AiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {message}")]
    Database { message: String },

    #[error("record not found")]
    NotFound,

    #[error("validation failed: {message}")]
    Validation {
        message: String,
        details: Option<JsonValue>,
    },

    #[error("{message}")]
    Ai {
        code: AiErrorCode,
        message: String,
        details: Option<JsonValue>,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "validation error");
        AppError::Validation {
            message,
            details: None,
        }
    }

    pub fn validation_with_details(message: impl Into<String>, details: JsonValue) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, details = %details, "validation error with details");
        AppError::Validation {
            message,
            details: Some(details),
        }
    }

    pub fn ai(code: AiErrorCode, message: impl Into<String>) -> Self {
        Self::ai_with_details(code, message, None)
    }

    pub fn ai_with_details(
        code: AiErrorCode,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        let message = message.into();
        match &details {
            Some(payload) => {
                warn!(target: "app::ai::error", code = %code, details = %payload, %message);
            }
            None => {
                warn!(target: "app::ai::error", code = %code, %message);
            }
        }

        AppError::Ai {
            code,
            message,
            details,
        }
    }

    pub fn ai_code(&self) -> Option<AiErrorCode> {
        match self {
            AppError::Ai { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn ai_details(&self) -> Option<&JsonValue> {
        match self {
            AppError::Ai { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    pub fn not_found() -> Self {
        warn!(target: "app::database", "resource not found");
        AppError::NotFound
    }

    pub fn database(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::database", %message, "database error");
        AppError::Database { message }
    }

    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::other", %message, "other error");
        AppError::Other(message)
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        match &error {
            rusqlite::Error::QueryReturnedNoRows => AppError::not_found(),
            _ => {
                error!(target: "app::database", error = ?error, "sqlite error");
                AppError::database(error.to_string())
            }
        }
    }
}
