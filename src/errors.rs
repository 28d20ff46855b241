use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::ai::AiError;
use crate::models::{FriendError, ShopError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Missing or unknown session")]
    Unauthorized,
    #[error("Not a member of this group")]
    Forbidden,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Shop(#[from] ShopError),
    #[error(transparent)]
    Friend(#[from] FriendError),
    #[error(transparent)]
    Ai(#[from] AiError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Shop(_) | ApiError::Friend(_) => StatusCode::CONFLICT,
            ApiError::Ai(err) => match err {
                AiError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
                AiError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AiError::Cancelled => StatusCode::BAD_REQUEST,
                AiError::Exhausted { .. } | AiError::Provider { .. } | AiError::EmptyResponse | AiError::Malformed(_) => {
                    StatusCode::BAD_GATEWAY
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Database(err) => {
                error!("Database error: {:#}", err);
                "Internal server error".to_string()
            }
            ApiError::Ai(err) => {
                error!("AI request failed: {}", err);
                err.to_string()
            }
            other => other.to_string(),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
