//! HTTP error responses.
//!
//! Every handler error renders as `{"error": "<message>"}` with a status
//! derived from the service error. Server-side failures are logged here and
//! answered with a generic message.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::payments::PaymentError;
use crate::rate_limit::RateLimitError;
use crate::services::account::AccountError;
use crate::services::booking::BookingError;
use crate::services::chat::ChatError;
use crate::services::destination::DestinationError;
use crate::services::guide::GuideError;
use crate::services::password_reset::ResetError;
use crate::services::payout::PayoutError;
use crate::services::quiz::QuizError;
use crate::services::review::ReviewError;
use crate::services::validation::ValidationError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub retry_after: Option<u64>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), retry_after: None }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "authentication required")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn unavailable(what: &str) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, format!("{what} not configured"))
    }

    /// Log `err` and answer with a generic 500.
    pub fn internal(err: &dyn std::fmt::Display, context: &'static str) -> Self {
        tracing::error!(error = %err, context, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        match self.retry_after {
            Some(secs) => (self.status, [("retry-after", secs.to_string())], body).into_response(),
            None => (self.status, body).into_response(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::internal(&err, "database")
    }
}

impl From<RateLimitError> for ApiError {
    fn from(err: RateLimitError) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            retry_after: Some(err.retry_after_secs()),
            message: err.to_string(),
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Rejected { message, .. } => Self::new(StatusCode::PAYMENT_REQUIRED, message),
            other => {
                tracing::error!(error = %other, "payment processor call failed");
                Self::new(StatusCode::BAD_GATEWAY, "payment processor unavailable")
            }
        }
    }
}

impl From<QuizError> for ApiError {
    fn from(err: QuizError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Invalid(e) => e.into(),
            AccountError::RoleNotAllowed => Self::forbidden(err.to_string()),
            AccountError::EmailTaken => Self::new(StatusCode::CONFLICT, err.to_string()),
            AccountError::InvalidCredentials => Self::new(StatusCode::UNAUTHORIZED, err.to_string()),
            AccountError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            AccountError::Hash(_) => Self::internal(&err, "account"),
            AccountError::Database(e) => e.into(),
        }
    }
}

impl From<ResetError> for ApiError {
    fn from(err: ResetError) -> Self {
        match err {
            ResetError::Invalid(e) => e.into(),
            ResetError::InvalidCode | ResetError::VerificationFailed => Self::bad_request(err.to_string()),
            ResetError::Account(e) => e.into(),
            ResetError::Db(e) => e.into(),
        }
    }
}

impl From<DestinationError> for ApiError {
    fn from(err: DestinationError) -> Self {
        match err {
            DestinationError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            DestinationError::Invalid(e) => e.into(),
            DestinationError::Database(e) => e.into(),
        }
    }
}

impl From<GuideError> for ApiError {
    fn from(err: GuideError) -> Self {
        match err {
            GuideError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            GuideError::NotAGuide => Self::forbidden(err.to_string()),
            GuideError::Invalid(e) => e.into(),
            GuideError::Database(e) => e.into(),
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound(_) | BookingError::GuideNotFound(_) | BookingError::DestinationNotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, err.to_string())
            }
            BookingError::NotATraveler | BookingError::Forbidden => Self::forbidden(err.to_string()),
            BookingError::GuideUnavailable
            | BookingError::InvalidTransition { .. }
            | BookingError::Conflict
            | BookingError::NotPayable => Self::new(StatusCode::CONFLICT, err.to_string()),
            BookingError::DateInPast | BookingError::TotalOverflow => Self::bad_request(err.to_string()),
            BookingError::Invalid(e) => e.into(),
            BookingError::Database(e) => e.into(),
        }
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::TargetNotFound { .. } => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            ReviewError::NoCompletedTour | ReviewError::SelfReview => Self::forbidden(err.to_string()),
            ReviewError::Invalid(e) => e.into(),
            ReviewError::Database(e) => e.into(),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::NotFound(_) | ChatError::GuideNotFound(_) => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            ChatError::NotATraveler | ChatError::Forbidden => Self::forbidden(err.to_string()),
            ChatError::Invalid(e) => e.into(),
            ChatError::Database(e) => e.into(),
        }
    }
}

impl From<PayoutError> for ApiError {
    fn from(err: PayoutError) -> Self {
        match err {
            PayoutError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            PayoutError::NotAGuide | PayoutError::Forbidden => Self::forbidden(err.to_string()),
            PayoutError::InsufficientBalance { .. } => Self::bad_request(err.to_string()),
            PayoutError::InvalidTransition { .. } | PayoutError::Conflict => {
                Self::new(StatusCode::CONFLICT, err.to_string())
            }
            PayoutError::Invalid(e) => e.into(),
            PayoutError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
