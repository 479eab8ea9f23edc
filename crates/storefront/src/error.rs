//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error renders as `{ "success": false, "message": ... }`. Server-side
//! failures get a generic message; their details only go to logs and Sentry.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use inkdrop_core::cart::CartError;
use inkdrop_core::promotion::PromotionRejection;

use crate::db::RepositoryError;
use crate::printful::PrintfulError;
use crate::services::auth::AuthError;
use crate::services::cart::CartServiceError;
use crate::services::checkout::CheckoutError;
use crate::services::fulfillment::FulfillmentError;
use crate::services::promotions::PromotionError;
use crate::services::refunds::RefundError;
use crate::stripe::StripeError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart rule violated.
    #[error("{0}")]
    Cart(#[from] CartError),

    /// Checkout input or payment state is not acceptable.
    #[error("{0}")]
    Checkout(CheckoutError),

    /// Promotion cannot be applied.
    #[error("{0}")]
    Promotion(#[from] PromotionRejection),

    /// Fulfillment action not possible for this order.
    #[error("{0}")]
    Fulfillment(FulfillmentError),

    /// Refund not possible for this order.
    #[error("{0}")]
    Refund(RefundError),

    /// Stripe API operation failed.
    #[error("Stripe error: {0}")]
    Stripe(#[from] StripeError),

    /// Printful API operation failed.
    #[error("Printful error: {0}")]
    Printful(#[from] PrintfulError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<CartServiceError> for AppError {
    fn from(err: CartServiceError) -> Self {
        match err {
            CartServiceError::Cart(e) => Self::Cart(e),
            CartServiceError::ProductNotFound => Self::NotFound("Product not found".to_string()),
            CartServiceError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<PromotionError> for AppError {
    fn from(err: PromotionError) -> Self {
        match err {
            PromotionError::UnknownCode => Self::BadRequest(err.to_string()),
            PromotionError::Rejected(reason) => Self::Promotion(reason),
            PromotionError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Promotion(e) => e.into(),
            CheckoutError::Stripe(e) => Self::Stripe(e),
            CheckoutError::Repository(e) => Self::Database(e),
            other => Self::Checkout(other),
        }
    }
}

impl From<FulfillmentError> for AppError {
    fn from(err: FulfillmentError) -> Self {
        match err {
            FulfillmentError::Printful(e) => Self::Printful(e),
            FulfillmentError::Repository(e) => Self::Database(e),
            other => Self::Fulfillment(other),
        }
    }
}

impl From<RefundError> for AppError {
    fn from(err: RefundError) -> Self {
        match err {
            RefundError::Stripe(e) => Self::Stripe(e),
            RefundError::Repository(e) => Self::Database(e),
            other => Self::Refund(other),
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Stripe(_) | Self::Printful(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::AccountLocked { .. } => StatusCode::LOCKED,
                AuthError::AdminNotFound => StatusCode::NOT_FOUND,
                AuthError::AdminAlreadyExists => StatusCode::CONFLICT,
                AuthError::InvalidEmail(_)
                | AuthError::MissingName
                | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Cart(CartError::LineNotFound) => StatusCode::NOT_FOUND,
            Self::Cart(_)
            | Self::Checkout(_)
            | Self::Promotion(_)
            | Self::Refund(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Fulfillment(FulfillmentError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Fulfillment(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Message safe to show to the client.
    fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Stripe(_) => "Payment provider error".to_string(),
            Self::Printful(_) => "Fulfillment provider error".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid email or password".to_string(),
                AuthError::AccountLocked { until } => format!(
                    "Too many failed attempts. Try again after {}",
                    until.format("%H:%M UTC")
                ),
                AuthError::AdminNotFound => "Admin not found".to_string(),
                AuthError::AdminAlreadyExists => {
                    "An admin with this email already exists".to_string()
                }
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::MissingName => "Name is required".to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Authentication error".to_string()
                }
            },
            Self::Cart(err) => err.to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::Promotion(err) => err.to_string(),
            Self::Fulfillment(err) => err.to_string(),
            Self::Refund(err) => err.to_string(),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg) => msg.clone(),
            Self::RateLimited => "Too many requests, please slow down".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = json!({ "success": false, "message": self.public_message() });
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for a logged-in admin.
pub fn set_sentry_user(admin_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a customer action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Payment intent created", Some(&[("payment_intent_id", &id)]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rust_decimal::Decimal;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("test".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized("test".to_string()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("test".to_string()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            AppError::Database(RepositoryError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database(RepositoryError::Conflict("slug".to_string())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Cart(CartError::InsufficientStock { available: 1 }).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(FulfillmentError::NotConfigured).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Auth(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let (status, body) = body_json(AppError::Promotion(PromotionRejection::Expired)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "This promotion has expired");
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let (status, body) =
            body_json(AppError::Internal("connection refused at 10.0.0.3".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }

    #[test]
    fn test_nested_errors_are_flattened() {
        let err = AppError::from(CheckoutError::Promotion(PromotionError::Rejected(
            PromotionRejection::BelowMinimum {
                minimum: Decimal::new(5000, 2),
            },
        )));
        assert!(matches!(err, AppError::Promotion(_)));
        assert!(matches!(
            AppError::from(CheckoutError::EmptyCart),
            AppError::Checkout(CheckoutError::EmptyCart)
        ));
        assert!(matches!(
            AppError::from(CartServiceError::ProductNotFound),
            AppError::NotFound(_)
        ));
    }
}
