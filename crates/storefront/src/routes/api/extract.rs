//! Extractors for the JSON API.
//!
//! Wrappers around axum's `Json`, `Query` and `Path` whose rejections are
//! [`AppError`]s, so malformed input still gets the `{ "success": false }`
//! envelope instead of a plain-text body.

use axum::extract::{FromRequest, FromRequestParts, OptionalFromRequest, Request};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

/// A missing body (no `Content-Type`) is `None`; a malformed one is still
/// rejected.
impl<T, S> OptionalFromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let body = <axum::Json<T> as OptionalFromRequest<S>>::from_request(req, state).await?;
        Ok(body.map(|axum::Json(value)| Self(value)))
    }
}

/// Query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Amount {
        amount: Option<u32>,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = Request::builder().method("POST").uri("/refund");
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_missing_body_is_none() {
        let body =
            <Json<Amount> as OptionalFromRequest<()>>::from_request(request(None, ""), &())
                .await
                .unwrap();
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_optional_body_is_parsed() {
        let body = <Json<Amount> as OptionalFromRequest<()>>::from_request(
            request(Some("application/json"), r#"{"amount":5}"#),
            &(),
        )
        .await
        .unwrap();
        assert_eq!(body.unwrap().0.amount, Some(5));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let err = <Json<Amount> as FromRequest<()>>::from_request(
            request(Some("application/json"), "{not json"),
            &(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
