use crate::errors::ServiceError;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Body returned by every create endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatedId {
    pub id: i32,
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input
        .validate()
        .map_err(|e| ServiceError::ValidationError(format!("Validation failed: {}", e)))
}

/// Unwraps a required request field
pub fn require<T>(value: Option<T>, field: &str) -> Result<T, ServiceError> {
    value.ok_or_else(|| ServiceError::ValidationError(format!("{} is required", field)))
}

/// JSON body extractor that reports malformed payloads and failed
/// validation as `400 Bad Request` through [`ServiceError`].
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))?;
        validate_input(&value)?;
        Ok(ValidatedJson(value))
    }
}

/// Path extractor that reports unparsable segments (`/items/abc`) as
/// `400 Bad Request` with the standard error body.
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))?;
        Ok(ApiPath(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct Sample {
        #[validate(length(min = 1))]
        name: String,
    }

    #[test]
    fn require_names_the_missing_field() {
        let err = require::<i32>(None, "supplier_id").unwrap_err();
        assert_eq!(err.to_string(), "Validation error: supplier_id is required");
        assert_eq!(require(Some(3), "supplier_id").unwrap(), 3);
    }

    #[test]
    fn validate_input_maps_to_validation_error() {
        let sample = Sample {
            name: String::new(),
        };
        assert!(matches!(
            validate_input(&sample),
            Err(ServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let req = axum::http::Request::builder()
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{\"name\": 7"))
            .unwrap();
        let result = ValidatedJson::<Sample>::from_request(req, &()).await;
        let err = result.err().unwrap();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_numeric_path_id_is_a_json_bad_request() {
        use axum::{routing::get, Router};
        use tower::ServiceExt;

        async fn show(ApiPath(id): ApiPath<i32>) -> String {
            id.to_string()
        }

        let app = Router::new().route("/things/:id", get(show));
        let ok = app
            .clone()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/things/7")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let bad = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/things/seven")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(bad.into_body(), usize::MAX).await.unwrap();
        let payload: crate::errors::ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.error, "Bad Request");
    }
}
