//! `Json<T>` plus `validator` checks
//!
//! Malformed bodies are rejected with 400; bodies that parse but fail
//! field validation are rejected with 422 and a `field: message` list.

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::ApiResponse;

pub struct ValidatedJson<T>(pub T);

pub enum ValidatedJsonRejection {
    Json(JsonRejection),
    Invalid(ValidationErrors),
}

fn describe(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{}: {}", field, msg),
                None => format!("{}: {}", field, e.code),
            })
        })
        .collect();
    parts.sort();

    if parts.is_empty() {
        "Validation failed".to_string()
    } else {
        parts.join("; ")
    }
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Json(rejection) => {
                let body = ApiResponse::<()>::error(format!("Invalid JSON: {}", rejection.body_text()));
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            Self::Invalid(errors) => {
                let body = ApiResponse::<()>::error(describe(&errors));
                (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
            }
        }
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: axum::extract::Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::Json)?;
        value.validate().map_err(ValidatedJsonRejection::Invalid)?;
        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::put;
    use axum::Router;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    struct RateBody {
        #[validate(length(equal = 3, message = "must be a 3-letter code"))]
        currency: String,
        #[validate(range(min = 0.0))]
        hourly_rate: f64,
    }

    async fn handler(ValidatedJson(body): ValidatedJson<RateBody>) -> String {
        body.currency
    }

    async fn put_json(body: &str) -> StatusCode {
        let app = Router::new().route("/rate", put(handler));
        let req = Request::builder()
            .method("PUT")
            .uri("/rate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        app.oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn accepts_valid_body() {
        assert_eq!(put_json(r#"{"currency":"EGP","hourly_rate":300}"#).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        assert_eq!(put_json("{currency").await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn failed_validation_is_422() {
        assert_eq!(
            put_json(r#"{"currency":"EGPX","hourly_rate":-1}"#).await,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
