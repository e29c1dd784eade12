use axum::{
    body::Body,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::request::Parts,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use crate::core::error::AppError;
use crate::shared::types::ApiResponse;

/// JSON body extractor whose rejections render as the API error envelope
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppJsonRejection;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => Err(AppJsonRejection(rejection)),
        }
    }
}

pub struct AppJsonRejection(JsonRejection);

impl IntoResponse for AppJsonRejection {
    fn into_response(self) -> Response {
        if self.0.status() == StatusCode::PAYLOAD_TOO_LARGE {
            let body = Json(ApiResponse::<()>::error(
                Some("Request body too large".to_string()),
                None,
            ));
            return (StatusCode::PAYLOAD_TOO_LARGE, body).into_response();
        }

        let message = match self.0 {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("Invalid JSON syntax: {}", err),
            JsonRejection::MissingJsonContentType(err) => {
                format!("Missing JSON content type: {}", err)
            }
            JsonRejection::BytesRejection(err) => format!("Failed to read request body: {}", err),
            _ => "Failed to parse JSON body".to_string(),
        };

        AppError::BadRequest(message).into_response()
    }
}

/// Query string extractor whose rejections render as the API error envelope
pub struct AppQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(QueryRejection::FailedToDeserializeQueryString(err)) => Err(AppError::BadRequest(
                format!("Invalid query string: {}", err.body_text()),
            )),
            Err(_) => Err(AppError::BadRequest(
                "Failed to parse query string".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        routing::{get, post},
        Router,
    };
    use axum_test::TestServer;

    async fn echo(AppJson(value): AppJson<serde_json::Value>) -> axum::Json<serde_json::Value> {
        axum::Json(value)
    }

    #[derive(serde::Deserialize)]
    struct Paging {
        page: Option<i64>,
    }

    async fn page(AppQuery(q): AppQuery<Paging>) -> String {
        q.page.unwrap_or(1).to_string()
    }

    #[tokio::test]
    async fn test_bad_query_is_a_bad_request_envelope() {
        let server = TestServer::new(Router::new().route("/page", get(page))).unwrap();

        server.get("/page?page=4").await.assert_text("4");

        let response = server.get("/page?page=abc").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid query string"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_bad_request_envelope() {
        let server = TestServer::new(Router::new().route("/echo", post(echo))).unwrap();

        let response = server
            .post("/echo")
            .bytes("{ not json".into())
            .content_type("application/json")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid JSON syntax"));
    }
}
