//! API Gateway proxy responses with CORS headers.

use aws_lambda_events::apigw::ApiGatewayProxyResponse;
use aws_lambda_events::encodings::Body;
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_TYPE,
};
use http::{HeaderMap, HeaderValue, StatusCode};
use serde::Serialize;
use tracing::error;

use crate::problem::ApiError;
use crate::runtime::InitError;

const ALLOW_METHODS: &str = "OPTIONS, POST, GET";
const ALLOW_HEADERS: &str = "Content-Type, Authorization, X-Api-Key, X-Amz-Security-Token";

/// Builds JSON responses that all carry the same CORS headers.
#[derive(Debug, Clone)]
pub struct Responder {
    allow_origin: HeaderValue,
}

impl Responder {
    /// Fails when `allow_origin` cannot be sent as a header value.
    pub fn new(allow_origin: &str) -> Result<Self, InitError> {
        let allow_origin = HeaderValue::from_str(allow_origin).map_err(|e| InitError {
            message: format!("invalid CORS origin '{allow_origin}': {e}"),
        })?;
        Ok(Self { allow_origin })
    }

    /// A response with `body` serialized as JSON.
    pub fn json<T: Serialize + ?Sized>(&self, status: StatusCode, body: &T) -> ApiGatewayProxyResponse {
        match serde_json::to_string(body) {
            Ok(text) => self.text(status, text),
            Err(e) => {
                error!(error = %e, "failed to serialize response body");
                self.error(&ApiError::internal_error())
            }
        }
    }

    /// The `{"error": ...}` response for `err`.
    pub fn error(&self, err: &ApiError) -> ApiGatewayProxyResponse {
        self.text(err.status, err.body().to_string())
    }

    /// Answer to a CORS preflight (`OPTIONS`) request.
    pub fn preflight(&self) -> ApiGatewayProxyResponse {
        self.text(StatusCode::OK, "{}".to_string())
    }

    fn text(&self, status: StatusCode, body: String) -> ApiGatewayProxyResponse {
        ApiGatewayProxyResponse {
            status_code: i64::from(status.as_u16()),
            headers: self.headers(),
            body: Some(Body::Text(body)),
            is_base64_encoded: false,
            ..Default::default()
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
        headers
    }
}

impl Default for Responder {
    fn default() -> Self {
        Self {
            allow_origin: HeaderValue::from_static("http://localhost:3000"),
        }
    }
}
