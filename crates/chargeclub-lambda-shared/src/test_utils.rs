//! Test utilities for Lambda handler testing.
//!
//! Event builders, response decoding and an offline DynamoDB client shared by
//! the Lambda crates' test suites. The in-memory repository and geocoder live
//! in `chargeclub_lib::test_utils` and are enabled by this crate's
//! `test-utils` feature.
//!
//! # Usage
//!
//! ```ignore
//! use chargeclub_lambda_shared::test_utils::{lambda_event, post_json, response_json};
//!
//! let event = lambda_event(post_json(json!({"postcode": "SW1A 1AA"})));
//! let response = handler(&state, event).await.unwrap();
//! assert_eq!(response_json(&response)["error"], "Invalid postcode.");
//! ```

use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use aws_lambda_events::encodings::Body;
use aws_sdk_dynamodb::config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::Client as DynamoClient;
use http::Method;
use lambda_runtime::{Context, LambdaEvent};
use serde_json::Value;

use chargeclub_lib::{Config, NominatimConfig, ReservationConfig};

/// Wrap `payload` in a Lambda event with a default context.
pub fn lambda_event<T>(payload: T) -> LambdaEvent<T> {
    LambdaEvent::new(payload, Context::default())
}

/// An API Gateway proxy request with the given method and raw body.
pub fn api_request(method: Method, body: Option<&str>) -> ApiGatewayProxyRequest {
    ApiGatewayProxyRequest {
        http_method: method,
        body: body.map(str::to_string),
        ..Default::default()
    }
}

/// A `POST` request with `body` as its JSON body.
pub fn post_json(body: Value) -> ApiGatewayProxyRequest {
    api_request(Method::POST, Some(&body.to_string()))
}

/// A CORS preflight request.
pub fn options_request() -> ApiGatewayProxyRequest {
    api_request(Method::OPTIONS, None)
}

/// Decode a response's text body as JSON.
///
/// # Panics
///
/// Panics when the body is missing, binary or not JSON.
pub fn response_json(response: &ApiGatewayProxyResponse) -> Value {
    match &response.body {
        Some(Body::Text(text)) => serde_json::from_str(text).expect("response body should be JSON"),
        other => panic!("expected a text body, got {other:?}"),
    }
}

/// A response header as a string, if present.
pub fn header<'a>(response: &'a ApiGatewayProxyResponse, name: &str) -> Option<&'a str> {
    response.headers.get(name).and_then(|v| v.to_str().ok())
}

/// Configuration with both tables set and local geocoder and operator URLs.
pub fn test_config() -> Config {
    Config {
        charging_points_table: "charging-points-test".to_string(),
        charging_point_events_table: Some("charging-point-events-test".to_string()),
        geocoder: NominatimConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..NominatimConfig::default()
        },
        reservations: ReservationConfig {
            endpoints: [("Virta".to_string(), "http://127.0.0.1:9/reservations".to_string())]
                .into_iter()
                .collect(),
            ..ReservationConfig::default()
        },
        cors_allow_origin: "http://localhost:3000".to_string(),
    }
}

/// A DynamoDB client that needs no credentials or network to construct.
pub fn offline_dynamodb_client() -> DynamoClient {
    let config = aws_sdk_dynamodb::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("eu-west-2"))
        .build();
    DynamoClient::from_conf(config)
}
