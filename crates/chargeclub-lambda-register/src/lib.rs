//! AWS Lambda function for charging point registration.
//!
//! Producers `POST {"producerId": "...", "chargingPoints": [...]}`; each point
//! is stored with a generated id and the ids are returned in order.

use std::sync::Arc;

use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use chrono::Utc;
use http::{Method, StatusCode};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde::Serialize;
use tracing::{info, warn};

use chargeclub_lambda_shared::{
    init_tracing, parse_body, ApiError, LambdaRuntime, RegisterChargingPointsRequest, Responder,
};
use chargeclub_lib::{register_charging_points, ChargingPointRepository};

const SUCCESS_MESSAGE: &str = "Charging points added successfully";

/// Body returned after a successful registration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: &'static str,
    pub charging_point_ids: Vec<String>,
}

/// Services the handler needs, built once per cold start.
#[derive(Clone)]
pub struct RegisterState {
    pub repository: Arc<dyn ChargingPointRepository>,
    pub responder: Responder,
}

impl RegisterState {
    pub fn from_runtime(runtime: &LambdaRuntime) -> Result<Self, Error> {
        Ok(Self {
            repository: runtime.repository(),
            responder: runtime.responder()?,
        })
    }
}

/// Initialize tracing and the runtime, then serve invocations.
pub async fn run() -> Result<(), Error> {
    init_tracing();

    let runtime = LambdaRuntime::init().await?;
    let state = RegisterState::from_runtime(&runtime)?;
    let state = &state;

    lambda_runtime::run(service_fn(move |event| async move { handler(state, event).await })).await
}

pub async fn handler(
    state: &RegisterState,
    event: LambdaEvent<ApiGatewayProxyRequest>,
) -> Result<ApiGatewayProxyResponse, Error> {
    let (request, context) = event.into_parts();
    let request_id = context.request_id;
    let responder = &state.responder;

    if request.http_method == Method::OPTIONS {
        return Ok(responder.preflight());
    }
    if request.http_method != Method::POST {
        warn!(request_id = %request_id, method = %request.http_method, "unsupported method");
        return Ok(responder.error(&ApiError::method_not_allowed()));
    }

    let body: RegisterChargingPointsRequest = match parse_body(request.body.as_deref()) {
        Ok(body) => body,
        Err(problem) => {
            warn!(request_id = %request_id, error = %problem.message, "failed to parse request");
            return Ok(responder.error(&problem));
        }
    };

    info!(
        request_id = %request_id,
        producer_id = %body.producer_id,
        points = body.charging_points.len(),
        "handling charging point registration"
    );

    match register_charging_points(
        state.repository.as_ref(),
        &body.producer_id,
        &body.charging_points,
        Utc::now(),
    )
    .await
    {
        Ok(ids) => {
            info!(request_id = %request_id, registered = ids.len(), "charging points registered");
            Ok(responder.json(
                StatusCode::OK,
                &RegisterResponse {
                    message: SUCCESS_MESSAGE,
                    charging_point_ids: ids,
                },
            ))
        }
        Err(e) => Ok(responder.error(&ApiError::from_lib_error(&e, &request_id))),
    }
}
