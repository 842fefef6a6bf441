//! AWS Lambda function for charging point availability ingestion.
//!
//! Invoked by an IoT topic rule with a batch of device MQTT messages:
//!
//! ```json
//! { "Records": [ { "topic": "charging_points/<id>/status", "message": "{\"status\":\"online\"}" } ] }
//! ```
//!
//! Each message updates the charging point's connection or availability and
//! is appended to the events table.

use aws_lambda_events::apigw::ApiGatewayProxyResponse;
use chrono::Utc;
use http::StatusCode;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use chargeclub_lambda_shared::{init_tracing, ApiError, LambdaRuntime, Responder};
use chargeclub_lib::{AvailabilityIngestor, IotEvent};

const SUCCESS_MESSAGE: &str = "Messages processed successfully";

/// Body returned after a batch is applied.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub message: &'static str,
    pub processed: usize,
}

/// Services the handler needs, built once per cold start.
#[derive(Debug, Clone)]
pub struct IngestState {
    pub ingestor: AvailabilityIngestor,
    pub responder: Responder,
}

impl IngestState {
    /// Fails when no events table is configured.
    pub fn from_runtime(runtime: &LambdaRuntime) -> Result<Self, Error> {
        Ok(Self {
            ingestor: runtime.availability_ingestor()?,
            responder: runtime.responder()?,
        })
    }
}

/// Initialize tracing and the runtime, then serve invocations.
pub async fn run() -> Result<(), Error> {
    init_tracing();

    let runtime = LambdaRuntime::init().await?;
    let state = IngestState::from_runtime(&runtime)?;
    let state = &state;

    lambda_runtime::run(service_fn(move |event| async move { handler(state, event).await })).await
}

pub async fn handler(
    state: &IngestState,
    event: LambdaEvent<Value>,
) -> Result<ApiGatewayProxyResponse, Error> {
    let (payload, context) = event.into_parts();
    let request_id = context.request_id;
    let responder = &state.responder;

    let batch: IotEvent = match serde_json::from_value(payload) {
        Ok(batch) => batch,
        Err(e) => {
            warn!(request_id = %request_id, error = %e, "failed to parse IoT event");
            return Ok(responder.error(&ApiError::bad_request(format!("Invalid request: {e}"))));
        }
    };

    info!(
        request_id = %request_id,
        records = batch.records.len(),
        "handling availability messages"
    );

    match state.ingestor.ingest(&batch, Utc::now()).await {
        Ok(processed) => Ok(responder.json(
            StatusCode::OK,
            &IngestResponse {
                message: SUCCESS_MESSAGE,
                processed,
            },
        )),
        Err(e) => Ok(responder.error(&ApiError::from_lib_error(&e, &request_id))),
    }
}
