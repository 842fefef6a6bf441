//! AWS Lambda function for charging point slot booking.
//!
//! Clients `POST {"oocpChargePointId", "system", "connectorId", "startTime",
//! "endTime"}`. The slot is reserved with the operator and the charging point
//! is then marked unavailable.

use std::sync::Arc;

use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use chrono::Utc;
use http::{Method, StatusCode};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde::Serialize;
use tracing::{info, warn};

use chargeclub_lambda_shared::{init_tracing, parse_body, ApiError, LambdaRuntime, Responder};
use chargeclub_lib::{book_charging_point, BookingRequest, ChargingPointRepository, ReservationGateway};

const SUCCESS_MESSAGE: &str = "Slot booked successfully, charging point is now unavailable.";

/// Body returned once the slot is booked.
#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub message: &'static str,
}

/// Services the handler needs, built once per cold start.
#[derive(Clone)]
pub struct BookState {
    pub repository: Arc<dyn ChargingPointRepository>,
    pub reservations: Arc<dyn ReservationGateway>,
    pub responder: Responder,
}

impl BookState {
    pub fn from_runtime(runtime: &LambdaRuntime) -> Result<Self, Error> {
        Ok(Self {
            repository: runtime.repository(),
            reservations: runtime.reservation_gateway()?,
            responder: runtime.responder()?,
        })
    }
}

/// Initialize tracing and the runtime, then serve invocations.
pub async fn run() -> Result<(), Error> {
    init_tracing();

    let runtime = LambdaRuntime::init().await?;
    let state = BookState::from_runtime(&runtime)?;
    let state = &state;

    lambda_runtime::run(service_fn(move |event| async move { handler(state, event).await })).await
}

pub async fn handler(
    state: &BookState,
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

    let body: BookingRequest = match parse_body(request.body.as_deref()) {
        Ok(body) => body,
        Err(problem) => {
            warn!(request_id = %request_id, error = %problem.message, "failed to parse request");
            return Ok(responder.error(&problem));
        }
    };

    info!(
        request_id = %request_id,
        oocp_charge_point_id = ?body.oocp_charge_point_id,
        system = ?body.system,
        "handling slot booking"
    );

    match book_charging_point(
        state.repository.as_ref(),
        state.reservations.as_ref(),
        body,
        Utc::now(),
    )
    .await
    {
        Ok(reservation) => {
            info!(
                request_id = %request_id,
                oocp_charge_point_id = %reservation.oocp_charge_point_id,
                "slot booked"
            );
            Ok(responder.json(
                StatusCode::OK,
                &BookResponse {
                    message: SUCCESS_MESSAGE,
                },
            ))
        }
        Err(e) => Ok(responder.error(&ApiError::from_lib_error(&e, &request_id))),
    }
}
