//! AWS Lambda function for charging point proximity search.
//!
//! Accepts `POST {"postcode": "...", "radius": 5}` through API Gateway and
//! returns the charging points within `radius` miles of the postcode.

use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use http::{Method, StatusCode};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use tracing::{info, warn};

use chargeclub_lambda_shared::{
    init_tracing, parse_body, ApiError, LambdaRuntime, Responder, SearchRequest, Validate,
};
use chargeclub_lib::{ProximitySearch, SearchQuery};

/// Services the handler needs, built once per cold start.
#[derive(Debug, Clone)]
pub struct SearchState {
    pub search: ProximitySearch,
    pub responder: Responder,
}

impl SearchState {
    pub fn from_runtime(runtime: &LambdaRuntime) -> Result<Self, Error> {
        Ok(Self {
            search: runtime.proximity_search()?,
            responder: runtime.responder()?,
        })
    }
}

/// Initialize tracing and the runtime, then serve invocations.
pub async fn run() -> Result<(), Error> {
    init_tracing();

    let runtime = LambdaRuntime::init().await?;
    let state = SearchState::from_runtime(&runtime)?;
    let state = &state;

    lambda_runtime::run(service_fn(move |event| async move { handler(state, event).await })).await
}

/// Handle one API Gateway request.
///
/// Request-level failures are answered with an error response; the returned
/// `Err` is reserved for runtime faults.
pub async fn handler(
    state: &SearchState,
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

    let body: SearchRequest = match parse_body(request.body.as_deref()) {
        Ok(body) => body,
        Err(problem) => {
            warn!(request_id = %request_id, error = %problem.message, "failed to parse request");
            return Ok(responder.error(&problem));
        }
    };

    if let Err(problem) = body.validate() {
        return Ok(responder.error(&problem));
    }

    info!(
        request_id = %request_id,
        postcode = ?body.postcode,
        radius = ?body.radius,
        "handling proximity search"
    );

    let query = SearchQuery::from_parts(body.postcode, body.radius);
    match state.search.search(&query).await {
        Ok(results) => {
            info!(
                request_id = %request_id,
                matched = results.len(),
                "proximity search succeeded"
            );
            Ok(responder.json(StatusCode::OK, &results))
        }
        Err(e) => Ok(responder.error(&ApiError::from_lib_error(&e, &request_id))),
    }
}
