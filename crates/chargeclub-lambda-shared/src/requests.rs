//! Request types and validation for Lambda endpoints.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use chargeclub_lib::NewChargingPoint;

use crate::ApiError;

/// Validation trait for Lambda request types.
///
/// Checks that need no collaborators run here; anything that does (postcode
/// resolution, coordinate checks) is left to the library.
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

/// Body of a proximity search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// UK postcode. A missing value is answered as an invalid postcode.
    #[serde(default)]
    pub postcode: Option<String>,

    /// Search radius in miles; 5 when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

impl Validate for SearchRequest {
    fn validate(&self) -> Result<(), ApiError> {
        match self.radius {
            Some(radius) if !radius.is_finite() || radius <= 0.0 => Err(ApiError::bad_request(
                format!("Invalid request: radius must be a positive number of miles, got {radius}"),
            )),
            _ => Ok(()),
        }
    }
}

/// Body of a producer registration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterChargingPointsRequest {
    #[serde(default)]
    pub producer_id: String,

    #[serde(default)]
    pub charging_points: Vec<NewChargingPoint>,
}

/// Decode a JSON request body. A missing or blank body decodes as `{}`.
pub fn parse_body<T: DeserializeOwned>(body: Option<&str>) -> Result<T, ApiError> {
    let text = body.map(str::trim).filter(|b| !b.is_empty()).unwrap_or("{}");
    serde_json::from_str(text).map_err(|e| ApiError::bad_request(format!("Invalid request: {e}")))
}
