use thiserror::Error;

use crate::booking::ReservationError;
use crate::geocoding::GeocodingError;

/// Convenient result alias for the Social Charger Club library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Postcode was missing, failed the postcode grammar, or could not be resolved.
    #[error("Invalid postcode.")]
    InvalidPostcode,

    /// Raised when caller-supplied fields fail validation.
    #[error("{message}")]
    InvalidInput { message: String },

    /// Raised when an MQTT topic does not carry a charging point identifier.
    #[error("Invalid topic format: {topic}")]
    InvalidTopic { topic: String },

    /// Raised when a stored `location` string is not `"<lat>,<lon>"`.
    #[error("malformed location '{value}'")]
    MalformedLocation { value: String },

    /// Raised when a conditional update targets a charging point that does not exist.
    #[error("charging point {id} not found")]
    ChargingPointNotFound { id: String },

    /// The charging point store could not be reached or rejected the request.
    ///
    /// `message` carries the underlying cause for logs; it is not part of the
    /// display string so it never leaks to callers.
    #[error("charging point store is unavailable")]
    RepositoryUnavailable { message: String },

    /// A required environment variable was not set.
    #[error("missing required configuration {name}")]
    MissingConfig { name: String },

    /// An environment variable was set to a value that cannot be used.
    #[error("invalid configuration {name}: {reason}")]
    InvalidConfig { name: String, reason: String },

    /// Wrapper for geocoder transport errors.
    #[error(transparent)]
    Geocoding(#[from] GeocodingError),

    /// The operator did not confirm a reservation.
    #[error(transparent)]
    Reservation(#[from] ReservationError),

    /// Wrapper for JSON errors in event payloads.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_config(name: &str, reason: impl Into<String>) -> Self {
        Error::InvalidConfig {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn repository(message: impl Into<String>) -> Self {
        Error::RepositoryUnavailable {
            message: message.into(),
        }
    }

    /// Returns true when the failure was caused by the caller's input rather
    /// than by infrastructure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidPostcode
                | Error::InvalidInput { .. }
                | Error::InvalidTopic { .. }
                | Error::MalformedLocation { .. }
                | Error::ChargingPointNotFound { .. }
                | Error::Reservation(ReservationError::UnsupportedSystem { .. })
                | Error::Json(_)
        )
    }
}
