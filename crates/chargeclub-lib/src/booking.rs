//! Charging point slot booking.
//!
//! A booking asks the point's operator to reserve a connector for a time
//! window through a [`ReservationGateway`]. Once the operator confirms, the
//! point is marked unavailable. A reservation that is not confirmed leaves the
//! stored point untouched.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::{Error, Result};
use crate::repository::ChargingPointRepository;

const MISSING_FIELDS: &str = "Missing required input fields.";

/// Errors raised by an operator while reserving a slot.
#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    /// No operator endpoint is configured for the requested system.
    #[error("No reservation endpoint configured for system: {system}")]
    UnsupportedSystem { system: String },

    /// The operator answered but did not confirm the reservation.
    #[error("Reservation failed: {0}")]
    Rejected(String),

    /// The operator could not be reached.
    #[error("reservation connection failed: {0}")]
    ConnectionFailed(String),

    /// The operator did not answer within the configured timeout.
    #[error("reservation request timed out")]
    Timeout,
}

/// Body of a booking request as received from clients.
///
/// Every field is optional here so a missing one is reported as a validation
/// failure rather than a decode error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[serde(default)]
    pub oocp_charge_point_id: Option<String>,

    /// Operator network, e.g. `Virta` or `EVBox`.
    #[serde(default)]
    pub system: Option<String>,

    /// Connector number, sent by clients as either a string or an integer.
    #[serde(default)]
    pub connector_id: Option<Value>,

    #[serde(default)]
    pub start_time: Option<String>,

    #[serde(default)]
    pub end_time: Option<String>,
}

/// A validated booking, forwarded to the operator as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub oocp_charge_point_id: String,
    pub system: String,
    pub connector_id: String,
    pub start_time: String,
    pub end_time: String,
}

impl BookingRequest {
    /// Check that every field is present and the window is well formed.
    pub fn into_reservation(self) -> Result<Reservation> {
        let (
            Some(oocp_charge_point_id),
            Some(system),
            Some(connector_id),
            Some(start_time),
            Some(end_time),
        ) = (
            non_blank(self.oocp_charge_point_id),
            non_blank(self.system),
            self.connector_id.as_ref().and_then(connector_text),
            non_blank(self.start_time),
            non_blank(self.end_time),
        )
        else {
            return Err(Error::invalid_input(MISSING_FIELDS));
        };

        let start = parse_slot_time(&start_time).ok_or_else(|| {
            Error::invalid_input(format!("Invalid startTime '{start_time}'."))
        })?;
        let end = parse_slot_time(&end_time)
            .ok_or_else(|| Error::invalid_input(format!("Invalid endTime '{end_time}'.")))?;
        if end <= start {
            return Err(Error::invalid_input("endTime must be after startTime."));
        }

        Ok(Reservation {
            oocp_charge_point_id,
            system,
            connector_id,
            start_time,
            end_time,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn connector_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_blank(Some(s.clone())),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// RFC 3339, or a timestamp without an offset which is read as UTC.
fn parse_slot_time(value: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

/// Places reservations with charging point operators.
#[async_trait]
pub trait ReservationGateway: Send + Sync {
    /// Reserve the slot. `Ok(())` means the operator confirmed it.
    async fn reserve(&self, reservation: &Reservation) -> std::result::Result<(), ReservationError>;
}

/// Book a slot and mark the charging point unavailable.
///
/// The operator is asked first; the point is only updated once the
/// reservation is confirmed. An unknown point surfaces as
/// [`Error::ChargingPointNotFound`] from the update.
pub async fn book_charging_point(
    repository: &dyn ChargingPointRepository,
    reservations: &dyn ReservationGateway,
    request: BookingRequest,
    now: DateTime<Utc>,
) -> Result<Reservation> {
    let reservation = request.into_reservation()?;

    reservations.reserve(&reservation).await?;
    info!(
        oocp_charge_point_id = %reservation.oocp_charge_point_id,
        system = %reservation.system,
        connector_id = %reservation.connector_id,
        "reservation confirmed"
    );

    repository
        .set_availability(&reservation.oocp_charge_point_id, false, now)
        .await?;

    Ok(reservation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{london_cluster, InMemoryRepository, RecordingReservations};
    use serde_json::json;

    fn request(id: &str) -> BookingRequest {
        serde_json::from_value(json!({
            "oocpChargePointId": id,
            "system": "Virta",
            "connectorId": "1",
            "startTime": "2024-12-30T12:00:00",
            "endTime": "2024-12-30T13:00:00"
        }))
        .unwrap()
    }

    #[test]
    fn connector_may_be_a_number() {
        let request = BookingRequest {
            connector_id: Some(json!(2)),
            ..request("cp1")
        };
        assert_eq!(request.into_reservation().unwrap().connector_id, "2");
    }

    #[test]
    fn each_missing_field_is_rejected() {
        for field in ["oocpChargePointId", "system", "connectorId", "startTime", "endTime"] {
            let mut body = serde_json::to_value(request("cp1")).unwrap();
            body.as_object_mut().unwrap().remove(field);
            let request: BookingRequest = serde_json::from_value(body).unwrap();

            let err = request.into_reservation().unwrap_err();
            assert_eq!(err.to_string(), MISSING_FIELDS, "{field}");
        }
    }

    #[test]
    fn window_must_be_ordered_and_parseable() {
        let backwards = BookingRequest {
            start_time: Some("2024-12-30T13:00:00Z".to_string()),
            end_time: Some("2024-12-30T12:00:00Z".to_string()),
            ..request("cp1")
        };
        assert!(matches!(
            backwards.into_reservation(),
            Err(Error::InvalidInput { .. })
        ));

        let garbled = BookingRequest {
            start_time: Some("tomorrow".to_string()),
            ..request("cp1")
        };
        let err = garbled.into_reservation().unwrap_err();
        assert!(err.to_string().contains("startTime"));
    }

    #[tokio::test]
    async fn confirmed_booking_marks_point_unavailable() {
        let repository = InMemoryRepository::with_points(london_cluster());
        let reservations = RecordingReservations::accepting();

        let reservation = book_charging_point(&repository, &reservations, request("cp1"), Utc::now())
            .await
            .unwrap();

        assert_eq!(reservation.system, "Virta");
        assert_eq!(reservations.reservations(), vec![reservation]);
        assert_eq!(repository.find("cp1").unwrap().is_available, Some(false));
    }

    #[tokio::test]
    async fn rejected_reservation_writes_nothing() {
        let repository = InMemoryRepository::with_points(london_cluster());
        let reservations = RecordingReservations::rejecting("slot taken");

        let err = book_charging_point(&repository, &reservations, request("cp1"), Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Reservation(ReservationError::Rejected(_))));
        assert!(!err.is_client_error());
        let point = repository.find("cp1").unwrap();
        assert_eq!(point.is_available, None);
        assert_eq!(point.status_updated_at, None);
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_the_operator() {
        let repository = InMemoryRepository::with_points(london_cluster());
        let reservations = RecordingReservations::accepting();

        let err = book_charging_point(
            &repository,
            &reservations,
            BookingRequest::default(),
            Utc::now(),
        )
        .await
        .unwrap_err();

        assert!(err.is_client_error());
        assert!(reservations.reservations().is_empty());
    }

    #[tokio::test]
    async fn unknown_point_is_not_found() {
        let repository = InMemoryRepository::with_points(london_cluster());
        let reservations = RecordingReservations::accepting();

        let err = book_charging_point(&repository, &reservations, request("cp9"), Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ChargingPointNotFound { ref id } if id == "cp9"));
    }
}
