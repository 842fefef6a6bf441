//! In-memory collaborators and fixtures for testing.
//!
//! These stand in for DynamoDB and Nominatim so handlers and library
//! operations can be exercised without network access.
//!
//! # Usage
//!
//! ```ignore
//! use chargeclub_lib::test_utils::{london_cluster, InMemoryRepository, StaticGeocoder, LONDON};
//!
//! let repository = Arc::new(InMemoryRepository::with_points(london_cluster()));
//! let geocoder = Arc::new(StaticGeocoder::resolving(LONDON));
//! let search = ProximitySearch::new(repository, geocoder);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::booking::{Reservation, ReservationError, ReservationGateway};
use crate::distance::Coordinates;
use crate::error::{Error, Result};
use crate::geocoding::{Geocoder, GeocodingError};
use crate::model::{ChargingPoint, ChargingPointEvent};
use crate::repository::{ChargingPointEventLog, ChargingPointRepository};

/// Central London (Charing Cross).
pub const LONDON: Coordinates = Coordinates::new(51.5074, -0.1278);

/// Edinburgh city centre.
pub const EDINBURGH: Coordinates = Coordinates::new(55.9533, -3.1883);

/// Build a stored charging point whose OCPP id equals its id.
pub fn charging_point(id: &str, station_name: &str, source: &str, location: &str) -> ChargingPoint {
    ChargingPoint {
        id: id.to_string(),
        oocp_charge_point_id: id.to_string(),
        producer_id: None,
        station_name: station_name.to_string(),
        primary_electricity_source: source.to_string(),
        location: location.to_string(),
        is_available: None,
        is_connected: None,
        created_at: None,
        status_updated_at: None,
    }
}

/// Three points: `cp1` in London, `cp2` in Edinburgh, `cp3` under a mile from `cp1`.
pub fn london_cluster() -> Vec<ChargingPoint> {
    vec![
        charging_point("cp1", "Station A", "Solar", "51.5074,-0.1278"),
        charging_point("cp2", "Station B", "Grid", "55.9533,-3.1883"),
        charging_point("cp3", "Station C", "Wind", "51.5014,-0.1419"),
    ]
}

/// Vec-backed [`ChargingPointRepository`] that counts bulk reads.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    points: Mutex<Vec<ChargingPoint>>,
    list_calls: AtomicUsize,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_points(points: Vec<ChargingPoint>) -> Self {
        Self {
            points: Mutex::new(points),
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Number of times `list_all` has been called.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Snapshot of the stored points.
    pub fn points(&self) -> Vec<ChargingPoint> {
        self.lock().clone()
    }

    /// Look up a point by its OCPP id.
    pub fn find(&self, oocp_id: &str) -> Option<ChargingPoint> {
        self.lock()
            .iter()
            .find(|p| p.oocp_charge_point_id == oocp_id)
            .cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ChargingPoint>> {
        self.points
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update(
        &self,
        oocp_id: &str,
        at: DateTime<Utc>,
        apply: impl FnOnce(&mut ChargingPoint),
    ) -> Result<()> {
        let mut points = self.lock();
        let point = points
            .iter_mut()
            .find(|p| p.oocp_charge_point_id == oocp_id)
            .ok_or_else(|| Error::ChargingPointNotFound {
                id: oocp_id.to_string(),
            })?;
        apply(point);
        point.status_updated_at = Some(at.to_rfc3339());
        Ok(())
    }
}

#[async_trait]
impl ChargingPointRepository for InMemoryRepository {
    async fn list_all(&self) -> Result<Vec<ChargingPoint>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.points())
    }

    async fn insert(&self, point: &ChargingPoint) -> Result<()> {
        self.lock().push(point.clone());
        Ok(())
    }

    async fn set_availability(
        &self,
        oocp_id: &str,
        available: bool,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.update(oocp_id, at, |p| p.is_available = Some(available))
    }

    async fn set_connected(
        &self,
        oocp_id: &str,
        connected: bool,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.update(oocp_id, at, |p| p.is_connected = Some(connected))
    }
}

/// Repository whose every call fails as if the table were unreachable.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingRepository;

#[async_trait]
impl ChargingPointRepository for FailingRepository {
    async fn list_all(&self) -> Result<Vec<ChargingPoint>> {
        Err(Error::repository("simulated outage"))
    }

    async fn insert(&self, _point: &ChargingPoint) -> Result<()> {
        Err(Error::repository("simulated outage"))
    }

    async fn set_availability(&self, _: &str, _: bool, _: DateTime<Utc>) -> Result<()> {
        Err(Error::repository("simulated outage"))
    }

    async fn set_connected(&self, _: &str, _: bool, _: DateTime<Utc>) -> Result<()> {
        Err(Error::repository("simulated outage"))
    }
}

#[derive(Debug, Clone, Copy)]
enum GeocoderBehaviour {
    Resolve(Coordinates),
    NoMatch,
    Fail,
}

/// [`Geocoder`] returning a fixed answer and counting calls.
#[derive(Debug)]
pub struct StaticGeocoder {
    behaviour: GeocoderBehaviour,
    calls: AtomicUsize,
}

impl StaticGeocoder {
    /// Resolve every query to `coordinates`.
    pub fn resolving(coordinates: Coordinates) -> Self {
        Self::with(GeocoderBehaviour::Resolve(coordinates))
    }

    /// Find no match for any query.
    pub fn unresolved() -> Self {
        Self::with(GeocoderBehaviour::NoMatch)
    }

    /// Fail every query with a connection error.
    pub fn failing() -> Self {
        Self::with(GeocoderBehaviour::Fail)
    }

    fn with(behaviour: GeocoderBehaviour) -> Self {
        Self {
            behaviour,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, _query: &str) -> std::result::Result<Option<Coordinates>, GeocodingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            GeocoderBehaviour::Resolve(coords) => Ok(Some(coords)),
            GeocoderBehaviour::NoMatch => Ok(None),
            GeocoderBehaviour::Fail => Err(GeocodingError::ConnectionFailed(
                "simulated outage".to_string(),
            )),
        }
    }
}

/// Vec-backed [`ChargingPointEventLog`].
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    events: Mutex<Vec<ChargingPointEvent>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ChargingPointEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ChargingPointEventLog for InMemoryEventLog {
    async fn record(&self, event: &ChargingPointEvent) -> Result<()> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
        Ok(())
    }
}

/// [`ReservationGateway`] that accepts or rejects every reservation and
/// records the confirmed ones.
#[derive(Debug, Default)]
pub struct RecordingReservations {
    rejection: Option<String>,
    confirmed: Mutex<Vec<Reservation>>,
}

impl RecordingReservations {
    pub fn accepting() -> Self {
        Self::default()
    }

    /// Reject every reservation with `message`.
    pub fn rejecting(message: &str) -> Self {
        Self {
            rejection: Some(message.to_string()),
            confirmed: Mutex::new(Vec::new()),
        }
    }

    /// Reservations confirmed so far.
    pub fn reservations(&self) -> Vec<Reservation> {
        self.confirmed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ReservationGateway for RecordingReservations {
    async fn reserve(&self, reservation: &Reservation) -> std::result::Result<(), ReservationError> {
        if let Some(message) = &self.rejection {
            return Err(ReservationError::Rejected(message.clone()));
        }
        self.confirmed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(reservation.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn london_cluster_locations_parse() {
        for point in london_cluster() {
            assert!(point.coordinates().is_ok(), "{} should parse", point.id);
        }
    }

    #[tokio::test]
    async fn in_memory_updates_unknown_point_fail() {
        let repository = InMemoryRepository::with_points(london_cluster());
        let err = repository
            .set_availability("missing", true, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ChargingPointNotFound { .. }));
    }

    #[tokio::test]
    async fn in_memory_updates_stamp_status_time() {
        let repository = InMemoryRepository::with_points(london_cluster());
        repository.set_connected("cp1", true, Utc::now()).await.unwrap();

        let point = repository.find("cp1").unwrap();
        assert_eq!(point.is_connected, Some(true));
        assert!(point.status_updated_at.is_some());
    }
}
