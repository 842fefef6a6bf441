//! Social Charger Club library entry points.
//!
//! This crate holds the charging-point domain: postcode validation, geocoding,
//! great-circle distance, the charging-point repository and the operations the
//! Lambda handlers expose (proximity search, producer registration, slot
//! booking and IoT availability ingestion). Higher-level consumers (Lambdas) should only depend
//! on the functions exported here instead of reimplementing behavior.
//!
//! # Testing Support
//!
//! The [`test_utils`] module provides in-memory collaborators and fixtures.
//! Enable the `test-utils` feature to access it from dependent crates.

#![deny(warnings)]

pub mod availability;
pub mod booking;
pub mod config;
pub mod distance;
pub mod dynamo;
pub mod error;
pub mod geocoding;
pub mod model;
pub mod postcode;
pub mod registration;
pub mod reservation;
pub mod repository;
pub mod search;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use availability::{AvailabilityCommand, AvailabilityIngestor, IotEvent, IotRecord};
pub use booking::{
    book_charging_point, BookingRequest, Reservation, ReservationError, ReservationGateway,
};
pub use config::Config;
pub use distance::{great_circle_miles, Coordinates};
pub use dynamo::{DynamoChargingPointRepository, DynamoEventLog};
pub use error::{Error, Result};
pub use geocoding::{geocode_postcode, Geocoder, GeocodingError, NominatimConfig, NominatimGeocoder};
pub use model::{ChargingPoint, ChargingPointEvent, NewChargingPoint, SearchResult};
pub use postcode::is_valid_postcode;
pub use registration::register_charging_points;
pub use reservation::{HttpReservationGateway, ReservationConfig};
pub use repository::{ChargingPointEventLog, ChargingPointRepository};
pub use search::{filter_within_radius, ProximitySearch, SearchQuery, DEFAULT_RADIUS_MILES};
