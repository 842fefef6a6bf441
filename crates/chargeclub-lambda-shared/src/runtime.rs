//! Lambda runtime initialization.
//!
//! [`LambdaRuntime`] holds everything built once per cold start: the
//! configuration, the DynamoDB client and the geocoder's HTTP client. Handlers
//! receive the services they need by reference; nothing is global.
//!
//! # Cold-Start Performance
//!
//! Initialization logs timing metrics to help identify cold-start bottlenecks:
//!
//! - `config_load_ms`: Time to read configuration from the environment
//! - `aws_config_ms`: Time to resolve the AWS region and credentials chain
//! - `total_init_ms`: Total initialization time

use std::sync::Arc;
use std::time::Instant;

use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoClient;
use tracing::{error, info};

use chargeclub_lib::{
    AvailabilityIngestor, ChargingPointEventLog, ChargingPointRepository, Config,
    DynamoChargingPointRepository, DynamoEventLog, Error as LibError, Geocoder, GeocodingError,
    HttpReservationGateway, NominatimGeocoder, ProximitySearch, ReservationError,
    ReservationGateway,
};

use crate::response::Responder;

/// Error during runtime initialization.
#[derive(Debug, Clone)]
pub struct InitError {
    pub message: String,
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lambda initialization failed: {}", self.message)
    }
}

impl std::error::Error for InitError {}

impl From<LibError> for InitError {
    fn from(err: LibError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

impl From<GeocodingError> for InitError {
    fn from(err: GeocodingError) -> Self {
        Self {
            message: format!("geocoder setup failed: {err}"),
        }
    }
}

impl From<ReservationError> for InitError {
    fn from(err: ReservationError) -> Self {
        Self {
            message: format!("reservation client setup failed: {err}"),
        }
    }
}

/// State built once at cold start and shared by every invocation.
#[derive(Debug, Clone)]
pub struct LambdaRuntime {
    config: Config,
    dynamodb: DynamoClient,
}

impl LambdaRuntime {
    /// Read configuration from the environment and build the AWS client.
    pub async fn init() -> Result<Self, InitError> {
        let total_start = Instant::now();
        info!("initializing Lambda runtime");

        let config_start = Instant::now();
        let config = Config::from_env().inspect_err(|e| {
            error!(error = %e, "configuration could not be loaded");
        })?;
        let config_load_ms = config_start.elapsed().as_millis();

        info!(
            config_load_ms = config_load_ms,
            charging_points_table = %config.charging_points_table,
            events_table = ?config.charging_point_events_table,
            geocoder = %config.geocoder.base_url,
            reservation_systems = ?config.reservations.endpoints.keys().collect::<Vec<_>>(),
            "configuration loaded"
        );

        let aws_start = Instant::now();
        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let dynamodb = DynamoClient::new(&sdk_config);
        let aws_config_ms = aws_start.elapsed().as_millis();

        info!(
            aws_config_ms = aws_config_ms,
            region = ?sdk_config.region(),
            "AWS configuration resolved"
        );

        let total_init_ms = total_start.elapsed().as_millis();
        info!(
            total_init_ms = total_init_ms,
            config_load_ms = config_load_ms,
            aws_config_ms = aws_config_ms,
            "Lambda runtime initialization complete"
        );

        Ok(Self::from_parts(config, dynamodb))
    }

    /// Assemble a runtime from an existing configuration and client.
    pub fn from_parts(config: Config, dynamodb: DynamoClient) -> Self {
        Self { config, dynamodb }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The charging points table.
    pub fn repository(&self) -> Arc<dyn ChargingPointRepository> {
        Arc::new(DynamoChargingPointRepository::new(
            self.dynamodb.clone(),
            &self.config.charging_points_table,
        ))
    }

    /// The events table. Fails when no events table is configured.
    pub fn event_log(&self) -> Result<Arc<dyn ChargingPointEventLog>, InitError> {
        let table = self.config.require_events_table()?;
        Ok(Arc::new(DynamoEventLog::new(self.dynamodb.clone(), table)))
    }

    /// The Nominatim geocoder.
    pub fn geocoder(&self) -> Result<Arc<dyn Geocoder>, InitError> {
        Ok(Arc::new(NominatimGeocoder::new(&self.config.geocoder)?))
    }

    /// The operator reservation client.
    pub fn reservation_gateway(&self) -> Result<Arc<dyn ReservationGateway>, InitError> {
        Ok(Arc::new(HttpReservationGateway::new(&self.config.reservations)?))
    }

    pub fn proximity_search(&self) -> Result<ProximitySearch, InitError> {
        Ok(ProximitySearch::new(self.repository(), self.geocoder()?))
    }

    pub fn availability_ingestor(&self) -> Result<AvailabilityIngestor, InitError> {
        Ok(AvailabilityIngestor::new(self.repository(), self.event_log()?))
    }

    /// Response builder using the configured CORS origin.
    pub fn responder(&self) -> Result<Responder, InitError> {
        Responder::new(&self.config.cors_allow_origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{offline_dynamodb_client, test_config};

    #[test]
    fn init_error_display() {
        let err = InitError {
            message: "test error".to_string(),
        };
        assert!(err.to_string().contains("test error"));
    }

    #[test]
    fn init_error_from_missing_config() {
        let err: InitError = LibError::MissingConfig {
            name: "CHARGING_POINTS_TABLE_NAME".to_string(),
        }
        .into();
        assert!(err.message.contains("CHARGING_POINTS_TABLE_NAME"));
    }

    #[test]
    fn builds_search_services_without_events_table() {
        let mut config = test_config();
        config.charging_point_events_table = None;
        let runtime = LambdaRuntime::from_parts(config, offline_dynamodb_client());

        assert!(runtime.proximity_search().is_ok());
        assert!(runtime.responder().is_ok());
        assert!(runtime.event_log().is_err());
        assert!(runtime.availability_ingestor().is_err());
    }

    #[test]
    fn builds_ingestor_with_events_table() {
        let runtime = LambdaRuntime::from_parts(test_config(), offline_dynamodb_client());
        assert!(runtime.availability_ingestor().is_ok());
        assert!(runtime.reservation_gateway().is_ok());
        assert_eq!(runtime.config().charging_points_table, "charging-points-test");
    }
}
