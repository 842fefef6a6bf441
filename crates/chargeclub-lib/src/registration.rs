//! Producer charging-point registration.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::distance::Coordinates;
use crate::error::{Error, Result};
use crate::model::{ChargingPoint, NewChargingPoint};
use crate::repository::ChargingPointRepository;

const MISSING_FIELDS: &str = "Invalid input. producerId and chargingPoints are required.";
const MISSING_COORDINATES: &str = "Both latitude and longitude are required.";

/// Register `points` for `producer_id` and return their new identifiers in
/// submission order.
///
/// Every point is validated before anything is written, so bad input never
/// leaves a partial registration behind. A storage failure part way through
/// can still leave earlier points persisted.
pub async fn register_charging_points(
    repository: &dyn ChargingPointRepository,
    producer_id: &str,
    points: &[NewChargingPoint],
    now: DateTime<Utc>,
) -> Result<Vec<String>> {
    let producer_id = producer_id.trim();
    if producer_id.is_empty() || points.is_empty() {
        return Err(Error::invalid_input(MISSING_FIELDS));
    }

    let records = points
        .iter()
        .map(|point| prepare(producer_id, point, now))
        .collect::<Result<Vec<_>>>()?;

    let mut ids = Vec::with_capacity(records.len());
    for record in &records {
        repository.insert(record).await?;
        info!(
            charging_point_id = %record.id,
            producer_id = %producer_id,
            "charging point registered"
        );
        ids.push(record.id.clone());
    }

    Ok(ids)
}

fn prepare(producer_id: &str, point: &NewChargingPoint, now: DateTime<Utc>) -> Result<ChargingPoint> {
    let (Some(latitude), Some(longitude)) = (point.latitude, point.longitude) else {
        return Err(Error::invalid_input(MISSING_COORDINATES));
    };

    let coordinates = Coordinates::new(latitude, longitude);
    if !coordinates.is_valid() {
        return Err(Error::invalid_input(format!(
            "Coordinates out of range: latitude must be -90 to 90, longitude must be -180 to 180 (got {coordinates})"
        )));
    }

    let id = Uuid::new_v4().to_string();
    let oocp_charge_point_id = point
        .oocp_charge_point_id
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map_or_else(|| id.clone(), str::to_string);

    Ok(ChargingPoint {
        id,
        oocp_charge_point_id,
        producer_id: Some(producer_id.to_string()),
        station_name: point.station_name.clone(),
        primary_electricity_source: point.primary_electricity_source.clone(),
        location: coordinates.to_string(),
        is_available: None,
        is_connected: None,
        created_at: Some(now.to_rfc3339()),
        status_updated_at: None,
    })
}
