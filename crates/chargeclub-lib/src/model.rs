//! Charging point records and their public projections.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::distance::Coordinates;
use crate::error::Result;

/// A charging point as held in the charging points table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingPoint {
    /// Opaque identifier, `chargingPointId` in storage.
    #[serde(rename = "chargingPointId")]
    pub id: String,

    /// OCPP identifier the device publishes under; the table's partition key.
    pub oocp_charge_point_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer_id: Option<String>,

    pub station_name: String,

    pub primary_electricity_source: String,

    /// `"<lat>,<lon>"` as stored. Parsed lazily so one bad record cannot fail a read.
    pub location: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_connected: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_updated_at: Option<String>,
}

impl ChargingPoint {
    /// Parse the stored location string.
    pub fn coordinates(&self) -> Result<Coordinates> {
        self.location.parse()
    }

    /// Project to the fields that may be returned to any caller.
    pub fn to_search_result(&self) -> SearchResult {
        SearchResult {
            charging_point_id: self.id.clone(),
            station_name: self.station_name.clone(),
            primary_electricity_source: self.primary_electricity_source.clone(),
        }
    }
}

/// Public-safe projection of a [`ChargingPoint`] returned by the search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub charging_point_id: String,
    pub station_name: String,
    pub primary_electricity_source: String,
}

/// A charging point as submitted by a producer, before it has an identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChargingPoint {
    #[serde(default)]
    pub station_name: String,

    #[serde(default)]
    pub primary_electricity_source: String,

    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,

    /// OCPP identifier, when the producer already knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oocp_charge_point_id: Option<String>,
}

/// An audit record appended to the charging point events table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingPointEvent {
    pub event_id: String,
    pub oocp_charge_point_id: String,
    pub timestamp: String,
    pub event_type: String,
    pub message: Value,
}
