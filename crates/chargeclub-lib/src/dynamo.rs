//! DynamoDB-backed charging point store and event log.
//!
//! Items are mapped by hand between [`AttributeValue`] maps and the model
//! types. Strings are `S`, flags are `BOOL`, and the event `message` is stored
//! as serialized JSON text.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{ChargingPoint, ChargingPointEvent};
use crate::repository::{ChargingPointEventLog, ChargingPointRepository};

type Item = HashMap<String, AttributeValue>;

const PARTITION_KEY: &str = "oocpChargePointId";
const EXISTS_CONDITION: &str = "attribute_exists(oocpChargePointId)";

/// Charging points table accessed through the AWS SDK.
#[derive(Debug, Clone)]
pub struct DynamoChargingPointRepository {
    client: Client,
    table: String,
}

impl DynamoChargingPointRepository {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    async fn update_flag(
        &self,
        oocp_id: &str,
        attribute: &str,
        value: bool,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let result = self
            .client
            .update_item()
            .table_name(&self.table)
            .key(PARTITION_KEY, AttributeValue::S(oocp_id.to_string()))
            .update_expression("SET #flag = :value, statusUpdatedAt = :at")
            .condition_expression(EXISTS_CONDITION)
            .expression_attribute_names("#flag", attribute)
            .expression_attribute_values(":value", AttributeValue::Bool(value))
            .expression_attribute_values(":at", AttributeValue::S(at.to_rfc3339()))
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!(oocp_id, attribute, value, "charging point updated");
                Ok(())
            }
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
            {
                Err(Error::ChargingPointNotFound {
                    id: oocp_id.to_string(),
                })
            }
            Err(err) => Err(Error::repository(format!(
                "UpdateItem on {} failed: {}",
                self.table,
                DisplayErrorContext(&err)
            ))),
        }
    }
}

#[async_trait]
impl ChargingPointRepository for DynamoChargingPointRepository {
    async fn list_all(&self) -> Result<Vec<ChargingPoint>> {
        let mut points = Vec::new();
        let mut start_key: Option<Item> = None;
        let mut pages = 0usize;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|err| {
                    Error::repository(format!(
                        "Scan on {} failed: {}",
                        self.table,
                        DisplayErrorContext(&err)
                    ))
                })?;
            pages += 1;

            for item in output.items() {
                match item_to_charging_point(item) {
                    Some(point) => points.push(point),
                    None => warn!(
                        table = %self.table,
                        key = ?item.get(PARTITION_KEY),
                        "skipping charging point item with missing attributes"
                    ),
                }
            }

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        debug!(table = %self.table, pages, items = points.len(), "charging points scanned");
        Ok(points)
    }

    async fn insert(&self, point: &ChargingPoint) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(charging_point_to_item(point)))
            .send()
            .await
            .map_err(|err| {
                Error::repository(format!(
                    "PutItem on {} failed: {}",
                    self.table,
                    DisplayErrorContext(&err)
                ))
            })?;
        Ok(())
    }

    async fn set_availability(
        &self,
        oocp_id: &str,
        available: bool,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.update_flag(oocp_id, "isAvailable", available, at).await
    }

    async fn set_connected(
        &self,
        oocp_id: &str,
        connected: bool,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.update_flag(oocp_id, "isConnected", connected, at).await
    }
}

/// Events table accessed through the AWS SDK.
#[derive(Debug, Clone)]
pub struct DynamoEventLog {
    client: Client,
    table: String,
}

impl DynamoEventLog {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

#[async_trait]
impl ChargingPointEventLog for DynamoEventLog {
    async fn record(&self, event: &ChargingPointEvent) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(event_to_item(event)?))
            .send()
            .await
            .map_err(|err| {
                Error::repository(format!(
                    "PutItem on {} failed: {}",
                    self.table,
                    DisplayErrorContext(&err)
                ))
            })?;
        Ok(())
    }
}

fn string_attr(item: &Item, name: &str) -> Option<String> {
    item.get(name)?.as_s().ok().cloned()
}

fn bool_attr(item: &Item, name: &str) -> Option<bool> {
    item.get(name)?.as_bool().ok().copied()
}

/// Map a scanned item to a [`ChargingPoint`]; `None` when a required attribute is missing.
pub(crate) fn item_to_charging_point(item: &Item) -> Option<ChargingPoint> {
    let id = string_attr(item, "chargingPointId")?;
    Some(ChargingPoint {
        oocp_charge_point_id: string_attr(item, PARTITION_KEY).unwrap_or_else(|| id.clone()),
        id,
        producer_id: string_attr(item, "producerId"),
        station_name: string_attr(item, "stationName")?,
        primary_electricity_source: string_attr(item, "primaryElectricitySource")?,
        location: string_attr(item, "location")?,
        is_available: bool_attr(item, "isAvailable"),
        is_connected: bool_attr(item, "isConnected"),
        created_at: string_attr(item, "createdAt"),
        status_updated_at: string_attr(item, "statusUpdatedAt"),
    })
}

pub(crate) fn charging_point_to_item(point: &ChargingPoint) -> Item {
    let mut item = Item::new();
    let mut put_s = |name: &str, value: &str| {
        item.insert(name.to_string(), AttributeValue::S(value.to_string()));
    };

    put_s("chargingPointId", &point.id);
    put_s(PARTITION_KEY, &point.oocp_charge_point_id);
    put_s("stationName", &point.station_name);
    put_s("primaryElectricitySource", &point.primary_electricity_source);
    put_s("location", &point.location);
    if let Some(producer_id) = &point.producer_id {
        put_s("producerId", producer_id);
    }
    if let Some(created_at) = &point.created_at {
        put_s("createdAt", created_at);
    }
    if let Some(updated_at) = &point.status_updated_at {
        put_s("statusUpdatedAt", updated_at);
    }

    if let Some(available) = point.is_available {
        item.insert("isAvailable".to_string(), AttributeValue::Bool(available));
    }
    if let Some(connected) = point.is_connected {
        item.insert("isConnected".to_string(), AttributeValue::Bool(connected));
    }
    item
}

pub(crate) fn event_to_item(event: &ChargingPointEvent) -> Result<Item> {
    let message = serde_json::to_string(&event.message)?;
    Ok(HashMap::from([
        ("eventId".to_string(), AttributeValue::S(event.event_id.clone())),
        (
            PARTITION_KEY.to_string(),
            AttributeValue::S(event.oocp_charge_point_id.clone()),
        ),
        ("timestamp".to_string(), AttributeValue::S(event.timestamp.clone())),
        ("eventType".to_string(), AttributeValue::S(event.event_type.clone())),
        ("message".to_string(), AttributeValue::S(message)),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::charging_point;
    use serde_json::json;

    #[test]
    fn stored_points_read_back_unchanged() {
        let mut point = charging_point("cp1", "Station A", "Solar", "51.5074,-0.1278");
        point.oocp_charge_point_id = "ocpp-1".to_string();
        point.producer_id = Some("producer-1".to_string());
        point.is_available = Some(true);
        point.created_at = Some("2024-05-01T10:00:00+00:00".to_string());

        let item = charging_point_to_item(&point);
        assert_eq!(item.get("isAvailable"), Some(&AttributeValue::Bool(true)));
        assert!(!item.contains_key("isConnected"));

        assert_eq!(item_to_charging_point(&item), Some(point));
    }

    #[test]
    fn items_missing_required_attributes_are_rejected() {
        let point = charging_point("cp1", "Station A", "Solar", "51.5074,-0.1278");
        for attribute in ["chargingPointId", "stationName", "primaryElectricitySource", "location"] {
            let mut item = charging_point_to_item(&point);
            item.remove(attribute);
            assert!(item_to_charging_point(&item).is_none(), "{attribute}");
        }
    }

    #[test]
    fn wrong_attribute_types_are_treated_as_missing() {
        let point = charging_point("cp1", "Station A", "Solar", "51.5074,-0.1278");
        let mut item = charging_point_to_item(&point);
        item.insert("location".to_string(), AttributeValue::N("51.5".to_string()));
        item.insert("isConnected".to_string(), AttributeValue::S("yes".to_string()));

        assert!(item_to_charging_point(&item).is_none());

        item.insert("location".to_string(), AttributeValue::S("51.5,-0.1".to_string()));
        let read = item_to_charging_point(&item).unwrap();
        assert_eq!(read.is_connected, None);
    }

    #[test]
    fn legacy_items_without_ocpp_id_fall_back_to_id() {
        let point = charging_point("cp1", "Station A", "Solar", "51.5074,-0.1278");
        let mut item = charging_point_to_item(&point);
        item.remove(PARTITION_KEY);

        assert_eq!(item_to_charging_point(&item).unwrap().oocp_charge_point_id, "cp1");
    }

    #[test]
    fn event_message_is_stored_as_json_text() {
        let event = ChargingPointEvent {
            event_id: "e1".to_string(),
            oocp_charge_point_id: "cp1".to_string(),
            timestamp: "2024-05-01T10:00:00+00:00".to_string(),
            event_type: "connect".to_string(),
            message: json!({"status": "online"}),
        };

        let item = event_to_item(&event).unwrap();
        assert_eq!(
            item.get("message"),
            Some(&AttributeValue::S(r#"{"status":"online"}"#.to_string()))
        );
        assert_eq!(item.get(PARTITION_KEY), Some(&AttributeValue::S("cp1".to_string())));
    }
}
