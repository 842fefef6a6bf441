//! Charging point availability from device MQTT messages.
//!
//! Devices publish on `charging_points/<oocpChargePointId>/<action>`; the IoT
//! rules engine forwards batches of `{topic, message}` records. Two message
//! families are understood:
//!
//! - `.../status` messages carry `{"status": "online" | ...}` and drive
//!   `isConnected`.
//! - Other topics carry an OCPP `action`. `StatusNotification`,
//!   `StartTransaction` and `StopTransaction` drive `isAvailable`; any other
//!   action is only recorded in the event log.
//!
//! A whole batch is parsed before anything is written, so a malformed record
//! rejects the batch without side effects.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::ChargingPointEvent;
use crate::repository::{ChargingPointEventLog, ChargingPointRepository};

const STATUS_SUFFIX: &str = "/status";
const INVALID_STATUS: &str = "Invalid status field in message.";

/// Batch of MQTT messages delivered by an IoT topic rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IotEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<IotRecord>,
}

/// One MQTT message. `message` may be a JSON document or a string holding one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IotRecord {
    pub topic: String,
    #[serde(default)]
    pub message: Value,
}

/// What a single record asks the store to do.
#[derive(Debug, Clone, PartialEq)]
pub enum AvailabilityCommand {
    /// Device came online or went offline.
    Connection {
        oocp_id: String,
        connected: bool,
        status: String,
    },
    /// OCPP action that changes whether the point can be booked.
    Availability {
        oocp_id: String,
        available: bool,
        action: String,
        message: Value,
    },
    /// Action with no availability effect; logged only.
    RecordOnly {
        oocp_id: String,
        action: String,
        message: Value,
    },
}

impl AvailabilityCommand {
    /// Interpret one MQTT record.
    pub fn parse(record: &IotRecord) -> Result<Self> {
        let oocp_id = charging_point_id_from_topic(&record.topic)?.to_string();
        let message = decode_message(&record.message)?;

        if record.topic.ends_with(STATUS_SUFFIX) {
            let status = message
                .get("status")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| Error::invalid_input(INVALID_STATUS))?
                .to_string();
            return Ok(Self::Connection {
                oocp_id,
                connected: status == "online",
                status,
            });
        }

        let action = message
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        let available = match action.as_str() {
            "StatusNotification" => Some(
                message
                    .pointer("/payload/status")
                    .and_then(Value::as_str)
                    == Some("Available"),
            ),
            "StartTransaction" => Some(false),
            "StopTransaction" => Some(true),
            _ => None,
        };

        Ok(match available {
            Some(available) => Self::Availability {
                oocp_id,
                available,
                action,
                message,
            },
            None => Self::RecordOnly {
                oocp_id,
                action,
                message,
            },
        })
    }

    pub fn oocp_id(&self) -> &str {
        match self {
            Self::Connection { oocp_id, .. }
            | Self::Availability { oocp_id, .. }
            | Self::RecordOnly { oocp_id, .. } => oocp_id,
        }
    }
}

/// Extract the charging point id from `charging_points/<id>/<action>`.
pub fn charging_point_id_from_topic(topic: &str) -> Result<&str> {
    topic
        .split('/')
        .nth(1)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::InvalidTopic {
            topic: topic.to_string(),
        })
}

fn decode_message(message: &Value) -> Result<Value> {
    match message {
        Value::String(text) => Ok(serde_json::from_str(text)?),
        other => Ok(other.clone()),
    }
}

/// Applies availability commands to the store and the event log.
#[derive(Clone)]
pub struct AvailabilityIngestor {
    repository: Arc<dyn ChargingPointRepository>,
    events: Arc<dyn ChargingPointEventLog>,
}

impl AvailabilityIngestor {
    pub fn new(
        repository: Arc<dyn ChargingPointRepository>,
        events: Arc<dyn ChargingPointEventLog>,
    ) -> Self {
        Self { repository, events }
    }

    /// Parse and apply every record of `event`. Returns the number of records processed.
    pub async fn ingest(&self, event: &IotEvent, now: DateTime<Utc>) -> Result<usize> {
        let commands = event
            .records
            .iter()
            .map(AvailabilityCommand::parse)
            .collect::<Result<Vec<_>>>()?;

        for command in &commands {
            self.apply(command, now).await?;
        }

        info!(processed = commands.len(), "availability messages processed");
        Ok(commands.len())
    }

    /// Apply a single command.
    pub async fn apply(&self, command: &AvailabilityCommand, now: DateTime<Utc>) -> Result<()> {
        let (event_type, message) = match command {
            AvailabilityCommand::Connection {
                oocp_id,
                connected,
                status,
            } => {
                self.repository.set_connected(oocp_id, *connected, now).await?;
                let event_type = if *connected { "connect" } else { "disconnect" };
                (event_type.to_string(), json!({ "status": status }))
            }
            AvailabilityCommand::Availability {
                oocp_id,
                available,
                action,
                message,
            } => {
                self.repository
                    .set_availability(oocp_id, *available, now)
                    .await?;
                (action.clone(), message.clone())
            }
            AvailabilityCommand::RecordOnly {
                action, message, ..
            } => {
                debug!(oocp_id = %command.oocp_id(), %action, "recording action without state change");
                (action.clone(), message.clone())
            }
        };

        self.events
            .record(&ChargingPointEvent {
                event_id: Uuid::new_v4().to_string(),
                oocp_charge_point_id: command.oocp_id().to_string(),
                timestamp: now.to_rfc3339(),
                event_type,
                message,
            })
            .await
    }
}

impl std::fmt::Debug for AvailabilityIngestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailabilityIngestor").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{london_cluster, InMemoryEventLog, InMemoryRepository};

    fn record(topic: &str, message: Value) -> IotRecord {
        IotRecord {
            topic: topic.to_string(),
            message,
        }
    }

    fn ingestor() -> (Arc<InMemoryRepository>, Arc<InMemoryEventLog>, AvailabilityIngestor) {
        let repository = Arc::new(InMemoryRepository::with_points(london_cluster()));
        let events = Arc::new(InMemoryEventLog::new());
        let ingestor = AvailabilityIngestor::new(repository.clone(), events.clone());
        (repository, events, ingestor)
    }

    #[test]
    fn topic_id_extraction() {
        assert_eq!(
            charging_point_id_from_topic("charging_points/cp1/status").unwrap(),
            "cp1"
        );
        assert!(matches!(
            charging_point_id_from_topic("charging_points"),
            Err(Error::InvalidTopic { .. })
        ));
        assert!(matches!(
            charging_point_id_from_topic("charging_points//status"),
            Err(Error::InvalidTopic { .. })
        ));
    }

    #[test]
    fn parses_status_messages() {
        let command =
            AvailabilityCommand::parse(&record("charging_points/cp1/status", json!({"status": "online"})))
                .unwrap();
        assert_eq!(
            command,
            AvailabilityCommand::Connection {
                oocp_id: "cp1".to_string(),
                connected: true,
                status: "online".to_string(),
            }
        );

        let offline = AvailabilityCommand::parse(&record(
            "charging_points/cp1/status",
            json!({"status": "offline"}),
        ))
        .unwrap();
        assert!(matches!(
            offline,
            AvailabilityCommand::Connection { connected: false, .. }
        ));
    }

    #[test]
    fn status_message_requires_status() {
        let err = AvailabilityCommand::parse(&record("charging_points/cp1/status", json!({})))
            .unwrap_err();
        assert_eq!(err.to_string(), INVALID_STATUS);
    }

    #[test]
    fn string_encoded_messages_are_decoded() {
        let command = AvailabilityCommand::parse(&record(
            "charging_points/cp1/action",
            Value::String(r#"{"action": "StartTransaction"}"#.to_string()),
        ))
        .unwrap();
        assert!(matches!(
            command,
            AvailabilityCommand::Availability { available: false, .. }
        ));
    }

    #[test]
    fn undecodable_string_message_is_json_error() {
        let err = AvailabilityCommand::parse(&record(
            "charging_points/cp1/action",
            Value::String("{not json".to_string()),
        ))
        .unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn ocpp_actions_map_to_availability() {
        let cases = [
            (json!({"action": "StatusNotification", "payload": {"status": "Available"}}), true),
            (json!({"action": "StatusNotification", "payload": {"status": "Charging"}}), false),
            (json!({"action": "StartTransaction"}), false),
            (json!({"action": "StopTransaction"}), true),
        ];
        for (message, expected) in cases {
            let command =
                AvailabilityCommand::parse(&record("charging_points/cp1/ocpp", message.clone()))
                    .unwrap();
            match command {
                AvailabilityCommand::Availability { available, .. } => {
                    assert_eq!(available, expected, "{message}")
                }
                other => panic!("unexpected command {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_actions_are_record_only() {
        let command = AvailabilityCommand::parse(&record(
            "charging_points/cp1/ocpp",
            json!({"action": "Heartbeat"}),
        ))
        .unwrap();
        assert!(matches!(command, AvailabilityCommand::RecordOnly { ref action, .. } if action == "Heartbeat"));
    }

    #[tokio::test]
    async fn ingest_updates_state_and_logs_events() {
        let (repository, events, ingestor) = ingestor();
        let event = IotEvent {
            records: vec![
                record("charging_points/cp1/status", json!({"status": "online"})),
                record("charging_points/cp1/ocpp", json!({"action": "StartTransaction"})),
                record("charging_points/cp3/ocpp", json!({"action": "Heartbeat"})),
            ],
        };

        let processed = ingestor.ingest(&event, Utc::now()).await.unwrap();
        assert_eq!(processed, 3);

        let cp1 = repository.find("cp1").unwrap();
        assert_eq!(cp1.is_connected, Some(true));
        assert_eq!(cp1.is_available, Some(false));

        let cp3 = repository.find("cp3").unwrap();
        assert_eq!(cp3.is_available, None);

        let logged: Vec<_> = events.events().into_iter().map(|e| e.event_type).collect();
        assert_eq!(logged, vec!["connect", "StartTransaction", "Heartbeat"]);
    }

    #[tokio::test]
    async fn malformed_record_rejects_batch_without_writes() {
        let (repository, events, ingestor) = ingestor();
        let event = IotEvent {
            records: vec![
                record("charging_points/cp1/status", json!({"status": "online"})),
                record("bad-topic", json!({"status": "online"})),
            ],
        };

        let err = ingestor.ingest(&event, Utc::now()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidTopic { .. }));
        assert_eq!(repository.find("cp1").unwrap().is_connected, None);
        assert!(events.events().is_empty());
    }

    #[tokio::test]
    async fn unknown_charging_point_is_not_found() {
        let (_, events, ingestor) = ingestor();
        let event = IotEvent {
            records: vec![record("charging_points/ghost/status", json!({"status": "online"}))],
        };

        let err = ingestor.ingest(&event, Utc::now()).await.unwrap_err();
        assert!(matches!(err, Error::ChargingPointNotFound { ref id } if id == "ghost"));
        assert!(events.events().is_empty());
    }

    #[test]
    fn iot_event_deserializes_records_key() {
        let event: IotEvent = serde_json::from_value(json!({
            "Records": [{"topic": "charging_points/cp1/status", "message": "{\"status\":\"online\"}"}]
        }))
        .unwrap();
        assert_eq!(event.records.len(), 1);
        assert!(event.records[0].message.is_string());
    }
}
