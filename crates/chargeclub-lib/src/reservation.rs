//! Operator reservation endpoints over HTTP.
//!
//! Each operator network is reached through its own endpoint, configured as
//! `System=url` pairs. The reservation is posted as JSON; any 2xx answer
//! confirms it.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{instrument, warn};

use crate::booking::{Reservation, ReservationError, ReservationGateway};
use crate::error::{Error, Result};

pub(crate) const DEFAULT_RESERVATION_TIMEOUT_SECS: u64 = 10;

/// Operator endpoints keyed by system name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationConfig {
    pub endpoints: BTreeMap<String, String>,
    pub timeout_secs: u64,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            endpoints: BTreeMap::new(),
            timeout_secs: DEFAULT_RESERVATION_TIMEOUT_SECS,
        }
    }
}

impl ReservationConfig {
    /// Parse `Virta=https://a.example,EVBox=https://b.example`.
    ///
    /// `name` is the variable the value came from and is used in errors.
    pub fn parse_endpoints(name: &str, raw: &str) -> Result<BTreeMap<String, String>> {
        raw.split(',')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (system, url) = pair
                    .split_once('=')
                    .map(|(s, u)| (s.trim(), u.trim()))
                    .filter(|(s, u)| !s.is_empty() && !u.is_empty())
                    .ok_or_else(|| {
                        Error::invalid_config(name, format!("expected System=url, got '{pair}'"))
                    })?;
                Ok((system.to_string(), url.to_string()))
            })
            .collect()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReservationPayload<'a> {
    charge_point_id: &'a str,
    connector_id: &'a str,
    start_time: &'a str,
    end_time: &'a str,
}

/// [`ReservationGateway`] posting to per-operator HTTP endpoints.
#[derive(Debug, Clone)]
pub struct HttpReservationGateway {
    client: Client,
    endpoints: BTreeMap<String, String>,
}

impl HttpReservationGateway {
    pub fn new(config: &ReservationConfig) -> std::result::Result<Self, ReservationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ReservationError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            endpoints: config.endpoints.clone(),
        })
    }
}

#[async_trait]
impl ReservationGateway for HttpReservationGateway {
    #[instrument(skip(self), fields(system = %reservation.system))]
    async fn reserve(&self, reservation: &Reservation) -> std::result::Result<(), ReservationError> {
        let url = self.endpoints.get(&reservation.system).ok_or_else(|| {
            ReservationError::UnsupportedSystem {
                system: reservation.system.clone(),
            }
        })?;

        let payload = ReservationPayload {
            charge_point_id: &reservation.oocp_charge_point_id,
            connector_id: &reservation.connector_id,
            start_time: &reservation.start_time,
            end_time: &reservation.end_time,
        };

        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReservationError::Timeout
                } else {
                    ReservationError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, body = %body, "operator rejected reservation");
        Err(ReservationError::Rejected(format!("HTTP {status}")))
    }
}
