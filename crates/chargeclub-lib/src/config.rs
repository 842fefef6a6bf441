//! Environment-driven configuration, read once per cold start.

use std::env;

use crate::error::{Error, Result};
use crate::geocoding::{
    default_base_url, default_country_codes, default_timeout_secs, default_user_agent,
    NominatimConfig,
};
use crate::reservation::{ReservationConfig, DEFAULT_RESERVATION_TIMEOUT_SECS};

pub const CHARGING_POINTS_TABLE_ENV: &str = "CHARGING_POINTS_TABLE_NAME";
pub const CHARGING_POINT_EVENTS_TABLE_ENV: &str = "CHARGING_POINT_EVENTS_TABLE_NAME";
pub const GEOCODER_BASE_URL_ENV: &str = "GEOCODER_BASE_URL";
pub const GEOCODER_USER_AGENT_ENV: &str = "GEOCODER_USER_AGENT";
pub const GEOCODER_COUNTRY_CODES_ENV: &str = "GEOCODER_COUNTRY_CODES";
pub const GEOCODER_TIMEOUT_SECS_ENV: &str = "GEOCODER_TIMEOUT_SECS";
pub const RESERVATION_ENDPOINTS_ENV: &str = "RESERVATION_ENDPOINTS";
pub const RESERVATION_TIMEOUT_SECS_ENV: &str = "RESERVATION_TIMEOUT_SECS";
pub const CORS_ALLOW_ORIGIN_ENV: &str = "CORS_ALLOW_ORIGIN";

const DEFAULT_CORS_ALLOW_ORIGIN: &str = "http://localhost:3000";

/// Settings shared by every Lambda.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub charging_points_table: String,
    /// Only the ingestion Lambda writes events; see [`Config::require_events_table`].
    pub charging_point_events_table: Option<String>,
    pub geocoder: NominatimConfig,
    /// Operator endpoints used by booking; empty when unset.
    pub reservations: ReservationConfig,
    pub cors_allow_origin: String,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let charging_points_table = get(CHARGING_POINTS_TABLE_ENV).ok_or_else(|| {
            Error::MissingConfig {
                name: CHARGING_POINTS_TABLE_ENV.to_string(),
            }
        })?;

        let timeout_secs = positive_secs(GEOCODER_TIMEOUT_SECS_ENV, get(GEOCODER_TIMEOUT_SECS_ENV))?
            .unwrap_or_else(default_timeout_secs);

        let reservations = ReservationConfig {
            endpoints: match get(RESERVATION_ENDPOINTS_ENV) {
                Some(raw) => ReservationConfig::parse_endpoints(RESERVATION_ENDPOINTS_ENV, &raw)?,
                None => Default::default(),
            },
            timeout_secs: positive_secs(
                RESERVATION_TIMEOUT_SECS_ENV,
                get(RESERVATION_TIMEOUT_SECS_ENV),
            )?
            .unwrap_or(DEFAULT_RESERVATION_TIMEOUT_SECS),
        };

        // An explicitly empty country list disables the filter, so it is read raw.
        let country_codes = lookup(GEOCODER_COUNTRY_CODES_ENV)
            .map(|value| value.trim().to_string())
            .unwrap_or_else(default_country_codes);

        Ok(Self {
            charging_points_table,
            charging_point_events_table: get(CHARGING_POINT_EVENTS_TABLE_ENV),
            geocoder: NominatimConfig {
                base_url: get(GEOCODER_BASE_URL_ENV).unwrap_or_else(default_base_url),
                user_agent: get(GEOCODER_USER_AGENT_ENV).unwrap_or_else(default_user_agent),
                country_codes,
                timeout_secs,
            },
            reservations,
            cors_allow_origin: get(CORS_ALLOW_ORIGIN_ENV)
                .unwrap_or_else(|| DEFAULT_CORS_ALLOW_ORIGIN.to_string()),
        })
    }

    /// The events table name, or [`Error::MissingConfig`] when unset.
    pub fn require_events_table(&self) -> Result<&str> {
        self.charging_point_events_table
            .as_deref()
            .ok_or_else(|| Error::MissingConfig {
                name: CHARGING_POINT_EVENTS_TABLE_ENV.to_string(),
            })
    }
}

fn positive_secs(name: &str, raw: Option<String>) -> Result<Option<u64>> {
    raw.map(|raw| {
        raw.parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                Error::invalid_config(name, format!("must be a positive integer, got '{raw}'"))
            })
    })
    .transpose()
}
