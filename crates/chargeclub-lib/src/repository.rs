//! Storage seams for charging points and their event history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{ChargingPoint, ChargingPointEvent};

/// Access to the charging points table.
///
/// Implementations report any storage failure as
/// [`Error::RepositoryUnavailable`](crate::Error::RepositoryUnavailable).
#[async_trait]
pub trait ChargingPointRepository: Send + Sync {
    /// Read every charging point. This is a full table read; there is no
    /// spatial pre-filter.
    async fn list_all(&self) -> Result<Vec<ChargingPoint>>;

    /// Persist a newly registered charging point.
    async fn insert(&self, point: &ChargingPoint) -> Result<()>;

    /// Set `isAvailable` for the point keyed by `oocp_id`.
    ///
    /// Fails with [`Error::ChargingPointNotFound`](crate::Error::ChargingPointNotFound)
    /// when no such point exists.
    async fn set_availability(
        &self,
        oocp_id: &str,
        available: bool,
        at: DateTime<Utc>,
    ) -> Result<()>;

    /// Set `isConnected` for the point keyed by `oocp_id`.
    async fn set_connected(&self, oocp_id: &str, connected: bool, at: DateTime<Utc>)
        -> Result<()>;
}

/// Append-only log of device events.
#[async_trait]
pub trait ChargingPointEventLog: Send + Sync {
    async fn record(&self, event: &ChargingPointEvent) -> Result<()>;
}
