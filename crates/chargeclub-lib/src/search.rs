//! Proximity search over all known charging points.
//!
//! The search geocodes a postcode, reads every charging point, and keeps the
//! ones whose great-circle distance to the postcode is within the radius:
//!
//! ```text
//! postcode ─▶ validate ─▶ geocode ─▶ list_all ─▶ parse location ─▶ distance ≤ radius ─▶ project
//! ```
//!
//! Records with an unparseable `location` are skipped individually; they never
//! fail the whole search.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::distance::{great_circle_miles, Coordinates};
use crate::error::{Error, Result};
use crate::geocoding::{geocode_postcode, Geocoder};
use crate::model::{ChargingPoint, SearchResult};
use crate::repository::ChargingPointRepository;

/// Radius applied when the caller does not supply one.
pub const DEFAULT_RADIUS_MILES: f64 = 5.0;

/// Parameters of a single proximity search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Free-text postcode; `None` when the caller omitted it.
    pub postcode: Option<String>,
    /// Inclusive search radius in statute miles.
    pub radius_miles: f64,
}

impl SearchQuery {
    /// A query for `postcode` with the default radius.
    pub fn new(postcode: impl Into<String>) -> Self {
        Self {
            postcode: Some(postcode.into()),
            radius_miles: DEFAULT_RADIUS_MILES,
        }
    }

    /// Build a query from optional request fields, defaulting the radius.
    pub fn from_parts(postcode: Option<String>, radius_miles: Option<f64>) -> Self {
        Self {
            postcode,
            radius_miles: radius_miles.unwrap_or(DEFAULT_RADIUS_MILES),
        }
    }

    pub fn with_radius(mut self, radius_miles: f64) -> Self {
        self.radius_miles = radius_miles;
        self
    }
}

/// Proximity search with its collaborators injected.
#[derive(Clone)]
pub struct ProximitySearch {
    repository: Arc<dyn ChargingPointRepository>,
    geocoder: Arc<dyn Geocoder>,
}

impl ProximitySearch {
    pub fn new(repository: Arc<dyn ChargingPointRepository>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            repository,
            geocoder,
        }
    }

    /// Return every charging point within `query.radius_miles` of the postcode.
    ///
    /// Results keep storage order. Fails with [`Error::InvalidPostcode`] before
    /// touching the repository when the postcode is missing, malformed or
    /// unresolvable.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        let postcode = query.postcode.as_deref().unwrap_or_default();

        let origin = geocode_postcode(self.geocoder.as_ref(), postcode)
            .await?
            .ok_or(Error::InvalidPostcode)?;

        debug!(
            %postcode,
            latitude = origin.latitude,
            longitude = origin.longitude,
            "postcode resolved"
        );

        let points = self.repository.list_all().await?;
        let scanned = points.len();
        let results = filter_within_radius(&points, origin, query.radius_miles);

        info!(
            %postcode,
            radius_miles = query.radius_miles,
            scanned,
            matched = results.len(),
            "proximity search completed"
        );

        Ok(results)
    }
}

impl std::fmt::Debug for ProximitySearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProximitySearch").finish_non_exhaustive()
    }
}

/// Project every point whose distance to `origin` is at most `radius_miles`.
///
/// Points with a malformed location are logged and skipped.
pub fn filter_within_radius(
    points: &[ChargingPoint],
    origin: Coordinates,
    radius_miles: f64,
) -> Vec<SearchResult> {
    points
        .iter()
        .filter_map(|point| match point.coordinates() {
            Ok(coords) => Some((point, coords)),
            Err(e) => {
                warn!(
                    charging_point_id = %point.id,
                    error = %e,
                    "skipping charging point with malformed location"
                );
                None
            }
        })
        .filter(|(_, coords)| great_circle_miles(origin, *coords) <= radius_miles)
        .map(|(point, _)| point.to_search_result())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        charging_point, london_cluster, FailingRepository, InMemoryRepository, StaticGeocoder,
        LONDON,
    };

    fn ids(results: &[SearchResult]) -> Vec<&str> {
        results
            .iter()
            .map(|r| r.charging_point_id.as_str())
            .collect()
    }

    #[test]
    fn default_radius_is_five_miles() {
        assert_eq!(SearchQuery::new("SW1A 1AA").radius_miles, 5.0);
        assert_eq!(SearchQuery::from_parts(None, None).radius_miles, 5.0);
        assert_eq!(SearchQuery::from_parts(None, Some(2.5)).radius_miles, 2.5);
    }

    #[test]
    fn filter_skips_malformed_locations() {
        let mut points = london_cluster();
        points.insert(0, charging_point("broken", "Broken", "Grid", "not-a-location"));
        points.push(charging_point("half", "Half", "Grid", "51.5"));

        let results = filter_within_radius(&points, LONDON, 10.0);
        assert_eq!(ids(&results), vec!["cp1", "cp3"]);
    }

    #[test]
    fn filter_is_inclusive_at_the_boundary() {
        let points = london_cluster();
        let edge = points[2].coordinates().unwrap();
        let radius = great_circle_miles(LONDON, edge);

        let results = filter_within_radius(&points, LONDON, radius);
        assert!(ids(&results).contains(&"cp3"));

        let results = filter_within_radius(&points, LONDON, radius - 1e-9);
        assert!(!ids(&results).contains(&"cp3"));
    }

    #[tokio::test]
    async fn invalid_postcode_does_not_read_repository() {
        let repository = Arc::new(InMemoryRepository::with_points(london_cluster()));
        let geocoder = Arc::new(StaticGeocoder::resolving(LONDON));
        let search = ProximitySearch::new(repository.clone(), geocoder.clone());

        let err = search
            .search(&SearchQuery::new("INVALID").with_radius(10.0))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidPostcode));
        assert_eq!(repository.list_calls(), 0);
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn missing_postcode_is_invalid() {
        let repository = Arc::new(InMemoryRepository::with_points(london_cluster()));
        let search = ProximitySearch::new(
            repository.clone(),
            Arc::new(StaticGeocoder::resolving(LONDON)),
        );

        let err = search
            .search(&SearchQuery::from_parts(None, Some(10.0)))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidPostcode));
        assert_eq!(repository.list_calls(), 0);
    }

    #[tokio::test]
    async fn unresolvable_postcode_is_invalid() {
        let repository = Arc::new(InMemoryRepository::with_points(london_cluster()));
        let search = ProximitySearch::new(repository.clone(), Arc::new(StaticGeocoder::unresolved()));

        let err = search.search(&SearchQuery::new("ZZ9 9ZZ")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidPostcode));
        assert_eq!(repository.list_calls(), 0);
    }

    #[tokio::test]
    async fn geocoder_failure_is_a_collaborator_error() {
        let repository = Arc::new(InMemoryRepository::with_points(london_cluster()));
        let search = ProximitySearch::new(repository.clone(), Arc::new(StaticGeocoder::failing()));

        let err = search.search(&SearchQuery::new("SW1A 1AA")).await.unwrap_err();
        assert!(matches!(err, Error::Geocoding(_)));
        assert!(!err.is_client_error());
        assert_eq!(repository.list_calls(), 0);
    }

    #[tokio::test]
    async fn repository_failure_propagates() {
        let search = ProximitySearch::new(
            Arc::new(FailingRepository),
            Arc::new(StaticGeocoder::resolving(LONDON)),
        );

        let err = search.search(&SearchQuery::new("SW1A 1AA")).await.unwrap_err();
        assert!(matches!(err, Error::RepositoryUnavailable { .. }));
    }

    #[tokio::test]
    async fn london_cluster_within_ten_miles() {
        let search = ProximitySearch::new(
            Arc::new(InMemoryRepository::with_points(london_cluster())),
            Arc::new(StaticGeocoder::resolving(LONDON)),
        );

        let results = search
            .search(&SearchQuery::new("SW1A 1AA").with_radius(10.0))
            .await
            .unwrap();

        assert_eq!(ids(&results), vec!["cp1", "cp3"]);
    }

    #[tokio::test]
    async fn repeated_searches_return_the_same_results() {
        let search = ProximitySearch::new(
            Arc::new(InMemoryRepository::with_points(london_cluster())),
            Arc::new(StaticGeocoder::resolving(LONDON)),
        );
        let query = SearchQuery::new("SW1A 1AA");

        let first = search.search(&query).await.unwrap();
        let second = search.search(&query).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn omitted_radius_matches_explicit_five_miles() {
        let search = ProximitySearch::new(
            Arc::new(InMemoryRepository::with_points(london_cluster())),
            Arc::new(StaticGeocoder::resolving(LONDON)),
        );

        let implicit = search
            .search(&SearchQuery::from_parts(Some("SW1A 1AA".to_string()), None))
            .await
            .unwrap();
        let explicit = search
            .search(&SearchQuery::new("SW1A 1AA").with_radius(5.0))
            .await
            .unwrap();
        assert_eq!(implicit, explicit);
    }
}
