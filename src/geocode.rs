use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{BackendError, GeocodeError};
use crate::models::{Coordinate, GeocodeResult, PlaceKind};

/// Hint influencing geocoder ranking: favour results near a point, or inside
/// a region identified by its code.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeBias {
    Proximity(Coordinate),
    Region(String),
}

/// One place in a geocoder response: position ordered longitude-then-latitude,
/// a formatted label, component name fields and a kind classifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeocodedPlace {
    pub position: [f64; 2],
    pub formatted: String,
    pub locality: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub county: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub kind: PlaceKind,
}

#[async_trait]
pub trait GeocodingBackend: Send + Sync {
    async fn forward(
        &self,
        query: &str,
        bias: &GeocodeBias,
    ) -> Result<Vec<GeocodedPlace>, BackendError>;

    async fn reverse(&self, coordinate: Coordinate) -> Result<Vec<GeocodedPlace>, BackendError>;
}

/// Text <-> coordinate resolution with regional bias.
///
/// Forward responses are tagged with a monotonic sequence number; a response
/// arriving after a newer search was issued is dropped, so the latest search
/// always wins.
pub struct GeocodingResolver {
    backend: Arc<dyn GeocodingBackend>,
    seq: AtomicU64,
}

impl GeocodingResolver {
    pub fn new(backend: Arc<dyn GeocodingBackend>) -> Self {
        GeocodingResolver {
            backend,
            seq: AtomicU64::new(0),
        }
    }

    /// Resolves free text to the first matching place.
    ///
    /// Empty or whitespace-only input is rejected without a backend call
    /// (`Ok(None)`), as is a response superseded by a newer search. An empty
    /// result list is a [`GeocodeError::NotFound`]; the caller keeps its
    /// previous selection in that case.
    pub async fn forward_search(
        &self,
        text: &str,
        bias: &GeocodeBias,
    ) -> Result<Option<GeocodeResult>, GeocodeError> {
        let query = text.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let places = self.backend.forward(query, bias).await?;

        if self.seq.load(Ordering::SeqCst) != seq {
            tracing::debug!(query, "dropping superseded geocode response");
            return Ok(None);
        }

        let first = places.into_iter().next().ok_or(GeocodeError::NotFound)?;
        Ok(Some(GeocodeResult {
            coordinate: Coordinate {
                lat: first.position[1],
                lon: first.position[0],
            },
            label: first.formatted,
            kind: first.kind,
        }))
    }

    /// Best-effort area naming for a coordinate: the first non-empty of
    /// locality, town, village, county, region, country. Any failure is
    /// silent (`None`); the caller retains its previous label.
    pub async fn reverse_lookup(&self, coordinate: Coordinate) -> Option<String> {
        match self.backend.reverse(coordinate).await {
            Ok(places) => places.first().and_then(area_label),
            Err(err) => {
                tracing::debug!(%err, ?coordinate, "reverse lookup failed");
                None
            }
        }
    }
}

fn area_label(place: &GeocodedPlace) -> Option<String> {
    [
        &place.locality,
        &place.town,
        &place.village,
        &place.county,
        &place.region,
        &place.country,
    ]
    .into_iter()
    .flatten()
    .find(|name| !name.trim().is_empty())
    .cloned()
}
