//! reqwest-backed implementations of the routing and geocoding backends.
//!
//! Requests are plain query-string parameterized GETs; responses are
//! feature-collection JSON with lon-lat geometry and metric totals.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::BackendError;
use crate::geocode::{GeocodeBias, GeocodedPlace, GeocodingBackend};
use crate::models::{Coordinate, PlaceKind};
use crate::route::{RawRoute, RouteGeometry, RouteObjective, RoutingBackend, TravelMode};

pub struct HttpRoutingClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpRoutingClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, api_key)
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        HttpRoutingClient {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RouteEnvelope {
    features: Vec<RouteFeature>,
}

#[derive(Debug, Deserialize)]
struct RouteFeature {
    geometry: RouteGeometry,
    properties: RouteTotals,
}

#[derive(Debug, Deserialize)]
struct RouteTotals {
    /// meters
    distance: f64,
    /// seconds
    time: f64,
}

#[async_trait]
impl RoutingBackend for HttpRoutingClient {
    async fn route(
        &self,
        waypoints: &[Coordinate],
        mode: TravelMode,
        objective: Option<RouteObjective>,
    ) -> Result<RawRoute, BackendError> {
        let waypoints_param = join_waypoints(waypoints);
        let mut request = self
            .http
            .get(format!("{}/v1/routing", self.base_url))
            .query(&[
                ("waypoints", waypoints_param.as_str()),
                ("mode", mode.as_param()),
                ("apiKey", self.api_key.as_str()),
            ]);
        if let Some(objective) = objective {
            request = request.query(&[("type", objective.as_param())]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let envelope: RouteEnvelope = serde_json::from_str(&body)?;
        let feature = envelope
            .features
            .into_iter()
            .next()
            .ok_or(BackendError::Empty)?;
        Ok(RawRoute {
            geometry: feature.geometry,
            distance_m: feature.properties.distance,
            duration_s: feature.properties.time,
        })
    }
}

/// `lat,lon|lat,lon|...`
fn join_waypoints(waypoints: &[Coordinate]) -> String {
    waypoints
        .iter()
        .map(|point| format!("{},{}", point.lat, point.lon))
        .collect::<Vec<_>>()
        .join("|")
}

pub struct HttpGeocodingClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpGeocodingClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, api_key)
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        HttpGeocodingClient {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn fetch_places(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<GeocodedPlace>, BackendError> {
        let response = self
            .http
            .get(format!("{}/v1/geocode/{endpoint}", self.base_url))
            .query(params)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let envelope: GeocodeEnvelope = serde_json::from_str(&body)?;
        Ok(envelope
            .features
            .into_iter()
            .map(|feature| feature.properties.into())
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeEnvelope {
    features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodeFeature {
    properties: PlaceProperties,
}

#[derive(Debug, Deserialize)]
struct PlaceProperties {
    lat: f64,
    lon: f64,
    formatted: Option<String>,
    locality: Option<String>,
    town: Option<String>,
    village: Option<String>,
    county: Option<String>,
    region: Option<String>,
    country: Option<String>,
    result_type: Option<String>,
}

impl From<PlaceProperties> for GeocodedPlace {
    fn from(properties: PlaceProperties) -> Self {
        GeocodedPlace {
            position: [properties.lon, properties.lat],
            formatted: properties.formatted.unwrap_or_default(),
            kind: classify(properties.result_type.as_deref()),
            locality: properties.locality,
            town: properties.town,
            village: properties.village,
            county: properties.county,
            region: properties.region,
            country: properties.country,
        }
    }
}

fn classify(result_type: Option<&str>) -> PlaceKind {
    match result_type.unwrap_or_default() {
        "country" => PlaceKind::Country,
        "state" | "region" => PlaceKind::State,
        "city" | "town" | "village" | "locality" | "county" | "postcode" => PlaceKind::City,
        _ => PlaceKind::Point,
    }
}

#[async_trait]
impl GeocodingBackend for HttpGeocodingClient {
    async fn forward(
        &self,
        query: &str,
        bias: &GeocodeBias,
    ) -> Result<Vec<GeocodedPlace>, BackendError> {
        let bias_param = match bias {
            GeocodeBias::Proximity(point) => {
                ("bias", format!("proximity:{},{}", point.lon, point.lat))
            }
            GeocodeBias::Region(code) => ("filter", format!("countrycode:{code}")),
        };
        self.fetch_places(
            "search",
            &[
                ("text", query),
                (bias_param.0, bias_param.1.as_str()),
                ("limit", "5"),
            ],
        )
        .await
    }

    async fn reverse(&self, coordinate: Coordinate) -> Result<Vec<GeocodedPlace>, BackendError> {
        let lat = coordinate.lat.to_string();
        let lon = coordinate.lon.to_string();
        self.fetch_places(
            "reverse",
            &[("lat", lat.as_str()), ("lon", lon.as_str()), ("limit", "1")],
        )
        .await
    }
}
