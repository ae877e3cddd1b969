use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

const EARTH_RADIUS_KM: f64 = 6_371.0;

impl Coordinate {
    pub fn haversine_km(self, other: Self) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlon = (other.lon - self.lon).to_radians();

        let sin_dlat = (dlat / 2.0).sin();
        let sin_dlon = (dlon / 2.0).sin();

        let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
        2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
    }
}

/// Axis-aligned geographic bounding box of a path, used for camera framing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    /// Returns `None` for an empty path.
    pub fn from_path(path: &[Coordinate]) -> Option<Self> {
        let first = path.first()?;
        let mut bounds = GeoBounds {
            min_lat: first.lat,
            max_lat: first.lat,
            min_lon: first.lon,
            max_lon: first.lon,
        };
        for point in &path[1..] {
            bounds.min_lat = bounds.min_lat.min(point.lat);
            bounds.max_lat = bounds.max_lat.max(point.lat);
            bounds.min_lon = bounds.min_lon.min(point.lon);
            bounds.max_lon = bounds.max_lon.max(point.lon);
        }
        Some(bounds)
    }
}

/// One parsed route option returned for a single optimization objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCandidate {
    pub label: String,
    pub path: Vec<Coordinate>,
    pub distance_km: f64,
    pub duration_min: f64,
}

/// Snapshot of a route resolution: the selected best route, the surviving
/// alternates, and the loading/error status. Recreated per resolution and
/// never mutated in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteResolution {
    pub best: Option<RouteCandidate>,
    pub alternates: Vec<RouteCandidate>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl RouteResolution {
    pub fn loading() -> Self {
        RouteResolution {
            is_loading: true,
            ..Default::default()
        }
    }
}

/// Classifier of a geocoded place, driving how wide the map extent should be
/// when framing the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceKind {
    #[default]
    Point,
    City,
    State,
    Country,
}

impl PlaceKind {
    /// Suggested extent (side of the framed square, in km) for a result of
    /// this kind: a point gets a tight frame, broader regions progressively
    /// wider ones.
    pub fn extent_km(self) -> f64 {
        match self {
            PlaceKind::Point => 2.0,
            PlaceKind::City => 25.0,
            PlaceKind::State => 300.0,
            PlaceKind::Country => 1_500.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub coordinate: Coordinate,
    pub label: String,
    pub kind: PlaceKind,
}

/// Edge insets (px) applied when fitting the camera to a route, so the
/// polyline is not hidden behind overlays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeInsets {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
}

impl EdgeInsets {
    pub fn uniform(value: f64) -> Self {
        EdgeInsets {
            top: value,
            left: value,
            right: value,
            bottom: value,
        }
    }
}

/// Fire-and-forget camera command: frame `bounds` with `insets` over a fixed
/// animation duration. A newer fit simply replaces an in-flight one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraFit {
    pub bounds: GeoBounds,
    pub insets: EdgeInsets,
    pub duration_ms: u64,
}
