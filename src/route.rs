use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::watch;

use crate::debounce::Debouncer;
use crate::error::BackendError;
use crate::models::{Coordinate, RouteCandidate, RouteResolution};
use crate::panel::{MapSurface, PanelViewportController};

/// Route geometry as the backend returns it: a single line or a sequence of
/// line segments, positions ordered longitude-then-latitude.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum RouteGeometry {
    LineString(Vec<[f64; 2]>),
    MultiLineString(Vec<Vec<[f64; 2]>>),
}

/// Undecoded route response: geometry plus total distance (meters) and total
/// time (seconds), exactly as routing backends report them.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRoute {
    pub geometry: RouteGeometry,
    pub distance_m: f64,
    pub duration_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelMode {
    Drive,
    Walk,
    Bike,
}

impl TravelMode {
    pub fn as_param(self) -> &'static str {
        match self {
            TravelMode::Drive => "drive",
            TravelMode::Walk => "walk",
            TravelMode::Bike => "bicycle",
        }
    }
}

/// Optimization objective of a single candidate request. `None` at the trait
/// level means the backend's unoptimized default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteObjective {
    Fastest,
    Shortest,
}

impl RouteObjective {
    pub fn as_param(self) -> &'static str {
        match self {
            RouteObjective::Fastest => "time",
            RouteObjective::Shortest => "short",
        }
    }

    fn label(self) -> &'static str {
        match self {
            RouteObjective::Fastest => "fastest",
            RouteObjective::Shortest => "shortest",
        }
    }
}

/// The fixed candidate set requested per resolution.
const CANDIDATE_OBJECTIVES: [RouteObjective; 2] =
    [RouteObjective::Fastest, RouteObjective::Shortest];

const DEFAULT_LABEL: &str = "default";
const NO_ROUTE: &str = "no route";

#[async_trait]
pub trait RoutingBackend: Send + Sync {
    async fn route(
        &self,
        waypoints: &[Coordinate],
        mode: TravelMode,
        objective: Option<RouteObjective>,
    ) -> Result<RawRoute, BackendError>;
}

#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Quiet interval coalescing rapid-fire resolve calls.
    pub quiet_interval: Duration,
    pub mode: TravelMode,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            quiet_interval: Duration::from_millis(400),
            mode: TravelMode::Drive,
        }
    }
}

/// Resolves the best route between two coordinates plus retained alternates.
///
/// Resolutions are debounced and tagged with a monotonic sequence number;
/// only the latest tag may apply its result (last-request-wins), so stale
/// responses from superseded requests are dropped rather than overwriting
/// newer state. Observers receive [`RouteResolution`] snapshots through a
/// watch channel.
pub struct RouteResolutionEngine {
    backend: Arc<dyn RoutingBackend>,
    map: Arc<dyn MapSurface>,
    panel: Arc<Mutex<PanelViewportController>>,
    options: EngineOptions,
    seq: Arc<AtomicU64>,
    debounce: Debouncer,
    snapshot: Arc<watch::Sender<RouteResolution>>,
}

impl RouteResolutionEngine {
    pub fn new(
        backend: Arc<dyn RoutingBackend>,
        map: Arc<dyn MapSurface>,
        panel: Arc<Mutex<PanelViewportController>>,
        options: EngineOptions,
    ) -> Self {
        let (snapshot, _) = watch::channel(RouteResolution::default());
        RouteResolutionEngine {
            backend,
            map,
            panel,
            options,
            seq: Arc::new(AtomicU64::new(0)),
            debounce: Debouncer::new(),
            snapshot: Arc::new(snapshot),
        }
    }

    /// Observable stream of resolution snapshots.
    pub fn subscribe(&self) -> watch::Receiver<RouteResolution> {
        self.snapshot.subscribe()
    }

    pub fn current(&self) -> RouteResolution {
        self.snapshot.borrow().clone()
    }

    /// Schedules a resolution for the given endpoints. A missing coordinate
    /// is a no-op; invoking again within the quiet interval replaces the
    /// pending invocation instead of queueing a second one.
    pub fn resolve(&self, origin: Option<Coordinate>, destination: Option<Coordinate>) {
        let (Some(origin), Some(destination)) = (origin, destination) else {
            tracing::debug!("route resolve skipped: endpoint not set");
            return;
        };

        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.snapshot.send_replace(RouteResolution::loading());

        let task = ResolutionTask {
            backend: self.backend.clone(),
            map: self.map.clone(),
            panel: self.panel.clone(),
            seq_counter: self.seq.clone(),
            snapshot: self.snapshot.clone(),
            mode: self.options.mode,
        };
        self.debounce.schedule(self.options.quiet_interval, async move {
            task.run(seq, origin, destination).await;
        });
    }
}

struct ResolutionTask {
    backend: Arc<dyn RoutingBackend>,
    map: Arc<dyn MapSurface>,
    panel: Arc<Mutex<PanelViewportController>>,
    seq_counter: Arc<AtomicU64>,
    snapshot: Arc<watch::Sender<RouteResolution>>,
    mode: TravelMode,
}

impl ResolutionTask {
    async fn run(self, seq: u64, origin: Coordinate, destination: Coordinate) {
        let waypoints = [origin, destination];

        let (fastest, shortest) = tokio::join!(
            self.backend
                .route(&waypoints, self.mode, Some(CANDIDATE_OBJECTIVES[0])),
            self.backend
                .route(&waypoints, self.mode, Some(CANDIDATE_OBJECTIVES[1])),
        );

        let mut candidates = Vec::new();
        for (objective, outcome) in CANDIDATE_OBJECTIVES.into_iter().zip([fastest, shortest]) {
            match outcome {
                Ok(raw) => candidates.extend(decode_candidate(objective.label(), raw)),
                // a failed objective is simply absent from the survivor set
                Err(err) => {
                    tracing::debug!(objective = objective.label(), %err, "route candidate failed")
                }
            }
        }

        // all optimized candidates gone: one unoptimized fallback request
        if candidates.is_empty() {
            match self.backend.route(&waypoints, self.mode, None).await {
                Ok(raw) => candidates.extend(decode_candidate(DEFAULT_LABEL, raw)),
                Err(err) => tracing::debug!(%err, "default route fallback failed"),
            }
        }

        if self.seq_counter.load(Ordering::SeqCst) != seq {
            tracing::debug!(seq, "dropping superseded route resolution");
            return;
        }

        if candidates.is_empty() {
            tracing::warn!(?origin, ?destination, "no route between endpoints");
            self.snapshot.send_replace(RouteResolution {
                error: Some(NO_ROUTE.to_string()),
                ..Default::default()
            });
            return;
        }

        let (best, alternates) = select_best(candidates);
        self.map.routes_changed(&best, &alternates);
        if let Ok(panel) = self.panel.lock() {
            panel.fit_view_to_route(&best.path);
        }
        self.snapshot.send_replace(RouteResolution {
            best: Some(best),
            alternates,
            is_loading: false,
            error: None,
        });
    }
}

/// Decodes a raw backend route into a candidate: flattens multi-segment
/// geometry into one ordered path (latitude/longitude order restored) and
/// converts the totals to km / minutes. Paths with fewer than two points are
/// discarded.
fn decode_candidate(label: &str, raw: RawRoute) -> Option<RouteCandidate> {
    let path: Vec<Coordinate> = match raw.geometry {
        RouteGeometry::LineString(positions) => positions.iter().map(to_coordinate).collect(),
        RouteGeometry::MultiLineString(segments) => {
            segments.iter().flatten().map(to_coordinate).collect()
        }
    };
    if path.len() < 2 {
        tracing::debug!(label, points = path.len(), "discarding degenerate route path");
        return None;
    }
    Some(RouteCandidate {
        label: label.to_string(),
        path,
        distance_km: raw.distance_m / 1_000.0,
        duration_min: raw.duration_s / 60.0,
    })
}

fn to_coordinate(position: &[f64; 2]) -> Coordinate {
    Coordinate {
        lat: position[1],
        lon: position[0],
    }
}

/// Picks the candidate with the lowest duration (ties broken by lowest
/// distance); the rest become alternates, deduplicated by path identity.
fn select_best(candidates: Vec<RouteCandidate>) -> (RouteCandidate, Vec<RouteCandidate>) {
    let mut unique: Vec<RouteCandidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !unique.iter().any(|kept| kept.path == candidate.path) {
            unique.push(candidate);
        }
    }

    let best_index = unique
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| compare_candidates(a, b))
        .map(|(index, _)| index)
        .unwrap_or(0);
    let best = unique.remove(best_index);
    (best, unique)
}

fn compare_candidates(a: &RouteCandidate, b: &RouteCandidate) -> CmpOrdering {
    a.duration_min
        .partial_cmp(&b.duration_min)
        .unwrap_or(CmpOrdering::Equal)
        .then_with(|| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(CmpOrdering::Equal)
        })
}
