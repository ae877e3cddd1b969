//! Route-planning / map-viewport interaction core.
//!
//! Four components the presentation layer drives with raw input and
//! re-renders from: a gesture-driven resizable panel synced to the map
//! viewport ([`panel`]), a multi-candidate route resolution engine
//! ([`route`]), a bias-aware geocoding resolver ([`geocode`]) and a
//! two-phase date-range selector ([`dates`]).

pub mod dates;
pub mod debounce;
pub mod error;
pub mod geocode;
pub mod http;
pub mod models;
pub mod panel;
pub mod route;

pub use models::{
    CameraFit, Coordinate, EdgeInsets, GeoBounds, GeocodeResult, PlaceKind, RouteCandidate,
    RouteResolution,
};
