use std::sync::Arc;

use crate::models::{CameraFit, Coordinate, EdgeInsets, GeoBounds, RouteCandidate};

/// Interface to the map/rendering surface. Implementations receive the panel
/// height on every change, route polylines to draw, and camera-fit commands.
/// All calls are fire-and-forget; a newer command replaces an in-flight one.
pub trait MapSurface: Send + Sync {
    fn panel_height_changed(&self, height: f64);
    fn routes_changed(&self, best: &RouteCandidate, alternates: &[RouteCandidate]);
    fn apply_camera_fit(&self, fit: CameraFit);
}

/// Maximum panel height before the first layout measurement arrives.
pub const FALLBACK_MAX_HEIGHT: f64 = 420.0;

/// The panel never covers more than this fraction of the screen.
const MAX_SCREEN_FRACTION: f64 = 0.9;

/// Fixed duration of camera-fit animations.
const CAMERA_FIT_DURATION_MS: u64 = 450;

#[derive(Debug, Clone, Copy)]
pub struct PanelConfig {
    /// Collapsed "peek" height of the panel.
    pub min_height: f64,
    /// Minimum map region (px) that must stay visible above the panel.
    pub min_visible_map_px: f64,
    pub screen_height: f64,
    /// Margin added around the route when fitting the camera.
    pub camera_margin: f64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        PanelConfig {
            min_height: 120.0,
            min_visible_map_px: 180.0,
            screen_height: 800.0,
            camera_margin: 24.0,
        }
    }
}

/// Observable snapshot of the panel geometry.
///
/// Invariants: `min_height <= max_height <= screen_height * 0.9` and
/// `-(max_height - min_height) <= translation <= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelState {
    pub min_height: f64,
    pub max_height: f64,
    pub translation: f64,
    pub dragging: bool,
}

/// Gesture-driven resizable panel anchored to the bottom of a map surface.
///
/// Drag updates are pure arithmetic applied synchronously on every event;
/// layout measurements re-clamp the panel into new bounds without moving it.
/// All inputs are clamped, never rejected.
pub struct PanelViewportController {
    config: PanelConfig,
    state: PanelState,
    drag_origin: f64,
    map: Arc<dyn MapSurface>,
}

impl PanelViewportController {
    pub fn new(config: PanelConfig, map: Arc<dyn MapSurface>) -> Self {
        let max_height = clamp_max_height(FALLBACK_MAX_HEIGHT, &config);
        PanelViewportController {
            state: PanelState {
                min_height: config.min_height,
                max_height,
                translation: 0.0,
                dragging: false,
            },
            drag_origin: 0.0,
            config,
            map,
        }
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    /// Visible panel height at this instant.
    pub fn height(&self) -> f64 {
        self.state.max_height + self.state.translation
    }

    /// Recomputes the maximum height from the measured container, keeping a
    /// minimum visible map region. The panel does not move, but its
    /// translation is re-clamped into the new bounds.
    pub fn on_layout_measured(&mut self, container_height: f64) {
        let max_height = clamp_max_height(
            container_height - self.config.min_visible_map_px,
            &self.config,
        );
        self.state.max_height = max_height;
        self.state.translation = self.clamp_translation(self.state.translation);
        self.map.panel_height_changed(self.height());
    }

    pub fn on_drag_start(&mut self) {
        self.drag_origin = self.state.translation;
        self.state.dragging = true;
    }

    pub fn on_drag_update(&mut self, delta_y: f64) {
        self.state.translation = self.clamp_translation(self.drag_origin + delta_y);
        self.map.panel_height_changed(self.height());
    }

    /// No snapping: the panel stays where it was released.
    pub fn on_drag_end(&mut self) {
        self.state.dragging = false;
    }

    /// Asks the map surface to frame the full path, with a bottom inset large
    /// enough that the polyline is never hidden behind the panel. Returns the
    /// issued command, or `None` for an empty path.
    pub fn fit_view_to_route(&self, path: &[Coordinate]) -> Option<CameraFit> {
        let bounds = GeoBounds::from_path(path)?;
        let margin = self.config.camera_margin;
        let fit = CameraFit {
            bounds,
            insets: EdgeInsets {
                top: margin,
                left: margin,
                right: margin,
                bottom: self.height() + margin,
            },
            duration_ms: CAMERA_FIT_DURATION_MS,
        };
        self.map.apply_camera_fit(fit);
        Some(fit)
    }

    fn clamp_translation(&self, translation: f64) -> f64 {
        let travel = self.state.max_height - self.state.min_height;
        translation.clamp(-travel, 0.0)
    }
}

fn clamp_max_height(candidate: f64, config: &PanelConfig) -> f64 {
    let ceiling = config.screen_height * MAX_SCREEN_FRACTION;
    // floored so there is always a strictly positive drag travel
    candidate.min(ceiling).max(config.min_height + 1.0)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingSurface {
        heights: Mutex<Vec<f64>>,
        fits: Mutex<Vec<CameraFit>>,
    }

    impl MapSurface for RecordingSurface {
        fn panel_height_changed(&self, height: f64) {
            self.heights.lock().unwrap().push(height);
        }

        fn routes_changed(&self, _best: &RouteCandidate, _alternates: &[RouteCandidate]) {}

        fn apply_camera_fit(&self, fit: CameraFit) {
            self.fits.lock().unwrap().push(fit);
        }
    }

    fn controller() -> (PanelViewportController, Arc<RecordingSurface>) {
        let surface = Arc::new(RecordingSurface::default());
        let config = PanelConfig {
            min_height: 120.0,
            min_visible_map_px: 180.0,
            screen_height: 1000.0,
            camera_margin: 24.0,
        };
        (
            PanelViewportController::new(config, surface.clone()),
            surface,
        )
    }

    #[test]
    fn layout_measurement_computes_max_height() {
        let (mut panel, _) = controller();
        panel.on_layout_measured(800.0);
        // clamp(800 - 180, 120, 900) = 620
        assert_eq!(panel.state().max_height, 620.0);
    }

    #[test]
    fn uses_fallback_max_before_first_measurement() {
        let (panel, _) = controller();
        assert_eq!(panel.state().max_height, FALLBACK_MAX_HEIGHT);
    }

    #[test]
    fn max_height_is_capped_at_ninety_percent_of_screen() {
        let (mut panel, _) = controller();
        panel.on_layout_measured(2000.0);
        assert_eq!(panel.state().max_height, 900.0);
    }

    #[test]
    fn degenerate_layout_keeps_positive_drag_travel() {
        let (mut panel, _) = controller();
        panel.on_layout_measured(50.0);
        assert!(panel.state().max_height >= panel.state().min_height + 1.0);
    }

    #[test]
    fn drag_is_clamped_to_travel_range() {
        let (mut panel, _) = controller();
        panel.on_layout_measured(800.0);
        panel.on_drag_start();
        panel.on_drag_update(-10_000.0);
        assert_eq!(panel.state().translation, -500.0); // -(620 - 120)
        assert_eq!(panel.height(), 120.0);
        panel.on_drag_update(10_000.0);
        assert_eq!(panel.state().translation, 0.0);
        assert_eq!(panel.height(), 620.0);
    }

    #[test]
    fn drag_offsets_from_position_at_drag_start() {
        let (mut panel, _) = controller();
        panel.on_layout_measured(800.0);
        panel.on_drag_start();
        panel.on_drag_update(-100.0);
        panel.on_drag_end();
        // no snapping: the panel stays at the released position
        assert_eq!(panel.state().translation, -100.0);
        assert!(!panel.state().dragging);

        panel.on_drag_start();
        panel.on_drag_update(-50.0);
        assert_eq!(panel.state().translation, -150.0);
    }

    #[test]
    fn remeasure_does_not_move_panel_but_reclamps() {
        let (mut panel, _) = controller();
        panel.on_layout_measured(800.0);
        panel.on_drag_start();
        panel.on_drag_update(-400.0);
        panel.on_drag_end();

        // larger container: translation untouched
        panel.on_layout_measured(900.0);
        assert_eq!(panel.state().translation, -400.0);

        // shrunken container: translation pulled back into the new range
        panel.on_layout_measured(400.0);
        let travel = panel.state().max_height - panel.state().min_height;
        assert_eq!(panel.state().translation, -travel);
    }

    #[test]
    fn drag_updates_push_height_to_map_surface() {
        let (mut panel, surface) = controller();
        panel.on_layout_measured(800.0);
        panel.on_drag_start();
        panel.on_drag_update(-100.0);
        let heights = surface.heights.lock().unwrap();
        assert_eq!(*heights.last().unwrap(), 520.0);
    }

    #[test]
    fn camera_fit_keeps_route_above_panel() {
        let (mut panel, surface) = controller();
        panel.on_layout_measured(800.0);
        let path = vec![
            Coordinate { lat: 45.0, lon: 5.0 },
            Coordinate { lat: 45.1, lon: 5.2 },
        ];
        let fit = panel.fit_view_to_route(&path).expect("fit");
        assert_eq!(fit.insets.bottom, panel.height() + 24.0);
        assert_eq!(fit.insets.top, 24.0);
        assert_eq!(fit.bounds, GeoBounds::from_path(&path).unwrap());
        assert_eq!(surface.fits.lock().unwrap().len(), 1);
    }

    #[test]
    fn camera_fit_ignores_empty_path() {
        let (panel, surface) = controller();
        assert!(panel.fit_view_to_route(&[]).is_none());
        assert!(surface.fits.lock().unwrap().is_empty());
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn prop_translation_stays_in_bounds(
                container in 100.0f64..2000.0,
                deltas in prop::collection::vec(-1500.0f64..1500.0, 1..40)
            ) {
                let (mut panel, _) = controller();
                panel.on_layout_measured(container);
                panel.on_drag_start();
                for delta in deltas {
                    panel.on_drag_update(delta);
                    let state = panel.state();
                    let travel = state.max_height - state.min_height;
                    prop_assert!(state.translation <= 0.0);
                    prop_assert!(state.translation >= -travel);
                }
            }

            #[test]
            fn prop_height_stays_between_min_and_max(
                container in 100.0f64..2000.0,
                deltas in prop::collection::vec(-1500.0f64..1500.0, 1..40)
            ) {
                let (mut panel, _) = controller();
                panel.on_layout_measured(container);
                for delta in deltas {
                    panel.on_drag_start();
                    panel.on_drag_update(delta);
                    panel.on_drag_end();
                    let state = panel.state();
                    prop_assert!(panel.height() >= state.min_height - 1e-9);
                    prop_assert!(panel.height() <= state.max_height + 1e-9);
                }
            }
        }
    }
}
