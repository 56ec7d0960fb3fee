use crate::camera::{Camera, CameraSettings};
use crate::layout::SceneLayout;
use crate::light::{LightOrbit, PointLight};
use glam::Vec3;
use skyisle_input::{Action, MoveDirection};
use skyisle_persist::PersistedState;

/// Something the window layer must do in response to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRequest {
    /// Grab and hide the cursor (`true`) or release it (`false`).
    CaptureCursor(bool),
    Exit,
}

/// The single owned state of the viewer.
///
/// Created at startup, passed by reference to input handling and frame
/// planning, and reduced to a [`PersistedState`] at shutdown.
#[derive(Debug, Clone)]
pub struct ViewerState {
    pub clear_color: Vec3,
    pub overlay_enabled: bool,
    /// Whether look actions rotate the camera.
    pub camera_mouse_enabled: bool,
    pub camera: Camera,
    pub light: PointLight,
    pub light_orbit: LightOrbit,
    pub layout: SceneLayout,
}

impl ViewerState {
    pub fn new(settings: CameraSettings, layout: SceneLayout) -> Self {
        Self::from_persisted(&PersistedState::default(), settings, layout)
    }

    /// Build state from a loaded (or default) persisted record.
    pub fn from_persisted(
        persisted: &PersistedState,
        settings: CameraSettings,
        layout: SceneLayout,
    ) -> Self {
        let mut camera = Camera::new(persisted.camera_position, settings);
        camera.set_front(persisted.camera_front);
        Self {
            clear_color: persisted.clear_color,
            overlay_enabled: persisted.overlay_enabled,
            camera_mouse_enabled: !persisted.overlay_enabled,
            camera,
            light: PointLight::default(),
            light_orbit: LightOrbit::default(),
            layout,
        }
    }

    /// The fields written to disk at shutdown.
    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            clear_color: self.clear_color,
            overlay_enabled: self.overlay_enabled,
            camera_position: self.camera.position,
            camera_front: self.camera.front(),
        }
    }

    pub fn cursor_captured(&self) -> bool {
        !self.overlay_enabled
    }

    pub fn apply(&mut self, action: Action) -> Option<WindowRequest> {
        match action {
            Action::Look { dx, dy } => {
                if self.camera_mouse_enabled {
                    self.camera.process_mouse_movement(dx, dy);
                }
                None
            }
            Action::Zoom(dy) => {
                self.camera.process_scroll(dy);
                None
            }
            Action::ToggleOverlay => {
                self.overlay_enabled = !self.overlay_enabled;
                self.camera_mouse_enabled = !self.overlay_enabled;
                tracing::debug!(overlay = self.overlay_enabled, "overlay toggled");
                Some(WindowRequest::CaptureCursor(self.cursor_captured()))
            }
            Action::Quit => Some(WindowRequest::Exit),
        }
    }

    /// Integrate held movement keys over `elapsed` seconds.
    pub fn move_camera(&mut self, directions: impl IntoIterator<Item = MoveDirection>, elapsed: f32) {
        for direction in directions {
            self.camera.process_keyboard(direction, elapsed);
        }
    }

    /// Place the light on its orbit at `seconds` since startup.
    pub fn advance_light(&mut self, seconds: f32) {
        self.light.position = self.light_orbit.position_at(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ViewerState {
        ViewerState::new(
            CameraSettings::default(),
            SceneLayout::with_meteor_offsets(Vec::new()),
        )
    }

    #[test]
    fn persisted_round_trip_restores_camera() {
        let mut original = state();
        original.clear_color = Vec3::new(0.1, 0.2, 0.3);
        original.camera.position = Vec3::new(5.0, 6.0, 7.0);
        original.camera.process_mouse_movement(250.0, 120.0);

        let record = original.persisted();
        let restored = ViewerState::from_persisted(
            &record,
            CameraSettings::default(),
            SceneLayout::with_meteor_offsets(Vec::new()),
        );

        assert_eq!(restored.clear_color, original.clear_color);
        assert_eq!(restored.camera.position, original.camera.position);
        assert!(restored
            .camera
            .front()
            .abs_diff_eq(original.camera.front(), 1e-4));
    }

    #[test]
    fn toggle_overlay_releases_and_recaptures_cursor() {
        let mut s = state();
        assert!(s.cursor_captured());

        let req = s.apply(Action::ToggleOverlay);
        assert_eq!(req, Some(WindowRequest::CaptureCursor(false)));
        assert!(s.overlay_enabled);
        assert!(!s.camera_mouse_enabled);

        let req = s.apply(Action::ToggleOverlay);
        assert_eq!(req, Some(WindowRequest::CaptureCursor(true)));
        assert!(s.camera_mouse_enabled);
    }

    #[test]
    fn look_ignored_while_mouse_updates_disabled() {
        let mut s = state();
        s.camera_mouse_enabled = false;
        let before = s.camera.clone();
        s.apply(Action::Look { dx: 40.0, dy: 40.0 });
        assert_eq!(s.camera, before);
    }

    #[test]
    fn look_rotates_when_enabled() {
        let mut s = state();
        s.apply(Action::Look { dx: 10.0, dy: 0.0 });
        assert!((s.camera.yaw() - (-89.0)).abs() < 1e-4);
    }

    #[test]
    fn overlay_loaded_enabled_disables_mouse_look() {
        let persisted = PersistedState {
            overlay_enabled: true,
            ..PersistedState::default()
        };
        let s = ViewerState::from_persisted(
            &persisted,
            CameraSettings::default(),
            SceneLayout::with_meteor_offsets(Vec::new()),
        );
        assert!(!s.cursor_captured());
        assert!(!s.camera_mouse_enabled);
    }

    #[test]
    fn quit_requests_exit() {
        assert_eq!(state().apply(Action::Quit), Some(WindowRequest::Exit));
    }

    #[test]
    fn movement_uses_all_held_directions() {
        let mut s = state();
        let start = s.camera.position;
        s.move_camera([MoveDirection::Forward, MoveDirection::Backward], 1.0);
        assert!(s.camera.position.abs_diff_eq(start, 1e-5));
        s.move_camera([MoveDirection::Forward], 1.0);
        assert!(s
            .camera
            .position
            .abs_diff_eq(start + Vec3::NEG_Z * 2.5, 1e-5));
    }

    #[test]
    fn light_follows_orbit() {
        let mut s = state();
        s.advance_light(std::f32::consts::FRAC_PI_2);
        assert!(s.light.position.abs_diff_eq(Vec3::new(0.0, 5.0, 30.0), 1e-4));
    }
}
