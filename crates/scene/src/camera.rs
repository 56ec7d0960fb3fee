use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use skyisle_input::MoveDirection;

/// Pitch never reaches straight up or down, where the look-at basis flips.
pub const PITCH_LIMIT: f32 = 89.0;

/// Tunable camera parameters. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub speed: f32,
    pub sensitivity: f32,
    pub zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            speed: 2.5,
            sensitivity: 0.1,
            zoom: 45.0,
            min_zoom: 1.0,
            max_zoom: 45.0,
        }
    }
}

/// Free-flying camera. Yaw, pitch and zoom are in degrees.
///
/// `front`, `right` and `up` are derived from yaw/pitch by
/// `update_vectors` after every orientation change and are kept
/// private so they cannot drift from the angles.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    world_up: Vec3,
    front: Vec3,
    right: Vec3,
    up: Vec3,
    yaw: f32,
    pitch: f32,
    zoom: f32,
    min_zoom: f32,
    max_zoom: f32,
    pub speed: f32,
    pub sensitivity: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0), CameraSettings::default())
    }
}

impl Camera {
    /// Camera at `position` looking down -Z.
    pub fn new(position: Vec3, settings: CameraSettings) -> Self {
        let min_zoom = settings.min_zoom.min(settings.max_zoom);
        let max_zoom = settings.max_zoom.max(settings.min_zoom);
        let mut camera = Self {
            position,
            world_up: Vec3::Y,
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            yaw: -90.0,
            pitch: 0.0,
            zoom: settings.zoom.clamp(min_zoom, max_zoom),
            min_zoom,
            max_zoom,
            speed: settings.speed,
            sensitivity: settings.sensitivity,
        };
        camera.update_vectors();
        camera
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Vertical field of view in degrees.
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Move along the current basis by `speed * elapsed`.
    pub fn process_keyboard(&mut self, direction: MoveDirection, elapsed: f32) {
        let velocity = self.speed * elapsed;
        match direction {
            MoveDirection::Forward => self.position += self.front * velocity,
            MoveDirection::Backward => self.position -= self.front * velocity,
            MoveDirection::Left => self.position -= self.right * velocity,
            MoveDirection::Right => self.position += self.right * velocity,
        }
    }

    /// Apply a look delta. `dy` is positive upward.
    pub fn process_mouse_movement(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch + dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    /// Narrow (positive `dy`) or widen the field of view.
    pub fn process_scroll(&mut self, dy: f32) {
        self.zoom = (self.zoom - dy).clamp(self.min_zoom, self.max_zoom);
    }

    /// Point the camera along `front`, deriving yaw and pitch from it.
    /// Degenerate vectors are ignored.
    pub fn set_front(&mut self, front: Vec3) {
        let Some(dir) = front.try_normalize() else {
            tracing::warn!("ignoring degenerate camera front {front}");
            return;
        };
        self.yaw = dir.z.atan2(dir.x).to_degrees();
        self.pitch = dir
            .y
            .clamp(-1.0, 1.0)
            .asin()
            .to_degrees()
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn assert_orthonormal(cam: &Camera) {
        for v in [cam.front(), cam.right(), cam.up()] {
            assert!((v.length() - 1.0).abs() < EPS, "not unit: {v}");
        }
        assert!(cam.front().dot(cam.right()).abs() < EPS);
        assert!(cam.front().dot(cam.up()).abs() < EPS);
        assert!(cam.right().dot(cam.up()).abs() < EPS);
    }

    #[test]
    fn default_camera_faces_negative_z() {
        let cam = Camera::default();
        assert_eq!(cam.position, Vec3::new(0.0, 0.0, 3.0));
        assert!(cam.front().abs_diff_eq(Vec3::NEG_Z, EPS));
        assert_eq!(cam.zoom(), 45.0);
        assert_orthonormal(&cam);
    }

    #[test]
    fn movement_follows_basis() {
        let mut cam = Camera::default();
        cam.process_mouse_movement(123.0, -45.0);
        let (front, right) = (cam.front(), cam.right());
        let start = cam.position;

        cam.process_keyboard(MoveDirection::Forward, 2.0);
        assert!(cam.position.abs_diff_eq(start + front * cam.speed * 2.0, EPS));

        cam.process_keyboard(MoveDirection::Backward, 2.0);
        assert!(cam.position.abs_diff_eq(start, EPS));

        cam.process_keyboard(MoveDirection::Right, 0.5);
        assert!(cam.position.abs_diff_eq(start + right * cam.speed * 0.5, EPS));

        cam.process_keyboard(MoveDirection::Left, 0.5);
        assert!(cam.position.abs_diff_eq(start, EPS));
    }

    #[test]
    fn zero_elapsed_does_not_move() {
        let mut cam = Camera::default();
        let start = cam.position;
        for dir in MoveDirection::ALL {
            cam.process_keyboard(dir, 0.0);
        }
        assert_eq!(cam.position, start);
    }

    #[test]
    fn pitch_stays_within_limit() {
        let mut cam = Camera::default();
        for dy in [5000.0, -12000.0, 30.0, 1e6, -1e6] {
            cam.process_mouse_movement(0.0, dy);
            assert!(cam.pitch().abs() <= PITCH_LIMIT);
            assert_orthonormal(&cam);
        }
    }

    #[test]
    fn overshooting_pitch_lands_on_the_limit() {
        let mut cam = Camera::default();
        cam.process_mouse_movement(0.0, 1e6);
        assert_eq!(cam.pitch(), PITCH_LIMIT);
        cam.process_mouse_movement(0.0, -1e6);
        assert_eq!(cam.pitch(), -PITCH_LIMIT);
        assert!(cam.front().y.abs() < 1.0);
    }

    #[test]
    fn yaw_is_unbounded() {
        let mut cam = Camera::default();
        cam.process_mouse_movement(10_000.0, 0.0);
        assert!((cam.yaw() - (-90.0 + 1000.0)).abs() < 1e-3);
        assert_orthonormal(&cam);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut cam = Camera::default();
        cam.process_scroll(-1000.0);
        assert_eq!(cam.zoom(), 45.0);
        cam.process_scroll(1000.0);
        assert_eq!(cam.zoom(), 1.0);
        cam.process_scroll(-1.0);
        assert_eq!(cam.zoom(), 2.0);
    }

    #[test]
    fn zoom_never_goes_below_minimum() {
        let mut cam = Camera::default();
        // Zoom driven 1000 degrees down, then one more step down.
        cam.process_scroll(1000.0);
        cam.process_scroll(1.0);
        assert_eq!(cam.zoom(), 1.0);
    }

    #[test]
    fn set_front_derives_angles() {
        let mut cam = Camera::default();
        let target = Vec3::new(1.0, 0.5, 1.0).normalize();
        cam.set_front(target);
        assert!(cam.front().abs_diff_eq(target, 1e-4));
        assert_orthonormal(&cam);
        // A later look delta continues from the restored orientation.
        cam.process_mouse_movement(0.0, 0.0);
        assert!(cam.front().abs_diff_eq(target, 1e-4));
    }

    #[test]
    fn set_front_ignores_zero_vector() {
        let mut cam = Camera::default();
        cam.set_front(Vec3::ZERO);
        assert!(cam.front().abs_diff_eq(Vec3::NEG_Z, EPS));
    }

    #[test]
    fn view_matrix_moves_eye_to_origin() {
        let mut cam = Camera::default();
        cam.position = Vec3::new(4.0, -2.0, 7.0);
        let eye = cam.view_matrix().transform_point3(cam.position);
        assert!(eye.abs_diff_eq(Vec3::ZERO, 1e-4));
        let ahead = cam.view_matrix().transform_point3(cam.position + cam.front());
        assert!(ahead.abs_diff_eq(Vec3::NEG_Z, 1e-4));
    }
}
