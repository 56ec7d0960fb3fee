use glam::{Mat3, Mat4};

/// Near clip plane distance.
pub const Z_NEAR: f32 = 0.1;
/// Far clip plane distance.
pub const Z_FAR: f32 = 100.0;

/// Per-frame timing. `tick` returns the seconds since the previous tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameClock {
    last: f32,
}

impl FrameClock {
    /// Clock whose first tick measures from `start` seconds.
    pub fn starting_at(start: f32) -> Self {
        Self { last: start }
    }

    pub fn tick(&mut self, now: f32) -> f32 {
        let elapsed = now - self.last;
        self.last = now;
        elapsed
    }

    pub fn last(&self) -> f32 {
        self.last
    }
}

/// Framebuffer size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height. A zero-height viewport (minimized window) reports 1.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Perspective projection for a vertical field of view of `zoom_degrees`.
pub fn projection(zoom_degrees: f32, viewport: Viewport) -> Mat4 {
    Mat4::perspective_rh(zoom_degrees.to_radians(), viewport.aspect(), Z_NEAR, Z_FAR)
}

/// `view` with its translation removed, so the sky stays centered on the eye.
pub fn skybox_view(view: Mat4) -> Mat4 {
    Mat4::from_mat3(Mat3::from_mat4(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn tick_returns_elapsed_and_advances() {
        let mut clock = FrameClock::starting_at(1.0);
        assert!((clock.tick(1.25) - 0.25).abs() < 1e-6);
        assert!((clock.tick(2.0) - 0.75).abs() < 1e-6);
        assert_eq!(clock.last(), 2.0);
    }

    #[test]
    fn projection_matches_default_zoom_and_window() {
        let p = projection(45.0, Viewport::new(1600, 900));
        let expected = 1.0 / (22.5f32.to_radians().tan()) / (1600.0 / 900.0);
        assert!((p.col(0).x - expected).abs() < 1e-5);
        assert!((p.col(1).y - 1.0 / 22.5f32.to_radians().tan()).abs() < 1e-5);
    }

    #[test]
    fn zero_height_viewport_has_unit_aspect() {
        let v = Viewport::new(800, 0);
        assert!(v.is_empty());
        assert_eq!(v.aspect(), 1.0);
    }

    #[test]
    fn skybox_view_drops_translation() {
        let view = Mat4::look_at_rh(Vec3::new(5.0, -3.0, 12.0), Vec3::ZERO, Vec3::Y);
        let sky = skybox_view(view);
        assert_eq!(sky.w_axis, glam::Vec4::W);
        assert!(sky.x_axis.truncate().abs_diff_eq(view.x_axis.truncate(), 1e-6));
        assert!(sky.transform_point3(Vec3::ZERO).abs_diff_eq(Vec3::ZERO, 1e-6));
    }
}
