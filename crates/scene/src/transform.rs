use glam::{Mat4, Vec3};

/// Rotation in degrees about an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    pub angle_degrees: f32,
    pub axis: Vec3,
}

impl Rotation {
    pub fn new(angle_degrees: f32, axis: Vec3) -> Self {
        Self {
            angle_degrees,
            axis,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.angle_degrees == 0.0
    }
}

/// Where and how large one drawable instance is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub scale: Vec3,
    pub rotation: Option<Rotation>,
}

impl Placement {
    /// Uniformly scaled, unrotated placement.
    pub fn new(position: Vec3, scale: f32) -> Self {
        Self {
            position,
            scale: Vec3::splat(scale),
            rotation: None,
        }
    }

    pub fn with_rotation(mut self, angle_degrees: f32, axis: Vec3) -> Self {
        self.rotation = Some(Rotation::new(angle_degrees, axis));
        self
    }

    /// Model matrix `T(position) * R(angle, axis) * S(scale)`.
    ///
    /// Applied to a vertex this scales first, then rotates, then translates.
    pub fn model_matrix(&self) -> Mat4 {
        let mut model = Mat4::IDENTITY;
        model *= Mat4::from_translation(self.position);
        if let Some(rotation) = self.rotation.filter(|r| !r.is_identity()) {
            model *= Mat4::from_axis_angle(
                rotation.axis.normalize(),
                rotation.angle_degrees.to_radians(),
            );
        }
        model *= Mat4::from_scale(self.scale);
        model
    }
}
