use glam::Vec3;

/// Point light with inverse-quadratic falloff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(4.0, 4.0, 0.0),
            ambient: Vec3::splat(7.0),
            diffuse: Vec3::splat(0.6),
            specular: Vec3::ONE,
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

impl PointLight {
    /// Light intensity factor at `distance` from the light.
    pub fn attenuation(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }
}

/// Circular orbit in the XZ plane at a fixed height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightOrbit {
    pub radius: f32,
    pub height: f32,
}

impl Default for LightOrbit {
    fn default() -> Self {
        Self {
            radius: 30.0,
            height: 5.0,
        }
    }
}

impl LightOrbit {
    /// Position at `seconds` of wall-clock time, one radian per second.
    pub fn position_at(&self, seconds: f32) -> Vec3 {
        Vec3::new(
            self.radius * seconds.cos(),
            self.height,
            self.radius * seconds.sin(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attenuation_is_one_at_source() {
        let light = PointLight::default();
        assert!((light.attenuation(0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn attenuation_decreases_with_distance() {
        let light = PointLight::default();
        let near = light.attenuation(1.0);
        let far = light.attenuation(30.0);
        assert!(near > far);
        let expected = 1.0 / (1.0 + 0.09 * 30.0 + 0.032 * 900.0);
        assert!((far - expected).abs() < 1e-6);
    }

    #[test]
    fn orbit_keeps_radius_and_height() {
        let orbit = LightOrbit::default();
        for t in [0.0, 0.7, 2.5, 100.0] {
            let p = orbit.position_at(t);
            assert_eq!(p.y, 5.0);
            let r = (p.x * p.x + p.z * p.z).sqrt();
            assert!((r - 30.0).abs() < 1e-3);
        }
        assert!(orbit.position_at(0.0).abs_diff_eq(Vec3::new(30.0, 5.0, 0.0), 1e-5));
    }
}
