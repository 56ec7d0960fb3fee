//! Hand-authored and generated object placements for the scene.

use crate::transform::Placement;
use glam::Vec3;
use rand::Rng;

/// Number of meteor instances generated at startup.
pub const METEOR_COUNT: usize = 300;

/// Each meteor axis offset has magnitude in `[1, 1 + METEOR_SPREAD]`.
pub const METEOR_SPREAD: f32 = 20.0;

pub const METEOR_SCALE: f32 = 0.4;

/// Per-instance meteor rotation step about +X, in degrees.
pub const METEOR_ROTATION_STEP: f32 = 30.0;

/// Island positions and uniform scales.
pub const ISLANDS: [(Vec3, f32); 5] = [
    (Vec3::new(25.0, 15.0, -7.0), 0.6),
    (Vec3::new(20.0, 5.0, 0.0), 0.45),
    (Vec3::new(-15.0, 5.0, 25.0), 0.5),
    (Vec3::new(-30.0, 10.0, -10.0), 1.0),
    (Vec3::new(7.0, -5.0, 20.0), 0.75),
];

/// Logical objects drawn by the lit-model pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SceneObject {
    Tree,
    Meteor,
    Island,
    Plant,
    Alien,
    Platform,
    Ufo,
    Spaceship,
}

impl SceneObject {
    /// Order in which the lit-model pass draws objects.
    pub const DRAW_ORDER: [SceneObject; 8] = [
        SceneObject::Tree,
        SceneObject::Meteor,
        SceneObject::Island,
        SceneObject::Plant,
        SceneObject::Alien,
        SceneObject::Platform,
        SceneObject::Ufo,
        SceneObject::Spaceship,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SceneObject::Tree => "tree",
            SceneObject::Meteor => "meteor",
            SceneObject::Island => "island",
            SceneObject::Plant => "plant",
            SceneObject::Alien => "alien",
            SceneObject::Platform => "platform",
            SceneObject::Ufo => "ufo",
            SceneObject::Spaceship => "spaceship",
        }
    }
}

impl std::fmt::Display for SceneObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Sample meteor offsets: every axis is `±(1 + U[0, METEOR_SPREAD])` with
/// an independent, uniformly chosen sign.
pub fn generate_meteor_offsets<R: Rng + ?Sized>(rng: &mut R) -> Vec<Vec3> {
    (0..METEOR_COUNT)
        .map(|_| {
            let x = signed_offset(rng);
            let y = signed_offset(rng);
            let z = signed_offset(rng);
            Vec3::new(x, y, z)
        })
        .collect()
}

fn signed_offset<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    let magnitude = 1.0 + rng.random_range(0.0..=METEOR_SPREAD);
    if rng.random_bool(0.5) {
        magnitude
    } else {
        -magnitude
    }
}

/// Placements for every logical object in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneLayout {
    pub tree: Placement,
    pub meteors: Vec<Placement>,
    pub islands: Vec<Placement>,
    pub plant: Placement,
    pub alien: Placement,
    pub platform: Placement,
    pub ufo: Placement,
    pub spaceship: Placement,
    /// The textured glass box drawn by the opaque pass.
    pub glass_box: Placement,
}

impl SceneLayout {
    /// Layout with meteor offsets drawn from `rng`.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::with_meteor_offsets(generate_meteor_offsets(rng))
    }

    pub fn with_meteor_offsets(offsets: Vec<Vec3>) -> Self {
        let meteors = offsets
            .into_iter()
            .enumerate()
            .map(|(i, offset)| {
                Placement::new(offset, METEOR_SCALE)
                    .with_rotation(METEOR_ROTATION_STEP * i as f32, Vec3::X)
            })
            .collect();
        let islands = ISLANDS
            .iter()
            .map(|&(position, scale)| Placement::new(position, scale))
            .collect();

        Self {
            tree: Placement::new(Vec3::new(25.0, 0.0, 10.0), 0.7),
            meteors,
            islands,
            plant: Placement::new(Vec3::new(-20.0, -7.0, 0.0), 0.5),
            alien: Placement::new(Vec3::new(5.0, 7.0, 5.0), 3.0),
            platform: Placement::new(Vec3::ZERO, 0.2),
            ufo: Placement::new(Vec3::new(0.0, 15.0, 0.0), 0.135),
            spaceship: Placement::new(Vec3::new(-30.0, 10.0, 30.0), 1.0)
                .with_rotation(220.0, Vec3::Y),
            glass_box: Placement::new(Vec3::new(-20.0, -10.0, 0.0), 7.0),
        }
    }

    /// All placements drawn for `object`.
    pub fn placements(&self, object: SceneObject) -> &[Placement] {
        match object {
            SceneObject::Tree => std::slice::from_ref(&self.tree),
            SceneObject::Meteor => &self.meteors,
            SceneObject::Island => &self.islands,
            SceneObject::Plant => std::slice::from_ref(&self.plant),
            SceneObject::Alien => std::slice::from_ref(&self.alien),
            SceneObject::Platform => std::slice::from_ref(&self.platform),
            SceneObject::Ufo => std::slice::from_ref(&self.ufo),
            SceneObject::Spaceship => std::slice::from_ref(&self.spaceship),
        }
    }

    /// Total number of lit-model draws per frame.
    pub fn instance_count(&self) -> usize {
        SceneObject::DRAW_ORDER
            .iter()
            .map(|&o| self.placements(o).len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn generates_exactly_300_meteors() {
        let mut rng = StdRng::seed_from_u64(7);
        let layout = SceneLayout::generate(&mut rng);
        assert_eq!(layout.meteors.len(), METEOR_COUNT);
        assert_eq!(layout.placements(SceneObject::Meteor).len(), 300);
    }

    #[test]
    fn meteor_offsets_stay_in_shell() {
        let mut rng = StdRng::seed_from_u64(99);
        for offset in generate_meteor_offsets(&mut rng) {
            for v in offset.to_array() {
                let m = v.abs();
                assert!((1.0..=21.0).contains(&m), "axis magnitude {m}");
            }
        }
    }

    #[test]
    fn meteor_signs_vary() {
        let mut rng = StdRng::seed_from_u64(3);
        let offsets = generate_meteor_offsets(&mut rng);
        assert!(offsets.iter().any(|o| o.x < 0.0));
        assert!(offsets.iter().any(|o| o.x > 0.0));
    }

    #[test]
    fn meteor_rotation_is_deterministic_per_index() {
        let layout = SceneLayout::with_meteor_offsets(vec![Vec3::ONE; METEOR_COUNT]);
        for (i, meteor) in layout.meteors.iter().enumerate() {
            let rotation = meteor.rotation.unwrap();
            assert_eq!(rotation.angle_degrees, 30.0 * i as f32);
            assert_eq!(rotation.axis, Vec3::X);
            assert_eq!(meteor.scale, Vec3::splat(0.4));
        }
    }

    #[test]
    fn islands_match_authored_table() {
        let layout = SceneLayout::with_meteor_offsets(Vec::new());
        assert_eq!(layout.islands.len(), 5);
        let expected = [
            (Vec3::new(25.0, 15.0, -7.0), 0.6),
            (Vec3::new(20.0, 5.0, 0.0), 0.45),
            (Vec3::new(-15.0, 5.0, 25.0), 0.5),
            (Vec3::new(-30.0, 10.0, -10.0), 1.0),
            (Vec3::new(7.0, -5.0, 20.0), 0.75),
        ];
        for (island, (position, scale)) in layout.islands.iter().zip(expected) {
            assert_eq!(island.position, position);
            assert_eq!(island.scale, Vec3::splat(scale));
            assert!(island.rotation.is_none());
        }
    }

    #[test]
    fn instance_count_covers_every_object() {
        let mut rng = StdRng::seed_from_u64(1);
        let layout = SceneLayout::generate(&mut rng);
        // 300 meteors + 5 islands + 6 single objects.
        assert_eq!(layout.instance_count(), 311);
    }

    #[test]
    fn spaceship_is_turned_about_y() {
        let layout = SceneLayout::with_meteor_offsets(Vec::new());
        let rotation = layout.spaceship.rotation.unwrap();
        assert_eq!(rotation.angle_degrees, 220.0);
        assert_eq!(rotation.axis, Vec3::Y);
    }
}
