//! Scene model: camera, object placements, point light and viewer state.
//!
//! Everything here is plain data and maths; nothing touches the GPU or the
//! window system.
//!
//! # Invariants
//! - Camera basis vectors are always re-derived from yaw/pitch.
//! - Model matrices compose as translate * rotate * scale.
//! - Exactly 300 meteors and 5 islands are placed.

mod camera;
mod config;
mod layout;
mod light;
mod transform;
mod viewer;

pub use camera::{Camera, CameraSettings, PITCH_LIMIT};
pub use config::{ConfigError, ViewerConfig};
pub use layout::{
    ISLANDS, METEOR_COUNT, METEOR_ROTATION_STEP, METEOR_SCALE, METEOR_SPREAD, SceneLayout,
    SceneObject, generate_meteor_offsets,
};
pub use light::{LightOrbit, PointLight};
pub use transform::{Placement, Rotation};
pub use viewer::{ViewerState, WindowRequest};

pub fn crate_info() -> &'static str {
    concat!("skyisle-scene v", env!("CARGO_PKG_VERSION"))
}
