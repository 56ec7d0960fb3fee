//! Rendering adapter: renderer-agnostic frame planning.
//!
//! A frame is described by a [`FramePlan`] built from the viewer state and
//! the loaded [`SceneResources`]; backends execute the plan. Textures and
//! models are referenced by handles issued by a [`ResourceLoader`].
//!
//! # Invariants
//! - Passes run in a fixed order: clear, box, skybox, lit models.
//! - Every pass carries its full [`PassState`]; none inherits another's.
//! - Renderers never mutate viewer state.

mod frame;
mod geometry;
mod pass;
mod plan;
mod renderer;
mod resources;

pub use frame::{FrameClock, Viewport, Z_FAR, Z_NEAR, projection, skybox_view};
pub use geometry::{BOX_VERTICES, SKYBOX_VERTICES};
pub use pass::{CullMode, DepthCompare, FrontFace, PassState};
pub use plan::{BoxPass, FramePlan, LitPass, ModelDraw, SHININESS, SkyboxPass, plan_frame};
pub use renderer::{DebugTextRenderer, Renderer};
pub use resources::{
    BOX_TEXTURE, HeadlessLoader, MODEL_ASSETS, ModelAsset, ModelHandle, ResourceLoader,
    SKYBOX_DIR, SKYBOX_EXTENSION, SceneResources, TextureHandle,
};

pub fn crate_info() -> &'static str {
    concat!("skyisle-render v", env!("CARGO_PKG_VERSION"))
}
