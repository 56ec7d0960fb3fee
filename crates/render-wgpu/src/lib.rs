//! wgpu render backend for the viewer.
//!
//! Executes a [`skyisle_render::FramePlan`]: clears, draws the glass box,
//! the skybox and the lit models, each with a pipeline built from the
//! pass's declared state. [`GpuResources`] owns every uploaded texture and
//! model and hands out a [`skyisle_render::ResourceLoader`].
//!
//! # Invariants
//! - Renderer never mutates viewer state.
//! - Textures are uploaded as linear RGBA8; 2D textures carry a full mip chain.

mod gpu;
mod pipeline;
mod resources;
mod shaders;

pub use gpu::WgpuRenderer;
pub use pipeline::{DEPTH_FORMAT, depth_stencil_state, primitive_state};
pub use resources::{
    BindGroupLayouts, GpuLoader, GpuMesh, GpuModel, GpuResources, GpuTexture, TEXTURE_FORMAT,
};

pub fn crate_info() -> &'static str {
    concat!("skyisle-render-wgpu v", env!("CARGO_PKG_VERSION"))
}
