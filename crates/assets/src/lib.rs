//! Decoding of textures, cube maps and models into CPU-side data.
//!
//! Nothing here talks to the GPU: the render backends upload what these
//! loaders return. The `*_or_fallback` / `*_or_empty` variants never fail;
//! they log the error and return black textures or empty models so the
//! viewer keeps running with missing resources.

mod model;
mod texture;

use std::path::PathBuf;

pub use model::{MaterialData, MeshData, ModelData, ModelOptions, load_model, load_model_or_empty};
pub use texture::{
    CubeFace, CubemapData, CubemapFaces, TextureData, load_cubemap, load_cubemap_or_fallback,
    load_texture, load_texture_or_fallback,
};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("image: {0}")]
    Image(#[from] image::ImageError),
    #[error("obj: {0}")]
    Obj(#[from] tobj::LoadError),
    #[error("gltf: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("model: {0}")]
    Model(String),
    #[error("cube map face is {width}x{height}, expected {expected}x{expected}")]
    CubemapSize { expected: u32, width: u32, height: u32 },
    #[error("unsupported model format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

pub fn crate_info() -> &'static str {
    concat!("skyisle-assets v", env!("CARGO_PKG_VERSION"))
}
