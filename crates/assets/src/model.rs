use crate::AssetError;
use crate::texture::{TextureData, load_texture_or_fallback};
use glam::Vec3;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Options applied while decoding a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOptions {
    /// Reverse texture rows, for UVs authored with a bottom-left origin.
    pub flip_textures: bool,
    /// Prefix of the material slot names, e.g. `material.` gives
    /// `material.texture_diffuse1`.
    pub material_prefix: String,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            flip_textures: false,
            material_prefix: "material.".into(),
        }
    }
}

impl ModelOptions {
    pub fn flipped(mut self, flip: bool) -> Self {
        self.flip_textures = flip;
        self
    }
}

/// Material of one mesh. Texture fields index into [`ModelData::textures`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MaterialData {
    pub diffuse: Option<usize>,
    pub specular: Option<usize>,
}

/// One indexed triangle mesh.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub material: MaterialData,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Fill missing normals with area-weighted vertex normals and missing
    /// UVs with zeros, so every attribute has one entry per position.
    fn complete(mut self) -> Self {
        let n = self.positions.len();
        if self.normals.len() != n {
            self.normals = smooth_normals(&self.positions, &self.indices);
        }
        if self.uvs.len() != n {
            self.uvs = vec![[0.0, 0.0]; n];
        }
        self
    }
}

/// A decoded model: meshes plus the textures they reference.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelData {
    pub name: String,
    pub meshes: Vec<MeshData>,
    pub textures: Vec<TextureData>,
    pub material_prefix: String,
}

impl ModelData {
    /// A model with no meshes; drawing it draws nothing.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            material_prefix: ModelOptions::default().material_prefix,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn diffuse_slot(&self) -> String {
        format!("{}texture_diffuse1", self.material_prefix)
    }

    pub fn specular_slot(&self) -> String {
        format!("{}texture_specular1", self.material_prefix)
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.indices.len() / 3).sum()
    }
}

/// Decode a Wavefront OBJ (`.obj`) or glTF (`.gltf`, `.glb`) file.
pub fn load_model(path: impl AsRef<Path>, options: &ModelOptions) -> Result<ModelData, AssetError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let mut model = match extension.as_str() {
        "obj" => load_obj(path, options)?,
        "gltf" | "glb" => load_gltf(path, options)?,
        _ => return Err(AssetError::UnsupportedFormat(path.to_path_buf())),
    };
    model.name = model_name(path);
    model.material_prefix = options.material_prefix.clone();
    Ok(model)
}

/// Like [`load_model`], but logs failures and returns an empty model.
pub fn load_model_or_empty(path: impl AsRef<Path>, options: &ModelOptions) -> ModelData {
    let path = path.as_ref();
    match load_model(path, options) {
        Ok(model) => {
            tracing::info!(
                "loaded model {} ({} meshes, {} triangles, {} textures)",
                path.display(),
                model.meshes.len(),
                model.triangle_count(),
                model.textures.len()
            );
            model
        }
        Err(e) => {
            tracing::error!("model failed to load at {}: {e}", path.display());
            let mut empty = ModelData::empty(model_name(path));
            empty.material_prefix = options.material_prefix.clone();
            empty
        }
    }
}

fn model_name(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .or_else(|| path.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Texture table for one model, deduplicated by source. Sources that fail
/// to decode still get a slot holding [`TextureData::fallback`].
#[derive(Default)]
struct TextureTable<K> {
    textures: Vec<TextureData>,
    index: HashMap<K, usize>,
}

impl<K: std::hash::Hash + Eq> TextureTable<K> {
    fn get_or_load(&mut self, key: K, load: impl FnOnce() -> TextureData) -> usize {
        if let Some(&slot) = self.index.get(&key) {
            return slot;
        }
        self.textures.push(load());
        let slot = self.textures.len() - 1;
        self.index.insert(key, slot);
        slot
    }
}

fn load_obj(path: &Path, options: &ModelOptions) -> Result<ModelData, AssetError> {
    let (models, materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)?;
    let materials = materials.unwrap_or_else(|e| {
        tracing::warn!("no materials for {}: {e}", path.display());
        Vec::new()
    });
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut table: TextureTable<PathBuf> = TextureTable::default();
    let mut load_map = |name: &Option<String>| -> Option<usize> {
        let name = name.as_deref().filter(|n| !n.is_empty())?;
        let texture_path = base_dir.join(name.replace('\\', "/"));
        Some(table.get_or_load(texture_path.clone(), || {
            load_texture_or_fallback(&texture_path, options.flip_textures)
        }))
    };

    let mut meshes = Vec::with_capacity(models.len());
    for model in models {
        let mesh = model.mesh;
        let material = mesh
            .material_id
            .and_then(|id| materials.get(id))
            .map(|m| MaterialData {
                diffuse: load_map(&m.diffuse_texture),
                specular: load_map(&m.specular_texture),
            })
            .unwrap_or_default();

        let data = MeshData {
            positions: mesh
                .positions
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect(),
            normals: mesh
                .normals
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]])
                .collect(),
            uvs: mesh.texcoords.chunks_exact(2).map(|t| [t[0], t[1]]).collect(),
            indices: mesh.indices,
            material,
        };
        if !data.indices.is_empty() {
            meshes.push(data.complete());
        }
    }

    Ok(ModelData {
        meshes,
        textures: table.textures,
        ..Default::default()
    })
}

fn load_gltf(path: &Path, options: &ModelOptions) -> Result<ModelData, AssetError> {
    let (document, buffers, images) = gltf::import(path)?;

    let mut table: TextureTable<usize> = TextureTable::default();
    let mut meshes = Vec::new();
    for mesh in document.meshes() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                continue;
            }
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let normals = reader
                .read_normals()
                .map(|n| n.collect())
                .unwrap_or_default();
            let uvs = reader
                .read_tex_coords(0)
                .map(|t| t.into_f32().collect())
                .unwrap_or_default();
            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };

            let diffuse = primitive
                .material()
                .pbr_metallic_roughness()
                .base_color_texture()
                .map(|info| info.texture().source().index())
                .map(|image_index| {
                    table.get_or_load(image_index, || {
                        let mut texture = images
                            .get(image_index)
                            .and_then(gltf_image_to_texture)
                            .unwrap_or_else(TextureData::fallback);
                        if options.flip_textures {
                            texture.flip_vertical();
                        }
                        texture
                    })
                });

            meshes.push(
                MeshData {
                    positions,
                    normals,
                    uvs,
                    indices,
                    material: MaterialData {
                        diffuse,
                        specular: None,
                    },
                }
                .complete(),
            );
        }
    }

    Ok(ModelData {
        meshes,
        textures: table.textures,
        ..Default::default()
    })
}

fn gltf_image_to_texture(image: &gltf::image::Data) -> Option<TextureData> {
    use gltf::image::Format;
    let pixels: Vec<u8> = match image.format {
        Format::R8G8B8A8 => image.pixels.clone(),
        Format::R8G8B8 => image
            .pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8G8 => image
            .pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        Format::R8 => image.pixels.iter().flat_map(|&v| [v, v, v, 255]).collect(),
        other => {
            tracing::warn!("unsupported glTF image format {other:?}");
            return None;
        }
    };
    Some(TextureData {
        width: image.width,
        height: image.height,
        pixels,
    })
}

fn smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let [pa, pb, pc] = [a, b, c].map(|i| Vec3::from_array(positions[i]));
        // Unnormalized, so larger faces weigh more.
        let face = (pb - pa).cross(pc - pa);
        for i in [a, b, c] {
            normals[i] += face;
        }
    }
    normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}
