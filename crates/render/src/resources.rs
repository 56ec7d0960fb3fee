use skyisle_assets::{CubemapFaces, ModelOptions};
use skyisle_scene::SceneObject;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Opaque reference to a texture owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// Opaque reference to a model owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelHandle(pub u32);

/// Loads assets into a backend and hands out handles.
///
/// Loading never fails: a backend logs the problem and substitutes a black
/// texture or an empty model, so the returned handle is always drawable.
pub trait ResourceLoader {
    fn load_texture(&mut self, path: &Path, flip_vertically: bool) -> TextureHandle;

    /// Faces in +X, -X, +Y, -Y, +Z, -Z order.
    fn load_cubemap(&mut self, faces: &CubemapFaces) -> TextureHandle;

    fn load_model(&mut self, path: &Path, options: &ModelOptions) -> ModelHandle;
}

/// Where a scene object's model lives under the resource root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelAsset {
    pub object: SceneObject,
    pub path: &'static str,
    pub flip_textures: bool,
}

/// Model files, in load order.
pub const MODEL_ASSETS: [ModelAsset; 8] = [
    ModelAsset {
        object: SceneObject::Island,
        path: "objects/mini_island/untitled.obj",
        flip_textures: true,
    },
    ModelAsset {
        object: SceneObject::Tree,
        path: "objects/alien_tree/untitled.obj",
        flip_textures: true,
    },
    ModelAsset {
        object: SceneObject::Meteor,
        path: "objects/meteor/untitled.obj",
        flip_textures: false,
    },
    ModelAsset {
        object: SceneObject::Platform,
        path: "objects/platform/untitled.obj",
        flip_textures: false,
    },
    ModelAsset {
        object: SceneObject::Ufo,
        path: "objects/ufo/scene.gltf",
        flip_textures: false,
    },
    ModelAsset {
        object: SceneObject::Plant,
        path: "objects/plant/untitled.obj",
        flip_textures: true,
    },
    ModelAsset {
        object: SceneObject::Alien,
        path: "objects/alien/scene.gltf",
        flip_textures: false,
    },
    ModelAsset {
        object: SceneObject::Spaceship,
        path: "objects/spaceship/scene.gltf",
        flip_textures: false,
    },
];

pub const BOX_TEXTURE: &str = "textures/glasss.png";
pub const SKYBOX_DIR: &str = "textures/milky_way";
pub const SKYBOX_EXTENSION: &str = "jpg";

/// Handles for everything the frame plan draws.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneResources {
    pub box_texture: TextureHandle,
    pub skybox: TextureHandle,
    pub models: BTreeMap<SceneObject, ModelHandle>,
}

impl SceneResources {
    /// Load every scene asset relative to `resources_dir`.
    pub fn load(loader: &mut dyn ResourceLoader, resources_dir: &Path) -> Self {
        tracing::info!("loading scene resources from {}", resources_dir.display());

        let box_texture = loader.load_texture(&resources_dir.join(BOX_TEXTURE), true);
        let skybox = loader.load_cubemap(&CubemapFaces::from_dir(
            resources_dir.join(SKYBOX_DIR),
            SKYBOX_EXTENSION,
        ));

        let models = MODEL_ASSETS
            .iter()
            .map(|asset| {
                let options = ModelOptions::default().flipped(asset.flip_textures);
                let handle = loader.load_model(&resources_dir.join(asset.path), &options);
                (asset.object, handle)
            })
            .collect();

        Self {
            box_texture,
            skybox,
            models,
        }
    }

    pub fn model(&self, object: SceneObject) -> Option<ModelHandle> {
        self.models.get(&object).copied()
    }
}

/// Loader that records requests and issues handles without decoding
/// anything. Used by headless tools and tests.
#[derive(Debug, Default)]
pub struct HeadlessLoader {
    pub textures: Vec<PathBuf>,
    pub models: Vec<(PathBuf, ModelOptions)>,
}

impl HeadlessLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceLoader for HeadlessLoader {
    fn load_texture(&mut self, path: &Path, _flip_vertically: bool) -> TextureHandle {
        self.textures.push(path.to_path_buf());
        TextureHandle(self.textures.len() as u32 - 1)
    }

    fn load_cubemap(&mut self, faces: &CubemapFaces) -> TextureHandle {
        let dir = faces.paths[0]
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.textures.push(dir);
        TextureHandle(self.textures.len() as u32 - 1)
    }

    fn load_model(&mut self, path: &Path, options: &ModelOptions) -> ModelHandle {
        self.models.push((path.to_path_buf(), options.clone()));
        ModelHandle(self.models.len() as u32 - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_drawn_object_has_a_model() {
        let mut loader = HeadlessLoader::new();
        let resources = SceneResources::load(&mut loader, Path::new("res"));
        for object in SceneObject::DRAW_ORDER {
            assert!(resources.model(object).is_some(), "{object} has no model");
        }
        assert_eq!(loader.models.len(), 8);
        assert_eq!(loader.textures.len(), 2);
    }

    #[test]
    fn paths_are_resolved_against_resource_root() {
        let mut loader = HeadlessLoader::new();
        let resources = SceneResources::load(&mut loader, Path::new("res"));
        assert_eq!(
            loader.textures[resources.box_texture.0 as usize],
            Path::new("res/textures/glasss.png")
        );
        assert_eq!(
            loader.textures[resources.skybox.0 as usize],
            Path::new("res/textures/milky_way")
        );
        let ship = resources.model(SceneObject::Spaceship).unwrap();
        assert_eq!(
            loader.models[ship.0 as usize].0,
            Path::new("res/objects/spaceship/scene.gltf")
        );
    }

    #[test]
    fn flip_follows_the_asset_table() {
        let mut loader = HeadlessLoader::new();
        let resources = SceneResources::load(&mut loader, Path::new("res"));
        let options = |object| &loader.models[resources.model(object).unwrap().0 as usize].1;
        assert!(options(SceneObject::Tree).flip_textures);
        assert!(options(SceneObject::Plant).flip_textures);
        assert!(!options(SceneObject::Meteor).flip_textures);
        assert!(!options(SceneObject::Alien).flip_textures);
        assert_eq!(options(SceneObject::Ufo).material_prefix, "material.");
    }
}
