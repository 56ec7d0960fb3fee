use crate::AssetError;
use image::imageops::FilterType;
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// Decoded RGBA8 image, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// A single texel of the given color.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        }
    }

    /// Opaque black 1x1 texture used in place of images that failed to load.
    pub fn fallback() -> Self {
        Self::solid([0, 0, 0, 255])
    }

    pub fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw(),
        }
    }

    fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Reverse row order. Pixel data that does not match the size becomes
    /// [`TextureData::fallback`].
    pub fn flip_vertical(&mut self) {
        let pixels = std::mem::take(&mut self.pixels);
        match RgbaImage::from_raw(self.width, self.height, pixels) {
            Some(mut image) => {
                image::imageops::flip_vertical_in_place(&mut image);
                self.pixels = image.into_raw();
            }
            None => {
                tracing::warn!("cannot flip {}x{} texture with mismatched data", self.width, self.height);
                *self = Self::fallback();
            }
        }
    }

    /// Resample to `width` x `height` with a triangle filter.
    pub fn resized(&self, width: u32, height: u32) -> Self {
        match self.to_image() {
            Some(image) => Self::from_image(image::imageops::resize(
                &image,
                width.max(1),
                height.max(1),
                FilterType::Triangle,
            )),
            None => Self::fallback(),
        }
    }

    /// Number of levels in a full mip chain for this size.
    pub fn mip_level_count(&self) -> u32 {
        32 - self.width.max(self.height).max(1).leading_zeros()
    }

    /// Full mip chain, level 0 first, each level half the previous size.
    pub fn mip_chain(&self) -> Vec<TextureData> {
        let mut levels = vec![self.clone()];
        for _ in 1..self.mip_level_count() {
            let prev = levels.last().map_or((1, 1), |l| (l.width, l.height));
            let (w, h) = ((prev.0 / 2).max(1), (prev.1 / 2).max(1));
            levels.push(self.resized(w, h));
        }
        levels
    }
}

/// Decode an image file. `flip_vertically` reverses row order, for UVs
/// authored with a bottom-left origin.
pub fn load_texture(path: impl AsRef<Path>, flip_vertically: bool) -> Result<TextureData, AssetError> {
    let image = image::open(path.as_ref())?;
    let image = if flip_vertically { image.flipv() } else { image };
    Ok(TextureData::from_image(image.into_rgba8()))
}

/// Like [`load_texture`], but logs failures and returns [`TextureData::fallback`].
pub fn load_texture_or_fallback(path: impl AsRef<Path>, flip_vertically: bool) -> TextureData {
    let path = path.as_ref();
    match load_texture(path, flip_vertically) {
        Ok(texture) => {
            tracing::debug!(
                "loaded texture {} ({}x{})",
                path.display(),
                texture.width,
                texture.height
            );
            texture
        }
        Err(e) => {
            tracing::error!("texture failed to load at {}: {e}", path.display());
            TextureData::fallback()
        }
    }
}

/// Cube map face, in the order the GPU enumerates layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Conventional file stem: `px`, `nx`, `py`, `ny`, `pz`, `nz`.
    pub fn stem(self) -> &'static str {
        match self {
            CubeFace::PositiveX => "px",
            CubeFace::NegativeX => "nx",
            CubeFace::PositiveY => "py",
            CubeFace::NegativeY => "ny",
            CubeFace::PositiveZ => "pz",
            CubeFace::NegativeZ => "nz",
        }
    }
}

/// Six face image paths, indexed in [`CubeFace::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubemapFaces {
    pub paths: [PathBuf; 6],
}

impl CubemapFaces {
    /// `dir/px.ext`, `dir/nx.ext`, ... in face order.
    pub fn from_dir(dir: impl AsRef<Path>, extension: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            paths: CubeFace::ALL.map(|face| dir.join(format!("{}.{extension}", face.stem()))),
        }
    }

    pub fn path(&self, face: CubeFace) -> &Path {
        &self.paths[face as usize]
    }
}

/// Six square faces of equal size, in [`CubeFace::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubemapData {
    pub size: u32,
    pub faces: [TextureData; 6],
}

impl CubemapData {
    pub fn fallback() -> Self {
        Self {
            size: 1,
            faces: std::array::from_fn(|_| TextureData::fallback()),
        }
    }

    pub fn face(&self, face: CubeFace) -> &TextureData {
        &self.faces[face as usize]
    }

    /// All face pixels concatenated in layer order.
    pub fn layer_bytes(&self) -> Vec<u8> {
        self.faces
            .iter()
            .flat_map(|f| f.pixels.iter().copied())
            .collect()
    }
}

/// Decode all six faces. Faces must be square and the same size.
pub fn load_cubemap(faces: &CubemapFaces) -> Result<CubemapData, AssetError> {
    let mut decoded = Vec::with_capacity(6);
    for path in &faces.paths {
        decoded.push(load_texture(path, false)?);
    }
    let size = decoded[0].width;
    if let Some(bad) = decoded.iter().find(|f| f.width != size || f.height != size) {
        return Err(AssetError::CubemapSize {
            expected: size,
            width: bad.width,
            height: bad.height,
        });
    }
    let faces: [TextureData; 6] = decoded
        .try_into()
        .map_err(|_| AssetError::Model("cube map needs six faces".into()))?;
    Ok(CubemapData { size, faces })
}

/// Decode the faces one by one. A face that fails is logged and painted
/// black; faces of another size are resampled to the first decoded size.
pub fn load_cubemap_or_fallback(faces: &CubemapFaces) -> CubemapData {
    let decoded: Vec<Option<TextureData>> = faces
        .paths
        .iter()
        .map(|path| match load_texture(path, false) {
            Ok(texture) => Some(texture),
            Err(e) => {
                tracing::error!("cube map face failed to load at {}: {e}", path.display());
                None
            }
        })
        .collect();

    let Some(size) = decoded.iter().flatten().map(|f| f.width.max(f.height)).next() else {
        return CubemapData::fallback();
    };

    let mut out = decoded.into_iter().map(|face| match face {
        Some(f) if f.width == size && f.height == size => f,
        Some(f) => {
            tracing::warn!(
                "cube map face is {}x{}, resampling to {size}x{size}",
                f.width,
                f.height
            );
            f.resized(size, size)
        }
        None => TextureData::fallback().resized(size, size),
    });
    let faces = std::array::from_fn(|_| out.next().unwrap_or_else(TextureData::fallback));
    CubemapData { size, faces }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// 2x2 image: top row red, bottom row blue.
    fn write_two_row_png(path: &Path) {
        let mut img = RgbaImage::new(2, 2);
        for x in 0..2 {
            img.put_pixel(x, 0, Rgba([255, 0, 0, 255]));
            img.put_pixel(x, 1, Rgba([0, 0, 255, 255]));
        }
        img.save(path).unwrap();
    }

    #[test]
    fn loads_rows_top_to_bottom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.png");
        write_two_row_png(&path);

        let tex = load_texture(&path, false).unwrap();
        assert_eq!((tex.width, tex.height), (2, 2));
        assert_eq!(&tex.pixels[0..4], &[255, 0, 0, 255]);

        let flipped = load_texture(&path, true).unwrap();
        assert_eq!(&flipped.pixels[0..4], &[0, 0, 255, 255]);
    }

    #[test]
    fn manual_flip_matches_decoder_flip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.png");
        write_two_row_png(&path);

        let mut tex = load_texture(&path, false).unwrap();
        tex.flip_vertical();
        assert_eq!(tex, load_texture(&path, true).unwrap());
    }

    #[test]
    fn flipping_mismatched_data_gives_fallback() {
        let mut tex = TextureData {
            width: 4,
            height: 4,
            pixels: vec![255; 8],
        };
        tex.flip_vertical();
        assert_eq!(tex, TextureData::fallback());
    }

    #[test]
    fn missing_texture_falls_back_to_black() {
        let tex = load_texture_or_fallback("/definitely/not/here.png", true);
        assert_eq!(tex, TextureData::fallback());
        assert_eq!(tex.pixels, vec![0, 0, 0, 255]);
    }

    #[test]
    fn mip_chain_halves_to_one_texel() {
        let tex = TextureData::from_image(RgbaImage::new(8, 2));
        assert_eq!(tex.mip_level_count(), 4);
        let sizes: Vec<(u32, u32)> = tex.mip_chain().iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(sizes, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn face_paths_follow_layer_order() {
        let faces = CubemapFaces::from_dir("sky", "jpg");
        let names: Vec<String> = faces
            .paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["px.jpg", "nx.jpg", "py.jpg", "ny.jpg", "pz.jpg", "nz.jpg"]);
        assert_eq!(faces.path(CubeFace::NegativeY), Path::new("sky/ny.jpg"));
    }

    #[test]
    fn cubemap_missing_face_is_black_at_common_size() {
        let dir = tempfile::tempdir().unwrap();
        for face in CubeFace::ALL {
            if face == CubeFace::PositiveZ {
                continue;
            }
            let mut img = RgbaImage::new(4, 4);
            img.pixels_mut().for_each(|p| *p = Rgba([200, 200, 200, 255]));
            img.save(dir.path().join(format!("{}.png", face.stem()))).unwrap();
        }

        let faces = CubemapFaces::from_dir(dir.path(), "png");
        assert!(load_cubemap(&faces).is_err());

        let cube = load_cubemap_or_fallback(&faces);
        assert_eq!(cube.size, 4);
        let pz = cube.face(CubeFace::PositiveZ);
        assert_eq!((pz.width, pz.height), (4, 4));
        assert_eq!(&pz.pixels[0..4], &[0, 0, 0, 255]);
        assert_eq!(&cube.face(CubeFace::PositiveX).pixels[0..4], &[200, 200, 200, 255]);
        assert_eq!(cube.layer_bytes().len(), 6 * 4 * 4 * 4);
    }

    #[test]
    fn cubemap_with_no_faces_is_fallback() {
        let faces = CubemapFaces::from_dir("/nowhere", "jpg");
        assert_eq!(load_cubemap_or_fallback(&faces), CubemapData::fallback());
    }
}
