use bytemuck::{Pod, Zeroable};
use skyisle_assets::{
    CubemapData, CubemapFaces, ModelData, ModelOptions, TextureData, load_cubemap_or_fallback,
    load_model_or_empty, load_texture_or_fallback,
};
use skyisle_render::{ModelHandle, ResourceLoader, TextureHandle};
use std::path::Path;
use wgpu::util::DeviceExt;

pub const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub(crate) struct LitVertex {
    position: [f32; 3],
    normal: [f32; 3],
    uv: [f32; 2],
}

impl LitVertex {
    pub(crate) const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
    ];
}

/// A texture on the GPU with the bind group the box or sky pass samples it through.
pub struct GpuTexture {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub bind_group: wgpu::BindGroup,
}

pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    /// Diffuse map, specular map and sampler.
    pub material: wgpu::BindGroup,
}

pub struct GpuModel {
    pub name: String,
    pub meshes: Vec<GpuMesh>,
    _textures: Vec<GpuTexture>,
}

/// Bind group layouts for group 1 of each pass.
pub struct BindGroupLayouts {
    pub texture: wgpu::BindGroupLayout,
    pub cubemap: wgpu::BindGroupLayout,
    pub material: wgpu::BindGroupLayout,
}

impl BindGroupLayouts {
    fn new(device: &wgpu::Device) -> Self {
        let texture_entry = |binding, view_dimension| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension,
                multisampled: false,
            },
            count: None,
        };
        let sampler_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };

        Self {
            texture: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("texture_bind_group_layout"),
                entries: &[
                    texture_entry(0, wgpu::TextureViewDimension::D2),
                    sampler_entry(1),
                ],
            }),
            cubemap: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("cubemap_bind_group_layout"),
                entries: &[
                    texture_entry(0, wgpu::TextureViewDimension::Cube),
                    sampler_entry(1),
                ],
            }),
            material: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("material_bind_group_layout"),
                entries: &[
                    texture_entry(0, wgpu::TextureViewDimension::D2),
                    texture_entry(1, wgpu::TextureViewDimension::D2),
                    sampler_entry(2),
                ],
            }),
        }
    }
}

/// Registry of uploaded textures and models, addressed by handle.
pub struct GpuResources {
    layouts: BindGroupLayouts,
    sampler_2d: wgpu::Sampler,
    sampler_cube: wgpu::Sampler,
    /// Stand-in for a missing diffuse map.
    white: GpuTexture,
    /// Stand-in for a missing specular map.
    black: GpuTexture,
    textures: Vec<GpuTexture>,
    models: Vec<GpuModel>,
}

impl GpuResources {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let layouts = BindGroupLayouts::new(device);
        let sampler_2d = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("texture_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let sampler_cube = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("cubemap_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let white = upload_texture_2d(
            device,
            queue,
            &layouts,
            &sampler_2d,
            "white",
            &TextureData::solid([255, 255, 255, 255]),
        );
        let black = upload_texture_2d(
            device,
            queue,
            &layouts,
            &sampler_2d,
            "black",
            &TextureData::fallback(),
        );

        Self {
            layouts,
            sampler_2d,
            sampler_cube,
            white,
            black,
            textures: Vec::new(),
            models: Vec::new(),
        }
    }

    pub fn layouts(&self) -> &BindGroupLayouts {
        &self.layouts
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&GpuTexture> {
        self.textures.get(handle.0 as usize)
    }

    pub fn model(&self, handle: ModelHandle) -> Option<&GpuModel> {
        self.models.get(handle.0 as usize)
    }

    /// A [`ResourceLoader`] that decodes from disk and uploads into this registry.
    pub fn loader<'a>(
        &'a mut self,
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
    ) -> GpuLoader<'a> {
        GpuLoader {
            device,
            queue,
            resources: self,
        }
    }

    pub fn add_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        data: &TextureData,
    ) -> TextureHandle {
        let texture = upload_texture_2d(device, queue, &self.layouts, &self.sampler_2d, label, data);
        self.textures.push(texture);
        TextureHandle(self.textures.len() as u32 - 1)
    }

    pub fn add_cubemap(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        data: &CubemapData,
    ) -> TextureHandle {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: data.size,
                    height: data.size,
                    depth_or_array_layers: 6,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TEXTURE_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &data.layer_bytes(),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.layouts.cubemap,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler_cube),
                },
            ],
        });
        self.textures.push(GpuTexture {
            _texture: texture,
            view,
            bind_group,
        });
        TextureHandle(self.textures.len() as u32 - 1)
    }

    pub fn add_model(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &ModelData,
    ) -> ModelHandle {
        let uploaded: Vec<GpuTexture> = data
            .textures
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let label = format!("{}_texture_{i}", data.name);
                upload_texture_2d(device, queue, &self.layouts, &self.sampler_2d, &label, t)
            })
            .collect();

        let meshes = data
            .meshes
            .iter()
            .enumerate()
            .map(|(i, mesh)| {
                let label = format!("{}_mesh_{i}", data.name);
                let vertices: Vec<LitVertex> = mesh
                    .positions
                    .iter()
                    .zip(&mesh.normals)
                    .zip(&mesh.uvs)
                    .map(|((&position, &normal), &uv)| LitVertex {
                        position,
                        normal,
                        uv,
                    })
                    .collect();
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&label),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&label),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });

                let diffuse = mesh
                    .material
                    .diffuse
                    .and_then(|i| uploaded.get(i))
                    .unwrap_or(&self.white);
                let specular = mesh
                    .material
                    .specular
                    .and_then(|i| uploaded.get(i))
                    .unwrap_or(&self.black);
                let material = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&label),
                    layout: &self.layouts.material,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&diffuse.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(&specular.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::Sampler(&self.sampler_2d),
                        },
                    ],
                });

                GpuMesh {
                    vertex_buffer,
                    index_buffer,
                    index_count: mesh.indices.len() as u32,
                    material,
                }
            })
            .collect();

        self.models.push(GpuModel {
            name: data.name.clone(),
            meshes,
            _textures: uploaded,
        });
        ModelHandle(self.models.len() as u32 - 1)
    }
}

/// Borrowing loader handed to scene setup.
pub struct GpuLoader<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    resources: &'a mut GpuResources,
}

impl ResourceLoader for GpuLoader<'_> {
    fn load_texture(&mut self, path: &Path, flip_vertically: bool) -> TextureHandle {
        let data = load_texture_or_fallback(path, flip_vertically);
        let label = path.to_string_lossy();
        self.resources.add_texture(self.device, self.queue, &label, &data)
    }

    fn load_cubemap(&mut self, faces: &CubemapFaces) -> TextureHandle {
        let data = load_cubemap_or_fallback(faces);
        self.resources.add_cubemap(self.device, self.queue, "skybox", &data)
    }

    fn load_model(&mut self, path: &Path, options: &ModelOptions) -> ModelHandle {
        let data = load_model_or_empty(path, options);
        self.resources.add_model(self.device, self.queue, &data)
    }
}

fn upload_texture_2d(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layouts: &BindGroupLayouts,
    sampler: &wgpu::Sampler,
    label: &str,
    data: &TextureData,
) -> GpuTexture {
    let valid = data.width > 0
        && data.height > 0
        && data.pixels.len() == data.width as usize * data.height as usize * 4;
    let fallback;
    let data = if valid {
        data
    } else {
        tracing::warn!("texture {label} has inconsistent size, using fallback");
        fallback = TextureData::fallback();
        &fallback
    };

    let mips = data.mip_chain();
    let bytes: Vec<u8> = mips.iter().flat_map(|m| m.pixels.iter().copied()).collect();
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: data.width,
                height: data.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: mips.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &bytes,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: &layouts.texture,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    GpuTexture {
        _texture: texture,
        view,
        bind_group,
    }
}
