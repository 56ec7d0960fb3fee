use crate::pipeline::{DEPTH_FORMAT, PipelineSpec, create_pipeline};
use crate::resources::{GpuResources, LitVertex};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use skyisle_render::{BOX_VERTICES, FramePlan, PassState, SKYBOX_VERTICES};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    sky_view_proj: [[f32; 4]; 4],
    view_position: [f32; 4],
    light_position: [f32; 4],
    light_ambient: [f32; 4],
    light_diffuse: [f32; 4],
    light_specular: [f32; 4],
    attenuation: [f32; 4],
}

impl FrameUniforms {
    fn from_plan(plan: &FramePlan) -> Self {
        let light = &plan.lit_pass.light;
        let v4 = |v: Vec3, w: f32| v.extend(w).to_array();
        Self {
            view_proj: plan.view_projection().to_cols_array_2d(),
            sky_view_proj: (plan.projection * plan.skybox_pass.view).to_cols_array_2d(),
            view_position: v4(plan.lit_pass.view_position, plan.lit_pass.shininess),
            light_position: v4(light.position, 1.0),
            light_ambient: v4(light.ambient, 0.0),
            light_diffuse: v4(light.diffuse, 0.0),
            light_specular: v4(light.specular, 0.0),
            attenuation: [light.constant, light.linear, light.quadratic, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
}

impl From<Mat4> for InstanceData {
    fn from(model: Mat4) -> Self {
        let cols = model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
        }
    }
}

const INSTANCE_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<InstanceData>() as u64,
    step_mode: wgpu::VertexStepMode::Instance,
    attributes: &wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
    ],
};

/// Instance slot of the glass box; lit draws follow it.
const BOX_INSTANCE: u32 = 0;

/// wgpu renderer executing a [`FramePlan`].
pub struct WgpuRenderer {
    box_pipeline: wgpu::RenderPipeline,
    skybox_pipeline: wgpu::RenderPipeline,
    lit_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    box_vertex_buffer: wgpu::Buffer,
    skybox_vertex_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    max_instances: u32,
    depth_texture: wgpu::TextureView,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        resources: &GpuResources,
    ) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_uniform_buffer"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let layouts = resources.layouts();
        let pipeline_layout = |label: &str, group1: &wgpu::BindGroupLayout| {
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[&frame_layout, group1],
                push_constant_ranges: &[],
            })
        };
        let box_layout = pipeline_layout("box_pipeline_layout", &layouts.texture);
        let skybox_layout = pipeline_layout("skybox_pipeline_layout", &layouts.cubemap);
        let lit_layout = pipeline_layout("lit_pipeline_layout", &layouts.material);

        let box_pipeline = create_pipeline(
            device,
            surface_format,
            PipelineSpec {
                label: "box_pipeline",
                shader_source: shaders::box_shader(),
                layout: &box_layout,
                vertex_buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 5]>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x2,
                        ],
                    },
                    INSTANCE_LAYOUT,
                ],
                state: PassState::BOX,
            },
        );

        let skybox_pipeline = create_pipeline(
            device,
            surface_format,
            PipelineSpec {
                label: "skybox_pipeline",
                shader_source: shaders::skybox_shader(),
                layout: &skybox_layout,
                vertex_buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
                state: PassState::SKYBOX,
            },
        );

        let lit_pipeline = create_pipeline(
            device,
            surface_format,
            PipelineSpec {
                label: "lit_pipeline",
                shader_source: shaders::lit_shader(),
                layout: &lit_layout,
                vertex_buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<LitVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &LitVertex::ATTRIBUTES,
                    },
                    INSTANCE_LAYOUT,
                ],
                state: PassState::LIT,
            },
        );

        let box_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("box_vertex_buffer"),
            contents: bytemuck::cast_slice(&BOX_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let skybox_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("skybox_vertex_buffer"),
            contents: bytemuck::cast_slice(&SKYBOX_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let max_instances = 512u32;
        let instance_buffer = Self::create_instance_buffer(device, max_instances);
        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            box_pipeline,
            skybox_pipeline,
            lit_pipeline,
            uniform_buffer,
            uniform_bind_group,
            box_vertex_buffer,
            skybox_vertex_buffer,
            instance_buffer,
            max_instances,
            depth_texture,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    /// Render one frame: clear, glass box, skybox, lit models.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        plan: &FramePlan,
        resources: &GpuResources,
    ) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms::from_plan(plan)),
        );

        let instances: Vec<InstanceData> = std::iter::once(plan.box_pass.model)
            .chain(plan.lit_pass.draws.iter().map(|d| d.transform))
            .map(InstanceData::from)
            .collect();
        if instances.len() > self.max_instances as usize {
            self.max_instances = (instances.len() as u32).next_power_of_two();
            self.instance_buffer = Self::create_instance_buffer(device, self.max_instances);
            tracing::debug!("instance buffer grown to {}", self.max_instances);
        }
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let c = plan.clear_color;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: c.x as f64,
                            g: c.y as f64,
                            b: c.z as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            // Glass box
            if let Some(texture) = resources.texture(plan.box_pass.texture) {
                pass.set_pipeline(&self.box_pipeline);
                pass.set_bind_group(1, &texture.bind_group, &[]);
                pass.set_vertex_buffer(0, self.box_vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                pass.draw(0..BOX_VERTICES.len() as u32, BOX_INSTANCE..BOX_INSTANCE + 1);
            }

            // Skybox
            if let Some(cubemap) = resources.texture(plan.skybox_pass.cubemap) {
                pass.set_pipeline(&self.skybox_pipeline);
                pass.set_bind_group(1, &cubemap.bind_group, &[]);
                pass.set_vertex_buffer(0, self.skybox_vertex_buffer.slice(..));
                pass.draw(0..SKYBOX_VERTICES.len() as u32, 0..1);
            }

            // Lit models, one instanced draw per run of the same model
            pass.set_pipeline(&self.lit_pipeline);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            let draws = &plan.lit_pass.draws;
            let mut start = 0;
            while start < draws.len() {
                let handle = draws[start].model;
                let run = draws[start..]
                    .iter()
                    .take_while(|d| d.model == handle)
                    .count();
                let first = BOX_INSTANCE + 1 + start as u32;
                if let Some(model) = resources.model(handle) {
                    for mesh in &model.meshes {
                        pass.set_bind_group(1, &mesh.material, &[]);
                        pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                        pass.draw_indexed(0..mesh.index_count, 0, first..first + run as u32);
                    }
                }
                start += run;
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: u32) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: capacity as u64 * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyisle_render::{HeadlessLoader, SceneResources, Viewport, plan_frame};
    use skyisle_scene::{CameraSettings, SceneLayout, ViewerState};

    #[test]
    fn instance_columns_follow_glam_layout() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let data = InstanceData::from(m);
        assert_eq!(data.model_3, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(data.model_0, [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn uniforms_pack_light_and_eye() {
        let mut state = ViewerState::new(
            CameraSettings::default(),
            SceneLayout::with_meteor_offsets(Vec::new()),
        );
        state.advance_light(0.0);
        let resources =
            SceneResources::load(&mut HeadlessLoader::new(), std::path::Path::new("r"));
        let plan = plan_frame(&state, &resources, Viewport::new(1600, 900));
        let u = FrameUniforms::from_plan(&plan);

        assert_eq!(u.view_position, [0.0, 0.0, 3.0, 32.0]);
        assert_eq!(u.light_position, [30.0, 5.0, 0.0, 1.0]);
        assert_eq!(u.attenuation, [1.0, 0.09, 0.032, 0.0]);
        // The sky matrix carries no eye translation.
        let sky = Mat4::from_cols_array_2d(&u.sky_view_proj);
        let expected = plan.projection * plan.skybox_pass.view;
        assert!(sky.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn uniform_block_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
    }
}
