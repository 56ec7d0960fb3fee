/// Frame uniforms shared by every pass. Mirrors `FrameUniforms` in `gpu.rs`.
const FRAME_UNIFORMS: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
    sky_view_proj: mat4x4<f32>,
    // xyz: eye position, w: shininess
    view_position: vec4<f32>,
    light_position: vec4<f32>,
    light_ambient: vec4<f32>,
    light_diffuse: vec4<f32>,
    light_specular: vec4<f32>,
    // x: constant, y: linear, z: quadratic
    attenuation: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
};

fn instance_model(instance: InstanceInput) -> mat4x4<f32> {
    return mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
}
"#;

const BOX_BODY: &str = r#"
@group(1) @binding(0)
var box_texture: texture_2d<f32>;
@group(1) @binding(1)
var box_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = frame.view_proj * instance_model(instance) * vec4<f32>(vertex.position, 1.0);
    out.uv = vertex.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(box_texture, box_sampler, in.uv);
}
"#;

const SKYBOX_BODY: &str = r#"
@group(1) @binding(0)
var sky_texture: texture_cube<f32>;
@group(1) @binding(1)
var sky_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) direction: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    let clip = frame.sky_view_proj * vec4<f32>(position, 1.0);
    // z = w puts the sky on the far plane.
    out.clip_position = clip.xyww;
    out.direction = position;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(sky_texture, sky_sampler, in.direction);
}
"#;

const LIT_BODY: &str = r#"
@group(1) @binding(0)
var diffuse_texture: texture_2d<f32>;
@group(1) @binding(1)
var specular_texture: texture_2d<f32>;
@group(1) @binding(2)
var material_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = instance_model(instance);
    let world = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = frame.view_proj * world;
    out.world_position = world.xyz;
    // Placements scale uniformly, so the upper 3x3 keeps normals perpendicular.
    out.world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;
    out.uv = vertex.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let base = textureSample(diffuse_texture, material_sampler, in.uv).rgb;
    let spec_map = textureSample(specular_texture, material_sampler, in.uv).rgb;

    let normal = normalize(in.world_normal);
    let to_light = frame.light_position.xyz - in.world_position;
    let light_dir = normalize(to_light);
    let view_dir = normalize(frame.view_position.xyz - in.world_position);
    let reflect_dir = reflect(-light_dir, normal);

    let diff = max(dot(normal, light_dir), 0.0);
    let spec = pow(max(dot(view_dir, reflect_dir), 0.0), frame.view_position.w);

    let distance = length(to_light);
    let k = frame.attenuation;
    let attenuation = 1.0 / (k.x + k.y * distance + k.z * distance * distance);

    let ambient = frame.light_ambient.rgb * base;
    let diffuse = frame.light_diffuse.rgb * diff * base;
    let specular = frame.light_specular.rgb * spec * spec_map;
    return vec4<f32>((ambient + diffuse + specular) * attenuation, 1.0);
}
"#;

pub fn box_shader() -> String {
    format!("{FRAME_UNIFORMS}{BOX_BODY}")
}

pub fn skybox_shader() -> String {
    format!("{FRAME_UNIFORMS}{SKYBOX_BODY}")
}

pub fn lit_shader() -> String {
    format!("{FRAME_UNIFORMS}{LIT_BODY}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shader_has_both_entry_points() {
        for source in [box_shader(), skybox_shader(), lit_shader()] {
            assert!(source.contains("fn vs_main"));
            assert!(source.contains("fn fs_main"));
            assert!(source.contains("var<uniform> frame"));
        }
    }
}
