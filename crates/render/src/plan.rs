use crate::frame::{Viewport, projection, skybox_view};
use crate::pass::PassState;
use crate::resources::{ModelHandle, SceneResources, TextureHandle};
use glam::{Mat4, Vec3};
use skyisle_scene::{PointLight, SceneObject, ViewerState};

/// Specular exponent shared by every lit material.
pub const SHININESS: f32 = 32.0;

/// The glass box pass.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxPass {
    pub state: PassState,
    pub texture: TextureHandle,
    pub model: Mat4,
}

/// The sky cube pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyboxPass {
    pub state: PassState,
    pub cubemap: TextureHandle,
    /// Rotation-only view.
    pub view: Mat4,
}

/// One model drawn with one transform.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDraw {
    pub object: SceneObject,
    pub model: ModelHandle,
    pub transform: Mat4,
}

/// The lit model pass. Light and eye are shared by every draw.
#[derive(Debug, Clone, PartialEq)]
pub struct LitPass {
    pub state: PassState,
    pub light: PointLight,
    pub view_position: Vec3,
    pub shininess: f32,
    pub draws: Vec<ModelDraw>,
}

/// Everything a backend needs to draw one frame, in execution order:
/// clear, box, skybox, lit models.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub clear_color: Vec3,
    pub projection: Mat4,
    pub view: Mat4,
    pub box_pass: BoxPass,
    pub skybox_pass: SkyboxPass,
    pub lit_pass: LitPass,
}

impl FramePlan {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Pass names in execution order.
    pub fn pass_names(&self) -> [&'static str; 3] {
        ["box", "skybox", "lit"]
    }
}

/// Build the plan for the current state. Objects without a loaded model
/// are skipped.
pub fn plan_frame(state: &ViewerState, resources: &SceneResources, viewport: Viewport) -> FramePlan {
    let projection = projection(state.camera.zoom(), viewport);
    let view = state.camera.view_matrix();

    let draws = SceneObject::DRAW_ORDER
        .iter()
        .filter_map(|&object| resources.model(object).map(|model| (object, model)))
        .flat_map(|(object, model)| {
            state
                .layout
                .placements(object)
                .iter()
                .map(move |placement| ModelDraw {
                    object,
                    model,
                    transform: placement.model_matrix(),
                })
        })
        .collect();

    FramePlan {
        clear_color: state.clear_color,
        projection,
        view,
        box_pass: BoxPass {
            state: PassState::BOX,
            texture: resources.box_texture,
            model: state.layout.glass_box.model_matrix(),
        },
        skybox_pass: SkyboxPass {
            state: PassState::SKYBOX,
            cubemap: resources.skybox,
            view: skybox_view(view),
        },
        lit_pass: LitPass {
            state: PassState::LIT,
            light: state.light,
            view_position: state.camera.position,
            shininess: SHININESS,
            draws,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::{CullMode, DepthCompare, FrontFace};
    use crate::resources::HeadlessLoader;
    use rand::SeedableRng;
    use skyisle_scene::{CameraSettings, SceneLayout};
    use std::path::Path;

    fn fixture() -> (ViewerState, SceneResources) {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let state = ViewerState::new(CameraSettings::default(), SceneLayout::generate(&mut rng));
        let resources = SceneResources::load(&mut HeadlessLoader::new(), Path::new("resources"));
        (state, resources)
    }

    #[test]
    fn passes_declare_their_full_state() {
        let (state, resources) = fixture();
        let plan = plan_frame(&state, &resources, Viewport::new(1600, 900));

        assert_eq!(plan.pass_names(), ["box", "skybox", "lit"]);

        let b = plan.box_pass.state;
        assert_eq!(b.cull, CullMode::Back);
        assert_eq!(b.front_face, FrontFace::Clockwise);
        assert_eq!(b.depth_compare, DepthCompare::Less);

        let s = plan.skybox_pass.state;
        assert_eq!(s.cull, CullMode::None);
        assert_eq!(s.depth_compare, DepthCompare::LessEqual);

        let l = plan.lit_pass.state;
        assert_eq!(l.cull, CullMode::None);
        assert_eq!(l.depth_compare, DepthCompare::Less);
        assert!(b.depth_write && s.depth_write && l.depth_write);
    }

    #[test]
    fn lit_pass_draws_every_instance_in_order() {
        let (state, resources) = fixture();
        let plan = plan_frame(&state, &resources, Viewport::new(1600, 900));
        let draws = &plan.lit_pass.draws;
        assert_eq!(draws.len(), 311);

        let mut order: Vec<SceneObject> = draws.iter().map(|d| d.object).collect();
        order.dedup();
        assert_eq!(order, SceneObject::DRAW_ORDER.to_vec());
        assert_eq!(draws.iter().filter(|d| d.object == SceneObject::Meteor).count(), 300);
        assert_eq!(draws.iter().filter(|d| d.object == SceneObject::Island).count(), 5);
        assert_eq!(plan.lit_pass.shininess, 32.0);
    }

    #[test]
    fn box_and_sky_use_scene_resources() {
        let (state, resources) = fixture();
        let plan = plan_frame(&state, &resources, Viewport::new(800, 600));
        assert_eq!(plan.box_pass.texture, resources.box_texture);
        assert_eq!(plan.skybox_pass.cubemap, resources.skybox);
        assert_eq!(plan.skybox_pass.view.w_axis, glam::Vec4::W);
        let corner = plan.box_pass.model.transform_point3(Vec3::splat(0.5));
        assert!(corner.abs_diff_eq(Vec3::new(-16.5, -6.5, 3.5), 1e-5));
    }

    #[test]
    fn light_and_eye_come_from_state() {
        let (mut state, resources) = fixture();
        state.advance_light(0.0);
        state.camera.position = Vec3::new(1.0, 2.0, 3.0);
        let plan = plan_frame(&state, &resources, Viewport::new(1600, 900));
        assert_eq!(plan.lit_pass.light.position, Vec3::new(30.0, 5.0, 0.0));
        assert_eq!(plan.lit_pass.view_position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(plan.clear_color, state.clear_color);
    }

    #[test]
    fn objects_without_models_are_skipped() {
        let (state, mut resources) = fixture();
        resources.models.remove(&SceneObject::Meteor);
        let plan = plan_frame(&state, &resources, Viewport::new(1600, 900));
        assert_eq!(plan.lit_pass.draws.len(), 11);
    }
}
