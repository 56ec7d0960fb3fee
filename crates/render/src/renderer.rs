use crate::plan::FramePlan;
use std::fmt::Write;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer consumes a finished [`FramePlan`]; it never reads or mutates
/// the viewer state itself.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given plan.
    fn render(&mut self, plan: &FramePlan) -> Self::Output;
}

/// Human-readable dump of a frame plan, for the CLI and for tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// Print every lit draw instead of per-object counts.
    pub verbose: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, plan: &FramePlan) -> String {
        let mut out = String::new();
        let c = plan.clear_color;
        let _ = writeln!(out, "=== Frame Plan ===");
        let _ = writeln!(out, "clear: ({:.2}, {:.2}, {:.2})", c.x, c.y, c.z);

        let b = &plan.box_pass;
        let corner = b.model.w_axis;
        let _ = writeln!(
            out,
            "[box] {:?} texture={} at ({:.1}, {:.1}, {:.1})",
            b.state, b.texture.0, corner.x, corner.y, corner.z
        );
        let s = &plan.skybox_pass;
        let _ = writeln!(out, "[skybox] {:?} cubemap={}", s.state, s.cubemap.0);

        let l = &plan.lit_pass;
        let p = l.light.position;
        let e = l.view_position;
        let _ = writeln!(
            out,
            "[lit] {:?} light=({:.2}, {:.2}, {:.2}) eye=({:.2}, {:.2}, {:.2}) shininess={}",
            l.state, p.x, p.y, p.z, e.x, e.y, e.z, l.shininess
        );

        let mut i = 0;
        while i < l.draws.len() {
            let object = l.draws[i].object;
            let run = l.draws[i..]
                .iter()
                .take_while(|d| d.object == object)
                .count();
            let _ = writeln!(out, "  {object}: {run} draw(s), model={}", l.draws[i].model.0);
            if self.verbose {
                for draw in &l.draws[i..i + run] {
                    let t = draw.transform.w_axis;
                    let _ = writeln!(out, "    at ({:.2}, {:.2}, {:.2})", t.x, t.y, t.z);
                }
            }
            i += run;
        }
        let _ = writeln!(out, "total lit draws: {}", l.draws.len());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Viewport;
    use crate::plan::plan_frame;
    use crate::resources::{HeadlessLoader, SceneResources};
    use glam::Vec3;
    use skyisle_scene::{CameraSettings, SceneLayout, ViewerState};
    use std::path::Path;

    fn plan(meteors: usize) -> FramePlan {
        let layout = SceneLayout::with_meteor_offsets(vec![Vec3::ONE; meteors]);
        let state = ViewerState::new(CameraSettings::default(), layout);
        let resources = SceneResources::load(&mut HeadlessLoader::new(), Path::new("r"));
        plan_frame(&state, &resources, Viewport::new(1600, 900))
    }

    #[test]
    fn debug_renderer_summarizes_passes() {
        let output = DebugTextRenderer::new().render(&plan(3));
        assert!(output.contains("[box]"));
        assert!(output.contains("[skybox]"));
        assert!(output.contains("meteor: 3 draw(s)"));
        assert!(output.contains("island: 5 draw(s)"));
        assert!(output.contains("total lit draws: 14"));
        assert!(output.find("[box]") < output.find("[skybox]"));
    }

    #[test]
    fn verbose_lists_each_draw() {
        let mut renderer = DebugTextRenderer { verbose: true };
        let output = renderer.render(&plan(0));
        assert_eq!(output.matches("    at (").count(), 11);
    }
}
