/// Which triangle faces are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Back,
}

/// Winding that marks a triangle as front-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontFace {
    Clockwise,
    CounterClockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthCompare {
    Less,
    LessEqual,
}

/// Full fixed-function state of one pass.
///
/// Every pass carries all of these; a backend builds its pipeline from the
/// value and never inherits state from a previous pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassState {
    pub cull: CullMode,
    pub front_face: FrontFace,
    pub depth_compare: DepthCompare,
    pub depth_write: bool,
}

impl PassState {
    /// Textured glass box. Its mesh winds clockwise seen from outside.
    pub const BOX: PassState = PassState {
        cull: CullMode::Back,
        front_face: FrontFace::Clockwise,
        depth_compare: DepthCompare::Less,
        depth_write: true,
    };

    /// Sky cube. Drawn at the far plane, so it passes the depth test only
    /// where nothing else was drawn.
    pub const SKYBOX: PassState = PassState {
        cull: CullMode::None,
        front_face: FrontFace::CounterClockwise,
        depth_compare: DepthCompare::LessEqual,
        depth_write: true,
    };

    /// Lit models; loaded meshes have no reliable winding.
    pub const LIT: PassState = PassState {
        cull: CullMode::None,
        front_face: FrontFace::CounterClockwise,
        depth_compare: DepthCompare::Less,
        depth_write: true,
    };
}
