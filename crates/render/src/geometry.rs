//! Built-in meshes: the textured box and the sky cube.

/// Unit box as 12 triangles of `[x, y, z, u, v]`, wound clockwise when
/// seen from outside.
#[rustfmt::skip]
pub const BOX_VERTICES: [[f32; 5]; 36] = [
    // back
    [-0.5, -0.5, -0.5, 0.0, 0.0],
    [ 0.5, -0.5, -0.5, 1.0, 0.0],
    [ 0.5,  0.5, -0.5, 1.0, 1.0],
    [ 0.5,  0.5, -0.5, 1.0, 1.0],
    [-0.5,  0.5, -0.5, 0.0, 1.0],
    [-0.5, -0.5, -0.5, 0.0, 0.0],
    // front
    [-0.5, -0.5,  0.5, 0.0, 0.0],
    [ 0.5,  0.5,  0.5, 1.0, 1.0],
    [ 0.5, -0.5,  0.5, 1.0, 0.0],
    [ 0.5,  0.5,  0.5, 1.0, 1.0],
    [-0.5, -0.5,  0.5, 0.0, 0.0],
    [-0.5,  0.5,  0.5, 0.0, 1.0],
    // left
    [-0.5,  0.5,  0.5, 1.0, 0.0],
    [-0.5, -0.5, -0.5, 0.0, 1.0],
    [-0.5,  0.5, -0.5, 1.0, 1.0],
    [-0.5, -0.5, -0.5, 0.0, 1.0],
    [-0.5,  0.5,  0.5, 1.0, 0.0],
    [-0.5, -0.5,  0.5, 0.0, 0.0],
    // right
    [ 0.5,  0.5,  0.5, 1.0, 0.0],
    [ 0.5,  0.5, -0.5, 1.0, 1.0],
    [ 0.5, -0.5, -0.5, 0.0, 1.0],
    [ 0.5, -0.5, -0.5, 0.0, 1.0],
    [ 0.5, -0.5,  0.5, 0.0, 0.0],
    [ 0.5,  0.5,  0.5, 1.0, 0.0],
    // bottom
    [-0.5, -0.5, -0.5, 0.0, 1.0],
    [ 0.5, -0.5,  0.5, 1.0, 0.0],
    [ 0.5, -0.5, -0.5, 1.0, 1.0],
    [ 0.5, -0.5,  0.5, 1.0, 0.0],
    [-0.5, -0.5, -0.5, 0.0, 1.0],
    [-0.5, -0.5,  0.5, 0.0, 0.0],
    // top
    [-0.5,  0.5, -0.5, 0.0, 1.0],
    [ 0.5,  0.5, -0.5, 1.0, 1.0],
    [ 0.5,  0.5,  0.5, 1.0, 0.0],
    [ 0.5,  0.5,  0.5, 1.0, 0.0],
    [-0.5,  0.5,  0.5, 0.0, 0.0],
    [-0.5,  0.5, -0.5, 0.0, 1.0],
];

/// Cube of half-extent 1 around the eye, positions only.
#[rustfmt::skip]
pub const SKYBOX_VERTICES: [[f32; 3]; 36] = [
    [-1.0,  1.0, -1.0], [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [-1.0,  1.0, -1.0],

    [-1.0, -1.0,  1.0], [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0],
    [-1.0,  1.0, -1.0], [-1.0,  1.0,  1.0], [-1.0, -1.0,  1.0],

    [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0], [ 1.0, -1.0, -1.0],

    [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0],

    [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0],

    [-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0],
];

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn position(v: &[f32; 5]) -> Vec3 {
        Vec3::new(v[0], v[1], v[2])
    }

    #[test]
    fn box_triangles_wind_clockwise_from_outside() {
        for tri in BOX_VERTICES.chunks_exact(3) {
            let [a, b, c] = [position(&tri[0]), position(&tri[1]), position(&tri[2])];
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            // Counter-clockwise normal points inward, so from outside the
            // triangle appears clockwise.
            assert!(normal.dot(centroid) < 0.0, "triangle {a} {b} {c}");
        }
    }

    #[test]
    fn box_is_a_unit_cube() {
        for v in &BOX_VERTICES {
            assert!(position(v).abs().max_element() == 0.5);
            assert!((0.0..=1.0).contains(&v[3]) && (0.0..=1.0).contains(&v[4]));
        }
    }

    #[test]
    fn skybox_vertices_lie_on_the_unit_cube() {
        for v in &SKYBOX_VERTICES {
            assert!(v.iter().all(|c| c.abs() == 1.0));
        }
    }
}
