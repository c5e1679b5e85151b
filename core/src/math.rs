//! Math type aliases and 2D geometry helpers.
//!
//! Map coordinates are `f32` world units. The predicates here back the
//! document's spatial queries and the snap engine, so they follow one
//! convention throughout: boundaries count as hits.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3x3 matrix (f32), used as a 2D affine transform.
pub type Mat3 = nalgebra::Matrix3<f32>;

// ===== Scalars =====

/// Squared distance between two points.
pub fn distance2(a: Vec2, b: Vec2) -> f32 {
    (a - b).norm_squared()
}

/// Wraps an angle in radians into `[-PI, PI)`.
pub fn normalize_angle(x: f32) -> f32 {
    use std::f32::consts::PI;
    (x + PI).rem_euclid(2.0 * PI) - PI
}

// ===== Rectangles =====

/// Axis-aligned rectangle given by a corner and a (possibly negative) size.
///
/// Dragging a selection box leftwards or upwards yields negative extents;
/// every predicate normalizes them first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Square of half-size `r` centered on `center`.
    pub fn around(center: Vec2, r: f32) -> Self {
        Self::new(center.x - r, center.y - r, 2.0 * r, 2.0 * r)
    }

    /// Returns `(x0, y0, x1, y1)` with `x0 <= x1` and `y0 <= y1`.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        let (x0, x1) = if self.w < 0.0 {
            (self.x + self.w, self.x)
        } else {
            (self.x, self.x + self.w)
        };
        let (y0, y1) = if self.h < 0.0 {
            (self.y + self.h, self.y)
        } else {
            (self.y, self.y + self.h)
        };
        (x0, y0, x1, y1)
    }

    /// The four corners in winding order starting at `(x, y)`.
    pub fn corners(&self) -> [Vec2; 4] {
        [
            Vec2::new(self.x, self.y),
            Vec2::new(self.x + self.w, self.y),
            Vec2::new(self.x + self.w, self.y + self.h),
            Vec2::new(self.x, self.y + self.h),
        ]
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        let (x0, y0, x1, y1) = self.bounds();
        x0 <= p.x && p.x <= x1 && y0 <= p.y && p.y <= y1
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        let (ax0, ay0, ax1, ay1) = self.bounds();
        let (bx0, by0, bx1, by1) = other.bounds();
        ax0 <= bx0 && bx1 <= ax1 && ay0 <= by0 && by1 <= ay1
    }

    pub fn intersects_rect(&self, other: &Rect) -> bool {
        let (ax0, ay0, ax1, ay1) = self.bounds();
        let (bx0, by0, bx1, by1) = other.bounds();
        ax0 <= bx1 && ax1 >= bx0 && ay0 <= by1 && ay1 >= by0
    }

    pub fn intersects_circle(&self, center: Vec2, r: f32) -> bool {
        let (x0, y0, x1, y1) = self.bounds();
        let dx = center.x - center.x.clamp(x0, x1);
        let dy = center.y - center.y.clamp(y0, y1);
        dx * dx + dy * dy <= r * r
    }

    fn edges(&self) -> [(Vec2, Vec2); 4] {
        let [a, b, c, d] = self.corners();
        [(a, b), (b, c), (c, d), (d, a)]
    }

    pub fn intersects_segment(&self, a: Vec2, b: Vec2) -> bool {
        self.contains_point(a)
            || self.contains_point(b)
            || self
                .edges()
                .iter()
                .any(|&(p, q)| segments_intersect(p, q, a, b))
    }

    pub fn contains_triangle(&self, tri: &[Vec2; 3]) -> bool {
        tri.iter().all(|&p| self.contains_point(p))
    }

    pub fn intersects_triangle(&self, tri: &[Vec2; 3]) -> bool {
        let [a, b, c] = *tri;
        let area = signed_triangle_area(a, b, c);
        tri.iter().any(|&p| self.contains_point(p))
            || self
                .corners()
                .iter()
                .any(|&p| triangle_contains_point_with_area(tri, p, area))
            || self.edges().iter().any(|&(p, q)| {
                segments_intersect(p, q, a, b)
                    || segments_intersect(p, q, b, c)
                    || segments_intersect(p, q, c, a)
            })
    }
}

// ===== Segments and triangles =====

/// Proper intersection test for segments `ab` and `cd`.
///
/// Collinear overlaps are not reported.
pub fn segments_intersect(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> bool {
    let ccw = |p: Vec2, q: Vec2, r: Vec2| (r.y - p.y) * (q.x - p.x) > (q.y - p.y) * (r.x - p.x);
    ccw(a, c, d) != ccw(b, c, d) && ccw(a, b, c) != ccw(a, b, d)
}

/// Signed area of triangle `abc` (positive for counter-clockwise in y-up).
pub fn signed_triangle_area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    0.5 * (-b.y * c.x + a.y * (-b.x + c.x) + a.x * (b.y - c.y) + b.x * c.y)
}

/// Whether `p` lies inside or on the triangle. Degenerate triangles contain nothing.
pub fn triangle_contains_point(tri: &[Vec2; 3], p: Vec2) -> bool {
    let [a, b, c] = *tri;
    triangle_contains_point_with_area(tri, p, signed_triangle_area(a, b, c))
}

fn triangle_contains_point_with_area(tri: &[Vec2; 3], p: Vec2, area: f32) -> bool {
    if area == 0.0 {
        return false;
    }
    let [a, b, c] = *tri;
    let sign = area.signum();
    let s = (a.y * c.x - a.x * c.y + (c.y - a.y) * p.x + (a.x - c.x) * p.y) * sign;
    let t = (a.x * b.y - a.y * b.x + (a.y - b.y) * p.x + (b.x - a.x) * p.y) * sign;
    s >= 0.0 && t >= 0.0 && (s + t) <= 2.0 * area * sign
}

/// Squared distance from `p` to the closest point of segment `ab`.
pub fn point_to_segment_distance2(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let length2 = distance2(a, b);
    if length2 == 0.0 {
        return distance2(p, a);
    }
    let t = ((p - a).dot(&(b - a)) / length2).clamp(0.0, 1.0);
    distance2(p, a + (b - a) * t)
}

// ===== Transforms =====

/// Builds the sprite transform used by scenery-like nodes.
///
/// The local rectangle is scaled by `scale` and rotated by `-rotation`
/// around `center`, then placed so that the local origin lands on
/// `position`.
pub fn sprite_transform(position: Vec2, center: Vec2, scale: Vec2, rotation: f32) -> Mat3 {
    let (s, c) = (-rotation).sin_cos();
    let m0 = c * scale.x;
    let m3 = -s * scale.y;
    let m1 = s * scale.x;
    let m4 = c * scale.y;
    let m6 = position.x - center.y * m3 - center.x * m0;
    let m7 = position.y - center.y * m4 - center.x * m1;
    #[rustfmt::skip]
    let result = Mat3::new(
        m0,  m3,  m6,
        m1,  m4,  m7,
        0.0, 0.0, 1.0,
    );
    result
}

/// Applies a 2D affine transform to a point.
pub fn transform_point(m: &Mat3, p: Vec2) -> Vec2 {
    m.transform_point(&nalgebra::Point2::from(p)).coords
}
