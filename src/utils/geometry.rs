//! Geometry utilities for perspective transformations and polygon handling
use crate::models::{BoundingBox, Point};

/// Polygons below this area (px²) are treated as degenerate
pub const MIN_POLYGON_AREA: f32 = 1.0;

/// Minimum thin side (px) of a normalized outline
pub const MIN_THIN_SIDE: f32 = 16.0;

/// Minimum thin side of a normalized outline, relative to its long side
pub const MIN_THIN_RATIO: f32 = 0.25;

/// Perspective transformation matrix (3x3)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveTransform {
    a11: f32,
    a12: f32,
    a13: f32,
    a21: f32,
    a22: f32,
    a23: f32,
    a31: f32,
    a32: f32,
    a33: f32,
}

impl PerspectiveTransform {
    /// Create transform from 4 source points to 4 destination points
    pub fn from_points(src: &[Point; 4], dst: &[Point; 4]) -> Option<Self> {
        // Direct linear transform with a33 fixed to 1
        let mut a = [[0.0f32; 8]; 8];
        let mut b = [0.0f32; 8];

        for i in 0..4 {
            let (sx, sy) = (src[i].x, src[i].y);
            let (dx, dy) = (dst[i].x, dst[i].y);

            let row = i * 2;
            a[row] = [sx, sy, 1.0, 0.0, 0.0, 0.0, -dx * sx, -dx * sy];
            b[row] = dx;
            a[row + 1] = [0.0, 0.0, 0.0, sx, sy, 1.0, -dy * sx, -dy * sy];
            b[row + 1] = dy;
        }

        solve_linear_system(&a, &b).map(|s| Self {
            a11: s[0],
            a12: s[1],
            a13: s[2],
            a21: s[3],
            a22: s[4],
            a23: s[5],
            a31: s[6],
            a32: s[7],
            a33: 1.0,
        })
    }

    /// Transform a point, `None` when it maps to infinity
    pub fn transform(&self, p: &Point) -> Option<Point> {
        let denominator = self.a31 * p.x + self.a32 * p.y + self.a33;
        if denominator.abs() < 1e-10 {
            return None;
        }

        let x = (self.a11 * p.x + self.a12 * p.y + self.a13) / denominator;
        let y = (self.a21 * p.x + self.a22 * p.y + self.a23) / denominator;
        Some(Point::new(x, y))
    }
}

/// Solve 8x8 linear system using Gaussian elimination
#[allow(clippy::needless_range_loop)]
fn solve_linear_system(a: &[[f32; 8]; 8], b: &[f32; 8]) -> Option<[f32; 8]> {
    let mut a = *a;
    let mut b = *b;
    let n = 8;

    // Forward elimination
    for i in 0..n {
        // Find pivot
        let mut max_val = a[i][i].abs();
        let mut max_row = i;

        for k in (i + 1)..n {
            if a[k][i].abs() > max_val {
                max_val = a[k][i].abs();
                max_row = k;
            }
        }

        // Singular matrix
        if max_val < 1e-10 {
            return None;
        }

        if max_row != i {
            a.swap(i, max_row);
            b.swap(i, max_row);
        }

        for k in (i + 1)..n {
            let factor = a[k][i] / a[i][i];
            b[k] -= factor * b[i];

            for j in i..n {
                a[k][j] -= factor * a[i][j];
            }
        }
    }

    // Back substitution
    let mut x = [0.0f32; 8];
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= a[i][j] * x[j];
        }

        if a[i][i].abs() < 1e-10 {
            return None;
        }

        x[i] = sum / a[i][i];
    }

    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}

/// Absolute shoelace area of a simple polygon
pub fn polygon_area(points: &[Point]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0f32;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice += p.x * q.y - q.x * p.y;
    }
    (twice * 0.5).abs()
}

/// Centroid of the vertex set
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f32;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sx / n, sy / n))
}

/// Order four corners as top-left, top-right, bottom-right, bottom-left
///
/// Corners are sorted clockwise (image coordinates, y down) around their
/// centroid, then rotated so the corner with the smallest `x + y` comes first.
pub fn order_quad(points: &[Point; 4]) -> [Point; 4] {
    let c = centroid(points).unwrap_or_default();
    let mut sorted = *points;
    sorted.sort_by(|a, b| {
        let ta = (a.y - c.y).atan2(a.x - c.x);
        let tb = (b.y - c.y).atan2(b.x - c.x);
        ta.total_cmp(&tb)
    });

    let start = sorted
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (a.x + a.y).total_cmp(&(b.x + b.y)))
        .map(|(i, _)| i)
        .unwrap_or(0);

    [
        sorted[start],
        sorted[(start + 1) % 4],
        sorted[(start + 2) % 4],
        sorted[(start + 3) % 4],
    ]
}

/// Convex hull by Andrew's monotone chain, counter-clockwise in math axes
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts: Vec<Point> = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Point> = Vec::with_capacity(pts.len());
    for p in &pts {
        while lower.len() >= 2 && lower[lower.len() - 2].cross(&lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<Point> = Vec::with_capacity(pts.len());
    for p in pts.iter().rev() {
        while upper.len() >= 2 && upper[upper.len() - 2].cross(&upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(*p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Minimum-area enclosing rectangle of a point set
///
/// Tests each hull edge direction (rotating calipers). Returns `None` when
/// the hull has fewer than three vertices.
pub fn min_area_rect(points: &[Point]) -> Option<[Point; 4]> {
    let hull = convex_hull(points);
    if hull.len() < 3 {
        return None;
    }

    let mut best: Option<(f32, [Point; 4])> = None;
    for i in 0..hull.len() {
        let p = hull[i];
        let q = hull[(i + 1) % hull.len()];
        let len = p.distance(&q);
        if len < f32::EPSILON {
            continue;
        }
        let (ux, uy) = ((q.x - p.x) / len, (q.y - p.y) / len);
        let (vx, vy) = (-uy, ux);

        let (mut min_u, mut max_u) = (f32::INFINITY, f32::NEG_INFINITY);
        let (mut min_v, mut max_v) = (f32::INFINITY, f32::NEG_INFINITY);
        for h in &hull {
            let du = h.x * ux + h.y * uy;
            let dv = h.x * vx + h.y * vy;
            min_u = min_u.min(du);
            max_u = max_u.max(du);
            min_v = min_v.min(dv);
            max_v = max_v.max(dv);
        }

        let area = (max_u - min_u) * (max_v - min_v);
        if best.as_ref().is_none_or(|(a, _)| area < *a) {
            let corner = |u: f32, v: f32| Point::new(u * ux + v * vx, u * uy + v * vy);
            best = Some((
                area,
                [
                    corner(min_u, min_v),
                    corner(max_u, min_v),
                    corner(max_u, max_v),
                    corner(min_u, max_v),
                ],
            ));
        }
    }

    best.map(|(_, rect)| rect)
}

/// True when the polygon is too thin or small to rectify
pub fn is_degenerate(points: &[Point]) -> bool {
    polygon_area(points) < MIN_POLYGON_AREA
}

/// Turn a decoder outline into a polygon with at least four vertices
///
/// Outlines with four or more points and a non-zero area are kept as is.
/// Anything else (a 1D scan line, a single point, a collapsed quad) becomes
/// its axis-aligned bounding rectangle with the thin side grown, around the
/// same center, to at least `max(16, 25% of the long side)`.
pub fn normalize_outline(points: &[Point]) -> Option<Vec<Point>> {
    if points.len() >= 4 && !is_degenerate(points) {
        return Some(points.to_vec());
    }

    let bbox = BoundingBox::from_points(points)?;
    let long = bbox.width.max(bbox.height);
    let thin = MIN_THIN_SIDE.max(long * MIN_THIN_RATIO);
    let (cx, cy) = (bbox.x + bbox.width / 2.0, bbox.y + bbox.height / 2.0);
    let width = bbox.width.max(thin);
    let height = bbox.height.max(thin);
    Some(BoundingBox::new(cx - width / 2.0, cy - height / 2.0, width, height).corners().to_vec())
}
