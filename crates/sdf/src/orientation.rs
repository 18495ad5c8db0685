//! Robust 2D orientation tests.
//!
//! Exact zero areas are broken by simulation of simplicity: a fixed cascade
//! of coordinate comparisons that gives every non-identical pair of points a
//! consistent nonzero sign. A ray that passes exactly through an edge shared
//! by two consistently wound triangles is therefore counted exactly once.

/// Sign of the triangle `(0,0)-(x1,y1)-(x2,y2)` plus its twice-signed area.
///
/// The sign is only 0 when the two points coincide.
pub fn orientation(x1: f64, y1: f64, x2: f64, y2: f64) -> (i32, f64) {
    let twice_signed_area = y1 * x2 - x1 * y2;
    let sign = if twice_signed_area > 0.0 {
        1
    } else if twice_signed_area < 0.0 {
        -1
    } else if y2 > y1 {
        1
    } else if y2 < y1 {
        -1
    } else if x1 > x2 {
        1
    } else if x1 < x2 {
        -1
    } else {
        0
    };
    (sign, twice_signed_area)
}

/// Test whether `(x0,y0)` lies in triangle `(x1,y1)-(x2,y2)-(x3,y3)`.
///
/// Returns the barycentric weights of the query point when it does.
#[allow(clippy::too_many_arguments)]
pub fn point_in_triangle_2d(
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    x3: f64,
    y3: f64,
) -> Option<[f64; 3]> {
    let (x1, x2, x3) = (x1 - x0, x2 - x0, x3 - x0);
    let (y1, y2, y3) = (y1 - y0, y2 - y0, y3 - y0);

    let (sign_a, a) = orientation(x2, y2, x3, y3);
    if sign_a == 0 {
        return None;
    }
    let (sign_b, b) = orientation(x3, y3, x1, y1);
    if sign_b != sign_a {
        return None;
    }
    let (sign_c, c) = orientation(x1, y1, x2, y2);
    if sign_c != sign_a {
        return None;
    }

    // Zero only for a triangle seen edge-on, which no ray crosses
    let sum = a + b + c;
    if sum == 0.0 {
        return None;
    }
    Some([a / sum, b / sum, c / sum])
}
