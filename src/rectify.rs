use crate::labels::{Point, RegionDescriptor};
use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use tracing::warn;

/// Warp one region of `image` onto an upright `width`×`height` image.
///
/// The region's corners map, in the order given, onto
/// (0,0), (w−1,0), (w−1,h−1), (0,h−1). Samples outside the source are black.
/// Corners that admit no projective transform (three or more collinear)
/// yield an all-black image; the caller then sees every segment unlit.
pub fn rectify(
    image: &GrayImage,
    region: &RegionDescriptor,
    width: u32,
    height: u32,
) -> GrayImage {
    let mut out = GrayImage::new(width, height);
    let (w, h) = (width.saturating_sub(1) as f32, height.saturating_sub(1) as f32);

    let src = region.corners.map(|p| (p.x as f32, p.y as f32));
    let dst = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];

    let projection = if has_collinear_triple(&region.corners) {
        None
    } else {
        Projection::from_control_points(src, dst)
    };
    let Some(projection) = projection else {
        warn!(
            index = region.index,
            corners = ?region.corners,
            "degenerate region, no perspective transform"
        );
        return out;
    };

    warp_into(image, &projection, Interpolation::Bilinear, Luma([0u8]), &mut out);
    out
}

/// True when any three of the four corners lie on one line.
///
/// Exact for the whole `i32` range: differences fit in 33 bits, their
/// products in `i128`.
fn has_collinear_triple(c: &[Point; 4]) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES.iter().any(|&[o, a, b]| {
        let d = |p: usize| {
            (
                i128::from(c[p].x) - i128::from(c[o].x),
                i128::from(c[p].y) - i128::from(c[o].y),
            )
        };
        let ((ax, ay), (bx, by)) = (d(a), d(b));
        ax * by - ay * bx == 0
    })
}

/// Re-order corners clockwise (on screen, y down) starting with the corner
/// nearest the top-left, i.e. the smallest `x + y`.
pub fn normalize_corners(corners: [Point; 4]) -> [Point; 4] {
    let cx = corners.iter().map(|p| p.x as f64).sum::<f64>() / 4.0;
    let cy = corners.iter().map(|p| p.y as f64).sum::<f64>() / 4.0;
    let angle = |p: &Point| (p.y as f64 - cy).atan2(p.x as f64 - cx);

    let mut sorted = corners;
    sorted.sort_by(|a, b| angle(a).total_cmp(&angle(b)));

    let start = sorted
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| i64::from(p.x) + i64::from(p.y))
        .map(|(i, _)| i)
        .unwrap_or(0);
    sorted.rotate_left(start);
    sorted
}
