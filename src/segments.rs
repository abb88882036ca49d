use crate::config::ReaderConfig;
use crate::patterns::letter_mask;
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use serde::Serialize;
use tracing::debug;

const OUTLINE: Rgb<u8> = Rgb([0, 0, 0]);
const LABEL: Rgb<u8> = Rgb([255, 255, 255]);

/// The seven lamp segments, in bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

/// Fractional sampling box inside a rectified digit: `[y0, y1]` of the
/// height, `[x0, x1]` of the width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub y0: f64,
    pub y1: f64,
    pub x0: f64,
    pub x1: f64,
}

// Horizontal segments sample the middle half of the width, vertical ones
// the middle half of their own height.
const ZONES: [Zone; 7] = [
    Zone { y0: 0.05, y1: 0.25, x0: 0.25, x1: 0.75 },
    Zone { y0: 0.125, y1: 0.375, x0: 0.70, x1: 0.95 },
    Zone { y0: 0.625, y1: 0.875, x0: 0.70, x1: 0.95 },
    Zone { y0: 0.75, y1: 0.95, x0: 0.25, x1: 0.75 },
    Zone { y0: 0.625, y1: 0.875, x0: 0.05, x1: 0.30 },
    Zone { y0: 0.125, y1: 0.375, x0: 0.05, x1: 0.30 },
    Zone { y0: 0.40, y1: 0.60, x0: 0.25, x1: 0.75 },
];

impl Segment {
    pub const ALL: [Segment; 7] = [
        Segment::A,
        Segment::B,
        Segment::C,
        Segment::D,
        Segment::E,
        Segment::F,
        Segment::G,
    ];

    pub fn bit(self) -> u8 {
        1 << self as u8
    }

    pub fn label(self) -> char {
        (b'a' + self as u8) as char
    }

    pub fn zone(self) -> Zone {
        ZONES[self as usize]
    }
}

impl Zone {
    /// Pixel box `(x0, y0, x1, y1)` for a `width`×`height` image, truncated
    /// towards zero and not yet clamped.
    fn pixel_box(&self, width: u32, height: u32) -> (i64, i64, i64, i64) {
        let (w, h) = (f64::from(width), f64::from(height));
        (
            (w * self.x0) as i64,
            (h * self.y0) as i64,
            (w * self.x1) as i64,
            (h * self.y1) as i64,
        )
    }
}

/// Bright-pixel thresholds for deciding whether a zone is lit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub white_level: u8,
    pub lit_fraction: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            white_level: 180,
            lit_fraction: 0.30,
        }
    }
}

impl From<&ReaderConfig> for Thresholds {
    fn from(cfg: &ReaderConfig) -> Self {
        Thresholds {
            white_level: cfg.white_level,
            lit_fraction: cfg.lit_fraction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentState {
    pub segment: Segment,
    pub lit: bool,
    /// Fraction of the zone's pixels above the white level.
    pub ratio: f64,
}

#[derive(Debug, Clone)]
pub struct SegmentAnalysis {
    pub mask: u8,
    pub states: [SegmentState; 7],
    /// Colour copy of the input with zone boxes and labels drawn on.
    pub annotated: RgbImage,
}

/// Read the seven segments of a rectified digit and draw the diagnostic overlay.
pub fn analyze(image: &GrayImage, thresholds: Thresholds) -> SegmentAnalysis {
    let (mask, states) = measure(image, thresholds);
    SegmentAnalysis {
        mask,
        states,
        annotated: annotate(image),
    }
}

/// Segment states and the resulting mask, without the overlay.
pub fn measure(image: &GrayImage, thresholds: Thresholds) -> (u8, [SegmentState; 7]) {
    let states = Segment::ALL.map(|segment| {
        let ratio = bright_fraction(image, segment.zone(), thresholds.white_level);
        let lit = ratio > thresholds.lit_fraction;
        debug!(segment = %segment.label(), ratio, lit, "segment");
        SegmentState {
            segment,
            lit,
            ratio,
        }
    });

    let mask = states
        .iter()
        .filter(|s| s.lit)
        .fold(0u8, |m, s| m | s.segment.bit());
    debug!(mask = %format!("{mask:07b}"), value = mask, "segment mask");
    (mask, states)
}

/// Fraction of pixels in `zone` brighter than `white_level`.
///
/// Bounds are clamped to the last row/column; an empty box reads as 0.
fn bright_fraction(image: &GrayImage, zone: Zone, white_level: u8) -> f64 {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }

    let (x0, y0, x1, y1) = zone.pixel_box(width, height);
    let clamp_x = |v: i64| v.clamp(0, i64::from(width) - 1) as u32;
    let clamp_y = |v: i64| v.clamp(0, i64::from(height) - 1) as u32;
    let (x0, x1) = (clamp_x(x0), clamp_x(x1));
    let (y0, y1) = (clamp_y(y0), clamp_y(y1));
    if x0 >= x1 || y0 >= y1 {
        return 0.0;
    }

    let mut bright = 0u64;
    for y in y0..y1 {
        for x in x0..x1 {
            if image.get_pixel(x, y)[0] > white_level {
                bright += 1;
            }
        }
    }
    let total = u64::from(x1 - x0) * u64::from(y1 - y0);
    bright as f64 / total as f64
}

/// Colour copy of `image` with every zone outlined (2 px, black) and its
/// letter drawn at the box centre as a small seven-segment glyph.
pub fn annotate(image: &GrayImage) -> RgbImage {
    let mut canvas = DynamicImage::ImageLuma8(image.clone()).to_rgb8();
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return canvas;
    }

    let glyph_h = (height / 15).max(6) as f32;
    let glyph_w = (glyph_h * 0.6).round();

    for segment in Segment::ALL {
        let (x0, y0, x1, y1) = segment.zone().pixel_box(width, height);
        let (bw, bh) = ((x1 - x0 + 1) as u32, (y1 - y0 + 1) as u32);
        let outer = Rect::at(x0 as i32, y0 as i32).of_size(bw, bh);
        draw_hollow_rect_mut(&mut canvas, outer, OUTLINE);
        if bw > 2 && bh > 2 {
            let inner = Rect::at(x0 as i32 + 1, y0 as i32 + 1).of_size(bw - 2, bh - 2);
            draw_hollow_rect_mut(&mut canvas, inner, OUTLINE);
        }

        let cx = (x0 + x1) as f32 / 2.0;
        let cy = (y0 + y1) as f32 / 2.0;
        if let Some(mask) = letter_mask(segment.label()) {
            let (left, top) = (cx - glyph_w / 2.0, cy - glyph_h / 2.0);
            draw_glyph(&mut canvas, mask, left, top, glyph_w, glyph_h);
        }
    }
    canvas
}

/// Draw `mask` as a seven-segment character in the box at (`left`, `top`).
fn draw_glyph(canvas: &mut RgbImage, mask: u8, left: f32, top: f32, w: f32, h: f32) {
    let (l, r) = (left, left + w);
    let (t, m, b) = (top, top + h / 2.0, top + h);
    let strokes = [
        ((l, t), (r, t)),
        ((r, t), (r, m)),
        ((r, m), (r, b)),
        ((l, b), (r, b)),
        ((l, m), (l, b)),
        ((l, t), (l, m)),
        ((l, m), (r, m)),
    ];
    for (segment, (start, end)) in Segment::ALL.iter().zip(strokes) {
        if mask & segment.bit() == 0 {
            continue;
        }
        // Second pass one pixel over for a 2 px stroke.
        let (dx, dy) = if start.1 == end.1 { (0.0, 1.0) } else { (1.0, 0.0) };
        draw_line_segment_mut(canvas, start, end, LABEL);
        let (start2, end2) = ((start.0 + dx, start.1 + dy), (end.0 + dx, end.1 + dy));
        draw_line_segment_mut(canvas, start2, end2, LABEL);
    }
}

/// Letters of the lit segments in `mask`, e.g. `6` → `"bc"`.
pub fn lit_segments(mask: u8) -> String {
    Segment::ALL
        .iter()
        .filter(|s| mask & s.bit() != 0)
        .map(|s| s.label())
        .collect()
}
