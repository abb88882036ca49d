use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use segmentor_lib::processor::{recognize, assemble};
use segmentor_lib::segments::Segment;
use segmentor_lib::{parse_labels, DataType, ReaderConfig, Symbol};

/// Upright 100×150 digit with `segments` lit.
fn digit(segments: &[Segment]) -> GrayImage {
    let mut img = GrayImage::from_pixel(100, 150, Luma([20]));
    for s in segments {
        let z = s.zone();
        for y in (150.0 * z.y0) as u32..(150.0 * z.y1) as u32 {
            for x in (100.0 * z.x0) as u32..(100.0 * z.x1) as u32 {
                img.put_pixel(x, y, Luma([235]));
            }
        }
    }
    img
}

/// Project `digit` onto the quadrilateral `quad` of `frame`.
fn stamp(frame: &mut GrayImage, digit: &GrayImage, quad: [(i32, i32); 4]) {
    let rect = [(0.0, 0.0), (99.0, 0.0), (99.0, 149.0), (0.0, 149.0)];
    let quad_f = quad.map(|(x, y)| (x as f32, y as f32));
    let projection = Projection::from_control_points(rect, quad_f).unwrap();
    let mut layer = GrayImage::from_pixel(frame.width(), frame.height(), Luma([0]));
    warp_into(digit, &projection, Interpolation::Bilinear, Luma([0]), &mut layer);
    for (dst, src) in frame.pixels_mut().zip(layer.pixels()) {
        if src[0] > 0 {
            *dst = *src;
        }
    }
}

fn label_line(ordinal: usize, quad: [(i32, i32); 4]) -> String {
    let coords: Vec<String> = quad.iter().map(|(x, y)| format!("{x} {y}")).collect();
    format!("{ordinal} {}", coords.join(" "))
}

#[test]
fn skewed_panel_reads_as_decimal_number() {
    use Segment::*;
    let four = digit(&[B, C, F, G]);
    let noisy_eight = digit(&[A, B, C, D, F, G]);
    let five = digit(&[A, C, D, F, G]);

    // Keystoned cells, as seen from below and to the left.
    let quads = [
        [(30, 40), (118, 30), (122, 190), (26, 200)],
        [(140, 28), (226, 20), (232, 178), (136, 188)],
        [(250, 18), (332, 12), (340, 166), (246, 176)],
    ];
    let mut frame = GrayImage::from_pixel(380, 240, Luma([12]));
    for (img, quad) in [&four, &noisy_eight, &five].into_iter().zip(quads) {
        stamp(&mut frame, img, quad);
    }

    let text: Vec<String> = quads
        .iter()
        .enumerate()
        .map(|(i, q)| label_line(i + 1, *q))
        .collect();
    let regions = parse_labels(&text.join("\n")).unwrap();

    let readings = recognize(&frame, &regions, &ReaderConfig::default());
    let rec = assemble(readings, vec![None; 3], DataType::Numeric1);

    assert_eq!(
        rec.symbols,
        vec![Symbol::Digit(4), Symbol::Digit(8), Symbol::Digit(5)]
    );
    assert_eq!(rec.text, "48.5");
}

#[test]
fn rectified_size_follows_config() {
    let frame = GrayImage::from_pixel(64, 64, Luma([255]));
    let regions = parse_labels("1 5 5 50 8 48 60 4 58").unwrap();
    let cfg = ReaderConfig {
        output_width: 40,
        output_height: 70,
        ..ReaderConfig::default()
    };
    let readings = recognize(&frame, &regions, &cfg);
    assert_eq!(readings[0].rectified.dimensions(), (40, 70));
    assert_eq!(readings[0].analysis.annotated.dimensions(), (40, 70));
    assert_eq!(readings[0].symbol, Symbol::Digit(8));
}
