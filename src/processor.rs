use crate::config::ReaderConfig;
use crate::error::ReadError;
use crate::format::{format_reading, DataType};
use crate::labels::{parse_labels, read_label_source, Point, RegionDescriptor};
use crate::patterns::{resolve, Symbol};
use crate::rectify::{normalize_corners, rectify};
use crate::segments::{analyze, lit_segments, SegmentAnalysis, SegmentState, Thresholds};
use base64::Engine;
use image::{codecs::png::PngEncoder, GrayImage, ImageEncoder, RgbImage};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Everything computed for one display position.
#[derive(Debug, Clone)]
pub struct PositionReading {
    /// The region as warped (corners re-ordered when normalization is on).
    pub region: RegionDescriptor,
    pub rectified: GrayImage,
    pub analysis: SegmentAnalysis,
    pub symbol: Symbol,
}

/// Result of a full run.
#[derive(Debug, Clone)]
pub struct Recognition {
    /// Final formatted reading.
    pub text: String,
    pub data_type: DataType,
    /// One entry per region, in label order, unrecognized positions included.
    pub symbols: Vec<Symbol>,
    pub readings: Vec<PositionReading>,
    /// Where each annotated image was written; `None` when skipped or failed.
    pub diagnostics: Vec<Option<PathBuf>>,
}

// ── Pure stage ───────────────────────────────────────────────────────────────

/// Rectify, analyze and classify one region.
pub fn read_position(
    gray: &GrayImage,
    region: &RegionDescriptor,
    cfg: &ReaderConfig,
) -> PositionReading {
    let region = if cfg.normalize_corners {
        RegionDescriptor {
            corners: normalize_corners(region.corners),
            ..region.clone()
        }
    } else {
        region.clone()
    };

    let rectified = rectify(gray, &region, cfg.output_width, cfg.output_height);
    let analysis = analyze(&rectified, Thresholds::from(cfg));
    let symbol = resolve(analysis.mask);

    PositionReading {
        region,
        rectified,
        analysis,
        symbol,
    }
}

/// Read every region. Output order always matches `regions`, also when
/// `cfg.parallel` spreads the work over the rayon pool.
pub fn recognize(
    gray: &GrayImage,
    regions: &[RegionDescriptor],
    cfg: &ReaderConfig,
) -> Vec<PositionReading> {
    let readings: Vec<PositionReading> = if cfg.parallel {
        regions
            .par_iter()
            .map(|r| read_position(gray, r, cfg))
            .collect()
    } else {
        regions.iter().map(|r| read_position(gray, r, cfg)).collect()
    };

    for reading in &readings {
        let index = reading.region.index;
        match reading.symbol {
            Symbol::Unrecognized => info!(
                position = index + 1,
                mask = reading.analysis.mask,
                "position not recognized, skipped"
            ),
            symbol => info!(
                position = index + 1,
                mask = reading.analysis.mask,
                segments = %lit_segments(reading.analysis.mask),
                %symbol,
                "position read"
            ),
        }
    }
    readings
}

// ── Side-effect stage ────────────────────────────────────────────────────────

/// `<dir>/<stem>_corrected_<index>_segments.<ext>`
pub fn diagnostic_path(dir: &Path, source: &Path, index: usize, extension: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    dir.join(format!("{stem}_corrected_{index}_segments.{extension}"))
}

/// Write each reading's annotated image. Failures are logged and yield `None`;
/// they never stop the run.
pub fn persist_diagnostics(
    readings: &[PositionReading],
    source: &Path,
    cfg: &ReaderConfig,
) -> Vec<Option<PathBuf>> {
    if !cfg.diagnostics.enabled {
        return vec![None; readings.len()];
    }

    let dir = match &cfg.diagnostics.dir {
        Some(d) => d.clone(),
        None => match source.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        },
    };
    if let Err(e) = fs::create_dir_all(&dir) {
        warn!(dir = %dir.display(), "cannot create diagnostics dir: {e}");
    }

    readings
        .iter()
        .map(|reading| {
            let index = reading.region.index;
            let path = diagnostic_path(&dir, source, index, &cfg.diagnostics.extension);
            match reading.analysis.annotated.save(&path) {
                Ok(()) => {
                    info!(path = %path.display(), "saved segment overlay");
                    Some(path)
                }
                Err(e) => {
                    warn!(path = %path.display(), "cannot save segment overlay: {e}");
                    None
                }
            }
        })
        .collect()
}

// ── Orchestration ────────────────────────────────────────────────────────────

/// Load an image from disk as 8-bit luma.
pub fn load_gray(path: &Path) -> Result<GrayImage, ReadError> {
    let img = image::open(path).map_err(|e| ReadError::Load {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!(path = %path.display(), width = img.width(), height = img.height(), "image loaded");
    Ok(img.to_luma8())
}

/// Read a panel image.
///
/// `label_source` is a path to a label file, or the label text itself when
/// no such file exists. `cfg` is validated first.
pub fn run(
    image_path: &Path,
    label_source: &str,
    data_type: DataType,
    cfg: &ReaderConfig,
) -> Result<Recognition, ReadError> {
    cfg.validate().map_err(ReadError::Settings)?;
    let gray = load_gray(image_path)?;
    let text = read_label_source(label_source)?;
    let regions = parse_labels(&text)?;
    info!(regions = regions.len(), %data_type, "labels parsed");

    let readings = recognize(&gray, &regions, cfg);
    let diagnostics = persist_diagnostics(&readings, image_path, cfg);
    Ok(assemble(readings, diagnostics, data_type))
}

/// Format the readings into the final result.
pub fn assemble(
    readings: Vec<PositionReading>,
    diagnostics: Vec<Option<PathBuf>>,
    data_type: DataType,
) -> Recognition {
    let symbols: Vec<Symbol> = readings.iter().map(|r| r.symbol).collect();
    let text = format_reading(&symbols, data_type);

    let recognized = symbols.iter().filter(|s| s.is_recognized()).count();
    info!(
        recognized,
        skipped = symbols.len() - recognized,
        result = %text,
        "reading complete"
    );

    Recognition {
        text,
        data_type,
        symbols,
        readings,
        diagnostics,
    }
}

// ── Reporting ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PositionReport {
    pub index: usize,
    pub ordinal: i32,
    pub corners: [Point; 4],
    pub mask: u8,
    pub segments: String,
    pub states: [SegmentState; 7],
    pub symbol: Symbol,
    pub diagnostic: Option<PathBuf>,
    /// Base64 PNG of the annotated overlay, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_b64: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub result: String,
    pub data_type: DataType,
    pub positions: Vec<PositionReport>,
}

impl Recognition {
    /// Rectified digit images, in label order.
    pub fn rectified(&self) -> impl Iterator<Item = &GrayImage> + '_ {
        self.readings.iter().map(|r| &r.rectified)
    }

    pub fn report(&self, embed_previews: bool) -> RunReport {
        let positions = self
            .readings
            .iter()
            .enumerate()
            .map(|(i, r)| PositionReport {
                index: r.region.index,
                ordinal: r.region.ordinal,
                corners: r.region.corners,
                mask: r.analysis.mask,
                segments: lit_segments(r.analysis.mask),
                states: r.analysis.states,
                symbol: r.symbol,
                diagnostic: self.diagnostics.get(i).cloned().flatten(),
                preview_b64: if embed_previews {
                    encode_png(&r.analysis.annotated, r.region.index)
                } else {
                    None
                },
            })
            .collect();
        RunReport {
            result: self.text.clone(),
            data_type: self.data_type,
            positions,
        }
    }

    /// One CSV row per position.
    pub fn csv(&self) -> String {
        let mut csv = String::from("index,ordinal,mask,segments,symbol\n");
        for r in &self.readings {
            csv.push_str(&format!(
                "{},{},{},{},{}\n",
                r.region.index,
                r.region.ordinal,
                r.analysis.mask,
                lit_segments(r.analysis.mask),
                r.symbol,
            ));
        }
        csv
    }
}

/// Base64 PNG of `img`; `None` (logged) when encoding fails.
fn encode_png(img: &RgbImage, index: usize) -> Option<String> {
    let mut png = Vec::new();
    let encoded = PngEncoder::new(&mut png).write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgb8,
    );
    match encoded {
        Ok(()) => Some(base64::engine::general_purpose::STANDARD.encode(&png)),
        Err(e) => {
            warn!(index, "cannot encode overlay preview: {e}");
            None
        }
    }
}
