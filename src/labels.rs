use crate::error::{LabelError, ReadError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Values a label line needs: one ordinal followed by four x/y pairs.
const VALUES_PER_LINE: usize = 9;

/// Longest excerpt of label text quoted back in a parse error.
const PREVIEW_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

/// One digit position on the panel.
///
/// `corners` are expected clockwise from top-left. Nothing checks this:
/// another order silently produces a rotated or mirrored rectification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDescriptor {
    /// Position in input order; decides where the symbol lands in the output.
    pub index: usize,
    /// Leading value of the label line. Carried for reports only.
    pub ordinal: i32,
    pub corners: [Point; 4],
}

/// Parse label text into region descriptors, one per qualifying line.
///
/// Lines with fewer than 9 values are skipped. Values past the ninth are
/// ignored. A token that is not an integer fails the whole parse.
pub fn parse_labels(text: &str) -> Result<Vec<RegionDescriptor>, LabelError> {
    let mut regions = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let values = line
            .split_whitespace()
            .map(|tok| {
                tok.parse::<i32>().map_err(|_| LabelError::InvalidToken {
                    line: line_no + 1,
                    token: tok.to_string(),
                })
            })
            .collect::<Result<Vec<i32>, _>>()?;

        if values.len() < VALUES_PER_LINE {
            if !values.is_empty() {
                debug!(line = line_no + 1, count = values.len(), "skipping short label line");
            }
            continue;
        }

        let corners: [Point; 4] =
            std::array::from_fn(|i| Point::new(values[1 + i * 2], values[2 + i * 2]));

        regions.push(RegionDescriptor {
            index: regions.len(),
            ordinal: values[0],
            corners,
        });
    }

    if regions.is_empty() {
        return Err(LabelError::NoRegions {
            preview: text.trim().chars().take(PREVIEW_CHARS).collect(),
        });
    }
    Ok(regions)
}

/// Resolve a label source: an existing file is read, anything else is
/// taken as the label text itself.
pub fn read_label_source(source: &str) -> Result<String, ReadError> {
    let path = Path::new(source);
    if path.is_file() {
        let text = fs::read_to_string(path).map_err(|e| ReadError::LabelSource {
            path: path.to_path_buf(),
            source: e,
        })?;
        info!(path = %path.display(), "labels read from file");
        Ok(text)
    } else {
        debug!("labels given inline");
        Ok(source.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn single_line_parses_to_four_corners() {
        let regions = parse_labels("1 10 10 110 10 110 160 10 160").unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].index, 0);
        assert_eq!(regions[0].ordinal, 1);
        assert_eq!(
            regions[0].corners,
            [
                Point::new(10, 10),
                Point::new(110, 10),
                Point::new(110, 160),
                Point::new(10, 160),
            ]
        );
    }

    #[test]
    fn short_and_blank_lines_are_skipped() {
        let text = "\n7 1 2 3\n\n2 0 0 5 0 5 9 0 9\r\n1 1 1 6 1 6 9 1 9 99\n";
        let regions = parse_labels(text).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].ordinal, 2);
        assert_eq!(regions[1].ordinal, 1);
        assert_eq!(regions[1].index, 1);
        assert_eq!(regions[1].corners[3], Point::new(1, 9));
    }

    #[test]
    fn input_order_wins_over_ordinal() {
        let regions = parse_labels("9 0 0 1 0 1 1 0 1\n3 2 2 3 2 3 3 2 3").unwrap();
        assert_eq!(regions[0].ordinal, 9);
        assert_eq!(regions[1].ordinal, 3);
    }

    #[test]
    fn nothing_qualifying_is_an_error() {
        let err = parse_labels("1 2 3\n4 5 6 7").unwrap_err();
        assert!(matches!(err, LabelError::NoRegions { .. }));
        assert!(matches!(parse_labels("").unwrap_err(), LabelError::NoRegions { .. }));
    }

    #[test]
    fn non_integer_token_reports_line() {
        let err = parse_labels("1 0 0 1 0 1 1 0 1\n2 0 0 1.5 0 1 1 0 1").unwrap_err();
        assert_eq!(
            err,
            LabelError::InvalidToken {
                line: 2,
                token: "1.5".to_string()
            }
        );
    }

    #[test]
    fn label_source_prefers_existing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1 0 0 10 0 10 10 0 10").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let text = read_label_source(&path).unwrap();
        assert!(text.starts_with("1 0 0 10"));

        let inline = "1 0 0 10 0 10 10 0 10";
        assert_eq!(read_label_source(inline).unwrap(), inline);
    }

    #[test]
    fn unreadable_label_file_is_a_source_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00, 0xc3]).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let err = read_label_source(&path).unwrap_err();
        assert!(matches!(err, ReadError::LabelSource { .. }));
    }
}
