use crate::patterns::Symbol;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Returned whenever no position was recognized, whatever the data type.
pub const RECOGNITION_FAILED: &str = "recognition failed";

/// How the per-position symbols are joined into the final reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataType {
    Letters,
    #[serde(rename = "numeric-1-decimal")]
    Numeric1,
    #[serde(rename = "numeric-2-decimal")]
    Numeric2,
    /// Fallback for any selector not listed above.
    #[default]
    Plain,
}

impl FromStr for DataType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "letters" => DataType::Letters,
            "numeric-1-decimal" => DataType::Numeric1,
            "numeric-2-decimal" => DataType::Numeric2,
            _ => DataType::Plain,
        })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataType::Letters => "letters",
            DataType::Numeric1 => "numeric-1-decimal",
            DataType::Numeric2 => "numeric-2-decimal",
            DataType::Plain => "plain",
        })
    }
}

/// Assemble the final reading from the ordered per-position symbols.
///
/// Unrecognized positions are dropped first. In the numeric modes only
/// `Symbol::Digit` entries contribute digits; a letter in a numeric reading
/// is dropped from the integer part and turns a lone decimal place into `0`.
pub fn format_reading(symbols: &[Symbol], data_type: DataType) -> String {
    let valid: Vec<Symbol> = symbols
        .iter()
        .copied()
        .filter(Symbol::is_recognized)
        .collect();

    if valid.is_empty() {
        return RECOGNITION_FAILED.to_string();
    }

    match data_type {
        DataType::Letters | DataType::Plain => concat_all(&valid),
        DataType::Numeric1 => match valid.len() {
            1 => format!("0.{}", digit_or_zero(valid[0])),
            n => format!(
                "{}.{}",
                concat_digits(&valid[..n - 1]),
                digit_or_zero(valid[n - 1])
            ),
        },
        DataType::Numeric2 => match valid.len() {
            1 => match valid[0] {
                Symbol::Digit(d) => format!("0.0{d}"),
                _ => "0.00".to_string(),
            },
            2 => format!("0.{}", concat_digits(&valid)),
            n => format!(
                "{}.{}",
                concat_digits(&valid[..n - 2]),
                concat_digits(&valid[n - 2..])
            ),
        },
    }
}

fn concat_all(symbols: &[Symbol]) -> String {
    symbols.iter().map(Symbol::to_string).collect()
}

fn concat_digits(symbols: &[Symbol]) -> String {
    symbols
        .iter()
        .filter_map(|s| match s {
            Symbol::Digit(d) => char::from_digit(u32::from(*d), 10),
            _ => None,
        })
        .collect()
}

fn digit_or_zero(symbol: Symbol) -> char {
    match symbol {
        Symbol::Digit(d) => char::from_digit(u32::from(d), 10).unwrap_or('0'),
        _ => '0',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::Symbol::{Digit, Letter, Unrecognized};

    #[test]
    fn selector_strings() {
        assert_eq!("letters".parse::<DataType>().unwrap(), DataType::Letters);
        assert_eq!("numeric-1-decimal".parse::<DataType>().unwrap(), DataType::Numeric1);
        assert_eq!("numeric-2-decimal".parse::<DataType>().unwrap(), DataType::Numeric2);
        assert_eq!("hex".parse::<DataType>().unwrap(), DataType::Plain);
        assert_eq!("".parse::<DataType>().unwrap(), DataType::Plain);
    }

    #[test]
    fn two_decimals() {
        let s = [Digit(3), Digit(4), Digit(5)];
        assert_eq!(format_reading(&s, DataType::Numeric2), "3.45");
        assert_eq!(format_reading(&[Digit(4), Digit(5)], DataType::Numeric2), "0.45");
        assert_eq!(format_reading(&[Digit(5)], DataType::Numeric2), "0.05");
        assert_eq!(
            format_reading(&[Digit(1), Digit(2), Digit(3), Digit(4)], DataType::Numeric2),
            "12.34"
        );
    }

    #[test]
    fn one_decimal_skips_unrecognized() {
        let s = [Unrecognized, Digit(2), Digit(7)];
        assert_eq!(format_reading(&s, DataType::Numeric1), "2.7");
        assert_eq!(format_reading(&[Digit(9)], DataType::Numeric1), "0.9");
        assert_eq!(
            format_reading(&[Digit(1), Digit(0), Digit(0)], DataType::Numeric1),
            "10.0"
        );
    }

    #[test]
    fn all_unrecognized_is_failure_for_every_mode() {
        let s = [Unrecognized, Unrecognized];
        for dt in [
            DataType::Letters,
            DataType::Numeric1,
            DataType::Numeric2,
            DataType::Plain,
        ] {
            assert_eq!(format_reading(&s, dt), RECOGNITION_FAILED);
        }
        assert_eq!(format_reading(&[], DataType::Numeric2), RECOGNITION_FAILED);
    }

    #[test]
    fn letters_and_plain_concatenate_everything() {
        let s = [Letter('h'), Unrecognized, Digit(1)];
        assert_eq!(format_reading(&s, DataType::Letters), "h1");
        assert_eq!(format_reading(&s, DataType::Plain), "h1");
    }

    #[test]
    fn letters_are_dropped_from_numeric_modes() {
        let s = [Digit(1), Letter('e'), Digit(2), Digit(3)];
        assert_eq!(format_reading(&s, DataType::Numeric1), "12.3");
        assert_eq!(format_reading(&s, DataType::Numeric2), "1.23");
        assert_eq!(format_reading(&[Digit(4), Letter('c')], DataType::Numeric1), "4.0");
        assert_eq!(format_reading(&[Letter('c')], DataType::Numeric1), "0.0");
        assert_eq!(format_reading(&[Letter('c')], DataType::Numeric2), "0.00");
        assert_eq!(format_reading(&[Letter('c'), Digit(7)], DataType::Numeric2), "0.7");
    }

    #[test]
    fn sentinel_position_does_not_matter() {
        let a = [Unrecognized, Digit(1), Digit(2), Digit(3)];
        let b = [Digit(1), Unrecognized, Digit(2), Unrecognized, Digit(3)];
        for dt in [DataType::Numeric1, DataType::Numeric2, DataType::Plain] {
            assert_eq!(format_reading(&a, dt), format_reading(&b, dt));
        }
    }
}
