use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Number of distinct 7-bit segment masks.
pub const MASK_COUNT: usize = 128;

/// What one display position was read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbol {
    Digit(u8),
    Letter(char),
    Unrecognized,
}

impl Symbol {
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Symbol::Unrecognized)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Digit(d) => write!(f, "{d}"),
            Symbol::Letter(c) => write!(f, "{c}"),
            Symbol::Unrecognized => f.write_str("?"),
        }
    }
}

// Bit i is segment i, a = bit 0 … g = bit 6.
//
// Entries are applied in order; a later entry for the same mask replaces an
// earlier one. 110 and 111 are noisy variants of 4 and 8.
const DIGIT_PATTERNS: &[(u8, u8)] = &[
    (63, 0),
    (6, 1),
    (91, 2),
    (79, 3),
    (102, 4),
    (110, 4),
    (109, 5),
    (125, 6),
    (7, 7),
    (127, 8),
    (111, 8),
    (103, 9),
];

// Several masks appear twice (28, 118) and only the later letter survives.
// 91, 109 and 110 are shadowed by digits at lookup time.
const LETTER_PATTERNS: &[(u8, char)] = &[
    (119, 'a'),
    (124, 'b'),
    (57, 'c'),
    (94, 'd'),
    (121, 'e'),
    (113, 'f'),
    (61, 'g'),
    (116, 'h'),
    (118, 'h'),
    (4, 'i'),
    (14, 'j'),
    (30, 'j'),
    (56, 'l'),
    (84, 'n'),
    (92, 'o'),
    (115, 'p'),
    (67, 'q'),
    (80, 'r'),
    (109, 's'),
    (120, 't'),
    (28, 'u'),
    (62, 'u'),
    (28, 'v'),
    (42, 'w'),
    (118, 'x'),
    (110, 'y'),
    (91, 'z'),
];

/// Immutable mask → symbol lookup, digits taking priority over letters.
pub struct PatternTable {
    digits: [Option<u8>; MASK_COUNT],
    letters: [Option<char>; MASK_COUNT],
}

impl PatternTable {
    fn build() -> Self {
        let mut digits = [None; MASK_COUNT];
        for &(mask, digit) in DIGIT_PATTERNS {
            digits[usize::from(mask & 0x7f)] = Some(digit);
        }
        let mut letters = [None; MASK_COUNT];
        for &(mask, letter) in LETTER_PATTERNS {
            letters[usize::from(mask & 0x7f)] = Some(letter);
        }
        PatternTable { digits, letters }
    }

    pub fn resolve(&self, mask: u8) -> Symbol {
        let idx = usize::from(mask & 0x7f);
        if let Some(d) = self.digits[idx] {
            Symbol::Digit(d)
        } else if let Some(c) = self.letters[idx] {
            Symbol::Letter(c)
        } else {
            Symbol::Unrecognized
        }
    }

    /// Every mask that resolves, ascending.
    pub fn entries(&self) -> impl Iterator<Item = (u8, Symbol)> + '_ {
        (0..MASK_COUNT as u8)
            .map(|m| (m, self.resolve(m)))
            .filter(|(_, s)| s.is_recognized())
    }
}

static TABLE: LazyLock<PatternTable> = LazyLock::new(PatternTable::build);

/// Shared process-wide table.
pub fn table() -> &'static PatternTable {
    &TABLE
}

/// Classify a segment mask. Bits above bit 6 are ignored.
pub fn resolve(mask: u8) -> Symbol {
    TABLE.resolve(mask)
}

/// The first mask listed for `letter`, used to draw zone labels.
pub fn letter_mask(letter: char) -> Option<u8> {
    LETTER_PATTERNS
        .iter()
        .find(|&&(_, c)| c == letter)
        .map(|&(mask, _)| mask)
}
