//! Standard IGES color numbers

use std::fmt;

/// One of the eight predefined IGES colors (or none)
///
/// A Directory Entry color field holds either one of these numbers or a
/// negated pointer to a Color Definition entity (type 314).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorNumber {
    /// No color assigned (0)
    #[default]
    NoColor,
    Black,
    Red,
    Green,
    Blue,
    Yellow,
    Magenta,
    Cyan,
    White,
}

impl ColorNumber {
    /// Create a color from its Directory Entry number
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(ColorNumber::NoColor),
            1 => Some(ColorNumber::Black),
            2 => Some(ColorNumber::Red),
            3 => Some(ColorNumber::Green),
            4 => Some(ColorNumber::Blue),
            5 => Some(ColorNumber::Yellow),
            6 => Some(ColorNumber::Magenta),
            7 => Some(ColorNumber::Cyan),
            8 => Some(ColorNumber::White),
            _ => None,
        }
    }

    /// Get the Directory Entry number
    pub fn index(&self) -> i32 {
        match self {
            ColorNumber::NoColor => 0,
            ColorNumber::Black => 1,
            ColorNumber::Red => 2,
            ColorNumber::Green => 3,
            ColorNumber::Blue => 4,
            ColorNumber::Yellow => 5,
            ColorNumber::Magenta => 6,
            ColorNumber::Cyan => 7,
            ColorNumber::White => 8,
        }
    }

    /// RGB components as percentages (0-100), the unit Color Definition entities use
    pub fn rgb_percent(&self) -> Option<(f64, f64, f64)> {
        match self {
            ColorNumber::NoColor => None,
            ColorNumber::Black => Some((0.0, 0.0, 0.0)),
            ColorNumber::Red => Some((100.0, 0.0, 0.0)),
            ColorNumber::Green => Some((0.0, 100.0, 0.0)),
            ColorNumber::Blue => Some((0.0, 0.0, 100.0)),
            ColorNumber::Yellow => Some((100.0, 100.0, 0.0)),
            ColorNumber::Magenta => Some((100.0, 0.0, 100.0)),
            ColorNumber::Cyan => Some((0.0, 100.0, 100.0)),
            ColorNumber::White => Some((100.0, 100.0, 100.0)),
        }
    }
}

impl fmt::Display for ColorNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
