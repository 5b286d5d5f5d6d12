//! 7-segment glyph encoding.
//!
//! Mask layout (8 bits, shifted out MSB first):
//! ```text
//! Bit 7: a (top)          Bit 3: e (lower left)
//! Bit 6: b (upper right)  Bit 2: f (upper left)
//! Bit 5: c (lower right)  Bit 1: g (middle)
//! Bit 4: d (bottom)       Bit 0: dp (decimal point)
//!
//!      a
//!    f   b
//!      g
//!    e   c
//!      d   dp
//! ```

/// Segment mask for one digit position.
pub type SegmentMask = u8;

/// Every symbol the two digits can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Glyph {
    D0 = 0,
    D1 = 1,
    D2 = 2,
    D3 = 3,
    D4 = 4,
    D5 = 5,
    D6 = 6,
    D7 = 7,
    D8 = 8,
    D9 = 9,
    Blank = 10,
    L = 11,
    LeftBracket = 12,
    RightBracket = 13,
    Error = 14,
    A = 15,
}

/// Segment masks indexed by raw glyph identifier.
const SEGMENTS: [SegmentMask; 16] = [
    0b1111_1100, // 0
    0b0110_0000, // 1
    0b1101_1010, // 2
    0b1111_0010, // 3
    0b0110_0110, // 4
    0b1011_0110, // 5
    0b1011_1110, // 6
    0b1110_0000, // 7
    0b1111_1110, // 8
    0b1111_0110, // 9
    0b0000_0000, // blank
    0b0001_1100, // L
    0b1001_1100, // [
    0b1111_0000, // ]
    0b1001_1110, // E
    0b1110_1110, // A
];

impl Glyph {
    /// Glyph for a decimal digit. Anything above 9 is [`Glyph::Error`].
    pub const fn digit(value: u8) -> Self {
        match value {
            0 => Glyph::D0,
            1 => Glyph::D1,
            2 => Glyph::D2,
            3 => Glyph::D3,
            4 => Glyph::D4,
            5 => Glyph::D5,
            6 => Glyph::D6,
            7 => Glyph::D7,
            8 => Glyph::D8,
            9 => Glyph::D9,
            _ => Glyph::Error,
        }
    }

    /// Glyph for a raw identifier, clamped to [`Glyph::Error`] when out of range.
    pub const fn from_id(id: u8) -> Self {
        match id {
            0..=9 => Self::digit(id),
            10 => Glyph::Blank,
            11 => Glyph::L,
            12 => Glyph::LeftBracket,
            13 => Glyph::RightBracket,
            15 => Glyph::A,
            _ => Glyph::Error,
        }
    }

    pub const fn id(self) -> u8 {
        self as u8
    }

    pub const fn segments(self) -> SegmentMask {
        SEGMENTS[self as usize]
    }
}

/// Encode a raw glyph identifier straight to its segment mask.
pub const fn encode(id: u8) -> SegmentMask {
    Glyph::from_id(id).segments()
}
