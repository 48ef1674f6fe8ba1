//! Byte to scalar-value decoding.
//!
//! Every decoder works on the unread tail of the input and reports one of
//! three outcomes: a decoded scalar together with the number of bytes it
//! occupied, a request for more bytes, or a malformed sequence together with
//! the number of bytes that were rejected. Telling "need more" apart from
//! "malformed" is what lets the cursor decode across chunk boundaries.

use core::fmt;

/// Character encodings the parser can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Encoding {
    /// UTF-8, the default when nothing else is known.
    Utf8,
    /// Big-endian UTF-16.
    Utf16Be,
    /// Little-endian UTF-16.
    Utf16Le,
    /// ISO-8859-1 (Latin-1): every byte is its own code point.
    Iso8859_1,
    /// ISO-8859-15 (Latin-9): Latin-1 with eight euro-era replacements.
    Iso8859_15,
    /// 7-bit US-ASCII.
    UsAscii,
    /// Raw bytes mapped one-to-one to `U+0000..=U+00FF`.
    Bytes,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16Be => "UTF-16BE",
            Encoding::Utf16Le => "UTF-16LE",
            Encoding::Iso8859_1 => "ISO-8859-1",
            Encoding::Iso8859_15 => "ISO-8859-15",
            Encoding::UsAscii => "US-ASCII",
            Encoding::Bytes => "raw byte",
        })
    }
}

/// How a label from an `encoding="..."` pseudo-attribute maps onto a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Declared {
    Known(Encoding),
    /// Plain `UTF-16`: the byte order must come from a byte-order mark.
    Utf16,
}

impl Encoding {
    /// Looks up an encoding label, ignoring ASCII case.
    pub(crate) fn from_label(label: &str) -> Option<Declared> {
        const LABELS: &[(&str, Declared)] = &[
            ("utf-8", Declared::Known(Encoding::Utf8)),
            ("utf8", Declared::Known(Encoding::Utf8)),
            ("utf-16", Declared::Utf16),
            ("utf16", Declared::Utf16),
            ("utf-16be", Declared::Known(Encoding::Utf16Be)),
            ("utf-16le", Declared::Known(Encoding::Utf16Le)),
            ("iso-8859-1", Declared::Known(Encoding::Iso8859_1)),
            ("iso_8859-1", Declared::Known(Encoding::Iso8859_1)),
            ("latin1", Declared::Known(Encoding::Iso8859_1)),
            ("iso-8859-15", Declared::Known(Encoding::Iso8859_15)),
            ("iso_8859-15", Declared::Known(Encoding::Iso8859_15)),
            ("latin9", Declared::Known(Encoding::Iso8859_15)),
            ("us-ascii", Declared::Known(Encoding::UsAscii)),
            ("ascii", Declared::Known(Encoding::UsAscii)),
        ];
        LABELS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(label))
            .map(|(_, declared)| *declared)
    }

    /// The byte-order mark for this encoding, if it has one.
    pub(crate) fn bom(self) -> Option<&'static [u8]> {
        match self {
            Encoding::Utf8 => Some(&[0xEF, 0xBB, 0xBF]),
            Encoding::Utf16Be => Some(&[0xFE, 0xFF]),
            Encoding::Utf16Le => Some(&[0xFF, 0xFE]),
            _ => None,
        }
    }

    pub(crate) fn is_utf16(self) -> bool {
        matches!(self, Encoding::Utf16Be | Encoding::Utf16Le)
    }

    /// Detects a byte-order mark at the start of `head`.
    ///
    /// Returns the encoding together with the length of the mark.
    pub(crate) fn sniff_bom(head: &[u8]) -> Option<(Encoding, usize)> {
        match head {
            [0xFE, 0xFF, ..] => Some((Encoding::Utf16Be, 2)),
            [0xFF, 0xFE, ..] => Some((Encoding::Utf16Le, 2)),
            [0xEF, 0xBB, 0xBF, ..] => Some((Encoding::Utf8, 3)),
            _ => None,
        }
    }

    /// Decodes the scalar at the start of `bytes`.
    pub(crate) fn decode(self, bytes: &[u8]) -> Decoded {
        match self {
            Encoding::Utf8 => decode_utf8(bytes),
            Encoding::Utf16Be => decode_utf16(bytes, u16::from_be_bytes),
            Encoding::Utf16Le => decode_utf16(bytes, u16::from_le_bytes),
            Encoding::Iso8859_1 | Encoding::Bytes => match bytes.first() {
                Some(&b) => Decoded::Char(char::from(b), 1),
                None => Decoded::NeedMore,
            },
            Encoding::Iso8859_15 => match bytes.first() {
                Some(&b) => Decoded::Char(latin9(b), 1),
                None => Decoded::NeedMore,
            },
            Encoding::UsAscii => match bytes.first() {
                Some(&b) if b < 0x80 => Decoded::Char(char::from(b), 1),
                Some(_) => Decoded::Malformed(1),
                None => Decoded::NeedMore,
            },
        }
    }
}

/// Result of decoding one scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decoded {
    /// A scalar and the number of bytes it used.
    Char(char, usize),
    /// The bytes seen so far are a valid prefix; more are required.
    NeedMore,
    /// The first `n` bytes, up to and including the offending one, do not
    /// form a valid sequence.
    Malformed(usize),
}

fn latin9(b: u8) -> char {
    match b {
        0xA4 => '\u{20AC}',
        0xA6 => '\u{0160}',
        0xA8 => '\u{0161}',
        0xB4 => '\u{017D}',
        0xB8 => '\u{017E}',
        0xBC => '\u{0152}',
        0xBD => '\u{0153}',
        0xBE => '\u{0178}',
        b => char::from(b),
    }
}

fn decode_utf8(bytes: &[u8]) -> Decoded {
    let Some(&lead) = bytes.first() else {
        return Decoded::NeedMore;
    };
    // The first continuation byte is bounded per lead byte; this rejects
    // overlong forms and the surrogate range without a second pass.
    let (len, first_range) = match lead {
        0x00..=0x7F => return Decoded::Char(char::from(lead), 1),
        0xC2..=0xDF => (2, 0x80..=0xBF),
        0xE0 => (3, 0xA0..=0xBF),
        0xE1..=0xEC | 0xEE..=0xEF => (3, 0x80..=0xBF),
        0xED => (3, 0x80..=0x9F),
        0xF0 => (4, 0x90..=0xBF),
        0xF1..=0xF3 => (4, 0x80..=0xBF),
        0xF4 => (4, 0x80..=0x8F),
        _ => return Decoded::Malformed(1),
    };

    let mut scalar = u32::from(lead) & (0x7F >> len);
    for i in 1..len {
        let Some(&b) = bytes.get(i) else {
            return Decoded::NeedMore;
        };
        let valid = if i == 1 {
            first_range.contains(&b)
        } else {
            b & 0xC0 == 0x80
        };
        if !valid {
            return Decoded::Malformed(i + 1);
        }
        scalar = (scalar << 6) | u32::from(b & 0x3F);
    }

    match char::from_u32(scalar) {
        Some(c) => Decoded::Char(c, len),
        None => Decoded::Malformed(len),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Decoded {
    let &[a, b, ..] = bytes else {
        return Decoded::NeedMore;
    };
    let hi = unit([a, b]);
    match hi {
        0xD800..=0xDBFF => {
            let &[_, _, c, d, ..] = bytes else {
                return Decoded::NeedMore;
            };
            let lo = unit([c, d]);
            if !(0xDC00..=0xDFFF).contains(&lo) {
                return Decoded::Malformed(4);
            }
            let scalar = ((u32::from(hi & 0x3FF) << 10) | u32::from(lo & 0x3FF)) + 0x1_0000;
            match char::from_u32(scalar) {
                Some(c) => Decoded::Char(c, 4),
                None => Decoded::Malformed(4),
            }
        }
        0xDC00..=0xDFFF => Decoded::Malformed(2),
        _ => match char::from_u32(u32::from(hi)) {
            Some(c) => Decoded::Char(c, 2),
            None => Decoded::Malformed(2),
        },
    }
}
