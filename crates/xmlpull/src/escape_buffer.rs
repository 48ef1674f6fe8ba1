//! Accumulation and decoding of numeric character references.
//!
//! [`CharRefBuffer`] collects the digits of `&#NNN;` or `&#xHHHH;` one at a
//! time and converts them to a [`char`] when the terminating `;` arrives. The
//! value must be a scalar in the XML `Char` production.

use alloc::string::String;

use crate::chars::is_xml_char;

/// Radix of the reference being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Radix {
    Decimal,
    Hex,
}

/// Buffer for the digits of one numeric character reference.
///
/// Digits are kept verbatim so that a rejected reference can be quoted in the
/// error message.
#[derive(Debug)]
pub(crate) struct CharRefBuffer {
    radix: Radix,
    digits: String,
    value: u32,
    overflow: bool,
}

/// Errors carry the reference text (without `&#` and `;`).
pub(crate) type CharRefError = String;

impl CharRefBuffer {
    /// Longest reference text kept for diagnostics.
    const MAX_QUOTED: usize = 16;

    pub(crate) fn new(radix: Radix) -> Self {
        Self {
            radix,
            digits: String::new(),
            value: 0,
            overflow: false,
        }
    }

    /// Feeds one character of the reference body.
    ///
    /// - `Ok(None)`: a digit was accepted.
    /// - `Ok(Some(ch))`: `c` was the closing `;` and the reference decoded.
    /// - `Err`: `c` is not a digit of the radix, the reference is empty, or it
    ///   does not name a legal character.
    pub(crate) fn feed(&mut self, c: char) -> Result<Option<char>, CharRefError> {
        if c == ';' {
            return self.finish().map(Some);
        }
        let base = match self.radix {
            Radix::Decimal => 10,
            Radix::Hex => 16,
        };
        let Some(d) = c.to_digit(base) else {
            self.quote(c);
            return Err(self.quoted());
        };
        self.quote(c);
        match self.value.checked_mul(base).and_then(|v| v.checked_add(d)) {
            Some(v) => self.value = v,
            None => self.overflow = true,
        }
        Ok(None)
    }

    fn finish(&self) -> Result<char, CharRefError> {
        if self.digits.is_empty() || self.overflow {
            return Err(self.quoted());
        }
        char::from_u32(self.value)
            .filter(|&ch| is_xml_char(ch))
            .ok_or_else(|| self.quoted())
    }

    fn quote(&mut self, c: char) {
        if self.digits.len() < Self::MAX_QUOTED {
            self.digits.push(c);
        }
    }

    fn quoted(&self) -> String {
        let mut s = String::with_capacity(self.digits.len() + 1);
        if self.radix == Radix::Hex {
            s.push('x');
        }
        s.push_str(&self.digits);
        s
    }
}
