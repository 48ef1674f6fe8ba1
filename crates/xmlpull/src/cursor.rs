//! The character cursor: decoded scalars with positions.
//!
//! Sits between the raw [`Input`] and the grammar. It decodes one scalar at a
//! time with the active [`Encoding`], folds `CR` and `CR LF` into a single
//! `LF`, rejects anything outside the XML `Char` production and keeps the
//! line/column of the next unread character.

use bstr::BString;

use crate::{
    chars::is_xml_char,
    encoding::{Decoded, Encoding},
    error::{ErrorKind, ParserError},
    source::{ByteSource, Input},
};

/// A location in the decoded character stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
}

impl Position {
    pub(crate) const START: Position = Position { line: 1, column: 1 };
}

#[derive(Debug, Clone, Copy)]
struct Peeked {
    ch: char,
    len: usize,
    /// The scalar was a `CR` reported as `LF`.
    cr: bool,
}

pub(crate) struct Cursor<S> {
    input: Input<S>,
    encoding: Encoding,
    peeked: Option<Peeked>,
    /// The last consumed scalar was a `CR`; a directly following `LF` is
    /// dropped.
    cr_pending: bool,
    position: Position,
}

impl<S: ByteSource> Cursor<S> {
    pub(crate) fn new(source: S, encoding: Encoding) -> Self {
        Self {
            input: Input::new(source),
            encoding,
            peeked: None,
            cr_pending: false,
            position: Position::START,
        }
    }

    #[inline]
    pub(crate) fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Switches the decoder. Any scalar that was peeked but not consumed is
    /// decoded again with the new encoding.
    pub(crate) fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = encoding;
        self.peeked = None;
    }

    /// Raw access to the first `n` undecoded bytes, used for sniffing before
    /// any character has been read.
    pub(crate) fn raw_head(&mut self, n: usize) -> Result<&[u8], ParserError> {
        debug_assert!(self.peeked.is_none());
        self.input.ensure(n).map_err(|e| self.error(ErrorKind::Source(e.0)))?;
        Ok(self.input.unread())
    }

    /// Drops `n` raw bytes (a byte-order mark).
    pub(crate) fn skip_raw(&mut self, n: usize) {
        debug_assert!(self.peeked.is_none());
        self.input.consume(n);
    }

    /// The next character, without consuming it. `None` at end of input.
    ///
    /// # Errors
    ///
    /// Malformed or truncated byte sequences, scalars outside `Char` and
    /// byte-source failures.
    #[inline]
    pub(crate) fn peek(&mut self) -> Result<Option<char>, ParserError> {
        if let Some(p) = self.peeked {
            return Ok(Some(p.ch));
        }
        self.decode_next()
    }

    fn decode_next(&mut self) -> Result<Option<char>, ParserError> {
        loop {
            match self.encoding.decode(self.input.unread()) {
                Decoded::Char(ch, len) => {
                    if self.cr_pending {
                        self.cr_pending = false;
                        if ch == '\n' {
                            self.input.consume(len);
                            continue;
                        }
                    }
                    if !is_xml_char(ch) {
                        return Err(self.error(ErrorKind::IllegalCharacter(ch)));
                    }
                    let peeked = if ch == '\r' {
                        Peeked { ch: '\n', len, cr: true }
                    } else {
                        Peeked { ch, len, cr: false }
                    };
                    self.peeked = Some(peeked);
                    return Ok(Some(peeked.ch));
                }
                Decoded::NeedMore => {
                    let more = self
                        .input
                        .refill()
                        .map_err(|e| self.error(ErrorKind::Source(e.0)))?;
                    if more {
                        continue;
                    }
                    if self.input.unread().is_empty() {
                        return Ok(None);
                    }
                    return Err(self.error(ErrorKind::TruncatedSequence(self.encoding)));
                }
                Decoded::Malformed(n) => {
                    let unread = self.input.unread();
                    let bytes = BString::from(&unread[..n.min(unread.len())]);
                    return Err(self.error(ErrorKind::MalformedSequence {
                        encoding: self.encoding,
                        bytes,
                    }));
                }
            }
        }
    }

    /// Consumes the character returned by the last [`Cursor::peek`].
    #[inline]
    pub(crate) fn advance(&mut self) {
        let Some(p) = self.peeked.take() else {
            debug_assert!(false, "advance without peek");
            return;
        };
        self.input.consume(p.len);
        self.cr_pending = p.cr;
        if p.ch == '\n' {
            self.position.line += 1;
            self.position.column = 1;
        } else {
            self.position.column += 1;
        }
    }

    /// Peeks and consumes one character.
    #[inline]
    pub(crate) fn next_char(&mut self) -> Result<Option<char>, ParserError> {
        let c = self.peek()?;
        if c.is_some() {
            self.advance();
        }
        Ok(c)
    }

    pub(crate) fn error(&self, kind: ErrorKind) -> ParserError {
        ParserError::new(self.position, kind)
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec::Vec};

    use super::*;
    use crate::source::Chunks;

    fn drain<S: ByteSource>(cursor: &mut Cursor<S>) -> Result<String, ParserError> {
        let mut out = String::new();
        while let Some(c) = cursor.next_char()? {
            out.push(c);
        }
        Ok(out)
    }

    #[test]
    fn line_endings_are_normalized() {
        let mut cursor = Cursor::new(&b"a\r\nb\rc\n\rd"[..], Encoding::Utf8);
        assert_eq!(drain(&mut cursor).unwrap(), "a\nb\nc\n\nd");
        assert_eq!(cursor.position(), Position { line: 5, column: 2 });
    }

    #[test]
    fn crlf_split_across_chunks() {
        let mut cursor = Cursor::new(Chunks::new([&b"a\r"[..], &b"\nb"[..]]), Encoding::Utf8);
        assert_eq!(drain(&mut cursor).unwrap(), "a\nb");
    }

    #[test]
    fn multibyte_split_across_chunks() {
        let bytes = "x€y".as_bytes();
        let chunks: Vec<&[u8]> = bytes.chunks(1).collect();
        let mut cursor = Cursor::new(Chunks::new(chunks), Encoding::Utf8);
        assert_eq!(drain(&mut cursor).unwrap(), "x€y");
        assert_eq!(cursor.position(), Position { line: 1, column: 4 });
    }

    #[test]
    fn malformed_byte_reports_its_position() {
        let mut cursor = Cursor::new(&b"ab\n\x80"[..], Encoding::Utf8);
        let err = drain(&mut cursor).unwrap_err();
        assert_eq!(err.position(), Position { line: 2, column: 1 });
        assert!(matches!(err.kind, ErrorKind::MalformedSequence { .. }));
    }

    #[test]
    fn truncated_sequence_at_end() {
        let mut cursor = Cursor::new(&b"a\xE2\x82"[..], Encoding::Utf8);
        let err = drain(&mut cursor).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TruncatedSequence(Encoding::Utf8));
    }

    #[test]
    fn control_characters_are_rejected() {
        let mut cursor = Cursor::new(&b"a\x01"[..], Encoding::Utf8);
        let err = drain(&mut cursor).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IllegalCharacter('\u{1}'));
        assert_eq!(err.column, 2);
    }

    #[test]
    fn switching_encoding_redecodes_peeked() {
        let mut cursor = Cursor::new(&b"a\xE9"[..], Encoding::Utf8);
        assert_eq!(cursor.next_char().unwrap(), Some('a'));
        cursor.set_encoding(Encoding::Iso8859_1);
        assert_eq!(cursor.next_char().unwrap(), Some('é'));
        assert_eq!(cursor.next_char().unwrap(), None);
    }
}
