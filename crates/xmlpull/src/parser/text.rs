//! Character data, CDATA sections and references.

use alloc::string::String;

use super::{XmlParser, push_data, push_limited};
use crate::{
    chars::{is_name_char, is_name_start},
    cursor::Position,
    error::{Construct, ErrorKind, ParserError},
    escape_buffer::{CharRefBuffer, Radix},
    source::ByteSource,
};

/// Replacement text of the entities every document may use.
static PREDEFINED_ENTITIES: [(&str, char); 5] = [
    ("lt", '<'),
    ("gt", '>'),
    ("amp", '&'),
    ("apos", '\''),
    ("quot", '"'),
];

/// What a reference expands to.
pub(super) enum Expansion {
    Char(char),
    Text(String),
}

impl Expansion {
    pub(super) fn chars(&self) -> impl Iterator<Item = char> + '_ {
        let (single, text) = match self {
            Expansion::Char(c) => (Some(*c), ""),
            Expansion::Text(t) => (None, t.as_str()),
        };
        single.into_iter().chain(text.chars())
    }
}

impl<S: ByteSource> XmlParser<S> {
    /// Appends character data up to the next `<` (or end of input) to
    /// `data`.
    pub(super) fn read_data(&mut self) -> Result<(), ParserError> {
        let strip = self.scopes.strip(self.options.strip_whitespace);
        let max = self.options.max_buffer_len;
        // Consecutive `]` seen, to reject `]]>`.
        let mut brackets = 0usize;
        loop {
            match self.cursor.peek()? {
                None | Some('<') => return Ok(()),
                Some('&') => {
                    brackets = 0;
                    let at = self.cursor.position();
                    self.cursor.advance();
                    let expansion = self.reference(at)?;
                    for c in expansion.chars() {
                        push_data(&mut self.data, &mut self.last_white, c, strip, max)
                            .map_err(|k| self.cursor.error(k))?;
                    }
                }
                Some(c) => {
                    if c == '>' && brackets >= 2 {
                        return Err(self.cursor.error(ErrorKind::IllegalCdataEnd));
                    }
                    brackets = if c == ']' { brackets + 1 } else { 0 };
                    self.cursor.advance();
                    push_data(&mut self.data, &mut self.last_white, c, strip, max)
                        .map_err(|k| self.cursor.error(k))?;
                }
            }
        }
    }

    /// `<![CDATA[` has been consumed: copy everything up to `]]>`.
    pub(super) fn read_cdata(&mut self) -> Result<(), ParserError> {
        let strip = self.scopes.strip(self.options.strip_whitespace);
        let max = self.options.max_buffer_len;
        // `]` held back until it is known not to start `]]>`.
        let mut brackets = 0usize;
        loop {
            match self.next_in(Construct::Cdata)? {
                ']' => brackets += 1,
                '>' if brackets >= 2 => {
                    for _ in 2..brackets {
                        push_data(&mut self.data, &mut self.last_white, ']', strip, max)
                            .map_err(|k| self.cursor.error(k))?;
                    }
                    return Ok(());
                }
                c => {
                    for held in core::iter::repeat_n(']', brackets).chain([c]) {
                        push_data(&mut self.data, &mut self.last_white, held, strip, max)
                            .map_err(|k| self.cursor.error(k))?;
                    }
                    brackets = 0;
                }
            }
        }
    }

    /// `&` has been consumed; `at` is its position. Returns the replacement.
    pub(super) fn reference(&mut self, at: Position) -> Result<Expansion, ParserError> {
        if self.cursor.peek()? == Some('#') {
            self.cursor.advance();
            let radix = if self.cursor.peek()? == Some('x') {
                self.cursor.advance();
                Radix::Hex
            } else {
                Radix::Decimal
            };
            let mut buf = CharRefBuffer::new(radix);
            loop {
                let c = self.next_in(Construct::Reference)?;
                match buf.feed(c) {
                    Ok(None) => {}
                    Ok(Some(ch)) => return Ok(Expansion::Char(ch)),
                    Err(text) => return Err(ParserError::new(at, ErrorKind::IllegalCharRef(text))),
                }
            }
        }

        let max = self.options.max_buffer_len;
        self.ident.clear();
        loop {
            let c = self
                .cursor
                .peek()?
                .ok_or_else(|| self.cursor.error(ErrorKind::UnexpectedEof(Construct::Reference)))?;
            if c == ';' && !self.ident.is_empty() {
                self.cursor.advance();
                break;
            }
            let legal = if self.ident.is_empty() {
                is_name_start(c)
            } else {
                is_name_char(c) || c == ':'
            };
            if !legal {
                return Err(self.cursor.error(ErrorKind::IllegalNameCharacter(c)));
            }
            push_limited(&mut self.ident, c, max).map_err(|k| self.cursor.error(k))?;
            self.cursor.advance();
        }

        if let Some((_, c)) = PREDEFINED_ENTITIES.iter().find(|(name, _)| *name == self.ident) {
            return Ok(Expansion::Char(*c));
        }
        self.options
            .entity_resolver
            .as_ref()
            .and_then(|resolve| resolve(&self.ident))
            .map(Expansion::Text)
            .ok_or_else(|| ParserError::new(at, ErrorKind::UnknownEntity(self.ident.clone())))
    }
}
