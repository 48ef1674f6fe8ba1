//! The pull engine.
//!
//! Overview
//! - [`XmlParser`] owns a [`Cursor`] over the byte source and advances one
//!   [`Signal`] per call. It never builds a tree; the only state kept across
//!   signals is the stack of open elements, the namespace bindings and the
//!   cached markup classification (the "limit").
//! - Each call first looks at `limit`, the kind of markup that starts at the
//!   cursor. Classifying consumes `<` and the keyword after it (`?`, `/`,
//!   `!--`, `![CDATA[`, `!DOCTYPE`) but never the body, so a caller that has to
//!   stop at a boundary (a data run that ends at a start tag) can put the
//!   classification back and resume with it on the next call.
//! - A self-closing tag is reported as `ElementStart` followed by
//!   `ElementEnd` on the next call. Its scope stays on the stack in between,
//!   flagged `empty`, so `depth()` counts it until its end signal is taken.
//!
//! Phases
//! - `Start`: sniff the encoding, read the XML declaration, skip the prolog up
//!   to the root and emit `Dtd`.
//! - `Prolog`: expect the root start tag.
//! - `Content`: inside the root element.
//! - `Epilog`: after the root closed; only whitespace, comments and PIs may
//!   follow before end of input.
//! - `Finished` / `Failed`: the iterator yields `None`.

mod limit;
mod markup;
mod prolog;
mod text;

use alloc::string::String;
use core::mem;

use tracing::{debug, trace};

pub(crate) use self::limit::Limit;
use crate::{
    cursor::{Cursor, Position},
    encoding::Encoding,
    error::{Construct, ErrorKind, Found, ParserError},
    namespace::{Namespaces, ScopeStack},
    options::ParserOptions,
    signal::Signal,
    source::ByteSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Prolog,
    Content,
    Epilog,
    Finished,
    Failed,
}

/// A streaming, pull-based XML parser.
///
/// `XmlParser` reads one document from a [`ByteSource`] and implements
/// `Iterator` to yield its [`Signal`]s. The first error ends the stream.
///
/// # Examples
///
/// ```rust
/// use xmlpull::{ParserOptions, Signal, XmlParser};
///
/// let doc = b"<?xml version='1.0'?><team name='Red'><player>Ann</player></team>";
/// let mut parser = XmlParser::new(&doc[..], ParserOptions::default());
/// while let Some(signal) = parser.next() {
///     match signal.unwrap() {
///         Signal::ElementStart(tag) => println!("open {}", tag.name),
///         Signal::ElementEnd => println!("close"),
///         Signal::Data(text) => println!("text {text:?}"),
///         Signal::Dtd(_) => {}
///     }
/// }
/// assert!(parser.is_finished());
/// ```
pub struct XmlParser<S> {
    cursor: Cursor<S>,
    options: ParserOptions,
    phase: Phase,

    /// Classification of the markup at the cursor, if already made.
    limit: Option<Limit>,
    /// Position of the `<` that opened the last classified markup.
    markup_start: Position,

    /// One signal of lookahead for [`XmlParser::peek`].
    peeked: Option<Result<Signal, ParserError>>,

    scopes: ScopeStack,
    namespaces: Namespaces,

    /// Scratch buffer for names.
    ident: String,
    /// Accumulated character data (or DOCTYPE text).
    data: String,
    /// The last character offered to `data` under stripping was whitespace.
    last_white: bool,
}

impl<S: ByteSource> XmlParser<S> {
    /// Creates a parser reading from `source`.
    ///
    /// Nothing is read until the first signal is requested.
    pub fn new(source: S, options: ParserOptions) -> Self {
        let encoding = options.encoding.unwrap_or(Encoding::Utf8);
        Self {
            cursor: Cursor::new(source, encoding),
            options,
            phase: Phase::Start,
            limit: None,
            markup_start: Position::START,
            peeked: None,
            scopes: ScopeStack::default(),
            namespaces: Namespaces::new(),
            ident: String::new(),
            data: String::new(),
            last_white: true,
        }
    }

    /// Returns the next signal without consuming it.
    ///
    /// The parser advances internally, so [`XmlParser::position`] and
    /// [`XmlParser::depth`] describe the state after the peeked signal. An
    /// error is returned here and again by the following
    /// [`Iterator::next`].
    pub fn peek(&mut self) -> Option<Result<&Signal, ParserError>> {
        if self.peeked.is_none() {
            self.peeked = self.advance().transpose();
        }
        match self.peeked.as_ref()? {
            Ok(signal) => Some(Ok(signal)),
            Err(e) => Some(Err(e.clone())),
        }
    }

    /// `true` once the root element has closed and the rest of the input
    /// was consumed without error.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished && self.peeked.is_none()
    }

    /// Number of open elements.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.depth()
    }

    /// The encoding currently used to decode the input.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.cursor.encoding()
    }

    /// Position of the next unread character.
    #[must_use]
    pub fn position(&self) -> Position {
        self.cursor.position()
    }

    /// Drives the engine by exactly one signal.
    ///
    /// Returns:
    /// * `Ok(Some(signal))` – one signal ready
    /// * `Ok(None)`         – the document ended cleanly, or failed earlier
    /// * `Err(err)`         – the document is malformed; the parser is now
    ///   failed and yields nothing more
    fn advance(&mut self) -> Result<Option<Signal>, ParserError> {
        match self.step() {
            Ok(Some(signal)) => {
                trace!(?signal, depth = self.scopes.depth(), "signal");
                Ok(Some(signal))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                debug!(error = %err, "parse failed");
                self.phase = Phase::Failed;
                Err(err)
            }
        }
    }

    fn step(&mut self) -> Result<Option<Signal>, ParserError> {
        match self.phase {
            Phase::Finished | Phase::Failed => Ok(None),
            Phase::Start => {
                let dtd = self.start_document()?;
                self.phase = Phase::Prolog;
                Ok(Some(dtd))
            }
            Phase::Prolog => match self.skip_misc()? {
                Limit::StartTag => {
                    self.phase = Phase::Content;
                    self.start_tag().map(Some)
                }
                Limit::Eof => Err(self.cursor.error(ErrorKind::MissingRootElement)),
                Limit::Doctype => Err(self.error_at_markup(ErrorKind::UnexpectedDoctype)),
                _ => Err(self.error_at_markup(ErrorKind::ContentOutsideRoot(Found::Char('<')))),
            },
            Phase::Content => self.content().map(Some),
            Phase::Epilog => match self.skip_misc()? {
                Limit::Eof => {
                    debug!(position = ?self.cursor.position(), "document complete");
                    self.phase = Phase::Finished;
                    Ok(None)
                }
                Limit::Doctype => Err(self.error_at_markup(ErrorKind::UnexpectedDoctype)),
                _ => Err(self.error_at_markup(ErrorKind::ContentOutsideRoot(Found::Char('<')))),
            },
        }
    }

    /// One signal from inside the root element.
    fn content(&mut self) -> Result<Signal, ParserError> {
        if self.scopes.top().is_some_and(|s| s.empty) {
            return Ok(self.close_scope());
        }

        self.data.clear();
        self.last_white = true;
        loop {
            let limit = self.take_limit()?;
            match limit {
                Limit::Text => self.read_data()?,
                Limit::Cdata => self.read_cdata()?,
                Limit::Comment => self.skip_comment()?,
                Limit::ProcessingInstruction => self.processing_instruction()?,
                Limit::Doctype => return Err(self.error_at_markup(ErrorKind::UnexpectedDoctype)),
                Limit::StartTag | Limit::EndTag | Limit::Eof => {
                    if !self.data.is_empty() {
                        self.limit = Some(limit);
                        return Ok(Signal::Data(mem::take(&mut self.data)));
                    }
                    return match limit {
                        Limit::StartTag => self.start_tag(),
                        Limit::EndTag => self.end_tag(),
                        _ => Err(self.cursor.error(ErrorKind::UnexpectedEof(Construct::Element))),
                    };
                }
            }
        }
    }

    /// Pops the innermost scope and reports its end.
    fn close_scope(&mut self) -> Signal {
        if let Some(scope) = self.scopes.pop(&mut self.namespaces) {
            trace!(element = %scope.name, "element closed");
        }
        if self.scopes.is_empty() {
            self.phase = Phase::Epilog;
        }
        Signal::ElementEnd
    }

    fn take_limit(&mut self) -> Result<Limit, ParserError> {
        match self.limit.take() {
            Some(limit) => Ok(limit),
            None => self.classify(),
        }
    }

    /// Skips whitespace, comments and PIs outside the root element and returns
    /// the first other limit.
    fn skip_misc(&mut self) -> Result<Limit, ParserError> {
        loop {
            match self.take_limit()? {
                Limit::Text => self.skip_white_outside_root()?,
                Limit::Comment => self.skip_comment()?,
                Limit::ProcessingInstruction => self.processing_instruction()?,
                other => return Ok(other),
            }
        }
    }

    fn skip_white_outside_root(&mut self) -> Result<(), ParserError> {
        while let Some(c) = self.cursor.peek()? {
            if c == '<' {
                break;
            }
            if !crate::chars::is_white(c) {
                return Err(self.cursor.error(ErrorKind::ContentOutsideRoot(Found::Char(c))));
            }
            self.cursor.advance();
        }
        Ok(())
    }

    /// Skips whitespace; returns whether any was present.
    fn skip_white(&mut self) -> Result<bool, ParserError> {
        let mut skipped = false;
        while let Some(c) = self.cursor.peek()? {
            if !crate::chars::is_white(c) {
                break;
            }
            self.cursor.advance();
            skipped = true;
        }
        Ok(skipped)
    }

    /// Consumes `expected`, or fails naming it.
    fn expect(&mut self, expected: &'static [&'static str], c: char) -> Result<(), ParserError> {
        match self.cursor.peek()? {
            Some(found) if found == c => {
                self.cursor.advance();
                Ok(())
            }
            found => Err(self.cursor.error(ErrorKind::Expected {
                expected,
                found: Found::from(found),
            })),
        }
    }

    /// Consumes the next character, failing at end of input.
    fn next_in(&mut self, construct: Construct) -> Result<char, ParserError> {
        self.cursor
            .next_char()?
            .ok_or_else(|| self.cursor.error(ErrorKind::UnexpectedEof(construct)))
    }

    fn error_at_markup(&self, kind: ErrorKind) -> ParserError {
        ParserError::new(self.markup_start, kind)
    }
}

impl<S: ByteSource> Iterator for XmlParser<S> {
    type Item = Result<Signal, ParserError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.peeked.take() {
            Some(peeked) => Some(peeked),
            None => self.advance().transpose(),
        }
    }
}

impl<S> core::fmt::Debug for XmlParser<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("XmlParser")
            .field("phase", &self.phase)
            .field("limit", &self.limit)
            .field("depth", &self.scopes.depth())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Appends `c` to `buf`, collapsing whitespace when `strip` is set.
///
/// Under stripping a whitespace character only raises `last_white`; the next
/// non-white character then inserts a single space if `buf` already holds
/// text. Leading and trailing whitespace therefore never reach `buf`.
pub(crate) fn push_data(
    buf: &mut String,
    last_white: &mut bool,
    c: char,
    strip: bool,
    max: usize,
) -> Result<(), ErrorKind> {
    if strip {
        if crate::chars::is_white(c) {
            *last_white = true;
            return Ok(());
        }
        if *last_white && !buf.is_empty() {
            push_limited(buf, ' ', max)?;
        }
        *last_white = false;
    }
    push_limited(buf, c, max)
}

/// Appends `c` unless that would grow `buf` past `max` bytes.
pub(crate) fn push_limited(buf: &mut String, c: char, max: usize) -> Result<(), ErrorKind> {
    if buf.len() + c.len_utf8() > max {
        return Err(ErrorKind::BufferLimit(max));
    }
    buf.push(c);
    Ok(())
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;

    fn collapse(input: &str, strip: bool) -> String {
        let mut buf = String::new();
        let mut last_white = true;
        for c in input.chars() {
            push_data(&mut buf, &mut last_white, c, strip, usize::MAX).unwrap();
        }
        buf
    }

    #[test]
    fn stripping_collapses_runs() {
        assert_eq!(collapse("  x   y  ", true), "x y");
        assert_eq!(collapse("\n\tx\ny\t", true), "x y");
        assert_eq!(collapse("   ", true), "");
        assert_eq!(collapse("  x   y  ", false), "  x   y  ");
    }

    #[test]
    fn push_limited_enforces_cap() {
        let mut buf = String::new();
        push_limited(&mut buf, 'a', 2).unwrap();
        assert_eq!(
            push_limited(&mut buf, 'é', 2),
            Err(ErrorKind::BufferLimit(2))
        );
        push_limited(&mut buf, 'b', 2).unwrap();
        assert_eq!(buf, "ab");
    }
}
