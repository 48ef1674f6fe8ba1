//! Encoding detection, the XML declaration, and the markup that is skipped:
//! comments, processing instructions and the document type declaration.

use alloc::string::{String, ToString};
use core::mem;

use tracing::debug;

use super::{Limit, XmlParser, push_limited};
use crate::{
    encoding::{Declared, Encoding},
    error::{Construct, ErrorKind, Found, ParserError},
    signal::Signal,
    source::ByteSource,
};

const DECLARATION_KEYS: &[&str] = &["version", "encoding", "standalone"];

impl<S: ByteSource> XmlParser<S> {
    /// Reads everything before the root element's start tag and returns the
    /// `Dtd` signal.
    pub(super) fn start_document(&mut self) -> Result<Signal, ParserError> {
        let fixed = self.sniff()?;

        match self.take_limit()? {
            Limit::ProcessingInstruction => {
                self.ncname(Construct::ProcessingInstruction)?;
                if self.ident == "xml" {
                    if let Some(label) = self.xml_declaration()? {
                        self.apply_declared_encoding(&label, fixed)?;
                    }
                } else {
                    self.finish_processing_instruction()?;
                }
            }
            other => self.limit = Some(other),
        }

        match self.skip_misc()? {
            Limit::Doctype => {
                let text = self.doctype()?;
                debug!(len = text.len(), "skipped document type declaration");
                Ok(Signal::Dtd(Some(text)))
            }
            other => {
                self.limit = Some(other);
                Ok(Signal::Dtd(None))
            }
        }
    }

    /// Chooses the initial decoder. Returns `true` when the choice is final,
    /// i.e. an `encoding` declaration must not change it.
    fn sniff(&mut self) -> Result<bool, ParserError> {
        if let Some(encoding) = self.options.encoding {
            let head = self.cursor.raw_head(3)?;
            let skip = encoding
                .bom()
                .filter(|bom| head.starts_with(bom))
                .map_or(0, <[u8]>::len);
            self.cursor.skip_raw(skip);
            self.cursor.set_encoding(encoding);
            debug!(%encoding, bom = skip > 0, "encoding set by caller");
            return Ok(true);
        }

        let head = self.cursor.raw_head(3)?;
        match Encoding::sniff_bom(head) {
            Some((encoding, len)) => {
                self.cursor.skip_raw(len);
                self.cursor.set_encoding(encoding);
                debug!(%encoding, "encoding from byte-order mark");
                Ok(true)
            }
            None => {
                debug!("no byte-order mark, decoding as UTF-8");
                Ok(false)
            }
        }
    }

    /// Switches the decoder to the encoding named in the XML declaration.
    fn apply_declared_encoding(&mut self, label: &str, fixed: bool) -> Result<(), ParserError> {
        if self.options.encoding.is_some() {
            debug!(declared = label, "declared encoding ignored");
            return Ok(());
        }
        let declared = Encoding::from_label(label)
            .ok_or_else(|| self.error_at_markup(ErrorKind::UnknownEncoding(label.to_string())))?;
        if fixed {
            debug!(declared = label, "byte-order mark takes precedence");
            return Ok(());
        }
        match declared {
            Declared::Known(encoding) if !encoding.is_utf16() => {
                if encoding != self.cursor.encoding() {
                    debug!(%encoding, "encoding from XML declaration");
                    self.cursor.set_encoding(encoding);
                }
                Ok(())
            }
            _ if self.options.tolerate_utf16_without_bom => {
                debug!(declared = label, "UTF-16 declared without byte-order mark, keeping UTF-8");
                Ok(())
            }
            _ => Err(self.error_at_markup(ErrorKind::Utf16WithoutBom(label.to_string()))),
        }
    }

    /// `<?xml` has been consumed. Returns the `encoding` pseudo-attribute.
    fn xml_declaration(&mut self) -> Result<Option<String>, ParserError> {
        let mut encoding = None;
        loop {
            let spaced = self.skip_white()?;
            match self.cursor.peek()? {
                Some('?') => {
                    self.cursor.advance();
                    self.expect(&["?>"], '>')?;
                    return Ok(encoding);
                }
                None => {
                    return Err(self.cursor.error(ErrorKind::UnexpectedEof(Construct::XmlDeclaration)));
                }
                Some(c) if !spaced => {
                    return Err(self.cursor.error(ErrorKind::Expected {
                        expected: &["?>"],
                        found: Found::Char(c),
                    }));
                }
                Some(c) => {
                    let at = self.cursor.position();
                    self.ncname(Construct::XmlDeclaration)?;
                    let key = self.ident.clone();
                    self.skip_white()?;
                    self.expect(&["="], '=')?;
                    self.skip_white()?;
                    let value = self.literal(Construct::XmlDeclaration)?;
                    match key.as_str() {
                        "encoding" => encoding = Some(value),
                        "version" | "standalone" => {}
                        _ => {
                            return Err(ParserError::new(
                                at,
                                ErrorKind::Expected {
                                    expected: DECLARATION_KEYS,
                                    found: Found::Char(c),
                                },
                            ));
                        }
                    }
                }
            }
        }
    }

    /// A quoted literal taken verbatim.
    fn literal(&mut self, construct: Construct) -> Result<String, ParserError> {
        let quote = match self.cursor.peek()? {
            Some(q @ ('"' | '\'')) => {
                self.cursor.advance();
                q
            }
            found => {
                return Err(self.cursor.error(ErrorKind::Expected {
                    expected: &["\"", "'"],
                    found: Found::from(found),
                }));
            }
        };
        let max = self.options.max_buffer_len;
        let mut value = String::new();
        loop {
            let c = self.next_in(construct)?;
            if c == quote {
                return Ok(value);
            }
            push_limited(&mut value, c, max).map_err(|k| self.cursor.error(k))?;
        }
    }

    /// `<?` has been consumed anywhere but the start of the stream.
    pub(super) fn processing_instruction(&mut self) -> Result<(), ParserError> {
        self.ncname(Construct::ProcessingInstruction)?;
        self.finish_processing_instruction()
    }

    /// The target is in `ident`: reject `xml`, then skip to `?>`.
    fn finish_processing_instruction(&mut self) -> Result<(), ParserError> {
        if self.ident.eq_ignore_ascii_case("xml") {
            return Err(self.error_at_markup(ErrorKind::MisplacedXmlDeclaration));
        }
        let spaced = self.skip_white()?;
        let mut question = false;
        loop {
            let c = self.next_in(Construct::ProcessingInstruction)?;
            match c {
                '>' if question => return Ok(()),
                '?' => question = true,
                c if !spaced => {
                    return Err(self.cursor.error(ErrorKind::Expected {
                        expected: &["?>"],
                        found: Found::Char(c),
                    }));
                }
                _ => question = false,
            }
        }
    }

    /// `<!--` has been consumed.
    pub(super) fn skip_comment(&mut self) -> Result<(), ParserError> {
        loop {
            if self.next_in(Construct::Comment)? != '-' || self.cursor.peek()? != Some('-') {
                continue;
            }
            self.cursor.advance();
            return match self.cursor.peek()? {
                Some('>') => {
                    self.cursor.advance();
                    Ok(())
                }
                None => Err(self.cursor.error(ErrorKind::UnexpectedEof(Construct::Comment))),
                Some(c) => Err(self.cursor.error(ErrorKind::Expected {
                    expected: &["-->"],
                    found: Found::Char(c),
                })),
            };
        }
    }

    /// `<!DOCTYPE` has been consumed. Returns the text between `<!` and the
    /// closing `>`.
    ///
    /// Angle brackets are counted so the internal subset is skipped whole;
    /// brackets inside quoted literals, comments and processing
    /// instructions do not count.
    fn doctype(&mut self) -> Result<String, ParserError> {
        let max = self.options.max_buffer_len;
        self.data.clear();
        self.data.push_str("DOCTYPE");
        let mut depth = 1usize;
        let mut quote = None;
        let mut comment = false;
        let mut pi = false;
        loop {
            let c = self.next_in(Construct::Doctype)?;
            if comment || pi {
                push_limited(&mut self.data, c, max).map_err(|k| self.cursor.error(k))?;
                let close = if comment { "-->" } else { "?>" };
                if self.data.ends_with(close) {
                    comment = false;
                    pi = false;
                    depth -= 1;
                }
                continue;
            }
            if let Some(q) = quote {
                if c == q {
                    quote = None;
                }
            } else {
                match c {
                    '>' => {
                        depth -= 1;
                        if depth == 0 {
                            return Ok(mem::take(&mut self.data));
                        }
                    }
                    '<' => depth += 1,
                    '"' | '\'' => quote = Some(c),
                    '-' if self.data.ends_with("<!-") => comment = true,
                    '?' if self.data.ends_with('<') => pi = true,
                    _ => {}
                }
            }
            push_limited(&mut self.data, c, max).map_err(|k| self.cursor.error(k))?;
        }
    }
}
