//! Start tags, end tags and attribute values.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use super::{XmlParser, push_data, push_limited};
use crate::{
    chars::{is_name_char, is_name_start},
    cursor::Position,
    error::{Construct, ErrorKind, Found, ParserError},
    namespace::{Namespaces, Scope, XML_NS, XMLNS_NS},
    signal::{Attribute, Name, Signal, Tag},
    source::ByteSource,
};

/// An attribute before namespace expansion.
struct RawAttribute {
    prefix: String,
    local: String,
    value: String,
    position: Position,
}

impl RawAttribute {
    /// The prefix this attribute declares, if it is a namespace declaration.
    fn declared_prefix(&self) -> Option<&str> {
        match (self.prefix.as_str(), self.local.as_str()) {
            ("", "xmlns") => Some(""),
            ("xmlns", local) => Some(local),
            _ => None,
        }
    }
}

impl<S: ByteSource> XmlParser<S> {
    /// Reads an `NCName`, optionally preceded by `prefix:`, into
    /// `(prefix, local)`. The prefix is empty when absent.
    pub(super) fn qname(&mut self, construct: Construct) -> Result<(String, String), ParserError> {
        self.ncname(construct)?;
        if self.cursor.peek()? != Some(':') {
            return Ok((String::new(), self.ident.clone()));
        }
        self.cursor.advance();
        let prefix = self.ident.clone();
        self.ncname(construct)?;
        Ok((prefix, self.ident.clone()))
    }

    /// Reads an `NCName` into `ident`.
    pub(super) fn ncname(&mut self, construct: Construct) -> Result<(), ParserError> {
        self.ident.clear();
        let max = self.options.max_buffer_len;
        match self.cursor.peek()? {
            Some(c) if is_name_start(c) => {}
            Some(c) => return Err(self.cursor.error(ErrorKind::IllegalNameCharacter(c))),
            None => return Err(self.cursor.error(ErrorKind::UnexpectedEof(construct))),
        }
        while let Some(c) = self.cursor.peek()? {
            if !is_name_char(c) {
                break;
            }
            push_limited(&mut self.ident, c, max).map_err(|k| self.cursor.error(k))?;
            self.cursor.advance();
        }
        Ok(())
    }

    /// `<` has been consumed and a name follows.
    pub(super) fn start_tag(&mut self) -> Result<Signal, ParserError> {
        let (prefix, local) = self.qname(Construct::StartTag)?;
        let parent_strip = self.scopes.strip(self.options.strip_whitespace);

        let mut raw = Vec::new();
        let empty = loop {
            let spaced = self.skip_white()?;
            match self.cursor.peek()? {
                Some('>') => {
                    self.cursor.advance();
                    break false;
                }
                Some('/') => {
                    self.cursor.advance();
                    self.expect(&[">"], '>')?;
                    break true;
                }
                None => return Err(self.cursor.error(ErrorKind::UnexpectedEof(Construct::StartTag))),
                Some(c) if !spaced => {
                    return Err(self.cursor.error(ErrorKind::Expected {
                        expected: &[">", "/>"],
                        found: Found::Char(c),
                    }));
                }
                Some(_) => raw.push(self.attribute(parent_strip)?),
            }
        };

        if prefix == "xmlns" {
            return Err(self.error_at_markup(ErrorKind::ReservedPrefix(prefix)));
        }
        let prefixes = self.declare_namespaces(&raw)?;
        let name = self
            .namespaces
            .expand(&prefix, &local, self.options.namespace_fallback.as_ref())
            .map_err(|k| self.error_at_markup(k))?;

        let mut strip = parent_strip;
        let mut attributes: Vec<Attribute> = Vec::with_capacity(raw.len());
        for attr in raw {
            let name = match (attr.prefix.as_str(), attr.declared_prefix()) {
                (_, Some("")) => Name::new(XMLNS_NS, "xmlns"),
                (_, Some(declared)) => Name::new(XMLNS_NS, declared),
                ("", None) => Name::new("", attr.local.as_str()),
                (prefix, None) => self
                    .namespaces
                    .expand(prefix, &attr.local, self.options.namespace_fallback.as_ref())
                    .map_err(|k| ParserError::new(attr.position, k))?,
            };
            if attributes.iter().any(|a| a.name == name) {
                return Err(ParserError::new(
                    attr.position,
                    ErrorKind::DuplicateAttribute(name.to_string()),
                ));
            }
            if name.is(XML_NS, "space") {
                match attr.value.as_str() {
                    "preserve" => strip = false,
                    "default" => strip = parent_strip,
                    _ => {}
                }
            }
            attributes.push(Attribute {
                name,
                value: attr.value,
            });
        }

        self.scopes.push(Scope {
            name: name.clone(),
            qname: qualified(&prefix, local),
            prefixes,
            strip,
            empty,
        });
        Ok(Signal::ElementStart(Tag { name, attributes }))
    }

    /// Applies the `xmlns` declarations of one start tag and returns the
    /// prefixes bound.
    fn declare_namespaces(&mut self, raw: &[RawAttribute]) -> Result<Vec<String>, ParserError> {
        let mut prefixes: Vec<String> = Vec::new();
        for attr in raw {
            let Some(prefix) = attr.declared_prefix() else {
                continue;
            };
            let checked = if prefixes.iter().any(|p| p == prefix) {
                Err(ErrorKind::DuplicateAttribute(if prefix.is_empty() {
                    "xmlns".to_string()
                } else {
                    qualified("xmlns", prefix.to_string())
                }))
            } else {
                Namespaces::check_binding(prefix, &attr.value)
            };
            checked.map_err(|kind| ParserError::new(attr.position, kind))?;
            self.namespaces.bind(prefix, attr.value.clone());
            prefixes.push(prefix.to_string());
        }
        Ok(prefixes)
    }

    /// `name = "value"`, with the cursor on the first character of the name.
    fn attribute(&mut self, strip: bool) -> Result<RawAttribute, ParserError> {
        let position = self.cursor.position();
        let (prefix, local) = self.qname(Construct::StartTag)?;
        self.skip_white()?;
        self.expect(&["="], '=')?;
        self.skip_white()?;
        let value = self.attribute_value(strip)?;
        Ok(RawAttribute {
            prefix,
            local,
            value,
            position,
        })
    }

    /// A quoted attribute value with references expanded.
    fn attribute_value(&mut self, strip: bool) -> Result<String, ParserError> {
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
        let mut last_white = true;
        loop {
            let c = self
                .cursor
                .peek()?
                .ok_or_else(|| self.cursor.error(ErrorKind::UnexpectedEof(Construct::AttributeValue)))?;
            if c == quote {
                self.cursor.advance();
                return Ok(value);
            }
            match c {
                '<' => return Err(self.cursor.error(ErrorKind::IllegalCharacter('<'))),
                '&' => {
                    let at = self.cursor.position();
                    self.cursor.advance();
                    let expansion = self.reference(at)?;
                    for c in expansion.chars() {
                        push_data(&mut value, &mut last_white, c, strip, max)
                            .map_err(|k| self.cursor.error(k))?;
                    }
                }
                c => {
                    self.cursor.advance();
                    push_data(&mut value, &mut last_white, c, strip, max)
                        .map_err(|k| self.cursor.error(k))?;
                }
            }
        }
    }

    /// `</` has been consumed.
    pub(super) fn end_tag(&mut self) -> Result<Signal, ParserError> {
        let (prefix, local) = self.qname(Construct::EndTag)?;
        self.skip_white()?;
        self.expect(&[">"], '>')?;

        let Some(open) = self.scopes.top() else {
            debug_assert!(false, "end tag outside the root element");
            return Err(self.error_at_markup(ErrorKind::ContentOutsideRoot(Found::Char('<'))));
        };
        let found = qualified(&prefix, local);
        if open.qname != found {
            return Err(self.error_at_markup(ErrorKind::MismatchedEndTag {
                expected: open.qname.clone(),
                found,
            }));
        }
        Ok(self.close_scope())
    }
}

/// `prefix:local`, or `local` alone when the prefix is empty.
fn qualified(prefix: &str, local: String) -> String {
    if prefix.is_empty() {
        return local;
    }
    let mut q = String::with_capacity(prefix.len() + 1 + local.len());
    q.push_str(prefix);
    q.push(':');
    q.push_str(&local);
    q
}
