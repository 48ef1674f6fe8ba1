use alloc::{
    format,
    string::{String, ToString},
};
use core::fmt;

use bstr::BString;
use thiserror::Error;

use crate::{cursor::Position, encoding::Encoding};

/// Error returned by the parser. The first error is terminal.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} at {line}:{column}")]
pub struct ParserError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// 1-based line of the offending input.
    pub line: usize,
    /// 1-based column of the offending input.
    pub column: usize,
}

impl ParserError {
    pub(crate) fn new(position: Position, kind: ErrorKind) -> Self {
        Self {
            kind,
            line: position.line,
            column: position.column,
        }
    }

    /// The position the error was reported at.
    #[must_use]
    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }
}

/// Renders a position and an error kind as one human readable message.
#[must_use]
pub fn format_error(position: Position, kind: &ErrorKind) -> String {
    format!("{kind} at {}:{}", position.line, position.column)
}

/// Every way a document can be rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    // -- decoding ---------------------------------------------------------------------------------
    /// A byte sequence that is not valid in the active encoding.
    #[error("malformed {encoding} sequence {bytes:?}")]
    MalformedSequence {
        /// Encoding the bytes were decoded with.
        encoding: Encoding,
        /// The rejected bytes.
        bytes: BString,
    },
    /// Input ended in the middle of a multi-byte sequence.
    #[error("input ends inside a {0} sequence")]
    TruncatedSequence(Encoding),
    /// The XML declaration names an encoding this parser cannot decode.
    #[error("unsupported encoding {0:?}")]
    UnknownEncoding(String),
    /// `encoding="UTF-16"` was declared but the stream has no byte-order mark.
    #[error("{0:?} declared without a byte-order mark")]
    Utf16WithoutBom(String),
    /// The byte source failed.
    #[error("read error: {0}")]
    Source(String),

    // -- lexical ----------------------------------------------------------------------------------
    /// A fixed character sequence was required here.
    #[error("expected {} but found {found}", ExpectedList(.expected))]
    Expected {
        /// Accepted alternatives, in the order they are tried.
        expected: &'static [&'static str],
        /// What the input held instead.
        found: Found,
    },
    /// A scalar outside the XML `Char` production; a malformed character stream.
    #[error("illegal character {}", quoted(.0))]
    IllegalCharacter(char),
    /// A character that cannot appear in (or start) a name.
    #[error("illegal character {} in name", quoted(.0))]
    IllegalNameCharacter(char),
    /// `]]>` in character data.
    #[error("`]]>` is not allowed in character data")]
    IllegalCdataEnd,
    /// Input ended while a construct was still open.
    #[error("unexpected end of input inside {0}")]
    UnexpectedEof(Construct),
    /// The document holds no root element.
    #[error("expected a root element")]
    MissingRootElement,
    /// Character data before or after the root element.
    #[error("unexpected {0} outside the root element")]
    ContentOutsideRoot(Found),
    /// A `<?xml ...?>` declaration anywhere but the start of the stream.
    #[error("XML declaration is only allowed at the start of the document")]
    MisplacedXmlDeclaration,
    /// A second document type declaration, or one inside an element.
    #[error("unexpected document type declaration")]
    UnexpectedDoctype,

    // -- semantic ---------------------------------------------------------------------------------
    /// An end tag closes a different element than the open one.
    #[error("expected end tag `{expected}` but found `{found}`")]
    MismatchedEndTag {
        /// Qualified name of the open element.
        expected: String,
        /// Qualified name in the end tag.
        found: String,
    },
    /// A prefix with no binding in scope.
    #[error("unknown namespace prefix `{0}`")]
    UnknownNamespacePrefix(String),
    /// `&name;` that is neither predefined nor resolved by the caller.
    #[error("unknown entity `&{0};`")]
    UnknownEntity(String),
    /// A numeric character reference that is empty, too large or not a `Char`.
    #[error("illegal character reference `&#{0};`")]
    IllegalCharRef(String),
    /// Two attributes with the same expanded name on one tag.
    #[error("duplicate attribute `{0}`")]
    DuplicateAttribute(String),
    /// A binding that would redefine `xml`/`xmlns` or their namespace names,
    /// or an element name with the `xmlns` prefix.
    #[error("reserved namespace prefix or name used by `{0}`")]
    ReservedPrefix(String),
    /// `xmlns:p=""`.
    #[error("prefix `{0}` cannot be bound to the empty namespace name")]
    EmptyNamespaceBinding(String),

    // -- resource ---------------------------------------------------------------------------------
    /// An identifier, data run or attribute value grew past the configured cap.
    #[error("buffer exceeds the limit of {0} bytes")]
    BufferLimit(usize),
}

/// The construct that was still open when input ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construct {
    /// `<!-- ... -->`
    Comment,
    /// `<![CDATA[ ... ]]>`
    Cdata,
    /// `<!DOCTYPE ... >`
    Doctype,
    /// `<? ... ?>`
    ProcessingInstruction,
    /// `<?xml ... ?>`
    XmlDeclaration,
    /// `<name ... >`
    StartTag,
    /// `</name>`
    EndTag,
    /// A quoted attribute value.
    AttributeValue,
    /// `&...;`
    Reference,
    /// Element content; the element was never closed.
    Element,
}

impl fmt::Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Construct::Comment => "comment",
            Construct::Cdata => "CDATA section",
            Construct::Doctype => "document type declaration",
            Construct::ProcessingInstruction => "processing instruction",
            Construct::XmlDeclaration => "XML declaration",
            Construct::StartTag => "start tag",
            Construct::EndTag => "end tag",
            Construct::AttributeValue => "attribute value",
            Construct::Reference => "reference",
            Construct::Element => "element content",
        })
    }
}

/// What the parser saw where it wanted something else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Found {
    /// A decoded character.
    Char(char),
    /// The end of the input.
    Eof,
}

impl From<Option<char>> for Found {
    fn from(c: Option<char>) -> Self {
        c.map_or(Found::Eof, Found::Char)
    }
}

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Found::Eof => f.write_str("end of input"),
            Found::Char(c) => write!(f, "'{}'", format_char(*c)),
        }
    }
}

fn quoted(c: &char) -> Found {
    Found::Char(*c)
}

struct ExpectedList<'a>(&'a [&'a str]);

impl fmt::Display for ExpectedList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [only] = self.0 {
            return write!(f, "`{only}`");
        }
        f.write_str("one of ")?;
        for (i, alt) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "`{alt}`")?;
        }
        Ok(())
    }
}

fn format_char(c: char) -> String {
    match c {
        '\'' => "\\'".into(),
        '\\' => "\\\\".into(),
        '\n' => "\\n".into(),
        '\r' => "\\r".into(),
        '\t' => "\\t".into(),
        '\0' => "\\0".into(),
        c if c.is_control() => format!("\\u{{{:04X}}}", c as u32),
        c if c.is_whitespace() && !c.is_ascii_whitespace() => format!("\\u{{{:04X}}}", c as u32),
        c => c.to_string(),
    }
}
