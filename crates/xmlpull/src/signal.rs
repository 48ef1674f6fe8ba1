//! Signals emitted by the pull parser.
//!
//! A document yields exactly one [`Signal::Dtd`] first, then a balanced
//! sequence of [`Signal::ElementStart`] / [`Signal::ElementEnd`] with
//! [`Signal::Data`] in between.
//!
//! # Examples
//!
//! ```
//! use xmlpull::{Name, ParserOptions, Signal, XmlParser};
//!
//! let parser = XmlParser::new(&b"<a xmlns='urn:x'>hi</a>"[..], ParserOptions::default());
//! let signals: Vec<Signal> = parser.collect::<Result<_, _>>().unwrap();
//! assert_eq!(signals[0], Signal::Dtd(None));
//! let Signal::ElementStart(tag) = &signals[1] else { unreachable!() };
//! assert_eq!(tag.name, Name::new("urn:x", "a"));
//! assert_eq!(signals[2], Signal::Data("hi".to_string()));
//! assert_eq!(signals[3], Signal::ElementEnd);
//! ```
use alloc::{string::String, vec::Vec};
use core::fmt;

/// A namespace-expanded name.
///
/// `namespace` is empty for names in no namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Name {
    /// Namespace URI, possibly empty.
    pub namespace: String,
    /// Local part.
    pub local: String,
}

impl Name {
    /// Builds a name from a namespace URI and a local part.
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// Whether the name is `local` in `namespace`.
    #[must_use]
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.namespace == namespace && self.local == local
    }
}

/// Renders the name in Clark notation: `{namespace}local`, or just `local`
/// when the namespace is empty.
impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

/// An attribute with references expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Attribute {
    /// Expanded attribute name. Namespace declarations appear with the
    /// `xmlns` namespace URI.
    pub name: Name,
    /// Normalized value.
    pub value: String,
}

/// An element start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Tag {
    /// Expanded element name.
    pub name: Name,
    /// Attributes in document order.
    pub attributes: Vec<Attribute>,
}

impl Tag {
    /// The value of the attribute `local` in `namespace`, if present.
    #[must_use]
    pub fn attribute(&self, namespace: &str, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.is(namespace, local))
            .map(|a| a.value.as_str())
    }
}

/// One unit of parser output.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Signal {
    /// Always the first signal. Holds the raw text between `<!` and `>` of
    /// the document type declaration, if there is one.
    Dtd(Option<String>),
    /// An element was opened.
    ElementStart(Tag),
    /// The innermost open element was closed.
    ElementEnd,
    /// A non-empty run of character data.
    Data(String),
}
