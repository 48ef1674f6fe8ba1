//! A streaming, pull-based XML parser.
//!
//! [`XmlParser`] turns a byte stream into a sequence of [`Signal`]s (a
//! document type marker, element starts and ends, and character data)
//! without ever building a tree. It does its own decoding for UTF-8,
//! UTF-16, ISO-8859-1, ISO-8859-15 and US-ASCII, expands entity and
//! character references, resolves namespace prefixes and checks
//! well-formedness as it goes.
//!
//! ```rust
//! use xmlpull::{Name, ParserOptions, Signal, XmlParser};
//!
//! let doc = br#"<ships xmlns="urn:fleet"><ship class="frigate"/></ships>"#;
//! let signals = XmlParser::new(&doc[..], ParserOptions::default())
//!     .collect::<Result<Vec<_>, _>>()
//!     .unwrap();
//! assert_eq!(signals.len(), 5);
//! let Signal::ElementStart(ship) = &signals[2] else { unreachable!() };
//! assert_eq!(ship.name, Name::new("urn:fleet", "ship"));
//! assert_eq!(ship.attribute("", "class"), Some("frigate"));
//! ```

#![no_std]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod chars;
mod cursor;
mod encoding;
mod error;
mod escape_buffer;
mod literal_buffer;
mod namespace;
mod options;
mod parser;
mod signal;
mod source;

#[cfg(test)]
mod tests;

pub use cursor::Position;
pub use encoding::Encoding;
pub use error::{Construct, ErrorKind, Found, ParserError, format_error};
pub use namespace::{XML_NS, XMLNS_NS};
pub use options::{DEFAULT_MAX_BUFFER_LEN, EntityResolver, NamespaceFallback, ParserOptions};
pub use parser::XmlParser;
pub use signal::{Attribute, Name, Signal, Tag};
#[cfg(feature = "std")]
pub use source::ReadSource;
pub use source::{ByteSource, Chunks, SourceError};
