use alloc::{string::String, sync::Arc};
use core::fmt;

use crate::encoding::Encoding;

/// Resolves a namespace prefix that has no binding in scope to a URI.
pub type NamespaceFallback = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolves an entity name other than the five predefined ones to its
/// replacement text.
pub type EntityResolver = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Default cap on a single identifier, data run, attribute value or DTD text.
pub const DEFAULT_MAX_BUFFER_LEN: usize = 16 * 1024 * 1024;

/// Configuration options for [`XmlParser`](crate::XmlParser).
///
/// # Examples
///
/// ```rust
/// use xmlpull::{Encoding, ParserOptions};
///
/// let options = ParserOptions {
///     encoding: Some(Encoding::Iso8859_1),
///     strip_whitespace: true,
///     ..Default::default()
/// }
/// .with_entity_resolver(|name| (name == "nbsp").then(|| "\u{a0}".to_string()));
/// ```
#[derive(Clone)]
pub struct ParserOptions {
    /// Decode with this encoding instead of sniffing one.
    ///
    /// A byte-order mark matching the encoding is still skipped, and an
    /// `encoding` pseudo-attribute in the XML declaration is ignored.
    ///
    /// # Default
    ///
    /// `None`
    pub encoding: Option<Encoding>,

    /// Whether character data and attribute values are whitespace-collapsed
    /// outside of any `xml:space` declaration.
    ///
    /// When stripping, leading and trailing whitespace of a data run is
    /// dropped and every interior whitespace run becomes one space.
    ///
    /// # Default
    ///
    /// `false`
    pub strip_whitespace: bool,

    /// Accept `encoding="UTF-16"` in the XML declaration of a stream that has
    /// no byte-order mark, continuing with the 8-bit decoding.
    ///
    /// # Default
    ///
    /// `false`
    pub tolerate_utf16_without_bom: bool,

    /// Maximum length in bytes of any buffered unit: a name, a data run, an
    /// attribute value or the text of a document type declaration.
    ///
    /// # Default
    ///
    /// [`DEFAULT_MAX_BUFFER_LEN`]
    pub max_buffer_len: usize,

    /// Consulted for prefixes that are not bound in scope.
    ///
    /// # Default
    ///
    /// `None`: unbound prefixes are an error.
    pub namespace_fallback: Option<NamespaceFallback>,

    /// Consulted for entity references other than `lt`, `gt`, `amp`, `apos`
    /// and `quot`.
    ///
    /// # Default
    ///
    /// `None`: other entities are an error.
    pub entity_resolver: Option<EntityResolver>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            encoding: None,
            strip_whitespace: false,
            tolerate_utf16_without_bom: false,
            max_buffer_len: DEFAULT_MAX_BUFFER_LEN,
            namespace_fallback: None,
            entity_resolver: None,
        }
    }
}

impl ParserOptions {
    /// Sets [`ParserOptions::strip_whitespace`].
    #[must_use]
    pub fn with_strip_whitespace(mut self, strip: bool) -> Self {
        self.strip_whitespace = strip;
        self
    }

    /// Sets [`ParserOptions::namespace_fallback`].
    #[must_use]
    pub fn with_namespace_fallback<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.namespace_fallback = Some(Arc::new(f));
        self
    }

    /// Sets [`ParserOptions::entity_resolver`].
    #[must_use]
    pub fn with_entity_resolver<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.entity_resolver = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for ParserOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserOptions")
            .field("encoding", &self.encoding)
            .field("strip_whitespace", &self.strip_whitespace)
            .field("tolerate_utf16_without_bom", &self.tolerate_utf16_without_bom)
            .field("max_buffer_len", &self.max_buffer_len)
            .field("namespace_fallback", &self.namespace_fallback.is_some())
            .field("entity_resolver", &self.entity_resolver.is_some())
            .finish()
    }
}
