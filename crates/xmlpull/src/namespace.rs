//! Namespace bindings and the stack of open elements.

use alloc::{
    collections::BTreeMap,
    string::{String, ToString},
    vec,
    vec::Vec,
};

use tracing::trace;

use crate::{error::ErrorKind, options::NamespaceFallback, signal::Name};

/// The namespace bound to the `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// The namespace of `xmlns` declarations.
pub const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";

/// Prefix → URI bindings. Each prefix maps to a stack of URIs; the last one is
/// in effect.
#[derive(Debug)]
pub(crate) struct Namespaces {
    bindings: BTreeMap<String, Vec<String>>,
}

impl Namespaces {
    pub(crate) fn new() -> Self {
        let mut bindings = BTreeMap::new();
        bindings.insert(String::new(), vec![String::new()]);
        bindings.insert("xml".to_string(), vec![XML_NS.to_string()]);
        bindings.insert("xmlns".to_string(), vec![XMLNS_NS.to_string()]);
        Self { bindings }
    }

    /// Checks a declaration against the Namespaces in XML constraints.
    ///
    /// `prefix` is empty for a default namespace declaration, which is
    /// reported under the attribute name `xmlns`.
    pub(crate) fn check_binding(prefix: &str, uri: &str) -> Result<(), ErrorKind> {
        let reserved = || {
            let shown = if prefix.is_empty() { "xmlns" } else { prefix };
            Err(ErrorKind::ReservedPrefix(shown.to_string()))
        };
        match prefix {
            "xmlns" => reserved(),
            "xml" if uri != XML_NS => reserved(),
            "xml" => Ok(()),
            _ if uri == XML_NS || uri == XMLNS_NS => reserved(),
            _ if !prefix.is_empty() && uri.is_empty() => {
                Err(ErrorKind::EmptyNamespaceBinding(prefix.to_string()))
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn bind(&mut self, prefix: &str, uri: String) {
        trace!(prefix, uri = uri.as_str(), "bind namespace");
        self.bindings.entry(prefix.to_string()).or_default().push(uri);
    }

    pub(crate) fn unbind(&mut self, prefix: &str) {
        trace!(prefix, "unbind namespace");
        if let Some(stack) = self.bindings.get_mut(prefix) {
            stack.pop();
            if stack.is_empty() {
                self.bindings.remove(prefix);
            }
        }
    }

    /// The URI currently bound to `prefix`.
    pub(crate) fn lookup(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .get(prefix)
            .and_then(|stack| stack.last())
            .map(String::as_str)
    }

    /// Expands `(prefix, local)`, consulting `fallback` for unbound prefixes.
    pub(crate) fn expand(
        &self,
        prefix: &str,
        local: &str,
        fallback: Option<&NamespaceFallback>,
    ) -> Result<Name, ErrorKind> {
        if let Some(uri) = self.lookup(prefix) {
            return Ok(Name::new(uri, local));
        }
        fallback
            .and_then(|f| f(prefix))
            .map(|uri| Name::new(uri, local))
            .ok_or_else(|| ErrorKind::UnknownNamespacePrefix(prefix.to_string()))
    }
}

/// One open element.
#[derive(Debug)]
pub(crate) struct Scope {
    pub(crate) name: Name,
    /// Qualified name as written, for end-tag diagnostics.
    pub(crate) qname: String,
    /// Prefixes bound on this element's start tag, unbound when it closes.
    pub(crate) prefixes: Vec<String>,
    /// Whitespace stripping in effect for this element's content.
    pub(crate) strip: bool,
    /// The start tag was self-closing; the end signal is pending.
    pub(crate) empty: bool,
}

#[derive(Debug, Default)]
pub(crate) struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub(crate) fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub(crate) fn top(&self) -> Option<&Scope> {
        self.scopes.last()
    }

    pub(crate) fn push(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    /// Pops the innermost scope and removes the bindings it introduced.
    pub(crate) fn pop(&mut self, namespaces: &mut Namespaces) -> Option<Scope> {
        let Some(scope) = self.scopes.pop() else {
            debug_assert!(false, "popped an empty scope stack");
            return None;
        };
        for prefix in &scope.prefixes {
            namespaces.unbind(prefix);
        }
        Some(scope)
    }

    /// Stripping flag for content at the current depth.
    pub(crate) fn strip(&self, default: bool) -> bool {
        self.top().map_or(default, |s| s.strip)
    }
}
