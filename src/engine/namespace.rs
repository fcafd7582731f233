//! Namespace resolution for name-based (v3/v5) values.
//!
//! A namespace argument is either one of the well-known names from RFC4122
//! Appendix C (`DNS`, `URL`, `OID`, `X500`, optionally prefixed with `ns:`),
//! `nil`, or a literal 36-character hyphenated UUID.

use std::fmt;

use uuid::Uuid;

use crate::engine::value::UUID_TEXT_LEN;
use crate::error::EngineError;

/// Resolved hashing namespace. Immutable once stored in a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamespaceRef(Uuid);

impl NamespaceRef {
    #[must_use]
    pub const fn new(value: Uuid) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for NamespaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

pub const WELL_KNOWN_NAMESPACES: [(&str, Uuid); 5] = [
    ("DNS", Uuid::NAMESPACE_DNS),
    ("URL", Uuid::NAMESPACE_URL),
    ("OID", Uuid::NAMESPACE_OID),
    ("X500", Uuid::NAMESPACE_X500),
    ("nil", Uuid::nil()),
];

const NAMESPACE_PREFIX: &str = "ns:";

/// Turns a namespace argument into a [`NamespaceRef`].
pub trait NamespaceResolver: Send + Sync {
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidNamespace`] when `arg` is neither a
    /// recognized name nor a parseable UUID string.
    fn resolve(&self, arg: &str) -> Result<NamespaceRef, EngineError>;
}

/// Well-known table first, then literal UUID text.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardResolver;

impl NamespaceResolver for StandardResolver {
    fn resolve(&self, arg: &str) -> Result<NamespaceRef, EngineError> {
        resolve_namespace(arg)
    }
}

/// Resolve a namespace argument without any caching.
///
/// # Errors
///
/// Returns [`EngineError::InvalidNamespace`] for unknown names and malformed
/// UUID text.
pub fn resolve_namespace(arg: &str) -> Result<NamespaceRef, EngineError> {
    if let Some(value) = lookup_well_known(arg) {
        return Ok(NamespaceRef(value));
    }
    parse_literal(arg)
        .map(NamespaceRef)
        .ok_or_else(|| EngineError::InvalidNamespace(arg.to_string()))
}

#[must_use]
pub fn lookup_well_known(arg: &str) -> Option<Uuid> {
    let name = arg.strip_prefix(NAMESPACE_PREFIX).unwrap_or(arg);
    WELL_KNOWN_NAMESPACES
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, value)| *value)
}

// Only the hyphenated layout is a namespace literal; simple, braced and URN
// forms are rejected even though `Uuid::try_parse` would take them.
fn parse_literal(arg: &str) -> Option<Uuid> {
    if arg.len() != UUID_TEXT_LEN {
        return None;
    }
    Uuid::try_parse(arg).ok()
}
