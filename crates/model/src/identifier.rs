//! Escaping codec for external identifiers.
//!
//! External identifiers are free-form strings and may contain `/`. The virtual
//! tree shows each identifier as one path segment, so `/` is swapped for a
//! lookalike character on the way out and swapped back before the identifier
//! is used in any downstream query.

use std::borrow::Cow;

use crate::error::ModelError;

/// Stand-in for `/` inside a path segment (U+29F8 BIG SOLIDUS).
pub const ESCAPED_SEPARATOR: char = '\u{29F8}';

/// Escape an external identifier into a single path segment.
///
/// Identifiers that already contain [`ESCAPED_SEPARATOR`] are rejected: they
/// would come back from [`unescape_identifier`] with a `/` in its place.
///
/// # Arguments
/// * `identifier` - Raw external identifier
///
/// # Returns
/// The escaped segment, borrowed when no substitution was needed.
pub fn escape_identifier(identifier: &str) -> Result<Cow<'_, str>, ModelError> {
    if identifier.contains(ESCAPED_SEPARATOR) {
        return Err(ModelError::UnrepresentableIdentifier(identifier.to_string()));
    }

    if identifier.contains('/') {
        Ok(Cow::Owned(identifier.replace('/', &ESCAPED_SEPARATOR.to_string())))
    } else {
        Ok(Cow::Borrowed(identifier))
    }
}

/// Recover the external identifier from an escaped path segment.
///
/// # Arguments
/// * `segment` - Path segment produced by [`escape_identifier`]
pub fn unescape_identifier(segment: &str) -> Cow<'_, str> {
    if segment.contains(ESCAPED_SEPARATOR) {
        Cow::Owned(segment.replace(ESCAPED_SEPARATOR, "/"))
    } else {
        Cow::Borrowed(segment)
    }
}
