// models/src/identifiers.rs

use uuid::Uuid;

/// Parses a client-supplied record identifier.
///
/// Identifiers arrive as strings in paths and request bodies. A value that is
/// not a well-formed UUID cannot name any stored record, so callers treat
/// `None` the same as a lookup miss.
pub fn parse_record_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}
