//! Plate and ticket identifiers, plus plate validation.
//!
//! Both serialize as plain strings.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use thiserror::Error;

/// Longest accepted licence plate, in characters.
pub const MAX_PLATE_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("plate must not be empty")]
    EmptyPlate,
    #[error("plate must be at most {MAX_PLATE_LEN} characters, got {0}")]
    PlateTooLong(usize),
    #[error("plate must not contain control characters")]
    PlateControlChar,
}

/// Vehicle licence plate. At most one vehicle per plate is in the garage.
///
/// Borrows as `str` so plate-keyed maps can be queried with raw input.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plate(String);

impl Plate {
    /// Wrap an already-validated plate.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Validate and trim raw input into a plate.
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let trimmed = raw.trim();
        validate_plate(trimmed)?;
        Ok(Self::new(trimmed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Deref for Plate {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Plate {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Plate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for Plate {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Opaque ticket identifier handed out on admission.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for TicketId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

pub fn validate_plate(plate: &str) -> Result<(), InputError> {
    if plate.trim().is_empty() {
        return Err(InputError::EmptyPlate);
    }
    let len = plate.chars().count();
    if len > MAX_PLATE_LEN {
        return Err(InputError::PlateTooLong(len));
    }
    if plate.chars().any(char::is_control) {
        return Err(InputError::PlateControlChar);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn plate_display_and_compare() {
        let plate = Plate::new("AAA111");
        assert_eq!(plate.to_string(), "AAA111");
        assert_eq!(plate.as_str(), "AAA111");
        assert_eq!(plate, "AAA111");
        assert_eq!(plate.len(), 6);
    }

    #[test]
    fn plate_keyed_map_answers_raw_lookups() {
        let mut map = BTreeMap::new();
        map.insert(Plate::new("XYZ 9"), 1);
        assert_eq!(map.get("XYZ 9"), Some(&1));
        assert_eq!(map.get("XYZ"), None);
    }

    #[test]
    fn ticket_id_serializes_as_plain_string() {
        let id = TicketId::new("T-000001");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"T-000001\"");
        let back: TicketId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn parse_trims_whitespace() {
        let plate = Plate::parse("  XYZ 123 ").unwrap();
        assert_eq!(plate.as_str(), "XYZ 123");
    }

    #[test]
    fn parse_rejects_empty_and_blank() {
        assert_eq!(Plate::parse(""), Err(InputError::EmptyPlate));
        assert_eq!(Plate::parse("   "), Err(InputError::EmptyPlate));
    }

    #[test]
    fn parse_rejects_overlong() {
        let long = "A".repeat(MAX_PLATE_LEN + 1);
        assert_eq!(
            Plate::parse(&long),
            Err(InputError::PlateTooLong(MAX_PLATE_LEN + 1))
        );
        assert!(Plate::parse(&"B".repeat(MAX_PLATE_LEN)).is_ok());
    }

    #[test]
    fn parse_rejects_control_chars() {
        assert_eq!(Plate::parse("AB\tC"), Err(InputError::PlateControlChar));
    }

    #[test]
    fn into_inner_returns_string() {
        let plate = Plate::new("abc");
        assert_eq!(plate.into_inner(), "abc");
    }
}
