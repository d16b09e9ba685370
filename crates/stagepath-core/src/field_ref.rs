//! Qualified field references
//!
//! Provides [`FieldReference`] for addressing the stage field of an entity,
//! written `Entity.Field` by the host.

use crate::error::PathError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Separator between entity and field
pub const SEPARATOR: char = '.';

/// Entity-qualified field reference
///
/// # Examples
/// - `Account.Rating` → entity `Account`, field `Rating`
/// - `Opportunity.StageName` → entity `Opportunity`, field `StageName`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldReference {
    entity: String,
    field: String,
}

impl FieldReference {
    /// Create reference from its parts
    ///
    /// # Errors
    /// `PathError::InvalidFieldReference` if either part is empty or
    /// contains the separator
    pub fn new(entity: impl Into<String>, field: impl Into<String>) -> Result<Self, PathError> {
        Self::parse(&format!("{}{SEPARATOR}{}", entity.into(), field.into()))
    }

    /// Parse `Entity.Field`
    ///
    /// # Errors
    /// `PathError::InvalidFieldReference` unless `raw` holds exactly one
    /// separator with a non-empty name on each side
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let Some((entity, field)) = raw.split_once(SEPARATOR) else {
            return Err(PathError::invalid_field_reference(
                raw,
                "missing '.' separator",
            ));
        };
        if field.contains(SEPARATOR) {
            return Err(PathError::invalid_field_reference(
                raw,
                "more than one '.' separator",
            ));
        }
        if entity.is_empty() {
            return Err(PathError::invalid_field_reference(raw, "empty entity name"));
        }
        if field.is_empty() {
            return Err(PathError::invalid_field_reference(raw, "empty field name"));
        }
        Ok(Self {
            entity: entity.to_string(),
            field: field.to_string(),
        })
    }

    /// Entity name
    #[inline]
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Bare field name
    #[inline]
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Check whether the reference names the given entity
    #[inline]
    #[must_use]
    pub fn belongs_to(&self, entity: &str) -> bool {
        self.entity == entity
    }
}

impl Display for FieldReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.entity, self.field)
    }
}

impl FromStr for FieldReference {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for FieldReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldReference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
