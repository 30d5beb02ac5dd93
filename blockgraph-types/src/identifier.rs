use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// A validated symbol name used for variables, parameters, and data-dictionary keys.
///
/// Must match `[A-Za-z][A-Za-z0-9_]*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    pub fn new(s: impl AsRef<str>) -> Result<Self, TypesError> {
        let s = s.as_ref();
        if Self::is_valid(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(TypesError::InvalidIdentifier(s.to_string()))
        }
    }

    /// `s` is non-empty, starts with a letter, and every character is alphanumeric or `_`.
    pub fn is_valid(s: &str) -> bool {
        let mut chars = s.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    pub fn set(&mut self, s: impl AsRef<str>) -> Result<(), TypesError> {
        let s = s.as_ref();
        if Self::is_valid(s) {
            self.0 = s.to_string();
            Ok(())
        } else {
            Err(TypesError::InvalidIdentifier(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Identifier {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if Self::is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(TypesError::InvalidIdentifier(value))
        }
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

impl core::str::FromStr for Identifier {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identifier::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_identifiers() {
        assert!(Identifier::is_valid("a"));
        assert!(Identifier::is_valid("Block1"));
        assert!(Identifier::is_valid("a_b_c"));
        assert!(Identifier::is_valid("Z9"));
    }

    #[test]
    fn invalid_identifiers() {
        assert!(!Identifier::is_valid(""));
        assert!(!Identifier::is_valid("1abc"));
        assert!(!Identifier::is_valid("_abc"));
        assert!(!Identifier::is_valid("a-b"));
        assert!(!Identifier::is_valid("a b"));
    }

    #[test]
    fn construction_validates() {
        assert!(Identifier::new("valid_name").is_ok());
        assert!(matches!(
            Identifier::new("9bad"),
            Err(TypesError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn set_revalidates() {
        let mut id = Identifier::new("a").unwrap();
        assert!(id.set("bad name").is_err());
        assert_eq!(id.as_str(), "a");
        assert!(id.set("good_name").is_ok());
        assert_eq!(id.as_str(), "good_name");
    }

    #[test]
    fn hash_and_eq_are_value_based() {
        use std::collections::HashSet;
        let a = Identifier::new("foo").unwrap();
        let b = Identifier::new("foo").unwrap();
        assert_eq!(a, b);
        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }
}
