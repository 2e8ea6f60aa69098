//! Person types for the family graph.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized key identifying a person.
///
/// Derived from a display name by trimming it and removing every
/// whitespace and hyphen character. Case is preserved. Two display names
/// that normalize to the same key denote the same person.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    /// Normalize a raw display name into a person id.
    ///
    /// Returns `None` when nothing is left after normalization.
    pub fn normalize(raw: &str) -> Option<Self> {
        let key = normalize_name(raw);
        if key.is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    /// Wrap an already-normalized key.
    pub fn from_normalized(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PersonId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize a display name into its key form.
///
/// Removes all whitespace and `-` characters. Idempotent:
/// `normalize_name(normalize_name(x)) == normalize_name(x)`.
pub fn normalize_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Declared gender of a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
    /// Absent or unrecognized.
    #[default]
    Unknown,
}

impl Gender {
    /// Parse a gender value from a record.
    ///
    /// Recognizes English words and initials as well as the Korean
    /// `남`/`여` markers. Anything else is `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" | "man" | "남" | "남자" => Self::Male,
            "female" | "f" | "woman" | "여" | "여자" => Self::Female,
            _ => Self::Unknown,
        }
    }

    /// Parse an optional gender value.
    pub fn from_optional(s: Option<&str>) -> Self {
        s.map(Self::parse).unwrap_or_default()
    }

    /// Whether this is `Male`.
    pub fn is_male(&self) -> bool {
        matches!(self, Self::Male)
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => write!(f, "male"),
            Self::Female => write!(f, "female"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A person in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Normalized key.
    pub id: PersonId,
    /// Trimmed display name as it first appeared (or as last declared by a
    /// person record).
    pub display_name: String,
    /// Year of birth, when known.
    pub birth_year: Option<i32>,
    /// Declared gender.
    pub gender: Gender,
    /// Blood relative (`true`) or married in (`false`). Set by the classifier.
    pub is_blood: bool,
}

impl Person {
    /// Create a person with full attributes.
    pub fn new(id: PersonId, display_name: impl Into<String>, birth_year: Option<i32>, gender: Gender) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            birth_year,
            gender,
            is_blood: false,
        }
    }

    /// Create a placeholder for a name referenced only by a relation or
    /// couple record.
    pub fn placeholder(id: PersonId, display_name: impl Into<String>) -> Self {
        Self::new(id, display_name, None, Gender::Unknown)
    }
}
