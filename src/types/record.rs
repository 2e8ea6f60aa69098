//! Input records consumed by a build.
//!
//! Records arrive already parsed from whatever source the surrounding
//! application reads. Field names accept both camelCase and snake_case.

use serde::{Deserialize, Serialize};

/// Birth year as it appears in a record: a number or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BirthYearValue {
    /// Integer cell.
    Number(i64),
    /// Fractional cell, e.g. `1961.0` from a spreadsheet export.
    Float(f64),
    /// Text cell, e.g. `"1989"` or `"1989-03-02"`.
    Text(String),
}

impl BirthYearValue {
    /// Extract the year.
    ///
    /// Integers are taken as-is and fractions are truncated. Values outside
    /// the `i32` range yield `None`. Text uses its leading run of ASCII digits.
    pub fn year(&self) -> Option<i32> {
        match self {
            Self::Number(n) => i32::try_from(*n).ok(),
            Self::Float(f) => {
                let whole = f.trunc();
                (whole.is_finite() && whole >= f64::from(i32::MIN) && whole <= f64::from(i32::MAX))
                    .then_some(whole as i32)
            }
            Self::Text(s) => {
                let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse().ok()
            }
        }
    }
}

impl From<i64> for BirthYearValue {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for BirthYearValue {
    fn from(n: i32) -> Self {
        Self::Number(i64::from(n))
    }
}

impl From<&str> for BirthYearValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// A row of the people sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Birth year.
    #[serde(default, alias = "birth_year", skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<BirthYearValue>,
    /// Gender marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl PersonRecord {
    /// Create a record with a name only.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the birth year.
    pub fn born(mut self, year: impl Into<BirthYearValue>) -> Self {
        self.birth_year = Some(year.into());
        self
    }

    /// Set the gender marker.
    pub fn gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }
}

/// A row of the relations sheet: one parent-child link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRecord {
    /// Parent display name.
    #[serde(default)]
    pub parent: String,
    /// Child display name.
    #[serde(default)]
    pub child: String,
}

impl RelationRecord {
    /// Create a relation record.
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }
}

/// A row of the optional couples sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoupleRecord {
    /// Display name of the first spouse.
    #[serde(default)]
    pub name: String,
    /// Display name of the second spouse.
    #[serde(default, alias = "spouse_name", alias = "spouse")]
    pub spouse_name: String,
}

impl CoupleRecord {
    /// Create a couple record.
    pub fn new(name: impl Into<String>, spouse_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spouse_name: spouse_name.into(),
        }
    }
}

/// The three record lists of one build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyDataset {
    /// People sheet.
    #[serde(default)]
    pub people: Vec<PersonRecord>,
    /// Relations sheet.
    #[serde(default)]
    pub relations: Vec<RelationRecord>,
    /// Optional couples sheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub couples: Option<Vec<CoupleRecord>>,
}

impl FamilyDataset {
    /// Create a dataset without explicit couples.
    pub fn new(people: Vec<PersonRecord>, relations: Vec<RelationRecord>) -> Self {
        Self {
            people,
            relations,
            couples: None,
        }
    }

    /// Attach explicit couples.
    pub fn with_couples(mut self, couples: Vec<CoupleRecord>) -> Self {
        self.couples = Some(couples);
        self
    }
}
