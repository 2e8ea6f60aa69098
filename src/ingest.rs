//! Record ingestion from generic key/value rows.
//!
//! A workbook reader (spreadsheet, CSV, JSON) hands over named sheets of
//! already-parsed rows. This module recognises which sheet holds people,
//! relations and couples, and maps each row onto a typed record. Column
//! headers may be English or Korean.
//!
//! ## Sheet classification
//!
//! Only the first row of each non-empty sheet is inspected:
//!
//! - name column and no spouse column: people
//! - parent and child columns: relations
//! - name and spouse columns: couples
//!
//! A later sheet of the same kind replaces an earlier one.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{BirthYearValue, CoupleRecord, FamilyDataset, PersonRecord, RelationRecord};

/// One parsed row: column header to cell value.
pub type Row = serde_json::Map<String, Value>;

/// Named sheets in workbook order.
pub type Workbook = IndexMap<String, Vec<Row>>;

const NAME_COLUMNS: &[&str] = &["name", "이름"];
const BIRTH_YEAR_COLUMNS: &[&str] = &["birthYear", "birth_year", "생년월일"];
const GENDER_COLUMNS: &[&str] = &["gender", "성별"];
const PARENT_COLUMNS: &[&str] = &["parent", "부모"];
const CHILD_COLUMNS: &[&str] = &["child", "자식"];
const SPOUSE_COLUMNS: &[&str] = &["spouseName", "spouse_name", "spouse", "배우자"];

/// Minimum number of sheets in a workbook.
pub const MIN_SHEETS: usize = 2;

/// Error type for ingestion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    /// Fewer sheets than [`MIN_SHEETS`].
    #[error("Workbook needs at least {min} sheets, found {found}")]
    TooFewSheets {
        /// Required count.
        min: usize,
        /// Actual count.
        found: usize,
    },
    /// No sheet of a required kind.
    #[error("No {kind} sheet found (expected name/gender or parent/child columns)")]
    MissingSheet {
        /// Which kind is missing.
        kind: SheetKind,
    },
}

/// What a sheet holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetKind {
    /// People rows.
    People,
    /// Parent-child rows.
    Relations,
    /// Marriage rows.
    Couples,
}

impl std::fmt::Display for SheetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::People => write!(f, "people"),
            Self::Relations => write!(f, "relations"),
            Self::Couples => write!(f, "couples"),
        }
    }
}

fn has_any(row: &Row, columns: &[&str]) -> bool {
    columns.iter().any(|c| row.contains_key(*c))
}

fn cell<'a>(row: &'a Row, columns: &[&str]) -> Option<&'a Value> {
    columns.iter().find_map(|c| row.get(*c)).filter(|v| !v.is_null())
}

fn cell_text(row: &Row, columns: &[&str]) -> String {
    match cell(row, columns) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Decide what a sheet holds from its first row.
pub fn sheet_kind(first_row: &Row) -> Option<SheetKind> {
    let has_name = has_any(first_row, NAME_COLUMNS);
    let has_spouse = has_any(first_row, SPOUSE_COLUMNS);

    if has_name && !has_spouse {
        Some(SheetKind::People)
    } else if has_any(first_row, PARENT_COLUMNS) && has_any(first_row, CHILD_COLUMNS) {
        Some(SheetKind::Relations)
    } else if has_name && has_spouse {
        Some(SheetKind::Couples)
    } else {
        None
    }
}

/// Map a row onto a person record.
pub fn person_from_row(row: &Row) -> PersonRecord {
    let birth_year = match cell(row, BIRTH_YEAR_COLUMNS) {
        Some(Value::Number(n)) => n
            .as_i64()
            .map(BirthYearValue::Number)
            .or_else(|| n.as_f64().map(BirthYearValue::Float)),
        Some(Value::String(s)) => Some(BirthYearValue::Text(s.clone())),
        _ => None,
    };
    let gender = cell(row, GENDER_COLUMNS).and_then(Value::as_str).map(str::to_string);

    PersonRecord {
        name: cell_text(row, NAME_COLUMNS),
        birth_year,
        gender,
    }
}

/// Map a row onto a relation record.
pub fn relation_from_row(row: &Row) -> RelationRecord {
    RelationRecord::new(cell_text(row, PARENT_COLUMNS), cell_text(row, CHILD_COLUMNS))
}

/// Map a row onto a couple record.
pub fn couple_from_row(row: &Row) -> CoupleRecord {
    CoupleRecord::new(cell_text(row, NAME_COLUMNS), cell_text(row, SPOUSE_COLUMNS))
}

/// Classify a workbook's sheets and convert them into a dataset.
pub fn classify_sheets(workbook: &Workbook) -> Result<FamilyDataset, IngestError> {
    if workbook.len() < MIN_SHEETS {
        return Err(IngestError::TooFewSheets {
            min: MIN_SHEETS,
            found: workbook.len(),
        });
    }

    let mut people: Option<&[Row]> = None;
    let mut relations: Option<&[Row]> = None;
    let mut couples: Option<&[Row]> = None;

    for (name, rows) in workbook {
        let Some(first) = rows.first() else {
            debug!(sheet = %name, "skipping empty sheet");
            continue;
        };
        match sheet_kind(first) {
            Some(SheetKind::People) => people = Some(rows.as_slice()),
            Some(SheetKind::Relations) => relations = Some(rows.as_slice()),
            Some(SheetKind::Couples) => couples = Some(rows.as_slice()),
            None => {
                warn!(sheet = %name, "sheet matches no known layout");
                continue;
            }
        }
        debug!(sheet = %name, rows = rows.len(), "sheet classified");
    }

    let people = people.ok_or(IngestError::MissingSheet { kind: SheetKind::People })?;
    let relations = relations.ok_or(IngestError::MissingSheet {
        kind: SheetKind::Relations,
    })?;

    Ok(FamilyDataset {
        people: people.iter().map(person_from_row).collect(),
        relations: relations.iter().map(relation_from_row).collect(),
        couples: couples.map(|rows| rows.iter().map(couple_from_row).collect()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("row must be an object"),
        }
    }

    fn korean_workbook() -> Workbook {
        let mut wb = Workbook::new();
        wb.insert(
            "관계".to_string(),
            vec![row(json!({"부모": "김철수", "자식": "김민준"}))],
        );
        wb.insert(
            "인물".to_string(),
            vec![
                row(json!({"이름": "김철수", "생년월일": 1961, "성별": "남"})),
                row(json!({"이름": "김민준", "생년월일": "1989-03-02", "성별": "남"})),
            ],
        );
        wb.insert(
            "부부".to_string(),
            vec![row(json!({"이름": "김철수", "배우자": "이영희"}))],
        );
        wb
    }

    #[test]
    fn test_korean_headers() {
        let ds = classify_sheets(&korean_workbook()).unwrap();

        assert_eq!(ds.people.len(), 2);
        assert_eq!(ds.people[0].name, "김철수");
        assert_eq!(ds.people[0].gender.as_deref(), Some("남"));
        assert_eq!(ds.people[1].birth_year.as_ref().and_then(|y| y.year()), Some(1989));
        assert_eq!(ds.relations, vec![RelationRecord::new("김철수", "김민준")]);
        assert_eq!(ds.couples, Some(vec![CoupleRecord::new("김철수", "이영희")]));
    }

    #[test]
    fn test_english_headers() {
        let mut wb = Workbook::new();
        wb.insert("people".into(), vec![row(json!({"name": "A", "birthYear": 1950, "gender": "female"}))]);
        wb.insert("relations".into(), vec![row(json!({"parent": "A", "child": "B"}))]);

        let ds = classify_sheets(&wb).unwrap();
        assert_eq!(ds.people[0].birth_year, Some(BirthYearValue::Number(1950)));
        assert_eq!(ds.relations[0], RelationRecord::new("A", "B"));
        assert!(ds.couples.is_none());
    }

    #[test]
    fn test_too_few_sheets() {
        let mut wb = Workbook::new();
        wb.insert("only".into(), vec![row(json!({"name": "A"}))]);
        assert_eq!(
            classify_sheets(&wb),
            Err(IngestError::TooFewSheets { min: 2, found: 1 })
        );
    }

    #[test]
    fn test_missing_relations_sheet() {
        let mut wb = Workbook::new();
        wb.insert("people".into(), vec![row(json!({"name": "A"}))]);
        wb.insert("empty".into(), vec![]);
        assert_eq!(
            classify_sheets(&wb),
            Err(IngestError::MissingSheet {
                kind: SheetKind::Relations
            })
        );
    }

    #[test]
    fn test_later_sheet_of_same_kind_wins() {
        let mut wb = korean_workbook();
        wb.insert("관계2".into(), vec![row(json!({"부모": "X", "자식": "Y"}))]);
        let ds = classify_sheets(&wb).unwrap();
        assert_eq!(ds.relations, vec![RelationRecord::new("X", "Y")]);
    }

    #[test]
    fn test_fractional_birth_year_cell() {
        let p = person_from_row(&row(json!({"name": "A", "birthYear": 1961.0})));
        assert_eq!(p.birth_year, Some(BirthYearValue::Float(1961.0)));
        assert_eq!(p.birth_year.and_then(|y| y.year()), Some(1961));
    }

    #[test]
    fn test_numeric_names_become_text() {
        let r = relation_from_row(&row(json!({"parent": 7, "child": null})));
        assert_eq!(r, RelationRecord::new("7", ""));
    }
}
