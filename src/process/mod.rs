// src/process/mod.rs

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

pub mod deadline;
pub mod remap;

/// A single decoded cell value. The gviz endpoint emits strings, numbers,
/// booleans and nulls; anything else never leaves the source.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl CellValue {
    /// Display text for a cell. `None` for null and for empty strings —
    /// the source system treats both as absent.
    pub fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
            CellValue::String(s) => {
                if s.is_empty() {
                    None
                } else {
                    Some(s.clone())
                }
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

/// One spreadsheet cell: the decoded value plus the display-formatted
/// string when the source supplied one. Source truth, immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCell {
    pub value: CellValue,
    pub formatted: Option<String>,
}

impl RawCell {
    pub fn new(value: CellValue) -> Self {
        RawCell {
            value,
            formatted: None,
        }
    }
}

/// Column labels plus positionally aligned rows, exactly as fetched.
/// Rows may be shorter than the column list; the missing trailing cells
/// read as null during record conversion.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

/// An ordered label→value record for one row.
///
/// Labels are not guaranteed unique across the sheet export, and the
/// downstream remap is positional over insertion order, so this keeps
/// JavaScript-object semantics: a repeated label overwrites the value at
/// its first position instead of appending. Empty labels get a synthetic
/// `col<index>` label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericRecord {
    fields: Vec<(String, CellValue)>,
}

impl GenericRecord {
    pub fn insert(&mut self, label: String, value: CellValue) {
        match self.fields.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((label, value)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, value)| value)
    }

    /// Value at the given insertion position.
    pub fn value_at(&self, index: usize) -> Option<&CellValue> {
        self.fields.get(index).map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, CellValue)> {
        self.fields.iter()
    }
}

impl Serialize for GenericRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (label, value) in &self.fields {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

/// Zip every row against the column labels, one `GenericRecord` per row.
pub fn generic_records(table: &RawTable) -> Vec<GenericRecord> {
    table
        .rows
        .iter()
        .map(|row| {
            let mut record = GenericRecord::default();
            for (index, label) in table.columns.iter().enumerate() {
                let label = if label.is_empty() {
                    format!("col{}", index)
                } else {
                    label.clone()
                };
                let value = row
                    .get(index)
                    .map(|cell| cell.value.clone())
                    .unwrap_or(CellValue::Null);
                record.insert(label, value);
            }
            record
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn table_from_values(columns: &[&str], rows: Vec<Vec<CellValue>>) -> RawTable {
    RawTable {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows: rows
            .into_iter()
            .map(|row| row.into_iter().map(RawCell::new).collect())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> CellValue {
        CellValue::String(text.to_string())
    }

    #[test]
    fn records_zip_labels_and_cells_positionally() {
        let table = table_from_values(
            &["A", "B"],
            vec![vec![s("one"), CellValue::Number(2.0)], vec![s("three")]],
        );
        let records = generic_records(&table);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("A"), Some(&s("one")));
        assert_eq!(records[0].get("B"), Some(&CellValue::Number(2.0)));
        // short row: trailing cell reads as null
        assert_eq!(records[1].get("B"), Some(&CellValue::Null));
    }

    #[test]
    fn empty_labels_get_synthetic_names() {
        let table = table_from_values(&["", "Name", ""], vec![vec![s("x"), s("y"), s("z")]]);
        let records = generic_records(&table);
        assert_eq!(records[0].get("col0"), Some(&s("x")));
        assert_eq!(records[0].get("Name"), Some(&s("y")));
        assert_eq!(records[0].get("col2"), Some(&s("z")));
    }

    #[test]
    fn duplicate_labels_collapse_onto_the_first_position() {
        let table = table_from_values(&["X", "X", "Y"], vec![vec![s("a"), s("b"), s("c")]]);
        let records = generic_records(&table);
        // later value wins, at the original position
        assert_eq!(records[0].len(), 2);
        assert_eq!(records[0].get("X"), Some(&s("b")));
        assert_eq!(records[0].value_at(0), Some(&s("b")));
        assert_eq!(records[0].value_at(1), Some(&s("c")));
    }

    #[test]
    fn record_serializes_as_a_json_object() {
        let mut record = GenericRecord::default();
        record.insert("col0".into(), CellValue::Null);
        record.insert("Name".into(), s("KTH"));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"col0": null, "Name": "KTH"}));
    }

    #[test]
    fn cell_text_rendering() {
        assert_eq!(CellValue::Null.to_text(), None);
        assert_eq!(s("").to_text(), None);
        assert_eq!(s("KTH").to_text(), Some("KTH".to_string()));
        assert_eq!(CellValue::Number(7.0).to_text(), Some("7".to_string()));
        assert_eq!(CellValue::Number(2.5).to_text(), Some("2.5".to_string()));
        assert_eq!(CellValue::Bool(true).to_text(), Some("true".to_string()));
    }
}
