// src/process/remap.rs
//
// The sheet uses merged header cells, so exports carry an artifact column
// and inconsistent labels. Records are therefore remapped by position, not
// by label — a source layout change is a one-line edit to the map below.

use serde::Serialize;

use super::{generic_records, CellValue, GenericRecord, RawTable};

/// Positional layout of one sheet: which insertion positions feed which
/// named fields, and how many leading structural header rows to drop.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    pub header_rows: usize,
    pub fields: &'static [(&'static str, usize)],
}

pub const VACANCY_MAP: ColumnMap = ColumnMap {
    // first two rows are merged-cell header remnants
    header_rows: 2,
    fields: &[
        ("vacancy", 1),
        ("institution", 2),
        ("subject", 3),
        ("deadline", 4),
        ("link", 5),
    ],
};

pub const INSTITUTION_MAP: ColumnMap = ColumnMap {
    header_rows: 1,
    fields: &[("location", 2), ("institution", 3), ("link", 4)],
};

/// A vacancy row with the artifact column dropped and positions 1–5 bound
/// to named fields. `deadline` stays raw here; formatting is presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VacancyRecord {
    pub vacancy: CellValue,
    pub institution: CellValue,
    pub subject: CellValue,
    pub deadline: CellValue,
    pub link: CellValue,
    pub raw: GenericRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstitutionRecord {
    pub location: CellValue,
    pub institution: CellValue,
    pub link: CellValue,
    pub raw: GenericRecord,
}

fn field_value(record: &GenericRecord, map: &ColumnMap, name: &str) -> CellValue {
    map.fields
        .iter()
        .find(|(field, _)| *field == name)
        .and_then(|(_, position)| record.value_at(*position))
        .cloned()
        .unwrap_or(CellValue::Null)
}

pub fn to_vacancy_records(table: &RawTable) -> Vec<VacancyRecord> {
    generic_records(table)
        .into_iter()
        .map(|record| VacancyRecord {
            vacancy: field_value(&record, &VACANCY_MAP, "vacancy"),
            institution: field_value(&record, &VACANCY_MAP, "institution"),
            subject: field_value(&record, &VACANCY_MAP, "subject"),
            deadline: field_value(&record, &VACANCY_MAP, "deadline"),
            link: field_value(&record, &VACANCY_MAP, "link"),
            raw: record,
        })
        .skip(VACANCY_MAP.header_rows)
        .collect()
}

pub fn to_institution_records(table: &RawTable) -> Vec<InstitutionRecord> {
    generic_records(table)
        .into_iter()
        .map(|record| InstitutionRecord {
            location: field_value(&record, &INSTITUTION_MAP, "location"),
            institution: field_value(&record, &INSTITUTION_MAP, "institution"),
            link: field_value(&record, &INSTITUTION_MAP, "link"),
            raw: record,
        })
        .skip(INSTITUTION_MAP.header_rows)
        .collect()
}
