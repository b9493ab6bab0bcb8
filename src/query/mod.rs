// src/query/mod.rs

use serde::Serialize;

use crate::process::deadline::format_deadline;
use crate::process::remap::{InstitutionRecord, VacancyRecord};
use crate::process::GenericRecord;

/// A vacancy as the API presents it: display strings, a pre-formatted
/// deadline, and the source row kept for traceability.
#[derive(Debug, Clone, Serialize)]
pub struct VacancyItem {
    pub id: usize,
    pub vacancy: Option<String>,
    pub institution: Option<String>,
    pub subject: Option<String>,
    pub deadline: String,
    pub link: Option<String>,
    pub raw: GenericRecord,
}

impl VacancyItem {
    pub fn from_record(id: usize, record: &VacancyRecord, shift_month: bool) -> Self {
        let subject = record.subject.to_text();
        VacancyItem {
            id,
            // a merged title cell leaves the vacancy column empty; the
            // subject is the best remaining label
            vacancy: record.vacancy.to_text().or_else(|| subject.clone()),
            institution: record.institution.to_text(),
            subject,
            deadline: format_deadline(&record.deadline, shift_month),
            link: record.link.to_text(),
            raw: record.raw.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InstitutionItem {
    pub id: usize,
    pub name: Option<String>,
    pub location: Option<String>,
    pub link: Option<String>,
    pub raw: GenericRecord,
}

impl InstitutionItem {
    pub fn from_record(id: usize, record: &InstitutionRecord) -> Self {
        InstitutionItem {
            id,
            name: record.institution.to_text(),
            location: record.location.to_text(),
            link: record.link.to_text(),
            raw: record.raw.clone(),
        }
    }
}

pub fn vacancy_items(records: &[VacancyRecord], shift_month: bool) -> Vec<VacancyItem> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| VacancyItem::from_record(index + 1, record, shift_month))
        .collect()
}

pub fn institution_items(records: &[InstitutionRecord]) -> Vec<InstitutionItem> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| InstitutionItem::from_record(index + 1, record))
        .collect()
}

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 200;

/// One request's filter and pagination settings, clamped on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterQuery {
    pub text: Option<String>,
    pub subject: Option<String>,
    pub institution: Option<String>,
    pub page: usize,
    pub page_size: usize,
}

impl Default for FilterQuery {
    fn default() -> Self {
        FilterQuery {
            text: None,
            subject: None,
            institution: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl FilterQuery {
    /// Build a query from raw request parameters. Page numbers accept
    /// leading digits the way the source system's integer parse did;
    /// anything non-numeric falls back to the defaults, and both values
    /// are clamped to their valid domains.
    pub fn from_params(
        text: Option<&str>,
        subject: Option<&str>,
        institution: Option<&str>,
        page: Option<&str>,
        page_size: Option<&str>,
    ) -> Self {
        let page = parse_leading_int(page).unwrap_or(1).max(1) as usize;
        let page_size = parse_leading_int(page_size)
            .unwrap_or(DEFAULT_PAGE_SIZE as i64)
            .clamp(1, MAX_PAGE_SIZE as i64) as usize;
        FilterQuery {
            text: non_empty(text),
            subject: non_empty(subject),
            institution: non_empty(institution),
            page,
            page_size,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::to_string)
        .filter(|value| !value.is_empty())
}

/// `parseInt`-style: optional sign, then as many digits as are there.
fn parse_leading_int(value: Option<&str>) -> Option<i64> {
    let value = value?.trim();
    let (sign, digits) = match value.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, value.strip_prefix('+').unwrap_or(value)),
    };
    let run: String = digits.chars().take_while(|c| c.is_ascii_digit()).collect();
    if run.is_empty() {
        return None;
    }
    run.parse::<i64>().ok().map(|n| sign * n)
}

/// One page of filtered results. `total` counts every record that passed
/// the filters, independent of the page slice.
#[derive(Debug, Clone, Serialize)]
pub struct VacancyPage {
    pub items: Vec<VacancyItem>,
    pub total: usize,
    pub page: usize,
    #[serde(rename = "pageSize")]
    pub page_size: usize,
}

fn contains_ci(haystack: &Option<String>, needle: &str) -> bool {
    haystack
        .as_deref()
        .map(|h| h.to_lowercase().contains(needle))
        .unwrap_or(false)
}

/// Conjunctive substring filtering and offset pagination over the full
/// vacancy collection.
pub fn list_vacancies(items: &[VacancyItem], query: &FilterQuery) -> VacancyPage {
    let text = query.text.as_deref().map(str::to_lowercase);
    let subject = query.subject.as_deref().map(str::to_lowercase);
    let institution = query.institution.as_deref().map(str::to_lowercase);

    let filtered: Vec<&VacancyItem> = items
        .iter()
        .filter(|item| {
            if let Some(text) = &text {
                if !(contains_ci(&item.vacancy, text)
                    || contains_ci(&item.subject, text)
                    || contains_ci(&item.institution, text))
                {
                    return false;
                }
            }
            if let Some(subject) = &subject {
                if !contains_ci(&item.subject, subject) {
                    return false;
                }
            }
            if let Some(institution) = &institution {
                if !contains_ci(&item.institution, institution) {
                    return false;
                }
            }
            true
        })
        .collect();

    let total = filtered.len();
    let start = (query.page - 1).saturating_mul(query.page_size);
    let page_items = if start >= total {
        Vec::new()
    } else {
        filtered[start..(start + query.page_size).min(total)]
            .iter()
            .map(|item| (*item).clone())
            .collect()
    };

    VacancyPage {
        items: page_items,
        total,
        page: query.page,
        page_size: query.page_size,
    }
}

/// Distinct non-empty subjects across the full dataset, for filter facets.
pub fn distinct_subjects(items: &[VacancyItem]) -> Vec<String> {
    distinct(items.iter().filter_map(|item| item.subject.clone()))
}

/// Distinct non-empty institutions across the full dataset.
pub fn distinct_institutions(items: &[VacancyItem]) -> Vec<String> {
    distinct(items.iter().filter_map(|item| item.institution.clone()))
}

fn distinct(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut values: Vec<String> = values.collect();
    values.sort();
    values.dedup();
    values
}
