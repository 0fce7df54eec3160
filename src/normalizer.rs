//! EPIAS response normalization.
//!
//! Responses carry their record list in one of a few envelope shapes: a bare
//! list, an object with `items`, or the same nested one level under `data`,
//! `result` or `body`. This module finds that list, turns it into a
//! [`NormalizedTable`] and coerces columns according to a dataset's
//! [`TableSchema`].

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::table::{infer_kind, Cell, Column, ColumnKind, NormalizedTable};

const ITEMS_KEY: &str = "items";
const ENVELOPE_KEYS: [&str; 3] = ["data", "result", "body"];

const OFFSET_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];
const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d.%m.%Y"];

pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Date,
    Numeric,
}

/// A canonical field of a strict schema and the source keys accepted for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub coercion: Coercion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    BestEffort,
    Strict(&'static [FieldSpec]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub date_candidates: &'static [&'static str],
    pub coerce_numeric: bool,
    pub strictness: Strictness,
}

impl TableSchema {
    pub const fn best_effort(date_candidates: &'static [&'static str]) -> Self {
        Self {
            date_candidates,
            coerce_numeric: true,
            strictness: Strictness::BestEffort,
        }
    }

    pub const fn dates_only(date_candidates: &'static [&'static str]) -> Self {
        Self {
            date_candidates,
            coerce_numeric: false,
            strictness: Strictness::BestEffort,
        }
    }

    pub const fn strict(fields: &'static [FieldSpec]) -> Self {
        Self {
            date_candidates: &[],
            coerce_numeric: false,
            strictness: Strictness::Strict(fields),
        }
    }

    pub fn is_strict(&self) -> bool {
        matches!(self.strictness, Strictness::Strict(_))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("response JSON does not include expected fields: {}", .missing.join(", "))]
    MissingRequiredFields { missing: Vec<String> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoercionReport {
    pub date_column: Option<String>,
    pub dropped_rows: usize,
    pub numeric_columns: Vec<String>,
}

/// Finds the record list inside any supported envelope shape. Non-object
/// elements are dropped; anything unrecognised yields an empty list.
pub fn extract_records(payload: &Value) -> Vec<Record> {
    match payload {
        Value::Array(items) => object_elements(items),
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get(ITEMS_KEY) {
                return object_elements(items);
            }

            for key in ENVELOPE_KEYS {
                let Some(nested) = map.get(key) else {
                    continue;
                };
                if nested.is_null() {
                    continue;
                }
                let records = extract_records(nested);
                if !records.is_empty() {
                    return records;
                }
            }

            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Builds a table whose columns are the union of record keys in order of
/// first appearance. Missing keys become [`Cell::Null`].
pub fn build_table(records: &[Record]) -> NormalizedTable {
    let mut names: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in records {
        for key in record.keys() {
            if !positions.contains_key(key) {
                positions.insert(key.clone(), names.len());
                names.push(key.clone());
            }
        }
    }

    let rows: Vec<Vec<Cell>> = records
        .iter()
        .map(|record| {
            let mut row = vec![Cell::Null; names.len()];
            for (key, value) in record {
                if let Some(idx) = positions.get(key) {
                    row[*idx] = json_to_cell(value);
                }
            }
            row
        })
        .collect();

    let columns = names
        .into_iter()
        .enumerate()
        .map(|(idx, name)| Column {
            name,
            kind: infer_kind(rows.iter().map(|row| &row[idx])),
        })
        .collect();

    NormalizedTable { columns, rows }
}

/// Best-effort coercion. The first candidate column that is present and has
/// at least one parseable date becomes a date column; rows whose date failed
/// to parse are dropped and the rest are stably sorted ascending. With
/// `coerce_numeric`, every text column whose non-null values all parse as
/// numbers is converted. Never fails.
pub fn coerce_columns(
    table: &mut NormalizedTable,
    date_candidates: &[&str],
    coerce_numeric: bool,
) -> CoercionReport {
    let mut report = CoercionReport::default();

    for candidate in date_candidates {
        let Some(idx) = table.column_index(candidate) else {
            continue;
        };
        let parsed: Vec<Option<NaiveDate>> = table.column_cells(idx).map(parse_date_cell).collect();
        if parsed.iter().all(Option::is_none) {
            continue;
        }

        report.dropped_rows = convert_dates(table, idx, parsed);
        report.date_column = Some((*candidate).to_string());
        debug!(
            component = "normalizer",
            event = "normalize.date_column",
            column = *candidate,
            dropped_rows = report.dropped_rows
        );
        break;
    }

    if coerce_numeric {
        for idx in 0..table.columns.len() {
            if table.columns[idx].kind != ColumnKind::Text {
                continue;
            }
            let parsed: Option<Vec<Cell>> = table.column_cells(idx).map(numeric_cell).collect();
            let Some(parsed) = parsed else {
                continue;
            };
            if parsed.iter().all(Cell::is_null) {
                continue;
            }
            for (row, cell) in table.rows.iter_mut().zip(parsed) {
                row[idx] = cell;
            }
            table.refresh_kind(idx);
            report.numeric_columns.push(table.columns[idx].name.clone());
        }
    }

    report
}

/// Enforces a strict schema: every field must be present (directly or via an
/// alias) whenever the table is non-empty. The result holds exactly the
/// schema's fields under their canonical names.
pub fn required_shape(
    table: NormalizedTable,
    fields: &[FieldSpec],
) -> Result<NormalizedTable, NormalizeError> {
    if table.is_empty() {
        let mut empty = NormalizedTable::with_columns(
            &fields.iter().map(|field| field.name).collect::<Vec<_>>(),
        );
        for (column, field) in empty.columns.iter_mut().zip(fields) {
            column.kind = coercion_kind(field.coercion);
        }
        return Ok(empty);
    }

    let mut sources = Vec::with_capacity(fields.len());
    let mut missing = Vec::new();
    for field in fields {
        let found = std::iter::once(field.name)
            .chain(field.aliases.iter().copied())
            .find(|name| table.has_column(name));
        match found {
            Some(name) => sources.push(name),
            None => missing.push(field.name.to_string()),
        }
    }

    if !missing.is_empty() {
        warn!(
            component = "normalizer",
            event = "normalize.strict.missing",
            missing = %missing.join(",")
        );
        return Err(NormalizeError::MissingRequiredFields { missing });
    }

    let mut projected = table.project(&sources);
    for (column, field) in projected.columns.iter_mut().zip(fields) {
        column.name = field.name.to_string();
    }

    for (idx, field) in fields.iter().enumerate() {
        if field.coercion == Coercion::Numeric {
            for row in projected.rows.iter_mut() {
                row[idx] = numeric_cell(&row[idx]).unwrap_or(Cell::Null);
            }
            projected.columns[idx].kind = ColumnKind::Numeric;
        }
    }

    for (idx, field) in fields.iter().enumerate() {
        if field.coercion == Coercion::Date {
            let parsed: Vec<Option<NaiveDate>> =
                projected.column_cells(idx).map(parse_date_cell).collect();
            convert_dates(&mut projected, idx, parsed);
        }
    }

    Ok(projected)
}

/// Full pipeline for one decoded response body.
pub fn normalize_payload(
    payload: &Value,
    schema: &TableSchema,
) -> Result<NormalizedTable, NormalizeError> {
    let records = extract_records(payload);
    let mut table = build_table(&records);

    match schema.strictness {
        Strictness::Strict(fields) => required_shape(table, fields),
        Strictness::BestEffort => {
            if !table.is_empty() {
                coerce_columns(&mut table, schema.date_candidates, schema.coerce_numeric);
            }
            Ok(table)
        }
    }
}

pub fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.date_naive());
    }
    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(raw, format) {
            return Some(parsed.date_naive());
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

pub fn parse_number(raw: &str) -> Option<Cell> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(Cell::Int(value));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(Cell::Float)
}

fn object_elements(items: &[Value]) -> Vec<Record> {
    items
        .iter()
        .filter_map(|item| item.as_object().cloned())
        .collect()
}

fn json_to_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Bool(flag) => Cell::Bool(*flag),
        Value::Number(number) => number
            .as_i64()
            .map(Cell::Int)
            .or_else(|| number.as_f64().map(Cell::Float))
            .unwrap_or(Cell::Null),
        Value::String(text) => Cell::Text(text.clone()),
        Value::Array(_) | Value::Object(_) => Cell::Text(value.to_string()),
    }
}

fn parse_date_cell(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(date) => Some(*date),
        Cell::Text(raw) => parse_date_text(raw),
        _ => None,
    }
}

fn numeric_cell(cell: &Cell) -> Option<Cell> {
    match cell {
        Cell::Null | Cell::Int(_) | Cell::Float(_) => Some(cell.clone()),
        Cell::Text(raw) => parse_number(raw),
        Cell::Bool(_) | Cell::Date(_) => None,
    }
}

fn coercion_kind(coercion: Coercion) -> ColumnKind {
    match coercion {
        Coercion::Date => ColumnKind::Date,
        Coercion::Numeric => ColumnKind::Numeric,
    }
}

/// Replaces column `idx` with parsed dates, drops rows that failed and
/// stably sorts ascending. Returns the number of dropped rows.
fn convert_dates(table: &mut NormalizedTable, idx: usize, parsed: Vec<Option<NaiveDate>>) -> usize {
    let before = table.rows.len();
    let mut kept: Vec<(NaiveDate, Vec<Cell>)> = table
        .rows
        .drain(..)
        .zip(parsed)
        .filter_map(|(mut row, date)| {
            let date = date?;
            row[idx] = Cell::Date(date);
            Some((date, row))
        })
        .collect();
    kept.sort_by_key(|(date, _)| *date);

    table.rows = kept.into_iter().map(|(_, row)| row).collect();
    table.columns[idx].kind = ColumnKind::Date;
    before - table.rows.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(value: Value) -> Vec<Record> {
        extract_records(&value)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const TOTALS: &[FieldSpec] = &[
        FieldSpec {
            name: "gasDay",
            aliases: &[],
            coercion: Coercion::Date,
        },
        FieldSpec {
            name: "tradeVolume",
            aliases: &[],
            coercion: Coercion::Numeric,
        },
    ];

    #[test]
    fn nested_envelope_falls_through_to_next_key_when_empty() {
        let found = records(json!({
            "data": {"foo": 1},
            "result": {"items": [{"a": 1}]}
        }));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["a"], json!(1));
    }

    #[test]
    fn null_and_scalar_envelopes_are_skipped() {
        assert!(records(json!({"data": null, "body": 4})).is_empty());
        assert!(records(json!("text")).is_empty());
        assert!(records(json!(null)).is_empty());
        assert_eq!(records(json!({"data": null, "body": [{"x": 1}]})).len(), 1);
    }

    #[test]
    fn items_list_wins_even_when_empty() {
        let found = records(json!({"items": [], "data": [{"a": 1}]}));
        assert!(found.is_empty());
    }

    #[test]
    fn build_table_unions_keys_in_first_seen_order() {
        let table = build_table(&records(json!([
            {"b": 1, "a": "x"},
            {"a": "y", "c": true}
        ])));

        assert_eq!(table.column_names(), vec!["b", "a", "c"]);
        assert_eq!(table.rows[1][0], Cell::Null);
        assert_eq!(table.rows[0][2], Cell::Null);
        assert_eq!(table.rows[1][2], Cell::Bool(true));
        assert_eq!(table.columns[0].kind, ColumnKind::Numeric);
        assert_eq!(table.columns[2].kind, ColumnKind::Bool);
    }

    #[test]
    fn nested_values_are_kept_as_json_text() {
        let table = build_table(&records(json!([{"meta": {"k": 1}, "tags": [1, 2]}])));
        assert_eq!(table.rows[0][0], Cell::Text("{\"k\":1}".to_string()));
        assert_eq!(table.rows[0][1], Cell::Text("[1,2]".to_string()));
    }

    #[test]
    fn date_text_formats_are_accepted() {
        assert_eq!(parse_date_text("2024-01-05T00:00:00+03:00"), Some(date(2024, 1, 5)));
        assert_eq!(parse_date_text("2024-01-05T23:30:00.000+0300"), Some(date(2024, 1, 5)));
        assert_eq!(parse_date_text("2024-01-05T10:00:00"), Some(date(2024, 1, 5)));
        assert_eq!(parse_date_text("2024-01-05 10:00:00"), Some(date(2024, 1, 5)));
        assert_eq!(parse_date_text(" 2024-01-05 "), Some(date(2024, 1, 5)));
        assert_eq!(parse_date_text("05.01.2024"), Some(date(2024, 1, 5)));
        assert_eq!(parse_date_text("2024-W01"), None);
        assert_eq!(parse_date_text(""), None);
    }

    #[test]
    fn first_parseable_candidate_wins_and_bad_rows_are_dropped() {
        let mut table = build_table(&records(json!([
            {"gasDay": "n/a", "date": "2024-01-03", "v": "3"},
            {"gasDay": "n/a", "date": "bogus", "v": "1"},
            {"gasDay": "n/a", "date": "2024-01-01", "v": "2"}
        ])));

        let report = coerce_columns(&mut table, &["gasDay", "date", "day"], true);

        assert_eq!(report.date_column.as_deref(), Some("date"));
        assert_eq!(report.dropped_rows, 1);
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_kind("date"), Some(ColumnKind::Date));
        assert_eq!(table.column_kind("gasDay"), Some(ColumnKind::Text));
        assert_eq!(table.rows[0][1], Cell::Date(date(2024, 1, 1)));
        assert_eq!(table.rows[0][2], Cell::Int(2));
        assert_eq!(table.rows[1][2], Cell::Int(3));
    }

    #[test]
    fn numeric_coercion_is_all_or_nothing_per_column() {
        let mut table = build_table(&records(json!([
            {"a": "1.5", "b": "10", "c": null, "d": "x"},
            {"a": 2, "b": "oops", "c": null, "d": null}
        ])));

        let report = coerce_columns(&mut table, &[], true);

        assert_eq!(report.numeric_columns, vec!["a".to_string()]);
        assert_eq!(table.rows[0][0], Cell::Float(1.5));
        assert_eq!(table.rows[1][0], Cell::Int(2));
        assert_eq!(table.column_kind("b"), Some(ColumnKind::Text));
        assert_eq!(table.column_kind("c"), Some(ColumnKind::Text));
        assert_eq!(table.column_kind("d"), Some(ColumnKind::Text));
    }

    #[test]
    fn numeric_coercion_can_be_disabled() {
        let mut table = build_table(&records(json!([{"date": "2024-01-01", "n": "5"}])));
        coerce_columns(&mut table, &["date"], false);
        assert_eq!(table.rows[0][1], Cell::Text("5".to_string()));
    }

    #[test]
    fn strict_shape_projects_and_coerces() {
        let table = build_table(&records(json!([
            {"extra": 1, "tradeVolume": "12.5", "gasDay": "2024-01-02"},
            {"extra": 2, "tradeVolume": "bad", "gasDay": "2024-01-01"},
            {"extra": 3, "tradeVolume": 7, "gasDay": "nope"}
        ])));

        let shaped = required_shape(table, TOTALS).unwrap();

        assert_eq!(shaped.column_names(), vec!["gasDay", "tradeVolume"]);
        assert_eq!(shaped.len(), 2);
        assert_eq!(shaped.rows[0], vec![Cell::Date(date(2024, 1, 1)), Cell::Null]);
        assert_eq!(
            shaped.rows[1],
            vec![Cell::Date(date(2024, 1, 2)), Cell::Float(12.5)]
        );
    }

    #[test]
    fn strict_shape_reports_missing_fields() {
        let table = build_table(&records(json!([{"gasDay": "2024-01-01"}])));
        let err = required_shape(table, TOTALS).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::MissingRequiredFields {
                missing: vec!["tradeVolume".to_string()]
            }
        );
        assert!(err.to_string().contains("tradeVolume"));
    }

    #[test]
    fn strict_shape_on_empty_payload_keeps_declared_columns() {
        let shaped = normalize_payload(&json!({"items": []}), &TableSchema::strict(TOTALS)).unwrap();
        assert!(shaped.is_empty());
        assert_eq!(shaped.column_names(), vec!["gasDay", "tradeVolume"]);
    }

    #[test]
    fn strict_shape_accepts_aliases() {
        const ALIASED: &[FieldSpec] = &[FieldSpec {
            name: "gasDay",
            aliases: &["gas_day"],
            coercion: Coercion::Date,
        }];
        let table = build_table(&records(json!([{"gas_day": "2024-02-01"}])));
        let shaped = required_shape(table, ALIASED).unwrap();
        assert_eq!(shaped.column_names(), vec!["gasDay"]);
        assert_eq!(shaped.rows[0][0], Cell::Date(date(2024, 2, 1)));
    }
}
