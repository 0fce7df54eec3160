//! Display Table projection and chart-series inference.
//!
//! The Display Table is cosmetic: source columns are matched by name
//! patterns, renamed to human labels, optionally reduced to those labels and
//! stringified for rendering. CSV export never goes through this module.

use std::collections::HashSet;

use serde::Serialize;

use crate::normalizer::parse_number;
use crate::table::{Cell, ColumnKind, NormalizedTable};

const GAS_DAY: &str = "gasDay";
const DATE: &str = "date";
const DEFAULT_VALUE_TITLE: &str = "Value";
const CHART_X_LABEL: &str = "Date";

const TRUE_TOKENS: [&str; 4] = ["true", "1", "yes", "evet"];
const FALSE_TOKENS: [&str; 4] = ["false", "0", "no", "hayir"];
const PARTICIPATION_REFERENCE: &str = "FGM Participation";
const PARTICIPATION_TARGETS: [&str; 3] = ["SGM Participation", "FGM Participation", "Legal Entity Status"];

/// How a display label finds its source column. Name comparisons are
/// case-insensitive and never pick a column another label already claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnMatcher {
    /// Lower-cased name equals one of the given names.
    Exact(&'static [&'static str]),
    /// Like `Exact`, else the first column of the table.
    ExactOrFirst(&'static [&'static str]),
    /// Lower-cased name contains every fragment.
    ContainsAll(&'static [&'static str]),
    /// Lower-cased name contains at least one fragment.
    ContainsAny(&'static [&'static str]),
    FirstNumeric,
    FirstUnclaimed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub label: &'static str,
    pub matcher: ColumnMatcher,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcess {
    None,
    /// Harmonise participant flag columns to the FGM column's value type.
    ParticipationFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySchema {
    pub fields: &'static [FieldRule],
    /// Give still-unfilled labels the remaining columns in table order.
    pub fallback: bool,
    /// Keep only the labelled columns, in label order.
    pub keep_only: bool,
    pub post: PostProcess,
}

impl DisplaySchema {
    pub const PASSTHROUGH: Self = Self {
        fields: &[],
        fallback: false,
        keep_only: false,
        post: PostProcess::None,
    };

    pub const fn renaming(fields: &'static [FieldRule]) -> Self {
        Self {
            fields,
            fallback: false,
            keep_only: false,
            post: PostProcess::None,
        }
    }

    pub const fn with_fallback(fields: &'static [FieldRule]) -> Self {
        Self {
            fields,
            fallback: true,
            keep_only: false,
            post: PostProcess::None,
        }
    }

    pub const fn projected(fields: &'static [FieldRule]) -> Self {
        Self {
            fields,
            fallback: true,
            keep_only: true,
            post: PostProcess::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartRule {
    /// `gasDay` or `date` against the first numeric column.
    Auto,
    Fixed {
        x: &'static str,
        y: &'static str,
        title: &'static str,
    },
    /// One date axis and several named series.
    Series {
        x: ColumnMatcher,
        series: &'static [FieldRule],
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub title: String,
    pub x_label: String,
    pub x: Vec<String>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartAxes<'a> {
    pub x: Option<&'a str>,
    pub y: Option<&'a str>,
}

/// Auto axes: x is `gasDay`, else `date`; y is the first numeric column.
pub fn detect_axes(table: &NormalizedTable) -> ChartAxes<'_> {
    let x = [GAS_DAY, DATE]
        .into_iter()
        .find(|name| table.has_column(name));
    ChartAxes {
        x,
        y: table.first_numeric_column(),
    }
}

/// Column whose values the display formats as `1,234.50`.
pub fn value_column<'a>(table: &'a NormalizedTable, rule: &ChartRule) -> Option<&'a str> {
    match rule {
        ChartRule::Fixed { y, .. } => table
            .column_index(y)
            .map(|idx| table.columns[idx].name.as_str()),
        ChartRule::Auto | ChartRule::Series { .. } => detect_axes(table).y,
    }
}

pub fn infer_chart(table: &NormalizedTable, rule: &ChartRule) -> Option<ChartSeries> {
    if table.is_empty() {
        return None;
    }

    match rule {
        ChartRule::Auto => {
            let axes = detect_axes(table);
            let (x, y) = (axes.x?, axes.y?);
            Some(single_series(table, x, y, y))
        }
        ChartRule::Fixed { x, y, title } => {
            if !table.has_column(x) || !table.has_column(y) {
                return None;
            }
            Some(single_series(table, x, y, title))
        }
        ChartRule::Series { x, series } => {
            let mut claimed = HashSet::new();
            let x_idx = find_column(table, x, &claimed)?;
            claimed.insert(x_idx);

            let mut lines = Vec::new();
            for rule in series.iter() {
                if let Some(idx) = find_column(table, &rule.matcher, &claimed) {
                    claimed.insert(idx);
                    lines.push(Series {
                        name: rule.label.to_string(),
                        values: table.column_cells(idx).map(Cell::as_f64).collect(),
                    });
                }
            }
            if lines.is_empty() {
                return None;
            }

            Some(ChartSeries {
                title: lines
                    .iter()
                    .map(|line| line.name.as_str())
                    .collect::<Vec<_>>()
                    .join(" / "),
                x_label: CHART_X_LABEL.to_string(),
                x: table.column_cells(x_idx).map(Cell::to_plain_string).collect(),
                series: lines,
            })
        }
    }
}

pub fn build_display(
    table: &NormalizedTable,
    schema: &DisplaySchema,
    value_column: Option<&str>,
) -> DisplayTable {
    let mut labels: Vec<Option<&'static str>> = vec![None; table.columns.len()];
    let mut claimed = HashSet::new();
    let mut filled: Vec<Option<usize>> = vec![None; schema.fields.len()];

    for (slot, rule) in schema.fields.iter().enumerate() {
        if let Some(idx) = find_column(table, &rule.matcher, &claimed) {
            claimed.insert(idx);
            labels[idx] = Some(rule.label);
            filled[slot] = Some(idx);
        }
    }

    if schema.fallback {
        let mut unused = (0..table.columns.len()).filter(|idx| !claimed.contains(idx));
        for (slot, rule) in schema.fields.iter().enumerate() {
            if filled[slot].is_some() {
                continue;
            }
            let Some(idx) = unused.next() else {
                break;
            };
            labels[idx] = Some(rule.label);
            filled[slot] = Some(idx);
        }
    }

    let order: Vec<usize> = if schema.keep_only && filled.iter().any(Option::is_some) {
        filled.iter().flatten().copied().collect()
    } else {
        (0..table.columns.len()).collect()
    };

    let value_idx = value_column.and_then(|name| table.column_index(name));
    let columns: Vec<String> = order
        .iter()
        .map(|idx| {
            labels[*idx]
                .map(str::to_string)
                .unwrap_or_else(|| table.columns[*idx].name.clone())
        })
        .collect();

    let mut cells: Vec<Vec<Cell>> = table
        .rows
        .iter()
        .map(|row| order.iter().map(|idx| row[*idx].clone()).collect())
        .collect();

    if schema.post == PostProcess::ParticipationFlags {
        harmonise_participation(&columns, &mut cells);
    }

    let rows = cells
        .iter()
        .map(|row| {
            row.iter()
                .zip(&order)
                .map(|(cell, idx)| {
                    if Some(*idx) == value_idx {
                        format_value(cell)
                    } else {
                        display_cell(cell)
                    }
                })
                .collect()
        })
        .collect();

    DisplayTable { columns, rows }
}

/// `1234.5` → `1,234.50`.
pub fn format_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (pos, digit) in whole.chars().enumerate() {
        if pos > 0 && (whole.len() - pos) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

fn single_series(table: &NormalizedTable, x: &str, y: &str, title: &str) -> ChartSeries {
    let x_idx = table.column_index(x).unwrap_or(0);
    let y_idx = table.column_index(y).unwrap_or(0);
    ChartSeries {
        title: title.to_string(),
        x_label: CHART_X_LABEL.to_string(),
        x: table.column_cells(x_idx).map(Cell::to_plain_string).collect(),
        series: vec![Series {
            name: if title.is_empty() {
                DEFAULT_VALUE_TITLE.to_string()
            } else {
                title.to_string()
            },
            values: table.column_cells(y_idx).map(Cell::as_f64).collect(),
        }],
    }
}

fn find_column(
    table: &NormalizedTable,
    matcher: &ColumnMatcher,
    claimed: &HashSet<usize>,
) -> Option<usize> {
    let mut free = table
        .columns
        .iter()
        .enumerate()
        .filter(|(idx, _)| !claimed.contains(idx));

    match matcher {
        ColumnMatcher::Exact(names) => free
            .find(|(_, col)| names.contains(&col.name.to_lowercase().as_str()))
            .map(|(idx, _)| idx),
        ColumnMatcher::ExactOrFirst(names) => {
            let exact = find_column(table, &ColumnMatcher::Exact(names), claimed);
            exact.or_else(|| (!table.columns.is_empty() && !claimed.contains(&0)).then_some(0))
        }
        ColumnMatcher::ContainsAll(parts) => free
            .find(|(_, col)| {
                let lower = col.name.to_lowercase();
                parts.iter().all(|part| lower.contains(part))
            })
            .map(|(idx, _)| idx),
        ColumnMatcher::ContainsAny(parts) => free
            .find(|(_, col)| {
                let lower = col.name.to_lowercase();
                parts.iter().any(|part| lower.contains(part))
            })
            .map(|(idx, _)| idx),
        ColumnMatcher::FirstNumeric => free
            .find(|(_, col)| col.kind == ColumnKind::Numeric)
            .map(|(idx, _)| idx),
        ColumnMatcher::FirstUnclaimed => free.next().map(|(idx, _)| idx),
    }
}

fn display_cell(cell: &Cell) -> String {
    match cell {
        Cell::Null => "-".to_string(),
        other => other.to_plain_string(),
    }
}

fn format_value(cell: &Cell) -> String {
    match cell.as_f64() {
        Some(value) => format_thousands(value),
        None => display_cell(cell),
    }
}

fn harmonise_participation(columns: &[String], rows: &mut [Vec<Cell>]) {
    let Some(reference) = columns.iter().position(|name| name == PARTICIPATION_REFERENCE) else {
        return;
    };
    let targets: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, name)| PARTICIPATION_TARGETS.contains(&name.as_str()))
        .map(|(idx, _)| idx)
        .collect();

    let reference_cells: Vec<&Cell> = rows
        .iter()
        .map(|row| &row[reference])
        .filter(|cell| !cell.is_null())
        .collect();
    let bool_like = !reference_cells.is_empty()
        && reference_cells.iter().all(|cell| bool_token(cell).is_some());
    let numeric = !reference_cells.is_empty() && reference_cells.iter().all(|cell| cell.is_numeric());

    for row in rows.iter_mut() {
        for idx in &targets {
            let cell = &row[*idx];
            if cell.is_null() {
                continue;
            }
            let harmonised = if bool_like {
                bool_token(cell).map(Cell::Bool).unwrap_or_else(|| cell.clone())
            } else if numeric {
                match cell {
                    Cell::Int(_) | Cell::Float(_) => cell.clone(),
                    other => parse_number(&other.to_plain_string()).unwrap_or(Cell::Null),
                }
            } else {
                Cell::Text(cell.to_plain_string())
            };
            row[*idx] = harmonised;
        }
    }
}

fn bool_token(cell: &Cell) -> Option<bool> {
    if let Cell::Bool(value) = cell {
        return Some(*value);
    }
    let token = cell.to_plain_string().trim().to_lowercase();
    if TRUE_TOKENS.contains(&token.as_str()) {
        Some(true)
    } else if FALSE_TOKENS.contains(&token.as_str()) {
        Some(false)
    } else {
        None
    }
}
