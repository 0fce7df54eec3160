//! Row-oriented table built from EPIAS record lists.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(value) => Some(*value),
            _ => None,
        }
    }

    /// Plain text rendering shared by CSV export and the display layer.
    /// Nulls render as an empty string.
    pub fn to_plain_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Text(value) => value.clone(),
            Self::Date(value) => value.format("%Y-%m-%d").to_string(),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Int(value) => serializer.serialize_i64(*value),
            Self::Float(value) => serializer.serialize_f64(*value),
            Self::Text(value) => serializer.serialize_str(value),
            Self::Date(value) => serializer.serialize_str(&value.format("%Y-%m-%d").to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Numeric,
    Bool,
    Date,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

impl NormalizedTable {
    pub fn with_columns(names: &[&str]) -> Self {
        Self {
            columns: names
                .iter()
                .map(|name| Column {
                    name: (*name).to_string(),
                    kind: ColumnKind::Text,
                })
                .collect(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|col| col.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        self.column_index(name).map(|idx| self.columns[idx].kind)
    }

    pub fn column_cells(&self, idx: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// First numeric column in table order.
    pub fn first_numeric_column(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|col| col.kind == ColumnKind::Numeric)
            .map(|col| col.name.as_str())
    }

    /// First date-typed column in table order.
    pub fn first_date_column(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|col| col.kind == ColumnKind::Date)
            .map(|col| col.name.as_str())
    }

    /// Keeps only the named columns, in the given order. Unknown names are skipped.
    pub fn project(&self, names: &[&str]) -> Self {
        let indices: Vec<usize> = names
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();

        Self {
            columns: indices.iter().map(|idx| self.columns[*idx].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|idx| row[*idx].clone()).collect())
                .collect(),
        }
    }

    /// Recomputes the kind of a column from its cells. Date kinds are only
    /// assigned by date coercion and are kept as they are.
    pub fn refresh_kind(&mut self, idx: usize) {
        if self.columns[idx].kind == ColumnKind::Date {
            return;
        }
        self.columns[idx].kind = infer_kind(self.column_cells(idx));
    }
}

pub(crate) fn infer_kind<'a>(cells: impl Iterator<Item = &'a Cell>) -> ColumnKind {
    let mut seen_any = false;
    let mut all_numeric = true;
    let mut all_bool = true;

    for cell in cells {
        if cell.is_null() {
            continue;
        }
        seen_any = true;
        all_numeric &= cell.is_numeric();
        all_bool &= matches!(cell, Cell::Bool(_));
    }

    match (seen_any, all_numeric, all_bool) {
        (false, _, _) => ColumnKind::Text,
        (true, true, _) => ColumnKind::Numeric,
        (true, _, true) => ColumnKind::Bool,
        _ => ColumnKind::Text,
    }
}
