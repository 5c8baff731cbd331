use crate::util::format_number;
use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// A single typed value in a [`Table`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Render the cell for display. `decimals` only affects floats.
    pub fn render(&self, decimals: Option<usize>) -> String {
        match (self, decimals) {
            (Cell::Float(f), Some(d)) => format_number(*f, d),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Self {
        Cell::Int(i)
    }
}

impl From<f64> for Cell {
    fn from(f: f64) -> Self {
        Cell::Float(f)
    }
}

/// Ordered columns plus rows aligned to them.
///
/// Column order and row order both carry meaning: columns are displayed in
/// the order given, rows are kept in ranking order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, padding with `Empty` or truncating to the column count.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Same columns, no rows.
    pub fn empty_like(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnHint {
    pub name: String,
    #[serde(default)]
    pub width: Option<usize>,
    #[serde(default)]
    pub decimals: Option<usize>,
}

/// Bar chart description: one bar per row, `x` labels it, `y` sizes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub x: String,
    pub y: String,
    #[serde(default)]
    pub color_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayDescriptor {
    pub title: String,
    pub columns: Vec<ColumnHint>,
    pub page_size: usize,
    pub chart: Option<ChartSpec>,
}

impl DisplayDescriptor {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            columns: Vec::new(),
            page_size: 10,
            chart: None,
        }
    }

    pub fn hint(&self, column: &str) -> Option<&ColumnHint> {
        self.columns.iter().find(|h| h.name == column)
    }

    /// Display order as column indices: hinted columns first (those the
    /// table has), then every remaining column in table order. Indices, not
    /// names, so a repeated header never hides a column.
    pub fn visible_columns(&self, table: &Table) -> Vec<usize> {
        let mut out: Vec<usize> = Vec::with_capacity(table.columns().len());
        for h in &self.columns {
            if let Some(idx) = table.column_index(&h.name) {
                if !out.contains(&idx) {
                    out.push(idx);
                }
            }
        }
        for idx in 0..table.columns().len() {
            if !out.contains(&idx) {
                out.push(idx);
            }
        }
        out
    }
}

/// One line of the option menu.
#[derive(Debug, Clone, Tabled)]
pub struct MenuRow {
    #[tabled(rename = "")]
    pub marker: String,
    #[tabled(rename = "#")]
    pub position: usize,
    #[tabled(rename = "Option")]
    pub label: String,
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Rows")]
    pub rows: usize,
}
