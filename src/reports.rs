use crate::error::{Error, Result};
use crate::types::{Cell, Table};
use crate::util::average;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// One aggregation step applied to a loaded table before it is registered.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Derive {
    Nlargest { column: String, n: usize },
    Nsmallest { column: String, n: usize },
    GroupMean { by: String, value: String },
    FilterEq { column: String, value: String },
}

impl Derive {
    pub fn apply(&self, table: &Table) -> Result<Table> {
        match self {
            Derive::Nlargest { column, n } => nlargest(table, column, *n),
            Derive::Nsmallest { column, n } => nsmallest(table, column, *n),
            Derive::GroupMean { by, value } => group_mean(table, by, value),
            Derive::FilterEq { column, value } => filter_eq(table, column, value),
        }
    }
}

pub fn apply_all(table: Table, steps: &[Derive]) -> Result<Table> {
    steps.iter().try_fold(table, |t, step| step.apply(&t))
}

fn require(table: &Table, column: &str) -> Result<usize> {
    table
        .column_index(column)
        .ok_or_else(|| Error::MissingColumn(column.to_string()))
}

// Ranking puts numeric values first, then everything else in input
// order. `descending` flips only the numeric comparison.
fn top_n(table: &Table, column: &str, n: usize, descending: bool) -> Result<Table> {
    let idx = require(table, column)?;
    let mut ranked: Vec<&Vec<Cell>> = table.rows().iter().collect();
    // `sort_by` is stable, so ties keep input order.
    ranked.sort_by(|a, b| match (a[idx].as_f64(), b[idx].as_f64()) {
        (Some(x), Some(y)) => {
            let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    let mut out = table.empty_like();
    for row in ranked.into_iter().take(n) {
        out.push_row(row.clone());
    }
    Ok(out)
}

pub fn nlargest(table: &Table, column: &str, n: usize) -> Result<Table> {
    top_n(table, column, n, true)
}

pub fn nsmallest(table: &Table, column: &str, n: usize) -> Result<Table> {
    top_n(table, column, n, false)
}

/// Mean of `value` per distinct `by`, groups in order of first appearance.
pub fn group_mean(table: &Table, by: &str, value: &str) -> Result<Table> {
    let by_idx = require(table, by)?;
    let value_idx = require(table, value)?;

    let mut order: Vec<&Cell> = Vec::new();
    let mut groups: HashMap<String, Vec<f64>> = HashMap::new();
    for row in table.rows() {
        let k = &row[by_idx];
        let values = groups.entry(k.to_string()).or_insert_with(|| {
            order.push(k);
            Vec::new()
        });
        if let Some(v) = row[value_idx].as_f64() {
            values.push(v);
        }
    }

    let mut out = Table::new([by, value]);
    for k in order {
        let values = &groups[&k.to_string()];
        let mean = if values.is_empty() {
            Cell::Empty
        } else {
            Cell::Float(average(values))
        };
        out.push_row(vec![k.clone(), mean]);
    }
    Ok(out)
}

pub fn filter_eq(table: &Table, column: &str, value: &str) -> Result<Table> {
    let idx = require(table, column)?;
    let mut out = table.empty_like();
    for row in table.rows().iter().filter(|r| r[idx].to_string() == value) {
        out.push_row(row.clone());
    }
    Ok(out)
}

pub fn column_mean(table: &Table, column: &str) -> Option<f64> {
    let idx = table.column_index(column)?;
    let values: Vec<f64> = table.rows().iter().filter_map(|r| r[idx].as_f64()).collect();
    if values.is_empty() {
        None
    } else {
        Some(average(&values))
    }
}
