use crate::config::{Config, SourceConfig};
use crate::error::{Error, Result};
use crate::registry::{Entry, Registry};
use crate::reports::apply_all;
use crate::types::{Cell, DisplayDescriptor, Table};
use crate::util::parse_cell;
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::NaiveTime;
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub options: usize,
    pub total_rows: usize,
    pub empty_tables: Vec<String>,
}

enum Format {
    Csv,
    Spreadsheet,
}

fn detect_format(path: &Path) -> Result<Format> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" | "txt" => Ok(Format::Csv),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Format::Spreadsheet),
        _ => Err(Error::UnsupportedFormat(path.to_path_buf())),
    }
}

fn header_name(raw: &str, idx: usize) -> String {
    let s = raw.trim();
    if s.is_empty() {
        format!("column_{}", idx + 1)
    } else {
        s.to_string()
    }
}

/// Blank headers become `column_N`; repeats get a `.1`, `.2`, ... suffix
/// so every column stays addressable by name.
fn unique_headers<'a, I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for (idx, r) in raw.into_iter().enumerate() {
        let base = header_name(r, idx);
        let mut name = base.clone();
        let mut n = 0;
        while seen.contains(&name) {
            n += 1;
            name = format!("{}.{}", base, n);
        }
        seen.insert(name.clone());
        out.push(name);
    }
    out
}

/// Load one table. `sheet` is ignored for CSV; for spreadsheets it picks
/// the sheet by name, defaulting to the first one.
pub fn load_table(path: &Path, sheet: Option<&str>) -> Result<Table> {
    match detect_format(path)? {
        Format::Csv => load_csv(path),
        Format::Spreadsheet => load_sheet(path, sheet),
    }
}

pub fn load_csv(path: &Path) -> Result<Table> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = rdr.headers()?.clone();
    let mut table = Table::new(unique_headers(headers.iter()));
    for result in rdr.records() {
        let record = result?;
        table.push_row(record.iter().map(parse_cell).collect());
    }
    Ok(table)
}

fn sheet_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Bool(b) => Cell::Bool(*b),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::String(s) => parse_cell(s),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(dt) if dt.time() == NaiveTime::MIN => {
                Cell::Text(dt.format("%Y-%m-%d").to_string())
            }
            Some(dt) => Cell::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => Cell::Empty,
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

fn pick_sheet(path: &Path, names: &[String], sheet: Option<&str>) -> Result<String> {
    let not_found = |sheet: &str| Error::SheetNotFound {
        path: path.to_path_buf(),
        sheet: sheet.to_string(),
    };
    match sheet {
        Some(s) if names.iter().any(|n| n == s) => Ok(s.to_string()),
        Some(s) => Err(not_found(s)),
        None => names.first().cloned().ok_or_else(|| not_found("<first>")),
    }
}

/// First row is the header; an empty range is an empty table.
pub fn table_from_range(range: &Range<Data>) -> Table {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Table::default();
    };
    let names: Vec<String> = header.iter().map(|c| sheet_cell(c).to_string()).collect();
    let mut table = Table::new(unique_headers(names.iter().map(String::as_str)));
    for row in rows {
        table.push_row(row.iter().map(sheet_cell).collect());
    }
    table
}

pub fn load_sheet(path: &Path, sheet: Option<&str>) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names().to_vec();
    let name = pick_sheet(path, &names, sheet)?;
    let range = workbook.worksheet_range(&name)?;
    Ok(table_from_range(&range))
}

fn load_option(config: &Config, source: &SourceConfig) -> Result<Table> {
    let path = config.resolve_path(source);
    load_table(&path, source.sheet.as_deref())
}

/// Load every configured option and build the registry.
///
/// Any failure here aborts startup: no selection can happen against a
/// partially loaded registry.
pub fn build_registry(config: &Config) -> Result<(Registry, LoadReport)> {
    let mut report = LoadReport::default();
    let mut entries = Vec::with_capacity(config.options.len());
    for opt in &config.options {
        let raw = load_option(config, &opt.source)?;
        let table = apply_all(raw, &opt.derive)?;
        info!(key = %opt.key, rows = table.len(), columns = table.columns().len(), "option loaded");
        if table.is_empty() {
            warn!(key = %opt.key, "option has no rows");
            report.empty_tables.push(opt.key.clone());
        }
        report.total_rows += table.len();
        report.options += 1;
        entries.push(Entry {
            key: opt.key.clone(),
            label: opt.label.clone(),
            descriptor: DisplayDescriptor {
                title: opt.label.clone(),
                columns: opt.columns.clone(),
                page_size: config.page_size.max(1),
                chart: opt.chart.clone(),
            },
            table,
        });
    }
    let default_key = config.default_key().ok_or(Error::NoOptions)?.to_string();
    let registry = Registry::new(entries, &default_key)?;
    Ok((registry, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_keeps_column_and_row_order() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "rutas.csv", "Ruta,CPK,,Unidad\nNorte,4.5,x,007\nSur,\"1,200\"\n");
        let t = load_table(&path, None).unwrap();
        assert_eq!(t.columns(), &["Ruta", "CPK", "column_3", "Unidad"]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.cell(0, "CPK"), Some(&Cell::Float(4.5)));
        assert_eq!(t.cell(0, "Unidad"), Some(&Cell::Text("007".into())));
        assert_eq!(t.cell(1, "CPK"), Some(&Cell::Int(1200)));
        assert_eq!(t.cell(1, "Unidad"), Some(&Cell::Empty));
    }

    #[test]
    fn repeated_csv_headers_get_suffixes() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "dup.csv", "Ruta,CPK,CPK,\nNorte,1.5,9.9,x\n");
        let t = load_table(&path, None).unwrap();
        assert_eq!(t.columns(), &["Ruta", "CPK", "CPK.1", "column_4"]);
        assert_eq!(t.cell(0, "CPK.1"), Some(&Cell::Float(9.9)));
    }

    #[test]
    fn sheet_range_becomes_table() {
        use calamine::{CellErrorType, ExcelDateTime, ExcelDateTimeType};
        let mut range: Range<Data> = Range::new((0, 0), (2, 3));
        range.set_value((0, 0), Data::String("Unidad".into()));
        range.set_value((0, 1), Data::String("Fecha".into()));
        range.set_value((0, 3), Data::String("CPK".into()));
        let date = |v| Data::DateTime(ExcelDateTime::new(v, ExcelDateTimeType::DateTime, false));
        range.set_value((1, 0), Data::String("007".into()));
        range.set_value((1, 1), date(45292.0));
        range.set_value((1, 2), Data::Error(CellErrorType::Div0));
        range.set_value((1, 3), Data::Float(3.5));
        range.set_value((2, 0), Data::Int(12));
        range.set_value((2, 1), date(45292.5));
        range.set_value((2, 3), Data::Bool(true));

        let t = table_from_range(&range);
        assert_eq!(t.columns(), &["Unidad", "Fecha", "column_3", "CPK"]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.cell(0, "Unidad"), Some(&Cell::Text("007".into())));
        assert_eq!(t.cell(0, "Fecha"), Some(&Cell::Text("2024-01-01".into())));
        assert_eq!(t.cell(0, "column_3"), Some(&Cell::Empty));
        assert_eq!(t.cell(0, "CPK"), Some(&Cell::Float(3.5)));
        assert_eq!(t.cell(1, "Unidad"), Some(&Cell::Int(12)));
        assert_eq!(t.cell(1, "Fecha"), Some(&Cell::Text("2024-01-01 12:00:00".into())));
        assert_eq!(t.cell(1, "CPK"), Some(&Cell::Bool(true)));
    }

    #[test]
    fn empty_sheet_is_empty_table() {
        let range: Range<Data> = Range::empty();
        assert_eq!(table_from_range(&range), Table::default());
    }

    #[test]
    fn sheet_selection_by_name_or_first() {
        let path = Path::new("Rutas_Resumen.xlsx");
        let names = vec!["Top 10 Rutas Mas Eficientes".to_string(), "Otra".to_string()];
        assert_eq!(pick_sheet(path, &names, Some("Otra")).unwrap(), "Otra");
        assert_eq!(pick_sheet(path, &names, None).unwrap(), names[0]);
        let err = pick_sheet(path, &names, Some("Hoja1")).unwrap_err();
        assert!(matches!(&err, Error::SheetNotFound { sheet, .. } if sheet == "Hoja1"));
        assert_eq!(err.exit_code(), 2);
        assert!(matches!(pick_sheet(path, &[], None), Err(Error::SheetNotFound { .. })));
    }

    #[test]
    fn missing_workbook_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = load_table(&dir.path().join("Rutas_Resumen.xlsx"), Some("Hoja1")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = load_table(&dir.path().join("nope.csv"), None).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_table(Path::new("rutas.parquet"), None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn build_registry_applies_derive_and_default() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.csv", "Ruta,CPK\nNorte,4.0\nSur,2.0\nCentro,3.0\n");
        write(&dir, "b.csv", "Ruta,CPK\n");
        let cfg = Config::parse(&format!(
            r#"
title = "t"
data_dir = {:?}
default = "b"
page_size = 0

[[options]]
key = "a"
label = "Más eficientes"
source = {{ path = "a.csv" }}
derive = [{{ op = "nsmallest", column = "CPK", n = 2 }}]

[[options]]
key = "b"
label = "Vacía"
source = {{ path = "b.csv" }}
"#,
            dir.path().display().to_string()
        ))
        .unwrap();
        let (reg, report) = build_registry(&cfg).unwrap();
        assert_eq!(reg.default_key(), "b");
        assert_eq!(report.options, 2);
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.empty_tables, vec!["b".to_string()]);
        let a = reg.get("a").unwrap();
        assert_eq!(a.table.cell(0, "Ruta"), Some(&Cell::Text("Sur".into())));
        assert_eq!(a.descriptor.page_size, 1);
    }
}
