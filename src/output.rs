use crate::error::Result;
use crate::registry::Registry;
use crate::resolver::{Selection, View};
use crate::reports::column_mean;
use crate::types::{Cell, ColumnHint, MenuRow};
use crate::util::format_number;
use serde::Serialize;
use std::path::Path;
use tabled::builder::Builder;
use tabled::settings::{object::Columns, Modify, Style, Width};
use tabled::Table;

const BAR_WIDTH: usize = 40;

/// Numbered option list; the active option carries a marker.
pub fn render_menu(registry: &Registry, selection: &Selection) -> String {
    let rows: Vec<MenuRow> = registry
        .entries()
        .iter()
        .enumerate()
        .map(|(i, e)| MenuRow {
            marker: if e.key == selection.key() { "▶".to_string() } else { String::new() },
            position: i + 1,
            label: e.label.clone(),
            key: e.key.clone(),
            rows: e.table.len(),
        })
        .collect();
    Table::new(rows).with(Style::markdown()).to_string()
}

pub fn page_count(view: &View<'_>) -> usize {
    let size = view.descriptor.page_size.max(1);
    view.table.len().div_ceil(size).max(1)
}

/// Render one page (0-based, clamped) of the view as a markdown table.
///
/// Columns with a `decimals` hint also get their mean over the whole view
/// printed under the page footer.
pub fn render_table(view: &View<'_>, page: usize) -> String {
    if view.is_empty() {
        return "(no rows)".to_string();
    }
    let size = view.descriptor.page_size.max(1);
    let pages = page_count(view);
    let page = page.min(pages - 1);

    let names = view.table.columns();
    let layout: Vec<(usize, Option<&ColumnHint>)> = view
        .descriptor
        .visible_columns(view.table)
        .into_iter()
        .map(|idx| (idx, view.descriptor.hint(&names[idx])))
        .collect();

    let mut builder = Builder::default();
    builder.push_record(layout.iter().map(|(idx, _)| names[*idx].clone()));
    for row in view.table.rows().iter().skip(page * size).take(size) {
        builder.push_record(
            layout
                .iter()
                .map(|(idx, hint)| row[*idx].render(hint.and_then(|h| h.decimals))),
        );
    }
    let mut table = builder.build();
    table.with(Style::markdown());
    for (i, (_, hint)) in layout.iter().enumerate() {
        if let Some(w) = hint.and_then(|h| h.width) {
            table.with(Modify::new(Columns::single(i)).with(Width::truncate(w).suffix("…")));
        }
    }

    let mut out = format!(
        "{}\n(page {} of {}, {} rows)",
        table,
        page + 1,
        pages,
        view.table.len()
    );
    for hint in &view.descriptor.columns {
        let mean = column_mean(view.table, &hint.name);
        if let (Some(decimals), Some(mean)) = (hint.decimals, mean) {
            out.push_str(&format!("\nmean {}: {}", hint.name, format_number(mean, decimals)));
        }
    }
    out
}

/// Horizontal bar chart for views that carry a chart spec. Rows without a
/// numeric value are skipped; bars are scaled to the largest magnitude.
pub fn render_chart(view: &View<'_>) -> Option<String> {
    let spec = view.descriptor.chart.as_ref()?;
    let table = view.table;
    let x = table.column_index(&spec.x)?;
    let y = table.column_index(&spec.y)?;
    let group = spec.color_by.as_deref().and_then(|g| table.column_index(g));

    let bars: Vec<(String, String, f64)> = table
        .rows()
        .iter()
        .filter_map(|r| {
            let v = r[y].as_f64()?;
            let g = group.map(|g| r[g].to_string()).unwrap_or_default();
            Some((r[x].to_string(), g, v))
        })
        .collect();
    if bars.is_empty() {
        return Some(format!("{} by {}: (no data)", spec.y, spec.x));
    }

    let max = bars.iter().map(|b| b.2.abs()).fold(0.0_f64, f64::max);
    let label_width = bars.iter().map(|b| b.0.chars().count()).max().unwrap_or(0);
    let mut groups: Vec<&str> = Vec::new();
    for b in &bars {
        if !groups.contains(&b.1.as_str()) {
            groups.push(&b.1);
        }
    }

    let mut out = format!("{} by {}\n", spec.y, spec.x);
    for g in groups {
        if group.is_some() {
            out.push_str(&format!("[{}]\n", g));
        }
        for (label, _, v) in bars.iter().filter(|b| b.1 == g) {
            let len = if max > 0.0 {
                ((v.abs() / max) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            out.push_str(&format!(
                "{:<width$} | {} {}\n",
                label,
                "█".repeat(len),
                format_number(*v, 2),
                width = label_width
            ));
        }
    }
    Some(out)
}

pub fn write_csv(path: &Path, view: &View<'_>) -> Result<()> {
    let idxs = view.descriptor.visible_columns(view.table);
    let names = view.table.columns();
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(idxs.iter().map(|i| names[*i].as_str()))?;
    for row in view.table.rows() {
        wtr.write_record(idxs.iter().map(|i| row[*i].to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct ViewExport<'a> {
    exported_at: String,
    key: &'a str,
    label: &'a str,
    title: &'a str,
    columns: Vec<&'a str>,
    rows: Vec<Vec<&'a Cell>>,
}

pub fn write_json(path: &Path, view: &View<'_>) -> Result<()> {
    let idxs = view.descriptor.visible_columns(view.table);
    let names = view.table.columns();
    let export = ViewExport {
        exported_at: chrono::Local::now().to_rfc3339(),
        key: view.key,
        label: view.label,
        title: &view.descriptor.title,
        rows: view
            .table
            .rows()
            .iter()
            .map(|r| idxs.iter().map(|i| &r[*i]).collect())
            .collect(),
        columns: idxs.iter().map(|i| names[*i].as_str()).collect(),
    };
    let s = serde_json::to_string_pretty(&export)?;
    std::fs::write(path, s)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Entry;
    use crate::resolver::Dashboard;
    use crate::types::{ChartSpec, DisplayDescriptor, Table as DataTable};

    fn dashboard() -> Dashboard {
        let mut rutas = DataTable::new(["Ruta", "Tipo", "CPK"]);
        for (r, t, c) in [
            ("Monterrey - Saltillo", "Carga", 3.25),
            ("Puebla - Veracruz", "Pasaje", 6.5),
            ("León - Querétaro", "Carga", 1.1),
        ] {
            rutas.push_row(vec![r.into(), t.into(), Cell::Float(c)]);
        }
        let mut descriptor = DisplayDescriptor::new("Rutas");
        descriptor.page_size = 2;
        descriptor.columns = vec![
            ColumnHint { name: "CPK".into(), width: None, decimals: Some(2) },
            ColumnHint { name: "Ruta".into(), width: Some(8), decimals: None },
        ];
        descriptor.chart = Some(ChartSpec {
            x: "Ruta".into(),
            y: "CPK".into(),
            color_by: Some("Tipo".into()),
        });
        let empty = Entry {
            key: "vacia".into(),
            label: "Vacía".into(),
            table: DataTable::new(["Ruta"]),
            descriptor: DisplayDescriptor::new("Vacía"),
        };
        let registry = Registry::new(
            vec![
                Entry { key: "rutas".into(), label: "Rutas".into(), table: rutas, descriptor },
                empty,
            ],
            "rutas",
        )
        .unwrap();
        Dashboard::new(registry)
    }

    #[test]
    fn menu_marks_active_option() {
        let dash = dashboard();
        let menu = render_menu(dash.registry(), dash.selection());
        let active = menu.lines().find(|l| l.contains("▶")).unwrap();
        assert!(active.contains("Rutas"));
        assert!(!active.contains("Vacía"));
    }

    #[test]
    fn table_pages_and_formats() {
        let dash = dashboard();
        let view = dash.view();
        assert_eq!(page_count(&view), 2);
        let first = render_table(&view, 0);
        let header = first.lines().next().unwrap();
        assert!(header.find("CPK").unwrap() < header.find("Ruta").unwrap());
        assert!(first.contains("3.25"));
        assert!(first.contains("6.50"));
        assert!(!first.contains("1.10"));
        assert!(first.contains("(page 1 of 2, 3 rows)"));
        let last = render_table(&view, 7);
        assert!(last.contains("1.10"));
        assert!(last.contains("(page 2 of 2, 3 rows)"));
        assert!(last.ends_with("mean CPK: 3.62"));
    }

    #[test]
    fn repeated_headers_keep_every_column() {
        let mut table = DataTable::new(["Ruta", "CPK", "CPK"]);
        table.push_row(vec!["Norte".into(), Cell::Float(1.5), Cell::Float(9.9)]);
        let registry = Registry::new(
            vec![Entry {
                key: "dup".into(),
                label: "Duplicadas".into(),
                table,
                descriptor: DisplayDescriptor::new("Duplicadas"),
            }],
            "dup",
        )
        .unwrap();
        let dash = Dashboard::new(registry);
        let view = dash.view();
        let rendered = render_table(&view, 0);
        assert!(rendered.contains("9.9"));
        assert_eq!(rendered.lines().next().unwrap().matches("CPK").count(), 2);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup.csv");
        write_csv(&path, &view).unwrap();
        let csv = std::fs::read_to_string(&path).unwrap();
        assert_eq!(csv.lines().collect::<Vec<_>>(), vec!["Ruta,CPK,CPK", "Norte,1.5,9.9"]);
    }

    #[test]
    fn empty_view_renders_placeholder() {
        let mut dash = dashboard();
        let view = dash.handle(&crate::resolver::SelectionEvent::Position(2));
        assert_eq!(render_table(&view, 0), "(no rows)");
        assert!(render_chart(&view).is_none());
    }

    #[test]
    fn chart_groups_by_color_field() {
        let dash = dashboard();
        let chart = render_chart(&dash.view()).unwrap();
        let carga = chart.find("[Carga]").unwrap();
        let pasaje = chart.find("[Pasaje]").unwrap();
        assert!(carga < pasaje);
        let longest = chart.lines().find(|l| l.contains("Puebla")).unwrap();
        assert_eq!(longest.matches('█').count(), BAR_WIDTH);
    }

    #[test]
    fn exports_visible_columns() {
        let dir = tempfile::tempdir().unwrap();
        let dash = dashboard();
        let view = dash.view();

        let csv_path = dir.path().join("rutas.csv");
        write_csv(&csv_path, &view).unwrap();
        let csv = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(csv.lines().next(), Some("CPK,Ruta,Tipo"));
        assert_eq!(csv.lines().nth(1), Some("3.25,Monterrey - Saltillo,Carga"));

        let json_path = dir.path().join("rutas.json");
        write_json(&json_path, &view).unwrap();
        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(v["key"], "rutas");
        assert_eq!(v["columns"][0], "CPK");
        assert_eq!(v["rows"][1][0], 6.5);
        assert!(v["exported_at"].is_string());
    }
}
