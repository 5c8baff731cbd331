use crate::error::Result;
use crate::reports::Derive;
use crate::types::{ChartSpec, ColumnHint};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const RUTAS_WORKBOOK: &str = "Rutas_Resumen.xlsx";

// The stock CPK dashboard: four sheets of one workbook, one button each.
static BUILTIN: Lazy<Config> = Lazy::new(|| {
    let option = |key: &str, label: &str, sheet: &str| OptionConfig {
        key: key.to_string(),
        label: label.to_string(),
        source: SourceConfig {
            path: PathBuf::from(RUTAS_WORKBOOK),
            sheet: Some(sheet.to_string()),
        },
        columns: Vec::new(),
        chart: None,
        derive: Vec::new(),
    };
    Config {
        title: "Top 10 Rutas Unidades Más y Menos Eficientes".to_string(),
        subtitle: Some(
            "CPK calculado contemplando Costo de combustible y Costo de Mantenimiento \
             entre Kilometros totales recorridos por cada unidad"
                .to_string(),
        ),
        data_dir: PathBuf::from("./data"),
        default: Some("btn-top10-eficientes".to_string()),
        page_size: default_page_size(),
        options: vec![
            option(
                "btn-top10-eficientes",
                "Top 10 Rutas Más Eficientes",
                "Top 10 Rutas Mas Eficientes",
            ),
            option(
                "btn-top10-menos-eficientes",
                "Top 10 Rutas Menos Eficientes",
                "Top 10 Rutas Menos Eficientes",
            ),
            option(
                "btn-top10-unidades-eficientes",
                "Top 10 Unidades Más Eficientes",
                "Top 10 Unidades Más Eficientes",
            ),
            option(
                "btn-top10-unidades-menos-eficientes",
                "Top 10 Unidades Menos Eficientes",
                "Top 10 Unidades Menos Eficientes",
            ),
        ],
    }
});

fn default_page_size() -> usize {
    10
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OptionConfig {
    pub key: String,
    pub label: String,
    pub source: SourceConfig,
    #[serde(default)]
    pub columns: Vec<ColumnHint>,
    #[serde(default)]
    pub chart: Option<ChartSpec>,
    #[serde(default)]
    pub derive: Vec<Derive>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Option selected before any event; the first option when unset.
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub options: Vec<OptionConfig>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::parse(&s)
    }

    pub fn parse(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    pub fn with_data_dir(mut self, dir: PathBuf) -> Self {
        self.data_dir = dir;
        self
    }

    /// The declared default key, falling back to the first option.
    pub fn default_key(&self) -> Option<&str> {
        self.default
            .as_deref()
            .or_else(|| self.options.first().map(|o| o.key.as_str()))
    }

    /// Relative source paths are taken from `data_dir`.
    pub fn resolve_path(&self, source: &SourceConfig) -> PathBuf {
        if source.path.is_absolute() {
            source.path.clone()
        } else {
            self.data_dir.join(&source.path)
        }
    }
}
