//! Terminal dashboard for pre-computed cost-per-kilometer (CPK) tables.
//!
//! Datasets are loaded once into a [`registry::Registry`]; each user choice
//! is turned into a [`resolver::View`] by [`resolver::resolve`] and drawn by
//! the [`output`] functions.
pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod prompt;
pub mod registry;
pub mod reports;
pub mod resolver;
pub mod types;
pub mod util;

pub use error::{Error, Result};
pub use registry::{Entry, Registry};
pub use resolver::{resolve, Dashboard, Selection, SelectionEvent, View};
pub use types::{Cell, ChartSpec, ColumnHint, DisplayDescriptor, Table};
