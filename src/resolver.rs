// Selection-driven view resolution.
//
// `resolve` is a pure function of (event, registry, previous selection):
// a recognised event moves the selection, anything else leaves it where it
// was. `Dashboard` wraps it as the single entry point the UI loop calls.
use crate::registry::{Entry, Registry};
use crate::types::{DisplayDescriptor, Table};
use tracing::debug;

/// A discrete user choice: text typed in, or an explicit menu position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    /// Raw text: matched as a key, then a label, then a menu number.
    Key(String),
    /// 1-based, as shown in the menu.
    Position(usize),
}

impl SelectionEvent {
    /// Typed input keeps its text so numeric keys such as `"2024"` stay
    /// selectable; [`Registry::find`] decides whether it is a menu number.
    pub fn from_input(input: &str) -> Self {
        SelectionEvent::Key(input.trim().to_string())
    }
}

/// The currently active option key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    key: String,
}

impl Selection {
    pub fn initial(registry: &Registry) -> Self {
        Self {
            key: registry.default_key().to_string(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// What the rendering surface draws: one registry entry, borrowed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View<'a> {
    pub key: &'a str,
    pub label: &'a str,
    pub table: &'a Table,
    pub descriptor: &'a DisplayDescriptor,
}

impl<'a> View<'a> {
    fn of(entry: &'a Entry) -> Self {
        Self {
            key: &entry.key,
            label: &entry.label,
            table: &entry.table,
            descriptor: &entry.descriptor,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// View for `selection` without applying any event. A selection that does
/// not belong to `registry` falls back to the registry default.
pub fn current_view<'a>(registry: &'a Registry, selection: &Selection) -> View<'a> {
    View::of(
        registry
            .get(selection.key())
            .unwrap_or_else(|| registry.default_entry()),
    )
}

pub fn resolve<'a>(
    event: &SelectionEvent,
    registry: &'a Registry,
    previous: &Selection,
) -> (Selection, View<'a>) {
    match registry.find(event) {
        Some(entry) => {
            debug!(key = %entry.key, ?event, "selection resolved");
            (
                Selection {
                    key: entry.key.clone(),
                },
                View::of(entry),
            )
        }
        None => {
            debug!(?event, kept = %previous.key(), "unknown selection ignored");
            let view = current_view(registry, previous);
            (
                Selection {
                    key: view.key.to_string(),
                },
                view,
            )
        }
    }
}

/// Registry plus the one piece of mutable state: the active selection.
#[derive(Debug, Clone)]
pub struct Dashboard {
    registry: Registry,
    selection: Selection,
}

impl Dashboard {
    pub fn new(registry: Registry) -> Self {
        let selection = Selection::initial(&registry);
        Self {
            registry,
            selection,
        }
    }

    /// Process one selection event to completion and return the new view.
    pub fn handle(&mut self, event: &SelectionEvent) -> View<'_> {
        let (next, _) = resolve(event, &self.registry, &self.selection);
        self.selection = next;
        current_view(&self.registry, &self.selection)
    }

    pub fn view(&self) -> View<'_> {
        current_view(&self.registry, &self.selection)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
