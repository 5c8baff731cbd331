// The dataset registry: every selectable option with its backing table,
// built once at startup and never mutated afterwards.
use crate::error::{Error, Result};
use crate::resolver::SelectionEvent;
use crate::types::{DisplayDescriptor, Table};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct Entry {
    pub key: String,
    pub label: String,
    pub table: Table,
    pub descriptor: DisplayDescriptor,
}

#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<Entry>,
    default_key: String,
}

impl Registry {
    /// Build a registry from entries in menu order.
    ///
    /// Fails when there is nothing to select, when keys collide, or when
    /// `default_key` does not name one of the entries.
    pub fn new(entries: Vec<Entry>, default_key: &str) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::NoOptions);
        }
        let mut seen = HashSet::new();
        for e in &entries {
            if !seen.insert(e.key.as_str()) {
                return Err(Error::DuplicateKey(e.key.clone()));
            }
        }
        if !seen.contains(default_key) {
            return Err(Error::UnknownDefault(default_key.to_string()));
        }
        Ok(Self {
            entries,
            default_key: default_key.to_string(),
        })
    }

    pub fn default_key(&self) -> &str {
        &self.default_key
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Entry for the default key. Construction guarantees it exists.
    pub fn default_entry(&self) -> &Entry {
        self.get(&self.default_key).unwrap_or(&self.entries[0])
    }

    fn at_position(&self, position: usize) -> Option<&Entry> {
        position.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    /// Match typed text against keys, then labels (case-insensitive), then
    /// 1-based menu positions. An exact key always wins, so a key made of
    /// digits shadows the menu number it spells.
    pub fn find(&self, event: &SelectionEvent) -> Option<&Entry> {
        match event {
            SelectionEvent::Key(k) => {
                let k = k.trim();
                self.get(k)
                    .or_else(|| {
                        let lower = k.to_lowercase();
                        self.entries.iter().find(|e| e.label.to_lowercase() == lower)
                    })
                    .or_else(|| {
                        if k.is_empty() || !k.chars().all(|c| c.is_ascii_digit()) {
                            return None;
                        }
                        k.parse::<usize>().ok().and_then(|p| self.at_position(p))
                    })
            }
            SelectionEvent::Position(p) => self.at_position(*p),
        }
    }
}
