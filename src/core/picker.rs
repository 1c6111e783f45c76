//! Searchable currency dropdown.
//!
//! The picker is a small state machine (open/closed, filter text, highlighted
//! row). Transitions are plain methods so the form can drive it from key
//! events and tests can drive it without a terminal.

use super::currency::Catalog;

pub const NO_RESULTS: &str = "No currencies found";

/// Key events the picker understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerKey {
    Enter,
    Space,
    Up,
    Down,
    Escape,
    Backspace,
    Char(char),
}

/// Catalog entries whose code or name contains `term`, ignoring case.
pub fn filter_catalog<'a>(catalog: &'a Catalog, term: &str) -> Vec<(&'a str, &'a str)> {
    let term = term.to_lowercase();
    catalog
        .entries()
        .filter(|(code, name)| {
            code.to_lowercase().contains(&term) || name.to_lowercase().contains(&term)
        })
        .collect()
}

/// `CODE - Name`, or the bare code when the catalog does not know it.
pub fn display_text(catalog: &Catalog, code: &str) -> String {
    match catalog.name(code) {
        Some(name) => format!("{code} - {name}"),
        None => code.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrencyPicker {
    open: bool,
    filter: String,
    highlighted: usize,
}

impl CurrencyPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    pub fn matches<'a>(&self, catalog: &'a Catalog) -> Vec<(&'a str, &'a str)> {
        filter_catalog(catalog, &self.filter)
    }

    /// Click on the trigger.
    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn set_filter(&mut self, text: impl Into<String>) {
        self.filter = text.into();
        self.highlighted = 0;
    }

    /// Click on an entry. Returns the code to report to the owner.
    pub fn select(&mut self, code: &str) -> String {
        self.close();
        code.to_string()
    }

    /// Click outside the control.
    pub fn dismiss(&mut self) {
        self.close();
    }

    /// Handles a key press. Returns the selected code when the key picked one.
    pub fn handle_key(&mut self, key: PickerKey, catalog: &Catalog) -> Option<String> {
        if !self.open {
            if matches!(key, PickerKey::Enter | PickerKey::Space) {
                self.open = true;
            }
            return None;
        }

        match key {
            PickerKey::Down => {
                let count = self.matches(catalog).len();
                if self.highlighted + 1 < count {
                    self.highlighted += 1;
                }
                None
            }
            PickerKey::Up => {
                self.highlighted = self.highlighted.saturating_sub(1);
                None
            }
            PickerKey::Enter => {
                let code = self
                    .matches(catalog)
                    .get(self.highlighted)
                    .map(|(code, _)| code.to_string())?;
                Some(self.select(&code))
            }
            PickerKey::Escape => {
                self.close();
                None
            }
            PickerKey::Space => {
                let mut filter = self.filter.clone();
                filter.push(' ');
                self.set_filter(filter);
                None
            }
            PickerKey::Char(c) => {
                let mut filter = self.filter.clone();
                filter.push(c);
                self.set_filter(filter);
                None
            }
            PickerKey::Backspace => {
                let mut filter = self.filter.clone();
                if filter.pop().is_some() {
                    self.set_filter(filter);
                }
                None
            }
        }
    }

    fn close(&mut self) {
        self.open = false;
        self.set_filter(String::new());
    }
}
