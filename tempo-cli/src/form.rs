//! The search form, reduced to its contract.
//!
//! The presentation layer owns the typed city name; the session only ever
//! receives values. On submit the form emits the current text and resets in
//! the same tick, so the change feed sees the submitted value's edit
//! followed immediately by the empty string.

#[derive(Debug, Default)]
pub struct SearchForm {
    city_name: String,
    changes: Vec<String>,
}

impl SearchForm {
    pub fn city_name(&self) -> &str {
        &self.city_name
    }

    /// Two-way binding write, as the input field edits the value.
    pub fn set_city_name(&mut self, value: &str) {
        self.city_name = value.to_owned();
        self.changes.push(self.city_name.clone());
    }

    /// Emits the current text for submission, then resets the field.
    pub fn submit(&mut self) -> String {
        let submitted = self.city_name.clone();
        self.reset();
        submitted
    }

    pub fn reset(&mut self) {
        self.set_city_name("");
    }

    /// Drain the change feed accumulated since the last call, oldest first.
    pub fn take_changes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.changes)
    }
}
