//! Output selection: which names an evaluation returns.
//!
//! Mutations never compute anything. The owning pipeline compares the names
//! against those its cached plan was compiled for, and recompiles on mismatch.

use std::ops::Deref;

/// Ordered, de-duplicated list of requested output names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSelection {
    names: Vec<String>,
}

impl OutputSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from names, dropping repeats.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = Self::new();
        selection.extend(names);
        selection
    }

    /// Replace the whole selection atomically.
    pub fn set<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.clear();
        for name in names {
            let name = name.into();
            if !self.names.contains(&name) {
                self.names.push(name);
            }
        }
    }

    /// Append a name. Returns `false` if it was already selected.
    pub fn push(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.names.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.push(name);
        }
    }

    /// Remove a name. Returns `false` if it was not selected.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.names.iter().position(|n| n == name) {
            Some(pos) => {
                self.names.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }
}

impl Deref for OutputSelection {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.names
    }
}

impl<S: Into<String>> FromIterator<S> for OutputSelection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_names(iter)
    }
}
