//! Plaintext note content: an ordered list of tabs plus the active tab.
//!
//! This is the object that gets JSON-serialized and sealed. Field names use
//! camelCase on the wire to match the browser editor.

use serde::{Deserialize, Serialize};

use crate::random::{random_array, RandomError};

/// Length in bytes of the random part of a generated tab id.
const TAB_ID_BYTES: usize = 9;

/// One tab of a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    /// Opaque identifier, stable across edits and reordering.
    pub id: String,
    /// Display label: the trimmed title, or "Tab N" by position.
    pub name: String,
    pub title: String,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub updated_at: i64,
}

impl Tab {
    /// Create an empty tab at 1-based `position`.
    ///
    /// # Errors
    ///
    /// Returns [`RandomError`] if no id can be generated.
    pub fn new(position: usize, now_ms: i64) -> Result<Self, RandomError> {
        let id = crate::encode_base64url(&random_array::<TAB_ID_BYTES>()?);
        Ok(Self {
            id,
            name: default_tab_name(position),
            title: String::new(),
            content: String::new(),
            created_at: now_ms,
            updated_at: now_ms,
        })
    }
}

fn default_tab_name(position: usize) -> String {
    format!("Tab {position}")
}

fn derive_tab_name(title: &str, position: usize) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        default_tab_name(position)
    } else {
        trimmed.to_string()
    }
}

/// Violations of the note content invariants.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NoteContentError {
    #[error("note has no tabs")]
    NoTabs,
    #[error("active tab {active} out of range for {len} tabs")]
    ActiveTabOutOfRange { active: usize, len: usize },
    #[error("tab index {index} out of range for {len} tabs")]
    TabIndexOutOfRange { index: usize, len: usize },
    #[error("cannot remove the last remaining tab")]
    LastTab,
}

/// The decrypted, user-editable content of a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteContent {
    pub tabs: Vec<Tab>,
    pub active_tab: usize,
    /// Advisory only; never used for conflict resolution.
    pub last_saved: i64,
}

impl NoteContent {
    /// A fresh note with a single empty "Tab 1".
    ///
    /// # Errors
    ///
    /// Returns [`RandomError`] if no tab id can be generated.
    pub fn new(now_ms: i64) -> Result<Self, RandomError> {
        Ok(Self {
            tabs: vec![Tab::new(1, now_ms)?],
            active_tab: 0,
            last_saved: now_ms,
        })
    }

    /// Check the structural invariants: at least one tab, active tab in range.
    ///
    /// # Errors
    ///
    /// Returns the first invariant that does not hold.
    pub fn validate(&self) -> Result<(), NoteContentError> {
        if self.tabs.is_empty() {
            return Err(NoteContentError::NoTabs);
        }
        if self.active_tab >= self.tabs.len() {
            return Err(NoteContentError::ActiveTabOutOfRange {
                active: self.active_tab,
                len: self.tabs.len(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn active(&self) -> Option<&Tab> {
        self.tabs.get(self.active_tab)
    }

    fn check_index(&self, index: usize) -> Result<(), NoteContentError> {
        if index >= self.tabs.len() {
            return Err(NoteContentError::TabIndexOutOfRange {
                index,
                len: self.tabs.len(),
            });
        }
        Ok(())
    }

    /// Append a new empty tab and make it active. Returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`RandomError`] if no tab id can be generated.
    pub fn add_tab(&mut self, now_ms: i64) -> Result<usize, RandomError> {
        let tab = Tab::new(self.tabs.len() + 1, now_ms)?;
        self.tabs.push(tab);
        self.active_tab = self.tabs.len() - 1;
        Ok(self.active_tab)
    }

    /// Remove the tab at `index`. The last remaining tab cannot be removed.
    ///
    /// The active index follows the previously active tab where it still
    /// exists, otherwise it moves to the nearest remaining tab.
    ///
    /// # Errors
    ///
    /// Returns [`NoteContentError::LastTab`] or an out-of-range error.
    pub fn remove_tab(&mut self, index: usize) -> Result<Tab, NoteContentError> {
        self.check_index(index)?;
        if self.tabs.len() == 1 {
            return Err(NoteContentError::LastTab);
        }
        let removed = self.tabs.remove(index);
        if self.active_tab > index || self.active_tab >= self.tabs.len() {
            self.active_tab = self.active_tab.saturating_sub(1);
        }
        self.renumber_untitled();
        Ok(removed)
    }

    /// Move the tab at `from` to position `to`, keeping the same tab active.
    ///
    /// # Errors
    ///
    /// Returns an out-of-range error if either index is invalid.
    pub fn move_tab(&mut self, from: usize, to: usize) -> Result<(), NoteContentError> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }
        let active_id = self.active().map(|t| t.id.clone());
        let tab = self.tabs.remove(from);
        self.tabs.insert(to, tab);
        self.active_tab = self
            .tabs
            .iter()
            .position(|t| Some(&t.id) == active_id.as_ref())
            .unwrap_or(0);
        self.renumber_untitled();
        Ok(())
    }

    /// Make the tab at `index` active.
    ///
    /// # Errors
    ///
    /// Returns an out-of-range error if `index` is invalid.
    pub fn set_active(&mut self, index: usize) -> Result<(), NoteContentError> {
        self.check_index(index)?;
        self.active_tab = index;
        Ok(())
    }

    /// Replace a tab's title and content, re-deriving its name.
    ///
    /// # Errors
    ///
    /// Returns an out-of-range error if `index` is invalid.
    pub fn update_tab(
        &mut self,
        index: usize,
        title: impl Into<String>,
        content: impl Into<String>,
        now_ms: i64,
    ) -> Result<(), NoteContentError> {
        self.check_index(index)?;
        let tab = &mut self.tabs[index];
        tab.title = title.into();
        tab.content = content.into();
        tab.name = derive_tab_name(&tab.title, index + 1);
        tab.updated_at = now_ms;
        Ok(())
    }

    /// Stamp the advisory save time.
    pub fn mark_saved(&mut self, now_ms: i64) {
        self.last_saved = now_ms;
    }

    fn renumber_untitled(&mut self) {
        for (i, tab) in self.tabs.iter_mut().enumerate() {
            tab.name = derive_tab_name(&tab.title, i + 1);
        }
    }
}
