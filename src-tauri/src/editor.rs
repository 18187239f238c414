//! Working copy of a single audit while its checklist dialog is open.
//!
//! Edits touch only the copy; [`ChecklistEditor::save`] hands the result to
//! the [`AuditStore`]. A read-only or closed editor ignores every edit.

use serde::Serialize;

use crate::clock::Clock;
use crate::error::Result;
use crate::instances::AuditStore;
use crate::model::AuditInstance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditorMode {
    Edit,
    ReadOnly,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistEditor {
    audit: AuditInstance,
    name: String,
    mode: EditorMode,
    closed: bool,
}

impl ChecklistEditor {
    /// Opens `audit` for editing. Completed audits always open read-only.
    pub fn edit(audit: AuditInstance) -> Self {
        let mode = if audit.is_completed() {
            EditorMode::ReadOnly
        } else {
            EditorMode::Edit
        };
        Self::open(audit, mode)
    }

    pub fn view(audit: AuditInstance) -> Self {
        Self::open(audit, EditorMode::ReadOnly)
    }

    fn open(audit: AuditInstance, mode: EditorMode) -> Self {
        Self {
            name: audit.name.clone(),
            audit,
            mode,
            closed: false,
        }
    }

    pub fn audit(&self) -> &AuditInstance {
        &self.audit
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn categories(&self) -> Vec<&str> {
        self.audit.categories()
    }

    fn writable(&self) -> bool {
        !self.closed && self.mode == EditorMode::Edit
    }

    /// Returns whether the edit was applied.
    pub fn set_checked(&mut self, item_id: &str, checked: bool, clock: &dyn Clock) -> bool {
        if !self.writable() {
            return false;
        }
        let Some(item) = self.audit.item_mut(item_id) else {
            return false;
        };
        item.set_checked(checked, clock.now());
        self.audit.recompute_progress();
        true
    }

    pub fn set_comment(&mut self, item_id: &str, text: &str) -> bool {
        if !self.writable() {
            return false;
        }
        let Some(item) = self.audit.item_mut(item_id) else {
            return false;
        };
        item.comment = text.to_string();
        true
    }

    /// Shows or hides the comment box; the comment text is kept either way.
    pub fn toggle_comment_visibility(&mut self, item_id: &str) -> bool {
        if !self.writable() {
            return false;
        }
        let Some(item) = self.audit.item_mut(item_id) else {
            return false;
        };
        item.add_comment = !item.add_comment;
        true
    }

    pub fn rename(&mut self, name: &str) -> bool {
        if !self.writable() {
            return false;
        }
        self.name = name.to_string();
        true
    }

    /// Commits the working copy and closes. Read-only and already-closed
    /// editors commit nothing and return `None`.
    pub fn save(&mut self, audits: &mut AuditStore) -> Result<Option<AuditInstance>> {
        if !self.writable() {
            self.closed = true;
            return Ok(None);
        }
        let saved = audits.update_checklist(
            &self.audit.audit_instance_id,
            &self.name,
            self.audit.checklist.clone(),
        )?;
        self.audit = saved.clone();
        self.closed = true;
        Ok(Some(saved))
    }

    pub fn close(&mut self) {
        self.closed = true;
    }
}
