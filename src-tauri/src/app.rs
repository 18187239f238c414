//! The services one signed-in window works with, wired to a single store.

use std::sync::Arc;

use crate::auth::{AuthShim, SessionUser};
use crate::board::{Board, BoardController, MenuAnchor, MoveNotice};
use crate::clock::Clock;
use crate::config::Settings;
use crate::editor::ChecklistEditor;
use crate::error::{AuditError, Result};
use crate::history::{HistoryFilter, HistoryView};
use crate::instances::AuditStore;
use crate::model::{AuditInstance, Template, WorkflowTag};
use crate::storage::SharedStore;
use crate::templates::{TemplateDraft, TemplateStore};

pub struct AuditTracker {
    pub templates: TemplateStore,
    pub audits: AuditStore,
    pub board: BoardController,
    pub auth: AuthShim,
    editor: Option<ChecklistEditor>,
}

impl AuditTracker {
    pub fn open(store: SharedStore, clock: Arc<dyn Clock>, settings: &Settings) -> Result<Self> {
        Ok(Self {
            templates: TemplateStore::load(store.clone(), settings.visible_templates),
            audits: AuditStore::load(store.clone(), clock),
            board: BoardController::new(settings.undo_window()),
            auth: AuthShim::init(store, settings.seed_default_users)?,
            editor: None,
        })
    }

    /// The signed-in user, required by everything but the auth calls.
    pub fn session(&self) -> Result<&SessionUser> {
        self.auth.current_user().ok_or(AuditError::NotSignedIn)
    }

    pub fn create_template(&mut self, draft: TemplateDraft) -> Result<Template> {
        self.templates.create_custom(draft)
    }

    pub fn start_audit(&mut self, template_id: &str, name: &str) -> Result<AuditInstance> {
        let template = self
            .templates
            .find(template_id)
            .cloned()
            .ok_or_else(|| AuditError::TemplateNotFound(template_id.to_string()))?;
        self.board.dismiss();
        self.audits.create(&template, name)
    }

    pub fn board(&self) -> Board {
        Board::from_instances(self.audits.in_progress())
    }

    pub fn can_undo(&self) -> bool {
        self.board.can_undo(self.audits.clock().now())
    }

    pub fn move_audit(&mut self, id: &str, tag: WorkflowTag) -> Result<MoveNotice> {
        self.board.move_audit(&mut self.audits, id, tag)
    }

    pub fn undo_move(&mut self) -> Result<Option<AuditInstance>> {
        self.board.undo(&mut self.audits)
    }

    pub fn open_status_menu(&mut self, id: &str, anchor: MenuAnchor) -> Result<()> {
        let audit = self
            .audits
            .get(id)
            .ok_or_else(|| AuditError::NotFound(id.to_string()))?;
        if audit.is_completed() {
            return Err(AuditError::NotEditable(id.to_string()));
        }
        self.board.open_menu(id, anchor);
        Ok(())
    }

    pub fn choose_status(&mut self, tag: WorkflowTag) -> Result<Option<MoveNotice>> {
        self.board.choose(&mut self.audits, tag)
    }

    pub fn complete_audit(&mut self, id: &str) -> Result<AuditInstance> {
        let completed = self.board.complete(&mut self.audits, id)?;
        self.close_editor_for(id);
        Ok(completed)
    }

    pub fn delete_audit(&mut self, id: &str) -> Result<AuditInstance> {
        let removed = self.board.delete(&mut self.audits, id)?;
        self.close_editor_for(id);
        Ok(removed)
    }

    pub fn unarchive_audit(&mut self, id: &str) -> Result<AuditInstance> {
        self.board.dismiss();
        let restored = self.audits.unarchive(id)?;
        self.close_editor_for(id);
        Ok(restored)
    }

    pub fn history(&self, filter: &HistoryFilter) -> HistoryView {
        HistoryView::build(filter, self.audits.all())
    }

    pub fn editor(&self) -> Option<&ChecklistEditor> {
        self.editor.as_ref()
    }

    /// Opens the checklist dialog for one audit, replacing any open one.
    pub fn open_editor(&mut self, id: &str, read_only: bool) -> Result<&ChecklistEditor> {
        let audit = self
            .audits
            .get(id)
            .cloned()
            .ok_or_else(|| AuditError::NotFound(id.to_string()))?;
        let editor = if read_only {
            ChecklistEditor::view(audit)
        } else {
            ChecklistEditor::edit(audit)
        };
        Ok(self.editor.insert(editor))
    }

    pub fn set_item_checked(&mut self, item_id: &str, checked: bool) -> bool {
        let clock = self.audits.clock();
        self.editor
            .as_mut()
            .is_some_and(|editor| editor.set_checked(item_id, checked, clock))
    }

    pub fn set_item_comment(&mut self, item_id: &str, text: &str) -> bool {
        self.editor
            .as_mut()
            .is_some_and(|editor| editor.set_comment(item_id, text))
    }

    pub fn toggle_item_comment(&mut self, item_id: &str) -> bool {
        self.editor
            .as_mut()
            .is_some_and(|editor| editor.toggle_comment_visibility(item_id))
    }

    pub fn rename_audit(&mut self, name: &str) -> bool {
        self.editor.as_mut().is_some_and(|editor| editor.rename(name))
    }

    /// Commits and closes the open dialog. `None` when nothing was committed.
    /// A failed commit leaves the dialog open with its edits.
    pub fn save_editor(&mut self) -> Result<Option<AuditInstance>> {
        let Some(editor) = self.editor.as_mut() else {
            return Ok(None);
        };
        let saved = editor.save(&mut self.audits)?;
        self.editor = None;
        if saved.is_some() {
            self.board.dismiss();
        }
        Ok(saved)
    }

    pub fn close_editor(&mut self) {
        if let Some(editor) = self.editor.as_mut() {
            editor.close();
        }
        self.editor = None;
    }

    // A dialog on an audit that was archived, restored or deleted is stale.
    fn close_editor_for(&mut self, id: &str) {
        let open_on_id = self
            .editor
            .as_ref()
            .is_some_and(|editor| editor.audit().audit_instance_id == id);
        if open_on_id {
            self.close_editor();
        }
    }
}
