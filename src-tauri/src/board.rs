//! Kanban-style board of in-progress audits.
//!
//! Moves keep the column they came from for a single-level undo that
//! expires after the configured window or as soon as anything else happens
//! on the board. The per-card status menu is plain state here: either
//! closed, or open for one audit at an anchor position.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::instances::AuditStore;
use crate::model::{AuditInstance, WorkflowTag};

#[derive(Debug, Clone, Serialize)]
pub struct BoardColumn {
    pub tag: WorkflowTag,
    pub label: &'static str,
    pub count: usize,
    pub audits: Vec<AuditInstance>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Board {
    pub columns: Vec<BoardColumn>,
}

impl Board {
    pub fn from_instances<'a>(instances: impl IntoIterator<Item = &'a AuditInstance>) -> Self {
        let mut columns: Vec<BoardColumn> = WorkflowTag::ALL
            .iter()
            .map(|tag| BoardColumn {
                tag: *tag,
                label: tag.label(),
                count: 0,
                audits: Vec::new(),
            })
            .collect();
        for instance in instances {
            let Some(tag) = instance.tag() else {
                continue;
            };
            if let Some(column) = columns.iter_mut().find(|column| column.tag == tag) {
                column.audits.push(instance.clone());
                column.count += 1;
            }
        }
        Self { columns }
    }

    pub fn column(&self, tag: WorkflowTag) -> Option<&BoardColumn> {
        self.columns.iter().find(|column| column.tag == tag)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|column| column.audits.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MenuAnchor {
    pub left: f64,
    pub top: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum StatusMenu {
    Closed,
    #[serde(rename_all = "camelCase")]
    Open {
        audit_instance_id: String,
        anchor: MenuAnchor,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveNotice {
    pub audit_instance_id: String,
    pub message: String,
}

#[derive(Debug, Clone)]
struct PendingUndo {
    audit_instance_id: String,
    previous: WorkflowTag,
    moved_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct BoardController {
    undo_window: Duration,
    pending: Option<PendingUndo>,
    menu: StatusMenu,
}

impl BoardController {
    pub fn new(undo_window: Duration) -> Self {
        Self {
            undo_window,
            pending: None,
            menu: StatusMenu::Closed,
        }
    }

    pub fn menu(&self) -> &StatusMenu {
        &self.menu
    }

    pub fn can_undo(&self, now: DateTime<Utc>) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| now - pending.moved_at <= self.undo_window)
    }

    /// Moves an audit to `tag`, replacing any earlier pending undo.
    pub fn move_audit(
        &mut self,
        audits: &mut AuditStore,
        id: &str,
        tag: WorkflowTag,
    ) -> Result<MoveNotice> {
        self.pending = None;
        let previous = audits.set_tag(id, tag)?;
        let name = audits
            .get(id)
            .map(|audit| audit.name.clone())
            .unwrap_or_default();
        self.pending = Some(PendingUndo {
            audit_instance_id: id.to_string(),
            previous,
            moved_at: audits.clock().now(),
        });
        Ok(MoveNotice {
            audit_instance_id: id.to_string(),
            message: format!(
                "Moved audit \"{name}\" to {}",
                tag.as_str().replace('-', " ")
            ),
        })
    }

    /// Puts the last moved audit back in its previous column. Returns
    /// `None` when nothing is pending or the window has passed.
    pub fn undo(&mut self, audits: &mut AuditStore) -> Result<Option<AuditInstance>> {
        let now = audits.clock().now();
        if !self.can_undo(now) {
            self.pending = None;
            return Ok(None);
        }
        let Some(pending) = self.pending.take() else {
            return Ok(None);
        };
        audits.set_tag(&pending.audit_instance_id, pending.previous)?;
        tracing::debug!(audit_id = %pending.audit_instance_id, to = %pending.previous, "move undone");
        Ok(audits.get(&pending.audit_instance_id).cloned())
    }

    pub fn dismiss(&mut self) {
        self.pending = None;
    }

    /// Completion is final from the board's point of view: no undo.
    pub fn complete(&mut self, audits: &mut AuditStore, id: &str) -> Result<AuditInstance> {
        self.pending = None;
        self.close_menu();
        audits.complete(id)
    }

    pub fn delete(&mut self, audits: &mut AuditStore, id: &str) -> Result<AuditInstance> {
        self.pending = None;
        self.close_menu();
        audits.delete(id)
    }

    pub fn open_menu(&mut self, id: &str, anchor: MenuAnchor) {
        self.menu = StatusMenu::Open {
            audit_instance_id: id.to_string(),
            anchor,
        };
    }

    pub fn close_menu(&mut self) {
        self.menu = StatusMenu::Closed;
    }

    /// Applies a tag picked from the open menu and closes it. Ignored while
    /// the menu is closed.
    pub fn choose(&mut self, audits: &mut AuditStore, tag: WorkflowTag) -> Result<Option<MoveNotice>> {
        let StatusMenu::Open {
            audit_instance_id, ..
        } = std::mem::replace(&mut self.menu, StatusMenu::Closed)
        else {
            return Ok(None);
        };
        self.move_audit(audits, &audit_instance_id, tag).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::instances::tests::fixture;
    use crate::templates::builtin_templates;
    use pretty_assertions::assert_eq;

    const WINDOW: i64 = 10;

    fn seeded(audits: &mut AuditStore) -> Vec<String> {
        let templates = builtin_templates();
        templates
            .iter()
            .map(|template| {
                audits
                    .create(template, &format!("{} run", template.name))
                    .unwrap()
                    .audit_instance_id
            })
            .collect()
    }

    #[test]
    fn partitions_in_progress_by_tag() {
        let (_, _, mut audits) = fixture();
        let ids = seeded(&mut audits);
        audits.set_tag(&ids[0], WorkflowTag::Blocked).unwrap();
        audits.set_tag(&ids[1], WorkflowTag::InProgress).unwrap();
        audits.complete(&ids[2]).unwrap();

        let board = Board::from_instances(audits.all());
        let counts: Vec<(WorkflowTag, usize)> =
            board.columns.iter().map(|c| (c.tag, c.count)).collect();
        assert_eq!(
            counts,
            vec![
                (WorkflowTag::Todo, 0),
                (WorkflowTag::InProgress, 1),
                (WorkflowTag::Blocked, 1),
            ]
        );
        assert_eq!(board.column(WorkflowTag::Todo).unwrap().label, "To Do");
        assert!(!board.is_empty());
    }

    #[test]
    fn undo_restores_previous_tag_within_window() {
        let (_, clock, mut audits) = fixture();
        let ids = seeded(&mut audits);
        let mut board = BoardController::new(Duration::seconds(WINDOW));

        let notice = board
            .move_audit(&mut audits, &ids[0], WorkflowTag::InProgress)
            .unwrap();
        assert_eq!(
            notice.message,
            "Moved audit \"ISO 9001 run\" to in progress"
        );
        clock.advance(Duration::seconds(WINDOW));

        let restored = board.undo(&mut audits).unwrap().expect("undo in window");
        assert_eq!(restored.tag(), Some(WorkflowTag::Todo));
        assert_eq!(board.undo(&mut audits).unwrap(), None);
    }

    #[test]
    fn undo_expires_after_window() {
        let (_, clock, mut audits) = fixture();
        let ids = seeded(&mut audits);
        let mut board = BoardController::new(Duration::seconds(WINDOW));

        board
            .move_audit(&mut audits, &ids[1], WorkflowTag::Blocked)
            .unwrap();
        clock.advance(Duration::seconds(WINDOW + 1));

        assert!(!board.can_undo(clock.now()));
        assert_eq!(board.undo(&mut audits).unwrap(), None);
        assert_eq!(audits.get(&ids[1]).unwrap().tag(), Some(WorkflowTag::Blocked));
    }

    #[test]
    fn further_move_replaces_pending_undo() {
        let (_, _, mut audits) = fixture();
        let ids = seeded(&mut audits);
        let mut board = BoardController::new(Duration::seconds(WINDOW));

        board
            .move_audit(&mut audits, &ids[0], WorkflowTag::Blocked)
            .unwrap();
        board
            .move_audit(&mut audits, &ids[1], WorkflowTag::InProgress)
            .unwrap();

        board.undo(&mut audits).unwrap();
        assert_eq!(audits.get(&ids[0]).unwrap().tag(), Some(WorkflowTag::Blocked));
        assert_eq!(audits.get(&ids[1]).unwrap().tag(), Some(WorkflowTag::Todo));
    }

    #[test]
    fn complete_and_delete_clear_undo() {
        let (_, clock, mut audits) = fixture();
        let ids = seeded(&mut audits);
        let mut board = BoardController::new(Duration::seconds(WINDOW));

        board
            .move_audit(&mut audits, &ids[0], WorkflowTag::Blocked)
            .unwrap();
        board.complete(&mut audits, &ids[0]).unwrap();
        assert!(!board.can_undo(clock.now()));

        board
            .move_audit(&mut audits, &ids[1], WorkflowTag::Blocked)
            .unwrap();
        board.delete(&mut audits, &ids[2]).unwrap();
        assert_eq!(board.undo(&mut audits).unwrap(), None);
    }

    #[test]
    fn status_menu_is_declarative() {
        let (_, _, mut audits) = fixture();
        let ids = seeded(&mut audits);
        let mut board = BoardController::new(Duration::seconds(WINDOW));

        assert_eq!(board.choose(&mut audits, WorkflowTag::Blocked).unwrap(), None);

        let anchor = MenuAnchor {
            left: 120.0,
            top: 48.0,
        };
        board.open_menu(&ids[2], anchor);
        assert_eq!(
            board.menu(),
            &StatusMenu::Open {
                audit_instance_id: ids[2].clone(),
                anchor,
            }
        );

        let notice = board
            .choose(&mut audits, WorkflowTag::Blocked)
            .unwrap()
            .expect("menu was open");
        assert_eq!(notice.audit_instance_id, ids[2]);
        assert_eq!(board.menu(), &StatusMenu::Closed);
        assert_eq!(audits.get(&ids[2]).unwrap().tag(), Some(WorkflowTag::Blocked));

        board.open_menu(&ids[0], anchor);
        board.close_menu();
        assert_eq!(board.menu(), &StatusMenu::Closed);
    }
}
