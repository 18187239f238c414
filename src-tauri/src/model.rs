//! Templates, audit instances and their checklist items.
//!
//! The persisted JSON keeps the flat shape the tracker has always written
//! (`status` next to `tag` or `dateCompleted`), while in memory the
//! lifecycle is an enum so a completed audit can never carry a tag.
//!
//! ```text
//! in-progress{todo | in-progress | blocked} --complete--> completed{dateCompleted}
//! completed --unarchive--> in-progress{in-progress}
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::progress::calculate_progress;

/// Workflow column of an in-progress audit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowTag {
    #[default]
    Todo,
    InProgress,
    Blocked,
}

impl WorkflowTag {
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Blocked];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Blocked => "blocked",
        }
    }

    /// Column heading on the board.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::Blocked => "Blocked",
        }
    }
}

impl fmt::Display for WorkflowTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItemDef {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub checklist: Vec<ChecklistItemDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub add_comment: bool,
    #[serde(default)]
    pub completion_timestamp: Option<DateTime<Utc>>,
}

impl ChecklistItem {
    pub fn from_def(def: &ChecklistItemDef) -> Self {
        Self {
            id: def.id.clone(),
            text: def.text.clone(),
            category: def.category.clone(),
            checked: false,
            comment: String::new(),
            add_comment: false,
            completion_timestamp: None,
        }
    }

    /// Keeps `completion_timestamp` present exactly while the item is checked.
    pub fn set_checked(&mut self, checked: bool, now: DateTime<Utc>) {
        self.checked = checked;
        self.completion_timestamp = checked.then_some(now);
    }
}

/// Lifecycle of an audit instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum AuditState {
    InProgress {
        // Records written before tagging existed land in the todo column.
        #[serde(default)]
        tag: WorkflowTag,
    },
    Completed {
        #[serde(rename = "dateCompleted")]
        date_completed: DateTime<Utc>,
    },
}

impl AuditState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress { .. } => "in-progress",
            Self::Completed { .. } => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditInstance {
    pub audit_instance_id: String,
    pub name: String,
    pub template_name: String,
    #[serde(deserialize_with = "id_string")]
    pub template_id: String,
    #[serde(flatten)]
    pub state: AuditState,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
    #[serde(default)]
    pub progress: u8,
    pub date_created: DateTime<Utc>,
}

impl AuditInstance {
    /// Snapshots `template` into a fresh, unchecked audit in the todo column.
    pub fn from_template(
        template: &Template,
        id: String,
        name: String,
        now: DateTime<Utc>,
    ) -> Self {
        let checklist: Vec<ChecklistItem> =
            template.checklist.iter().map(ChecklistItem::from_def).collect();
        Self {
            audit_instance_id: id,
            name,
            template_name: template.name.clone(),
            template_id: template.id.clone(),
            state: AuditState::InProgress {
                tag: WorkflowTag::Todo,
            },
            progress: calculate_progress(&checklist),
            checklist,
            date_created: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, AuditState::Completed { .. })
    }

    pub fn tag(&self) -> Option<WorkflowTag> {
        match self.state {
            AuditState::InProgress { tag } => Some(tag),
            AuditState::Completed { .. } => None,
        }
    }

    pub fn date_completed(&self) -> Option<DateTime<Utc>> {
        match self.state {
            AuditState::InProgress { .. } => None,
            AuditState::Completed { date_completed } => Some(date_completed),
        }
    }

    pub fn item_mut(&mut self, item_id: &str) -> Option<&mut ChecklistItem> {
        self.checklist.iter_mut().find(|item| item.id == item_id)
    }

    pub fn recompute_progress(&mut self) {
        self.progress = calculate_progress(&self.checklist);
    }

    /// Distinct item categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for item in &self.checklist {
            if !out.contains(&item.category.as_str()) {
                out.push(item.category.as_str());
            }
        }
        out
    }
}

// Built-in data used numeric ids; everything written since uses strings.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => Ok(text),
        serde_json::Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, found {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 14, 30, 0).unwrap()
    }

    fn template() -> Template {
        Template {
            id: "t1".to_string(),
            name: "Safety Compliance".to_string(),
            checklist: vec![
                ChecklistItemDef {
                    id: "a".to_string(),
                    text: "Exits marked".to_string(),
                    category: "Section 1".to_string(),
                },
                ChecklistItemDef {
                    id: "b".to_string(),
                    text: "Extinguishers".to_string(),
                    category: "Section 2".to_string(),
                },
                ChecklistItemDef {
                    id: "c".to_string(),
                    text: "First aid".to_string(),
                    category: "Section 2".to_string(),
                },
            ],
        }
    }

    #[test]
    fn from_template_copies_items_unchecked() {
        let audit =
            AuditInstance::from_template(&template(), "id-1".into(), "Plant A".into(), ts());
        assert_eq!(audit.checklist.len(), 3);
        assert!(audit
            .checklist
            .iter()
            .all(|item| !item.checked && item.completion_timestamp.is_none()));
        assert_eq!(audit.progress, 0);
        assert_eq!(audit.tag(), Some(WorkflowTag::Todo));
        assert_eq!(audit.date_completed(), None);
        assert_eq!(audit.categories(), vec!["Section 1", "Section 2"]);
    }

    #[test]
    fn set_checked_tracks_completion_timestamp() {
        let mut item = ChecklistItem::from_def(&template().checklist[0]);
        item.set_checked(true, ts());
        assert_eq!(item.completion_timestamp, Some(ts()));
        item.set_checked(false, ts());
        assert_eq!(item.completion_timestamp, None);
    }

    #[test]
    fn serializes_flat_status_shape() {
        let mut audit =
            AuditInstance::from_template(&template(), "id-1".into(), "Plant A".into(), ts());
        let value = serde_json::to_value(&audit).unwrap();
        assert_eq!(value["status"], json!("in-progress"));
        assert_eq!(value["tag"], json!("todo"));
        assert!(value.get("dateCompleted").is_none());

        audit.state = AuditState::Completed {
            date_completed: ts(),
        };
        let value = serde_json::to_value(&audit).unwrap();
        assert_eq!(value["status"], json!("completed"));
        assert!(value.get("tag").is_none());
        assert_eq!(value["dateCompleted"], json!("2024-05-02T14:30:00Z"));
    }

    #[test]
    fn loads_legacy_record_without_tag_and_numeric_ids() {
        let raw = json!({
            "auditInstanceId": "abc",
            "name": "ISO 9001 Audit",
            "templateName": "ISO 9001",
            "templateId": 1,
            "status": "in-progress",
            "checklist": [
                { "id": 1, "text": "Document Control Procedures", "checked": false,
                  "comment": "", "addComment": false, "completionTimestamp": null,
                  "category": "Section 1: Document Control" }
            ],
            "progress": 0,
            "dateCreated": "2024-05-02T14:30:00.000Z",
            "dateCompleted": null
        });
        let audit: AuditInstance = serde_json::from_value(raw).unwrap();
        assert_eq!(audit.template_id, "1");
        assert_eq!(audit.checklist[0].id, "1");
        assert_eq!(audit.tag(), Some(WorkflowTag::Todo));
    }
}
