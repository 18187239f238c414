//! Built-in checklist templates plus the persisted custom ones.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuditError, Result};
use crate::model::{ChecklistItemDef, Template};
use crate::storage::{load_list, save_json, SharedStore, CUSTOM_TEMPLATES_KEY};

const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields";

/// (id, name, [(item id, text, category)])
type BuiltinTemplate = (&'static str, &'static str, &'static [(&'static str, &'static str, &'static str)]);

const BUILTIN_TEMPLATES: [BuiltinTemplate; 3] = [
    (
        "1",
        "ISO 9001",
        &[
            ("1", "Document Control Procedures", "Section 1: Document Control"),
            ("2", "Corrective and Preventive Actions", "Section 2: Corrective Actions"),
            ("3", "Internal Audit Results", "Section 3: Internal Audits"),
            ("10", "Management Review", "Section 4: Management Review"),
            ("11", "Resource Management", "Section 4: Management Review"),
        ],
    ),
    (
        "2",
        "Safety Compliance",
        &[
            ("4", "Emergency Exit Routes Marked", "Section 1: Emergency Preparedness"),
            ("5", "Fire Extinguishers Inspected", "Section 2: Fire Safety"),
            ("6", "Employee Safety Training Completed", "Section 3: Training & Competency"),
            ("12", "First Aid Supplies", "Section 2: Fire Safety"),
        ],
    ),
    (
        "3",
        "Environmental Audit",
        &[
            ("7", "Waste Management Procedures", "Section 1: Waste Management"),
            ("8", "Energy Consumption Monitoring", "Section 2: Resource Management"),
            ("9", "Water Usage Efficiency", "Section 2: Resource Management"),
            ("13", "Pollution Control Measures", "Section 3: Pollution Prevention"),
        ],
    ),
];

pub fn builtin_templates() -> Vec<Template> {
    BUILTIN_TEMPLATES
        .iter()
        .map(|(id, name, items)| Template {
            id: (*id).to_string(),
            name: (*name).to_string(),
            checklist: items
                .iter()
                .map(|(item_id, text, category)| ChecklistItemDef {
                    id: (*item_id).to_string(),
                    text: (*text).to_string(),
                    category: (*category).to_string(),
                })
                .collect(),
        })
        .collect()
}

/// A template being authored: named sections, each with item texts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDraft {
    pub name: String,
    #[serde(default)]
    pub sections: Vec<SectionDraft>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDraft {
    pub name: String,
    #[serde(default)]
    pub items: Vec<String>,
}

impl TemplateDraft {
    fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && self.sections.iter().all(|section| {
                !section.name.trim().is_empty()
                    && section.items.iter().all(|text| !text.trim().is_empty())
            })
    }
}

pub struct TemplateStore {
    store: SharedStore,
    builtin: Vec<Template>,
    custom: Vec<Template>,
    visible_limit: usize,
}

impl TemplateStore {
    pub fn load(store: SharedStore, visible_limit: usize) -> Self {
        let custom = load_list(store.as_ref(), CUSTOM_TEMPLATES_KEY);
        Self {
            store,
            builtin: builtin_templates(),
            custom,
            visible_limit,
        }
    }

    /// Built-ins first, then custom templates in creation order.
    pub fn all(&self) -> Vec<Template> {
        self.builtin.iter().chain(self.custom.iter()).cloned().collect()
    }

    pub fn custom(&self) -> &[Template] {
        &self.custom
    }

    pub fn visible(&self, show_all: bool) -> Vec<Template> {
        let all = self.all();
        if show_all {
            all
        } else {
            all.into_iter().take(self.visible_limit).collect()
        }
    }

    pub fn find(&self, id: &str) -> Option<&Template> {
        self.builtin
            .iter()
            .chain(self.custom.iter())
            .find(|template| template.id == id)
    }

    /// Validates and persists a custom template. Incomplete drafts are
    /// rejected before anything is written.
    pub fn create_custom(&mut self, draft: TemplateDraft) -> Result<Template> {
        if !draft.is_complete() {
            return Err(AuditError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()));
        }
        let checklist = draft
            .sections
            .iter()
            .flat_map(|section| {
                section.items.iter().map(|text| ChecklistItemDef {
                    id: Uuid::new_v4().to_string(),
                    text: text.clone(),
                    category: section.name.clone(),
                })
            })
            .collect();
        let template = Template {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            checklist,
        };

        let mut next = self.custom.clone();
        next.push(template.clone());
        save_json(self.store.as_ref(), CUSTOM_TEMPLATES_KEY, &next)?;
        self.custom = next;
        tracing::info!(template_id = %template.id, name = %template.name, "custom template created");
        Ok(template)
    }
}
