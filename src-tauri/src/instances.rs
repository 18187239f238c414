//! The audit instance store: sole owner of the persisted instance list.
//!
//! Views read through [`AuditStore::all`] and friends and change state only
//! through the named mutations below. Each mutation rewrites the whole
//! `auditInstances` document.

use std::sync::Arc;

use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{AuditError, Result};
use crate::model::{AuditInstance, AuditState, ChecklistItem, Template, WorkflowTag};
use crate::progress::calculate_progress;
use crate::storage::{load_list, save_json, SharedStore, AUDIT_INSTANCES_KEY};

pub struct AuditStore {
    store: SharedStore,
    clock: Arc<dyn Clock>,
    instances: Vec<AuditInstance>,
}

impl AuditStore {
    pub fn load(store: SharedStore, clock: Arc<dyn Clock>) -> Self {
        let instances = load_list(store.as_ref(), AUDIT_INSTANCES_KEY);
        Self {
            store,
            clock,
            instances,
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn all(&self) -> &[AuditInstance] {
        &self.instances
    }

    pub fn get(&self, id: &str) -> Option<&AuditInstance> {
        self.instances
            .iter()
            .find(|instance| instance.audit_instance_id == id)
    }

    pub fn in_progress(&self) -> impl Iterator<Item = &AuditInstance> {
        self.instances.iter().filter(|instance| !instance.is_completed())
    }

    pub fn completed(&self) -> impl Iterator<Item = &AuditInstance> {
        self.instances.iter().filter(|instance| instance.is_completed())
    }

    /// Starts a new audit from `template`. A blank name falls back to
    /// `"<template> Audit"`. New audits go to the front of the list.
    pub fn create(&mut self, template: &Template, name: &str) -> Result<AuditInstance> {
        let trimmed = name.trim();
        let name = if trimmed.is_empty() {
            format!("{} Audit", template.name)
        } else {
            trimmed.to_string()
        };
        let instance = AuditInstance::from_template(
            template,
            Uuid::new_v4().to_string(),
            name,
            self.clock.now(),
        );
        self.commit(|instances| {
            instances.insert(0, instance.clone());
            Ok(())
        })?;
        tracing::info!(
            audit_id = %instance.audit_instance_id,
            template = %instance.template_name,
            "audit created"
        );
        Ok(instance)
    }

    /// Replaces the name and checklist of an in-progress audit and
    /// recomputes its progress.
    pub fn update_checklist(
        &mut self,
        id: &str,
        name: &str,
        checklist: Vec<ChecklistItem>,
    ) -> Result<AuditInstance> {
        let updated = self.commit(|instances| {
            let instance = find_mut(instances, id)?;
            if instance.is_completed() {
                return Err(AuditError::NotEditable(id.to_string()));
            }
            instance.name = name.to_string();
            instance.progress = calculate_progress(&checklist);
            instance.checklist = checklist;
            Ok(instance.clone())
        })?;
        tracing::debug!(audit_id = id, progress = updated.progress, "checklist saved");
        Ok(updated)
    }

    /// Moves an in-progress audit to another column, returning the column
    /// it left.
    pub fn set_tag(&mut self, id: &str, tag: WorkflowTag) -> Result<WorkflowTag> {
        let previous = self.commit(|instances| {
            let instance = find_mut(instances, id)?;
            match &mut instance.state {
                AuditState::InProgress { tag: current } => {
                    let previous = *current;
                    *current = tag;
                    Ok(previous)
                }
                AuditState::Completed { .. } => Err(AuditError::NotEditable(id.to_string())),
            }
        })?;
        tracing::debug!(audit_id = id, from = %previous, to = %tag, "audit moved");
        Ok(previous)
    }

    /// Archives an in-progress audit. Completing twice is rejected so the
    /// first completion date stands.
    pub fn complete(&mut self, id: &str) -> Result<AuditInstance> {
        let now = self.clock.now();
        let completed = self.commit(|instances| {
            let instance = find_mut(instances, id)?;
            if instance.is_completed() {
                return Err(AuditError::NotEditable(id.to_string()));
            }
            instance.state = AuditState::Completed {
                date_completed: now,
            };
            Ok(instance.clone())
        })?;
        tracing::info!(audit_id = id, "audit completed");
        Ok(completed)
    }

    /// Sends a completed audit back to the board's in-progress column.
    /// Audits still on the board are left where they are.
    pub fn unarchive(&mut self, id: &str) -> Result<AuditInstance> {
        let restored = self.commit(|instances| {
            let instance = find_mut(instances, id)?;
            if !instance.is_completed() {
                return Err(AuditError::Validation(format!("Audit {id} is not completed.")));
            }
            instance.state = AuditState::InProgress {
                tag: WorkflowTag::InProgress,
            };
            Ok(instance.clone())
        })?;
        tracing::info!(audit_id = id, "audit unarchived");
        Ok(restored)
    }

    pub fn delete(&mut self, id: &str) -> Result<AuditInstance> {
        let removed = self.commit(|instances| {
            let idx = instances
                .iter()
                .position(|instance| instance.audit_instance_id == id)
                .ok_or_else(|| AuditError::NotFound(id.to_string()))?;
            Ok(instances.remove(idx))
        })?;
        tracing::info!(audit_id = id, "audit deleted");
        Ok(removed)
    }

    /// Applies `change` to a copy of the list and persists it; the in-memory
    /// list is replaced only once the write succeeds.
    fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut Vec<AuditInstance>) -> Result<T>,
    ) -> Result<T> {
        let mut next = self.instances.clone();
        let out = change(&mut next)?;
        save_json(self.store.as_ref(), AUDIT_INSTANCES_KEY, &next)?;
        self.instances = next;
        Ok(out)
    }
}

fn find_mut<'a>(instances: &'a mut [AuditInstance], id: &str) -> Result<&'a mut AuditInstance> {
    instances
        .iter_mut()
        .find(|instance| instance.audit_instance_id == id)
        .ok_or_else(|| AuditError::NotFound(id.to_string()))
}
