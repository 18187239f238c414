//! Completed-audit history and its filters.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuditError, Result};
use crate::model::AuditInstance;

const NO_HISTORY_MESSAGE: &str = "No completed audits yet.";
const NO_MATCH_MESSAGE: &str = "No audits match the current filters.";

/// All filters are optional and combine with AND. Blank text counts as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryFilter {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub template_name: String,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl HistoryFilter {
    /// Builds a filter from form input, where dates are `YYYY-MM-DD`.
    pub fn from_form(name: &str, template_name: &str, from: &str, to: &str) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            template_name: template_name.to_string(),
            from: parse_form_date(from)?,
            to: parse_form_date(to)?,
        })
    }

    pub fn is_active(&self) -> bool {
        !self.name.is_empty()
            || !self.template_name.is_empty()
            || self.from.is_some()
            || self.to.is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn matches(&self, audit: &AuditInstance) -> bool {
        let Some(completed_at) = audit.date_completed() else {
            return false;
        };
        if !self.name.is_empty()
            && !audit
                .name
                .to_lowercase()
                .contains(self.name.to_lowercase().as_str())
        {
            return false;
        }
        if !self.template_name.is_empty() && audit.template_name != self.template_name {
            return false;
        }
        if let Some(from) = self.from {
            if completed_at < start_of_day(from) {
                return false;
            }
        }
        if let Some(to) = self.to {
            if completed_at > end_of_day(to) {
                return false;
            }
        }
        true
    }
}

/// Filtered history, recomputed from scratch for every (filter, list) pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryView {
    pub entries: Vec<AuditInstance>,
    pub template_names: Vec<String>,
    pub total_completed: usize,
    pub empty_message: Option<&'static str>,
}

impl HistoryView {
    pub fn build<'a>(
        filter: &HistoryFilter,
        instances: impl IntoIterator<Item = &'a AuditInstance>,
    ) -> Self {
        let completed: Vec<&AuditInstance> = instances
            .into_iter()
            .filter(|audit| audit.is_completed())
            .collect();
        let entries: Vec<AuditInstance> = completed
            .iter()
            .filter(|audit| filter.matches(audit))
            .map(|audit| (*audit).clone())
            .collect();
        let empty_message = if !entries.is_empty() {
            None
        } else if completed.is_empty() {
            Some(NO_HISTORY_MESSAGE)
        } else {
            Some(NO_MATCH_MESSAGE)
        };
        Self {
            template_names: template_names(completed.iter().copied()),
            total_completed: completed.len(),
            entries,
            empty_message,
        }
    }
}

/// Distinct template names, first-seen order, for the template selector.
pub fn template_names<'a>(audits: impl IntoIterator<Item = &'a AuditInstance>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for audit in audits {
        if !names.contains(&audit.template_name) {
            names.push(audit.template_name.clone());
        }
    }
    names
}

fn parse_form_date(value: &str) -> Result<Option<NaiveDate>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| AuditError::Validation(format!("Invalid date: {trimmed}")))
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + TimeDelta::days(1) - TimeDelta::milliseconds(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AuditState, Template, WorkflowTag};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn audit(name: &str, template: &str, completed: Option<DateTime<Utc>>) -> AuditInstance {
        let template = Template {
            id: template.to_lowercase(),
            name: template.to_string(),
            checklist: Vec::new(),
        };
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut out = AuditInstance::from_template(&template, name.to_string(), name.to_string(), created);
        out.state = match completed {
            Some(date_completed) => AuditState::Completed { date_completed },
            None => AuditState::InProgress {
                tag: WorkflowTag::Todo,
            },
        };
        out
    }

    fn at(day: u32, hour: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap())
    }

    fn sample() -> Vec<AuditInstance> {
        vec![
            audit("Safety Compliance Audit", "Safety Compliance", at(4, 9)),
            audit("Warehouse safety walk", "Safety Compliance", at(10, 23)),
            audit("ISO 9001 Audit", "ISO 9001", at(12, 12)),
            audit("Open safety audit", "Safety Compliance", None),
        ]
    }

    fn names(view: &HistoryView) -> Vec<&str> {
        view.entries.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn name_filter_is_case_insensitive_substring() {
        let filter = HistoryFilter {
            name: "safety".to_string(),
            ..HistoryFilter::default()
        };
        let view = HistoryView::build(&filter, &sample());
        assert_eq!(names(&view), vec!["Safety Compliance Audit", "Warehouse safety walk"]);
    }

    #[test]
    fn template_filter_is_exact() {
        let mut filter = HistoryFilter {
            template_name: "ISO 9001".to_string(),
            ..HistoryFilter::default()
        };
        let view = HistoryView::build(&filter, &sample());
        assert_eq!(names(&view), vec!["ISO 9001 Audit"]);

        filter.template_name = "ISO".to_string();
        let view = HistoryView::build(&filter, &sample());
        assert!(view.entries.is_empty());
        assert_eq!(view.empty_message, Some(NO_MATCH_MESSAGE));
    }

    #[rstest]
    #[case::whole_range("2024-03-04", "2024-03-12", 3)]
    #[case::end_covers_late_evening("", "2024-03-10", 2)]
    #[case::start_is_inclusive("2024-03-12", "", 1)]
    #[case::single_day("2024-03-10", "2024-03-10", 1)]
    #[case::before_everything("", "2024-03-03", 0)]
    fn date_range_is_inclusive(#[case] from: &str, #[case] to: &str, #[case] expected: usize) {
        let filter = HistoryFilter::from_form("", "", from, to).unwrap();
        assert_eq!(HistoryView::build(&filter, &sample()).entries.len(), expected);
    }

    #[test]
    fn filters_combine() {
        let filter = HistoryFilter::from_form("AUDIT", "Safety Compliance", "2024-03-01", "").unwrap();
        let view = HistoryView::build(&filter, &sample());
        assert_eq!(names(&view), vec!["Safety Compliance Audit"]);
    }

    #[test]
    fn template_names_come_from_completed_only() {
        let view = HistoryView::build(&HistoryFilter::default(), &sample());
        assert_eq!(view.template_names, vec!["Safety Compliance", "ISO 9001"]);
        assert_eq!(view.total_completed, 3);
        assert_eq!(view.empty_message, None);
    }

    #[test]
    fn empty_history_message() {
        let open = vec![audit("Open", "ISO 9001", None)];
        let view = HistoryView::build(&HistoryFilter::default(), &open);
        assert_eq!(view.empty_message, Some(NO_HISTORY_MESSAGE));
    }

    #[test]
    fn bad_form_date_is_rejected_and_clear_resets() {
        assert!(HistoryFilter::from_form("", "", "03/04/2024", "").is_err());

        let mut filter = HistoryFilter::from_form("x", "ISO 9001", "2024-03-01", "2024-03-02").unwrap();
        assert!(filter.is_active());
        filter.clear();
        assert!(!filter.is_active());
    }
}
