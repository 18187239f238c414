use crate::model::ChecklistItem;

/// Percentage of checked items, rounded half up. An empty checklist is 0%.
pub fn calculate_progress(checklist: &[ChecklistItem]) -> u8 {
    let total = checklist.len();
    if total == 0 {
        return 0;
    }
    let checked = checklist.iter().filter(|item| item.checked).count();
    let percent = (200 * checked + total) / (2 * total);
    // checked <= total keeps this within 0..=100
    u8::try_from(percent).unwrap_or(100)
}
