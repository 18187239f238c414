use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

pub const SETTINGS_FILE: &str = "settings.json";
pub const DATA_DIR_ENV: &str = "AUDIT_TRACKER_DATA_DIR";

const DEFAULT_UNDO_WINDOW_SECS: u32 = 10;
const DEFAULT_VISIBLE_TEMPLATES: usize = 5;

/// Tunables read from `settings.json` in the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub undo_window_secs: u32,
    pub visible_templates: usize,
    pub seed_default_users: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            undo_window_secs: DEFAULT_UNDO_WINDOW_SECS,
            visible_templates: DEFAULT_VISIBLE_TEMPLATES,
            seed_default_users: true,
        }
    }
}

impl Settings {
    /// Missing or unreadable settings fall back to defaults.
    pub fn load(root: &Path) -> Self {
        let path = root.join(SETTINGS_FILE);
        if !path.exists() {
            return Self::default();
        }
        let parsed = fs::read_to_string(path.as_path())
            .map_err(|err| err.to_string())
            .and_then(|raw| serde_json::from_str::<Self>(raw.as_str()).map_err(|err| err.to_string()));
        match parsed {
            Ok(settings) => settings,
            Err(error) => {
                tracing::warn!(%error, path = %path.display(), "ignoring unreadable settings");
                Self::default()
            }
        }
    }

    pub fn undo_window(&self) -> Duration {
        Duration::seconds(i64::from(self.undo_window_secs))
    }
}

/// Storage root: `AUDIT_TRACKER_DATA_DIR` when set, else `<base>/AuditTracker`.
pub fn resolve_data_dir(base: &Path) -> PathBuf {
    match std::env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => base.join("AuditTracker"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_when_missing_or_broken() {
        let temp = tempfile::tempdir().expect("tempdir should create");
        assert_eq!(Settings::load(temp.path()), Settings::default());

        fs::write(temp.path().join(SETTINGS_FILE), "{ nope").unwrap();
        assert_eq!(Settings::load(temp.path()), Settings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().expect("tempdir should create");
        fs::write(
            temp.path().join(SETTINGS_FILE),
            r#"{ "undo_window_secs": 30 }"#,
        )
        .unwrap();

        let settings = Settings::load(temp.path());
        assert_eq!(settings.undo_window(), Duration::seconds(30));
        assert_eq!(settings.visible_templates, 5);
        assert!(settings.seed_default_users);
    }
}
