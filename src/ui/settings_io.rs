use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::ui::settings::UiSettings;

fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("dungeon_master");
    path.push("ui_settings.json");
    path
}

pub fn load_settings() -> UiSettings {
    let path = settings_path();
    let Ok(raw) = fs::read_to_string(&path) else {
        return UiSettings::default();
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable ui settings");
        UiSettings::default()
    })
}

pub fn save_settings(settings: &UiSettings) -> Result<()> {
    let path = settings_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let json = serde_json::to_string_pretty(settings)?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;

    tracing::debug!(path = %path.display(), "ui settings saved");
    Ok(())
}
