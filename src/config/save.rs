use crate::config::types::Settings;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    let content = serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("無法建立目錄: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write settings to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Config;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load_settings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf/settings.json");

        let mut settings = Settings::default();
        settings.library_dirs.push(PathBuf::from("/media/videos"));
        settings.sprite.cols = 8;
        settings.tools.timeout_secs = 30;
        save_settings(&path, &settings).unwrap();

        let config = Config::new(Some(&path)).unwrap();
        assert_eq!(config.settings, settings);
    }
}
