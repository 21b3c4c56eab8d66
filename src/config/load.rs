use crate::config::types::{Config, FileTypeTable, Settings};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// 編譯時嵌入的影片副檔名表（不需要外部檔案）
const FILE_TYPE_TABLE_JSON: &str = include_str!("data/file_type_table.json");

/// 預設設定檔位置（目前工作目錄）
pub const DEFAULT_SETTINGS_PATH: &str = "settings.json";

impl Config {
    /// 載入設定；`settings_path` 為 `None` 時使用 `settings.json`
    pub fn new(settings_path: Option<&Path>) -> Result<Self> {
        let settings_path =
            settings_path.map_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH), Path::to_path_buf);
        let file_type_table = Self::load_embedded_file_type_table()?;
        let settings = Self::load_settings(&settings_path)?;

        Ok(Self {
            file_type_table,
            settings,
            settings_path,
            jobs_override: None,
        })
    }

    /// 本次執行實際使用的同時處理數量
    #[must_use]
    pub fn effective_jobs(&self) -> usize {
        self.jobs_override.unwrap_or(self.settings.jobs).max(1)
    }

    fn load_settings(path: &Path) -> Result<Settings> {
        if !path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        if content.trim().is_empty() {
            return Ok(Settings::default());
        }

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))
    }

    /// 從編譯時嵌入的 JSON 載入檔案類型表
    fn load_embedded_file_type_table() -> Result<FileTypeTable> {
        serde_json::from_str(FILE_TYPE_TABLE_JSON).context("無法解析嵌入的檔案類型設定")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_settings_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::new(Some(&dir.path().join("settings.json"))).unwrap();
        assert_eq!(config.settings, Settings::default());
        assert!(config.file_type_table.is_video_file(Path::new("a.mp4")));
    }

    #[test]
    fn test_invalid_settings_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        assert!(Config::new(Some(&path)).is_err());
    }

    #[test]
    fn test_jobs_override_is_not_saved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let mut config = Config::new(Some(&path)).unwrap();
        config.jobs_override = Some(8);
        config.settings.sprite.rows = 3;
        assert_eq!(config.effective_jobs(), 8);

        crate::config::save_settings(&config.settings_path, &config.settings).unwrap();

        let reloaded = Config::new(Some(&path)).unwrap();
        assert_eq!(reloaded.settings.jobs, Settings::default().jobs);
        assert_eq!(reloaded.settings.sprite.rows, 3);
        assert_eq!(reloaded.effective_jobs(), Settings::default().jobs);
    }
}
